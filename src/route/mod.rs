use rocket::{Build, Rocket, Route};

pub mod category;
pub mod commerce;
pub mod course;
pub mod files;
pub mod profile;
pub mod section;
pub mod users;
pub mod video;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    assets::AssetSource,
    data::{
        category as cat, commerce as com, course as crs, profile as prf, section as sec,
        user as usr, video as vid,
    },
    resp::{jwt::doc::JWTAuth, problem::Problem},
    role::RoleName,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        users::register,
        users::login,
        users::user_identity,
        course::course_list,
        course::course_details,
        section::section_create,
        section::section_delete,
        video::video_preview,
        category::category_create,
        profile::profile_create,
        commerce::order_create,
    ),
    components(schemas(
        RoleName,
        AssetSource,
        usr::UserResponse,
        usr::db::UserSignupData,
        usr::db::UserLoginData,
        usr::db::ChangePasswordData,
        cat::Category,
        cat::CategoryCreateData,
        cat::CategoryUpdateData,
        crs::Course,
        crs::CourseSummary,
        crs::SectionContent,
        crs::GatedSectionContent,
        course::CourseDetailsResponse,
        sec::Section,
        sec::VideoDisposition,
        sec::db::SectionCreateData,
        section::SectionRemovalResponse,
        vid::Video,
        vid::VideoView,
        video::PreviewData,
        prf::Profile,
        prf::ProfileCreateData,
        com::Order,
        com::PaymentStatus,
        com::db::OrderCreateData,
        Problem
    )),
    modifiers(&JWTAuth)
)]
pub struct ApiDoc;

fn auth_api() -> Vec<Route> {
    routes![
        users::register,
        users::login,
        users::logout,
        users::user_identity,
        users::change_password
    ]
}

fn catalog_api() -> Vec<Route> {
    routes![
        course::course_create,
        course::course_update,
        course::course_publish,
        course::course_delete,
        course::course_list,
        course::course_list_published,
        course::course_get,
        course::course_list_mine,
        course::course_preview,
        course::course_details,
        section::section_create,
        section::section_list,
        section::section_get,
        section::section_update,
        section::section_delete,
        video::video_create,
        video::course_content,
        video::video_update,
        video::video_delete,
        video::video_preview,
        video::course_unlock,
        profile::profile_create,
        profile::profile_update,
        profile::profile_get,
        commerce::order_create,
        commerce::order_list,
        commerce::payment_create,
        commerce::enrollment_create,
        commerce::enrollment_progress,
        commerce::enrollment_list,
        commerce::rating_create,
        commerce::rating_list,
        commerce::review_create,
        commerce::review_list,
        commerce::notification_list,
        commerce::notification_read
    ]
}

fn categories_api() -> Vec<Route> {
    routes![
        category::category_create,
        category::category_list,
        category::category_get,
        category::category_update,
        category::category_delete
    ]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/auth", auth_api())
        .mount("/api", catalog_api())
        .mount("/api/categories", categories_api())
        .mount("/assets", routes![files::asset_file])
        .mount(
            "/",
            SwaggerUi::new("/swagger/<_..>").url("/api/openapi.json", ApiDoc::openapi()),
        )
}
