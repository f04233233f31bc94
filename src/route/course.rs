use mongodb::Database;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::assets::{AssetKind, AssetSource, AssetStore};
use crate::data::category::problem as category_problem;
use crate::data::category::CategoryDbExt;
use crate::data::commerce::db::CommerceDbExt;
use crate::data::course::db::{problem, CourseCreateData, CourseDbExt, CourseUpdateData};
use crate::data::course::{Course, CourseSummary, GatedSectionContent, SectionContent};
use crate::data::video::VideoView;
use crate::middleware::paging::PageState;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};

#[derive(FromForm)]
pub struct CourseCreateForm<'r> {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub price: f64,
    pub estimated_price: Option<f64>,
    /// Comma-separated.
    pub tags: Option<String>,
    pub level: String,
    /// Comma-separated.
    pub benefits: Option<String>,
    pub thumbnail: Option<TempFile<'r>>,
    pub thumbnail_url: Option<String>,
}

#[derive(FromForm)]
pub struct CourseUpdateForm<'r> {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<f64>,
    pub estimated_price: Option<f64>,
    pub tags: Option<String>,
    pub level: Option<String>,
    pub benefits: Option<String>,
    pub thumbnail: Option<TempFile<'r>>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PublishData {
    pub is_published: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CoursePreviewResponse {
    pub course: Course,
    pub sections: Vec<SectionContent>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseDetailsResponse {
    pub course: Course,
    pub purchased: bool,
    pub sections: Vec<GatedSectionContent>,
}

fn split_csv(list: Option<String>) -> Vec<String> {
    list.map(|it| {
        it.split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn require_content_manager(auth: &UserRoleToken) -> Result<(), Problem> {
    if !auth.role.can_manage_content() {
        return Err(problems::forbidden("Only Admin or Instructor allowed."));
    }
    Ok(())
}

async fn resolve_thumbnail(
    file: &mut Option<TempFile<'_>>,
    url: Option<String>,
    assets: &dyn AssetStore,
) -> Result<Option<AssetSource>, Problem> {
    if let Some(file) = file {
        return Ok(Some(assets.store(file, AssetKind::Thumbnail).await?));
    }

    Ok(url.map(|url| AssetSource::External { url }))
}

/// Releases a replaced or deleted upload; a failed release only loses the
/// stored file, never the request.
async fn release_quietly(assets: &dyn AssetStore, source: &AssetSource) {
    if let Some(provider_id) = source.provider_id() {
        if let Err(e) = assets.release(provider_id).await {
            tracing::warn!("unable to release replaced asset {}: {}", provider_id, e);
        }
    }
}

/// Create a course. Thumbnail comes as an uploaded file or an external
/// URL; having neither is a validation error.
#[post("/course", data = "<course>")]
#[tracing::instrument(skip(course, assets))]
pub async fn course_create(
    course: Form<CourseCreateForm<'_>>,
    auth: UserRoleToken,
    db: &State<Database>,
    assets: &State<Box<dyn AssetStore>>,
) -> Result<Json<Course>, Problem> {
    require_content_manager(&auth)?;

    let mut form = course.into_inner();

    if db.get_category(form.category_id).await?.is_none() {
        return Err(category_problem::not_found(form.category_id));
    }

    let thumbnail = resolve_thumbnail(&mut form.thumbnail, form.thumbnail_url.take(), &***assets)
        .await?
        .ok_or_else(problem::thumbnail_required)?;

    let data = CourseCreateData {
        title: form.title,
        description: form.description,
        category_id: form.category_id,
        price: form.price,
        estimated_price: form.estimated_price,
        tags: split_csv(form.tags),
        level: form.level,
        benefits: split_csv(form.benefits),
    };

    let created = db.create_course(data, thumbnail, auth.user).await?;
    Ok(Json(created))
}

/// Update a course. A replaced uploaded thumbnail is released only after
/// the new one is persisted.
#[put("/course/<id>", data = "<course>")]
#[tracing::instrument(skip(course, assets))]
pub async fn course_update(
    id: Uuid,
    course: Form<CourseUpdateForm<'_>>,
    auth: UserRoleToken,
    db: &State<Database>,
    assets: &State<Box<dyn AssetStore>>,
) -> Result<Json<Course>, Problem> {
    require_content_manager(&auth)?;

    let existing = db
        .get_course(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    let mut form = course.into_inner();

    if let Some(category_id) = form.category_id {
        if db.get_category(category_id).await?.is_none() {
            return Err(category_problem::not_found(category_id));
        }
    }

    let thumbnail =
        resolve_thumbnail(&mut form.thumbnail, form.thumbnail_url.take(), &***assets).await?;

    let data = CourseUpdateData {
        title: form.title,
        description: form.description,
        category_id: form.category_id,
        price: form.price,
        estimated_price: form.estimated_price,
        tags: form.tags.map(|t| split_csv(Some(t))),
        level: form.level,
        benefits: form.benefits.map(|b| split_csv(Some(b))),
    };

    let replaced = thumbnail.is_some();
    let updated = db
        .update_course(id, data, thumbnail)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    if replaced {
        release_quietly(&***assets, &existing.thumbnail).await;
    }

    Ok(Json(updated))
}

/// Publish or unpublish a course.
#[patch("/course/publish/<id>", format = "application/json", data = "<publish>")]
#[tracing::instrument]
pub async fn course_publish(
    id: Uuid,
    publish: Json<PublishData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Course>, Problem> {
    require_content_manager(&auth)?;

    let course = db
        .set_published(id, publish.is_published)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    Ok(Json(course))
}

/// Delete a course with its sections and videos.
#[delete("/course/<id>")]
#[tracing::instrument(skip(assets))]
pub async fn course_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
    assets: &State<Box<dyn AssetStore>>,
) -> Result<Json<serde_json::Value>, Problem> {
    require_content_manager(&auth)?;

    // Uploaded media is released after the records are gone; the tree is
    // collected first since the cascade erases it.
    let tree = db.course_tree(id).await?;

    let removal = db
        .delete_course_cascade(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    release_quietly(&***assets, &removal.course.thumbnail).await;
    for (_, videos) in &tree {
        for video in videos {
            release_quietly(&***assets, &video.source).await;
        }
    }

    Ok(Json(serde_json::json!({
        "message": "Course and all related data deleted successfully",
        "sections_removed": removal.sections_removed,
        "videos_removed": removal.videos_removed,
    })))
}

/// List all courses with catalog totals.
#[utoipa::path(context_path = "/api", responses(
    (status = 200, description = "Courses with totals", body = Vec<CourseSummary>),
))]
#[get("/courses")]
#[tracing::instrument]
pub async fn course_list(
    db: &State<Database>,
    page: PageState,
) -> Result<Json<Vec<CourseSummary>>, Problem> {
    let courses = db.list_courses(page).await?;

    let mut summaries = Vec::with_capacity(courses.len());
    for course in courses {
        summaries.push(db.summarize_course(course).await?);
    }

    Ok(Json(summaries))
}

/// List published courses.
#[get("/courses/published")]
#[tracing::instrument]
pub async fn course_list_published(
    db: &State<Database>,
    page: PageState,
) -> Result<Json<Vec<Course>>, Problem> {
    Ok(Json(db.list_published_courses(page).await?))
}

/// Get a course record without its content tree.
#[get("/course/<id>")]
#[tracing::instrument]
pub async fn course_get(id: Uuid, db: &State<Database>) -> Result<Json<Course>, Problem> {
    let course = db
        .get_course(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    Ok(Json(course))
}

/// Instructor's own courses with totals.
#[get("/mycourses")]
#[tracing::instrument]
pub async fn course_list_mine(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<CourseSummary>>, Problem> {
    require_content_manager(&auth)?;

    let courses = db.courses_by_instructor(auth.user).await?;

    let mut summaries = Vec::with_capacity(courses.len());
    for course in courses {
        summaries.push(db.summarize_course(course).await?);
    }

    Ok(Json(summaries))
}

/// Full course tree for a signed-in caller; videos are never gated here.
#[get("/courses/preview/<id>")]
#[tracing::instrument]
pub async fn course_preview(
    id: Uuid,
    _auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<CoursePreviewResponse>, Problem> {
    let course = db
        .get_course(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    let sections = db
        .course_tree(id)
        .await?
        .into_iter()
        .map(|(section, videos)| SectionContent { section, videos })
        .collect();

    Ok(Json(CoursePreviewResponse { course, sections }))
}

/// Learner view of a course: every video is projected through the
/// visibility policy, so unpurchased callers see non-preview videos
/// redacted. No session means no purchase.
#[utoipa::path(context_path = "/api", responses(
    (status = 200, description = "Course with gated content tree", body = CourseDetailsResponse),
    (status = 404, description = "Course doesn't exist", body = Problem),
))]
#[get("/courses/details/<id>")]
#[tracing::instrument]
pub async fn course_details(
    id: Uuid,
    auth: Option<UserRoleToken>,
    db: &State<Database>,
) -> Result<Json<CourseDetailsResponse>, Problem> {
    let course = db
        .get_course(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    let purchased = match &auth {
        Some(token) => db.has_paid_order(token.user, id).await?,
        None => false,
    };

    let sections = db
        .course_tree(id)
        .await?
        .into_iter()
        .map(|(section, videos)| GatedSectionContent {
            section,
            videos: videos
                .iter()
                .map(|video| VideoView::render(video, purchased))
                .collect(),
        })
        .collect();

    Ok(Json(CourseDetailsResponse {
        course,
        purchased,
        sections,
    }))
}
