use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::course::db::{problem as course_problem, CourseDbExt};
use crate::data::course::SectionContent;
use crate::data::section::db::{problem, SectionCreateData, SectionDbExt, SectionUpdateData};
use crate::data::section::{Section, VideoDisposition};
use crate::data::video::db::VideoDbExt;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SectionListResponse {
    pub total: usize,
    pub sections: Vec<SectionContent>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SectionRemovalResponse {
    pub message: String,
    pub videos: VideoDisposition,
}

fn require_content_manager(auth: &UserRoleToken) -> Result<(), Problem> {
    if !auth.role.can_manage_content() {
        return Err(problems::forbidden("Only Admin or Instructor allowed."));
    }
    Ok(())
}

/// Create a section within an existing course.
#[utoipa::path(context_path = "/api", request_body = SectionCreateData, responses(
    (status = 200, description = "Created section", body = Section),
    (status = 404, description = "Course doesn't exist", body = Problem),
), security(("jwt" = [])))]
#[post("/section", format = "application/json", data = "<section>")]
#[tracing::instrument]
pub async fn section_create(
    section: Json<SectionCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Section>, Problem> {
    require_content_manager(&auth)?;

    let data = section.into_inner();
    if db.get_course(data.course_id).await?.is_none() {
        return Err(course_problem::not_found(data.course_id));
    }

    Ok(Json(db.create_section(data).await?))
}

/// All sections of a course, each with its videos.
#[get("/course/sections/<course_id>")]
#[tracing::instrument]
pub async fn section_list(
    course_id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<SectionListResponse>, Problem> {
    require_content_manager(&auth)?;

    let mut sections = vec![];
    for section in db.sections_by_course(course_id).await? {
        let videos = db.videos_by_section(section.id).await?;
        sections.push(SectionContent { section, videos });
    }

    Ok(Json(SectionListResponse {
        total: sections.len(),
        sections,
    }))
}

/// A single section with its videos.
#[get("/section/<id>")]
#[tracing::instrument]
pub async fn section_get(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<SectionContent>, Problem> {
    require_content_manager(&auth)?;

    let section = db
        .get_section(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;
    let videos = db.videos_by_section(id).await?;

    Ok(Json(SectionContent { section, videos }))
}

#[put("/section/<id>", format = "application/json", data = "<section>")]
#[tracing::instrument]
pub async fn section_update(
    id: Uuid,
    section: Json<SectionUpdateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Section>, Problem> {
    require_content_manager(&auth)?;

    let updated = db
        .update_section(id, section.into_inner())
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    Ok(Json(updated))
}

/// Delete a section. Its videos fold into the previous section by order
/// (or the next when there is no previous); when the section stood alone
/// the videos are deleted with it.
#[utoipa::path(context_path = "/api", responses(
    (status = 200, description = "Section removed", body = SectionRemovalResponse),
    (status = 404, description = "Section doesn't exist", body = Problem),
), security(("jwt" = [])))]
#[delete("/section/<id>")]
#[tracing::instrument]
pub async fn section_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<SectionRemovalResponse>, Problem> {
    require_content_manager(&auth)?;

    let removal = db
        .delete_section(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    let message = match &removal.disposition {
        VideoDisposition::NoVideos => "Section deleted; it had no videos.",
        VideoDisposition::Reassigned { .. } => "Section deleted; videos moved to a sibling section.",
        VideoDisposition::Deleted { .. } => "Section deleted together with its videos.",
    };

    Ok(Json(SectionRemovalResponse {
        message: message.to_string(),
        videos: removal.disposition,
    }))
}
