use mongodb::Database;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::assets::{AssetKind, AssetSource, AssetStore};
use crate::data::course::db::{problem as course_problem, CourseDbExt};
use crate::data::course::SectionContent;
use crate::data::section::db::{problem as section_problem, SectionDbExt};
use crate::data::video::db::{problem, VideoCreateData, VideoDbExt, VideoUpdateData};
use crate::data::video::Video;
use crate::duration;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};

/// Duration assumed for external URLs that carry no metadata.
const FALLBACK_DURATION_SECS: u32 = 60;

#[derive(FromForm)]
pub struct VideoCreateForm<'r> {
    pub title: String,
    pub description: Option<String>,
    /// Clock string (`H:MM:SS` / `MM:SS`) or bare seconds.
    pub duration: Option<String>,
    pub course_id: Uuid,
    pub section_id: Uuid,
    pub order: Option<i32>,
    pub is_preview: Option<bool>,
    pub video: Option<TempFile<'r>>,
    pub video_url: Option<String>,
}

#[derive(FromForm)]
pub struct VideoUpdateForm<'r> {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub section_id: Option<Uuid>,
    pub order: Option<i32>,
    pub is_preview: Option<bool>,
    pub video: Option<TempFile<'r>>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PreviewData {
    /// Explicit value, or absent to toggle.
    pub is_preview: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseContentResponse {
    pub course_title: String,
    pub total_sections: usize,
    pub content: Vec<SectionContent>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnlockResponse {
    pub message: String,
    pub updated_count: u64,
}

fn require_content_manager(auth: &UserRoleToken) -> Result<(), Problem> {
    if !auth.role.can_manage_content() {
        return Err(problems::forbidden("Only Admin or Instructor allowed."));
    }
    Ok(())
}

fn video_source_required() -> Problem {
    problems::validation("Video file or video_url is required.")
}

async fn resolve_source(
    file: &mut Option<TempFile<'_>>,
    url: Option<String>,
    assets: &dyn AssetStore,
) -> Result<Option<AssetSource>, Problem> {
    if let Some(file) = file {
        return Ok(Some(assets.store(file, AssetKind::Video).await?));
    }

    Ok(url.map(|url| AssetSource::External { url }))
}

async fn release_quietly(assets: &dyn AssetStore, source: &AssetSource) {
    if let Some(provider_id) = source.provider_id() {
        if let Err(e) = assets.release(provider_id).await {
            tracing::warn!("unable to release replaced asset {}: {}", provider_id, e);
        }
    }
}

/// Create a video from an uploaded file or an external URL.
#[post("/video", data = "<video>")]
#[tracing::instrument(skip(video, assets))]
pub async fn video_create(
    video: Form<VideoCreateForm<'_>>,
    auth: UserRoleToken,
    db: &State<Database>,
    assets: &State<Box<dyn AssetStore>>,
) -> Result<Json<Video>, Problem> {
    require_content_manager(&auth)?;

    let mut form = video.into_inner();

    if db.get_course(form.course_id).await?.is_none() {
        return Err(course_problem::not_found(form.course_id));
    }
    if db.get_section(form.section_id).await?.is_none() {
        return Err(section_problem::not_found(form.section_id));
    }

    let source = resolve_source(&mut form.video, form.video_url.take(), &***assets)
        .await?
        .ok_or_else(video_source_required)?;

    let duration_secs = form
        .duration
        .as_deref()
        .map(duration::parse)
        .unwrap_or(FALLBACK_DURATION_SECS as u64) as u32;

    let data = VideoCreateData {
        title: form.title,
        description: form.description,
        duration_secs,
        course_id: form.course_id,
        section_id: form.section_id,
        order: form.order.unwrap_or(0),
        is_preview: form.is_preview.unwrap_or(false),
    };

    Ok(Json(db.create_video(data, source).await?))
}

/// Full content tree of a course for signed-in callers.
#[get("/course/content/<course_id>")]
#[tracing::instrument]
pub async fn course_content(
    course_id: Uuid,
    _auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<CourseContentResponse>, Problem> {
    let course = db
        .get_course(course_id)
        .await?
        .ok_or_else(|| course_problem::not_found(course_id))?;

    let content: Vec<SectionContent> = db
        .course_tree(course_id)
        .await?
        .into_iter()
        .map(|(section, videos)| SectionContent { section, videos })
        .collect();

    Ok(Json(CourseContentResponse {
        course_title: course.title,
        total_sections: content.len(),
        content,
    }))
}

/// Update a video. A replaced uploaded source is released only after the
/// new one is persisted.
#[put("/video/<id>", data = "<video>")]
#[tracing::instrument(skip(video, assets))]
pub async fn video_update(
    id: Uuid,
    video: Form<VideoUpdateForm<'_>>,
    auth: UserRoleToken,
    db: &State<Database>,
    assets: &State<Box<dyn AssetStore>>,
) -> Result<Json<Video>, Problem> {
    require_content_manager(&auth)?;

    let existing = db.get_video(id).await?.ok_or_else(|| problem::not_found(id))?;

    let mut form = video.into_inner();

    if let Some(section_id) = form.section_id {
        if db.get_section(section_id).await?.is_none() {
            return Err(section_problem::not_found(section_id));
        }
    }

    let source = resolve_source(&mut form.video, form.video_url.take(), &***assets).await?;

    let data = VideoUpdateData {
        title: form.title,
        description: form.description,
        duration_secs: form.duration.as_deref().map(|d| duration::parse(d) as u32),
        section_id: form.section_id,
        order: form.order,
        is_preview: form.is_preview,
    };

    let replaced = source.is_some();
    let updated = db
        .update_video(id, data, source)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    if replaced {
        release_quietly(&***assets, &existing.source).await;
    }

    Ok(Json(updated))
}

/// Delete a video and release its uploaded media.
#[delete("/video/<id>")]
#[tracing::instrument(skip(assets))]
pub async fn video_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
    assets: &State<Box<dyn AssetStore>>,
) -> Result<Json<serde_json::Value>, Problem> {
    require_content_manager(&auth)?;

    let video = db
        .delete_video(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    release_quietly(&***assets, &video.source).await;

    Ok(Json(serde_json::json!({ "message": "Video deleted successfully" })))
}

/// Set or toggle a video's preview flag.
#[utoipa::path(context_path = "/api", request_body = PreviewData, responses(
    (status = 200, description = "Updated video", body = Video),
    (status = 404, description = "Video doesn't exist", body = Problem),
), security(("jwt" = [])))]
#[patch("/video/preview/<id>", format = "application/json", data = "<preview>")]
#[tracing::instrument]
pub async fn video_preview(
    id: Uuid,
    preview: Json<PreviewData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Video>, Problem> {
    require_content_manager(&auth)?;

    let video = db
        .set_preview(id, preview.is_preview)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    Ok(Json(video))
}

/// Mark every video of a course previewable (post-purchase unlock).
#[patch("/course/unlock/<course_id>")]
#[tracing::instrument]
pub async fn course_unlock(
    course_id: Uuid,
    _auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<UnlockResponse>, Problem> {
    if db.get_course(course_id).await?.is_none() {
        return Err(course_problem::not_found(course_id));
    }

    let updated_count = db.unlock_course_videos(course_id).await?;

    Ok(Json(UnlockResponse {
        message: "All course videos unlocked successfully".to_string(),
        updated_count,
    }))
}
