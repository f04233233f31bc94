use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::assets::AssetSource;
use crate::data::filter;
use crate::resp::problem::Problem;

use super::{Video, VIDEO_COLLECTION_NAME};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "Video doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }
}

/// Validated video fields; the route layer resolves uploads/URLs into the
/// [`AssetSource`] and durations into seconds before reaching the store.
#[derive(Debug, Clone)]
pub struct VideoCreateData {
    pub title: String,
    pub description: Option<String>,
    pub duration_secs: u32,
    pub course_id: Uuid,
    pub section_id: Uuid,
    pub order: i32,
    pub is_preview: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VideoUpdateData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_secs: Option<u32>,
    pub section_id: Option<Uuid>,
    pub order: Option<i32>,
    pub is_preview: Option<bool>,
}

pub trait VideoDbExt {
    async fn create_video(
        &self,
        data: VideoCreateData,
        source: AssetSource,
    ) -> Result<Video, Problem>;

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, Problem>;

    /// Videos of a section in display order.
    async fn videos_by_section(&self, section_id: Uuid) -> Result<Vec<Video>, Problem>;

    async fn update_video(
        &self,
        id: Uuid,
        data: VideoUpdateData,
        source: Option<AssetSource>,
    ) -> Result<Option<Video>, Problem>;

    async fn delete_video(&self, id: Uuid) -> Result<Option<Video>, Problem>;

    /// Sets the preview flag, or toggles it when no explicit value is
    /// given.
    async fn set_preview(&self, id: Uuid, is_preview: Option<bool>)
        -> Result<Option<Video>, Problem>;

    /// Marks every video of a course previewable. Returns the number of
    /// videos affected.
    async fn unlock_course_videos(&self, course_id: Uuid) -> Result<u64, Problem>;
}

impl VideoDbExt for Database {
    async fn create_video(
        &self,
        data: VideoCreateData,
        source: AssetSource,
    ) -> Result<Video, Problem> {
        let video = Video {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            duration_secs: data.duration_secs,
            source,
            course_id: data.course_id,
            section_id: data.section_id,
            order: data.order,
            is_preview: data.is_preview,
            created: chrono::Utc::now(),
        };

        self.collection::<Video>(VIDEO_COLLECTION_NAME)
            .insert_one(&video, None)
            .await
            .map_err(Problem::from)?;

        Ok(video)
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, Problem> {
        self.collection(VIDEO_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn videos_by_section(&self, section_id: Uuid) -> Result<Vec<Video>, Problem> {
        let options = FindOptions::builder().sort(doc! { "order": 1 }).build();

        let mut cursor = self
            .collection::<Video>(VIDEO_COLLECTION_NAME)
            .find(filter::by_section(section_id), options)
            .await
            .map_err(Problem::from)?;

        let mut videos = vec![];
        while let Some(video) = cursor.next().await {
            match video {
                Ok(it) => videos.push(it),
                Err(_) => tracing::warn!("Unable to deserialize Video document."),
            }
        }

        Ok(videos)
    }

    async fn update_video(
        &self,
        id: Uuid,
        data: VideoUpdateData,
        source: Option<AssetSource>,
    ) -> Result<Option<Video>, Problem> {
        let mut changes = doc! {};
        if let Some(title) = data.title {
            changes.insert("title", title);
        }
        if let Some(description) = data.description {
            changes.insert("description", description);
        }
        if let Some(duration_secs) = data.duration_secs {
            changes.insert("duration_secs", duration_secs);
        }
        if let Some(section_id) = data.section_id {
            changes.insert("section_id", section_id.to_string());
        }
        if let Some(order) = data.order {
            changes.insert("order", order);
        }
        if let Some(is_preview) = data.is_preview {
            changes.insert("is_preview", is_preview);
        }
        if let Some(source) = source {
            changes.insert("source", bson::to_bson(&source).map_err(Problem::from)?);
        }

        if changes.is_empty() {
            return self.get_video(id).await;
        }

        self.collection::<Video>(VIDEO_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_id(id),
                doc! { "$set": changes },
                mongodb::options::FindOneAndUpdateOptions::builder()
                    .return_document(mongodb::options::ReturnDocument::After)
                    .build(),
            )
            .await
            .map_err(Problem::from)
    }

    async fn delete_video(&self, id: Uuid) -> Result<Option<Video>, Problem> {
        self.collection(VIDEO_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn set_preview(
        &self,
        id: Uuid,
        is_preview: Option<bool>,
    ) -> Result<Option<Video>, Problem> {
        let video = match self.get_video(id).await? {
            Some(it) => it,
            None => return Ok(None),
        };

        let value = is_preview.unwrap_or(!video.is_preview);

        self.update_video(
            id,
            VideoUpdateData {
                is_preview: Some(value),
                ..Default::default()
            },
            None,
        )
        .await
    }

    async fn unlock_course_videos(&self, course_id: Uuid) -> Result<u64, Problem> {
        let result = self
            .collection::<Video>(VIDEO_COLLECTION_NAME)
            .update_many(
                filter::by_course(course_id),
                doc! { "$set": { "is_preview": true } },
                None,
            )
            .await
            .map_err(Problem::from)?;

        Ok(result.modified_count)
    }
}
