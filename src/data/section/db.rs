use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use rocket::futures::StreamExt;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::filter;
use crate::data::video::db::VideoDbExt;
use crate::data::video::VIDEO_COLLECTION_NAME;
use crate::resp::problem::Problem;

use super::{reassign_target, Section, VideoDisposition, SECTION_COLLECTION_NAME};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "Section doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SectionCreateData {
    pub title: String,
    #[serde(default)]
    pub order: i32,
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SectionUpdateData {
    pub title: Option<String>,
    pub order: Option<i32>,
}

/// Result of deleting a section together with the fate of its videos.
#[derive(Debug, Clone)]
pub struct SectionRemoval {
    pub section: Section,
    pub disposition: VideoDisposition,
}

pub trait SectionDbExt {
    async fn create_section(&self, data: SectionCreateData) -> Result<Section, Problem>;

    /// Sections of a course in display order.
    async fn sections_by_course(&self, course_id: Uuid) -> Result<Vec<Section>, Problem>;

    async fn get_section(&self, id: Uuid) -> Result<Option<Section>, Problem>;

    async fn update_section(
        &self,
        id: Uuid,
        data: SectionUpdateData,
    ) -> Result<Option<Section>, Problem>;

    /// Deletes a section, re-homing its videos into the preferred sibling
    /// (previous by order, falling back to next) or deleting them when
    /// the section was the last one. The section document is removed only
    /// after its videos are settled, so a partial failure can never leave
    /// videos referencing a deleted section. Returns `None` when the
    /// section doesn't exist, which makes re-runs no-ops.
    async fn delete_section(&self, id: Uuid) -> Result<Option<SectionRemoval>, Problem>;
}

impl SectionDbExt for Database {
    async fn create_section(&self, data: SectionCreateData) -> Result<Section, Problem> {
        let section = Section {
            id: Uuid::new_v4(),
            title: data.title,
            order: data.order,
            course_id: data.course_id,
            created: chrono::Utc::now(),
        };

        self.collection::<Section>(SECTION_COLLECTION_NAME)
            .insert_one(&section, None)
            .await
            .map_err(Problem::from)?;

        Ok(section)
    }

    async fn sections_by_course(&self, course_id: Uuid) -> Result<Vec<Section>, Problem> {
        let options = FindOptions::builder().sort(doc! { "order": 1 }).build();

        let mut cursor = self
            .collection::<Section>(SECTION_COLLECTION_NAME)
            .find(filter::by_course(course_id), options)
            .await
            .map_err(Problem::from)?;

        let mut sections = vec![];
        while let Some(section) = cursor.next().await {
            match section {
                Ok(it) => sections.push(it),
                Err(_) => tracing::warn!("Unable to deserialize Section document."),
            }
        }

        Ok(sections)
    }

    async fn get_section(&self, id: Uuid) -> Result<Option<Section>, Problem> {
        self.collection(SECTION_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn update_section(
        &self,
        id: Uuid,
        data: SectionUpdateData,
    ) -> Result<Option<Section>, Problem> {
        let mut changes = doc! {};
        if let Some(title) = data.title {
            changes.insert("title", title);
        }
        if let Some(order) = data.order {
            changes.insert("order", order);
        }

        if changes.is_empty() {
            return self.get_section(id).await;
        }

        self.collection::<Section>(SECTION_COLLECTION_NAME)
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

    #[tracing::instrument(skip(self))]
    async fn delete_section(&self, id: Uuid) -> Result<Option<SectionRemoval>, Problem> {
        let section: Section = match self.get_section(id).await? {
            Some(it) => it,
            None => return Ok(None),
        };

        let videos = self.videos_by_section(id).await?;
        tracing::debug!("section has {} videos to settle", videos.len());

        let disposition = if videos.is_empty() {
            VideoDisposition::NoVideos
        } else {
            let siblings: Vec<Section> = self
                .sections_by_course(section.course_id)
                .await?
                .into_iter()
                .filter(|s| s.id != section.id)
                .collect();

            match reassign_target(&section, &siblings) {
                Some(target) => {
                    let result = self
                        .collection::<crate::data::video::Video>(VIDEO_COLLECTION_NAME)
                        .update_many(
                            filter::by_section(id),
                            doc! { "$set": { "section_id": target.id.to_string() } },
                            None,
                        )
                        .await
                        .map_err(Problem::from)?;

                    tracing::info!("moved {} videos to section {}", result.modified_count, target.id);
                    VideoDisposition::Reassigned {
                        target: target.id,
                        moved: result.modified_count,
                    }
                }
                None => {
                    let result = self
                        .collection::<crate::data::video::Video>(VIDEO_COLLECTION_NAME)
                        .delete_many(filter::by_section(id), None)
                        .await
                        .map_err(Problem::from)?;

                    tracing::info!("deleted {} videos with their section", result.deleted_count);
                    VideoDisposition::Deleted {
                        removed: result.deleted_count,
                    }
                }
            }
        };

        self.collection::<Section>(SECTION_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)?;

        Ok(Some(SectionRemoval {
            section,
            disposition,
        }))
    }
}
