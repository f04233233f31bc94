use bson::{doc, Document};
use mongodb::options::FindOptions;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::assets::AssetSource;
use crate::data::filter;
use crate::data::section::db::SectionDbExt;
use crate::data::section::{Section, SECTION_COLLECTION_NAME};
use crate::data::video::db::VideoDbExt;
use crate::data::video::{Video, VIDEO_COLLECTION_NAME};
use crate::duration;
use crate::middleware::paging::PageState;
use crate::resp::problem::Problem;

use super::{Course, CourseSummary, COURSE_COLLECTION_NAME};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "Course doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }

    #[inline]
    pub fn thumbnail_required() -> Problem {
        Problem::new_untyped(Status::BadRequest, "Thumbnail is required (file or URL).")
    }
}

#[derive(Debug, Clone)]
pub struct CourseCreateData {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub price: f64,
    pub estimated_price: Option<f64>,
    pub tags: Vec<String>,
    pub level: String,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseUpdateData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<f64>,
    pub estimated_price: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub level: Option<String>,
    pub benefits: Option<Vec<String>>,
}

/// What a course cascade delete removed alongside the course itself.
#[derive(Debug, Clone)]
pub struct CascadeRemoval {
    pub course: Course,
    pub sections_removed: u64,
    pub videos_removed: u64,
}

pub trait CourseDbExt {
    async fn create_course(
        &self,
        data: CourseCreateData,
        thumbnail: AssetSource,
        instructor_id: Uuid,
    ) -> Result<Course, Problem>;

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Problem>;

    async fn list_courses(&self, page: PageState) -> Result<Vec<Course>, Problem>;

    async fn list_published_courses(&self, page: PageState) -> Result<Vec<Course>, Problem>;

    async fn courses_by_instructor(&self, instructor_id: Uuid) -> Result<Vec<Course>, Problem>;

    async fn update_course(
        &self,
        id: Uuid,
        data: CourseUpdateData,
        thumbnail: Option<AssetSource>,
    ) -> Result<Option<Course>, Problem>;

    async fn set_published(&self, id: Uuid, is_published: bool)
        -> Result<Option<Course>, Problem>;

    /// Removes a course and everything under it, children first (videos,
    /// then sections, then the course), so a mid-delete failure never
    /// leaves a child referencing a deleted parent.
    async fn delete_course_cascade(&self, id: Uuid) -> Result<Option<CascadeRemoval>, Problem>;

    /// The full section/video tree of a course in display order.
    async fn course_tree(&self, course_id: Uuid) -> Result<Vec<(Section, Vec<Video>)>, Problem>;

    /// Attaches section/video/duration totals to a course record.
    async fn summarize_course(&self, course: Course) -> Result<CourseSummary, Problem>;
}

impl CourseDbExt for Database {
    async fn create_course(
        &self,
        data: CourseCreateData,
        thumbnail: AssetSource,
        instructor_id: Uuid,
    ) -> Result<Course, Problem> {
        let course = Course {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            category_id: data.category_id,
            price: data.price,
            estimated_price: data.estimated_price,
            thumbnail,
            tags: data.tags,
            level: data.level,
            benefits: data.benefits,
            instructor_id,
            is_published: false,
            created: chrono::Utc::now(),
        };

        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .insert_one(&course, None)
            .await
            .map_err(Problem::from)?;

        Ok(course)
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Problem> {
        self.collection(COURSE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_courses(&self, page: PageState) -> Result<Vec<Course>, Problem> {
        find_courses(self, None, Some(page)).await
    }

    async fn list_published_courses(&self, page: PageState) -> Result<Vec<Course>, Problem> {
        find_courses(self, Some(doc! { "is_published": true }), Some(page)).await
    }

    async fn courses_by_instructor(&self, instructor_id: Uuid) -> Result<Vec<Course>, Problem> {
        find_courses(self, Some(doc! { "instructor_id": instructor_id.to_string() }), None).await
    }

    async fn update_course(
        &self,
        id: Uuid,
        data: CourseUpdateData,
        thumbnail: Option<AssetSource>,
    ) -> Result<Option<Course>, Problem> {
        let mut changes = doc! {};
        if let Some(title) = data.title {
            changes.insert("title", title);
        }
        if let Some(description) = data.description {
            changes.insert("description", description);
        }
        if let Some(category_id) = data.category_id {
            changes.insert("category_id", category_id.to_string());
        }
        if let Some(price) = data.price {
            changes.insert("price", price);
        }
        if let Some(estimated_price) = data.estimated_price {
            changes.insert("estimated_price", estimated_price);
        }
        if let Some(tags) = data.tags {
            changes.insert("tags", tags);
        }
        if let Some(level) = data.level {
            changes.insert("level", level);
        }
        if let Some(benefits) = data.benefits {
            changes.insert("benefits", benefits);
        }
        if let Some(thumbnail) = thumbnail {
            changes.insert("thumbnail", bson::to_bson(&thumbnail).map_err(Problem::from)?);
        }

        if changes.is_empty() {
            return self.get_course(id).await;
        }

        self.collection::<Course>(COURSE_COLLECTION_NAME)
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

    async fn set_published(
        &self,
        id: Uuid,
        is_published: bool,
    ) -> Result<Option<Course>, Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_id(id),
                doc! { "$set": { "is_published": is_published } },
                mongodb::options::FindOneAndUpdateOptions::builder()
                    .return_document(mongodb::options::ReturnDocument::After)
                    .build(),
            )
            .await
            .map_err(Problem::from)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_course_cascade(&self, id: Uuid) -> Result<Option<CascadeRemoval>, Problem> {
        let course: Course = match self.get_course(id).await? {
            Some(it) => it,
            None => return Ok(None),
        };

        let videos = self
            .collection::<Video>(VIDEO_COLLECTION_NAME)
            .delete_many(filter::by_course(id), None)
            .await
            .map_err(Problem::from)?;

        let sections = self
            .collection::<Section>(SECTION_COLLECTION_NAME)
            .delete_many(filter::by_course(id), None)
            .await
            .map_err(Problem::from)?;

        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .delete_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)?;

        tracing::info!(
            "deleted course with {} sections and {} videos",
            sections.deleted_count,
            videos.deleted_count
        );

        Ok(Some(CascadeRemoval {
            course,
            sections_removed: sections.deleted_count,
            videos_removed: videos.deleted_count,
        }))
    }

    async fn course_tree(&self, course_id: Uuid) -> Result<Vec<(Section, Vec<Video>)>, Problem> {
        let sections = self.sections_by_course(course_id).await?;

        let mut tree = Vec::with_capacity(sections.len());
        for section in sections {
            let videos = self.videos_by_section(section.id).await?;
            tree.push((section, videos));
        }

        Ok(tree)
    }

    async fn summarize_course(&self, course: Course) -> Result<CourseSummary, Problem> {
        let tree = self.course_tree(course.id).await?;

        let total_sections = tree.len();
        let total_videos = tree.iter().map(|(_, videos)| videos.len()).sum();
        let total_seconds: u64 = tree
            .iter()
            .flat_map(|(_, videos)| videos.iter())
            .map(|v| v.duration_secs as u64)
            .sum();

        Ok(CourseSummary {
            course,
            total_sections,
            total_videos,
            total_duration: duration::format_total(total_seconds),
        })
    }
}

async fn find_courses(
    db: &Database,
    filter: Option<Document>,
    page: Option<PageState>,
) -> Result<Vec<Course>, Problem> {
    let mut options = FindOptions::builder().sort(doc! { "created": -1 }).build();
    if let Some(page) = page {
        options.skip = Some((page.page as u64) * page.page_length as u64);
        options.limit = Some(page.page_length as i64);
    }

    let mut cursor = db
        .collection::<Course>(COURSE_COLLECTION_NAME)
        .find(filter, options)
        .await
        .map_err(Problem::from)?;

    let mut courses = vec![];
    while let Some(course) = cursor.next().await {
        match course {
            Ok(it) => courses.push(it),
            Err(_) => tracing::warn!("Unable to deserialize Course document."),
        }
    }

    Ok(courses)
}
