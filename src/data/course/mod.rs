use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::assets::AssetSource;
use crate::data::section::Section;
use crate::data::video::{Video, VideoView};

pub mod db;

pub static COURSE_COLLECTION_NAME: &str = "courses";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Course {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: Uuid,
    pub price: f64,
    #[serde(default)]
    pub estimated_price: Option<f64>,
    pub thumbnail: AssetSource,
    #[serde(default)]
    pub tags: Vec<String>,
    pub level: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub instructor_id: Uuid,
    #[serde(default)]
    pub is_published: bool,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

/// Course record together with catalog totals, the shape course listings
/// return.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseSummary {
    pub course: Course,
    pub total_sections: usize,
    pub total_videos: usize,
    /// `"XhYm"` past an hour, `"Ym"` otherwise.
    pub total_duration: String,
}

/// One section of an instructor-facing course tree, videos ungated.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SectionContent {
    pub section: Section,
    pub videos: Vec<Video>,
}

/// One section of the learner-facing course tree, each video projected
/// through the visibility policy.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GatedSectionContent {
    pub section: Section,
    pub videos: Vec<VideoView>,
}
