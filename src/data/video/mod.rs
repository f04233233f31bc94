use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::assets::AssetSource;
use crate::duration;

pub mod db;

pub static VIDEO_COLLECTION_NAME: &str = "videos";

/// Shown instead of gated fields when the caller hasn't purchased the
/// course.
pub static LOCKED_MESSAGE: &str = "Purchase required to access this video";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Video {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Stored as integer seconds; clock strings exist only at the HTTP
    /// boundary.
    pub duration_secs: u32,
    pub source: AssetSource,
    pub course_id: Uuid,
    pub section_id: Uuid,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub is_preview: bool,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

impl Video {
    pub fn duration_clock(&self) -> String {
        duration::format_clock(self.duration_secs as u64)
    }
}

/// Per-video projection for learner responses. A video renders in full
/// when the caller owns the course or the video is a preview; otherwise
/// only identifying metadata and a purchase prompt leave the server.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum VideoView {
    Full {
        id: Uuid,
        title: String,
        description: Option<String>,
        duration: String,
        url: String,
        order: i32,
        is_preview: bool,
    },
    Locked {
        id: Uuid,
        title: String,
        duration: String,
        is_preview: bool,
        message: String,
    },
}

impl VideoView {
    pub fn render(video: &Video, purchased: bool) -> VideoView {
        if purchased || video.is_preview {
            VideoView::full(video)
        } else {
            VideoView::Locked {
                id: video.id,
                title: video.title.clone(),
                duration: video.duration_clock(),
                is_preview: video.is_preview,
                message: LOCKED_MESSAGE.to_string(),
            }
        }
    }

    pub fn full(video: &Video) -> VideoView {
        VideoView::Full {
            id: video.id,
            title: video.title.clone(),
            description: video.description.clone(),
            duration: video.duration_clock(),
            url: video.source.url().to_string(),
            order: video.order,
            is_preview: video.is_preview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(is_preview: bool) -> Video {
        Video {
            id: Uuid::new_v4(),
            title: "HTML Structure".to_string(),
            description: Some("Learn the basic HTML structure".to_string()),
            duration_secs: 754,
            source: AssetSource::External {
                url: "https://cdn.example.com/html_structure.mp4".to_string(),
            },
            course_id: Uuid::new_v4(),
            section_id: Uuid::new_v4(),
            order: 1,
            is_preview,
            created: Utc::now(),
        }
    }

    #[test]
    fn preview_is_full_without_purchase() {
        let view = VideoView::render(&video(true), false);
        assert!(matches!(view, VideoView::Full { .. }));
    }

    #[test]
    fn purchase_unlocks_regardless_of_preview() {
        let view = VideoView::render(&video(false), true);
        assert!(matches!(view, VideoView::Full { .. }));
    }

    #[test]
    fn locked_view_redacts_the_url() {
        let view = VideoView::render(&video(false), false);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["message"], LOCKED_MESSAGE);
        assert_eq!(json["duration"], "12:34");
        assert_eq!(json["is_preview"], false);
        assert!(json.get("url").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn full_view_formats_duration() {
        let json = serde_json::to_value(VideoView::full(&video(true))).unwrap();
        assert_eq!(json["duration"], "12:34");
        assert_eq!(json["url"], "https://cdn.example.com/html_structure.mp4");
    }
}
