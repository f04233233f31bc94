use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

pub static SECTION_COLLECTION_NAME: &str = "sections";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Section {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub title: String,
    /// Display position within the course; not globally unique.
    #[serde(default)]
    pub order: i32,
    pub course_id: Uuid,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

/// Where a deleted section's videos should go: the section with the
/// largest `order` strictly below the deleted one, falling back to the
/// smallest strictly above. Content appended after a removed section folds
/// backward into prior material by default.
pub fn reassign_target<'a>(deleted: &Section, remaining: &'a [Section]) -> Option<&'a Section> {
    remaining
        .iter()
        .filter(|s| s.order < deleted.order)
        .max_by_key(|s| s.order)
        .or_else(|| {
            remaining
                .iter()
                .filter(|s| s.order > deleted.order)
                .min_by_key(|s| s.order)
        })
}

/// What happened to a deleted section's videos.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VideoDisposition {
    NoVideos,
    Reassigned { target: Uuid, moved: u64 },
    Deleted { removed: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(title: &str, order: i32, course_id: Uuid) -> Section {
        Section {
            id: Uuid::new_v4(),
            title: title.to_string(),
            order,
            course_id,
            created: Utc::now(),
        }
    }

    #[test]
    fn prefers_previous_section() {
        let course = Uuid::new_v4();
        let deleted = section("middle", 2, course);
        let remaining = [section("first", 1, course), section("last", 3, course)];

        let target = reassign_target(&deleted, &remaining).expect("a target exists");
        assert_eq!(target.title, "first");
    }

    #[test]
    fn falls_back_to_next_section() {
        let course = Uuid::new_v4();
        let deleted = section("first", 1, course);
        let remaining = [section("second", 2, course), section("third", 3, course)];

        let target = reassign_target(&deleted, &remaining).expect("a target exists");
        assert_eq!(target.title, "second");
    }

    #[test]
    fn picks_nearest_previous() {
        let course = Uuid::new_v4();
        let deleted = section("fourth", 4, course);
        let remaining = [section("first", 1, course), section("third", 3, course)];

        let target = reassign_target(&deleted, &remaining).expect("a target exists");
        assert_eq!(target.title, "third");
    }

    #[test]
    fn no_target_when_section_is_alone() {
        let course = Uuid::new_v4();
        let deleted = section("only", 1, course);

        assert!(reassign_target(&deleted, &[]).is_none());
    }

    #[test]
    fn equal_order_is_not_a_target() {
        let course = Uuid::new_v4();
        let deleted = section("a", 2, course);
        let remaining = [section("twin", 2, course)];

        assert!(reassign_target(&deleted, &remaining).is_none());
    }
}
