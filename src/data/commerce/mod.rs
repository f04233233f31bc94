use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::role::RoleName;

pub mod db;

pub static ORDER_COLLECTION_NAME: &str = "orders";
pub static PAYMENT_COLLECTION_NAME: &str = "payments";
pub static ENROLLMENT_COLLECTION_NAME: &str = "enrollments";
pub static COURSE_RATING_COLLECTION_NAME: &str = "course.ratings";
pub static VIDEO_REVIEW_COLLECTION_NAME: &str = "video.reviews";
pub static NOTIFICATION_COLLECTION_NAME: &str = "notifications";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Purchase bookkeeping record; no gateway integration. `access_granted`
/// is only ever set alongside a succeeded payment status.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub payment_status: PaymentStatus,
    pub amount_paid: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub access_granted: bool,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

pub fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub payment_method: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

/// `is_complete` is derived from `progress`, never set directly; the two
/// cannot disagree.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Enrollment {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub enrolled: DateTime<Utc>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub is_complete: bool,
}

/// Clamps a requested progress value into 0–100 and derives completion.
pub fn apply_progress(progress: i32) -> (u8, bool) {
    let p = progress.clamp(0, 100) as u8;
    (p, p == 100)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseRating {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoReview {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub video_id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reference_id: Option<Uuid>,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub for_role: Option<RoleName>,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_clamps_and_derives_completion() {
        assert_eq!(apply_progress(-5), (0, false));
        assert_eq!(apply_progress(50), (50, false));
        assert_eq!(apply_progress(100), (100, true));
        assert_eq!(apply_progress(250), (100, true));
    }
}
