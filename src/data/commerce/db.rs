use bson::{doc, Document};
use mongodb::options::FindOptions;
use mongodb::Database;
use rocket::futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::{problems, Problem};
use crate::role::RoleName;

use super::*;

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn order_not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "Order doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }

    #[inline]
    pub fn enrollment_not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "Enrollment doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }

    #[inline]
    pub fn notification_not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "Notification doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }

    #[inline]
    pub fn bad_rating(rating: u8) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Rating must be between 1 and 5.")
            .insert("rating", rating)
            .clone()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderCreateData {
    pub course_id: Uuid,
    pub amount_paid: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaymentCreateData {
    pub order_id: Uuid,
    pub payment_method: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub receipt_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnrollmentCreateData {
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CourseRatingData {
    pub rating: u8,
    pub review: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VideoReviewData {
    pub comment: String,
}

pub trait CommerceDbExt {
    async fn create_order(&self, user_id: Uuid, data: OrderCreateData) -> Result<Order, Problem>;

    async fn orders_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, Problem>;

    /// Whether a qualifying paid order exists for the user/course pair.
    /// This is the purchase condition the content-visibility policy keys
    /// on.
    async fn has_paid_order(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, Problem>;

    /// Records a payment against the caller's order. A succeeded payment
    /// marks the order paid and grants access.
    async fn create_payment(
        &self,
        user_id: Uuid,
        data: PaymentCreateData,
    ) -> Result<Payment, Problem>;

    async fn create_enrollment(&self, user_id: Uuid, course_id: Uuid)
        -> Result<Enrollment, Problem>;

    async fn enrollments_by_user(&self, user_id: Uuid) -> Result<Vec<Enrollment>, Problem>;

    async fn set_enrollment_progress(
        &self,
        id: Uuid,
        user_id: Uuid,
        progress: i32,
    ) -> Result<Option<Enrollment>, Problem>;

    async fn rate_course(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        data: CourseRatingData,
    ) -> Result<CourseRating, Problem>;

    async fn ratings_by_course(&self, course_id: Uuid) -> Result<Vec<CourseRating>, Problem>;

    async fn review_video(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        data: VideoReviewData,
    ) -> Result<VideoReview, Problem>;

    async fn reviews_by_video(&self, video_id: Uuid) -> Result<Vec<VideoReview>, Problem>;

    async fn notify(
        &self,
        user_id: Uuid,
        kind: impl ToString,
        message: impl ToString,
        reference_id: Option<Uuid>,
        for_role: Option<RoleName>,
    ) -> Result<Notification, Problem>;

    async fn notifications_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>, Problem>;

    async fn mark_notification_read(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Notification>, Problem>;
}

impl CommerceDbExt for Database {
    async fn create_order(&self, user_id: Uuid, data: OrderCreateData) -> Result<Order, Problem> {
        let order = Order {
            id: Uuid::new_v4(),
            course_id: data.course_id,
            user_id,
            payment_status: data.payment_status,
            amount_paid: data.amount_paid,
            currency: data.currency,
            access_granted: data.payment_status == PaymentStatus::Succeeded,
            created: chrono::Utc::now(),
        };

        self.collection::<Order>(ORDER_COLLECTION_NAME)
            .insert_one(&order, None)
            .await
            .map_err(Problem::from)?;

        Ok(order)
    }

    async fn orders_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, Problem> {
        collect_newest_first(self, ORDER_COLLECTION_NAME, filter::by_user(user_id)).await
    }

    async fn has_paid_order(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, Problem> {
        let paid = self
            .collection::<Order>(ORDER_COLLECTION_NAME)
            .find_one(
                doc! {
                    "user_id": user_id.to_string(),
                    "course_id": course_id.to_string(),
                    "payment_status": "succeeded",
                },
                None,
            )
            .await
            .map_err(Problem::from)?;

        Ok(paid.is_some())
    }

    async fn create_payment(
        &self,
        user_id: Uuid,
        data: PaymentCreateData,
    ) -> Result<Payment, Problem> {
        let order: Order = self
            .collection(ORDER_COLLECTION_NAME)
            .find_one(filter::by_id(data.order_id), None)
            .await
            .map_err(Problem::from)?
            .ok_or_else(|| problem::order_not_found(data.order_id))?;

        if order.user_id != user_id {
            return Err(problems::forbidden("Order belongs to another user."));
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            order_id: order.id,
            user_id,
            course_id: order.course_id,
            payment_method: data.payment_method,
            amount: data.amount,
            currency: data.currency,
            status: data.status,
            transaction_id: data.transaction_id,
            receipt_url: data.receipt_url,
            created: chrono::Utc::now(),
        };

        self.collection::<Payment>(PAYMENT_COLLECTION_NAME)
            .insert_one(&payment, None)
            .await
            .map_err(Problem::from)?;

        if payment.status == PaymentStatus::Succeeded {
            self.collection::<Order>(ORDER_COLLECTION_NAME)
                .update_one(
                    filter::by_id(order.id),
                    doc! { "$set": { "payment_status": "succeeded", "access_granted": true } },
                    None,
                )
                .await
                .map_err(Problem::from)?;
        }

        Ok(payment)
    }

    async fn create_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Enrollment, Problem> {
        let existing = self
            .collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .find_one(
                doc! {
                    "user_id": user_id.to_string(),
                    "course_id": course_id.to_string(),
                },
                None,
            )
            .await
            .map_err(Problem::from)?;

        if existing.is_some() {
            return Err(problems::conflict("Already enrolled in this course."));
        }

        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            course_id,
            user_id,
            enrolled: chrono::Utc::now(),
            progress: 0,
            is_complete: false,
        };

        self.collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .insert_one(&enrollment, None)
            .await
            .map_err(Problem::from)?;

        Ok(enrollment)
    }

    async fn enrollments_by_user(&self, user_id: Uuid) -> Result<Vec<Enrollment>, Problem> {
        let mut cursor = self
            .collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .find(filter::by_user(user_id), None)
            .await
            .map_err(Problem::from)?;

        let mut enrollments = vec![];
        while let Some(enrollment) = cursor.next().await {
            match enrollment {
                Ok(it) => enrollments.push(it),
                Err(_) => tracing::warn!("Unable to deserialize Enrollment document."),
            }
        }

        Ok(enrollments)
    }

    async fn set_enrollment_progress(
        &self,
        id: Uuid,
        user_id: Uuid,
        progress: i32,
    ) -> Result<Option<Enrollment>, Problem> {
        let (progress, is_complete) = apply_progress(progress);

        self.collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .find_one_and_update(
                doc! {
                    "_id": id.to_string(),
                    "user_id": user_id.to_string(),
                },
                doc! { "$set": { "progress": progress as i32, "is_complete": is_complete } },
                mongodb::options::FindOneAndUpdateOptions::builder()
                    .return_document(mongodb::options::ReturnDocument::After)
                    .build(),
            )
            .await
            .map_err(Problem::from)
    }

    async fn rate_course(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        data: CourseRatingData,
    ) -> Result<CourseRating, Problem> {
        if !(1..=5).contains(&data.rating) {
            return Err(problem::bad_rating(data.rating));
        }

        let rating = CourseRating {
            id: Uuid::new_v4(),
            course_id,
            user_id,
            rating: data.rating,
            review: data.review,
            created: chrono::Utc::now(),
        };

        self.collection::<CourseRating>(COURSE_RATING_COLLECTION_NAME)
            .insert_one(&rating, None)
            .await
            .map_err(Problem::from)?;

        Ok(rating)
    }

    async fn ratings_by_course(&self, course_id: Uuid) -> Result<Vec<CourseRating>, Problem> {
        collect_newest_first(self, COURSE_RATING_COLLECTION_NAME, filter::by_course(course_id))
            .await
    }

    async fn review_video(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        data: VideoReviewData,
    ) -> Result<VideoReview, Problem> {
        let review = VideoReview {
            id: Uuid::new_v4(),
            video_id,
            user_id,
            comment: data.comment,
            reply: None,
            resolved: false,
            created: chrono::Utc::now(),
        };

        self.collection::<VideoReview>(VIDEO_REVIEW_COLLECTION_NAME)
            .insert_one(&review, None)
            .await
            .map_err(Problem::from)?;

        Ok(review)
    }

    async fn reviews_by_video(&self, video_id: Uuid) -> Result<Vec<VideoReview>, Problem> {
        collect_newest_first(self, VIDEO_REVIEW_COLLECTION_NAME, filter::by_video(video_id)).await
    }

    async fn notify(
        &self,
        user_id: Uuid,
        kind: impl ToString,
        message: impl ToString,
        reference_id: Option<Uuid>,
        for_role: Option<RoleName>,
    ) -> Result<Notification, Problem> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: kind.to_string(),
            reference_id,
            message: message.to_string(),
            is_read: false,
            for_role,
            created: chrono::Utc::now(),
        };

        self.collection::<Notification>(NOTIFICATION_COLLECTION_NAME)
            .insert_one(&notification, None)
            .await
            .map_err(Problem::from)?;

        Ok(notification)
    }

    async fn notifications_by_user(&self, user_id: Uuid) -> Result<Vec<Notification>, Problem> {
        collect_newest_first(self, NOTIFICATION_COLLECTION_NAME, filter::by_user(user_id)).await
    }

    async fn mark_notification_read(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Notification>, Problem> {
        self.collection::<Notification>(NOTIFICATION_COLLECTION_NAME)
            .find_one_and_update(
                doc! {
                    "_id": id.to_string(),
                    "user_id": user_id.to_string(),
                },
                doc! { "$set": { "is_read": true } },
                mongodb::options::FindOneAndUpdateOptions::builder()
                    .return_document(mongodb::options::ReturnDocument::After)
                    .build(),
            )
            .await
            .map_err(Problem::from)
    }
}

async fn collect_newest_first<T: DeserializeOwned + Unpin + Send + Sync>(
    db: &Database,
    collection: &str,
    filter: Document,
) -> Result<Vec<T>, Problem> {
    let options = FindOptions::builder().sort(doc! { "created": -1 }).build();

    let mut cursor = db
        .collection::<T>(collection)
        .find(filter, options)
        .await
        .map_err(Problem::from)?;

    let mut records = vec![];
    while let Some(record) = cursor.next().await {
        match record {
            Ok(it) => records.push(it),
            Err(_) => tracing::warn!("Unable to deserialize {} document.", collection),
        }
    }

    Ok(records)
}
