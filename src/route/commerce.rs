use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::commerce::db::{
    problem, CommerceDbExt, CourseRatingData, EnrollmentCreateData, OrderCreateData,
    PaymentCreateData, VideoReviewData,
};
use crate::data::commerce::{
    CourseRating, Enrollment, Notification, Order, Payment, PaymentStatus, VideoReview,
};
use crate::data::course::db::{problem as course_problem, CourseDbExt};
use crate::data::video::db::{problem as video_problem, VideoDbExt};
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::Problem;
use crate::role::RoleName;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProgressData {
    pub progress: i32,
}

/// Record a purchase order for the caller. Bookkeeping only; a succeeded
/// payment status grants content access immediately.
#[utoipa::path(context_path = "/api", request_body = OrderCreateData, responses(
    (status = 200, description = "Recorded order", body = Order),
    (status = 404, description = "Course doesn't exist", body = Problem),
), security(("jwt" = [])))]
#[post("/order", format = "application/json", data = "<order>")]
#[tracing::instrument]
pub async fn order_create(
    order: Json<OrderCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Order>, Problem> {
    let data = order.into_inner();

    if db.get_course(data.course_id).await?.is_none() {
        return Err(course_problem::not_found(data.course_id));
    }

    Ok(Json(db.create_order(auth.user, data).await?))
}

#[get("/orders")]
#[tracing::instrument]
pub async fn order_list(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Order>>, Problem> {
    Ok(Json(db.orders_by_user(auth.user).await?))
}

/// Record a payment against the caller's order. A succeeded payment marks
/// the order paid and notifies the course's instructor.
#[post("/payment", format = "application/json", data = "<payment>")]
#[tracing::instrument]
pub async fn payment_create(
    payment: Json<PaymentCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Payment>, Problem> {
    let payment = db.create_payment(auth.user, payment.into_inner()).await?;

    if payment.status == PaymentStatus::Succeeded {
        if let Some(course) = db.get_course(payment.course_id).await? {
            db.notify(
                course.instructor_id,
                "Course Purchase",
                "Your course was purchased by a student",
                Some(course.id),
                Some(RoleName::Instructor),
            )
            .await?;
        }
    }

    Ok(Json(payment))
}

/// Enroll the caller into a course.
#[post("/enrollment", format = "application/json", data = "<enrollment>")]
#[tracing::instrument]
pub async fn enrollment_create(
    enrollment: Json<EnrollmentCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Enrollment>, Problem> {
    let data = enrollment.into_inner();

    if db.get_course(data.course_id).await?.is_none() {
        return Err(course_problem::not_found(data.course_id));
    }

    Ok(Json(db.create_enrollment(auth.user, data.course_id).await?))
}

/// Update enrollment progress. Values clamp into 0–100 and completion is
/// derived, never stored independently.
#[patch("/enrollment/progress/<id>", format = "application/json", data = "<progress>")]
#[tracing::instrument]
pub async fn enrollment_progress(
    id: Uuid,
    progress: Json<ProgressData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Enrollment>, Problem> {
    let enrollment = db
        .set_enrollment_progress(id, auth.user, progress.progress)
        .await?
        .ok_or_else(|| problem::enrollment_not_found(id))?;

    Ok(Json(enrollment))
}

#[get("/enrollments")]
#[tracing::instrument]
pub async fn enrollment_list(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Enrollment>>, Problem> {
    Ok(Json(db.enrollments_by_user(auth.user).await?))
}

/// Rate a course 1–5.
#[post("/course/rating/<course_id>", format = "application/json", data = "<rating>")]
#[tracing::instrument]
pub async fn rating_create(
    course_id: Uuid,
    rating: Json<CourseRatingData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<CourseRating>, Problem> {
    if db.get_course(course_id).await?.is_none() {
        return Err(course_problem::not_found(course_id));
    }

    Ok(Json(db.rate_course(course_id, auth.user, rating.into_inner()).await?))
}

#[get("/course/rating/<course_id>")]
#[tracing::instrument]
pub async fn rating_list(
    course_id: Uuid,
    db: &State<Database>,
) -> Result<Json<Vec<CourseRating>>, Problem> {
    Ok(Json(db.ratings_by_course(course_id).await?))
}

#[post("/video/review/<video_id>", format = "application/json", data = "<review>")]
#[tracing::instrument]
pub async fn review_create(
    video_id: Uuid,
    review: Json<VideoReviewData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<VideoReview>, Problem> {
    if db.get_video(video_id).await?.is_none() {
        return Err(video_problem::not_found(video_id));
    }

    Ok(Json(db.review_video(video_id, auth.user, review.into_inner()).await?))
}

#[get("/video/review/<video_id>")]
#[tracing::instrument]
pub async fn review_list(
    video_id: Uuid,
    db: &State<Database>,
) -> Result<Json<Vec<VideoReview>>, Problem> {
    Ok(Json(db.reviews_by_video(video_id).await?))
}

#[get("/notifications")]
#[tracing::instrument]
pub async fn notification_list(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Notification>>, Problem> {
    Ok(Json(db.notifications_by_user(auth.user).await?))
}

#[patch("/notifications/read/<id>")]
#[tracing::instrument]
pub async fn notification_read(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Notification>, Problem> {
    let notification = db
        .mark_notification_read(id, auth.user)
        .await?
        .ok_or_else(|| problem::notification_not_found(id))?;

    Ok(Json(notification))
}
