use bson::{doc, Document};
use uuid::Uuid;

// UUIDs are stored as their canonical string form, the same shape they
// take in JSON responses.

#[inline]
pub fn by_id(id: Uuid) -> Document {
    doc! { "_id": id.to_string() }
}

#[inline]
pub fn by_email(email: impl ToString) -> Document {
    doc! { "email": email.to_string() }
}

#[inline]
pub fn by_user(user_id: Uuid) -> Document {
    doc! { "user_id": user_id.to_string() }
}

#[inline]
pub fn by_course(course_id: Uuid) -> Document {
    doc! { "course_id": course_id.to_string() }
}

#[inline]
pub fn by_section(section_id: Uuid) -> Document {
    doc! { "section_id": section_id.to_string() }
}

#[inline]
pub fn by_video(video_id: Uuid) -> Document {
    doc! { "video_id": video_id.to_string() }
}
