//! Wipes the database and inserts a small, fully linked demo data set:
//! the three roles, an admin/instructor/learner account, one published
//! course with two sections and three videos, plus commerce bookkeeping
//! for the learner's purchase.

use anyhow::Context;
use bson::doc;
use mongodb::{Client, Database};
use tracing::Level;
use uuid::Uuid;

use coursemarket_backend::assets::AssetSource;
use coursemarket_backend::config::Config;
use coursemarket_backend::data::category::{CategoryCreateData, CategoryDbExt};
use coursemarket_backend::data::commerce::db::{
    CommerceDbExt, CourseRatingData, OrderCreateData, PaymentCreateData, VideoReviewData,
};
use coursemarket_backend::data::commerce::PaymentStatus;
use coursemarket_backend::data::course::db::{CourseCreateData, CourseDbExt};
use coursemarket_backend::data::profile::{ProfileCreateData, ProfileDbExt};
use coursemarket_backend::data::role::RoleDbExt;
use coursemarket_backend::data::section::db::{SectionCreateData, SectionDbExt};
use coursemarket_backend::data::user::{User, USER_COLLECTION_NAME};
use coursemarket_backend::data::video::db::{VideoCreateData, VideoDbExt};
use coursemarket_backend::resp::jwt::UserRoleToken;
use coursemarket_backend::role::RoleName;
use coursemarket_backend::SECURITY;

static COLLECTIONS: [&str; 13] = [
    "roles",
    "users",
    "profiles",
    "categories",
    "courses",
    "sections",
    "videos",
    "orders",
    "payments",
    "enrollments",
    "course.ratings",
    "video.reviews",
    "notifications",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    let c = Config::load().unwrap_or_default();

    tracing::info!("Connecting to MongoDB: {}", c.mongodb_uri);
    let client = Client::with_uri_str(c.mongodb_uri.as_str())
        .await
        .context("unable to init MongoDB client")?;
    let db = client.database(c.mongodb_db.as_str());

    tracing::info!("Wiping collections...");
    for name in COLLECTIONS {
        db.collection::<bson::Document>(name)
            .delete_many(doc! {}, None)
            .await
            .with_context(|| format!("unable to wipe '{}'", name))?;
    }

    db.ensure_roles().await?;

    let admin = create_user(&db, "Admin User", "admin@example.com", RoleName::Admin).await?;
    let instructor =
        create_user(&db, "John Instructor", "instructor@example.com", RoleName::Instructor)
            .await?;
    let learner = create_user(&db, "Sarang User", "user@example.com", RoleName::User).await?;

    let admin_token = UserRoleToken::new(&admin, RoleName::Admin)
        .encode_jwt(&SECURITY.jwt_keys.private)
        .context("unable to encode admin JWT")?;
    tracing::info!("JWT token for admin: {}", admin_token);

    db.create_profile(
        instructor.id,
        ProfileCreateData {
            full_name: "John Instructor".to_string(),
            phone: Some("9876543210".to_string()),
            github_username: Some("johnGit".to_string()),
            bio: Some("Instructor specializing in full-stack development".to_string()),
            image: Some("https://randomuser.me/api/portraits/men/32.jpg".to_string()),
        },
    )
    .await?;

    db.create_profile(
        learner.id,
        ProfileCreateData {
            full_name: "Sarang User".to_string(),
            phone: Some("9123456780".to_string()),
            github_username: None,
            bio: Some("Aspiring full-stack developer".to_string()),
            image: Some("https://randomuser.me/api/portraits/men/33.jpg".to_string()),
        },
    )
    .await?;

    let category = db
        .create_category(CategoryCreateData {
            name: "Web Development".to_string(),
            description: Some("Full-stack web development courses".to_string()),
            image: Some("https://res.cloudinary.com/demo/image/upload/sample.jpg".to_string()),
        })
        .await?;

    let course = db
        .create_course(
            CourseCreateData {
                title: "MERN Stack Mastery".to_string(),
                description: Some("Learn full-stack web development with MERN".to_string()),
                category_id: category.id,
                price: 1999.0,
                estimated_price: Some(2499.0),
                tags: vec!["MERN".to_string(), "React".to_string(), "Node".to_string()],
                level: "Intermediate".to_string(),
                benefits: vec!["Job ready".to_string(), "Hands-on projects".to_string()],
            },
            AssetSource::External {
                url: "https://res.cloudinary.com/demo/video/upload/sample.jpg".to_string(),
            },
            instructor.id,
        )
        .await?;
    db.set_published(course.id, true).await?;

    let intro_section = db
        .create_section(SectionCreateData {
            title: "Introduction".to_string(),
            order: 1,
            course_id: course.id,
        })
        .await?;

    let html_section = db
        .create_section(SectionCreateData {
            title: "HTML Basics".to_string(),
            order: 2,
            course_id: course.id,
        })
        .await?;

    let intro_video = seed_video(
        &db,
        course.id,
        intro_section.id,
        "Welcome to the MERN Course",
        "Course overview and setup instructions",
        "https://res.cloudinary.com/demo/video/upload/mern_intro.mp4",
        8,
        1,
        true,
    )
    .await?;

    seed_video(
        &db,
        course.id,
        html_section.id,
        "HTML Structure",
        "Learn the basic HTML structure",
        "https://res.cloudinary.com/demo/video/upload/html_structure.mp4",
        12,
        1,
        false,
    )
    .await?;

    seed_video(
        &db,
        course.id,
        html_section.id,
        "HTML Elements and Tags",
        "Understand HTML elements and commonly used tags",
        "https://res.cloudinary.com/demo/video/upload/html_tags.mp4",
        15,
        2,
        false,
    )
    .await?;

    db.review_video(
        intro_video.id,
        learner.id,
        VideoReviewData {
            comment: "Amazing intro lesson!".to_string(),
        },
    )
    .await?;

    db.rate_course(
        course.id,
        learner.id,
        CourseRatingData {
            rating: 5,
            review: Some("Excellent course!".to_string()),
        },
    )
    .await?;

    let order = db
        .create_order(
            learner.id,
            OrderCreateData {
                course_id: course.id,
                amount_paid: 1999.0,
                currency: "INR".to_string(),
                payment_status: PaymentStatus::Succeeded,
            },
        )
        .await?;

    db.create_payment(
        learner.id,
        PaymentCreateData {
            order_id: order.id,
            payment_method: "Stripe".to_string(),
            amount: 1999.0,
            currency: "INR".to_string(),
            status: PaymentStatus::Succeeded,
            transaction_id: Some("txn_987654321".to_string()),
            receipt_url: Some("https://stripe.com/receipt/example".to_string()),
        },
    )
    .await?;

    let enrollment = db.create_enrollment(learner.id, course.id).await?;
    db.set_enrollment_progress(enrollment.id, learner.id, 25)
        .await?;

    db.notify(
        instructor.id,
        "Course Purchase",
        "Your course was purchased by a student",
        Some(course.id),
        Some(RoleName::Instructor),
    )
    .await?;

    tracing::info!("Database seeded successfully.");
    Ok(())
}

async fn create_user(
    db: &Database,
    name: &str,
    email: &str,
    role: RoleName,
) -> anyhow::Result<User> {
    let role_doc = db
        .find_role_by_name(role)
        .await?
        .context("well-known role is missing")?;

    let user = User::new(name, email, "Password123!", role_doc.id);
    db.collection::<User>(USER_COLLECTION_NAME)
        .insert_one(&user, None)
        .await
        .context("unable to insert user")?;

    Ok(user)
}

#[allow(clippy::too_many_arguments)]
async fn seed_video(
    db: &Database,
    course_id: Uuid,
    section_id: Uuid,
    title: &str,
    description: &str,
    url: &str,
    duration_secs: u32,
    order: i32,
    is_preview: bool,
) -> anyhow::Result<coursemarket_backend::data::video::Video> {
    let video = db
        .create_video(
            VideoCreateData {
                title: title.to_string(),
                description: Some(description.to_string()),
                duration_secs,
                course_id,
                section_id,
                order,
                is_preview,
            },
            AssetSource::External {
                url: url.to_string(),
            },
        )
        .await?;

    Ok(video)
}
