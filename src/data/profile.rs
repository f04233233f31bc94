use bson::doc;
use chrono::{DateTime, Utc};
use mongodb::Database;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::{problems, Problem};

pub static PROFILE_COLLECTION_NAME: &str = "profiles";

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn not_found() -> Problem {
        Problem::new_untyped(Status::NotFound, "Profile doesn't exist. Create it first.")
    }
}

/// At most one profile per user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub github_username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProfileCreateData {
    pub full_name: String,
    pub phone: Option<String>,
    pub github_username: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProfileUpdateData {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub github_username: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

pub trait ProfileDbExt {
    async fn create_profile(
        &self,
        user_id: Uuid,
        data: ProfileCreateData,
    ) -> Result<Profile, Problem>;

    async fn profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, Problem>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        data: ProfileUpdateData,
    ) -> Result<Option<Profile>, Problem>;
}

impl ProfileDbExt for Database {
    async fn create_profile(
        &self,
        user_id: Uuid,
        data: ProfileCreateData,
    ) -> Result<Profile, Problem> {
        if self.profile_by_user(user_id).await?.is_some() {
            return Err(problems::conflict(
                "Profile already exists. Use update instead.",
            ));
        }

        let profile = Profile {
            id: Uuid::new_v4(),
            user_id,
            full_name: data.full_name,
            phone: data.phone,
            github_username: data.github_username,
            bio: data.bio,
            image: data.image,
            created: Utc::now(),
        };

        self.collection::<Profile>(PROFILE_COLLECTION_NAME)
            .insert_one(&profile, None)
            .await
            .map_err(Problem::from)?;

        Ok(profile)
    }

    async fn profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, Problem> {
        self.collection(PROFILE_COLLECTION_NAME)
            .find_one(filter::by_user(user_id), None)
            .await
            .map_err(Problem::from)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        data: ProfileUpdateData,
    ) -> Result<Option<Profile>, Problem> {
        let mut changes = doc! {};
        if let Some(full_name) = data.full_name {
            changes.insert("full_name", full_name);
        }
        if let Some(phone) = data.phone {
            changes.insert("phone", phone);
        }
        if let Some(github_username) = data.github_username {
            changes.insert("github_username", github_username);
        }
        if let Some(bio) = data.bio {
            changes.insert("bio", bio);
        }
        if let Some(image) = data.image {
            changes.insert("image", image);
        }

        if changes.is_empty() {
            return self.profile_by_user(user_id).await;
        }

        self.collection::<Profile>(PROFILE_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_user(user_id),
                doc! { "$set": changes },
                mongodb::options::FindOneAndUpdateOptions::builder()
                    .return_document(mongodb::options::ReturnDocument::After)
                    .build(),
            )
            .await
            .map_err(Problem::from)
    }
}
