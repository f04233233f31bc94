use chrono::{DateTime, Utc};
use mongodb::Database;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;
use crate::role::RoleName;

use super::user::User;

pub static ROLE_COLLECTION_NAME: &str = "roles";

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "Role doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }
}

/// Role bookkeeping record. Authorization decisions use the [`RoleName`]
/// enum carried in token claims, never these documents.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Role {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub name: RoleName,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

impl Role {
    pub fn new(name: RoleName) -> Role {
        Role {
            id: Uuid::new_v4(),
            name,
            created: Utc::now(),
        }
    }
}

pub trait RoleDbExt {
    /// Inserts any of the three well-known roles that are missing.
    async fn ensure_roles(&self) -> Result<(), Problem>;

    async fn get_role(&self, id: Uuid) -> Result<Option<Role>, Problem>;

    async fn find_role_by_name(&self, name: RoleName) -> Result<Option<Role>, Problem>;

    /// Resolves a user's stored role reference into its well-known name.
    async fn role_name_of(&self, user: &User) -> Result<RoleName, Problem>;
}

impl RoleDbExt for Database {
    async fn ensure_roles(&self) -> Result<(), Problem> {
        for name in RoleName::ALL {
            if self.find_role_by_name(name).await?.is_none() {
                tracing::info!("Creating missing '{}' role.", name);
                self.collection::<Role>(ROLE_COLLECTION_NAME)
                    .insert_one(Role::new(name), None)
                    .await
                    .map_err(Problem::from)?;
            }
        }

        Ok(())
    }

    async fn get_role(&self, id: Uuid) -> Result<Option<Role>, Problem> {
        self.collection(ROLE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn find_role_by_name(&self, name: RoleName) -> Result<Option<Role>, Problem> {
        self.collection(ROLE_COLLECTION_NAME)
            .find_one(bson::doc! { "name": name.to_string() }, None)
            .await
            .map_err(Problem::from)
    }

    async fn role_name_of(&self, user: &User) -> Result<RoleName, Problem> {
        let role = self
            .get_role(user.role_id)
            .await?
            .ok_or_else(|| problem::not_found(user.role_id))?;

        Ok(role.name)
    }
}
