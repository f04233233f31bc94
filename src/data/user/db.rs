use mongodb::Database;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::filter;
use crate::data::role::RoleDbExt;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::Problem;
use crate::role::RoleName;

use super::{PasswordHash, User, USER_COLLECTION_NAME};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn bad_email(email: impl ToString, detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad email.")
            .insert_str("email", email)
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn email_in_use(email: impl ToString) -> Problem {
        Problem::new_untyped(Status::Conflict, "Email is already registered.")
            .insert_str("email", email)
            .to_owned()
    }

    #[inline]
    pub fn bad_name(detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad name.")
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn bad_password(detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad password.")
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "User doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }

    #[inline]
    pub fn bad_login() -> Problem {
        Problem::new_untyped(Status::Unauthorized, "Bad email or password.")
    }
}

#[derive(Clone, Deserialize, ToSchema)]
pub struct UserSignupData {
    pub name: String,
    #[schema(format = "email")]
    pub email: String,
    #[schema(format = "password")]
    pub password: String,
}

impl std::fmt::Debug for UserSignupData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserSignupData:{}", self.email)
    }
}

impl UserSignupData {
    pub fn validate(&self) -> Result<(), Problem> {
        if !self.email.contains('@') {
            return Err(problem::bad_email(
                self.email.to_string(),
                "Not a valid e-mail address.",
            ));
        }

        if self.name.is_empty() {
            return Err(problem::bad_name("Name must not be empty."));
        }

        if self.name.len() > 64 {
            return Err(problem::bad_name(
                "Name can't be longer than 64 characters (bytes).",
            ));
        }

        if self.password.len() < 8 {
            return Err(problem::bad_password(
                "Password must be at least 8 characters (bytes) long.",
            ));
        }

        if self.password.len() > 1024 {
            return Err(problem::bad_password(
                "Passwords longer than 1024 characters aren't supported.",
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Deserialize, ToSchema)]
pub struct UserLoginData {
    #[schema(format = "email")]
    pub email: String,
    #[schema(format = "password")]
    pub password: String,
}

impl std::fmt::Debug for UserLoginData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserLoginData:{}", self.email)
    }
}

#[derive(Clone, Deserialize, ToSchema)]
pub struct ChangePasswordData {
    #[schema(format = "password")]
    pub old_password: String,
    #[schema(format = "password")]
    pub new_password: String,
}

impl std::fmt::Debug for ChangePasswordData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChangePasswordData")
    }
}

pub trait UserDbExt {
    /// Creates an account with the default `User` role, or `Admin` when the
    /// email is on the configured admin list. Duplicate email is a 409.
    async fn create_user(
        &self,
        signup: UserSignupData,
        admin_emails: impl AsRef<[String]>,
    ) -> Result<(UserRoleToken, User), Problem>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, Problem>;

    async fn find_user_by_email(&self, email: impl AsRef<str>) -> Result<Option<User>, Problem>;

    async fn set_password(&self, id: Uuid, hash: PasswordHash) -> Result<(), Problem>;
}

impl UserDbExt for Database {
    async fn create_user(
        &self,
        signup: UserSignupData,
        admin_emails: impl AsRef<[String]>,
    ) -> Result<(UserRoleToken, User), Problem> {
        if self.find_user_by_email(&signup.email).await?.is_some() {
            return Err(problem::email_in_use(&signup.email));
        }

        let role_name = if admin_emails.as_ref().contains(&signup.email) {
            RoleName::Admin
        } else {
            RoleName::User
        };

        let role = self
            .find_role_by_name(role_name)
            .await?
            .ok_or_else(|| missing_role_error(role_name))?;

        let user = User::new(&signup.name, &signup.email, &signup.password, role.id);
        let urt = UserRoleToken::new(&user, role_name);

        self.collection::<User>(USER_COLLECTION_NAME)
            .insert_one(&user, None)
            .await
            .map_err(Problem::from)?;

        Ok((urt, user))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, Problem> {
        self.collection(USER_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn find_user_by_email(&self, email: impl AsRef<str>) -> Result<Option<User>, Problem> {
        self.collection(USER_COLLECTION_NAME)
            .find_one(filter::by_email(email.as_ref()), None)
            .await
            .map_err(Problem::from)
    }

    async fn set_password(&self, id: Uuid, hash: PasswordHash) -> Result<(), Problem> {
        let hash = bson::to_bson(&hash).map_err(Problem::from)?;

        self.collection::<User>(USER_COLLECTION_NAME)
            .update_one(filter::by_id(id), bson::doc! { "$set": { "pw_hash": hash } }, None)
            .await
            .map_err(Problem::from)?;

        Ok(())
    }
}

fn missing_role_error(name: RoleName) -> Problem {
    use rocket::http::Status;

    Problem::new_untyped(Status::InternalServerError, "Well-known role is missing.")
        .insert_str("role", name)
        .to_owned()
}
