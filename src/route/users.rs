use mongodb::Database;
use rocket::http::CookieJar;
use rocket::serde::json::{json, Json, Value};
use rocket::State;

use crate::config::Config;
use crate::data::role::RoleDbExt;
use crate::data::user::db::problem as user_problem;
use crate::data::user::db::{ChangePasswordData, UserDbExt, UserLoginData, UserSignupData};
use crate::data::user::{PasswordHash, User, UserResponse};
use crate::resp::jwt::{UserRoleToken, AUTH_COOKIE_NAME};
use crate::resp::problem::Problem;

/// Create an account with the default `User` role.
#[utoipa::path(context_path = "/auth", request_body = UserSignupData, responses(
    (status = 200, description = "Created account", body = UserResponse),
    (status = 409, description = "Email already registered", body = Problem),
))]
#[post("/register", format = "application/json", data = "<signup>")]
#[tracing::instrument(skip(cookies))]
pub async fn register<'a>(
    signup: Json<UserSignupData>,
    cookies: &'a CookieJar<'_>,
    db: &State<Database>,
    c: &State<Config>,
) -> Result<Json<UserResponse>, Problem> {
    signup.validate()?;

    let (token, user) = db.create_user(signup.into_inner(), &c.admin_emails).await?;
    cookies.add(token.cookie()?);

    Ok(Json(UserResponse::new(&user, token.role)))
}

/// Verify credentials and start a cookie session.
#[utoipa::path(context_path = "/auth", request_body = UserLoginData, responses(
    (status = 200, description = "Authenticated", body = UserResponse),
    (status = 401, description = "Bad email or password", body = Problem),
))]
#[post("/login", format = "application/json", data = "<login>")]
#[tracing::instrument(skip(cookies))]
pub async fn login<'a>(
    login: Json<UserLoginData>,
    cookies: &'a CookieJar<'_>,
    db: &State<Database>,
) -> Result<Json<UserResponse>, Problem> {
    let user: User = db
        .find_user_by_email(&login.email)
        .await?
        .ok_or_else(user_problem::bad_login)?;

    if !user.pw_hash.verify(&login.password) {
        return Err(user_problem::bad_login());
    }

    let role = db.role_name_of(&user).await?;
    let urt = UserRoleToken::new(&user, role);
    cookies.add(urt.cookie()?);

    Ok(Json(UserResponse::new(&user, role)))
}

#[post("/logout")]
#[tracing::instrument(skip(cookies))]
pub fn logout(cookies: &CookieJar<'_>) -> Value {
    cookies.remove(AUTH_COOKIE_NAME);
    json!({ "message": "Logged out." })
}

/// Resolve the caller's identity from the session cookie.
#[utoipa::path(context_path = "/auth", responses(
    (status = 200, description = "Caller identity", body = UserResponse),
    (status = 401, description = "Missing/expired token", body = Problem),
), security(("jwt" = [])))]
#[get("/user")]
#[tracing::instrument]
pub async fn user_identity(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<UserResponse>, Problem> {
    let user = db
        .get_user(auth.user)
        .await?
        .ok_or_else(|| user_problem::not_found(auth.user))?;

    // Role is resolved fresh so revoked privileges take effect before the
    // token expires.
    let role = db.role_name_of(&user).await?;

    Ok(Json(UserResponse::new(&user, role)))
}

#[post("/change-password", format = "application/json", data = "<change>")]
#[tracing::instrument]
pub async fn change_password(
    change: Json<ChangePasswordData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Value, Problem> {
    let user = db
        .get_user(auth.user)
        .await?
        .ok_or_else(|| user_problem::not_found(auth.user))?;

    if !user.pw_hash.verify(&change.old_password) {
        return Err(user_problem::bad_password("Old password is incorrect."));
    }

    if change.new_password.len() < 8 {
        return Err(user_problem::bad_password(
            "Password must be at least 8 characters (bytes) long.",
        ));
    }

    db.set_password(user.id, PasswordHash::new(&change.new_password))
        .await?;

    Ok(json!({ "message": "Password changed." }))
}
