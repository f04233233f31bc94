use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;

use crate::data::profile::{
    problem, Profile, ProfileCreateData, ProfileDbExt, ProfileUpdateData,
};
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::Problem;

/// Create the caller's profile; each account has at most one.
#[utoipa::path(context_path = "/api", request_body = ProfileCreateData, responses(
    (status = 200, description = "Created profile", body = Profile),
    (status = 409, description = "Profile already exists", body = Problem),
), security(("jwt" = [])))]
#[post("/profile", format = "application/json", data = "<profile>")]
#[tracing::instrument]
pub async fn profile_create(
    profile: Json<ProfileCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Profile>, Problem> {
    Ok(Json(db.create_profile(auth.user, profile.into_inner()).await?))
}

#[put("/profile", format = "application/json", data = "<profile>")]
#[tracing::instrument]
pub async fn profile_update(
    profile: Json<ProfileUpdateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Profile>, Problem> {
    let updated = db
        .update_profile(auth.user, profile.into_inner())
        .await?
        .ok_or_else(problem::not_found)?;

    Ok(Json(updated))
}

#[get("/profile")]
#[tracing::instrument]
pub async fn profile_get(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Profile>, Problem> {
    let profile = db
        .profile_by_user(auth.user)
        .await?
        .ok_or_else(problem::not_found)?;

    Ok(Json(profile))
}
