use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::category::{
    problem, Category, CategoryCreateData, CategoryDbExt, CategoryUpdateData,
};
use crate::middleware::paging::PageState;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};

fn require_admin(auth: &UserRoleToken) -> Result<(), Problem> {
    if !auth.role.is_admin() {
        return Err(problems::forbidden("Admins only."));
    }
    Ok(())
}

#[utoipa::path(context_path = "/api/categories", request_body = CategoryCreateData, responses(
    (status = 200, description = "Created category", body = Category),
    (status = 403, description = "Caller isn't an admin", body = Problem),
), security(("jwt" = [])))]
#[post("/", format = "application/json", data = "<category>")]
#[tracing::instrument]
pub async fn category_create(
    category: Json<CategoryCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Category>, Problem> {
    require_admin(&auth)?;

    Ok(Json(db.create_category(category.into_inner()).await?))
}

/// Newest-first category listing.
#[get("/")]
#[tracing::instrument]
pub async fn category_list(
    db: &State<Database>,
    page: PageState,
) -> Result<Json<Vec<Category>>, Problem> {
    Ok(Json(db.list_categories(page).await?))
}

#[get("/<id>")]
#[tracing::instrument]
pub async fn category_get(id: Uuid, db: &State<Database>) -> Result<Json<Category>, Problem> {
    let category = db
        .get_category(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    Ok(Json(category))
}

#[put("/<id>", format = "application/json", data = "<category>")]
#[tracing::instrument]
pub async fn category_update(
    id: Uuid,
    category: Json<CategoryUpdateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Category>, Problem> {
    require_admin(&auth)?;

    let updated = db
        .update_category(id, category.into_inner())
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    Ok(Json(updated))
}

#[delete("/<id>")]
#[tracing::instrument]
pub async fn category_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<serde_json::Value>, Problem> {
    require_admin(&auth)?;

    db.delete_category(id)
        .await?
        .ok_or_else(|| problem::not_found(id))?;

    Ok(Json(serde_json::json!({ "message": "Category deleted successfully" })))
}
