use bson::doc;
use chrono::{DateTime, Utc};
use mongodb::options::FindOptions;
use mongodb::Database;
use rocket::futures::StreamExt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::filter;
use crate::middleware::paging::PageState;
use crate::resp::problem::Problem;

pub static CATEGORY_COLLECTION_NAME: &str = "categories";

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "Category doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryCreateData {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryUpdateData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

pub trait CategoryDbExt {
    async fn create_category(&self, data: CategoryCreateData) -> Result<Category, Problem>;

    /// Newest-first listing, paged.
    async fn list_categories(&self, page: PageState) -> Result<Vec<Category>, Problem>;

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Problem>;

    async fn update_category(
        &self,
        id: Uuid,
        data: CategoryUpdateData,
    ) -> Result<Option<Category>, Problem>;

    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, Problem>;
}

impl CategoryDbExt for Database {
    async fn create_category(&self, data: CategoryCreateData) -> Result<Category, Problem> {
        let category = Category {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            image: data.image,
            created: Utc::now(),
        };

        self.collection::<Category>(CATEGORY_COLLECTION_NAME)
            .insert_one(&category, None)
            .await
            .map_err(Problem::from)?;

        Ok(category)
    }

    async fn list_categories(&self, page: PageState) -> Result<Vec<Category>, Problem> {
        let options = FindOptions::builder()
            .sort(doc! { "created": -1 })
            .skip((page.page as u64) * page.page_length as u64)
            .limit(page.page_length as i64)
            .build();

        let mut cursor = self
            .collection::<Category>(CATEGORY_COLLECTION_NAME)
            .find(None, options)
            .await
            .map_err(Problem::from)?;

        let mut categories = vec![];
        while let Some(category) = cursor.next().await {
            match category {
                Ok(it) => categories.push(it),
                Err(_) => tracing::warn!("Unable to deserialize Category document."),
            }
        }

        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Problem> {
        self.collection(CATEGORY_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn update_category(
        &self,
        id: Uuid,
        data: CategoryUpdateData,
    ) -> Result<Option<Category>, Problem> {
        let mut changes = doc! {};
        if let Some(name) = data.name {
            changes.insert("name", name);
        }
        if let Some(description) = data.description {
            changes.insert("description", description);
        }
        if let Some(image) = data.image {
            changes.insert("image", image);
        }

        if changes.is_empty() {
            return self.get_category(id).await;
        }

        self.collection::<Category>(CATEGORY_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_id(id),
                doc! { "$set": changes },
                mongodb::options::FindOneAndUpdateOptions::builder()
                    .return_document(mongodb::options::ReturnDocument::After)
                    .build(),
            )
            .await
            .map_err(Problem::from)
    }

    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, Problem> {
        self.collection(CATEGORY_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }
}
