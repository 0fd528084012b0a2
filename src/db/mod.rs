//! Document storage.
//!
//! Handlers talk to a [`Repository`] trait object; the concrete backend is
//! chosen from configuration at start-up. Every mutating method is a single
//! atomic read-modify-write in its backend.

mod json_file;
mod postgres;

pub use json_file::JsonFileRepository;
pub use postgres::PostgresRepository;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{AppError, AppResult};
use crate::models::{Comment, Rating, Recipe, RecipePatch, StoreCounts, User};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Cheap connectivity check
    async fn ping(&self) -> AppResult<()>;

    /// Apply pending schema changes, if the backend has any
    async fn run_migrations(&self) -> AppResult<()>;

    async fn count(&self) -> AppResult<StoreCounts>;

    /// Look up a user by lower-cased email
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_user(&self, id: &str) -> AppResult<Option<User>>;

    /// Insert a new user; fails with `AppError::EmailExists` on a duplicate email.
    async fn insert_user(&self, user: &User) -> AppResult<()>;

    /// Add a favorite, returning the updated list or `None` for an unknown user.
    async fn add_favorite(&self, user_id: &str, recipe_id: &str)
        -> AppResult<Option<Vec<String>>>;

    async fn remove_favorite(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<Option<Vec<String>>>;

    /// All recipes in creation order, optionally filtered by category.
    async fn list_recipes(&self, category: Option<&str>) -> AppResult<Vec<Recipe>>;

    async fn find_recipe(&self, id: &str) -> AppResult<Option<Recipe>>;

    /// Recipes whose id is in `ids`, in creation order.
    async fn find_recipes(&self, ids: &[String]) -> AppResult<Vec<Recipe>>;

    async fn insert_recipe(&self, recipe: &Recipe) -> AppResult<()>;

    async fn update_recipe(&self, id: &str, patch: &RecipePatch) -> AppResult<Option<Recipe>>;

    async fn delete_recipe(&self, id: &str) -> AppResult<bool>;

    async fn add_comment(&self, recipe_id: &str, comment: &Comment) -> AppResult<Option<Recipe>>;

    async fn add_rating(&self, recipe_id: &str, rating: &Rating) -> AppResult<Option<Recipe>>;
}

/// Open the repository selected by `config`.
pub async fn connect(config: &StoreConfig) -> AppResult<Arc<dyn Repository>> {
    match config.backend {
        StoreBackend::Json => {
            let repository = JsonFileRepository::open(&config.data_file).await?;
            Ok(Arc::new(repository))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::MissingEnvVar("DATABASE_URL".to_string()))?;
            let repository = PostgresRepository::new(
                url,
                config.max_connections,
                config.min_connections,
                config.acquire_timeout_seconds,
            )
            .await?;
            Ok(Arc::new(repository))
        }
    }
}
