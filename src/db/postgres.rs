use super::Repository;
use crate::error::{AppError, AppResult};
use crate::models::{Comment, Rating, Recipe, RecipePatch, StoreCounts, User};
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    types::Json,
    ConnectOptions, PgPool, Postgres, Transaction,
};
use std::str::FromStr;
use std::time::Duration;

/// Repository storing each user and recipe as a JSONB document row.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository with a connection pool
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_seconds: u64,
    ) -> AppResult<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Configuration(format!("Invalid database URL: {}", e)))?
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    async fn lock_recipe(
        tx: &mut Transaction<'_, Postgres>,
        id: &str,
    ) -> AppResult<Option<Recipe>> {
        let doc = sqlx::query_scalar::<_, Json<Recipe>>(
            r#"
            SELECT doc FROM recipes WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(doc.map(|Json(recipe)| recipe))
    }

    /// Load a recipe row under lock, apply `f` and write the document back.
    async fn mutate_recipe(
        &self,
        id: &str,
        f: impl FnOnce(&mut Recipe) + Send,
    ) -> AppResult<Option<Recipe>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut recipe) = Self::lock_recipe(&mut tx, id).await? else {
            return Ok(None);
        };
        f(&mut recipe);

        sqlx::query(
            r#"
            UPDATE recipes SET doc = $2 WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(&recipe))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(recipe))
    }

    async fn mutate_user(
        &self,
        id: &str,
        f: impl FnOnce(&mut User) + Send,
    ) -> AppResult<Option<Vec<String>>> {
        let mut tx = self.pool.begin().await?;

        let doc = sqlx::query_scalar::<_, Json<User>>(
            r#"
            SELECT doc FROM users WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(Json(mut user)) = doc else {
            return Ok(None);
        };
        f(&mut user);

        sqlx::query(
            r#"
            UPDATE users SET doc = $2 WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(&user))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(user.favorites))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn run_migrations(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn count(&self) -> AppResult<StoreCounts> {
        let row = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM recipes) AS recipes
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreCounts {
            users: row.0,
            recipes: row.1,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let doc = sqlx::query_scalar::<_, Json<User>>(
            r#"
            SELECT doc FROM users WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc.map(|Json(user)| user))
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<User>> {
        let doc = sqlx::query_scalar::<_, Json<User>>(
            r#"
            SELECT doc FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc.map(|Json(user)| user))
    }

    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, doc, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(Json(user))
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::EmailExists("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn add_favorite(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<Option<Vec<String>>> {
        self.mutate_user(user_id, |user| user.add_favorite(recipe_id))
            .await
    }

    async fn remove_favorite(
        &self,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<Option<Vec<String>>> {
        self.mutate_user(user_id, |user| user.remove_favorite(recipe_id))
            .await
    }

    async fn list_recipes(&self, category: Option<&str>) -> AppResult<Vec<Recipe>> {
        let docs = sqlx::query_scalar::<_, Json<Recipe>>(
            r#"
            SELECT doc FROM recipes
            WHERE $1::text IS NULL
               OR EXISTS (
                    SELECT 1 FROM jsonb_array_elements_text(doc->'categories') AS c(name)
                    WHERE lower(c.name) = lower($1::text)
               )
            ORDER BY created_at ASC
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(docs.into_iter().map(|Json(recipe)| recipe).collect())
    }

    async fn find_recipe(&self, id: &str) -> AppResult<Option<Recipe>> {
        let doc = sqlx::query_scalar::<_, Json<Recipe>>(
            r#"
            SELECT doc FROM recipes WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc.map(|Json(recipe)| recipe))
    }

    async fn find_recipes(&self, ids: &[String]) -> AppResult<Vec<Recipe>> {
        let docs = sqlx::query_scalar::<_, Json<Recipe>>(
            r#"
            SELECT doc FROM recipes
            WHERE id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(docs.into_iter().map(|Json(recipe)| recipe).collect())
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, author_id, doc, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&recipe.id)
        .bind(&recipe.author_id)
        .bind(Json(recipe))
        .bind(recipe.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_recipe(&self, id: &str, patch: &RecipePatch) -> AppResult<Option<Recipe>> {
        self.mutate_recipe(id, |recipe| patch.apply(recipe)).await
    }

    async fn delete_recipe(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM recipes WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_comment(&self, recipe_id: &str, comment: &Comment) -> AppResult<Option<Recipe>> {
        self.mutate_recipe(recipe_id, |recipe| recipe.push_comment(comment.clone()))
            .await
    }

    async fn add_rating(&self, recipe_id: &str, rating: &Rating) -> AppResult<Option<Recipe>> {
        self.mutate_recipe(recipe_id, |recipe| recipe.push_rating(rating.clone()))
            .await
    }
}
