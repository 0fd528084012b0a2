use super::Repository;
use crate::error::{AppError, AppResult};
use crate::models::{Comment, Rating, Recipe, RecipePatch, StoreCounts, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// On-disk shape of the data file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    recipes: Vec<Recipe>,
}

/// Repository keeping every document in one JSON file.
///
/// The whole file is read, modified and rewritten per operation while holding
/// `lock`, so concurrent requests never interleave their writes.
pub struct JsonFileRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRepository {
    /// Open the data file, creating it with an empty database when missing or blank.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let repository = Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        };

        let _guard = repository.lock.lock().await;
        let database = repository.load().await?;
        repository.persist(&database).await?;
        drop(_guard);

        Ok(repository)
    }

    async fn load(&self) -> AppResult<Database> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Database::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Database::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file and rename over the original.
    async fn persist(&self, database: &Database) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(database)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn read<T>(&self, f: impl FnOnce(&Database) -> T) -> AppResult<T> {
        let _guard = self.lock.lock().await;
        let database = self.load().await?;
        Ok(f(&database))
    }

    /// Run `f` against the loaded database and persist it when `f` reports a change.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Database) -> AppResult<(T, bool)>,
    ) -> AppResult<T> {
        let _guard = self.lock.lock().await;
        let mut database = self.load().await?;
        let (result, changed) = f(&mut database)?;
        if changed {
            self.persist(&database).await?;
        }
        Ok(result)
    }

    async fn mutate_recipe(
        &self,
        id: &str,
        f: impl FnOnce(&mut Recipe),
    ) -> AppResult<Option<Recipe>> {
        self.mutate(|db| match db.recipes.iter_mut().find(|r| r.id == id) {
            Some(recipe) => {
                f(recipe);
                Ok((Some(recipe.clone()), true))
            }
            None => Ok((None, false)),
        })
        .await
    }

    async fn mutate_user(
        &self,
        id: &str,
        f: impl FnOnce(&mut User),
    ) -> AppResult<Option<Vec<String>>> {
        self.mutate(|db| match db.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                f(user);
                Ok((Some(user.favorites.clone()), true))
            }
            None => Ok((None, false)),
        })
        .await
    }
}

#[async_trait]
impl Repository for JsonFileRepository {
    fn backend(&self) -> &'static str {
        "json"
    }

    async fn ping(&self) -> AppResult<()> {
        self.read(|_| ()).await
    }

    async fn run_migrations(&self) -> AppResult<()> {
        tracing::info!("JSON store has no migrations");
        Ok(())
    }

    async fn count(&self) -> AppResult<StoreCounts> {
        self.read(|db| StoreCounts {
            users: db.users.len() as i64,
            recipes: db.recipes.len() as i64,
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.read(|db| db.users.iter().find(|u| u.email == email).cloned())
            .await
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<User>> {
        self.read(|db| db.users.iter().find(|u| u.id == id).cloned())
            .await
    }

    async fn insert_user(&self, user: &User) -> AppResult<()> {
        self.mutate(|db| {
            if db.users.iter().any(|u| u.email == user.email) {
                return Err(AppError::EmailExists("Email already registered".to_string()));
            }
            db.users.push(user.clone());
            Ok(((), true))
        })
        .await
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
        self.read(|db| {
            db.recipes
                .iter()
                .filter(|r| category.map_or(true, |c| r.has_category(c)))
                .cloned()
                .collect()
        })
        .await
    }

    async fn find_recipe(&self, id: &str) -> AppResult<Option<Recipe>> {
        self.read(|db| db.recipes.iter().find(|r| r.id == id).cloned())
            .await
    }

    async fn find_recipes(&self, ids: &[String]) -> AppResult<Vec<Recipe>> {
        self.read(|db| {
            db.recipes
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect()
        })
        .await
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> AppResult<()> {
        self.mutate(|db| {
            db.recipes.push(recipe.clone());
            Ok(((), true))
        })
        .await
    }

    async fn update_recipe(&self, id: &str, patch: &RecipePatch) -> AppResult<Option<Recipe>> {
        self.mutate_recipe(id, |recipe| patch.apply(recipe)).await
    }

    async fn delete_recipe(&self, id: &str) -> AppResult<bool> {
        self.mutate(|db| {
            let before = db.recipes.len();
            db.recipes.retain(|r| r.id != id);
            let deleted = db.recipes.len() != before;
            Ok((deleted, deleted))
        })
        .await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::new_id;
    use chrono::Utc;
    use std::sync::Arc;

    fn recipe(author: &str, categories: &[&str]) -> Recipe {
        let now = Utc::now();
        Recipe {
            id: new_id(),
            author_id: author.to_string(),
            title: "Soup".to_string(),
            description: "Warm".to_string(),
            ingredients: vec!["water".to_string()],
            instructions: vec!["boil".to_string()],
            categories: categories.iter().map(|c| c.to_string()).collect(),
            photo_url: Some("/uploads/soup.png".to_string()),
            comments: Vec::new(),
            ratings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_open_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");

        let repo = JsonFileRepository::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(repo.count().await.unwrap(), StoreCounts { users: 0, recipes: 0 });
    }

    #[tokio::test]
    async fn test_open_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        tokio::fs::write(&path, "  \n").await.unwrap();

        let repo = JsonFileRepository::open(&path).await.unwrap();
        assert_eq!(repo.count().await.unwrap().recipes, 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path().join("db.json")).await.unwrap();

        let user = User::new("Ann".to_string(), "ann@example.com", "h".to_string());
        repo.insert_user(&user).await.unwrap();

        let again = User::new("Other".to_string(), "ANN@example.com", "h".to_string());
        let err = repo.insert_user(&again).await.unwrap_err();
        assert!(matches!(err, AppError::EmailExists(_)));
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let r = recipe("author", &["Soup"]);
        {
            let repo = JsonFileRepository::open(&path).await.unwrap();
            repo.insert_recipe(&r).await.unwrap();
        }

        let repo = JsonFileRepository::open(&path).await.unwrap();
        let found = repo.find_recipe(&r.id).await.unwrap().expect("recipe persisted");
        assert_eq!(found.title, "Soup");
    }

    #[tokio::test]
    async fn test_category_filter() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path().join("db.json")).await.unwrap();

        repo.insert_recipe(&recipe("a", &["Dessert"])).await.unwrap();
        repo.insert_recipe(&recipe("a", &["Dinner"])).await.unwrap();

        assert_eq!(repo.list_recipes(None).await.unwrap().len(), 2);
        assert_eq!(repo.list_recipes(Some("dessert")).await.unwrap().len(), 1);
        assert!(repo.list_recipes(Some("lunch")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_ratings_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(JsonFileRepository::open(dir.path().join("db.json")).await.unwrap());
        let r = recipe("a", &[]);
        repo.insert_recipe(&r).await.unwrap();

        let mut handles = Vec::new();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0, 5.0, 4.0, 3.0] {
            let repo = repo.clone();
            let id = r.id.clone();
            handles.push(tokio::spawn(async move {
                let rating = Rating {
                    id: new_id(),
                    value,
                    created_at: Utc::now(),
                };
                repo.add_rating(&id, &rating).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo.find_recipe(&r.id).await.unwrap().unwrap();
        assert_eq!(stored.ratings.len(), 8);
        assert_eq!(stored.average_rating(), 3.38);
    }

    #[tokio::test]
    async fn test_missing_recipe_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path().join("db.json")).await.unwrap();

        assert!(!repo.delete_recipe("nope").await.unwrap());
        assert!(repo
            .update_recipe("nope", &RecipePatch::default())
            .await
            .unwrap()
            .is_none());
        assert!(repo.add_favorite("nobody", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_favorites_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path().join("db.json")).await.unwrap();

        let user = User::new("Ann".to_string(), "ann@example.com", "h".to_string());
        repo.insert_user(&user).await.unwrap();
        let first = recipe("a", &[]);
        let second = recipe("a", &[]);
        repo.insert_recipe(&first).await.unwrap();
        repo.insert_recipe(&second).await.unwrap();

        repo.add_favorite(&user.id, &second.id).await.unwrap();
        let favorites = repo.add_favorite(&user.id, &second.id).await.unwrap().unwrap();
        assert_eq!(favorites, vec![second.id.clone()]);

        let found = repo.find_recipes(&favorites).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, second.id);

        let favorites = repo.remove_favorite(&user.id, &second.id).await.unwrap().unwrap();
        assert!(favorites.is_empty());
    }
}
