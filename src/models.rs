use crate::util::{null_as_default, round2};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Generate a new document id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// User document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub favorites: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name,
            email: email.to_lowercase(),
            password_hash,
            favorites: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a recipe to favorites, keeping the list free of duplicates.
    pub fn add_favorite(&mut self, recipe_id: &str) {
        if !self.favorites.iter().any(|id| id == recipe_id) {
            self.favorites.push(recipe_id.to_string());
            self.updated_at = Utc::now();
        }
    }

    pub fn remove_favorite(&mut self, recipe_id: &str) {
        let before = self.favorites.len();
        self.favorites.retain(|id| id != recipe_id);
        if self.favorites.len() != before {
            self.updated_at = Utc::now();
        }
    }
}

/// User as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub favorites: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
            favorites: user.favorites,
            created_at: user.created_at,
        }
    }
}

/// Comment left on a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Single 1-5 rating sample
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

/// Recipe document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Mean of all rating values rounded to two decimals, 0 when unrated.
    pub fn average_rating(&self) -> f64 {
        average_rating(&self.ratings)
    }

    /// Case-insensitive exact category match
    pub fn has_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.to_lowercase() == category.to_lowercase())
    }

    pub fn push_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
        self.updated_at = Utc::now();
    }

    pub fn push_rating(&mut self, rating: Rating) {
        self.ratings.push(rating);
        self.updated_at = Utc::now();
    }
}

pub fn average_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: f64 = ratings.iter().map(|r| r.value).sum();
    round2(total / ratings.len() as f64)
}

/// Partial update of a recipe. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub photo_url: Option<String>,
}

impl RecipePatch {
    /// Empty text and empty lists are ignored, except `categories`, which may be cleared.
    pub fn apply(&self, recipe: &mut Recipe) {
        if let Some(title) = self.title.as_ref().filter(|t| !t.is_empty()) {
            recipe.title = title.clone();
        }
        if let Some(description) = self.description.as_ref().filter(|d| !d.is_empty()) {
            recipe.description = description.clone();
        }
        if let Some(ingredients) = self.ingredients.as_ref().filter(|i| !i.is_empty()) {
            recipe.ingredients = ingredients.clone();
        }
        if let Some(instructions) = self.instructions.as_ref().filter(|i| !i.is_empty()) {
            recipe.instructions = instructions.clone();
        }
        if let Some(categories) = &self.categories {
            recipe.categories = categories.clone();
        }
        if let Some(photo_url) = &self.photo_url {
            recipe.photo_url = Some(photo_url.clone());
        }
        recipe.updated_at = Utc::now();
    }
}

/// Recipe summary returned by list, create and update
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRecipe {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub categories: Vec<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub average_rating: f64,
    pub comments_count: usize,
}

impl PublicRecipe {
    /// Project a recipe, prefixing locally stored photos with `public_url`.
    pub fn from_recipe(recipe: &Recipe, public_url: &str) -> Self {
        PublicRecipe {
            id: recipe.id.clone(),
            author_id: recipe.author_id.clone(),
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            ingredients: recipe.ingredients.clone(),
            instructions: recipe.instructions.clone(),
            categories: recipe.categories.clone(),
            photo_url: recipe
                .photo_url
                .as_deref()
                .map(|url| absolute_photo_url(url, public_url)),
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
            average_rating: recipe.average_rating(),
            comments_count: recipe.comments.len(),
        }
    }
}

fn absolute_photo_url(photo_url: &str, public_url: &str) -> String {
    if photo_url.starts_with("http") {
        photo_url.to_string()
    } else {
        format!("{}{}", public_url, photo_url)
    }
}

/// Full recipe with its comments and ratings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: PublicRecipe,
    pub comments: Vec<Comment>,
    pub ratings: Vec<Rating>,
}

impl RecipeDetail {
    pub fn from_recipe(recipe: Recipe, public_url: &str) -> Self {
        RecipeDetail {
            recipe: PublicRecipe::from_recipe(&recipe, public_url),
            comments: recipe.comments,
            ratings: recipe.ratings,
        }
    }
}

/// Request to comment on a recipe
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub author_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub text: String,
}

/// Request to rate a recipe; the value may arrive as a number or a numeric string
#[derive(Debug, Default, Deserialize)]
pub struct RatingRequest {
    #[serde(default)]
    pub value: serde_json::Value,
}

impl RatingRequest {
    /// The rating as a finite number within 1..=5
    pub fn score(&self) -> Option<f64> {
        let value = match &self.value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        (value.is_finite() && (1.0..=5.0).contains(&value)).then_some(value)
    }
}

/// Response after rating a recipe
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub average_rating: f64,
}

/// Current favorites of a user
#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<String>,
}

/// Query parameters for listing recipes
#[derive(Debug, Deserialize)]
pub struct ListRecipesQuery {
    pub category: Option<String>,
}

/// Document totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub users: i64,
    pub recipes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rating(value: f64) -> Rating {
        Rating {
            id: new_id(),
            value,
            created_at: Utc::now(),
        }
    }

    fn recipe() -> Recipe {
        let now = Utc::now();
        Recipe {
            id: new_id(),
            author_id: "author".to_string(),
            title: "Pancakes".to_string(),
            description: "Fluffy".to_string(),
            ingredients: vec!["flour".to_string(), "milk".to_string()],
            instructions: vec!["mix".to_string(), "fry".to_string()],
            categories: vec!["Breakfast".to_string()],
            photo_url: Some("/uploads/p.jpg".to_string()),
            comments: Vec::new(),
            ratings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[rating(4.0), rating(5.0)]), 4.5);
        assert_eq!(average_rating(&[rating(1.0), rating(2.0), rating(2.0)]), 1.67);
    }

    #[test]
    fn test_public_recipe_projection() {
        let mut r = recipe();
        r.push_rating(rating(3.0));
        r.push_comment(Comment {
            id: new_id(),
            author_name: "Ann".to_string(),
            text: "Tasty".to_string(),
            created_at: Utc::now(),
        });

        let public = PublicRecipe::from_recipe(&r, "http://localhost:5000");
        assert_eq!(public.photo_url.as_deref(), Some("http://localhost:5000/uploads/p.jpg"));
        assert_eq!(public.average_rating, 3.0);
        assert_eq!(public.comments_count, 1);

        let value = serde_json::to_value(&public).unwrap();
        assert!(value.get("comments").is_none());
        assert_eq!(value["authorId"], "author");
        assert_eq!(value["commentsCount"], 1);
    }

    #[test]
    fn test_absolute_photo_url_kept() {
        let mut r = recipe();
        r.photo_url = Some("https://cdn.example.com/p.jpg".to_string());
        let public = PublicRecipe::from_recipe(&r, "http://localhost:5000");
        assert_eq!(public.photo_url.as_deref(), Some("https://cdn.example.com/p.jpg"));
    }

    #[test]
    fn test_detail_flattens_summary() {
        let mut r = recipe();
        r.push_rating(rating(5.0));
        let value = serde_json::to_value(RecipeDetail::from_recipe(r, "")).unwrap();
        assert_eq!(value["title"], "Pancakes");
        assert_eq!(value["averageRating"], 5.0);
        assert_eq!(value["ratings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_has_category_case_insensitive() {
        let r = recipe();
        assert!(r.has_category("breakfast"));
        assert!(!r.has_category("break"));
    }

    #[test]
    fn test_patch_ignores_empty_values_but_clears_categories() {
        let mut r = recipe();
        let patch = RecipePatch {
            title: Some(String::new()),
            description: Some("Crispy".to_string()),
            ingredients: Some(Vec::new()),
            categories: Some(Vec::new()),
            ..Default::default()
        };
        patch.apply(&mut r);

        assert_eq!(r.title, "Pancakes");
        assert_eq!(r.description, "Crispy");
        assert_eq!(r.ingredients.len(), 2);
        assert!(r.categories.is_empty());
    }

    #[test]
    fn test_favorites_deduplicated() {
        let mut user = User::new("Ann".to_string(), "Ann@Example.com", "hash".to_string());
        assert_eq!(user.email, "ann@example.com");
        user.add_favorite("r1");
        user.add_favorite("r1");
        user.add_favorite("r2");
        assert_eq!(user.favorites, vec!["r1", "r2"]);
        user.remove_favorite("r1");
        assert_eq!(user.favorites, vec!["r2"]);
    }

    #[test]
    fn test_rating_score_parsing() {
        let score = |v: serde_json::Value| RatingRequest { value: v }.score();
        assert_eq!(score(json!(4)), Some(4.0));
        assert_eq!(score(json!("2.5")), Some(2.5));
        assert_eq!(score(json!(0)), None);
        assert_eq!(score(json!(6)), None);
        assert_eq!(score(json!("abc")), None);
        assert_eq!(score(json!(null)), None);
    }

    #[test]
    fn test_public_user_hides_password() {
        let user = User::new("Ann".to_string(), "a@b.c", "secret-hash".to_string());
        let value = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["email"], "a@b.c");
    }
}
