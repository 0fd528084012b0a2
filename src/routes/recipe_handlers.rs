use crate::error::{AppError, AppResult};
use crate::models::{
    new_id, Comment, CommentRequest, ListRecipesQuery, PublicRecipe, Rating, RatingRequest,
    RatingResponse, Recipe, RecipeDetail, RecipePatch,
};
use crate::services::photos::PhotoService;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use super::helpers::{extract_claims, JsonBody, RecipeForm};
use super::AppState;

/// Create a recipe from a multipart form (requires authentication)
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let claims = extract_claims(&headers, &state.auth_service)?;
    let form = RecipeForm::from_multipart(multipart).await?;

    let missing = || AppError::Validation("Missing required fields".to_string());
    let title = form.text("title").ok_or_else(missing)?;
    let description = form.text("description").ok_or_else(missing)?;
    let ingredients = form
        .lines("ingredients")
        .filter(|items| !items.is_empty())
        .ok_or_else(missing)?;
    let instructions = form
        .lines("instructions")
        .filter(|items| !items.is_empty())
        .ok_or_else(missing)?;
    let categories = form.commas("categories").unwrap_or_default();

    let photo = form
        .photo
        .as_ref()
        .ok_or_else(|| AppError::Validation("Photo is required".to_string()))?;
    let photo_url =
        PhotoService::save(&state.upload_dir, photo.file_name.as_deref(), &photo.bytes).await?;

    let now = Utc::now();
    let recipe = Recipe {
        id: new_id(),
        author_id: claims.sub,
        title,
        description,
        ingredients,
        instructions,
        categories,
        photo_url: Some(photo_url),
        comments: Vec::new(),
        ratings: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    state.repository.insert_recipe(&recipe).await?;
    tracing::info!(recipe_id = %recipe.id, author_id = %recipe.author_id, "Recipe created");

    Ok((
        StatusCode::CREATED,
        Json(PublicRecipe::from_recipe(&recipe, &state.public_url)),
    ))
}

/// List recipes, optionally filtered by category
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRecipesQuery>,
) -> AppResult<impl IntoResponse> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let recipes = state.repository.list_recipes(category).await?;
    let responses: Vec<PublicRecipe> = recipes
        .iter()
        .map(|recipe| PublicRecipe::from_recipe(recipe, &state.public_url))
        .collect();

    Ok(Json(responses))
}

/// Get a recipe with its comments and ratings
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let recipe = state
        .repository
        .find_recipe(&id)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(RecipeDetail::from_recipe(recipe, &state.public_url)))
}

/// Load a recipe and make sure the caller wrote it
async fn find_owned_recipe(state: &AppState, id: &str, user_id: &str) -> AppResult<Recipe> {
    let recipe = state
        .repository
        .find_recipe(id)
        .await?
        .ok_or_else(AppError::not_found)?;

    if recipe.author_id != user_id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    Ok(recipe)
}

/// Partially update a recipe (author only)
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let claims = extract_claims(&headers, &state.auth_service)?;
    let existing = find_owned_recipe(&state, &id, &claims.sub).await?;

    let form = RecipeForm::from_multipart(multipart).await?;
    let photo_url = match &form.photo {
        Some(photo) => Some(
            PhotoService::save(&state.upload_dir, photo.file_name.as_deref(), &photo.bytes)
                .await?,
        ),
        None => None,
    };

    let patch = RecipePatch {
        title: form.text("title"),
        description: form.text("description"),
        ingredients: form.lines("ingredients"),
        instructions: form.lines("instructions"),
        categories: form.commas("categories"),
        photo_url,
    };

    let Some(recipe) = state.repository.update_recipe(&id, &patch).await? else {
        // Deleted concurrently; drop the photo we just stored
        if let Some(new_photo) = patch.photo_url.as_deref() {
            PhotoService::remove(&state.upload_dir, new_photo).await;
        }
        return Err(AppError::not_found());
    };

    if patch.photo_url.is_some() {
        if let Some(old_photo) = existing.photo_url.as_deref() {
            PhotoService::remove(&state.upload_dir, old_photo).await;
        }
    }

    Ok(Json(PublicRecipe::from_recipe(&recipe, &state.public_url)))
}

/// Delete a recipe (author only)
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let claims = extract_claims(&headers, &state.auth_service)?;
    let recipe = find_owned_recipe(&state, &id, &claims.sub).await?;

    if !state.repository.delete_recipe(&id).await? {
        return Err(AppError::not_found());
    }

    if let Some(photo_url) = recipe.photo_url.as_deref() {
        PhotoService::remove(&state.upload_dir, photo_url).await;
    }

    tracing::info!(recipe_id = %id, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Comment on a recipe
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|_| AppError::Validation("authorName and text required".to_string()))?;

    let comment = Comment {
        id: new_id(),
        author_name: payload.author_name,
        text: payload.text,
        created_at: Utc::now(),
    };

    state
        .repository
        .add_comment(&id, &comment)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Rate a recipe from 1 to 5
pub async fn add_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<RatingRequest>,
) -> AppResult<impl IntoResponse> {
    let value = payload
        .score()
        .ok_or_else(|| AppError::Validation("value 1-5 required".to_string()))?;

    let rating = Rating {
        id: new_id(),
        value,
        created_at: Utc::now(),
    };

    let recipe = state
        .repository
        .add_rating(&id, &rating)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok((
        StatusCode::CREATED,
        Json(RatingResponse {
            average_rating: recipe.average_rating(),
        }),
    ))
}
