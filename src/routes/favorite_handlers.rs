use crate::error::{AppError, AppResult};
use crate::models::{FavoritesResponse, PublicRecipe};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json};
use std::sync::Arc;

use super::helpers::extract_claims;
use super::AppState;

fn unknown_user() -> AppError {
    AppError::Unauthorized("Unauthorized".to_string())
}

/// Add a recipe to the caller's favorites
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let claims = extract_claims(&headers, &state.auth_service)?;

    if state.repository.find_recipe(&id).await?.is_none() {
        return Err(AppError::not_found());
    }

    let favorites = state
        .repository
        .add_favorite(&claims.sub, &id)
        .await?
        .ok_or_else(unknown_user)?;

    Ok(Json(FavoritesResponse { favorites }))
}

/// Remove a recipe from the caller's favorites
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let claims = extract_claims(&headers, &state.auth_service)?;

    let favorites = state
        .repository
        .remove_favorite(&claims.sub, &id)
        .await?
        .ok_or_else(unknown_user)?;

    Ok(Json(FavoritesResponse { favorites }))
}

/// List the caller's favorite recipes
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let claims = extract_claims(&headers, &state.auth_service)?;

    let user = state
        .repository
        .find_user(&claims.sub)
        .await?
        .ok_or_else(unknown_user)?;

    let recipes = state.repository.find_recipes(&user.favorites).await?;
    let responses: Vec<PublicRecipe> = recipes
        .iter()
        .map(|recipe| PublicRecipe::from_recipe(recipe, &state.public_url))
        .collect();

    Ok(Json(responses))
}
