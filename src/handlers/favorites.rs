// src/handlers/favorites.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::{AppError, is_unique_violation},
    models::favorite::{
        FavoriteResponse, HistoryEntry, HistoryResponse, ListingHistoryItem, ReviewHistoryItem,
    },
    utils::jwt::Claims,
};

/// Add a restaurant to the current user's favorites.
/// At most one favorite per (user, restaurant) pair.
pub async fn add_favorite(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(restaurant_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM restaurants WHERE id = $1")
        .bind(restaurant_id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Restaurant not found".to_string()));
    }

    sqlx::query("INSERT INTO favorites (user_id, restaurant_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(restaurant_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "uq_favorite_per_user_restaurant") {
                AppError::Conflict("Restaurant already in favorites".to_string())
            } else {
                tracing::error!("Failed to add favorite: {:?}", e);
                AppError::from(e)
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Restaurant added to favorites" })),
    ))
}

/// Remove a restaurant from the current user's favorites.
pub async fn remove_favorite(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(restaurant_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND restaurant_id = $2")
        .bind(claims.user_id())
        .bind(restaurant_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Restaurant not in favorites".to_string()));
    }

    Ok(Json(serde_json::json!({
        "message": "Restaurant removed from favorites"
    })))
}

/// List the current user's favorites with restaurant summaries, newest first.
pub async fn list_my_favorites(
    State(pool): State<PgPool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let favorites = sqlx::query_as::<_, FavoriteResponse>(
        "SELECT f.id, f.restaurant_id, r.name as restaurant_name, r.cuisine_type, r.city, \
                r.price_tier, r.avg_rating, r.review_count, f.created_at as favorited_at \
         FROM favorites f \
         JOIN restaurants r ON f.restaurant_id = r.id \
         WHERE f.user_id = $1 \
         ORDER BY f.created_at DESC",
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(favorites))
}

/// The current user's activity history: authored reviews and listings they
/// added, each branch ordered newest first independently.
pub async fn get_history(
    State(pool): State<PgPool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let reviews = sqlx::query_as::<_, ReviewHistoryItem>(
        "SELECT rv.id as review_id, rv.rating, rv.comment, rv.restaurant_id, \
                r.name as restaurant_name, rv.created_at \
         FROM reviews rv \
         JOIN restaurants r ON rv.restaurant_id = r.id \
         WHERE rv.user_id = $1 \
         ORDER BY rv.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let listings = sqlx::query_as::<_, ListingHistoryItem>(
        "SELECT id as restaurant_id, name as restaurant_name, cuisine_type, city, created_at \
         FROM restaurants \
         WHERE owner_id = $1 \
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let total_reviews = reviews.len();
    let total_listings_added = listings.len();

    Ok(Json(HistoryResponse {
        user_id,
        reviews: reviews.into_iter().map(HistoryEntry::Review).collect(),
        listings_added: listings.into_iter().map(HistoryEntry::ListingAdded).collect(),
        total_reviews,
        total_listings_added,
    }))
}
