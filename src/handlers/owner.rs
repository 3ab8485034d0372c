// src/handlers/owner.rs
//
// All routes in this module sit behind auth + owner-role middleware.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::restaurants::{RESTAURANT_COLUMNS, apply_restaurant_update},
    models::{
        claim::{Claim, ClaimRequest, ClaimStatus},
        restaurant::{Restaurant, UpdateRestaurantRequest},
        review::ReviewResponse,
    },
    utils::jwt::Claims,
};

const CLAIM_COLUMNS: &str = "id, user_id, restaurant_id, status, created_at";

/// List the restaurants owned by the caller.
pub async fn list_owner_restaurants(
    State(pool): State<PgPool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let query = format!(
        "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE owner_id = $1 ORDER BY created_at DESC"
    );
    let restaurants = sqlx::query_as::<_, Restaurant>(&query)
        .bind(claims.user_id())
        .fetch_all(&pool)
        .await?;

    Ok(Json(restaurants))
}

/// Update one of the caller's restaurants.
pub async fn update_owner_restaurant(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(restaurant_id): Path<i64>,
    Json(payload): Json<UpdateRestaurantRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let restaurant = fetch_owned_restaurant(&pool, restaurant_id, claims.user_id()).await?;

    apply_restaurant_update(&pool, restaurant.id, payload).await?;

    let query = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1");
    let updated = sqlx::query_as::<_, Restaurant>(&query)
        .bind(restaurant.id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(updated))
}

/// View the reviews on one of the caller's restaurants (read-only).
pub async fn list_owner_restaurant_reviews(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(restaurant_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_owned_restaurant(&pool, restaurant_id, claims.user_id()).await?;

    let reviews = sqlx::query_as::<_, ReviewResponse>(
        "SELECT r.id, r.user_id, r.restaurant_id, r.rating, r.comment, \
                r.created_at, r.updated_at, u.name as user_name \
         FROM reviews r \
         JOIN users u ON r.user_id = u.id \
         WHERE r.restaurant_id = $1 \
         ORDER BY r.created_at DESC",
    )
    .bind(restaurant_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(reviews))
}

/// Submit a claim for a restaurant.
///
/// Claims are auto-approved: in one transaction the claim row is created in
/// the approved state and the restaurant's owner/is_claimed are flipped to
/// the caller, with the restaurant row locked FOR UPDATE so concurrent
/// claims serialize.
pub async fn claim_restaurant(
    State(pool): State<PgPool>,
    claims: Claims,
    Json(payload): Json<ClaimRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();
    let restaurant_id = payload.restaurant_id;

    let mut tx = pool.begin().await?;

    let restaurant: Option<(bool, Option<i64>)> = sqlx::query_as(
        "SELECT is_claimed, owner_id FROM restaurants WHERE id = $1 FOR UPDATE",
    )
    .bind(restaurant_id)
    .fetch_optional(&mut *tx)
    .await?;
    let (is_claimed, owner_id) =
        restaurant.ok_or(AppError::NotFound("Restaurant not found".to_string()))?;

    if is_claimed && owner_id != Some(user_id) {
        return Err(AppError::Conflict(
            "This restaurant has already been claimed by another owner".to_string(),
        ));
    }

    let pending: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM restaurant_claims \
         WHERE user_id = $1 AND restaurant_id = $2 AND status = $3",
    )
    .bind(user_id)
    .bind(restaurant_id)
    .bind(ClaimStatus::Pending.as_str())
    .fetch_optional(&mut *tx)
    .await?;
    if pending.is_some() {
        return Err(AppError::Conflict(
            "You already have a pending claim for this restaurant".to_string(),
        ));
    }

    // No manual moderation step: pending -> approved immediately.
    debug_assert!(ClaimStatus::Pending.can_transition_to(ClaimStatus::Approved));
    let insert = format!(
        "INSERT INTO restaurant_claims (user_id, restaurant_id, status) \
         VALUES ($1, $2, $3) RETURNING {CLAIM_COLUMNS}"
    );
    let claim = sqlx::query_as::<_, Claim>(&insert)
        .bind(user_id)
        .bind(restaurant_id)
        .bind(ClaimStatus::Approved.as_str())
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("UPDATE restaurants SET is_claimed = TRUE, owner_id = $1 WHERE id = $2")
        .bind(user_id)
        .bind(restaurant_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(claim)))
}

/// List the caller's claims, newest first.
pub async fn list_claims(
    State(pool): State<PgPool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let query = format!(
        "SELECT {CLAIM_COLUMNS} FROM restaurant_claims WHERE user_id = $1 ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, Claim>(&query)
        .bind(claims.user_id())
        .fetch_all(&pool)
        .await?;

    Ok(Json(rows))
}

/// Withdraw one of the caller's pending claims (pending -> rejected).
/// Approved and rejected claims are terminal and cannot be withdrawn.
pub async fn withdraw_claim(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(claim_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let query = format!(
        "SELECT {CLAIM_COLUMNS} FROM restaurant_claims WHERE id = $1 AND user_id = $2"
    );
    let claim = sqlx::query_as::<_, Claim>(&query)
        .bind(claim_id)
        .bind(claims.user_id())
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Claim not found".to_string()))?;

    let status = ClaimStatus::parse(&claim.status)
        .ok_or_else(|| AppError::InternalServerError(format!("Bad claim status: {}", claim.status)))?;

    if !status.can_transition_to(ClaimStatus::Rejected) {
        return Err(AppError::Conflict(
            "Only pending claims can be withdrawn".to_string(),
        ));
    }

    let update = format!(
        "UPDATE restaurant_claims SET status = $1 WHERE id = $2 RETURNING {CLAIM_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, Claim>(&update)
        .bind(ClaimStatus::Rejected.as_str())
        .bind(claim_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(updated))
}

/// Per-rating counts and the positive/neutral/negative sentiment split.
#[derive(Debug, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Counts for ratings 1..=5, index 0 holding rating 1.
    pub distribution: [i64; 5],
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
    /// Percent of total, rounded to 1 decimal; 0 when there are no reviews.
    pub positive_pct: f64,
    pub negative_pct: f64,
}

/// Computes the dashboard rating summary. Ratings outside [1,5] cannot
/// occur (CHECK constraint) and are ignored if present.
pub(crate) fn summarize_ratings(ratings: &[i32]) -> RatingSummary {
    let mut distribution = [0i64; 5];
    for &rating in ratings {
        if (1..=5).contains(&rating) {
            distribution[(rating - 1) as usize] += 1;
        }
    }

    let positive = distribution[3] + distribution[4];
    let neutral = distribution[2];
    let negative = distribution[0] + distribution[1];
    let total = positive + neutral + negative;

    let pct = |part: i64| {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64 * 1000.0).round() / 10.0
        }
    };

    RatingSummary {
        distribution,
        positive,
        neutral,
        negative,
        positive_pct: pct(positive),
        negative_pct: pct(negative),
    }
}

/// Owner dashboard for one of the caller's restaurants: rating histogram,
/// sentiment split, and the 5 most recent reviews.
pub async fn dashboard(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(restaurant_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let restaurant = fetch_owned_restaurant(&pool, restaurant_id, claims.user_id()).await?;

    let reviews = sqlx::query_as::<_, ReviewResponse>(
        "SELECT r.id, r.user_id, r.restaurant_id, r.rating, r.comment, \
                r.created_at, r.updated_at, u.name as user_name \
         FROM reviews r \
         LEFT JOIN users u ON r.user_id = u.id \
         WHERE r.restaurant_id = $1 \
         ORDER BY r.created_at DESC",
    )
    .bind(restaurant_id)
    .fetch_all(&pool)
    .await?;

    let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
    let summary = summarize_ratings(&ratings);

    let recent_reviews: Vec<serde_json::Value> = reviews
        .iter()
        .take(5)
        .map(|r| {
            serde_json::json!({
                "review_id": r.id,
                "user_name": r.user_name.as_deref().unwrap_or("Anonymous"),
                "rating": r.rating,
                "comment": r.comment,
                "created_at": r.created_at,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "restaurant_id": restaurant.id,
        "restaurant_name": restaurant.name,
        "total_reviews": reviews.len(),
        "avg_rating": restaurant.avg_rating,
        "rating_distribution": {
            "1": summary.distribution[0],
            "2": summary.distribution[1],
            "3": summary.distribution[2],
            "4": summary.distribution[3],
            "5": summary.distribution[4],
        },
        "sentiment": {
            "positive": summary.positive,
            "neutral": summary.neutral,
            "negative": summary.negative,
            "positive_pct": summary.positive_pct,
            "negative_pct": summary.negative_pct,
        },
        "recent_reviews": recent_reviews,
    })))
}

/// Loads a restaurant scoped to the caller's ownership.
/// A restaurant that exists but is owned by someone else is reported the
/// same way as a missing one.
async fn fetch_owned_restaurant(
    pool: &PgPool,
    restaurant_id: i64,
    user_id: i64,
) -> Result<Restaurant, AppError> {
    let query = format!(
        "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1 AND owner_id = $2"
    );
    sqlx::query_as::<_, Restaurant>(&query)
        .bind(restaurant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound(
            "Restaurant not found or you don't own it".to_string(),
        ))
}
