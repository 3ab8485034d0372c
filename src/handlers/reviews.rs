// src/handlers/reviews.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::review::{CreateReviewRequest, Review, ReviewResponse, UpdateReviewRequest},
    utils::{html::clean_html, jwt::Claims},
};

const REVIEW_COLUMNS: &str =
    "id, user_id, restaurant_id, rating, comment, created_at, updated_at";

/// Rounds to 2 decimal places, the precision stored on the listing.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Recomputes a restaurant's rating aggregate from its full current review
/// set and writes it back: avg_rating = round(mean, 2), review_count =
/// cardinality, resetting to (0.0, 0) when the set is empty.
///
/// Must run inside the same transaction as the review mutation, after the
/// restaurant row has been locked FOR UPDATE — the lock serializes
/// concurrent writers so no recompute can read a stale review set and
/// overwrite a newer aggregate. Always a full recompute, never a delta.
pub(crate) async fn recompute_rating(
    tx: &mut Transaction<'_, Postgres>,
    restaurant_id: i64,
) -> Result<(), AppError> {
    let (avg, count): (f64, i64) = sqlx::query_as(
        "SELECT COALESCE(AVG(rating)::double precision, 0), COUNT(*) \
         FROM reviews WHERE restaurant_id = $1",
    )
    .bind(restaurant_id)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query("UPDATE restaurants SET avg_rating = $1, review_count = $2 WHERE id = $3")
        .bind(round2(avg))
        .bind(count as i32)
        .bind(restaurant_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Locks the restaurant row for the duration of the transaction.
/// Fails NotFound when the restaurant does not exist.
async fn lock_restaurant(
    tx: &mut Transaction<'_, Postgres>,
    restaurant_id: i64,
) -> Result<(), AppError> {
    sqlx::query("SELECT id FROM restaurants WHERE id = $1 FOR UPDATE")
        .bind(restaurant_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::NotFound("Restaurant not found".to_string()))?;
    Ok(())
}

/// Create a review for a restaurant.
///
/// One review per (author, restaurant); a second attempt is a Conflict.
/// The rating aggregate is recomputed in the same transaction.
pub async fn create_review(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(restaurant_id): Path<i64>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    lock_restaurant(&mut tx, restaurant_id).await?;

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM reviews WHERE user_id = $1 AND restaurant_id = $2")
            .bind(user_id)
            .bind(restaurant_id)
            .fetch_optional(&mut *tx)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "You have already reviewed this restaurant".to_string(),
        ));
    }

    let insert = format!(
        "INSERT INTO reviews (user_id, restaurant_id, rating, comment) \
         VALUES ($1, $2, $3, $4) RETURNING {REVIEW_COLUMNS}"
    );
    let review = sqlx::query_as::<_, Review>(&insert)
        .bind(user_id)
        .bind(restaurant_id)
        .bind(payload.rating)
        .bind(payload.comment.as_deref().map(clean_html))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // Concurrent duplicate caught by the unique constraint.
            if is_unique_violation(&e, "uq_review_per_user_restaurant") {
                AppError::Conflict("You have already reviewed this restaurant".to_string())
            } else {
                tracing::error!("Failed to create review: {:?}", e);
                AppError::from(e)
            }
        })?;

    recompute_rating(&mut tx, restaurant_id).await?;

    tx.commit().await?;

    let user_name = fetch_user_name(&pool, user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(with_user_name(review, user_name)),
    ))
}

/// List all reviews for a restaurant, newest first. Public.
pub async fn list_reviews(
    State(pool): State<PgPool>,
    Path(restaurant_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM restaurants WHERE id = $1")
        .bind(restaurant_id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Restaurant not found".to_string()));
    }

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

/// Update a review. Only its author may edit it.
/// The rating aggregate is recomputed in the same transaction.
pub async fn update_review(
    State(pool): State<PgPool>,
    claims: Claims,
    Path((restaurant_id, review_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let select = format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1 AND restaurant_id = $2"
    );
    let review = sqlx::query_as::<_, Review>(&select)
        .bind(review_id)
        .bind(restaurant_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Review not found".to_string()))?;

    if review.user_id != user_id {
        return Err(AppError::Forbidden(
            "You can only edit your own reviews".to_string(),
        ));
    }

    lock_restaurant(&mut tx, restaurant_id).await?;

    if payload.rating.is_some() || payload.comment.is_some() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE reviews SET ");
        let mut separated = builder.separated(", ");

        if let Some(rating) = payload.rating {
            separated.push("rating = ");
            separated.push_bind_unseparated(rating);
        }

        if let Some(comment) = payload.comment {
            separated.push("comment = ");
            separated.push_bind_unseparated(clean_html(&comment));
        }

        separated.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(review_id);

        builder.build().execute(&mut *tx).await?;
    }

    recompute_rating(&mut tx, restaurant_id).await?;

    let updated = sqlx::query_as::<_, Review>(&select)
        .bind(review_id)
        .bind(restaurant_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    let user_name = fetch_user_name(&pool, user_id).await?;
    Ok(Json(with_user_name(updated, user_name)))
}

/// Delete a review. Only its author may delete it.
/// The rating aggregate is recomputed in the same transaction.
pub async fn delete_review(
    State(pool): State<PgPool>,
    claims: Claims,
    Path((restaurant_id, review_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let mut tx = pool.begin().await?;

    let review: Option<(i64, i64)> =
        sqlx::query_as("SELECT id, user_id FROM reviews WHERE id = $1 AND restaurant_id = $2")
            .bind(review_id)
            .bind(restaurant_id)
            .fetch_optional(&mut *tx)
            .await?;
    let (_, author_id) = review.ok_or(AppError::NotFound("Review not found".to_string()))?;

    if author_id != user_id {
        return Err(AppError::Forbidden(
            "You can only delete your own reviews".to_string(),
        ));
    }

    lock_restaurant(&mut tx, restaurant_id).await?;

    sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(review_id)
        .execute(&mut *tx)
        .await?;

    recompute_rating(&mut tx, restaurant_id).await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List the current user's reviews, newest first.
pub async fn list_my_reviews(
    State(pool): State<PgPool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let reviews = sqlx::query_as::<_, ReviewResponse>(
        "SELECT r.id, r.user_id, r.restaurant_id, r.rating, r.comment, \
                r.created_at, r.updated_at, u.name as user_name \
         FROM reviews r \
         JOIN users u ON r.user_id = u.id \
         WHERE r.user_id = $1 \
         ORDER BY r.created_at DESC",
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(reviews))
}

async fn fetch_user_name(pool: &PgPool, user_id: i64) -> Result<Option<String>, AppError> {
    let name: Option<(String,)> = sqlx::query_as("SELECT name FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(name.map(|(n,)| n))
}

fn with_user_name(review: Review, user_name: Option<String>) -> ReviewResponse {
    ReviewResponse {
        id: review.id,
        user_id: review.user_id,
        restaurant_id: review.restaurant_id,
        rating: review.rating,
        comment: review.comment,
        created_at: review.created_at,
        updated_at: review.updated_at,
        user_name,
    }
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(4.666666), 4.67);
        assert_eq!(round2(3.333333), 3.33);
        assert_eq!(round2(5.0), 5.0);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn aggregate_scenario_matches_expected_progression() {
        // One 5-star review, then a 3-star, then the 5-star removed.
        let first = [5];
        let second = [5, 3];
        let third = [3];

        let avg = |ratings: &[i32]| {
            round2(ratings.iter().sum::<i32>() as f64 / ratings.len() as f64)
        };

        assert_eq!(avg(&first), 5.0);
        assert_eq!(avg(&second), 4.0);
        assert_eq!(avg(&third), 3.0);
    }
}
