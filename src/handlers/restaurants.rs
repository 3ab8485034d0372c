// src/handlers/restaurants.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::restaurant::{
        CreateRestaurantRequest, Restaurant, RestaurantListResponse, SearchParams,
        UpdateRestaurantRequest,
    },
    utils::{html::clean_html, jwt::Claims},
};

/// Column list matching [`Restaurant`], for runtime `query_as` selects.
pub(crate) const RESTAURANT_COLUMNS: &str =
    "id, name, cuisine_type, description, address, city, state, zip_code, phone, email, \
     website, hours, price_tier, amenities, avg_rating, review_count, is_claimed, owner_id, \
     created_at, updated_at";

/// Create a new restaurant listing. The caller becomes its owner.
pub async fn create_restaurant(
    State(pool): State<PgPool>,
    claims: Claims,
    Json(payload): Json<CreateRestaurantRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let query = format!(
        "INSERT INTO restaurants \
         (name, cuisine_type, description, address, city, state, zip_code, phone, email, \
          website, hours, price_tier, amenities, owner_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING {RESTAURANT_COLUMNS}"
    );

    let restaurant = sqlx::query_as::<_, Restaurant>(&query)
        .bind(&payload.name)
        .bind(&payload.cuisine_type)
        .bind(payload.description.as_deref().map(clean_html))
        .bind(&payload.address)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.zip_code)
        .bind(&payload.phone)
        .bind(&payload.email)
        .bind(&payload.website)
        .bind(&payload.hours)
        .bind(&payload.price_tier)
        .bind(&payload.amenities)
        .bind(claims.user_id())
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create restaurant: {:?}", e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(restaurant)))
}

/// Appends the WHERE clause for the given search filters.
/// Filters are independent and AND-combined; text matches are
/// case-insensitive substrings, zip and price tier are exact.
fn push_search_filters(builder: &mut QueryBuilder<Postgres>, params: &SearchParams) {
    builder.push(" WHERE TRUE");

    if let Some(name) = &params.name {
        builder.push(" AND name ILIKE ");
        builder.push_bind(format!("%{}%", name));
    }

    if let Some(cuisine) = &params.cuisine_type {
        builder.push(" AND cuisine_type ILIKE ");
        builder.push_bind(format!("%{}%", cuisine));
    }

    if let Some(city) = &params.city {
        builder.push(" AND city ILIKE ");
        builder.push_bind(format!("%{}%", city));
    }

    if let Some(zip_code) = &params.zip_code {
        builder.push(" AND zip_code = ");
        builder.push_bind(zip_code.clone());
    }

    if let Some(price_tier) = &params.price_tier {
        builder.push(" AND price_tier = ");
        builder.push_bind(price_tier.clone());
    }

    if let Some(keywords) = &params.keywords {
        let pattern = format!("%{}%", keywords);
        builder.push(" AND (description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR amenities ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR cuisine_type ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

/// List / search restaurants.
///
/// `total` counts the filtered set before pagination; `skip`/`limit` apply
/// after. Over-paging yields an empty page, never an error.
pub async fn search_restaurants(
    State(pool): State<PgPool>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(10).clamp(0, 100);

    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM restaurants");
    push_search_filters(&mut count_builder, &params);

    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(&pool)
        .await?;

    let mut page_builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants"));
    push_search_filters(&mut page_builder, &params);
    page_builder.push(" ORDER BY id OFFSET ");
    page_builder.push_bind(skip);
    page_builder.push(" LIMIT ");
    page_builder.push_bind(limit);

    let restaurants = page_builder
        .build_query_as::<Restaurant>()
        .fetch_all(&pool)
        .await?;

    Ok(Json(RestaurantListResponse { total, restaurants }))
}

/// Retrieves a single restaurant by ID.
pub async fn get_restaurant(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let restaurant = fetch_restaurant(&pool, id).await?;
    Ok(Json(restaurant))
}

/// Partially update a restaurant. Only the owner may update it.
pub async fn update_restaurant(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRestaurantRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let restaurant = fetch_restaurant(&pool, id).await?;
    if restaurant.owner_id != Some(claims.user_id()) {
        return Err(AppError::Forbidden(
            "You are not authorized to update this restaurant".to_string(),
        ));
    }

    apply_restaurant_update(&pool, id, payload).await?;

    Ok(Json(fetch_restaurant(&pool, id).await?))
}

/// Delete a restaurant. Only the owner may delete it.
/// Dependent reviews, favorites and photos are removed by FK cascade.
pub async fn delete_restaurant(
    State(pool): State<PgPool>,
    claims: Claims,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let restaurant = fetch_restaurant(&pool, id).await?;
    if restaurant.owner_id != Some(claims.user_id()) {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this restaurant".to_string(),
        ));
    }

    sqlx::query("DELETE FROM restaurants WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete restaurant: {:?}", e);
            AppError::from(e)
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// List restaurants created/owned by the current user.
pub async fn list_my_restaurants(
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

    Ok(Json(RestaurantListResponse {
        total: restaurants.len() as i64,
        restaurants,
    }))
}

/// Loads a restaurant by id, failing NotFound when absent.
pub(crate) async fn fetch_restaurant(pool: &PgPool, id: i64) -> Result<Restaurant, AppError> {
    let query = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1");
    sqlx::query_as::<_, Restaurant>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Restaurant not found".to_string()))
}

/// Applies a partial update to a restaurant row.
/// Shared by the public ownership-gated route and the /owner route.
pub(crate) async fn apply_restaurant_update(
    pool: &PgPool,
    id: i64,
    payload: UpdateRestaurantRequest,
) -> Result<(), AppError> {
    if payload.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE restaurants SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(cuisine_type) = payload.cuisine_type {
        separated.push("cuisine_type = ");
        separated.push_bind_unseparated(cuisine_type);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
    }

    if let Some(address) = payload.address {
        separated.push("address = ");
        separated.push_bind_unseparated(address);
    }

    if let Some(city) = payload.city {
        separated.push("city = ");
        separated.push_bind_unseparated(city);
    }

    if let Some(state) = payload.state {
        separated.push("state = ");
        separated.push_bind_unseparated(state);
    }

    if let Some(zip_code) = payload.zip_code {
        separated.push("zip_code = ");
        separated.push_bind_unseparated(zip_code);
    }

    if let Some(phone) = payload.phone {
        separated.push("phone = ");
        separated.push_bind_unseparated(phone);
    }

    if let Some(email) = payload.email {
        separated.push("email = ");
        separated.push_bind_unseparated(email);
    }

    if let Some(website) = payload.website {
        separated.push("website = ");
        separated.push_bind_unseparated(website);
    }

    if let Some(hours) = payload.hours {
        separated.push("hours = ");
        separated.push_bind_unseparated(hours);
    }

    if let Some(price_tier) = payload.price_tier {
        separated.push("price_tier = ");
        separated.push_bind_unseparated(price_tier);
    }

    if let Some(amenities) = payload.amenities {
        separated.push("amenities = ");
        separated.push_bind_unseparated(amenities);
    }

    separated.push("updated_at = NOW()");

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(pool).await.map_err(|e| {
        tracing::error!("Failed to update restaurant: {:?}", e);
        AppError::from(e)
    })?;

    Ok(())
}
