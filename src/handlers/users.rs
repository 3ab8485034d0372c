// src/handlers/users.rs

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    handlers::auth::fetch_user,
    models::{
        preference::{UpdatePreferencesRequest, UserPreference},
        user::UpdateProfileRequest,
    },
    utils::{html::clean_html, jwt::Claims, upload::UploadStore},
};

/// Get the current user's profile.
pub async fn get_profile(
    State(pool): State<PgPool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()).await?;
    Ok(Json(user))
}

/// Partially update the current user's profile.
/// Only fields present in the payload are written.
pub async fn update_profile(
    State(pool): State<PgPool>,
    claims: Claims,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    if payload.is_empty() {
        return Ok(Json(fetch_user(&pool, user_id).await?));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(phone) = payload.phone {
        separated.push("phone = ");
        separated.push_bind_unseparated(phone);
    }

    if let Some(about_me) = payload.about_me {
        separated.push("about_me = ");
        separated.push_bind_unseparated(clean_html(&about_me));
    }

    if let Some(city) = payload.city {
        separated.push("city = ");
        separated.push_bind_unseparated(city);
    }

    if let Some(country) = payload.country {
        separated.push("country = ");
        separated.push_bind_unseparated(country);
    }

    if let Some(state) = payload.state {
        separated.push("state = ");
        separated.push_bind_unseparated(state);
    }

    if let Some(languages) = payload.languages {
        separated.push("languages = ");
        separated.push_bind_unseparated(languages);
    }

    if let Some(gender) = payload.gender {
        separated.push("gender = ");
        separated.push_bind_unseparated(gender);
    }

    separated.push("updated_at = NOW()");

    builder.push(" WHERE id = ");
    builder.push_bind(user_id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update profile: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(fetch_user(&pool, user_id).await?))
}

/// Upload a new profile picture (multipart, field name "file").
///
/// Accepts JPEG/PNG/WebP only. The file is written before the database
/// update and the previous picture is removed afterwards; the write is a
/// non-transactional side effect.
pub async fn upload_profile_picture(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    claims: Claims,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    let user = fetch_user(&pool, user_id).await?;

    let mut uploaded: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .ok_or_else(|| AppError::BadRequest("Missing content type".to_string()))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        uploaded = Some((content_type, data.to_vec()));
        break;
    }

    let (content_type, data) =
        uploaded.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;

    let store = UploadStore::new(&config.upload_dir);
    let public_path = store.save_profile_pic(&content_type, &data).await?;

    sqlx::query("UPDATE users SET profile_pic = $1, updated_at = NOW() WHERE id = $2")
        .bind(&public_path)
        .bind(user_id)
        .execute(&pool)
        .await?;

    // Old picture is deleted only after the new path is persisted.
    if let Some(old_path) = &user.profile_pic {
        store.delete_public_path(old_path).await;
    }

    Ok(Json(fetch_user(&pool, user_id).await?))
}

/// Get the current user's preferences.
pub async fn get_preferences(
    State(pool): State<PgPool>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError> {
    let prefs = sqlx::query_as::<_, UserPreference>(
        "SELECT id, user_id, cuisine_preferences, price_range, preferred_location, \
         search_radius_km, dietary_needs, ambiance, sort_preference \
         FROM user_preferences WHERE user_id = $1",
    )
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound(
        "No preferences found. Please set your preferences first.".to_string(),
    ))?;

    Ok(Json(prefs))
}

/// Upsert the current user's preferences.
/// Only fields present in the payload are written.
pub async fn update_preferences(
    State(pool): State<PgPool>,
    claims: Claims,
    Json(payload): Json<UpdatePreferencesRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    // Make sure the row exists, then patch it.
    sqlx::query("INSERT INTO user_preferences (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&pool)
        .await?;

    let has_updates = payload.cuisine_preferences.is_some()
        || payload.price_range.is_some()
        || payload.preferred_location.is_some()
        || payload.search_radius_km.is_some()
        || payload.dietary_needs.is_some()
        || payload.ambiance.is_some()
        || payload.sort_preference.is_some();

    if has_updates {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE user_preferences SET ");
        let mut separated = builder.separated(", ");

        if let Some(cuisines) = payload.cuisine_preferences {
            separated.push("cuisine_preferences = ");
            separated.push_bind_unseparated(cuisines);
        }

        if let Some(price_range) = payload.price_range {
            separated.push("price_range = ");
            separated.push_bind_unseparated(price_range);
        }

        if let Some(location) = payload.preferred_location {
            separated.push("preferred_location = ");
            separated.push_bind_unseparated(location);
        }

        if let Some(radius) = payload.search_radius_km {
            separated.push("search_radius_km = ");
            separated.push_bind_unseparated(radius);
        }

        if let Some(dietary) = payload.dietary_needs {
            separated.push("dietary_needs = ");
            separated.push_bind_unseparated(dietary);
        }

        if let Some(ambiance) = payload.ambiance {
            separated.push("ambiance = ");
            separated.push_bind_unseparated(ambiance);
        }

        if let Some(sort) = payload.sort_preference {
            separated.push("sort_preference = ");
            separated.push_bind_unseparated(sort);
        }

        builder.push(" WHERE user_id = ");
        builder.push_bind(user_id);

        builder.build().execute(&pool).await?;
    }

    let prefs = sqlx::query_as::<_, UserPreference>(
        "SELECT id, user_id, cuisine_preferences, price_range, preferred_location, \
         search_radius_km, dietary_needs, ambiance, sort_preference \
         FROM user_preferences WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(prefs))
}
