// src/models/preference.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'user_preferences' table (one row per user).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserPreference {
    pub id: i64,
    pub user_id: i64,
    pub cuisine_preferences: Option<String>,
    pub price_range: Option<String>,
    pub preferred_location: Option<String>,
    pub search_radius_km: i32,
    pub dietary_needs: Option<String>,
    pub ambiance: Option<String>,
    pub sort_preference: String,
}

/// DTO for upserting preferences. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePreferencesRequest {
    #[validate(length(max = 500))]
    pub cuisine_preferences: Option<String>,
    #[validate(custom(function = validate_price_tier))]
    pub price_range: Option<String>,
    #[validate(length(max = 200))]
    pub preferred_location: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub search_radius_km: Option<i32>,
    #[validate(length(max = 300))]
    pub dietary_needs: Option<String>,
    #[validate(length(max = 300))]
    pub ambiance: Option<String>,
    #[validate(custom(function = validate_sort_preference))]
    pub sort_preference: Option<String>,
}

/// Restricts a price tier to the '$'..'$$$$' scale.
pub fn validate_price_tier(tier: &str) -> Result<(), validator::ValidationError> {
    match tier {
        "$" | "$$" | "$$$" | "$$$$" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_price_tier")),
    }
}

fn validate_sort_preference(sort: &str) -> Result<(), validator::ValidationError> {
    match sort {
        "rating" | "distance" | "popularity" | "price" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_sort_preference")),
    }
}
