// src/models/restaurant.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

use super::preference::validate_price_tier;

/// Represents the 'restaurants' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub cuisine_type: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,

    /// Opening hours, stored as a JSON string e.g. {"mon": "9am-10pm"}.
    pub hours: Option<String>,

    /// Price tier on the '$'..'$$$$' scale.
    pub price_tier: Option<String>,

    /// Comma-separated amenities, e.g. "wifi,outdoor_seating".
    pub amenities: Option<String>,

    /// Derived: mean of current review ratings, rounded to 2 decimals.
    pub avg_rating: f64,
    /// Derived: cardinality of the current review set.
    pub review_count: i32,

    pub is_claimed: bool,
    pub owner_id: Option<i64>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a restaurant.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRestaurantRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters."))]
    pub name: String,
    #[validate(length(max = 100))]
    pub cuisine_type: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 200), custom(function = validate_url_string))]
    pub website: Option<String>,
    #[validate(length(max = 500))]
    pub hours: Option<String>,
    #[validate(custom(function = validate_price_tier))]
    pub price_tier: Option<String>,
    #[validate(length(max = 300))]
    pub amenities: Option<String>,
}

/// DTO for partial restaurant updates. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRestaurantRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub cuisine_type: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 200), custom(function = validate_url_string))]
    pub website: Option<String>,
    #[validate(length(max = 500))]
    pub hours: Option<String>,
    #[validate(custom(function = validate_price_tier))]
    pub price_tier: Option<String>,
    #[validate(length(max = 300))]
    pub amenities: Option<String>,
}

impl UpdateRestaurantRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cuisine_type.is_none()
            && self.description.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.website.is_none()
            && self.hours.is_none()
            && self.price_tier.is_none()
            && self.amenities.is_none()
    }
}

/// Query parameters for listing/searching restaurants.
/// All filters are optional and AND-combined.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive substring match on the name.
    pub name: Option<String>,
    /// Case-insensitive substring match on the cuisine type.
    pub cuisine_type: Option<String>,
    /// Case-insensitive substring match on the city.
    pub city: Option<String>,
    /// Exact match.
    pub zip_code: Option<String>,
    /// Exact match on the '$'..'$$$$' scale.
    pub price_tier: Option<String>,
    /// Free-text match across description, amenities and cuisine type.
    pub keywords: Option<String>,
    /// Pagination offset (default 0).
    pub skip: Option<i64>,
    /// Page size (default 10, max 100).
    pub limit: Option<i64>,
}

/// Search result page: total is the filtered count before pagination.
#[derive(Debug, Serialize)]
pub struct RestaurantListResponse {
    pub total: i64,
    pub restaurants: Vec<Restaurant>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
