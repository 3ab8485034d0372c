// src/models/favorite.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'favorites' table in the database.
/// At most one favorite exists per (user, restaurant) pair.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for a favorited restaurant, including joined restaurant summary.
#[derive(Debug, Serialize, FromRow)]
pub struct FavoriteResponse {
    pub id: i64,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub cuisine_type: Option<String>,
    pub city: Option<String>,
    pub price_tier: Option<String>,
    pub avg_rating: f64,
    pub review_count: i32,
    pub favorited_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A review the user authored, as it appears in their activity history.
#[derive(Debug, Serialize, FromRow)]
pub struct ReviewHistoryItem {
    pub review_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A listing the user added, as it appears in their activity history.
#[derive(Debug, Serialize, FromRow)]
pub struct ListingHistoryItem {
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub cuisine_type: Option<String>,
    pub city: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Tagged history entry. The two branches are ordered newest-first
/// independently, not interleaved.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum HistoryEntry {
    #[serde(rename = "review")]
    Review(ReviewHistoryItem),
    #[serde(rename = "listing_added")]
    ListingAdded(ListingHistoryItem),
}

/// Union view of the user's authored reviews and added listings.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub user_id: i64,
    pub reviews: Vec<HistoryEntry>,
    pub listings_added: Vec<HistoryEntry>,
    pub total_reviews: usize,
    pub total_listings_added: usize,
}
