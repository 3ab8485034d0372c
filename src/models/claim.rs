// src/models/claim.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'restaurant_claims' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Claim {
    pub id: i64,
    pub user_id: i64,
    pub restaurant_id: i64,
    /// 'pending', 'approved' or 'rejected'. See [`ClaimStatus`].
    pub status: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Claim lifecycle: pending -> {approved, rejected}, both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ClaimStatus::Pending),
            "approved" => Some(ClaimStatus::Approved),
            "rejected" => Some(ClaimStatus::Rejected),
            _ => None,
        }
    }

    /// Only a pending claim may move, and only to a terminal state.
    pub fn can_transition_to(&self, next: ClaimStatus) -> bool {
        matches!(
            (self, next),
            (ClaimStatus::Pending, ClaimStatus::Approved)
                | (ClaimStatus::Pending, ClaimStatus::Rejected)
        )
    }
}

/// DTO for submitting a claim.
#[derive(Debug, Deserialize, Validate)]
pub struct ClaimRequest {
    pub restaurant_id: i64,
    /// Optional reason for claiming, recorded nowhere yet.
    #[validate(length(max = 1000))]
    pub message: Option<String>,
}
