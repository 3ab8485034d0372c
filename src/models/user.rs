// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Column list matching [`User`], for runtime `query_as` selects.
pub const USER_COLUMNS: &str = "id, name, email, password_hash, phone, about_me, city, country, \
     state, languages, gender, profile_pic, role, is_active, created_at, updated_at";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique email address, used for login.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub phone: Option<String>,
    pub about_me: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub languages: Option<String>,
    pub gender: Option<String>,

    /// Public path of the uploaded profile picture, if any.
    pub profile_pic: Option<String>,

    /// User role: 'user' or 'owner'.
    pub role: String,

    pub is_active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for signup.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."))]
    pub name: String,

    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[validate(length(
        min = 6,
        max = 72,
        message = "Password length must be between 6 and 72 characters."
    ))]
    pub password: String,

    /// Optional role, defaults to 'user'.
    #[validate(custom(function = validate_role))]
    pub role: Option<String>,
}

/// DTO for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 72))]
    pub password: String,
}

/// Token payload returned by signup and login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: String,
    pub user_id: i64,
    pub name: String,
}

/// DTO for partial profile updates. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub about_me: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(length(max = 200))]
    pub languages: Option<String>,
    #[validate(custom(function = validate_gender))]
    pub gender: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.about_me.is_none()
            && self.city.is_none()
            && self.country.is_none()
            && self.state.is_none()
            && self.languages.is_none()
            && self.gender.is_none()
    }
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    if role != "user" && role != "owner" {
        return Err(validator::ValidationError::new("invalid_role"));
    }
    Ok(())
}

fn validate_gender(gender: &str) -> Result<(), validator::ValidationError> {
    match gender {
        "male" | "female" | "other" | "prefer_not_to_say" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_gender")),
    }
}
