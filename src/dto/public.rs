use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::validate_phone;

/// Registration form submitted by a participant.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Given name.
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    /// Display name shown on leaderboards.
    #[validate(length(min = 1, max = 100))]
    pub nick_name: String,
    /// Contact number; unique across participants.
    #[validate(custom(function = validate_phone))]
    pub phone: String,
}

/// Credential returned after a successful registration.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// Unguessable token binding future connections to this participant.
    pub session_token: String,
}
