//! Request and response shapes, one section per route group.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Code delivery (stateless send endpoints) ─────────────────────────────

/// Body for `/api/send-verification` and `/api/send-password-reset`.
/// Fields are optional so missing ones surface as a 400 with the
/// `{ success, message }` shape rather than a deserialization error.
#[derive(Deserialize)]
pub struct SendCodeRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

// ── Registration flow ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    pub password: String,
    #[serde(default)]
    pub profile: Map<String, Value>,
}

#[derive(Serialize)]
pub struct ReceiptResponse {
    pub success: bool,
    pub ticket: String,
    pub delivered: bool,
    pub message: String,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub ticket: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub token: String,
    pub identity_id: String,
    pub established_at: u64,
    pub expires_at: u64,
}

#[derive(Deserialize)]
pub struct ResendRequest {
    pub ticket: String,
}

// ── Login and password reset ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetConfirmRequest {
    pub ticket: String,
    pub code: String,
    pub new_password: String,
}

// ── Session introspection ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionInfoResponse {
    pub success: bool,
    pub identity_id: String,
    pub established_at: u64,
}
