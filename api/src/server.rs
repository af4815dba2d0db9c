//! Axum router and HTTP server.
//!
//! Route handlers are thin: parse, call into the registrar, map the
//! result. All flow logic lives in `wellspring-verify`.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use wellspring_mailer::{templates, Mailer};
use wellspring_types::EmailAddress;
use wellspring_verify::{RegistrationAttrs, Registrar, Ticket, VerifyError};

use crate::error::ApiError;
use crate::handlers::*;

/// Shared state handed to every handler.
pub struct AppState<M: Mailer> {
    pub registrar: Arc<Registrar<M>>,
}

impl<M: Mailer> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            registrar: self.registrar.clone(),
        }
    }
}

/// Build the full application router.
pub fn router<M: Mailer + 'static>(state: AppState<M>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/send-verification", post(send_verification::<M>))
        .route("/api/send-password-reset", post(send_password_reset::<M>))
        .route("/api/register", post(register::<M>))
        .route("/api/verify", post(verify::<M>))
        .route("/api/resend", post(resend::<M>))
        .route("/api/login", post(login::<M>))
        .route("/api/reset-password", post(reset_password::<M>))
        .route("/api/reset-password/confirm", post(reset_confirm::<M>))
        .route("/api/session", get(session_info::<M>))
        // The browser front end runs on a different origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The HTTP API server, configured with a port and shared state.
pub struct ApiServer {
    pub port: u16,
}

impl ApiServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Start listening. Runs until the server is shut down.
    pub async fn start<M: Mailer + 'static>(
        &self,
        state: AppState<M>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(state);
        let addr = format!("0.0.0.0:{}", self.port);
        info!("API server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "service": "wellspring",
    }))
}

/// Shared body of the two stateless send endpoints: validate the raw
/// fields, render the template, hand the message to the mailer.
async fn send_code_email<M: Mailer>(
    state: &AppState<M>,
    request: SendCodeRequest,
    render: fn(&str) -> wellspring_mailer::MailMessage,
    success_message: &str,
) -> Result<Json<StatusResponse>, ApiError> {
    let email = request
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Missing email or code".into()))?;
    let code = request
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Missing email or code".into()))?;
    let email = EmailAddress::parse(&email).map_err(VerifyError::from)?;

    state
        .registrar
        .mailer()
        .send(&email, &render(&code))
        .await
        .map_err(|e| VerifyError::Delivery(e.to_string()))?;

    Ok(Json(StatusResponse {
        success: true,
        message: success_message.to_string(),
    }))
}

async fn send_verification<M: Mailer>(
    State(state): State<AppState<M>>,
    Json(request): Json<SendCodeRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    send_code_email(
        &state,
        request,
        |code| templates::verification_email(code),
        "Verification email sent",
    )
    .await
}

async fn send_password_reset<M: Mailer>(
    State(state): State<AppState<M>>,
    Json(request): Json<SendCodeRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    send_code_email(
        &state,
        request,
        |code| templates::password_reset_email(code),
        "Password reset email sent",
    )
    .await
}

/// Build the receipt response for a submit/reset-start call. Delivery
/// failure is a 502, but the ticket is included either way so the
/// client can drive a resend.
fn receipt_response(receipt: wellspring_verify::SubmitReceipt) -> impl IntoResponse {
    let status = if receipt.delivered {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    let message = match receipt.delivery_error {
        Some(e) => format!("code issued but delivery failed: {e}"),
        None => "verification code sent".to_string(),
    };
    let body = Json(ReceiptResponse {
        success: receipt.delivered,
        ticket: receipt.ticket.to_string(),
        delivered: receipt.delivered,
        message,
    });
    (status, body)
}

async fn register<M: Mailer>(
    State(state): State<AppState<M>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = EmailAddress::parse(&request.email).map_err(VerifyError::from)?;
    let attrs = RegistrationAttrs {
        email,
        display_name: request.display_name,
        password: request.password,
        profile: request.profile,
    };
    let receipt = state.registrar.submit_registration(attrs).await?;
    Ok(receipt_response(receipt))
}

fn session_response(session: wellspring_identity::AuthSession) -> Json<SessionResponse> {
    Json(SessionResponse {
        success: true,
        token: session.token,
        identity_id: session.identity_id,
        established_at: session.established_at.as_secs(),
        expires_at: session.expires_at.as_secs(),
    })
}

async fn verify<M: Mailer>(
    State(state): State<AppState<M>>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let ticket = Ticket::from(request.ticket.as_str());
    let session = state.registrar.verify_code(&ticket, &request.code).await?;
    Ok(session_response(session))
}

async fn resend<M: Mailer>(
    State(state): State<AppState<M>>,
    Json(request): Json<ResendRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let ticket = Ticket::from(request.ticket.as_str());
    state.registrar.resend(&ticket).await?;
    Ok(Json(StatusResponse {
        success: true,
        message: "verification code sent again".into(),
    }))
}

async fn login<M: Mailer>(
    State(state): State<AppState<M>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let email = EmailAddress::parse(&request.email).map_err(|_| VerifyError::BadCredentials)?;
    let session = state.registrar.login(&email, &request.password).await?;
    Ok(session_response(session))
}

async fn reset_password<M: Mailer>(
    State(state): State<AppState<M>>,
    Json(request): Json<ResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = EmailAddress::parse(&request.email).map_err(VerifyError::from)?;
    let receipt = state.registrar.start_password_reset(&email).await?;
    Ok(receipt_response(receipt))
}

async fn reset_confirm<M: Mailer>(
    State(state): State<AppState<M>>,
    Json(request): Json<ResetConfirmRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let ticket = Ticket::from(request.ticket.as_str());
    let session = state
        .registrar
        .confirm_password_reset(&ticket, &request.code, &request.new_password)
        .await?;
    Ok(session_response(session))
}

async fn session_info<M: Mailer>(
    State(state): State<AppState<M>>,
    headers: HeaderMap,
) -> Result<Json<SessionInfoResponse>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Validation("Missing Authorization header".into()))?;
    let claims = state.registrar.verify_session(token)?;
    Ok(Json(SessionInfoResponse {
        success: true,
        identity_id: claims.identity_id,
        established_at: claims.established_at.as_secs(),
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
