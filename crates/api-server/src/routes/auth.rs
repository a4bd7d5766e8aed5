//! Auth endpoints: signup and signin.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type RouteError = (StatusCode, Json<ErrorResponse>);

fn auth_error(err: AuthError) -> RouteError {
    let status = match err {
        AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AuthError::Conflict(_) => StatusCode::CONFLICT,
        AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn format_expiry(exp: usize) -> String {
    DateTime::<Utc>::from_timestamp(exp as i64, 0)
        .map(|value| value.to_rfc3339())
        .unwrap_or_else(|| Utc::now().to_rfc3339())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: i64,
    username: String,
    created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SigninResponse {
    token: String,
    expires_at: String,
    user_id: i64,
    username: String,
}

/// POST /auth/signup - Register a new user
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), RouteError> {
    let user = state
        .auth_store()
        .signup(&req.username, &req.password)
        .await
        .map_err(auth_error)?;

    tracing::info!(username = %user.username, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
            created_at: user.created_at.to_rfc3339(),
        }),
    ))
}

/// POST /auth/signin - Exchange credentials for a bearer token
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SigninResponse>, RouteError> {
    let session = state
        .auth_store()
        .signin(&req.username, &req.password)
        .await
        .map_err(auth_error)?;
    let token = state
        .auth_store()
        .encode_claims(&session.claims)
        .map_err(auth_error)?;

    Ok(Json(SigninResponse {
        token,
        expires_at: format_expiry(session.claims.exp),
        user_id: session.user.id,
        username: session.user.username,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
}
