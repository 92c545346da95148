//! Registration and login.
//!
//! A registered user carries exactly one role; the capability set returned
//! to the client is derived from the permission matrix, never stored.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use clipcast_core::auth::{Capability, PermissionMatrix};
use clipcast_core::models::{Role, User};
use clipcast_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const BCRYPT_COST: u32 = 12;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    pub role: Role,
    pub company_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub company_name: Option<String>,
    pub capabilities: Vec<Capability>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            company_name: user.company_name,
            capabilities: PermissionMatrix::capabilities(user.role).to_vec(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let password_hash = bcrypt::hash(&request.password, BCRYPT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let user = state
        .users
        .create_user(
            &request.email,
            &password_hash,
            request.role,
            request.company_name.as_deref(),
        )
        .await?;

    let token = state.codec.issue(user.id, &user.email, user.role)?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    // One rejection for every failure mode so a probe cannot tell a wrong
    // password from an unknown or deactivated account.
    let reject = || AppError::InvalidCredential("Invalid email or password".to_string());

    let user = state
        .users
        .get_by_email(&request.email)
        .await?
        .ok_or_else(reject)?;

    let password_ok = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))?;
    if !password_ok || !user.is_active {
        return Err(reject().into());
    }

    let token = state.codec.issue(user.id, &user.email, user.role)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
