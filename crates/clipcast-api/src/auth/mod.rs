//! Bearer-token extraction.
//!
//! Handlers extract [`BearerToken`] and pass it to
//! `AccessControlService::authorize` together with the capability the route
//! requires, so the credential check and the matrix check happen in one
//! place.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;

use crate::error::ErrorResponse;

/// The raw bearer credential from the Authorization header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        match header {
            Some(token) if !token.is_empty() => Ok(BearerToken(token.to_string())),
            _ => Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "No token provided".to_string(),
                    details: None,
                    error_type: None,
                    code: "INVALID_CREDENTIAL".to_string(),
                    recoverable: false,
                    suggested_action: Some(
                        "Send an Authorization: Bearer <token> header".to_string(),
                    ),
                }),
            )),
        }
    }
}
