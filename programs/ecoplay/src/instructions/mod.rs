//! Request handlers

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::error::LabError;
use crate::state::SharedState;

pub mod auth;
pub mod consent;
pub mod report;
pub mod session;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Signed-in participant, required
pub struct CurrentUser(pub String);

/// Signed-in participant, if any
pub struct MaybeUser(pub Option<String>);

#[async_trait]
impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = LabError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(LabError::Unauthorized)?;
        state
            .identity
            .current_user_id(token)
            .await
            .map(CurrentUser)
            .ok_or(LabError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<SharedState> for MaybeUser {
    type Rejection = LabError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let user = match bearer_token(&parts.headers) {
            Some(token) => state.identity.current_user_id(token).await,
            None => None,
        };
        Ok(MaybeUser(user))
    }
}
