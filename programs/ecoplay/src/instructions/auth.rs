//! Participant sign-up and sign-in

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;

use super::{bearer_token, CurrentUser};
use crate::error::Result;
use crate::identity::AuthToken;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub medical_record_number: String,
    /// Birth date on register; current password on login
    #[serde(alias = "password")]
    pub birth_date: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<AuthToken>> {
    let token = state
        .identity
        .register(&req.medical_record_number, &req.birth_date)
        .await?;
    Ok(Json(token))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<AuthToken>> {
    let token = state
        .identity
        .login(&req.medical_record_number, &req.birth_date)
        .await?;
    Ok(Json(token))
}

pub async fn change_password(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<AuthToken>> {
    let token = state
        .identity
        .change_password(&user_id, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(token))
}

pub async fn logout(
    State(state): State<SharedState>,
    CurrentUser(_): CurrentUser,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    if let Some(token) = bearer_token(&headers) {
        state.identity.logout(token).await;
    }
    Json(serde_json::json!({ "success": true }))
}
