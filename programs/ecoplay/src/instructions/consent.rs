//! Consent submission and lookup

use axum::{extract::State, Json};
use serde::Serialize;

use super::CurrentUser;
use crate::consent::{ConsentFlags, ConsentRecord, ConsentStatus};
use crate::error::Result;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub document_id: uuid::Uuid,
}

pub async fn submit(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Json(flags): Json<ConsentFlags>,
) -> Result<Json<SubmitResponse>> {
    let record = state.consent.submit_consent(&user_id, flags).await?;
    Ok(Json(SubmitResponse {
        success: true,
        document_id: record.document_id,
    }))
}

pub async fn check(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ConsentStatus>> {
    Ok(Json(state.consent.check_consent(&user_id).await?))
}

pub async fn list(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<ConsentRecord>>> {
    Ok(Json(state.consent.consents_for(&user_id).await?))
}
