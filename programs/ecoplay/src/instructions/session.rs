//! Game sessions: start, decide, advance, persist

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use settlement_logic::{describe_personality, GameMode, Phase};
use uuid::Uuid;

use super::{CurrentUser, MaybeUser};
use crate::controller::{ControllerView, DecisionResult, SessionController};
use crate::error::{require, LabError, Result};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct StartRequest {
    pub game: GameMode,
}

#[derive(Deserialize)]
pub struct DecisionRequest {
    pub amount: i64,
}

#[derive(Serialize)]
pub struct AdvanceResponse {
    pub session_id: Uuid,
    pub phase: Phase,
    pub round: u32,
}

#[derive(Serialize)]
pub struct PersonalityInfo {
    pub index: usize,
    pub name: String,
    pub return_rate_range: [u8; 2],
    pub description: String,
}

fn check_owner(controller: &SessionController, user_id: &str) -> Result<()> {
    require!(controller.user_id() == user_id, LabError::NotSessionOwner);
    Ok(())
}

pub async fn personalities(State(state): State<SharedState>) -> Result<Json<Vec<PersonalityInfo>>> {
    let catalog = state.catalog()?;
    Ok(Json(
        catalog
            .iter()
            .enumerate()
            .map(|(index, p)| PersonalityInfo {
                index,
                name: p.name.clone(),
                return_rate_range: p.return_rate_range,
                description: describe_personality(p),
            })
            .collect(),
    ))
}

pub async fn start(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<StartRequest>,
) -> Result<(StatusCode, Json<ControllerView>)> {
    let consent = state.consent.check_consent(&user_id).await?;
    require!(consent.consent_given, LabError::ConsentRequired);

    let handle = state.start_session(&user_id, req.game)?;
    let view = handle.lock().await.view();
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ControllerView>> {
    let handle = state.session(id)?;
    let controller = handle.lock().await;
    check_owner(&controller, &user_id)?;
    Ok(Json(controller.view()))
}

pub async fn decide(
    State(state): State<SharedState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<DecisionResult>> {
    let handle = state.session(id)?;
    let mut controller = handle.lock().await;
    // Anonymous decisions still settle; they are flagged not_saved
    if let Some(user_id) = &user {
        check_owner(&controller, user_id)?;
    }

    let Ok(amount) = u64::try_from(req.amount) else {
        return Err(LabError::InvalidRequest(format!(
            "Decision of {} is outside the allowed range: choose a value between 0 and {}",
            req.amount,
            controller.session().max_decision()
        )));
    };

    let result = controller
        .submit(amount, user.as_deref(), state.sink.as_ref())
        .await?;
    Ok(Json(result))
}

pub async fn advance(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvanceResponse>> {
    let handle = state.session(id)?;
    let mut controller = handle.lock().await;
    check_owner(&controller, &user_id)?;

    let phase = controller.advance()?;
    Ok(Json(AdvanceResponse {
        session_id: id,
        phase,
        round: controller.session().round(),
    }))
}

pub async fn persist(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path((id, round)): Path<(Uuid, u32)>,
) -> Result<Json<DecisionResult>> {
    let handle = state.session(id)?;
    let mut controller = handle.lock().await;
    check_owner(&controller, &user_id)?;

    let result = controller
        .retry_persist(round, Some(&user_id), state.sink.as_ref())
        .await?;
    Ok(Json(result))
}
