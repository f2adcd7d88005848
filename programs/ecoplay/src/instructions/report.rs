//! History, reports and progress
//!
//! Report views fall back to empty results when records cannot be loaded;
//! the history endpoint reports the failure.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use settlement_logic::report::{
    combined_report, public_goods_report, trust_report, CombinedReport, GameProgress, PublicGoodsReport,
    TrustReport,
};
use settlement_logic::{GameType, Role};

use super::CurrentUser;
use crate::error::{LabError, Result};
use crate::sink::RoundRecord;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct HistoryResponse {
    pub game_type: GameType,
    pub history: Vec<RoundRecord>,
}

#[derive(Deserialize)]
pub struct RoleQuery {
    pub role: Option<String>,
}

/// Records for a report, empty on load failure
async fn load_or_empty(state: &SharedState, user_id: &str, game_type: GameType) -> Vec<RoundRecord> {
    match state.sink.rounds_for(user_id, game_type).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(user_id = %user_id, game_type = game_type.as_str(), error = %e, "history unavailable, reporting empty");
            Vec::new()
        }
    }
}

fn parse_role(role: Option<&str>) -> Result<Option<Role>> {
    match role {
        None | Some("") => Ok(None),
        Some("trustor") => Ok(Some(Role::Trustor)),
        Some("trustee") => Ok(Some(Role::Trustee)),
        Some(other) => Err(LabError::InvalidRequest(format!(
            "Unknown role {other}: use trustor or trustee"
        ))),
    }
}

pub async fn history(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Path(game_type): Path<String>,
) -> Result<Json<HistoryResponse>> {
    let game_type = GameType::parse(&game_type).ok_or(LabError::UnknownGameType(game_type))?;
    let history = state.sink.rounds_for(&user_id, game_type).await?;
    Ok(Json(HistoryResponse { game_type, history }))
}

async fn build_public_goods(state: &SharedState, user_id: &str) -> PublicGoodsReport {
    let records = load_or_empty(state, user_id, GameType::PublicGoods).await;
    public_goods_report(records.iter().map(|r| &r.round))
}

async fn build_trust(state: &SharedState, user_id: &str, role: Option<Role>) -> TrustReport {
    let records = load_or_empty(state, user_id, GameType::TrustGame).await;
    trust_report(records.iter().map(|r| &r.round), role)
}

pub async fn public_goods(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Json<PublicGoodsReport> {
    Json(build_public_goods(&state, &user_id).await)
}

pub async fn trust_game(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<RoleQuery>,
) -> Result<Json<TrustReport>> {
    let role = parse_role(query.role.as_deref())?;
    Ok(Json(build_trust(&state, &user_id, role).await))
}

pub async fn all(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Json<CombinedReport> {
    let pg = build_public_goods(&state, &user_id).await;
    let tg = build_trust(&state, &user_id, None).await;
    Json(combined_report(pg, tg))
}

pub async fn progress(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Json<GameProgress> {
    let pg = state.sink.rounds_for(&user_id, GameType::PublicGoods).await;
    let tg = state.sink.rounds_for(&user_id, GameType::TrustGame).await;
    let progress = match (pg, tg) {
        (Ok(pg), Ok(tg)) => GameProgress::from_counts(pg.len(), tg.len()),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(user_id = %user_id, error = %e, "progress unavailable, reporting zeros");
            GameProgress::default()
        }
    };
    Json(progress)
}
