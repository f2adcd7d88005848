//! Authoritative session controller
//!
//! Wraps a [`GameSession`] with what the pure engine leaves out: the
//! round-start clock for response latency, the participant identity check,
//! persistence through a [`RecordSink`] and the per-round save status.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use settlement_logic::{GameMode, GameSession, PersonalityCatalog, Phase, SessionView, SettledRound};
use uuid::Uuid;

use crate::error::{LabError, Result};
use crate::sink::{RecordSink, RoundRecord};

/// Whether a settled round reached the record store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SaveStatus {
    Saved { record_id: Uuid },
    /// No participant identity was available at decision time
    NotSaved,
    Failed { reason: String },
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved { .. })
    }
}

/// Response to a decision or a manual persist
#[derive(Clone, Debug, Serialize)]
pub struct DecisionResult {
    pub session_id: Uuid,
    pub result: SettledRound,
    pub save_status: SaveStatus,
    pub phase: Phase,
}

#[derive(Clone, Debug, Serialize)]
pub struct ControllerView {
    pub session_id: Uuid,
    pub user_id: String,
    #[serde(flatten)]
    pub session: SessionView,
    pub save_status: BTreeMap<u32, SaveStatus>,
}

pub struct SessionController {
    id: Uuid,
    user_id: String,
    session: GameSession,
    round_started: Instant,
    last_active: Instant,
    save_status: BTreeMap<u32, SaveStatus>,
}

impl SessionController {
    pub fn new(id: Uuid, user_id: &str, mode: GameMode, catalog: PersonalityCatalog, seed: u64) -> Self {
        tracing::info!(session_id = %id, user_id = %user_id, mode = mode.as_str(), seed, "session started");
        Self {
            id,
            user_id: user_id.to_string(),
            session: GameSession::for_mode(mode, catalog, seed),
            round_started: Instant::now(),
            last_active: Instant::now(),
            save_status: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Time since the participant last acted on this session
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    pub fn save_status(&self, round: u32) -> Option<&SaveStatus> {
        self.save_status.get(&round)
    }

    /// `group_<session>` for Public Goods sessions
    pub fn group_id(&self) -> Option<String> {
        match self.session.mode() {
            GameMode::PublicGoods => Some(format!("group_{}", self.id)),
            _ => None,
        }
    }

    pub fn view(&self) -> ControllerView {
        ControllerView {
            session_id: self.id,
            user_id: self.user_id.clone(),
            session: self.session.view(),
            save_status: self.save_status.clone(),
        }
    }

    /// Settle the current round and try to persist it
    ///
    /// `identity` is the participant resolved at decision time. Without one
    /// the round is still settled and returned, flagged `not_saved`. A sink
    /// failure flags it `failed`; neither undoes the settlement.
    pub async fn submit(
        &mut self,
        decision: u64,
        identity: Option<&str>,
        sink: &dyn RecordSink,
    ) -> Result<DecisionResult> {
        self.last_active = Instant::now();
        let latency_ms = self.round_started.elapsed().as_millis() as u64;
        let settled = self.session.submit(decision, latency_ms)?.clone();

        tracing::info!(
            session_id = %self.id,
            mode = self.session.mode().as_str(),
            round = settled.round,
            decision,
            payoff = settled.payoff(),
            balance = settled.balance_after,
            latency_ms,
            "round settled"
        );

        let save_status = self.persist(&settled, identity, sink).await;
        self.save_status.insert(settled.round, save_status.clone());

        Ok(DecisionResult {
            session_id: self.id,
            result: settled,
            save_status,
            phase: self.session.phase(),
        })
    }

    /// Move to the next round and restart the latency clock
    pub fn advance(&mut self) -> Result<Phase> {
        let phase = self.session.advance()?;
        self.round_started = Instant::now();
        self.last_active = self.round_started;
        if let Phase::AwaitingDecision { round } = phase {
            tracing::debug!(session_id = %self.id, round, "round opened");
        }
        Ok(phase)
    }

    /// Re-persist an already settled round without settling it again
    pub async fn retry_persist(
        &mut self,
        round: u32,
        identity: Option<&str>,
        sink: &dyn RecordSink,
    ) -> Result<DecisionResult> {
        self.last_active = Instant::now();
        let settled = self
            .session
            .settled_round(round)
            .cloned()
            .ok_or(LabError::RoundNotFound(round))?;

        let save_status = match self.save_status.get(&round) {
            Some(status @ SaveStatus::Saved { .. }) => status.clone(),
            _ => self.persist(&settled, identity, sink).await,
        };
        self.save_status.insert(round, save_status.clone());

        Ok(DecisionResult {
            session_id: self.id,
            result: settled,
            save_status,
            phase: self.session.phase(),
        })
    }

    async fn persist(&self, settled: &SettledRound, identity: Option<&str>, sink: &dyn RecordSink) -> SaveStatus {
        let Some(user_id) = identity else {
            tracing::warn!(session_id = %self.id, round = settled.round, error = %LabError::IdentityMissing, "round not saved");
            return SaveStatus::NotSaved;
        };

        let record = RoundRecord {
            record_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            session_id: self.id,
            game_type: self.session.mode().game_type(),
            group_id: self.group_id(),
            timestamp: Utc::now(),
            round: settled.clone(),
        };

        match sink.persist_round(&record).await {
            Ok(record_id) => {
                tracing::info!(session_id = %self.id, round = settled.round, %record_id, "round saved");
                SaveStatus::Saved { record_id }
            }
            Err(e) => {
                tracing::error!(session_id = %self.id, round = settled.round, error = %e, "round save failed");
                SaveStatus::Failed { reason: e.to_string() }
            }
        }
    }
}
