//! Engine error codes

use thiserror::Error;

use crate::ledger::Actor;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Decision of {amount} is outside the allowed range: choose a value between 0 and {max}")]
    DecisionOutOfRange { amount: u64, max: u64 },

    #[error("Session has finished; no further decisions are accepted")]
    SessionFinished,

    #[error("Round {round} is already settled; advance to the next round first")]
    RoundAlreadySettled { round: u32 },

    #[error("Round {round} is still awaiting a decision")]
    RoundNotSettled { round: u32 },

    #[error("Failed to load {what}: {reason}")]
    DataLoad { what: &'static str, reason: String },

    #[error("Balance of {actor} cannot go below zero (balance {balance}, change {delta})")]
    Overdraft { actor: Actor, balance: u64, delta: i64 },

    #[error("Got {contributions} bot contributions for {bots} bots")]
    BotCountMismatch { bots: usize, contributions: usize },
}

impl GameError {
    /// Stable numeric code, reported alongside the message
    pub fn code(&self) -> u32 {
        match self {
            GameError::DecisionOutOfRange { .. } => 7000,
            GameError::SessionFinished => 7001,
            GameError::RoundAlreadySettled { .. } => 7002,
            GameError::RoundNotSettled { .. } => 7003,
            GameError::DataLoad { .. } => 7004,
            GameError::Overdraft { .. } => 7005,
            GameError::BotCountMismatch { .. } => 7006,
        }
    }

    /// Recoverable by re-prompting the participant
    pub fn is_validation(&self) -> bool {
        matches!(self, GameError::DecisionOutOfRange { .. })
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
