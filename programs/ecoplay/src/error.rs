//! Service error codes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use settlement_logic::GameError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LabError {
    #[error("Missing or invalid token")]
    Unauthorized,

    #[error("Medical record number or password is incorrect")]
    InvalidCredentials,

    #[error("Participant {0} is already registered")]
    AlreadyRegistered(String),

    #[error("Consent must be given before playing")]
    ConsentRequired,

    #[error("No participant is signed in; the round was not saved")]
    IdentityMissing,

    #[error("Failed to save round: {0}")]
    Persistence(String),

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Round {0} has not been settled in this session")]
    RoundNotFound(u32),

    #[error("Opponent catalog is unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Unsupported game type: {0}")]
    UnknownGameType(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("This session belongs to another participant")]
    NotSessionOwner,

    #[error(transparent)]
    Game(#[from] GameError),
}

impl LabError {
    /// Stable numeric code, reported alongside the message
    pub fn code(&self) -> u32 {
        match self {
            LabError::Unauthorized => 6000,
            LabError::InvalidCredentials => 6001,
            LabError::AlreadyRegistered(_) => 6002,
            LabError::ConsentRequired => 6003,
            LabError::IdentityMissing => 6004,
            LabError::Persistence(_) => 6005,
            LabError::SessionNotFound(_) => 6006,
            LabError::RoundNotFound(_) => 6007,
            LabError::CatalogUnavailable(_) => 6008,
            LabError::UnknownGameType(_) => 6009,
            LabError::InvalidRequest(_) => 6010,
            LabError::NotSessionOwner => 6011,
            LabError::Game(e) => e.code(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            LabError::Unauthorized | LabError::InvalidCredentials | LabError::IdentityMissing => {
                StatusCode::UNAUTHORIZED
            }
            LabError::AlreadyRegistered(_) => StatusCode::CONFLICT,
            LabError::ConsentRequired | LabError::NotSessionOwner => StatusCode::FORBIDDEN,
            LabError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LabError::SessionNotFound(_) | LabError::RoundNotFound(_) => StatusCode::NOT_FOUND,
            LabError::CatalogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LabError::UnknownGameType(_) | LabError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            LabError::Game(e) => match e {
                GameError::DecisionOutOfRange { .. } => StatusCode::BAD_REQUEST,
                GameError::SessionFinished
                | GameError::RoundAlreadySettled { .. }
                | GameError::RoundNotSettled { .. } => StatusCode::CONFLICT,
                GameError::DataLoad { .. } => StatusCode::SERVICE_UNAVAILABLE,
                GameError::Overdraft { .. } | GameError::BotCountMismatch { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for LabError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }
        let body = serde_json::json!({ "code": self.code(), "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Return early with `$err` unless `$cond` holds
macro_rules! require {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

pub(crate) use require;

pub type Result<T> = std::result::Result<T, LabError>;
