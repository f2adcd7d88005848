//! EcoPlay lab service
//!
//! The one place rounds are settled for real: participants sign in, give
//! consent, and play Public Goods and Trust Game sessions against simulated
//! bots. Every settled round is stored for later analysis.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/auth/register` | Register with MRN and birth date |
//! | POST | `/auth/login` | Sign in |
//! | POST | `/auth/password` | Change password, revoking older tokens |
//! | POST | `/auth/logout` | Revoke the caller's token |
//! | POST | `/consent/submit` | Append a consent record |
//! | GET | `/consent/check` | Latest consent status |
//! | GET | `/consent/list` | All consent records, newest first |
//! | GET | `/match/trust-game/personalities` | Opponent catalog |
//! | POST | `/sessions` | Start a session |
//! | GET | `/sessions/:id` | Session view |
//! | POST | `/sessions/:id/decision` | Settle the current round |
//! | POST | `/sessions/:id/advance` | Open the next round |
//! | POST | `/sessions/:id/rounds/:round/persist` | Retry saving a round |
//! | GET | `/history/:game_type` | Stored rounds |
//! | GET | `/report/public-goods` | Public Goods report |
//! | GET | `/report/trust-game` | Trust Game report, `?role=` |
//! | GET | `/report/all` | Both reports plus overall summary |
//! | GET | `/report/progress` | Completion per game |

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod consent;
pub mod controller;
pub mod error;
pub mod identity;
pub mod instructions;
pub mod sink;
pub mod state;

use instructions::{auth, consent as consent_routes, report, session};
pub use state::{AppState, SharedState};

pub fn create_router(state: SharedState, allowed_origin: Option<HeaderValue>) -> Router {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let cors = match allowed_origin {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    };

    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/password", post(auth::change_password))
        .route("/auth/logout", post(auth::logout))
        .route("/consent/submit", post(consent_routes::submit))
        .route("/consent/check", get(consent_routes::check))
        .route("/consent/list", get(consent_routes::list))
        .route("/match/trust-game/personalities", get(session::personalities))
        .route("/sessions", post(session::start))
        .route("/sessions/:id", get(session::get))
        .route("/sessions/:id/decision", post(session::decide))
        .route("/sessions/:id/advance", post(session::advance))
        .route("/sessions/:id/rounds/:round/persist", post(session::persist))
        .route("/history/:game_type", get(report::history))
        .route("/report/public-goods", get(report::public_goods))
        .route("/report/trust-game", get(report::trust_game))
        .route("/report/all", get(report::all))
        .route("/report/progress", get(report::progress))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}
