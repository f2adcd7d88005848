//! Settlement Logic for EcoPlay
//!
//! Round settlement, bot behavior and session progression for the Public
//! Goods Game and the Trust Game (player as trustor or trustee).
//! This crate is compiled to:
//! - Native (for the ecoplay service, which settles authoritatively)
//! - WASM (for client-side preview and replay)

mod config;
mod error;
mod ledger;
mod personality;
mod random;
pub mod report;
pub mod settlement;
mod session;

#[cfg(feature = "wasm")]
mod wasm;

pub use config::{
    GameConfig, GameMode, GameType, Multiplier, PUBLIC_GOODS_MULTIPLIER, PUBLIC_GOODS_PLAYERS,
    ROUNDS_PER_OPPONENT, TRUSTOR_MINIMUM_INVESTMENT, TRUSTOR_OPPONENTS, TRUST_MULTIPLIER,
};
pub use error::{GameError, Result};
pub use ledger::{max_contribution_for, Actor, BalanceLedger};
pub use personality::{describe_personality, sample_return_rate, Personality, PersonalityCatalog};
pub use random::SeededRng;
pub use session::{replay, GameSession, Phase, Role, RoundOutcome, SessionView, SettledRound};
pub use settlement::{
    open_trustee_round, settle_public_goods_round, settle_public_goods_with, settle_trustee_return,
    settle_trustor_round, settle_trustor_with_rate, PublicGoodsOutcome, TrusteeOffer, TrusteeOutcome,
    TrustorOutcome,
};
