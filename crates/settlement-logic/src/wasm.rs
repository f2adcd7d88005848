//! WASM bindings for client-side preview and replay
//!
//! Nothing computed here is trusted; the service settles every round that
//! counts.

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::ledger::max_contribution_for;
use crate::personality::describe_personality;
use crate::{replay, GameMode, PersonalityCatalog};

fn parse_mode(mode: &str) -> Result<GameMode, JsError> {
    match mode {
        "public_goods" => Ok(GameMode::PublicGoods),
        "trust_trustee" => Ok(GameMode::TrustTrustee),
        "trust_trustor" => Ok(GameMode::TrustTrustor),
        _ => Err(JsError::new(&format!("Unknown game mode: {}", mode))),
    }
}

fn parse_catalog(json: Option<String>) -> Result<PersonalityCatalog, JsError> {
    match json {
        Some(json) => PersonalityCatalog::from_json(&json)
            .map_err(|e| JsError::new(&format!("Invalid personality catalog: {}", e))),
        None => Ok(PersonalityCatalog::standard()),
    }
}

#[derive(serde::Serialize)]
struct PersonalityInfo {
    name: String,
    return_rate_range: [u8; 2],
    description: String,
}

/// The standard opponent catalog with readable descriptions
#[wasm_bindgen]
pub fn get_personalities() -> Result<JsValue, JsError> {
    let catalog = PersonalityCatalog::standard();
    let info: Vec<PersonalityInfo> = catalog
        .iter()
        .map(|p| PersonalityInfo {
            name: p.name.clone(),
            return_rate_range: p.return_rate_range,
            description: describe_personality(p),
        })
        .collect();

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Rules record for a mode
#[wasm_bindgen]
pub fn get_game_config(mode: &str) -> Result<JsValue, JsError> {
    let config = parse_mode(mode)?.config();
    serde_wasm_bindgen::to_value(&config)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Slider bound for a balance: `min(max(floor(b / 2), floor), b)`
#[wasm_bindgen]
pub fn get_max_decision(balance: u32, minimum_floor: u32) -> u32 {
    max_contribution_for(balance as u64, minimum_floor as u64) as u32
}

/// Replay a seeded session round by round
///
/// # Arguments
/// * `mode` - `public_goods`, `trust_trustee` or `trust_trustor`
/// * `seed` - session seed as shown in the session view
/// * `decisions` - the player's decision for each round, in order
/// * `catalog_json` - optional personality catalog, standard one if absent
///
/// # Returns
/// Array of settled rounds
#[wasm_bindgen]
pub fn replay_session(
    mode: &str,
    seed: u64,
    decisions: &[u32],
    catalog_json: Option<String>,
) -> Result<JsValue, JsError> {
    let mode = parse_mode(mode)?;
    let catalog = parse_catalog(catalog_json)?;
    let decisions: Vec<u64> = decisions.iter().map(|d| *d as u64).collect();

    let rounds = replay(mode, catalog, seed, &decisions)
        .map_err(|e| JsError::new(&format!("Replay stopped: {}", e)))?;

    serde_wasm_bindgen::to_value(&rounds)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}
