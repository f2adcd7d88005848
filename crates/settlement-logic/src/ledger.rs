//! Running balances for every actor in a session

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Someone whose balance the ledger tracks
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "index")]
pub enum Actor {
    Player,
    /// Public-goods bot
    Bot(u8),
    /// Trust-game sender or opponent
    Counterpart(u8),
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Player => write!(f, "player"),
            Actor::Bot(i) => write!(f, "bot {}", i),
            Actor::Counterpart(i) => write!(f, "counterpart {}", i),
        }
    }
}

/// `min(max(floor(balance / 2), minimum_floor), balance)`
pub fn max_contribution_for(balance: u64, minimum_floor: u64) -> u64 {
    (balance / 2).max(minimum_floor).min(balance)
}

/// Non-negative balance per actor
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLedger {
    balances: BTreeMap<Actor, u64>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger with every actor in `actors` endowed with `initial`
    pub fn with_actors(actors: impl IntoIterator<Item = Actor>, initial: u64) -> Self {
        Self {
            balances: actors.into_iter().map(|a| (a, initial)).collect(),
        }
    }

    /// Current balance, 0 for an actor never endowed
    pub fn balance(&self, actor: Actor) -> u64 {
        self.balances.get(&actor).copied().unwrap_or(0)
    }

    /// Move `actor` by `delta`, refusing to go below zero
    pub fn apply(&mut self, actor: Actor, delta: i64) -> Result<u64> {
        let balance = self.balance(actor);
        let next = if delta >= 0 {
            balance.checked_add(delta.unsigned_abs())
        } else {
            balance.checked_sub(delta.unsigned_abs())
        };
        let next = next.ok_or(GameError::Overdraft { actor, balance, delta })?;
        self.balances.insert(actor, next);
        Ok(next)
    }

    /// Largest decision `actor` may make next round
    pub fn max_contribution(&self, actor: Actor, minimum_floor: u64) -> u64 {
        max_contribution_for(self.balance(actor), minimum_floor)
    }

    pub fn snapshot(&self) -> Vec<(Actor, u64)> {
        self.balances.iter().map(|(a, b)| (*a, *b)).collect()
    }
}

/// Signed difference `after - before` as a ledger delta
pub(crate) fn delta(before: u64, after: u64) -> i64 {
    after as i64 - before as i64
}
