//! Opponent personalities for the Trust Game
//!
//! A personality is a named band of return rates. Each round the simulated
//! trustee draws a rate uniformly from its band and returns that fraction of
//! what it received.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::random::SeededRng;

/// A named return-rate band, bounds in whole percent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `[min, max]` percent returned, 0-100
    pub return_rate_range: [u8; 2],
}

impl Personality {
    pub fn new(name: &str, description: &str, min_percent: u8, max_percent: u8) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            return_rate_range: [min_percent, max_percent],
        }
    }

    /// Lower bound as a fraction
    pub fn min_rate(&self) -> f64 {
        self.return_rate_range[0] as f64 / 100.0
    }

    /// Upper bound as a fraction
    pub fn max_rate(&self) -> f64 {
        self.return_rate_range[1] as f64 / 100.0
    }

    /// Whether `rate` lies inside this personality's band
    pub fn contains_rate(&self, rate: f64) -> bool {
        rate >= self.min_rate() && rate <= self.max_rate()
    }

    fn validate(&self) -> Result<()> {
        let [min, max] = self.return_rate_range;
        if self.name.trim().is_empty() {
            return Err(GameError::DataLoad {
                what: "personality catalog",
                reason: "personality with empty name".to_string(),
            });
        }
        if min > max || max > 100 {
            return Err(GameError::DataLoad {
                what: "personality catalog",
                reason: format!("{} has invalid return range {}-{}%", self.name, min, max),
            });
        }
        Ok(())
    }
}

/// Draw this round's return rate for `personality`, as a fraction in its band
pub fn sample_return_rate(personality: &Personality, rng: &mut SeededRng) -> f64 {
    rng.next_between(personality.min_rate(), personality.max_rate())
}

/// Human-readable description of a personality
pub fn describe_personality(personality: &Personality) -> String {
    let [min, max] = personality.return_rate_range;
    let mut desc = if personality.description.is_empty() {
        personality.name.clone()
    } else {
        format!("{} - {}", personality.name, personality.description)
    };
    desc.push_str(&format!(" Returns {}-{}% of what it receives.", min, max));
    desc
}

/// Ordered, read-only list of opponents
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityCatalog {
    personalities: Vec<Personality>,
}

#[derive(Deserialize)]
struct WrappedCatalog {
    personalities: Vec<Personality>,
}

impl PersonalityCatalog {
    /// The four opponents used by the trustor game
    pub fn standard() -> Self {
        Self {
            personalities: vec![
                Personality::new("Cautious Receiver", "Returns little.", 10, 30),
                Personality::new("Fair Receiver", "Returns a moderate share.", 40, 60),
                Personality::new("Generous Receiver", "Returns most of it.", 70, 90),
                Personality::new("Unpredictable Receiver", "Returns anything from a little to most.", 10, 90),
            ],
        }
    }

    pub fn new(personalities: Vec<Personality>) -> Result<Self> {
        if personalities.is_empty() {
            return Err(GameError::DataLoad {
                what: "personality catalog",
                reason: "catalog is empty".to_string(),
            });
        }
        for personality in &personalities {
            personality.validate()?;
        }
        Ok(Self { personalities })
    }

    /// Parse a catalog from JSON.
    ///
    /// Accepts either `{"personalities": [...]}` or a bare array.
    pub fn from_json(json: &str) -> Result<Self> {
        if let Ok(wrapped) = serde_json::from_str::<WrappedCatalog>(json) {
            return Self::new(wrapped.personalities);
        }
        let list: Vec<Personality> = serde_json::from_str(json).map_err(|e| GameError::DataLoad {
            what: "personality catalog",
            reason: e.to_string(),
        })?;
        Self::new(list)
    }

    /// Fails unless the catalog seats exactly `opponents` distinct opponents
    pub fn check_lineup(&self, opponents: usize) -> Result<()> {
        if self.personalities.len() != opponents {
            return Err(GameError::DataLoad {
                what: "personality catalog",
                reason: format!(
                    "trustor game needs {} opponents, catalog has {}",
                    opponents,
                    self.personalities.len()
                ),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.personalities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personalities.is_empty()
    }

    /// Opponent at `index`, wrapping around the catalog
    pub fn get(&self, index: usize) -> &Personality {
        &self.personalities[index % self.personalities.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Personality> {
        self.personalities.iter()
    }
}

impl Default for PersonalityCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
