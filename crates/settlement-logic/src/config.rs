//! Per-mode game rules

use serde::{Deserialize, Serialize};

/// Which game a session plays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Player plus four bots contribute to a shared pool
    PublicGoods,
    /// Player receives a tripled investment and decides how much to return
    TrustTrustee,
    /// Player invests; four opponents in turn return part of the tripled amount
    TrustTrustor,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::PublicGoods, GameMode::TrustTrustee, GameMode::TrustTrustor];

    /// Record-store game type
    pub fn game_type(&self) -> GameType {
        match self {
            GameMode::PublicGoods => GameType::PublicGoods,
            GameMode::TrustTrustee | GameMode::TrustTrustor => GameType::TrustGame,
        }
    }

    pub fn config(&self) -> GameConfig {
        match self {
            GameMode::PublicGoods => GameConfig::public_goods(),
            GameMode::TrustTrustee => GameConfig::trust_trustee(),
            GameMode::TrustTrustor => GameConfig::trust_trustor(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::PublicGoods => "public_goods",
            GameMode::TrustTrustee => "trust_trustee",
            GameMode::TrustTrustor => "trust_trustor",
        }
    }
}

/// Game type under which rounds are stored and queried
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    PublicGoods,
    TrustGame,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::PublicGoods => "public_goods",
            GameType::TrustGame => "trust_game",
        }
    }

    /// Parse a game type name, accepting the role-qualified trust names
    pub fn parse(name: &str) -> Option<GameType> {
        match name {
            "public_goods" | "public-goods" => Some(GameType::PublicGoods),
            "trust_game" | "trust-game" | "trust_game_trustor" | "trust_game_trustee" => {
                Some(GameType::TrustGame)
            }
            _ => None,
        }
    }
}

/// Exact rational multiplier, so pools and shares stay integral
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplier {
    pub numerator: u64,
    pub denominator: u64,
}

impl Multiplier {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self { numerator, denominator }
    }

    pub const fn whole(factor: u64) -> Self {
        Self { numerator: factor, denominator: 1 }
    }

    /// `floor(amount * self)`
    pub fn apply(&self, amount: u64) -> u64 {
        amount * self.numerator / self.denominator
    }

    /// `floor(amount * self / parts)`
    pub fn apply_split(&self, amount: u64, parts: u64) -> u64 {
        amount * self.numerator / (self.denominator * parts)
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// Public-good multiplier (1.5)
pub const PUBLIC_GOODS_MULTIPLIER: Multiplier = Multiplier::new(3, 2);
/// Trust-game transfer multiplier
pub const TRUST_MULTIPLIER: Multiplier = Multiplier::whole(3);
/// Player plus four bots
pub const PUBLIC_GOODS_PLAYERS: usize = 5;
/// Opponents in the trustor game
pub const TRUSTOR_OPPONENTS: usize = 4;
/// Rounds played against each trustor opponent
pub const ROUNDS_PER_OPPONENT: u32 = 10;
/// Trustor minimum investment allowance, capped by the balance itself
pub const TRUSTOR_MINIMUM_INVESTMENT: u64 = 5;

/// Typed rules record for one game mode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub mode: GameMode,
    pub total_rounds: u32,
    /// Endowment for the player and every simulated actor
    pub initial_balance: u64,
    pub multiplier: Multiplier,
    /// Public goods: player plus bots
    pub num_players: usize,
    /// Trust games: distinct counterparts over the session
    pub num_opponents: usize,
    /// Rounds before the trustor switches to the next opponent
    pub rounds_per_opponent: u32,
    /// Lower bound on the maximum decision, still capped by the balance
    pub minimum_investment: u64,
}

impl GameConfig {
    pub fn public_goods() -> Self {
        Self {
            mode: GameMode::PublicGoods,
            total_rounds: 10,
            initial_balance: 100,
            multiplier: PUBLIC_GOODS_MULTIPLIER,
            num_players: PUBLIC_GOODS_PLAYERS,
            num_opponents: PUBLIC_GOODS_PLAYERS - 1,
            rounds_per_opponent: 10,
            minimum_investment: 0,
        }
    }

    pub fn trust_trustee() -> Self {
        Self {
            mode: GameMode::TrustTrustee,
            total_rounds: 10,
            initial_balance: 10,
            multiplier: TRUST_MULTIPLIER,
            num_players: 2,
            num_opponents: 1,
            rounds_per_opponent: 10,
            minimum_investment: 0,
        }
    }

    pub fn trust_trustor() -> Self {
        Self {
            mode: GameMode::TrustTrustor,
            total_rounds: ROUNDS_PER_OPPONENT * TRUSTOR_OPPONENTS as u32,
            initial_balance: 10,
            multiplier: TRUST_MULTIPLIER,
            num_players: 2,
            num_opponents: TRUSTOR_OPPONENTS,
            rounds_per_opponent: ROUNDS_PER_OPPONENT,
            minimum_investment: TRUSTOR_MINIMUM_INVESTMENT,
        }
    }

    /// Number of simulated bots sharing the public-goods pool
    pub fn bot_count(&self) -> usize {
        self.num_players.saturating_sub(1)
    }

    /// Opponent index active during `round` (1-based)
    pub fn opponent_for_round(&self, round: u32) -> usize {
        if self.rounds_per_opponent == 0 || self.num_opponents == 0 {
            return 0;
        }
        ((round.saturating_sub(1) / self.rounds_per_opponent) as usize) % self.num_opponents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_rounds() {
        assert_eq!(GameConfig::public_goods().total_rounds, 10);
        assert_eq!(GameConfig::trust_trustee().total_rounds, 10);
        assert_eq!(GameConfig::trust_trustor().total_rounds, 40);
    }

    #[test]
    fn test_public_goods_multiplier_is_individually_rational() {
        let config = GameConfig::public_goods();
        let m = config.multiplier.as_f64();
        assert!(m > 1.0 && m < config.num_players as f64);
    }

    #[test]
    fn test_multiplier_floors() {
        assert_eq!(PUBLIC_GOODS_MULTIPLIER.apply(70), 105);
        assert_eq!(PUBLIC_GOODS_MULTIPLIER.apply(7), 10);
        assert_eq!(PUBLIC_GOODS_MULTIPLIER.apply_split(70, 5), 21);
        assert_eq!(PUBLIC_GOODS_MULTIPLIER.apply_split(71, 5), 21);
        assert_eq!(TRUST_MULTIPLIER.apply(5), 15);
    }

    #[test]
    fn test_opponent_cycling() {
        let config = GameConfig::trust_trustor();
        assert_eq!(config.opponent_for_round(1), 0);
        assert_eq!(config.opponent_for_round(10), 0);
        assert_eq!(config.opponent_for_round(11), 1);
        assert_eq!(config.opponent_for_round(21), 2);
        assert_eq!(config.opponent_for_round(40), 3);
        assert_eq!(config.opponent_for_round(41), 0);
    }

    #[test]
    fn test_game_type_parse() {
        assert_eq!(GameType::parse("public_goods"), Some(GameType::PublicGoods));
        assert_eq!(GameType::parse("trust_game_trustee"), Some(GameType::TrustGame));
        assert_eq!(GameType::parse("chess"), None);
        assert_eq!(GameMode::TrustTrustor.game_type(), GameType::TrustGame);
    }
}
