//! Session state machine
//!
//! A [`GameSession`] walks one game's round sequence:
//! `AwaitingDecision(n) -> RoundSettled(n) -> AwaitingDecision(n + 1)`, and
//! the settlement of the last round goes straight to `Finished`. Bot draws
//! for round `n` come from `rng.for_round(n)`, so a session replays exactly
//! from its seed and decision list.

use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, GameMode};
use crate::error::{GameError, Result};
use crate::ledger::{delta, Actor, BalanceLedger};
use crate::personality::{Personality, PersonalityCatalog};
use crate::random::SeededRng;
use crate::settlement::{
    open_trustee_round, settle_public_goods_round, settle_trustee_return, settle_trustor_round,
    PublicGoodsOutcome, TrusteeOffer, TrusteeOutcome, TrustorOutcome,
};

/// Where the session is in its round sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum Phase {
    AwaitingDecision { round: u32 },
    RoundSettled { round: u32 },
    Finished,
}

/// The player's role in a round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Contributor,
    Trustor,
    Trustee,
}

impl Role {
    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::PublicGoods => Role::Contributor,
            GameMode::TrustTrustor => Role::Trustor,
            GameMode::TrustTrustee => Role::Trustee,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Contributor => "contributor",
            Role::Trustor => "trustor",
            Role::Trustee => "trustee",
        }
    }
}

/// Mode-specific settlement payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum RoundOutcome {
    PublicGoods(PublicGoodsOutcome),
    Trustee(TrusteeOutcome),
    Trustor(TrustorOutcome),
}

impl RoundOutcome {
    pub fn payoff(&self) -> i64 {
        match self {
            RoundOutcome::PublicGoods(o) => o.payoff,
            RoundOutcome::Trustee(o) => o.payoff,
            RoundOutcome::Trustor(o) => o.payoff,
        }
    }

    pub fn new_player_balance(&self) -> u64 {
        match self {
            RoundOutcome::PublicGoods(o) => o.new_player_balance,
            RoundOutcome::Trustee(o) => o.new_player_balance,
            RoundOutcome::Trustor(o) => o.new_player_balance,
        }
    }
}

/// Immutable record of one settled round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettledRound {
    pub round: u32,
    pub mode: GameMode,
    pub role: Role,
    pub decision: u64,
    pub response_time_ms: u64,
    /// Trust games: the counterpart, e.g. `bot_2_Generous Receiver`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    pub balance_before: u64,
    pub balance_after: u64,
    pub outcome: RoundOutcome,
}

impl SettledRound {
    pub fn payoff(&self) -> i64 {
        self.outcome.payoff()
    }
}

/// Serializable picture of a session, for clients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub mode: GameMode,
    pub seed: u64,
    pub phase: Phase,
    pub round: u32,
    pub total_rounds: u32,
    pub balance: u64,
    /// Largest decision accepted this round, 0 once finished
    pub max_decision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<Personality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<TrusteeOffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<SettledRound>,
    pub balances: Vec<(Actor, u64)>,
}

/// One participant's traversal of one game
#[derive(Clone, Debug)]
pub struct GameSession {
    config: GameConfig,
    catalog: PersonalityCatalog,
    seed: u64,
    rng: SeededRng,
    ledger: BalanceLedger,
    phase: Phase,
    round: u32,
    offer: Option<TrusteeOffer>,
    rounds: Vec<SettledRound>,
}

impl GameSession {
    pub fn new(config: GameConfig, catalog: PersonalityCatalog, seed: u64) -> Self {
        let counterparts: Vec<Actor> = match config.mode {
            GameMode::PublicGoods => (0..config.bot_count()).map(|i| Actor::Bot(i as u8)).collect(),
            GameMode::TrustTrustee => vec![Actor::Counterpart(0)],
            GameMode::TrustTrustor => (0..config.num_opponents)
                .map(|i| Actor::Counterpart(i as u8))
                .collect(),
        };
        let ledger = BalanceLedger::with_actors(
            std::iter::once(Actor::Player).chain(counterparts),
            config.initial_balance,
        );

        let mut session = Self {
            catalog,
            seed,
            rng: SeededRng::from_u64(seed),
            ledger,
            phase: Phase::AwaitingDecision { round: 1 },
            round: 1,
            offer: None,
            rounds: Vec::with_capacity(config.total_rounds as usize),
            config,
        };
        session.open_round();
        session
    }

    /// Session for `mode` with its standard rules
    pub fn for_mode(mode: GameMode, catalog: PersonalityCatalog, seed: u64) -> Self {
        Self::new(mode.config(), catalog, seed)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn mode(&self) -> GameMode {
        self.config.mode
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current 1-based round index
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    pub fn balance(&self) -> u64 {
        self.ledger.balance(Actor::Player)
    }

    /// Open trustee offer for the current round
    pub fn offer(&self) -> Option<&TrusteeOffer> {
        self.offer.as_ref()
    }

    pub fn rounds(&self) -> &[SettledRound] {
        &self.rounds
    }

    pub fn settled_round(&self, round: u32) -> Option<&SettledRound> {
        self.rounds.iter().find(|r| r.round == round)
    }

    /// Result of the most recent settlement, still readable after finishing
    pub fn last_result(&self) -> Option<&SettledRound> {
        match self.phase {
            Phase::AwaitingDecision { .. } => None,
            Phase::RoundSettled { .. } | Phase::Finished => self.rounds.last(),
        }
    }

    /// Index of the active trustor opponent
    pub fn opponent_index(&self) -> usize {
        self.config.opponent_for_round(self.round)
    }

    /// Active opponent, trustor mode only
    pub fn current_opponent(&self) -> Option<&Personality> {
        match self.config.mode {
            GameMode::TrustTrustor => Some(self.catalog.get(self.opponent_index())),
            _ => None,
        }
    }

    /// Largest decision accepted for the current round
    pub fn max_decision(&self) -> u64 {
        match self.config.mode {
            GameMode::PublicGoods => self.ledger.max_contribution(Actor::Player, 0),
            GameMode::TrustTrustor => self
                .ledger
                .max_contribution(Actor::Player, self.config.minimum_investment),
            GameMode::TrustTrustee => self.offer.map(|o| o.tripled).unwrap_or(0),
        }
    }

    /// Settle the current round with the player's `decision`
    pub fn submit(&mut self, decision: u64, response_time_ms: u64) -> Result<&SettledRound> {
        match self.phase {
            Phase::Finished => return Err(GameError::SessionFinished),
            Phase::RoundSettled { round } => return Err(GameError::RoundAlreadySettled { round }),
            Phase::AwaitingDecision { .. } => {}
        }

        let max = self.max_decision();
        if decision > max {
            return Err(GameError::DecisionOutOfRange { amount: decision, max });
        }

        let balance_before = self.balance();
        let mut rng = self.rng.for_round(self.round);
        let (outcome, partner_id) = match self.config.mode {
            GameMode::PublicGoods => (self.settle_public_goods(decision, &mut rng)?, None),
            GameMode::TrustTrustee => (self.settle_trustee(decision)?, Some("sender".to_string())),
            GameMode::TrustTrustor => {
                let index = self.opponent_index();
                let partner = format!("bot_{}_{}", index, self.catalog.get(index).name);
                (self.settle_trustor(decision, index, &mut rng)?, Some(partner))
            }
        };

        let balance_after = self.balance();
        debug_assert_eq!(balance_after, outcome.new_player_balance());

        self.rounds.push(SettledRound {
            round: self.round,
            mode: self.config.mode,
            role: Role::for_mode(self.config.mode),
            decision,
            response_time_ms,
            partner_id,
            balance_before,
            balance_after,
            outcome,
        });

        self.phase = if self.round >= self.config.total_rounds {
            Phase::Finished
        } else {
            Phase::RoundSettled { round: self.round }
        };

        self.rounds.last().ok_or(GameError::RoundNotSettled { round: self.round })
    }

    /// Move from a settled round to the next one
    pub fn advance(&mut self) -> Result<Phase> {
        match self.phase {
            Phase::Finished => Err(GameError::SessionFinished),
            Phase::AwaitingDecision { round } => Err(GameError::RoundNotSettled { round }),
            Phase::RoundSettled { round } => {
                self.round = round + 1;
                self.phase = Phase::AwaitingDecision { round: self.round };
                self.open_round();
                Ok(self.phase)
            }
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            mode: self.config.mode,
            seed: self.seed,
            phase: self.phase,
            round: self.round,
            total_rounds: self.config.total_rounds,
            balance: self.balance(),
            max_decision: if self.is_finished() { 0 } else { self.max_decision() },
            opponent: self.current_opponent().cloned(),
            offer: self.offer,
            last_result: self.last_result().cloned(),
            balances: self.ledger.snapshot(),
        }
    }

    /// Reset per-round state and draw anything the round opens with
    fn open_round(&mut self) {
        self.offer = match self.config.mode {
            GameMode::TrustTrustee => {
                let mut rng = self.rng.for_round(self.round);
                let sender = self.ledger.balance(Actor::Counterpart(0));
                Some(open_trustee_round(sender, &mut rng))
            }
            _ => None,
        };
    }

    fn settle_public_goods(&mut self, contribution: u64, rng: &mut SeededRng) -> Result<RoundOutcome> {
        let bots: Vec<Actor> = (0..self.config.bot_count()).map(|i| Actor::Bot(i as u8)).collect();
        let bot_balances: Vec<u64> = bots.iter().map(|b| self.ledger.balance(*b)).collect();
        let player_balance = self.balance();

        let outcome = settle_public_goods_round(contribution, player_balance, &bot_balances, rng)?;

        self.ledger
            .apply(Actor::Player, delta(player_balance, outcome.new_player_balance))?;
        for ((bot, before), after) in bots.iter().zip(&bot_balances).zip(&outcome.new_bot_balances) {
            self.ledger.apply(*bot, delta(*before, *after))?;
        }
        Ok(RoundOutcome::PublicGoods(outcome))
    }

    fn settle_trustee(&mut self, returned: u64) -> Result<RoundOutcome> {
        let offer = self.offer.ok_or(GameError::RoundNotSettled { round: self.round })?;
        let sender = Actor::Counterpart(0);
        let player_balance = self.balance();
        let sender_balance = self.ledger.balance(sender);

        let outcome = settle_trustee_return(&offer, returned, player_balance, sender_balance)?;

        self.ledger
            .apply(Actor::Player, delta(player_balance, outcome.new_player_balance))?;
        self.ledger
            .apply(sender, delta(sender_balance, outcome.new_sender_balance))?;
        Ok(RoundOutcome::Trustee(outcome))
    }

    fn settle_trustor(&mut self, investment: u64, index: usize, rng: &mut SeededRng) -> Result<RoundOutcome> {
        let opponent = Actor::Counterpart(index as u8);
        let player_balance = self.balance();
        let opponent_balance = self.ledger.balance(opponent);
        let personality = self.catalog.get(index);

        let outcome = settle_trustor_round(investment, player_balance, personality, opponent_balance, rng)?;

        self.ledger
            .apply(Actor::Player, delta(player_balance, outcome.new_player_balance))?;
        self.ledger
            .apply(opponent, delta(opponent_balance, outcome.new_opponent_balance))?;
        Ok(RoundOutcome::Trustor(outcome))
    }
}

/// Replay a seeded session from its decisions, advancing after each round
///
/// Stops at the first rejected decision.
pub fn replay(
    mode: GameMode,
    catalog: PersonalityCatalog,
    seed: u64,
    decisions: &[u64],
) -> Result<Vec<SettledRound>> {
    if mode == GameMode::TrustTrustor {
        catalog.check_lineup(mode.config().num_opponents)?;
    }
    let mut session = GameSession::for_mode(mode, catalog, seed);
    for decision in decisions {
        session.submit(*decision, 0)?;
        if session.is_finished() {
            break;
        }
        session.advance()?;
    }
    Ok(session.rounds().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(mode: GameMode) -> GameSession {
        GameSession::for_mode(mode, PersonalityCatalog::standard(), 42)
    }

    #[test]
    fn test_initial_state() {
        let s = session(GameMode::PublicGoods);
        assert_eq!(s.phase(), Phase::AwaitingDecision { round: 1 });
        assert_eq!(s.balance(), 100);
        assert_eq!(s.max_decision(), 50);
        assert!(s.last_result().is_none());
        assert!(s.current_opponent().is_none());
    }

    #[test]
    fn test_submit_then_advance() {
        let mut s = session(GameMode::PublicGoods);
        let settled = s.submit(20, 1500).unwrap().clone();
        assert_eq!(settled.round, 1);
        assert_eq!(settled.role, Role::Contributor);
        assert_eq!(settled.response_time_ms, 1500);
        assert_eq!(s.balance(), settled.balance_after);
        assert_eq!(s.phase(), Phase::RoundSettled { round: 1 });

        assert_eq!(s.submit(1, 0).unwrap_err(), GameError::RoundAlreadySettled { round: 1 });
        assert_eq!(s.advance().unwrap(), Phase::AwaitingDecision { round: 2 });
        assert!(s.last_result().is_none());
        assert_eq!(s.advance().unwrap_err(), GameError::RoundNotSettled { round: 2 });
    }

    #[test]
    fn test_out_of_range_is_not_settled() {
        let mut s = session(GameMode::PublicGoods);
        let err = s.submit(51, 0).unwrap_err();
        assert_eq!(err, GameError::DecisionOutOfRange { amount: 51, max: 50 });
        assert!(s.rounds().is_empty());
        assert_eq!(s.balance(), 100);
        assert_eq!(s.phase(), Phase::AwaitingDecision { round: 1 });
    }

    #[test]
    fn test_finishes_after_total_rounds() {
        for mode in GameMode::ALL {
            let mut s = session(mode);
            let total = s.config().total_rounds;
            for n in 1..=total {
                assert!(!s.is_finished(), "{:?} finished early at round {}", mode, n);
                s.submit(0, 0).unwrap();
                if n < total {
                    s.advance().unwrap();
                }
            }
            assert!(s.is_finished());
            assert_eq!(s.rounds().len() as u32, total);
            assert_eq!(s.last_result().map(|r| r.round), Some(total));
            assert_eq!(s.submit(0, 0).unwrap_err(), GameError::SessionFinished);
            assert_eq!(s.advance().unwrap_err(), GameError::SessionFinished);
        }
    }

    #[test]
    fn test_trustor_cycles_opponents() {
        let mut s = session(GameMode::TrustTrustor);
        let mut seen = Vec::new();
        loop {
            let name = s.current_opponent().map(|p| p.name.clone()).unwrap();
            s.submit(s.max_decision(), 0).unwrap();
            seen.push(name);
            if s.is_finished() {
                break;
            }
            s.advance().unwrap();
        }
        let catalog = PersonalityCatalog::standard();
        assert_eq!(seen.len(), 40);
        for (i, name) in seen.iter().enumerate() {
            assert_eq!(name, &catalog.get(i / 10).name);
        }
        assert_eq!(
            s.rounds()[10].partner_id.as_deref(),
            Some("bot_1_Fair Receiver")
        );
    }

    #[test]
    fn test_trustor_minimum_investment() {
        let s = session(GameMode::TrustTrustor);
        // floor(10 / 2) = 5 meets the floor exactly
        assert_eq!(s.max_decision(), 5);
    }

    #[test]
    fn test_trustee_offer_lifecycle() {
        let mut s = session(GameMode::TrustTrustee);
        let offer = *s.offer().unwrap();
        assert!((1..=5).contains(&offer.investment));
        assert_eq!(s.max_decision(), offer.tripled);

        let settled = s.submit(offer.tripled / 2, 0).unwrap().clone();
        match settled.outcome {
            RoundOutcome::Trustee(o) => {
                assert_eq!(o.kept, offer.tripled - offer.tripled / 2);
                assert_eq!(s.balance(), 10 + o.kept);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        s.advance().unwrap();
        assert!(s.offer().is_some());
    }

    #[test]
    fn test_replay_matches_live_session() {
        let decisions = [10, 20, 0, 5, 40];
        let replayed = replay(GameMode::PublicGoods, PersonalityCatalog::standard(), 7, &decisions).unwrap();

        let mut live = GameSession::for_mode(GameMode::PublicGoods, PersonalityCatalog::standard(), 7);
        for d in decisions {
            live.submit(d, 0).unwrap();
            live.advance().unwrap();
        }
        assert_eq!(replayed, live.rounds());
    }

    #[test]
    fn test_trustor_replay_rejects_short_catalog() {
        let two = PersonalityCatalog::from_json(
            r#"[{"name":"Only","return_rate_range":[10,20]},{"name":"Two","return_rate_range":[30,40]}]"#,
        )
        .unwrap();
        assert!(matches!(
            replay(GameMode::TrustTrustor, two.clone(), 3, &[5; 40]),
            Err(GameError::DataLoad { .. })
        ));
        // other modes never consult the catalog
        assert!(replay(GameMode::TrustTrustee, two, 3, &[0]).is_ok());
    }

    #[test]
    fn test_view_reports_seed_and_bounds() {
        let s = session(GameMode::TrustTrustor);
        let view = s.view();
        assert_eq!(view.seed, 42);
        assert_eq!(view.total_rounds, 40);
        assert_eq!(view.max_decision, 5);
        assert_eq!(view.opponent.unwrap().name, "Cautious Receiver");
        assert_eq!(view.balances.len(), 5);
    }
}
