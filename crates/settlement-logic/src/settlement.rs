//! Round settlement for the three game modes
//!
//! Every function here is pure. The sampling forms draw counterpart behavior
//! from a [`SeededRng`]; the `_with` forms take the draw explicitly so a
//! round can be pinned in tests or replayed.
//!
//! Settlement never clamps. A decision the actor cannot afford is rejected
//! with [`GameError::DecisionOutOfRange`]; the session applies the tighter
//! per-mode bound before calling in here.

use serde::{Deserialize, Serialize};

use crate::config::{PUBLIC_GOODS_MULTIPLIER, TRUST_MULTIPLIER};
use crate::error::{GameError, Result};
use crate::ledger::Actor;
use crate::personality::{sample_return_rate, Personality};
use crate::random::SeededRng;

/// Result of one Public Goods round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicGoodsOutcome {
    pub contribution: u64,
    pub bot_contributions: Vec<u64>,
    /// Player plus bots
    pub total: u64,
    /// `floor(total * 1.5)`
    pub pool: u64,
    /// Accounted share, `floor(total * 1.5 / players)`
    pub share: u64,
    /// Unfloored pool, for display
    pub pool_exact: f64,
    /// Unfloored share rounded to one decimal, for display
    pub share_exact: f64,
    /// `share - contribution`
    pub payoff: i64,
    pub new_player_balance: u64,
    pub new_bot_balances: Vec<u64>,
}

impl PublicGoodsOutcome {
    /// Sum of the bots' contributions
    pub fn others_total(&self) -> u64 {
        self.bot_contributions.iter().sum()
    }
}

/// What the simulated sender puts on the table at the start of a trustee round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrusteeOffer {
    pub investment: u64,
    /// Amount the player receives
    pub tripled: u64,
}

impl TrusteeOffer {
    pub fn from_investment(investment: u64) -> Self {
        Self {
            investment,
            tripled: TRUST_MULTIPLIER.apply(investment),
        }
    }
}

/// Result of one round with the player as trustee
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrusteeOutcome {
    pub investment: u64,
    pub tripled: u64,
    pub returned: u64,
    /// `tripled - returned`
    pub kept: u64,
    pub payoff: i64,
    pub new_player_balance: u64,
    pub new_sender_balance: u64,
}

/// Result of one round with the player as trustor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustorOutcome {
    pub investment: u64,
    /// `investment * 3`
    pub sent: u64,
    /// Fraction of `sent` the opponent returned this round
    pub return_rate: f64,
    pub returned: u64,
    /// `returned - investment`
    pub payoff: i64,
    pub new_player_balance: u64,
    pub new_opponent_balance: u64,
}

fn check_affordable(amount: u64, max: u64) -> Result<()> {
    if amount > max {
        return Err(GameError::DecisionOutOfRange { amount, max });
    }
    Ok(())
}

/// `floor(random() * floor(b / 2)) + floor(floor(b / 2) * 0.1)`
///
/// Never exceeds the bot's balance.
pub fn sample_bot_contribution(balance: u64, rng: &mut SeededRng) -> u64 {
    let cap = balance / 2;
    rng.next_scaled(cap) + cap / 10
}

/// One draw per bot, in bot order
pub fn sample_bot_contributions(bot_balances: &[u64], rng: &mut SeededRng) -> Vec<u64> {
    bot_balances
        .iter()
        .map(|b| sample_bot_contribution(*b, rng))
        .collect()
}

/// Settle a Public Goods round with the bots' contributions already drawn
pub fn settle_public_goods_with(
    contribution: u64,
    player_balance: u64,
    bot_balances: &[u64],
    bot_contributions: &[u64],
) -> Result<PublicGoodsOutcome> {
    check_affordable(contribution, player_balance)?;
    if bot_balances.len() != bot_contributions.len() {
        return Err(GameError::BotCountMismatch {
            bots: bot_balances.len(),
            contributions: bot_contributions.len(),
        });
    }
    for (i, (balance, given)) in bot_balances.iter().zip(bot_contributions).enumerate() {
        if given > balance {
            return Err(GameError::Overdraft {
                actor: Actor::Bot(i as u8),
                balance: *balance,
                delta: -(*given as i64),
            });
        }
    }

    let players = bot_balances.len() as u64 + 1;
    let total = contribution + bot_contributions.iter().sum::<u64>();
    let pool = PUBLIC_GOODS_MULTIPLIER.apply(total);
    let share = PUBLIC_GOODS_MULTIPLIER.apply_split(total, players);

    let pool_exact = total as f64 * PUBLIC_GOODS_MULTIPLIER.as_f64();
    let share_exact = (pool_exact / players as f64 * 10.0).round() / 10.0;

    let new_bot_balances = bot_balances
        .iter()
        .zip(bot_contributions)
        .map(|(b, c)| b - c + share)
        .collect();

    Ok(PublicGoodsOutcome {
        contribution,
        bot_contributions: bot_contributions.to_vec(),
        total,
        pool,
        share,
        pool_exact,
        share_exact,
        payoff: share as i64 - contribution as i64,
        new_player_balance: player_balance - contribution + share,
        new_bot_balances,
    })
}

/// Settle a Public Goods round, drawing each bot's contribution from `rng`
pub fn settle_public_goods_round(
    contribution: u64,
    player_balance: u64,
    bot_balances: &[u64],
    rng: &mut SeededRng,
) -> Result<PublicGoodsOutcome> {
    let bot_contributions = sample_bot_contributions(bot_balances, rng);
    settle_public_goods_with(contribution, player_balance, bot_balances, &bot_contributions)
}

/// Sender investment for a trustee round: `floor(random() * floor(sb / 2)) + 1`,
/// capped at the sender's balance
pub fn open_trustee_round(sender_balance: u64, rng: &mut SeededRng) -> TrusteeOffer {
    let investment = (rng.next_scaled(sender_balance / 2) + 1).min(sender_balance);
    TrusteeOffer::from_investment(investment)
}

/// Settle the player's return against an open offer
pub fn settle_trustee_return(
    offer: &TrusteeOffer,
    return_amount: u64,
    player_balance: u64,
    sender_balance: u64,
) -> Result<TrusteeOutcome> {
    check_affordable(return_amount, offer.tripled)?;
    if offer.investment > sender_balance {
        return Err(GameError::Overdraft {
            actor: Actor::Counterpart(0),
            balance: sender_balance,
            delta: -(offer.investment as i64),
        });
    }

    let kept = offer.tripled - return_amount;
    Ok(TrusteeOutcome {
        investment: offer.investment,
        tripled: offer.tripled,
        returned: return_amount,
        kept,
        payoff: kept as i64,
        new_player_balance: player_balance + kept,
        new_sender_balance: sender_balance - offer.investment + return_amount,
    })
}

/// Settle a trustor round with the opponent's return rate already drawn
pub fn settle_trustor_with_rate(
    investment: u64,
    player_balance: u64,
    return_rate: f64,
    opponent_balance: u64,
) -> Result<TrustorOutcome> {
    check_affordable(investment, player_balance)?;

    let sent = TRUST_MULTIPLIER.apply(investment);
    let rate = return_rate.clamp(0.0, 1.0);
    let returned = ((sent as f64 * rate).floor() as u64).min(sent);

    Ok(TrustorOutcome {
        investment,
        sent,
        return_rate: rate,
        returned,
        payoff: returned as i64 - investment as i64,
        new_player_balance: player_balance - investment + returned,
        new_opponent_balance: opponent_balance + (sent - returned),
    })
}

/// Settle a trustor round, drawing the return rate from `personality`
pub fn settle_trustor_round(
    investment: u64,
    player_balance: u64,
    personality: &Personality,
    opponent_balance: u64,
    rng: &mut SeededRng,
) -> Result<TrustorOutcome> {
    let rate = sample_return_rate(personality, rng);
    settle_trustor_with_rate(investment, player_balance, rate, opponent_balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::PersonalityCatalog;

    #[test]
    fn test_public_goods_scenario() {
        let out = settle_public_goods_with(20, 100, &[100; 4], &[5, 10, 15, 20]).unwrap();
        assert_eq!(out.total, 70);
        assert_eq!(out.pool, 105);
        assert_eq!(out.share, 21);
        assert_eq!(out.payoff, 1);
        assert_eq!(out.new_player_balance, 101);
        assert_eq!(out.share_exact, 21.0);
        assert_eq!(out.new_bot_balances, vec![116, 111, 106, 101]);
    }

    #[test]
    fn test_public_goods_fractional_share() {
        let out = settle_public_goods_with(1, 100, &[100; 4], &[0, 0, 0, 0]).unwrap();
        assert_eq!(out.pool, 1);
        assert_eq!(out.share, 0);
        assert_eq!(out.share_exact, 0.3);
        assert_eq!(out.payoff, -1);
        assert_eq!(out.new_player_balance, 99);
    }

    #[test]
    fn test_public_goods_zero_contribution() {
        let out = settle_public_goods_with(0, 100, &[100; 4], &[10, 10, 10, 10]).unwrap();
        assert_eq!(out.share, 12);
        assert!(out.payoff >= 0);
        assert_eq!(out.others_total(), 40);
    }

    #[test]
    fn test_public_goods_rejects_unaffordable() {
        let err = settle_public_goods_with(101, 100, &[100; 4], &[0; 4]).unwrap_err();
        assert!(err.is_validation());
        let err = settle_public_goods_with(0, 100, &[3; 4], &[4, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, GameError::Overdraft { actor: Actor::Bot(0), .. }));
    }

    #[test]
    fn test_public_goods_rejects_mismatched_bots() {
        let err = settle_public_goods_with(10, 100, &[100; 4], &[5, 5]).unwrap_err();
        assert_eq!(err, GameError::BotCountMismatch { bots: 4, contributions: 2 });
        assert_eq!(err.code(), 7006);
        assert!(settle_public_goods_with(10, 100, &[100; 2], &[5; 4]).is_err());
    }

    #[test]
    fn test_bot_contribution_bounds() {
        let mut rng = SeededRng::from_u64(9);
        for balance in [0u64, 1, 2, 9, 10, 55, 100, 250] {
            for _ in 0..200 {
                let c = sample_bot_contribution(balance, &mut rng);
                let cap = balance / 2;
                assert!(c >= cap / 10);
                assert!(c <= balance);
                if cap > 0 {
                    assert!(c < cap + cap / 10);
                }
            }
        }
    }

    #[test]
    fn test_trustee_scenario() {
        let offer = TrusteeOffer::from_investment(4);
        assert_eq!(offer.tripled, 12);
        let out = settle_trustee_return(&offer, 6, 10, 10).unwrap();
        assert_eq!(out.kept, 6);
        assert_eq!(out.new_player_balance, 16);
        assert_eq!(out.new_sender_balance, 12);
    }

    #[test]
    fn test_trustee_return_bounds() {
        let offer = TrusteeOffer::from_investment(4);
        assert!(settle_trustee_return(&offer, 12, 10, 10).is_ok());
        let err = settle_trustee_return(&offer, 13, 10, 10).unwrap_err();
        assert_eq!(err, GameError::DecisionOutOfRange { amount: 13, max: 12 });
    }

    #[test]
    fn test_open_trustee_round_bounds() {
        let mut rng = SeededRng::from_u64(3);
        for _ in 0..500 {
            let offer = open_trustee_round(10, &mut rng);
            assert!((1..=5).contains(&offer.investment));
            assert_eq!(offer.tripled, offer.investment * 3);
        }
        assert_eq!(open_trustee_round(0, &mut rng).investment, 0);
        assert_eq!(open_trustee_round(1, &mut rng).investment, 1);
    }

    #[test]
    fn test_trustor_scenario() {
        let out = settle_trustor_with_rate(5, 10, 0.5, 10).unwrap();
        assert_eq!(out.sent, 15);
        assert_eq!(out.returned, 7);
        assert_eq!(out.payoff, 2);
        assert_eq!(out.new_player_balance, 12);
        assert_eq!(out.new_opponent_balance, 18);
    }

    #[test]
    fn test_trustor_zero_investment() {
        let out = settle_trustor_with_rate(0, 10, 0.9, 10).unwrap();
        assert_eq!((out.sent, out.returned, out.payoff), (0, 0, 0));
    }

    #[test]
    fn test_trustor_round_rate_in_band() {
        let catalog = PersonalityCatalog::standard();
        let mut rng = SeededRng::from_u64(11);
        for personality in catalog.iter() {
            let out = settle_trustor_round(5, 10, personality, 10, &mut rng).unwrap();
            assert!(personality.contains_rate(out.return_rate));
            assert_eq!(out.returned, (15.0 * out.return_rate).floor() as u64);
        }
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let mut a = SeededRng::from_u64(5);
        let mut b = SeededRng::from_u64(5);
        let oa = settle_public_goods_round(10, 100, &[100; 4], &mut a).unwrap();
        let ob = settle_public_goods_round(10, 100, &[100; 4], &mut b).unwrap();
        assert_eq!(oa, ob);
    }
}
