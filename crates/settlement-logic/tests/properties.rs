//! Property-based tests for round settlement and session progression.

use proptest::prelude::*;

use settlement_logic::{
    max_contribution_for, replay, settle_public_goods_round, settle_public_goods_with,
    settle_trustee_return, settle_trustor_round, settle_trustor_with_rate, GameMode, GameSession,
    PersonalityCatalog, SeededRng, TrusteeOffer,
};

/// Strategy: a balance and a contribution within `floor(balance / 2)`.
fn balance_and_contribution() -> impl Strategy<Value = (u64, u64)> {
    (0u64..=1_000).prop_flat_map(|b| (Just(b), 0..=b / 2))
}

/// Strategy: four bot balances.
fn bot_balances() -> impl Strategy<Value = [u64; 4]> {
    prop::array::uniform4(0u64..=1_000)
}

proptest! {
    // 1. Public Goods balance identity and floored share
    #[test]
    fn public_goods_balance_identity(
        (balance, contribution) in balance_and_contribution(),
        bots in bot_balances(),
        seed in any::<u64>(),
    ) {
        let mut rng = SeededRng::from_u64(seed);
        let out = settle_public_goods_round(contribution, balance, &bots, &mut rng).unwrap();

        prop_assert_eq!(out.new_player_balance, balance - contribution + out.share);
        prop_assert_eq!(out.total, contribution + out.others_total());
        prop_assert_eq!(out.share, out.total * 3 / 10);
        prop_assert_eq!(out.pool, out.total * 3 / 2);
        prop_assert_eq!(out.payoff, out.share as i64 - contribution as i64);
        for ((before, given), after) in bots.iter().zip(&out.bot_contributions).zip(&out.new_bot_balances) {
            prop_assert!(given <= before, "bot gave {given} from {before}");
            prop_assert_eq!(*after, before - given + out.share);
        }
    }

    // 2. Contributing nothing never loses anything
    #[test]
    fn public_goods_zero_contribution(bots in bot_balances(), seed in any::<u64>()) {
        let mut rng = SeededRng::from_u64(seed);
        let out = settle_public_goods_round(0, 100, &bots, &mut rng).unwrap();
        prop_assert_eq!(out.share, out.others_total() * 3 / 10);
        prop_assert!(out.payoff >= 0);
    }

    // 3. Trustee: kept = tripled - returned
    #[test]
    fn trustee_balance_identity(
        investment in 0u64..=500,
        fraction in 0.0f64..=1.0,
        player in 0u64..=1_000,
        extra in 0u64..=500,
    ) {
        let offer = TrusteeOffer::from_investment(investment);
        let returned = (offer.tripled as f64 * fraction).floor() as u64;
        let sender = investment + extra;
        let out = settle_trustee_return(&offer, returned, player, sender).unwrap();

        prop_assert_eq!(offer.tripled, investment * 3);
        prop_assert_eq!(out.kept, offer.tripled - returned);
        prop_assert_eq!(out.new_player_balance, player + out.kept);
        prop_assert_eq!(out.new_sender_balance, sender - investment + returned);
    }

    // 4. Trustor: payoff and balance identities, rate inside the opponent's band
    #[test]
    fn trustor_balance_identity(
        balance in 0u64..=1_000,
        opponent in 0usize..4,
        seed in any::<u64>(),
    ) {
        let catalog = PersonalityCatalog::standard();
        let personality = catalog.get(opponent);
        let investment = max_contribution_for(balance, 5);
        let mut rng = SeededRng::from_u64(seed);
        let out = settle_trustor_round(investment, balance, personality, 10, &mut rng).unwrap();

        prop_assert!(personality.contains_rate(out.return_rate));
        prop_assert_eq!(out.returned, (investment as f64 * 3.0 * out.return_rate).floor() as u64);
        prop_assert_eq!(out.payoff, out.returned as i64 - investment as i64);
        prop_assert_eq!(out.new_player_balance, balance - investment + out.returned);
        prop_assert_eq!(out.new_opponent_balance, 10 + out.sent - out.returned);
    }

    // 5. Investing nothing changes nothing
    #[test]
    fn trustor_zero_investment(balance in 0u64..=1_000, rate in 0.0f64..=1.0) {
        let out = settle_trustor_with_rate(0, balance, rate, 10).unwrap();
        prop_assert_eq!((out.sent, out.returned, out.payoff), (0, 0, 0));
        prop_assert_eq!(out.new_player_balance, balance);
    }

    // 6. Same inputs and seed, same outcome
    #[test]
    fn settlement_deterministic(
        (balance, contribution) in balance_and_contribution(),
        bots in bot_balances(),
        seed in any::<u64>(),
    ) {
        let a = settle_public_goods_round(contribution, balance, &bots, &mut SeededRng::from_u64(seed)).unwrap();
        let b = settle_public_goods_round(contribution, balance, &bots, &mut SeededRng::from_u64(seed)).unwrap();
        prop_assert_eq!(a, b);
    }

    // 7. The maximum decision never exceeds the balance
    #[test]
    fn max_decision_affordable(balance in 0u64..=10_000, floor in 0u64..=20) {
        let max = max_contribution_for(balance, floor);
        prop_assert!(max <= balance);
        prop_assert!(max >= balance / 2);
    }

    // 8. Sessions finish after exactly total_rounds settlements and keep the ledger consistent
    #[test]
    fn session_completes(mode_index in 0usize..3, seed in any::<u64>(), picks in prop::collection::vec(0.0f64..=1.0, 40)) {
        let mode = GameMode::ALL[mode_index];
        let mut session = GameSession::for_mode(mode, PersonalityCatalog::standard(), seed);
        let total = session.config().total_rounds;

        for (n, pick) in (1..=total).zip(picks.iter().cycle()) {
            prop_assert!(!session.is_finished());
            prop_assert_eq!(session.round(), n);
            let decision = (session.max_decision() as f64 * pick).floor() as u64;
            let before = session.balance();
            let settled = session.submit(decision, 0).unwrap().clone();
            prop_assert_eq!(settled.balance_before, before);
            prop_assert_eq!(settled.balance_after, session.balance());
            prop_assert_eq!(settled.balance_after as i64, before as i64 + settled.payoff());
            if n < total {
                session.advance().unwrap();
            }
        }
        prop_assert!(session.is_finished());
        prop_assert_eq!(session.rounds().len() as u32, total);
    }

    // 9. Replaying a seed reproduces the rounds
    #[test]
    fn replay_deterministic(seed in any::<u64>(), decisions in prop::collection::vec(0u64..=5, 1..10)) {
        let a = replay(GameMode::TrustTrustor, PersonalityCatalog::standard(), seed, &decisions);
        let b = replay(GameMode::TrustTrustor, PersonalityCatalog::standard(), seed, &decisions);
        prop_assert_eq!(a, b);
    }
}

#[test]
fn scenario_public_goods() {
    let out = settle_public_goods_with(20, 100, &[100; 4], &[5, 10, 15, 20]).unwrap();
    assert_eq!((out.total, out.pool, out.share, out.payoff), (70, 105, 21, 1));
    assert_eq!(out.new_player_balance, 101);
}

#[test]
fn scenario_trustee() {
    let offer = TrusteeOffer::from_investment(4);
    assert_eq!(offer.tripled, 12);
    let out = settle_trustee_return(&offer, 6, 10, 10).unwrap();
    assert_eq!(out.kept, 6);
}

#[test]
fn scenario_trustor() {
    let out = settle_trustor_with_rate(5, 10, 0.5, 10).unwrap();
    assert_eq!((out.sent, out.returned, out.payoff, out.new_player_balance), (15, 7, 2, 12));
}
