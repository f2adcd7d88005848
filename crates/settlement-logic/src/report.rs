//! Per-round report rows and simple aggregates over settled rounds

use serde::{Deserialize, Serialize};

use crate::config::GameType;
use crate::session::{Role, RoundOutcome, SettledRound};

/// One Public Goods round as shown in reports
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicGoodsRow {
    pub round: u32,
    pub contribution: u64,
    pub bot_contributions: Vec<u64>,
    /// Sum of the other players' contributions
    pub partner_contribution: u64,
    pub total: u64,
    pub pool: u64,
    pub share: u64,
    pub payoff: i64,
    pub balance_after: u64,
}

/// One Trust Game round as shown in reports, from the player's side
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustRow {
    pub round: u32,
    pub role: Role,
    /// Trustor rounds only
    pub investment: u64,
    /// Tripled amount; what the trustee received or the trustor sent
    pub multiplied_amount: u64,
    /// Trustee: amount received; trustor: amount returned by the opponent
    pub received_amount: u64,
    /// Trustee rounds only
    pub return_amount: u64,
    /// Trustor: returned - invested; trustee: received - returned
    pub profit: i64,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
}

impl PublicGoodsRow {
    pub fn from_round(round: &SettledRound) -> Option<Self> {
        match &round.outcome {
            RoundOutcome::PublicGoods(o) => Some(Self {
                round: round.round,
                contribution: o.contribution,
                bot_contributions: o.bot_contributions.clone(),
                partner_contribution: o.others_total(),
                total: o.total,
                pool: o.pool,
                share: o.share,
                payoff: o.payoff,
                balance_after: round.balance_after,
            }),
            _ => None,
        }
    }
}

impl TrustRow {
    pub fn from_round(round: &SettledRound) -> Option<Self> {
        let row = match &round.outcome {
            RoundOutcome::Trustor(o) => Self {
                round: round.round,
                role: Role::Trustor,
                investment: o.investment,
                multiplied_amount: o.sent,
                received_amount: o.returned,
                return_amount: 0,
                profit: o.payoff,
                response_time_ms: round.response_time_ms,
                partner_id: round.partner_id.clone(),
            },
            RoundOutcome::Trustee(o) => Self {
                round: round.round,
                role: Role::Trustee,
                investment: 0,
                multiplied_amount: o.tripled,
                received_amount: o.tripled,
                return_amount: o.returned,
                profit: o.kept as i64,
                response_time_ms: round.response_time_ms,
                partner_id: round.partner_id.clone(),
            },
            RoundOutcome::PublicGoods(_) => return None,
        };
        Some(row)
    }
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicGoodsSummary {
    pub total_rounds: usize,
    pub total_contribution: u64,
    pub total_payoff: i64,
    pub average_contribution: f64,
    pub average_payoff: f64,
}

impl PublicGoodsSummary {
    pub fn from_rows(rows: &[PublicGoodsRow]) -> Self {
        let total_contribution: u64 = rows.iter().map(|r| r.contribution).sum();
        let total_payoff: i64 = rows.iter().map(|r| r.payoff).sum();
        Self {
            total_rounds: rows.len(),
            total_contribution,
            total_payoff,
            average_contribution: mean(total_contribution as f64, rows.len()),
            average_payoff: mean(total_payoff as f64, rows.len()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustorStats {
    pub rounds: usize,
    pub total_investment: u64,
    pub average_investment: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrusteeStats {
    pub rounds: usize,
    pub total_received: u64,
    pub total_returned: u64,
    /// Mean of per-round `returned / received`, rounds with nothing received count as 0
    pub average_return_rate: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustSummary {
    pub total_rounds: usize,
    pub trustor_stats: TrustorStats,
    pub trustee_stats: TrusteeStats,
}

impl TrustSummary {
    pub fn from_rows(rows: &[TrustRow]) -> Self {
        let trustor: Vec<&TrustRow> = rows.iter().filter(|r| r.role == Role::Trustor).collect();
        let trustee: Vec<&TrustRow> = rows.iter().filter(|r| r.role == Role::Trustee).collect();

        let total_investment: u64 = trustor.iter().map(|r| r.investment).sum();
        let rate_sum: f64 = trustee
            .iter()
            .map(|r| {
                if r.received_amount > 0 {
                    r.return_amount as f64 / r.received_amount as f64
                } else {
                    0.0
                }
            })
            .sum();

        Self {
            total_rounds: rows.len(),
            trustor_stats: TrustorStats {
                rounds: trustor.len(),
                total_investment,
                average_investment: mean(total_investment as f64, trustor.len()),
            },
            trustee_stats: TrusteeStats {
                rounds: trustee.len(),
                total_received: trustee.iter().map(|r| r.received_amount).sum(),
                total_returned: trustee.iter().map(|r| r.return_amount).sum(),
                average_return_rate: mean(rate_sum, trustee.len()),
            },
        }
    }
}

/// Rows sorted by round, plus the summary over them
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicGoodsReport {
    pub summary: PublicGoodsSummary,
    pub rounds: Vec<PublicGoodsRow>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustReport {
    pub summary: TrustSummary,
    pub rounds: Vec<TrustRow>,
}

/// Build the Public Goods report from settled rounds in any order
pub fn public_goods_report<'a>(rounds: impl IntoIterator<Item = &'a SettledRound>) -> PublicGoodsReport {
    let mut rows: Vec<PublicGoodsRow> = rounds.into_iter().filter_map(PublicGoodsRow::from_round).collect();
    rows.sort_by_key(|r| r.round);
    PublicGoodsReport {
        summary: PublicGoodsSummary::from_rows(&rows),
        rounds: rows,
    }
}

/// Build the Trust Game report, optionally for one role only
pub fn trust_report<'a>(
    rounds: impl IntoIterator<Item = &'a SettledRound>,
    role: Option<Role>,
) -> TrustReport {
    let mut rows: Vec<TrustRow> = rounds
        .into_iter()
        .filter_map(TrustRow::from_round)
        .filter(|r| role.map_or(true, |want| r.role == want))
        .collect();
    rows.sort_by_key(|r| r.round);
    TrustReport {
        summary: TrustSummary::from_rows(&rows),
        rounds: rows,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GamesPlayed {
    pub public_goods: usize,
    pub trust_game: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_rounds: usize,
    pub public_goods_payoff: i64,
    pub games_played: GamesPlayed,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedReport {
    pub overall_summary: OverallSummary,
    pub public_goods: PublicGoodsReport,
    pub trust_game: TrustReport,
}

pub fn combined_report(public_goods: PublicGoodsReport, trust_game: TrustReport) -> CombinedReport {
    CombinedReport {
        overall_summary: OverallSummary {
            total_rounds: public_goods.summary.total_rounds + trust_game.summary.total_rounds,
            public_goods_payoff: public_goods.summary.total_payoff,
            games_played: GamesPlayed {
                public_goods: public_goods.summary.total_rounds,
                trust_game: trust_game.summary.total_rounds,
            },
        },
        public_goods,
        trust_game,
    }
}

/// Completion of one game or of everything
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub completed: u32,
    pub total: u32,
    /// Rounded, 0-100
    pub percentage: u32,
}

impl ProgressEntry {
    /// `completed` is capped at `total`
    pub fn new(completed: u32, total: u32) -> Self {
        let completed = completed.min(total);
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        Self { completed, total, percentage }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProgress {
    pub public_goods: ProgressEntry,
    pub trust_game: ProgressEntry,
    pub overall: ProgressEntry,
}

/// Expected rounds per game type across the full study
pub fn expected_rounds(game_type: GameType) -> u32 {
    use crate::config::GameConfig;
    match game_type {
        GameType::PublicGoods => GameConfig::public_goods().total_rounds,
        GameType::TrustGame => {
            GameConfig::trust_trustee().total_rounds + GameConfig::trust_trustor().total_rounds
        }
    }
}

impl GameProgress {
    pub fn from_counts(public_goods_rounds: usize, trust_game_rounds: usize) -> Self {
        let pg = ProgressEntry::new(public_goods_rounds as u32, expected_rounds(GameType::PublicGoods));
        let tg = ProgressEntry::new(trust_game_rounds as u32, expected_rounds(GameType::TrustGame));
        Self {
            public_goods: pg,
            trust_game: tg,
            overall: ProgressEntry::new(pg.completed + tg.completed, pg.total + tg.total),
        }
    }
}

impl Default for GameProgress {
    /// All zeros, used when history cannot be loaded
    fn default() -> Self {
        Self::from_counts(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameMode;
    use crate::personality::PersonalityCatalog;
    use crate::session::replay;

    #[test]
    fn test_public_goods_report() {
        let rounds = replay(GameMode::PublicGoods, PersonalityCatalog::standard(), 1, &[10, 20, 30]).unwrap();
        let mut shuffled = rounds.clone();
        shuffled.reverse();
        let report = public_goods_report(&shuffled);

        assert_eq!(report.rounds.iter().map(|r| r.round).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(report.summary.total_rounds, 3);
        assert_eq!(report.summary.total_contribution, 60);
        assert_eq!(report.summary.average_contribution, 20.0);
        let payoff: i64 = rounds.iter().map(|r| r.payoff()).sum();
        assert_eq!(report.summary.total_payoff, payoff);
    }

    #[test]
    fn test_trust_report_by_role() {
        let trustor = replay(GameMode::TrustTrustor, PersonalityCatalog::standard(), 2, &[5, 5]).unwrap();
        let trustee = replay(GameMode::TrustTrustee, PersonalityCatalog::standard(), 2, &[0, 0]).unwrap();
        let all: Vec<&SettledRound> = trustor.iter().chain(trustee.iter()).collect();

        let report = trust_report(all.iter().copied(), None);
        assert_eq!(report.summary.total_rounds, 4);
        assert_eq!(report.summary.trustor_stats.rounds, 2);
        assert_eq!(report.summary.trustor_stats.total_investment, 10);
        assert_eq!(report.summary.trustor_stats.average_investment, 5.0);
        assert_eq!(report.summary.trustee_stats.rounds, 2);
        assert_eq!(report.summary.trustee_stats.total_returned, 0);
        assert_eq!(report.summary.trustee_stats.average_return_rate, 0.0);

        let only_trustee = trust_report(all.iter().copied(), Some(Role::Trustee));
        assert!(only_trustee.rounds.iter().all(|r| r.role == Role::Trustee));
        assert_eq!(only_trustee.summary.trustor_stats, TrustorStats::default());
    }

    #[test]
    fn test_empty_reports() {
        let report = public_goods_report(std::iter::empty());
        assert_eq!(report, PublicGoodsReport::default());
        let combined = combined_report(report, trust_report(std::iter::empty(), None));
        assert_eq!(combined.overall_summary.total_rounds, 0);
    }

    #[test]
    fn test_progress() {
        let progress = GameProgress::from_counts(10, 25);
        assert_eq!(progress.public_goods, ProgressEntry { completed: 10, total: 10, percentage: 100 });
        assert_eq!(progress.trust_game, ProgressEntry { completed: 25, total: 50, percentage: 50 });
        assert_eq!(progress.overall, ProgressEntry { completed: 35, total: 60, percentage: 58 });

        let capped = GameProgress::from_counts(15, 0);
        assert_eq!(capped.public_goods.completed, 10);
        assert_eq!(GameProgress::default().overall.percentage, 0);
    }
}
