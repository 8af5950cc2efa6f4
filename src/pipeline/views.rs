//! Views over a scored slate: smart bets, parlay shortlists, ROI and the
//! probability histogram.
//!
//! All rankings use stable sorts so ties keep input order and results are
//! reproducible run to run.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::derive::{round2, ELITE_THRESHOLD, STRONG_THRESHOLD};
use crate::types::{ConfidenceTier, ScoredMatchup};

/// Default number of legs in the top parlay.
pub const DEFAULT_PARLAY_SIZE: usize = 3;
/// Legs taken from each bucket of the prop parlay.
pub const PROP_PARLAY_BUCKET_SIZE: usize = 2;
/// Default histogram bin count.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Rows flagged as smart bets, in input order.
pub fn select_smart_bets(rows: &[ScoredMatchup]) -> Vec<&ScoredMatchup> {
    rows.iter().filter(|r| r.derived.smart_bet).collect()
}

/// The `n` rows with the highest win probability; ties keep input order.
pub fn rank_top_parlay(rows: &[ScoredMatchup], n: usize) -> Vec<&ScoredMatchup> {
    let mut ranked: Vec<&ScoredMatchup> = rows.iter().collect();
    // `sort_by` is stable; `total_cmp` keeps the order total.
    ranked.sort_by(|a, b| {
        b.derived
            .win_probability
            .total_cmp(&a.derived.win_probability)
    });
    ranked.truncate(n);
    ranked
}

/// One leg of the prop parlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropParlayLeg {
    pub position: usize,
    pub matchup: String,
    pub gematria_alignment_score: f64,
    pub confidence_tier: ConfidenceTier,
}

impl From<&ScoredMatchup> for PropParlayLeg {
    fn from(row: &ScoredMatchup) -> Self {
        Self {
            position: row.position,
            matchup: row.matchup.clone(),
            gematria_alignment_score: row.features.gematria_alignment_score,
            confidence_tier: row.derived.confidence_tier,
        }
    }
}

/// Fixed-quota prop parlay: the first two ELITE-score rows, then the first
/// two STRONG-score rows, each bucket in input order.
pub fn rank_prop_parlay(rows: &[ScoredMatchup]) -> Vec<PropParlayLeg> {
    let score = |r: &&ScoredMatchup| r.features.gematria_alignment_score;

    let elite = rows
        .iter()
        .filter(|r| score(r) >= ELITE_THRESHOLD)
        .take(PROP_PARLAY_BUCKET_SIZE);
    let strong = rows
        .iter()
        .filter(|r| (STRONG_THRESHOLD..ELITE_THRESHOLD).contains(&score(r)))
        .take(PROP_PARLAY_BUCKET_SIZE);

    elite.chain(strong).map(PropParlayLeg::from).collect()
}

/// Flat one-unit staking results over the smart-bet subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiSummary {
    pub bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub units: i64,
    pub roi_percent: f64,
}

/// ROI of betting one unit on every smart bet at even money.
pub fn compute_roi(rows: &[ScoredMatchup]) -> RoiSummary {
    let smart = select_smart_bets(rows);
    let bets = smart.len();
    let wins = smart.iter().filter(|r| r.derived.predicted_win == 1).count();
    let losses = bets - wins;
    let units = wins as i64 - losses as i64;

    let roi_percent = if bets > 0 {
        round2(units as f64 / bets as f64 * 100.0)
    } else {
        0.0
    };

    debug!(bets, wins, losses, units, roi_percent, "ROI computed");

    RoiSummary {
        bets,
        wins,
        losses,
        units,
        roi_percent,
    }
}

/// Predicted wins and losses across the whole slate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLossSummary {
    pub win_count: usize,
    pub loss_count: usize,
}

pub fn summarize(rows: &[ScoredMatchup]) -> WinLossSummary {
    let win_count = rows.iter().filter(|r| r.derived.predicted_win == 1).count();
    WinLossSummary {
        win_count,
        loss_count: rows.len() - win_count,
    }
}

/// One equal-width bin of the win-probability histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram of `win_probability` over the observed range.
///
/// The last bin is closed on the right. A single distinct value is binned
/// over `[v - 0.5, v + 0.5]`.
pub fn histogram(rows: &[ScoredMatchup], bins: usize) -> Vec<HistogramBin> {
    if rows.is_empty() || bins == 0 {
        return Vec::new();
    }

    let values: Vec<f64> = rows.iter().map(|r| r.derived.win_probability).collect();
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
