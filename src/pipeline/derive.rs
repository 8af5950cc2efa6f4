//! Per-row derived fields.
//!
//! Each function depends only on the row's inputs and on fields derived
//! before it, so a row can be annotated without looking at its neighbours.

use crate::types::{
    ConfidenceTier, DerivedFields, MatchupFeatures, PropSuggestion, RitualAlignment,
};

/// Edge above which a row is a value pick.
pub const VALUE_EDGE_THRESHOLD: f64 = 7.0;
/// Alignment score above which the home-run prop is suggested.
pub const HR_PROP_THRESHOLD: f64 = 85.0;
/// Lowest alignment score in the ELITE tier.
pub const ELITE_THRESHOLD: f64 = 90.0;
/// Lowest alignment score in the STRONG tier.
pub const STRONG_THRESHOLD: f64 = 80.0;
/// Divisor an ELITE score must be a multiple of for HIGH ritual alignment.
pub const RITUAL_DIVISOR: f64 = 13.0;

/// Round to 2 decimals, ties to even on the scaled value.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Probability in [0, 1] as a percentage with 2 decimals.
pub fn win_probability(probability: f64) -> f64 {
    round2(probability * 100.0)
}

/// Label derived from probability alone (strictly above even odds).
pub fn label_from_probability(probability: f64) -> u8 {
    u8::from(probability > 0.5)
}

pub fn best_value_pick(edge_pct: f64) -> bool {
    edge_pct > VALUE_EDGE_THRESHOLD
}

/// Value pick whose model probability beats the market's.
pub fn smart_bet(edge_pct: f64, win_probability: f64, vegas_win_home_pct: f64) -> bool {
    best_value_pick(edge_pct) && win_probability > vegas_win_home_pct
}

pub fn prop_suggestion(score: f64) -> PropSuggestion {
    if score > HR_PROP_THRESHOLD {
        PropSuggestion::HrProp
    } else {
        PropSuggestion::UnderHits
    }
}

pub fn confidence_tier(score: f64) -> ConfidenceTier {
    if score >= ELITE_THRESHOLD {
        ConfidenceTier::Elite
    } else if score >= STRONG_THRESHOLD {
        ConfidenceTier::Strong
    } else {
        ConfidenceTier::LowRisk
    }
}

pub fn ritual_alignment(score: f64) -> RitualAlignment {
    if score >= ELITE_THRESHOLD && score % RITUAL_DIVISOR == 0.0 {
        RitualAlignment::High
    } else if score >= STRONG_THRESHOLD {
        RitualAlignment::Moderate
    } else {
        RitualAlignment::Low
    }
}

/// Annotate one row given the classifier's outputs for it.
pub fn derive_fields(
    features: &MatchupFeatures,
    probability: f64,
    label: u8,
    include_ritual_alignment: bool,
) -> DerivedFields {
    let win_probability = win_probability(probability);
    let score = features.gematria_alignment_score;

    DerivedFields {
        predicted_win: label,
        win_probability,
        best_value_pick: best_value_pick(features.edge_pct),
        smart_bet: smart_bet(features.edge_pct, win_probability, features.vegas_win_home_pct),
        prop_suggestion: prop_suggestion(score),
        confidence_tier: confidence_tier(score),
        ritual_alignment: include_ritual_alignment.then(|| ritual_alignment(score)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
