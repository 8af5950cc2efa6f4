//! Shared types for the MLBX scoring pipeline.
//!
//! These types form the data model used across all modules: the fixed
//! feature schema, the two accepted header vocabularies, the derived
//! annotations attached to each scored matchup, and the pipeline error kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Feature schema
// ---------------------------------------------------------------------------

/// Number of numeric inputs the classifier consumes per matchup.
pub const FEATURE_COUNT: usize = 9;

/// One row of the classifier's input matrix, in schema order.
pub type FeatureVector = [f64; FEATURE_COUNT];

/// The required numeric inputs of one matchup, after zero-fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchupFeatures {
    pub mlbx_win_home_pct: f64,
    pub vegas_win_home_pct: f64,
    pub edge_pct: f64,
    pub home_starter_era: f64,
    pub away_starter_era: f64,
    pub home_bullpen_era: f64,
    pub away_bullpen_era: f64,
    pub gematria_alignment_score: f64,
    /// 0/1 flag.
    pub narrative_confidence_high: f64,
}

impl MatchupFeatures {
    /// Build from a vector laid out in schema order.
    pub fn from_vector(v: FeatureVector) -> Self {
        Self {
            mlbx_win_home_pct: v[0],
            vegas_win_home_pct: v[1],
            edge_pct: v[2],
            home_starter_era: v[3],
            away_starter_era: v[4],
            home_bullpen_era: v[5],
            away_bullpen_era: v[6],
            gematria_alignment_score: v[7],
            narrative_confidence_high: v[8],
        }
    }

    /// Helper to build a test/sample matchup with neutral ERAs.
    #[cfg(test)]
    pub fn sample(edge_pct: f64, vegas_win_home_pct: f64, gematria_alignment_score: f64) -> Self {
        Self {
            mlbx_win_home_pct: vegas_win_home_pct + edge_pct,
            vegas_win_home_pct,
            edge_pct,
            home_starter_era: 3.80,
            away_starter_era: 4.10,
            home_bullpen_era: 3.95,
            away_bullpen_era: 4.20,
            gematria_alignment_score,
            narrative_confidence_high: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Header vocabularies
// ---------------------------------------------------------------------------

/// Which exact header names the input and output CSVs use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    /// snake_case names (`mlbx_win_home_pct`, ..., `matchup`).
    #[default]
    Canonical,
    /// The legacy dashboard headers (`MLBX_Win_Home_%`, ..., `Matchup`).
    Dashboard,
}

impl HeaderStyle {
    pub fn columns(self) -> &'static ColumnSet {
        match self {
            HeaderStyle::Canonical => &CANONICAL_COLUMNS,
            HeaderStyle::Dashboard => &DASHBOARD_COLUMNS,
        }
    }
}

/// Column names for one header vocabulary.
#[derive(Debug)]
pub struct ColumnSet {
    /// Required inputs, in classifier order.
    pub features: [&'static str; FEATURE_COUNT],
    pub matchup: &'static str,
    pub derived: DerivedColumns,
}

/// Names of the appended output columns.
#[derive(Debug)]
pub struct DerivedColumns {
    pub predicted_win: &'static str,
    pub win_probability: &'static str,
    pub best_value_pick: &'static str,
    pub smart_bet: &'static str,
    pub prop_suggestion: &'static str,
    pub confidence_tier: &'static str,
    pub ritual_alignment: &'static str,
}

pub static CANONICAL_COLUMNS: ColumnSet = ColumnSet {
    features: [
        "mlbx_win_home_pct",
        "vegas_win_home_pct",
        "edge_pct",
        "home_starter_era",
        "away_starter_era",
        "home_bullpen_era",
        "away_bullpen_era",
        "gematria_alignment_score",
        "narrative_confidence_high",
    ],
    matchup: "matchup",
    derived: DerivedColumns {
        predicted_win: "predicted_win",
        win_probability: "win_probability",
        best_value_pick: "best_value_pick",
        smart_bet: "smart_bet",
        prop_suggestion: "prop_suggestion",
        confidence_tier: "confidence_tier",
        ritual_alignment: "ritual_alignment",
    },
};

pub static DASHBOARD_COLUMNS: ColumnSet = ColumnSet {
    features: [
        "MLBX_Win_Home_%",
        "Vegas_Win_Home_%",
        "Edge_%",
        "Home_Starter_ERA",
        "Away_Starter_ERA",
        "Home_Bullpen_ERA",
        "Away_Bullpen_ERA",
        "Gematria_Alignment_Score",
        "Narrative_Confidence_High",
    ],
    matchup: "Matchup",
    derived: DerivedColumns {
        predicted_win: "Predicted_Win",
        win_probability: "Win_Probability",
        best_value_pick: "Best_Value_Pick",
        smart_bet: "Smart_Bet",
        prop_suggestion: "Prop",
        confidence_tier: "Confidence_Tier",
        ritual_alignment: "Ritual_Alignment",
    },
};

// ---------------------------------------------------------------------------
// Derived annotations
// ---------------------------------------------------------------------------

/// Player-prop suggestion derived from the alignment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropSuggestion {
    HrProp,
    UnderHits,
}

impl fmt::Display for PropSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropSuggestion::HrProp => write!(f, "HR_PROP"),
            PropSuggestion::UnderHits => write!(f, "UNDER_HITS"),
        }
    }
}

impl std::str::FromStr for PropSuggestion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HR_PROP" => Ok(PropSuggestion::HrProp),
            "UNDER_HITS" => Ok(PropSuggestion::UnderHits),
            _ => Err(anyhow::anyhow!("Unknown prop suggestion: {s}")),
        }
    }
}

/// Confidence tier derived from the alignment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    Elite,
    Strong,
    LowRisk,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::Elite => write!(f, "ELITE"),
            ConfidenceTier::Strong => write!(f, "STRONG"),
            ConfidenceTier::LowRisk => write!(f, "LOW_RISK"),
        }
    }
}

impl std::str::FromStr for ConfidenceTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ELITE" => Ok(ConfidenceTier::Elite),
            "STRONG" => Ok(ConfidenceTier::Strong),
            "LOW_RISK" => Ok(ConfidenceTier::LowRisk),
            _ => Err(anyhow::anyhow!("Unknown confidence tier: {s}")),
        }
    }
}

/// Ritual alignment label, only attached when enabled in the pipeline options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RitualAlignment {
    High,
    Moderate,
    Low,
}

impl fmt::Display for RitualAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RitualAlignment::High => write!(f, "HIGH"),
            RitualAlignment::Moderate => write!(f, "MODERATE"),
            RitualAlignment::Low => write!(f, "LOW"),
        }
    }
}

impl std::str::FromStr for RitualAlignment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(RitualAlignment::High),
            "MODERATE" => Ok(RitualAlignment::Moderate),
            "LOW" => Ok(RitualAlignment::Low),
            _ => Err(anyhow::anyhow!("Unknown ritual alignment: {s}")),
        }
    }
}

/// Everything the pipeline appends to a matchup row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    pub predicted_win: u8,
    /// Probability × 100, rounded to 2 decimals.
    pub win_probability: f64,
    pub best_value_pick: bool,
    pub smart_bet: bool,
    pub prop_suggestion: PropSuggestion,
    pub confidence_tier: ConfidenceTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ritual_alignment: Option<RitualAlignment>,
}

// ---------------------------------------------------------------------------
// Scored matchup
// ---------------------------------------------------------------------------

/// A matchup row after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatchup {
    /// Zero-based position in the uploaded row set.
    pub position: usize,
    pub matchup: String,
    #[serde(flatten)]
    pub features: MatchupFeatures,
    #[serde(flatten)]
    pub derived: DerivedFields,
}

impl ScoredMatchup {
    /// Label shown for a row without a matchup name.
    pub fn placeholder_label(position: usize) -> String {
        format!("Game {}", position + 1)
    }
}

impl fmt::Display for ScoredMatchup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (win: {:.2}% | vegas: {:.1}% | edge: {:.1}% | {} | {}{})",
            self.matchup,
            self.derived.win_probability,
            self.features.vegas_win_home_pct,
            self.features.edge_pct,
            self.derived.prop_suggestion,
            self.derived.confidence_tier,
            if self.derived.smart_bet { " | SMART BET" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by the scoring pipeline to its caller.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Scoring failed: {0}")]
    ScoringFailure(String),

    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self {
        PipelineError::InvalidCsv(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
