//! Scoring pipeline — schema validation, classifier invocation, derived
//! fields and view selection.

pub mod derive;
pub mod report;
pub mod views;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::{Classifier, ClassifierError};
use crate::sheet::{is_missing, MatchupSheet};
use crate::types::{
    ColumnSet, FeatureVector, HeaderStyle, MatchupFeatures, PipelineError, ScoredMatchup,
    FEATURE_COUNT,
};
use report::SlateReport;
use views::{HistogramBin, PropParlayLeg, RoiSummary, WinLossSummary};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Feature flags covering every dashboard variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub header_style: HeaderStyle,
    /// Derive `predicted_win` as `probability > 0.5` instead of asking the
    /// classifier for its hard label.
    pub derive_prediction_from_probability: bool,
    pub include_roi: bool,
    pub include_prop_parlay: bool,
    pub include_ritual_alignment: bool,
    pub top_parlay_size: usize,
    pub histogram_bins: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            header_style: HeaderStyle::Canonical,
            derive_prediction_from_probability: false,
            include_roi: true,
            include_prop_parlay: true,
            include_ritual_alignment: false,
            top_parlay_size: views::DEFAULT_PARLAY_SIZE,
            histogram_bins: views::DEFAULT_HISTOGRAM_BINS,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check that every required input column is present, by exact name.
pub fn validate_columns(present: &HashSet<&str>, columns: &ColumnSet) -> Result<(), PipelineError> {
    let missing: Vec<String> = columns
        .features
        .iter()
        .filter(|name| !present.contains(*name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingColumns { missing })
    }
}

fn scoring_failure(e: ClassifierError) -> PipelineError {
    PipelineError::ScoringFailure(e.to_string())
}

// ---------------------------------------------------------------------------
// Scored slate
// ---------------------------------------------------------------------------

/// A sheet together with the annotations produced for each of its rows.
#[derive(Debug, Clone)]
pub struct ScoredSlate {
    pub run_id: Uuid,
    pub header_style: HeaderStyle,
    pub include_ritual_alignment: bool,
    /// The upload as received; the export writes its cells back out.
    pub sheet: MatchupSheet,
    /// One entry per sheet record, in input order.
    pub rows: Vec<ScoredMatchup>,
}

impl ScoredSlate {
    pub fn smart_bets(&self) -> Vec<&ScoredMatchup> {
        views::select_smart_bets(&self.rows)
    }

    pub fn top_parlay(&self, n: usize) -> Vec<&ScoredMatchup> {
        views::rank_top_parlay(&self.rows, n)
    }

    pub fn prop_parlay(&self) -> Vec<PropParlayLeg> {
        views::rank_prop_parlay(&self.rows)
    }

    pub fn roi(&self) -> RoiSummary {
        views::compute_roi(&self.rows)
    }

    pub fn summary(&self) -> WinLossSummary {
        views::summarize(&self.rows)
    }

    pub fn histogram(&self, bins: usize) -> Vec<HistogramBin> {
        views::histogram(&self.rows, bins)
    }

    /// Assemble every view the options ask for.
    pub fn report(&self, options: &PipelineOptions) -> SlateReport {
        SlateReport::build(self, options)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Scores uploaded sheets against a shared classifier.
///
/// Instantiate once with the cached classifier; each `score` call works on
/// its own sheet and shares nothing else.
pub struct ScoringPipeline {
    classifier: Arc<dyn Classifier>,
    options: PipelineOptions,
}

impl ScoringPipeline {
    pub fn new(classifier: Arc<dyn Classifier>, options: PipelineOptions) -> Self {
        Self {
            classifier,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Check the sheet's header against the configured vocabulary.
    pub fn validate(&self, sheet: &MatchupSheet) -> Result<(), PipelineError> {
        validate_columns(&sheet.columns(), self.options.header_style.columns())
    }

    /// Run the full pipeline over one sheet.
    ///
    /// Steps:
    /// 1. Validate required columns (whole sheet rejected if any is absent).
    /// 2. Zero-fill absent cells and parse the feature matrix.
    /// 3. Call the classifier once for the whole batch.
    /// 4. Derive per-row fields in dependency order.
    ///
    /// Any failure aborts the batch; no partial result is returned.
    pub fn score(&self, sheet: MatchupSheet) -> Result<ScoredSlate, PipelineError> {
        let columns = self.options.header_style.columns();
        let run_id = Uuid::new_v4();

        if let Err(e) = self.validate(&sheet) {
            warn!(run_id = %run_id, error = %e, "Sheet rejected");
            return Err(e);
        }

        let mut slate = ScoredSlate {
            run_id,
            header_style: self.options.header_style,
            include_ritual_alignment: self.options.include_ritual_alignment,
            sheet,
            rows: Vec::new(),
        };

        if slate.sheet.is_empty() {
            debug!(run_id = %run_id, "Empty sheet, nothing to score");
            return Ok(slate);
        }

        let matrix = feature_matrix(&slate.sheet, columns)?;
        let (probabilities, labels) = self.classify(&matrix)?;

        let matchup_idx = slate.sheet.column_index(columns.matchup);
        slate.rows = matrix
            .iter()
            .zip(probabilities.iter().zip(&labels))
            .enumerate()
            .map(|(position, (x, (p, label)))| {
                let features = MatchupFeatures::from_vector(*x);
                ScoredMatchup {
                    position,
                    matchup: matchup_label(&slate.sheet, matchup_idx, position),
                    derived: derive::derive_fields(
                        &features,
                        *p,
                        *label,
                        self.options.include_ritual_alignment,
                    ),
                    features,
                }
            })
            .collect();

        info!(
            run_id = %run_id,
            rows = slate.rows.len(),
            smart_bets = slate.smart_bets().len(),
            derived_labels = self.options.derive_prediction_from_probability,
            "Slate scored"
        );

        Ok(slate)
    }

    /// One batch call for probabilities, and one for labels unless labels
    /// are derived from the probabilities.
    fn classify(&self, matrix: &[FeatureVector]) -> Result<(Vec<f64>, Vec<u8>), PipelineError> {
        let n = matrix.len();

        let probabilities = self
            .classifier
            .predict_probability(matrix)
            .map_err(scoring_failure)?;
        check_len("probabilities", probabilities.len(), n)?;
        if let Some((i, p)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(PipelineError::ScoringFailure(format!(
                "probability {p} for row {} is outside [0, 1]",
                i + 1
            )));
        }

        let labels = if self.options.derive_prediction_from_probability {
            probabilities
                .iter()
                .map(|p| derive::label_from_probability(*p))
                .collect()
        } else {
            let labels = self.classifier.predict(matrix).map_err(scoring_failure)?;
            check_len("labels", labels.len(), n)?;
            if let Some((i, l)) = labels.iter().enumerate().find(|(_, l)| **l > 1) {
                return Err(PipelineError::ScoringFailure(format!(
                    "label {l} for row {} is not 0 or 1",
                    i + 1
                )));
            }
            labels
        };

        debug!(rows = n, "Classifier batch complete");
        Ok((probabilities, labels))
    }
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<(), PipelineError> {
    if got != expected {
        return Err(PipelineError::ScoringFailure(format!(
            "classifier returned {got} {what} for {expected} rows"
        )));
    }
    Ok(())
}

/// Parse the required columns into the classifier matrix, zero-filling
/// absent cells. Zero-fill cannot tell a missing value from a real zero.
fn feature_matrix(sheet: &MatchupSheet, columns: &ColumnSet) -> Result<Vec<FeatureVector>, PipelineError> {
    let mut indices = [0usize; FEATURE_COUNT];
    for (slot, name) in indices.iter_mut().zip(columns.features) {
        *slot = sheet
            .column_index(name)
            .ok_or_else(|| PipelineError::MissingColumns {
                missing: vec![name.to_string()],
            })?;
    }

    sheet
        .records()
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let mut x = [0.0; FEATURE_COUNT];
            for (f, idx) in indices.iter().enumerate() {
                x[f] = parse_cell(&record[*idx], row, columns.features[f])?;
            }
            Ok(x)
        })
        .collect()
}

fn parse_cell(cell: &str, row: usize, column: &str) -> Result<f64, PipelineError> {
    if is_missing(cell) {
        return Ok(0.0);
    }
    cell.trim().parse::<f64>().map_err(|_| {
        PipelineError::ScoringFailure(format!(
            "row {}: column '{column}' has non-numeric value '{cell}'",
            row + 1
        ))
    })
}

fn matchup_label(sheet: &MatchupSheet, matchup_idx: Option<usize>, position: usize) -> String {
    matchup_idx
        .map(|i| sheet.records()[position][i].trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| ScoredMatchup::placeholder_label(position))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MockClassifier;
    use crate::types::{ConfidenceTier, PropSuggestion, CANONICAL_COLUMNS};

    const HEADER: &str = "matchup,mlbx_win_home_pct,vegas_win_home_pct,edge_pct,home_starter_era,away_starter_era,home_bullpen_era,away_bullpen_era,gematria_alignment_score,narrative_confidence_high";

    fn sheet(rows: &[&str]) -> MatchupSheet {
        let mut text = String::from(HEADER);
        for r in rows {
            text.push('\n');
            text.push_str(r);
        }
        MatchupSheet::from_csv_str(&text).unwrap()
    }

    fn mock_returning(probs: Vec<f64>, labels: Vec<u8>) -> MockClassifier {
        let mut mock = MockClassifier::new();
        mock.expect_predict_probability()
            .times(1)
            .returning(move |_| Ok(probs.clone()));
        mock.expect_predict()
            .times(1)
            .returning(move |_| Ok(labels.clone()));
        mock
    }

    fn pipeline(mock: MockClassifier, options: PipelineOptions) -> ScoringPipeline {
        ScoringPipeline::new(Arc::new(mock), options)
    }

    #[test]
    fn test_validate_reports_each_missing_column() {
        for skip in CANONICAL_COLUMNS.features {
            let present: HashSet<&str> = CANONICAL_COLUMNS
                .features
                .iter()
                .copied()
                .filter(|c| *c != skip)
                .collect();
            match validate_columns(&present, &CANONICAL_COLUMNS) {
                Err(PipelineError::MissingColumns { missing }) => assert_eq!(missing, vec![skip]),
                other => panic!("expected MissingColumns, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_column_never_calls_classifier() {
        let mut mock = MockClassifier::new();
        mock.expect_predict_probability().times(0);
        mock.expect_predict().times(0);
        let p = pipeline(mock, PipelineOptions::default());

        let bad = MatchupSheet::from_csv_str("matchup,edge_pct\nA,9\n").unwrap();
        let err = p.score(bad).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumns { ref missing } if missing.len() == 8));
    }

    #[test]
    fn test_score_annotates_rows() {
        let mock = mock_returning(vec![0.7, 0.41237], vec![1, 0]);
        let p = pipeline(mock, PipelineOptions::default());
        let slate = p
            .score(sheet(&[
                "NYY @ BOS,63,55,8,3.2,4.1,3.5,4.4,91,1",
                ",50,48,2,4.0,3.9,4.2,3.8,84,0",
            ]))
            .unwrap();

        let rows = &slate.rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].matchup, "NYY @ BOS");
        assert_eq!(rows[0].derived.win_probability, 70.0);
        assert!(rows[0].derived.smart_bet);
        assert_eq!(rows[0].derived.prop_suggestion, PropSuggestion::HrProp);
        assert_eq!(rows[0].derived.confidence_tier, ConfidenceTier::Elite);

        assert_eq!(rows[1].matchup, "Game 2");
        assert_eq!(rows[1].derived.win_probability, 41.24);
        assert!(!rows[1].derived.best_value_pick);
        assert_eq!(rows[1].derived.confidence_tier, ConfidenceTier::Strong);
        assert_eq!(rows[1].derived.ritual_alignment, None);
    }

    #[test]
    fn test_blank_cells_zero_filled_before_scoring() {
        let mut mock = MockClassifier::new();
        mock.expect_predict_probability()
            .withf(|rows| rows.len() == 1 && rows[0][3] == 0.0 && rows[0][8] == 0.0)
            .times(1)
            .returning(|_| Ok(vec![0.5]));
        mock.expect_predict().times(1).returning(|_| Ok(vec![0]));
        let p = pipeline(mock, PipelineOptions::default());

        let slate = p.score(sheet(&["A,60,52,8,,4.1,3.5,4.4,70,NaN"])).unwrap();
        assert_eq!(slate.rows[0].features.home_starter_era, 0.0);
    }

    #[test]
    fn test_malformed_cell_is_scoring_failure() {
        let mut mock = MockClassifier::new();
        mock.expect_predict_probability().times(0);
        mock.expect_predict().times(0);
        let p = pipeline(mock, PipelineOptions::default());

        let err = p.score(sheet(&["A,60,52,eight,3.1,4.1,3.5,4.4,70,0"])).unwrap_err();
        assert!(matches!(err, PipelineError::ScoringFailure(ref m) if m.contains("edge_pct")));
    }

    #[test]
    fn test_classifier_error_aborts_batch() {
        let mut mock = MockClassifier::new();
        mock.expect_predict_probability()
            .times(1)
            .returning(|_| Err(ClassifierError::NonFinite { row: 0, feature: 2 }));
        mock.expect_predict().times(0);
        let p = pipeline(mock, PipelineOptions::default());

        let err = p.score(sheet(&["A,60,52,inf,3.1,4.1,3.5,4.4,70,0"])).unwrap_err();
        assert!(matches!(err, PipelineError::ScoringFailure(_)));
    }

    #[test]
    fn test_length_mismatch_is_scoring_failure() {
        let mut mock = MockClassifier::new();
        mock.expect_predict_probability()
            .times(1)
            .returning(|_| Ok(vec![0.5]));
        mock.expect_predict().times(0);
        let p = pipeline(mock, PipelineOptions::default());

        let err = p
            .score(sheet(&[
                "A,60,52,8,3.1,4.1,3.5,4.4,70,0",
                "B,60,52,8,3.1,4.1,3.5,4.4,70,0",
            ]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ScoringFailure(ref m) if m.contains("1 probabilities for 2 rows")));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let mut mock = MockClassifier::new();
        mock.expect_predict_probability()
            .times(1)
            .returning(|_| Ok(vec![1.2]));
        mock.expect_predict().times(0);
        let p = pipeline(mock, PipelineOptions::default());

        let err = p.score(sheet(&["A,60,52,8,3.1,4.1,3.5,4.4,70,0"])).unwrap_err();
        assert!(matches!(err, PipelineError::ScoringFailure(ref m) if m.contains("outside")));
    }

    #[test]
    fn test_invalid_label_rejected() {
        let mock = mock_returning(vec![0.6], vec![2]);
        let p = pipeline(mock, PipelineOptions::default());
        let err = p.score(sheet(&["A,60,52,8,3.1,4.1,3.5,4.4,70,0"])).unwrap_err();
        assert!(matches!(err, PipelineError::ScoringFailure(_)));
    }

    #[test]
    fn test_derived_labels_skip_predict() {
        let mut mock = MockClassifier::new();
        mock.expect_predict_probability()
            .times(1)
            .returning(|_| Ok(vec![0.5, 0.51]));
        mock.expect_predict().times(0);
        let options = PipelineOptions {
            derive_prediction_from_probability: true,
            include_ritual_alignment: true,
            ..PipelineOptions::default()
        };
        let p = pipeline(mock, options);

        let slate = p
            .score(sheet(&[
                "A,60,52,8,3.1,4.1,3.5,4.4,91,0",
                "B,60,52,8,3.1,4.1,3.5,4.4,82,0",
            ]))
            .unwrap();
        let labels: Vec<u8> = slate.rows.iter().map(|r| r.derived.predicted_win).collect();
        assert_eq!(labels, vec![0, 1]);
        assert!(slate.rows.iter().all(|r| r.derived.ritual_alignment.is_some()));
    }

    #[test]
    fn test_empty_sheet_is_noop() {
        let mut mock = MockClassifier::new();
        mock.expect_predict_probability().times(0);
        mock.expect_predict().times(0);
        let p = pipeline(mock, PipelineOptions::default());

        let slate = p.score(sheet(&[])).unwrap();
        assert!(slate.rows.is_empty());
        assert_eq!(slate.roi().roi_percent, 0.0);
    }

    #[test]
    fn test_dashboard_headers() {
        let mock = mock_returning(vec![0.8], vec![1]);
        let options = PipelineOptions {
            header_style: HeaderStyle::Dashboard,
            ..PipelineOptions::default()
        };
        let p = pipeline(mock, options);
        let text = "Matchup,MLBX_Win_Home_%,Vegas_Win_Home_%,Edge_%,Home_Starter_ERA,Away_Starter_ERA,Home_Bullpen_ERA,Away_Bullpen_ERA,Gematria_Alignment_Score,Narrative_Confidence_High\nHOU @ TEX,61,52,9,3.1,4.1,3.5,4.4,86,1\n";
        let slate = p.score(MatchupSheet::from_csv_str(text).unwrap()).unwrap();
        assert_eq!(slate.rows[0].matchup, "HOU @ TEX");
        assert!(slate.rows[0].derived.smart_bet);

        // Canonical headers are not accepted under the dashboard vocabulary.
        let err = p.validate(&sheet(&[])).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumns { ref missing } if missing.len() == 9));
    }
}
