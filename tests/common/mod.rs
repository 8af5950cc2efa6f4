//! Deterministic classifier for integration testing.
//!
//! Reads the home-win probability straight from `mlbx_win_home_pct` and
//! counts every batch call so tests can assert the classifier was invoked
//! exactly once (or not at all).

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use mlbx::model::{Classifier, ClassifierError};
use mlbx::sheet::MatchupSheet;
use mlbx::types::{FeatureVector, CANONICAL_COLUMNS};

/// A classifier whose probability is `mlbx_win_home_pct / 100`.
#[derive(Default)]
pub struct EchoClassifier {
    probability_calls: Arc<Mutex<usize>>,
    label_calls: Arc<Mutex<usize>>,
    /// If set, every call returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl EchoClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force all subsequent calls to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn probability_calls(&self) -> usize {
        *self.probability_calls.lock().unwrap()
    }

    pub fn label_calls(&self) -> usize {
        *self.label_calls.lock().unwrap()
    }

    fn check_error(&self) -> Result<(), ClassifierError> {
        match self.force_error.lock().unwrap().as_ref() {
            Some(msg) => Err(ClassifierError::InvalidArtifact(msg.clone())),
            None => Ok(()),
        }
    }
}

impl Classifier for EchoClassifier {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ClassifierError> {
        *self.label_calls.lock().unwrap() += 1;
        self.check_error()?;
        // Deliberately disagrees with `probability > 0.5` at exactly 50%.
        Ok(rows.iter().map(|r| u8::from(r[0] >= 50.0)).collect())
    }

    fn predict_probability(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, ClassifierError> {
        *self.probability_calls.lock().unwrap() += 1;
        self.check_error()?;
        Ok(rows.iter().map(|r| (r[0] / 100.0).clamp(0.0, 1.0)).collect())
    }
}

/// Canonical header line.
pub fn header() -> String {
    format!("matchup,{}", CANONICAL_COLUMNS.features.join(","))
}

/// One CSV row with neutral ERAs.
pub fn row(matchup: &str, mlbx: f64, vegas: f64, edge: f64, score: f64) -> String {
    format!("{matchup},{mlbx},{vegas},{edge},3.8,4.1,3.9,4.2,{score},0")
}

/// Build a canonical sheet from rows produced by [`row`].
pub fn sheet(rows: &[String]) -> MatchupSheet {
    let mut text = header();
    for r in rows {
        text.push('\n');
        text.push_str(r);
    }
    text.push('\n');
    MatchupSheet::from_csv_str(&text).unwrap()
}
