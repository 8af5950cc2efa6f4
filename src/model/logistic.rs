//! Logistic-regression classifier loaded from a JSON artifact.
//!
//! The artifact carries the feature names the model was fitted on, one
//! coefficient per feature and an intercept. Feature names must match the
//! canonical schema order exactly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Classifier, ClassifierError};
use crate::types::{FeatureVector, CANONICAL_COLUMNS, FEATURE_COUNT};

/// On-disk representation of a fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

fn default_model_name() -> String {
    "logistic".to_string()
}

/// A fitted logistic-regression model.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    name: String,
    coefficients: FeatureVector,
    intercept: f64,
}

impl LogisticModel {
    /// Load a model artifact from a JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact: {path}"))?;
        let artifact: ModelArtifact = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse model artifact: {path}"))?;
        let model = Self::from_artifact(artifact)
            .with_context(|| format!("Rejected model artifact: {path}"))?;
        Ok(model)
    }

    /// Validate an artifact and build the model from it.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ClassifierError> {
        ClassifierError::check_dimension(artifact.coefficients.len())?;

        if !artifact.feature_names.is_empty() {
            ClassifierError::check_dimension(artifact.feature_names.len())?;
            for (found, expected) in artifact.feature_names.iter().zip(CANONICAL_COLUMNS.features) {
                if found != expected {
                    return Err(ClassifierError::InvalidArtifact(format!(
                        "feature '{found}' where '{expected}' was expected"
                    )));
                }
            }
        }

        if !artifact.intercept.is_finite() || artifact.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ClassifierError::InvalidArtifact(
                "non-finite coefficient or intercept".to_string(),
            ));
        }

        let mut coefficients = [0.0; FEATURE_COUNT];
        coefficients.copy_from_slice(&artifact.coefficients);

        Ok(Self {
            name: artifact.name,
            coefficients,
            intercept: artifact.intercept,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Linear decision value `w·x + b` for every row.
    fn decision_function(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, ClassifierError> {
        rows.iter()
            .enumerate()
            .map(|(row, x)| {
                if let Some(feature) = x.iter().position(|v| !v.is_finite()) {
                    return Err(ClassifierError::NonFinite { row, feature });
                }
                let z = self
                    .coefficients
                    .iter()
                    .zip(x)
                    .fold(self.intercept, |acc, (w, v)| acc + w * v);
                Ok(z)
            })
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticModel {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ClassifierError> {
        let labels: Vec<u8> = self
            .decision_function(rows)?
            .into_iter()
            .map(|z| u8::from(z > 0.0))
            .collect();
        debug!(rows = rows.len(), model = %self.name, "Labels predicted");
        Ok(labels)
    }

    fn predict_probability(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, ClassifierError> {
        let probs: Vec<f64> = self
            .decision_function(rows)?
            .into_iter()
            .map(sigmoid)
            .collect();
        debug!(rows = rows.len(), model = %self.name, "Probabilities predicted");
        Ok(probs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(coefficients: Vec<f64>, intercept: f64) -> ModelArtifact {
        ModelArtifact {
            name: "test".to_string(),
            feature_names: Vec::new(),
            coefficients,
            intercept,
        }
    }

    fn edge_only_model() -> LogisticModel {
        // Only edge_pct carries weight.
        let mut w = vec![0.0; FEATURE_COUNT];
        w[2] = 0.5;
        LogisticModel::from_artifact(artifact(w, 0.0)).unwrap()
    }

    #[test]
    fn test_zero_decision_is_even_odds() {
        let model = edge_only_model();
        let rows = [[0.0; FEATURE_COUNT]];
        let probs = model.predict_probability(&rows).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-12);
        // Exactly zero decision value is a loss.
        assert_eq!(model.predict(&rows).unwrap(), vec![0]);
    }

    #[test]
    fn test_probability_monotone_in_weighted_feature() {
        let model = edge_only_model();
        let mut low = [0.0; FEATURE_COUNT];
        let mut high = [0.0; FEATURE_COUNT];
        low[2] = -4.0;
        high[2] = 4.0;
        let probs = model.predict_probability(&[low, high]).unwrap();
        assert!(probs[0] < 0.5);
        assert!(probs[1] > 0.5);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(model.predict(&[low, high]).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_rejects_wrong_coefficient_count() {
        let err = LogisticModel::from_artifact(artifact(vec![0.1; 8], 0.0)).unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::DimensionMismatch { expected: 9, actual: 8 }
        ));
    }

    #[test]
    fn test_rejects_misordered_feature_names() {
        let mut a = artifact(vec![0.1; FEATURE_COUNT], 0.0);
        a.feature_names = CANONICAL_COLUMNS.features.iter().map(|s| s.to_string()).collect();
        a.feature_names.swap(0, 1);
        let err = LogisticModel::from_artifact(a).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidArtifact(_)));
    }

    #[test]
    fn test_accepts_canonical_feature_names() {
        let mut a = artifact(vec![0.1; FEATURE_COUNT], -1.0);
        a.feature_names = CANONICAL_COLUMNS.features.iter().map(|s| s.to_string()).collect();
        assert!(LogisticModel::from_artifact(a).is_ok());
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let model = edge_only_model();
        let mut row = [0.0; FEATURE_COUNT];
        row[4] = f64::NAN;
        let err = model.predict_probability(&[[0.0; FEATURE_COUNT], row]).unwrap_err();
        assert!(matches!(err, ClassifierError::NonFinite { row: 1, feature: 4 }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("mlbx-model-{}.json", uuid::Uuid::new_v4()));
        let json = serde_json::json!({
            "name": "file-model",
            "coefficients": [0.02, -0.01, 0.08, -0.1, 0.1, -0.05, 0.05, 0.01, 0.3],
            "intercept": -0.4
        });
        std::fs::write(&path, json.to_string()).unwrap();

        let model = LogisticModel::load(path.to_str().unwrap()).unwrap();
        assert_eq!(model.name(), "file-model");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(LogisticModel::load("/nonexistent/mlbx_model.json").is_err());
    }
}
