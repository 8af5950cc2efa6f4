//! Classifier integration for home-win scoring.
//!
//! Defines the `Classifier` trait the pipeline scores against and the
//! process-wide cache holding the loaded model artifact.

pub mod logistic;

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::types::{FeatureVector, FEATURE_COUNT};
use logistic::LogisticModel;

/// Abstraction over a pretrained binary classifier.
///
/// Both calls take the whole batch so a slate is scored with identical
/// input ordering. Implementations must return exactly one value per row.
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    /// Hard 0/1 label per row.
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<u8>, ClassifierError>;

    /// Probability of a home win per row, in [0, 1].
    fn predict_probability(&self, rows: &[FeatureVector]) -> Result<Vec<f64>, ClassifierError>;
}

/// Failures raised by a classifier while scoring a batch.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Expected {expected} features, model has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Non-finite value in row {row}, feature {feature}")]
    NonFinite { row: usize, feature: usize },

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
}

impl ClassifierError {
    pub(crate) fn check_dimension(actual: usize) -> Result<(), ClassifierError> {
        if actual != FEATURE_COUNT {
            return Err(ClassifierError::DimensionMismatch {
                expected: FEATURE_COUNT,
                actual,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Process-wide model cache
// ---------------------------------------------------------------------------

static SHARED_MODEL: Mutex<Option<Arc<LogisticModel>>> = Mutex::new(None);

/// Load the model artifact once and hand out shared read-only handles.
///
/// The first successful call fixes the model for the life of the process;
/// later calls return the cached instance and ignore `path`. Concurrent
/// first calls wait on the lock, so the artifact is read exactly once.
/// There is no reload or invalidation.
pub fn shared_model(path: &str) -> Result<Arc<LogisticModel>> {
    let mut slot = SHARED_MODEL.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(model) = slot.as_ref() {
        return Ok(Arc::clone(model));
    }

    let model = Arc::new(LogisticModel::load(path)?);
    info!(path, model = %model.name(), "Classifier loaded");
    *slot = Some(Arc::clone(&model));
    Ok(model)
}
