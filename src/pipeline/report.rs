//! Slate report — every view over one scored sheet, ready to serialise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::views::{HistogramBin, PropParlayLeg, RoiSummary, WinLossSummary};
use super::{PipelineOptions, ScoredSlate};
use crate::types::ScoredMatchup;

/// Summary of a single scoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlateReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub row_count: usize,
    pub rows: Vec<ScoredMatchup>,
    pub smart_bets: Vec<ScoredMatchup>,
    pub top_parlay: Vec<ScoredMatchup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prop_parlay: Option<Vec<PropParlayLeg>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<RoiSummary>,
    pub summary: WinLossSummary,
    pub histogram: Vec<HistogramBin>,
}

impl SlateReport {
    pub fn build(slate: &ScoredSlate, options: &PipelineOptions) -> Self {
        let owned = |rows: Vec<&ScoredMatchup>| rows.into_iter().cloned().collect::<Vec<_>>();

        Self {
            run_id: slate.run_id,
            generated_at: Utc::now(),
            row_count: slate.rows.len(),
            rows: slate.rows.to_vec(),
            smart_bets: owned(slate.smart_bets()),
            top_parlay: owned(slate.top_parlay(options.top_parlay_size)),
            prop_parlay: options.include_prop_parlay.then(|| slate.prop_parlay()),
            roi: options.include_roi.then(|| slate.roi()),
            summary: slate.summary(),
            histogram: slate.histogram(options.histogram_bins),
        }
    }
}

impl std::fmt::Display for SlateReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Slate {}: rows={} wins={} losses={} smart_bets={}",
            self.run_id,
            self.row_count,
            self.summary.win_count,
            self.summary.loss_count,
            self.smart_bets.len(),
        )?;
        if let Some(roi) = &self.roi {
            write!(f, " units={} roi={:.2}%", roi.units, roi.roi_percent)?;
        }
        Ok(())
    }
}
