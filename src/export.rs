//! CSV export of scored slates.
//!
//! Writes every uploaded column (absent required cells as `0`) followed by
//! the derived columns. A derived column already present in the upload is
//! overwritten in place, so re-scoring an exported file keeps its layout.
//! An uploaded ritual alignment column is blanked when the slate was scored
//! without it.

use anyhow::{Context, Result};
use std::io::{Read, Write};
use tracing::info;

use crate::pipeline::ScoredSlate;
use crate::sheet::is_missing;
use crate::types::{DerivedColumns, DerivedFields, HeaderStyle, PipelineError};

/// Derived column names in output order; ritual alignment only when enabled.
fn derived_names(cols: &DerivedColumns, include_ritual: bool) -> Vec<&'static str> {
    let mut names = vec![
        cols.predicted_win,
        cols.win_probability,
        cols.best_value_pick,
        cols.smart_bet,
        cols.prop_suggestion,
        cols.confidence_tier,
    ];
    if include_ritual {
        names.push(cols.ritual_alignment);
    }
    names
}

fn derived_cells(d: &DerivedFields) -> Vec<String> {
    let mut cells = vec![
        d.predicted_win.to_string(),
        d.win_probability.to_string(),
        d.best_value_pick.to_string(),
        d.smart_bet.to_string(),
        d.prop_suggestion.to_string(),
        d.confidence_tier.to_string(),
    ];
    if let Some(r) = d.ritual_alignment {
        cells.push(r.to_string());
    }
    cells
}

/// Write the annotated slate as CSV.
pub fn write_csv<W: Write>(slate: &ScoredSlate, writer: W) -> Result<(), PipelineError> {
    let columns = slate.header_style.columns();
    let sheet = &slate.sheet;

    let mut headers: Vec<String> = sheet.headers().to_vec();
    let mut derived_slots = Vec::new();
    for name in derived_names(&columns.derived, slate.include_ritual_alignment) {
        let slot = match sheet.column_index(name) {
            Some(i) => i,
            None => {
                headers.push(name.to_string());
                headers.len() - 1
            }
        };
        derived_slots.push(slot);
    }

    let stale_ritual = if slate.include_ritual_alignment {
        None
    } else {
        sheet.column_index(columns.derived.ritual_alignment)
    };

    let feature_slots: Vec<usize> = columns
        .features
        .iter()
        .filter_map(|name| sheet.column_index(name))
        .collect();

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&headers)?;

    for (record, row) in sheet.records().iter().zip(&slate.rows) {
        let mut out = record.clone();
        out.resize(headers.len(), String::new());
        for &i in &feature_slots {
            if is_missing(&out[i]) {
                out[i] = "0".to_string();
            }
        }
        if let Some(i) = stale_ritual {
            out[i].clear();
        }
        for (slot, cell) in derived_slots.iter().zip(derived_cells(&row.derived)) {
            out[*slot] = cell;
        }
        wtr.write_record(&out)?;
    }

    wtr.flush()
        .map_err(|e| PipelineError::InvalidCsv(e.to_string()))?;
    Ok(())
}

/// Render the annotated slate as a CSV string.
pub fn to_csv_string(slate: &ScoredSlate) -> Result<String, PipelineError> {
    let mut buf = Vec::new();
    write_csv(slate, &mut buf)?;
    String::from_utf8(buf).map_err(|e| PipelineError::InvalidCsv(e.to_string()))
}

/// Write the annotated slate to a file.
pub fn write_path(slate: &ScoredSlate, path: &str) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {path}"))?;
    write_csv(slate, file).with_context(|| format!("Failed to write results to {path}"))?;
    info!(path, rows = slate.rows.len(), "Results exported");
    Ok(())
}

/// Read the derived fields back from an exported CSV.
///
/// Ritual alignment is read when its column is present.
pub fn read_derived<R: Read>(reader: R, style: HeaderStyle) -> Result<Vec<DerivedFields>, PipelineError> {
    let cols = &style.columns().derived;
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let index = |name: &str| -> Result<usize, PipelineError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::MissingColumns {
                missing: vec![name.to_string()],
            })
    };
    let predicted_win = index(cols.predicted_win)?;
    let win_probability = index(cols.win_probability)?;
    let best_value_pick = index(cols.best_value_pick)?;
    let smart_bet = index(cols.smart_bet)?;
    let prop_suggestion = index(cols.prop_suggestion)?;
    let confidence_tier = index(cols.confidence_tier)?;
    let ritual_alignment = index(cols.ritual_alignment).ok();

    let mut out = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let cell = |i: usize| record.get(i).unwrap_or_default();
        let bad = |what: &str, value: &str| {
            PipelineError::InvalidCsv(format!("row {}: bad {what} '{value}'", row + 1))
        };

        let ritual = match ritual_alignment.map(cell) {
            Some(v) if !v.is_empty() => Some(v.parse().map_err(|_| bad("ritual alignment", v))?),
            _ => None,
        };

        out.push(DerivedFields {
            predicted_win: cell(predicted_win)
                .parse()
                .map_err(|_| bad("predicted win", cell(predicted_win)))?,
            win_probability: cell(win_probability)
                .parse()
                .map_err(|_| bad("win probability", cell(win_probability)))?,
            best_value_pick: cell(best_value_pick)
                .parse()
                .map_err(|_| bad("value pick flag", cell(best_value_pick)))?,
            smart_bet: cell(smart_bet)
                .parse()
                .map_err(|_| bad("smart bet flag", cell(smart_bet)))?,
            prop_suggestion: cell(prop_suggestion)
                .parse()
                .map_err(|_| bad("prop suggestion", cell(prop_suggestion)))?,
            confidence_tier: cell(confidence_tier)
                .parse()
                .map_err(|_| bad("confidence tier", cell(confidence_tier)))?,
            ritual_alignment: ritual,
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
