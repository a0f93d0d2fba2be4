//! Coercion of raw rows into a finite, order-preserving [`CleanSeries`].

use crate::{
    config::DEFAULT_VOLTAGE_LIMIT,
    diagnostics::{DiagnosticKind, Diagnostics, Severity},
    signal::{CleanSample, CleanSeries, RawRow},
};

/// Result of coercing one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Numeric(f64),
    Invalid,
}

impl Cell {
    /// Parse a cell as a finite real number. Missing, empty, non-numeric and
    /// non-finite (`NaN`, `inf`) cells are all invalid.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).and_then(|s| s.parse::<f64>().ok()) {
            Some(v) if v.is_finite() => Cell::Numeric(v),
            _ => Cell::Invalid,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Cell::Numeric(v) => Some(v),
            Cell::Invalid => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CleanerOptions {
    pub voltage_limit: f64,
    pub non_numeric_severity: Severity,
}

impl Default for CleanerOptions {
    fn default() -> Self {
        Self {
            voltage_limit: DEFAULT_VOLTAGE_LIMIT,
            non_numeric_severity: Severity::Error,
        }
    }
}

/// Clean with default options.
pub fn clean(rows: &[RawRow], source: &str, diagnostics: &mut Diagnostics) -> CleanSeries {
    clean_with_options(rows, source, &CleanerOptions::default(), diagnostics)
}

/// Coerce every cell, drop rows with an invalid cell and report what was dropped.
///
/// One diagnostic is emitted per dropped row, in row order, followed by at most
/// one out-of-range warning for the whole input.
pub fn clean_with_options(
    rows: &[RawRow],
    source: &str,
    opts: &CleanerOptions,
    diagnostics: &mut Diagnostics,
) -> CleanSeries {
    let coerced: Vec<(Cell, Cell)> = rows
        .iter()
        .map(|row| {
            (
                Cell::parse(row.time.as_deref()),
                Cell::parse(row.voltage.as_deref()),
            )
        })
        .collect();

    let mut samples = Vec::with_capacity(coerced.len());
    for (idx, cells) in coerced.iter().enumerate() {
        match (cells.0.value(), cells.1.value()) {
            (Some(time), Some(voltage)) => samples.push(CleanSample { time, voltage }),
            _ => diagnostics.emit(
                opts.non_numeric_severity,
                DiagnosticKind::NonNumericValue { row: idx },
                format!("Non-numeric value in line {}, skipping", idx),
            ),
        }
    }

    let out_of_range = coerced
        .iter()
        .filter_map(|(_, v)| v.value())
        .any(|v| v.abs() > opts.voltage_limit);
    if out_of_range {
        diagnostics.emit(
            Severity::Warning,
            DiagnosticKind::OutOfRangeVoltage {
                source: source.to_owned(),
            },
            format!(
                "Voltage exceeds +/-{} mV in {}",
                opts.voltage_limit, source
            ),
        );
    }

    log::info!(
        "Kept {} of {} rows from {}",
        samples.len(),
        rows.len(),
        source
    );
    CleanSeries::from_samples(samples)
}
