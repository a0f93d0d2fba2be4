use serde::{Deserialize, Serialize};

/// One line of the input table, kept exactly as read.
///
/// A cell is `None` when the line ended before that column was reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub time: Option<String>,
    pub voltage: Option<String>,
}

impl RawRow {
    pub fn new(time: impl Into<String>, voltage: impl Into<String>) -> Self {
        Self {
            time: Some(time.into()),
            voltage: Some(voltage.into()),
        }
    }
}

/// A fully numeric sample. Both components are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanSample {
    pub time: f64,
    pub voltage: f64,
}

/// Ordered, finite (time, voltage) samples produced by the cleaner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanSeries {
    samples: Vec<CleanSample>,
}

impl CleanSeries {
    /// Builds a series from samples, dropping any with a non-finite component.
    pub fn from_samples(samples: Vec<CleanSample>) -> Self {
        let samples = samples
            .into_iter()
            .filter(|s| s.time.is_finite() && s.voltage.is_finite())
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[CleanSample] {
        &self.samples
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }
    pub fn voltages(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.voltage).collect()
    }

    /// Re-expresses the series as raw rows, e.g. to feed it back through the cleaner.
    #[cfg(test)]
    pub(crate) fn to_raw_rows(&self) -> Vec<RawRow> {
        self.samples
            .iter()
            .map(|s| RawRow::new(s.time.to_string(), s.voltage.to_string()))
            .collect()
    }
}

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Point events on a timeline (e.g., R-peaks indices)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
}
