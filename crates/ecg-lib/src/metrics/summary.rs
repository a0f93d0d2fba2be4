use crate::{
    detectors::ecg::BeatDetector,
    diagnostics::{DiagnosticKind, Diagnostics, Severity},
    error::{EcgError, Result},
    signal::CleanSeries,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Heart rates outside this band (bpm) are reported but not rejected.
const PLAUSIBLE_HR_BPM: (f64, f64) = (20.0, 300.0);

/// Summary of one ECG strip. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub duration: f64,
    pub voltage_min: f64,
    pub voltage_max: f64,
    pub beats: Vec<f64>,
    pub num_beats: usize,
    pub mean_hr_bpm: f64,
}

/// Sampling rate (Hz) from the median gap between consecutive timestamps.
pub fn sampling_rate(series: &CleanSeries) -> Result<f64> {
    let mut gaps: Vec<f64> = series
        .samples()
        .windows(2)
        .map(|w| w[1].time - w[0].time)
        .collect();
    if gaps.is_empty() {
        return Err(EcgError::DegenerateInput(format!(
            "need at least 2 samples to estimate sampling rate, got {}",
            series.len()
        )));
    }
    let median = median(&mut gaps);
    let rate = 1.0 / median;
    if median <= 0.0 || !rate.is_finite() {
        return Err(EcgError::DegenerateInput(format!(
            "median sample interval is {}, cannot derive sampling rate",
            median
        )));
    }
    Ok(rate)
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Minimum and maximum voltage of a non-empty series.
pub fn voltage_extremes(series: &CleanSeries) -> Result<(f64, f64)> {
    if series.is_empty() {
        return Err(EcgError::DegenerateInput(
            "no valid samples to take voltage extremes from".into(),
        ));
    }
    Ok(series
        .samples()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.voltage), hi.max(s.voltage))
        }))
}

/// Time of last sample minus time of first; must be positive.
pub fn strip_duration(series: &CleanSeries) -> Result<f64> {
    let samples = series.samples();
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) if samples.len() >= 2 => (first, last),
        _ => {
            return Err(EcgError::DegenerateInput(format!(
                "need at least 2 valid samples, got {}",
                samples.len()
            )))
        }
    };
    let duration = last.time - first.time;
    if !(duration.is_finite() && duration > 0.0) {
        return Err(EcgError::DegenerateInput(format!(
            "strip duration is {} (first time {}, last time {})",
            duration, first.time, last.time
        )));
    }
    Ok(duration)
}

/// Run the detector and map its peak indices back to sample times.
pub fn beat_times(
    series: &CleanSeries,
    fs: f64,
    detector: &dyn BeatDetector,
) -> Result<Vec<f64>> {
    let mut indices = detector.detect(&series.voltages(), fs);
    indices.sort_unstable();
    indices.dedup();
    indices
        .into_iter()
        .map(|idx| {
            series
                .samples()
                .get(idx)
                .map(|s| s.time)
                .ok_or_else(|| EcgError::DetectorIndex {
                    index: idx,
                    len: series.len(),
                })
        })
        .collect()
}

/// Derive the metrics record for a cleaned strip.
///
/// Fails with [`EcgError::DegenerateInput`] on fewer than two samples, a
/// non-positive or overflowing duration, or a non-finite heart rate, so the
/// record never carries NaN or infinity.
pub fn compute_metrics(
    series: &CleanSeries,
    detector: &dyn BeatDetector,
    diagnostics: &mut Diagnostics,
) -> Result<MetricsRecord> {
    let duration = strip_duration(series)?;
    log::info!("Strip duration {} s", duration);
    let (voltage_min, voltage_max) = voltage_extremes(series)?;
    log::info!("Voltage extremes ({}, {})", voltage_min, voltage_max);

    let fs = sampling_rate(series)?;
    let beats = beat_times(series, fs, detector)?;
    let num_beats = beats.len();
    let mean_hr_bpm = num_beats as f64 / (duration / 60.0);
    if !mean_hr_bpm.is_finite() {
        return Err(EcgError::DegenerateInput(format!(
            "mean heart rate is not finite ({} beats over {} s)",
            num_beats, duration
        )));
    }
    log::info!(
        "Detected {} beats at {:.1} Hz, mean heart rate {:.2} bpm",
        num_beats,
        fs,
        mean_hr_bpm
    );

    let (lo, hi) = PLAUSIBLE_HR_BPM;
    if !(lo..=hi).contains(&mean_hr_bpm) {
        diagnostics.emit(
            Severity::Warning,
            DiagnosticKind::ImplausibleHeartRate { bpm: mean_hr_bpm },
            format!(
                "Mean heart rate {:.2} bpm is outside {}-{} bpm",
                mean_hr_bpm, lo, hi
            ),
        );
    }

    Ok(MetricsRecord {
        duration,
        voltage_min,
        voltage_max,
        beats,
        num_beats,
        mean_hr_bpm,
    })
}

/// Write the record as pretty JSON, replacing any existing file.
pub fn write_record(path: &Path, record: &MetricsRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    fs::write(path, json + "\n").map_err(|source| EcgError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote metrics to {}", path.display());
    Ok(())
}

pub fn read_record(path: &Path) -> Result<MetricsRecord> {
    let text = fs::read_to_string(path).map_err(|source| EcgError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
