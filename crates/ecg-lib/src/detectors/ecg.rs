use crate::signal::{Events, TimeSeries};
use serde::Deserialize;

/// Boundary to any beat detector: voltage samples plus sampling rate in,
/// sample indices of detected R-peaks out.
pub trait BeatDetector {
    fn detect(&self, voltage: &[f64], fs: f64) -> Vec<usize>;
}

/// Configurable parameters for the ECG beat detection pipeline.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct EcgPipelineConfig {
    /// Lower cutoff for the single-pole high-pass filter (Hz).
    pub lowcut_hz: f64,
    /// Upper cutoff for the single-pole low-pass filter (Hz).
    pub highcut_hz: f64,
    /// Moving window integration length (seconds).
    pub integration_window_s: f64,
    /// Minimum physiological RR distance / refractory period (seconds).
    pub min_rr_s: f64,
    /// Scale between noise and signal envelopes for the adaptive threshold.
    pub threshold_scale: f64,
    /// How far back to search (seconds) for the precise R-peak after a detection.
    pub search_back_s: f64,
}

impl Default for EcgPipelineConfig {
    fn default() -> Self {
        Self {
            lowcut_hz: 5.0,
            highcut_hz: 15.0,
            integration_window_s: 0.150,
            min_rr_s: 0.300,
            threshold_scale: 0.6,
            search_back_s: 0.150,
        }
    }
}

/// Pan–Tompkins-inspired R-peak detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanTompkinsDetector {
    pub config: EcgPipelineConfig,
}

impl PanTompkinsDetector {
    pub fn new(config: EcgPipelineConfig) -> Self {
        Self { config }
    }
}

impl BeatDetector for PanTompkinsDetector {
    fn detect(&self, voltage: &[f64], fs: f64) -> Vec<usize> {
        let ts = TimeSeries {
            fs,
            data: voltage.to_vec(),
        };
        detect_r_peaks_with_config(&ts, &self.config).indices
    }
}

/// Detect R-peaks using the configurable pipeline.
pub fn detect_r_peaks_with_config(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> Events {
    if ts.is_empty() || !(ts.fs.is_finite() && ts.fs > 0.0) {
        return Events::from_indices(Vec::new());
    }

    let (bandpassed, integrated) = pan_tompkins_envelope(ts, cfg);
    let peaks = pick_peaks(&bandpassed, &integrated, ts.fs, cfg);

    if peaks.len() < 2 {
        // Fall back to the naive peak picker if the adaptive method underperformed.
        return Events::from_indices(fallback_peak_picker(ts, cfg));
    }

    Events::from_indices(peaks)
}

fn pan_tompkins_envelope(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> (Vec<f64>, Vec<f64>) {
    let fs = ts.fs.max(1.0);
    let bandpassed = bandpass(&ts.data, fs, cfg.lowcut_hz, cfg.highcut_hz);
    let squared_slope: Vec<f64> = derivative(&bandpassed).iter().map(|d| d * d).collect();
    let win = ((cfg.integration_window_s * fs).round() as usize).max(1);
    let integrated = moving_average(&squared_slope, win);
    (bandpassed, integrated)
}

fn bandpass(data: &[f64], fs: f64, low: f64, high: f64) -> Vec<f64> {
    let hp = if low > 0.0 {
        single_pole_highpass(data, fs, low)
    } else {
        data.to_vec()
    };
    if high <= 0.0 || high >= fs * 0.5 {
        hp
    } else {
        single_pole_lowpass(&hp, fs, high)
    }
}

fn rc_constant(cutoff: f64) -> f64 {
    1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01))
}

fn single_pole_highpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let rc = rc_constant(cutoff);
    let alpha = rc / (rc + 1.0 / fs);
    let (mut prev_y, mut prev_x) = (first, first);
    data.iter()
        .map(|&x| {
            prev_y = alpha * (prev_y + x - prev_x);
            prev_x = x;
            prev_y
        })
        .collect()
}

fn single_pole_lowpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let dt = 1.0 / fs;
    let alpha = dt / (rc_constant(cutoff) + dt);
    let mut prev = first;
    data.iter()
        .map(|&x| {
            prev += alpha * (x - prev);
            prev
        })
        .collect()
}

fn derivative(data: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    std::iter::once(0.0)
        .chain(data.windows(2).map(|w| w[1] - w[0]))
        .collect()
}

/// Trailing moving average; the first `win - 1` outputs are divided by the full window.
fn moving_average(data: &[f64], win: usize) -> Vec<f64> {
    if win <= 1 {
        return data.to_vec();
    }
    let mut acc = 0.0;
    data.iter()
        .enumerate()
        .map(|(i, &sample)| {
            acc += sample;
            if i >= win {
                acc -= data[i - win];
            }
            acc / win as f64
        })
        .collect()
}

/// Running signal/noise estimates driving the adaptive threshold.
struct Levels {
    signal: f64,
    noise: f64,
    scale: f64,
}

impl Levels {
    fn threshold(&self) -> f64 {
        self.noise + self.scale * (self.signal - self.noise).max(0.0)
    }
}

fn pick_peaks(
    bandpassed: &[f64],
    envelope: &[f64],
    fs: f64,
    cfg: &EcgPipelineConfig,
) -> Vec<usize> {
    if bandpassed.is_empty() || envelope.is_empty() {
        return Vec::new();
    }

    let refractory = (cfg.min_rr_s * fs).round().max(1.0) as usize;
    let search = (cfg.search_back_s * fs).round().max(1.0) as usize;

    let init = envelope.len().min((fs as usize).max(1));
    let avg = envelope[..init].iter().sum::<f64>() / init as f64;
    let mut levels = Levels {
        signal: avg,
        noise: avg * 0.5,
        scale: cfg.threshold_scale,
    };
    let mut last_peak_sample: Option<usize> = None;
    let mut peaks = Vec::new();

    for (i, &sample) in envelope.iter().enumerate() {
        let refractory_ok = last_peak_sample.map_or(true, |last| i - last >= refractory);
        if sample >= levels.threshold() && refractory_ok {
            let start = i.saturating_sub(search);
            let end = i.min(bandpassed.len() - 1);
            let mut idx = start;
            let mut max_val = f64::MIN;
            for (j, &v) in bandpassed.iter().enumerate().take(end + 1).skip(start) {
                if v > max_val {
                    max_val = v;
                    idx = j;
                }
            }
            peaks.push(idx);
            last_peak_sample = Some(i);
            levels.signal = 0.125 * sample + 0.875 * levels.signal;
        } else {
            levels.noise = 0.125 * sample + 0.875 * levels.noise;
        }
    }

    peaks.sort_unstable();
    peaks.dedup();
    peaks
}

/// Local maxima of the detrended signal, spaced at least `min_rr_s` apart.
fn fallback_peak_picker(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> Vec<usize> {
    let data = &ts.data;
    if data.len() < 3 {
        return Vec::new();
    }
    let min_gap = (cfg.min_rr_s * ts.fs).max(1.0) as usize;
    let win = ((0.150 * ts.fs) as usize).max(1);
    let detrended: Vec<f64> = data
        .iter()
        .zip(moving_average(data, win))
        .map(|(x, m)| x - m)
        .collect();

    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..detrended.len() - 1 {
        let y = detrended[i];
        let is_peak = y > 0.0 && y > detrended[i - 1] && y > detrended[i + 1];
        let spaced = peaks.last().map_or(true, |&last| i - last >= min_gap);
        if is_peak && spaced {
            peaks.push(i);
        }
    }
    peaks
}
