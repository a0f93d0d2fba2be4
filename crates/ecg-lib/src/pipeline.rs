use crate::{
    clean::{clean_with_options, CleanerOptions},
    config::AnalysisConfig,
    detectors::ecg::PanTompkinsDetector,
    diagnostics::Diagnostics,
    error::Result,
    io::csv::read_raw_rows,
    metrics::summary::{compute_metrics, MetricsRecord},
    signal::CleanSeries,
};
use std::path::Path;

/// Everything produced by one run over one input file.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub series: CleanSeries,
    pub record: MetricsRecord,
}

/// Load, clean and summarise one recording.
pub fn analyze_file(
    path: &Path,
    cfg: &AnalysisConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Analysis> {
    let rows = read_raw_rows(path, &cfg.loader, diagnostics)?;
    let opts = CleanerOptions {
        voltage_limit: cfg.voltage_limit,
        non_numeric_severity: cfg.non_numeric_severity,
    };
    let source = path.display().to_string();
    let series = clean_with_options(&rows, &source, &opts, diagnostics);
    let detector = PanTompkinsDetector::new(cfg.detector);
    let record = compute_metrics(&series, &detector, diagnostics)?;
    Ok(Analysis { series, record })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{diagnostics::DiagnosticKind, error::EcgError};
    use std::{fmt::Write as _, fs};

    fn synthetic_csv(fs_hz: f64, beats: &[f64], seconds: f64) -> String {
        let n = (seconds * fs_hz) as usize;
        let mut out = String::new();
        for i in 0..=n {
            let t = i as f64 / fs_hz;
            let v: f64 = beats
                .iter()
                .map(|&bt| 1.2 * (-0.5 * ((t - bt) / 0.02).powi(2)).exp())
                .sum();
            writeln!(out, "{:.4},{:.5}", t, v).unwrap();
        }
        out
    }

    #[test]
    fn analyzes_noisy_file() {
        let beats: Vec<f64> = (0..8).map(|k| 0.5 + k as f64 * 0.8).collect();
        let mut text = synthetic_csv(250.0, &beats, 7.0);
        text.push_str("7.1,oops\n7.2,1,2\n");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.csv");
        fs::write(&path, text).unwrap();

        let mut diag = Diagnostics::new();
        let analysis = analyze_file(&path, &AnalysisConfig::default(), &mut diag).unwrap();
        assert_eq!(analysis.record.num_beats, beats.len());
        assert_eq!(analysis.record.beats.len(), analysis.record.num_beats);
        for (found, expected) in analysis.record.beats.iter().zip(&beats) {
            assert!((found - expected).abs() < 0.05, "{} vs {}", found, expected);
        }
        assert_eq!(
            diag.count_where(|k| matches!(k, DiagnosticKind::MalformedRow { .. })),
            1
        );
        assert_eq!(
            diag.count_where(|k| matches!(k, DiagnosticKind::NonNumericValue { .. })),
            1
        );
    }

    #[test]
    fn all_invalid_file_is_degenerate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.csv");
        fs::write(&path, "a,b\nc,d\n").unwrap();
        let mut diag = Diagnostics::new();
        let err = analyze_file(&path, &AnalysisConfig::default(), &mut diag).unwrap_err();
        assert!(matches!(err, EcgError::DegenerateInput(_)));
    }
}
