use assert_cmd::Command;
use serde::Deserialize;
use std::{error::Error, fs, path::PathBuf};
use tempfile::tempdir;

#[derive(Debug, Deserialize)]
struct MetricsOutput {
    duration: f64,
    voltage_min: f64,
    voltage_max: f64,
    beats: Vec<f64>,
    num_beats: usize,
    mean_hr_bpm: f64,
}

#[test]
fn reference_strip_produces_expected_metrics() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let out = temp.path().join("test_data1.json");
    let log = temp.path().join("run.log");

    Command::cargo_bin("ecg-analysis")?
        .args([
            "--input",
            &sample_path("test_data/test_data1.csv"),
            "--output",
            out.to_str().expect("utf8 path"),
            "--log-file",
            log.to_str().expect("utf8 path"),
        ])
        .assert()
        .success();

    let actual: MetricsOutput = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_close(actual.duration, 27.775, 1e-9);
    assert_close(actual.voltage_min, -2.15089, 1e-9);
    assert_close(actual.voltage_max, 2.27404, 1e-9);
    assert_eq!(actual.num_beats, 34);
    assert_eq!(actual.beats.len(), actual.num_beats);
    assert!(actual.beats.windows(2).all(|w| w[0] < w[1]));
    assert_close(actual.beats[0], 0.62, 0.03);
    assert_close(actual.mean_hr_bpm, 73.45, 0.05);

    let log_text = fs::read_to_string(&log)?;
    assert!(log_text.contains("Skipping line 2223: expected 2 fields, saw 3"));
    for row in [37, 150, 901, 3000, 4443] {
        assert!(
            log_text.contains(&format!("Non-numeric value in line {}, skipping", row)),
            "missing diagnostic for row {}",
            row
        );
    }
    assert!(!log_text.contains("Voltage exceeds"));
    assert!(log_text
        .lines()
        .any(|l| l.contains("ERROR") && l.contains("Non-numeric value in line 37, skipping")));
    assert!(log_text
        .lines()
        .any(|l| l.contains("WARN") && l.contains("Skipping line 2223")));
    Ok(())
}

#[test]
fn output_file_is_overwritten() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let out = temp.path().join("metrics.json");
    fs::write(&out, "previous run")?;

    Command::cargo_bin("ecg-analysis")?
        .args([
            "-i",
            &sample_path("test_data/test_data1.csv"),
            "-o",
            out.to_str().expect("utf8 path"),
            "--log-file",
            temp.path().join("run.log").to_str().expect("utf8 path"),
        ])
        .assert()
        .success();

    let text = fs::read_to_string(&out)?;
    assert!(text.trim_start().starts_with('{'));
    let duration_at = text.find("\"duration\"").expect("duration key");
    let rate_at = text.find("\"mean_hr_bpm\"").expect("mean_hr_bpm key");
    assert!(duration_at < rate_at);
    Ok(())
}

#[test]
fn output_defaults_next_to_input() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let input = temp.path().join("strip.csv");
    fs::copy(sample_path("test_data/test_data1.csv"), &input)?;

    Command::cargo_bin("ecg-analysis")?
        .args([
            "--input",
            input.to_str().expect("utf8 path"),
            "--log-file",
            temp.path().join("run.log").to_str().expect("utf8 path"),
        ])
        .assert()
        .success();

    assert!(temp.path().join("strip.json").exists());
    Ok(())
}

#[test]
fn missing_input_uses_default_sample() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let out = temp.path().join("default.json");
    let log = temp.path().join("run.log");

    Command::cargo_bin("ecg-analysis")?
        .current_dir(workspace_root())
        .args([
            "--output",
            out.to_str().expect("utf8 path"),
            "--log-file",
            log.to_str().expect("utf8 path"),
        ])
        .assert()
        .success();

    let log_text = fs::read_to_string(&log)?;
    assert!(log_text.contains("No input file given, using default test_data/test_data1.csv"));
    let actual: MetricsOutput = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_eq!(actual.num_beats, 34);
    Ok(())
}

#[test]
fn out_of_range_voltage_warns_once() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let out = temp.path().join("range.json");
    let log = temp.path().join("run.log");

    Command::cargo_bin("ecg-analysis")?
        .args([
            "--input",
            &sample_path("test_data/out_of_range.csv"),
            "--output",
            out.to_str().expect("utf8 path"),
            "--log-file",
            log.to_str().expect("utf8 path"),
        ])
        .assert()
        .success();

    let log_text = fs::read_to_string(&log)?;
    assert_eq!(log_text.matches("Voltage exceeds").count(), 1);
    assert!(log_text.contains("out_of_range.csv"));
    let actual: MetricsOutput = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_close(actual.voltage_max, 350.0, 1e-9);
    Ok(())
}

#[test]
fn single_valid_sample_fails() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let out = temp.path().join("single.json");
    let log = temp.path().join("run.log");

    Command::cargo_bin("ecg-analysis")?
        .args([
            "--input",
            &sample_path("test_data/single_sample.csv"),
            "--output",
            out.to_str().expect("utf8 path"),
            "--log-file",
            log.to_str().expect("utf8 path"),
        ])
        .assert()
        .failure();

    assert!(!out.exists());
    let log_text = fs::read_to_string(&log)?;
    assert!(log_text.contains("degenerate input"));
    assert!(log_text.contains("Non-numeric value in line 1, skipping"));
    Ok(())
}

#[test]
fn unreadable_input_fails() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    Command::cargo_bin("ecg-analysis")?
        .args([
            "--input",
            temp.path().join("absent.csv").to_str().expect("utf8 path"),
            "--log-file",
            temp.path().join("run.log").to_str().expect("utf8 path"),
        ])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn print_matches_written_record() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let out = temp.path().join("metrics.json");

    let stdout = Command::cargo_bin("ecg-analysis")?
        .args([
            "--input",
            &sample_path("test_data/test_data1.csv"),
            "--output",
            out.to_str().expect("utf8 path"),
            "--log-file",
            temp.path().join("run.log").to_str().expect("utf8 path"),
            "--print",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let printed: MetricsOutput = serde_json::from_slice(&stdout)?;
    let written: MetricsOutput = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_eq!(printed.num_beats, written.num_beats);
    assert_eq!(printed.beats, written.beats);
    Ok(())
}

#[test]
fn config_file_changes_voltage_limit() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("analysis.toml");
    fs::write(&config, "voltage_limit = 2.0\n")?;
    let log = temp.path().join("run.log");

    Command::cargo_bin("ecg-analysis")?
        .args([
            "--input",
            &sample_path("test_data/test_data1.csv"),
            "--output",
            temp.path().join("m.json").to_str().expect("utf8 path"),
            "--config",
            config.to_str().expect("utf8 path"),
            "--log-file",
            log.to_str().expect("utf8 path"),
        ])
        .assert()
        .success();

    let log_text = fs::read_to_string(&log)?;
    assert_eq!(log_text.matches("Voltage exceeds").count(), 1);
    Ok(())
}

fn assert_close(a: f64, b: f64, tol: f64) {
    let diff = (a - b).abs();
    assert!(
        diff <= tol,
        "diff {} exceeded tol {} ({} vs {})",
        diff,
        tol,
        a,
        b
    );
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn sample_path(relative: &str) -> String {
    workspace_root()
        .join(relative)
        .to_string_lossy()
        .to_string()
}
