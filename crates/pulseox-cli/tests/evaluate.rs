use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, f64::consts::PI, fs, path::Path};

#[derive(Deserialize)]
struct Report {
    window: usize,
    heart_rate: i32,
    hr_valid: bool,
    spo2: f64,
    spo2_valid: bool,
    #[serde(default)]
    hr_smoothed: Option<f64>,
    #[serde(default)]
    spo2_smoothed: Option<f64>,
}

fn sine_sample(dc: f64, amplitude: f64, i: usize, period: f64) -> u32 {
    (dc + amplitude * (2.0 * PI * i as f64 / period).sin()).round() as u32
}

fn write_recording_csv(path: &Path, samples: usize) {
    let mut csv = String::from("ir,red\n");
    for i in 0..samples {
        let ir = sine_sample(1000.0, 80.0, i, 20.0);
        let red = sine_sample(1000.0, 50.0, i, 20.0);
        csv.push_str(&format!("{ir},{red}\n"));
    }
    fs::write(path, csv).expect("write recording");
}

fn parse_reports(stdout: &[u8]) -> Vec<Report> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("report line"))
        .collect()
}

#[test]
fn evaluate_reports_vitals_per_window() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let recording = dir.path().join("recording.csv");
    write_recording_csv(&recording, 300);

    let mut cmd = cargo_bin_cmd!("pulseox");
    cmd.args([
        "evaluate",
        "--input",
        recording.to_str().expect("utf8 path"),
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let reports = parse_reports(&output);

    assert_eq!(reports.len(), 3);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.window, i);
        assert!(report.hr_valid);
        assert_eq!(report.heart_rate, 75);
        assert!(report.spo2_valid);
        assert!((report.spo2 - 95.0).abs() < 0.3, "spo2 {}", report.spo2);
        assert!(report.hr_smoothed.is_none());
    }
    Ok(())
}

#[test]
fn evaluate_accepts_paired_text_series_and_smooths() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let ir_path = dir.path().join("ir.txt");
    let red_path = dir.path().join("red.txt");
    let mut ir = String::new();
    let mut red = String::new();
    for i in 0..200 {
        ir.push_str(&format!("{}\n", sine_sample(1000.0, 80.0, i, 20.0)));
        red.push_str(&format!("{}\n", sine_sample(1000.0, 50.0, i, 20.0)));
    }
    fs::write(&ir_path, ir)?;
    fs::write(&red_path, red)?;

    let mut cmd = cargo_bin_cmd!("pulseox");
    cmd.args([
        "evaluate",
        "--ir",
        ir_path.to_str().expect("utf8 path"),
        "--red",
        red_path.to_str().expect("utf8 path"),
        "--smooth",
        "4",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let reports = parse_reports(&output);

    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert!(report.hr_valid);
        let hr_smoothed = report.hr_smoothed.expect("smoothed heart rate");
        assert!((hr_smoothed - 75.0).abs() < 1.0);
        assert!(report.spo2_smoothed.is_some());
    }
    Ok(())
}

#[test]
fn evaluate_rejects_mismatched_text_series() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let ir_path = dir.path().join("ir.txt");
    let red_path = dir.path().join("red.txt");
    fs::write(&ir_path, "1000\n1001\n1002\n")?;
    fs::write(&red_path, "900\n901\n")?;

    let mut cmd = cargo_bin_cmd!("pulseox");
    cmd.args([
        "evaluate",
        "--ir",
        ir_path.to_str().expect("utf8 path"),
        "--red",
        red_path.to_str().expect("utf8 path"),
    ]);
    cmd.assert().failure();
    Ok(())
}
