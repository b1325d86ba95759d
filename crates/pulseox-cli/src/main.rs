use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pulseox_lib::{
    detectors::ppg::{PpgConfig, VitalsEstimator},
    io::{recording as recording_io, text as text_io},
    metrics::smoothing::VitalsSmoother,
    signal::{VitalSigns, WindowBuffer},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::{
    f64::consts::PI,
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

#[derive(Parser)]
#[command(
    name = "pulseox",
    version,
    about = "PPG heart-rate and SpO2 estimation tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate HR/SpO2 per window from a recorded two-channel PPG stream
    Evaluate {
        /// Headered CSV holding both channels
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value = "ir")]
        ir_column: String,
        #[arg(long, default_value = "red")]
        red_column: String,
        /// Newline-delimited infrared series (paired with --red)
        #[arg(long)]
        ir: Option<PathBuf>,
        /// Newline-delimited red series (paired with --ir)
        #[arg(long)]
        red: Option<PathBuf>,
        #[arg(long, default_value_t = 25)]
        fs: u32,
        #[arg(long, default_value_t = 4)]
        sample_time_s: u32,
        #[arg(long, default_value_t = 40)]
        min_hr: u32,
        #[arg(long, default_value_t = 200)]
        max_hr: u32,
        #[arg(long, default_value_t = 0.4)]
        min_autocorrelation_ratio: f64,
        #[arg(long, default_value_t = 0.6)]
        min_pearson_correlation: f64,
        /// Append trailing averages over the last N valid readings
        #[arg(long)]
        smooth: Option<usize>,
    },
    /// Generate a synthetic two-channel PPG recording as CSV
    Simulate {
        #[arg(long, default_value_t = 25)]
        fs: u32,
        #[arg(long, default_value_t = 60)]
        seconds: u32,
        #[arg(long, default_value_t = 75.0)]
        bpm: f64,
        #[arg(long, default_value_t = 1000.0)]
        ir_dc: f64,
        #[arg(long, default_value_t = 80.0)]
        ir_amplitude: f64,
        #[arg(long, default_value_t = 1000.0)]
        red_dc: f64,
        #[arg(long, default_value_t = 50.0)]
        red_amplitude: f64,
        /// Uniform noise amplitude added to both channels
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long)]
        seed: Option<u64>,
        /// Output path; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Evaluate {
            input,
            ir_column,
            red_column,
            ir,
            red,
            fs,
            sample_time_s,
            min_hr,
            max_hr,
            min_autocorrelation_ratio,
            min_pearson_correlation,
            smooth,
        } => {
            let cfg = PpgConfig {
                fs,
                sample_time_s,
                min_hr_bpm: min_hr,
                max_hr_bpm: max_hr,
                min_autocorrelation_ratio,
                min_pearson_correlation,
            };
            let (ir, red) = load_recording(
                input.as_deref(),
                &ir_column,
                &red_column,
                ir.as_deref(),
                red.as_deref(),
            )?;
            cmd_evaluate(cfg, &ir, &red, smooth)?
        }
        Commands::Simulate {
            fs,
            seconds,
            bpm,
            ir_dc,
            ir_amplitude,
            red_dc,
            red_amplitude,
            noise,
            seed,
            out,
        } => cmd_simulate(
            fs,
            seconds,
            bpm,
            ir_dc,
            ir_amplitude,
            red_dc,
            red_amplitude,
            noise,
            seed,
            out.as_deref(),
        )?,
    }
    Ok(())
}

#[derive(Serialize)]
struct WindowReport {
    window: usize,
    #[serde(flatten)]
    vitals: VitalSigns,
    #[serde(skip_serializing_if = "Option::is_none")]
    hr_smoothed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spo2_smoothed: Option<f64>,
}

fn load_recording(
    input: Option<&Path>,
    ir_column: &str,
    red_column: &str,
    ir: Option<&Path>,
    red: Option<&Path>,
) -> Result<(Vec<u32>, Vec<u32>)> {
    if let Some(path) = input {
        return recording_io::read_recording_csv(path, ir_column, red_column);
    }
    match (ir, red) {
        (Some(ir_path), Some(red_path)) => {
            let ir = text_io::read_u32_series(ir_path)?;
            let red = text_io::read_u32_series(red_path)?;
            if ir.len() != red.len() {
                bail!(
                    "channel files differ in length: ir={}, red={}",
                    ir.len(),
                    red.len()
                );
            }
            Ok((ir, red))
        }
        _ => bail!("provide --input, or both --ir and --red"),
    }
}

fn cmd_evaluate(cfg: PpgConfig, ir: &[u32], red: &[u32], smooth: Option<usize>) -> Result<()> {
    let mut estimator = VitalsEstimator::new(cfg)?;
    let mut buffer = WindowBuffer::new(estimator.window_len());
    let mut smoother = smooth.map(VitalsSmoother::new);
    let mut index = 0usize;
    for (&iv, &rv) in ir.iter().zip(red.iter()) {
        let Some(window) = buffer.push(iv, rv) else {
            continue;
        };
        let vitals = estimator.evaluate(&window.ir, &window.red)?;
        if vitals.hr_valid && vitals.spo2_valid {
            log::info!(
                "window {index}: HR {} SpO2 {:.1}",
                vitals.heart_rate,
                vitals.spo2
            );
        }
        if let Some(smoother) = smoother.as_mut() {
            smoother.observe(&vitals);
        }
        let report = WindowReport {
            window: index,
            vitals,
            hr_smoothed: smoother.as_ref().and_then(|s| s.heart_rate()),
            spo2_smoothed: smoother.as_ref().and_then(|s| s.spo2()),
        };
        println!("{}", serde_json::to_string(&report)?);
        index += 1;
    }
    if !buffer.is_empty() {
        log::debug!("{} trailing samples short of a window, ignored", buffer.len());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_simulate(
    fs: u32,
    seconds: u32,
    bpm: f64,
    ir_dc: f64,
    ir_amplitude: f64,
    red_dc: f64,
    red_amplitude: f64,
    noise: f64,
    seed: Option<u64>,
    out: Option<&Path>,
) -> Result<()> {
    if fs == 0 || seconds == 0 {
        bail!("fs and seconds must be non-zero");
    }
    if bpm <= 0.0 {
        bail!("bpm must be positive");
    }
    let seed = seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });
    let mut rng = StdRng::seed_from_u64(seed);
    let period = fs as f64 * 60.0 / bpm;

    let target: Box<dyn Write> = match out {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = csv::WriterBuilder::new().from_writer(target);
    writer.write_record(["ir", "red"])?;
    for i in 0..(fs as u64 * seconds as u64) {
        let phase = (2.0 * PI * i as f64 / period).sin();
        let ir = synth_sample(ir_dc, ir_amplitude, phase, noise, &mut rng);
        let red = synth_sample(red_dc, red_amplitude, phase, noise, &mut rng);
        writer.write_record([ir.to_string(), red.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn synth_sample(dc: f64, amplitude: f64, phase: f64, noise: f64, rng: &mut StdRng) -> u32 {
    let jitter = if noise > 0.0 {
        rng.gen_range(-noise..noise)
    } else {
        0.0
    };
    (dc + amplitude * phase + jitter).max(0.0).round() as u32
}
