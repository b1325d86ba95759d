use crate::metrics::spo2::{ratio_of_ratios, spo2_from_ratio};
use crate::signal::{VitalSigns, NOT_COMPUTED};
use thiserror::Error;

/// Configurable parameters for the PPG heart-rate / SpO2 estimator.
#[derive(Debug, Clone, Copy)]
pub struct PpgConfig {
    /// Sampling rate (Hz).
    pub fs: u32,
    /// Window duration (seconds); window length is `fs * sample_time_s`.
    pub sample_time_s: u32,
    /// Lower bound of the searchable heart-rate range (bpm).
    pub min_hr_bpm: u32,
    /// Upper bound of the searchable heart-rate range (bpm).
    pub max_hr_bpm: u32,
    /// Minimum `A(lag)/A(0)` ratio for a lag to count as periodic.
    pub min_autocorrelation_ratio: f64,
    /// Minimum normalized cross-correlation between the two channels.
    pub min_pearson_correlation: f64,
}

impl Default for PpgConfig {
    fn default() -> Self {
        Self {
            fs: 25,
            sample_time_s: 4,
            min_hr_bpm: 40,
            max_hr_bpm: 200,
            min_autocorrelation_ratio: 0.4,
            min_pearson_correlation: 0.6,
        }
    }
}

/// Rejected configurations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sampling rate and sample time must be non-zero")]
    EmptyWindow,
    #[error("heart-rate bounds must satisfy 0 < min < max")]
    HrBounds,
    #[error("heart-rate bounds leave no searchable lag inside a {window}-sample window")]
    PeriodOutsideWindow { window: usize },
}

/// Invalid evaluation windows. The estimator state is untouched when one of
/// these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("channel lengths differ: ir={ir}, red={red}")]
    LengthMismatch { ir: usize, red: usize },
    #[error("window holds {got} samples, configured length is {want}")]
    WrongLength { got: usize, want: usize },
}

/// Constants derived once from a validated [`PpgConfig`].
#[derive(Debug, Clone, Copy)]
struct WindowLayout {
    window: usize,
    fs60: u32,
    lowest_period: usize,
    highest_period: usize,
    mean_x: f64,
    sum_x2: f64,
}

impl WindowLayout {
    fn from_config(cfg: &PpgConfig) -> Result<Self, ConfigError> {
        if cfg.fs == 0 || cfg.sample_time_s == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if cfg.min_hr_bpm == 0 || cfg.min_hr_bpm >= cfg.max_hr_bpm {
            return Err(ConfigError::HrBounds);
        }
        let window = (cfg.fs * cfg.sample_time_s) as usize;
        let fs60 = cfg.fs * 60;
        let lowest_period = (fs60 / cfg.max_hr_bpm) as usize;
        let highest_period = (fs60 / cfg.min_hr_bpm) as usize;
        if lowest_period < 1 || highest_period >= window {
            return Err(ConfigError::PeriodOutsideWindow { window });
        }
        let mean_x = (window as f64 - 1.0) / 2.0;
        let sum_x2 = (0..window).map(|i| (i as f64 - mean_x).powi(2)).sum();
        Ok(Self {
            window,
            fs60,
            lowest_period,
            highest_period,
            mean_x,
            sum_x2,
        })
    }
}

/// Period carried between windows. The coarse scan runs within a single
/// `evaluate` call and never persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchState {
    /// No usable period yet; the next window starts with a coarse scan.
    NoHint,
    /// Lag accepted for the previous window, seeding the local search.
    Tracking(usize),
}

/// Stateful HR/SpO2 estimator over fixed-length windows of paired
/// infrared/red PPG samples.
///
/// Each [`evaluate`](VitalsEstimator::evaluate) call detrends both channels,
/// gates on their cross-correlation, locates the pulse period on the infrared
/// channel by autocorrelation (seeded by the previous window's period when
/// one is being tracked), and maps the red/infrared AC/DC ratio to SpO2.
#[derive(Debug, Clone)]
pub struct VitalsEstimator {
    cfg: PpgConfig,
    layout: WindowLayout,
    state: SearchState,
}

impl VitalsEstimator {
    pub fn new(cfg: PpgConfig) -> Result<Self, ConfigError> {
        let layout = WindowLayout::from_config(&cfg)?;
        Ok(Self {
            cfg,
            layout,
            state: SearchState::NoHint,
        })
    }

    /// Number of sample pairs each evaluation window must contain.
    pub fn window_len(&self) -> usize {
        self.layout.window
    }

    /// Evaluate one window. Degraded signals are reported through the
    /// validity flags of the result; only malformed input is an error.
    pub fn evaluate(&mut self, ir: &[u32], red: &[u32]) -> Result<VitalSigns, WindowError> {
        if ir.len() != red.len() {
            return Err(WindowError::LengthMismatch {
                ir: ir.len(),
                red: red.len(),
            });
        }
        if ir.len() != self.layout.window {
            return Err(WindowError::WrongLength {
                got: ir.len(),
                want: self.layout.window,
            });
        }

        let (ir_ac, ir_mean) = detrend(ir, &self.layout);
        let (red_ac, red_mean) = detrend(red, &self.layout);

        // RMS of both AC signals; the squared infrared value doubles as the
        // lag-0 reference energy for the periodicity ratio gate.
        let ir_rms = quantized_rms(&ir_ac);
        let red_rms = quantized_rms(&red_ac);
        let ir_power = ir_rms * ir_rms;
        let red_power = red_rms * red_rms;

        let correlation = cross_correlation(&ir_ac, &red_ac) / (ir_power * red_power).sqrt();

        let lag = if correlation >= self.cfg.min_pearson_correlation {
            let seed = match self.state {
                SearchState::Tracking(lag) => Some(lag),
                SearchState::NoHint => coarse_period_search(
                    &ir_ac,
                    &self.layout,
                    self.cfg.min_autocorrelation_ratio,
                    ir_power,
                ),
            };
            seed.and_then(|seed| {
                local_peak_search(
                    &ir_ac,
                    seed,
                    &self.layout,
                    self.cfg.min_autocorrelation_ratio,
                    ir_power,
                )
            })
        } else {
            None
        };

        let Some(lag) = lag else {
            self.state = SearchState::NoHint;
            return Ok(VitalSigns::none());
        };
        self.state = SearchState::Tracking(lag);

        let heart_rate = (self.layout.fs60 as f64 / lag as f64).round() as i32;
        let ratio = ratio_of_ratios(ir_rms, ir_mean, red_rms, red_mean);
        let (spo2, spo2_valid) = match spo2_from_ratio(ratio) {
            Some(pct) => (pct, true),
            None => (NOT_COMPUTED as f64, false),
        };

        Ok(VitalSigns {
            heart_rate,
            hr_valid: true,
            spo2,
            spo2_valid,
        })
    }
}

/// Remove the DC level and the least-squares linear trend from one channel.
/// Returns the detrended samples and the original mean (the channel's DC
/// level, needed for the SpO2 ratio).
fn detrend(samples: &[u32], layout: &WindowLayout) -> (Vec<f64>, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
    let mut y: Vec<f64> = samples.iter().map(|&s| s as f64 - mean).collect();
    // Closed-form slope against centered indices; the index axis is already
    // zero-mean, so no intercept term is needed.
    let beta = y
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 - layout.mean_x) * v)
        .sum::<f64>()
        / layout.sum_x2;
    for (i, v) in y.iter_mut().enumerate() {
        *v -= beta * (i as f64 - layout.mean_x);
    }
    (y, mean)
}

/// RMS of a detrended channel. The sum of squares is truncated to an integer
/// before the divide; the SpO2 calibration constants were fitted against this
/// quantization.
fn quantized_rms(x: &[f64]) -> f64 {
    let sumsq: f64 = x.iter().map(|v| v * v).sum();
    (sumsq.trunc() / x.len() as f64).sqrt()
}

/// Raw cross-correlation `Σ x_i·y_i / n` of two equally long channels.
fn cross_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    x.iter().zip(y).map(|(a, b)| a * b).sum::<f64>() / n
}

/// Autocorrelation `Σ x_i·x_{i+lag} / (n - lag)`, zero for lags beyond the
/// window.
fn autocorrelation(x: &[f64], lag: usize) -> f64 {
    if lag >= x.len() {
        return 0.0;
    }
    let n = x.len() - lag;
    let sum: f64 = x[..n].iter().zip(&x[lag..]).map(|(a, b)| a * b).sum();
    sum / n as f64
}

/// Coarse even-step scan for an initial period candidate, used when no
/// period is being tracked. Walks down the lag-0 lobe while the ratio stays
/// above threshold, then advances until the ratio crosses back above it.
fn coarse_period_search(
    x: &[f64],
    layout: &WindowLayout,
    min_ratio: f64,
    aut_lag0: f64,
) -> Option<usize> {
    let max_lag = layout.highest_period;
    let mut lag = layout.lowest_period;
    let mut aut_right = autocorrelation(x, lag);
    let mut aut = aut_right;

    if aut / aut_lag0 >= min_ratio {
        lag += 2;
        aut_right = autocorrelation(x, lag);
        while aut_right / aut_lag0 >= min_ratio && aut_right < aut && lag <= max_lag {
            aut = aut_right;
            lag += 2;
            aut_right = autocorrelation(x, lag);
        }
        if lag > max_lag {
            return None;
        }
    }

    lag += 2;
    aut_right = autocorrelation(x, lag);
    while aut_right / aut_lag0 < min_ratio && lag <= max_lag {
        lag += 2;
        aut_right = autocorrelation(x, lag);
    }
    if lag > max_lag {
        None
    } else {
        Some(lag)
    }
}

/// Hill-climb to the nearest autocorrelation peak around `seed`, left side
/// first. The first local maximum wins, which favors the true pulse period
/// over its harmonics. The accepted peak must clear the `A(lag)/A(0)` ratio
/// gate.
fn local_peak_search(
    x: &[f64],
    seed: usize,
    layout: &WindowLayout,
    min_ratio: f64,
    aut_lag0: f64,
) -> Option<usize> {
    let min_lag = layout.lowest_period;
    let max_lag = layout.highest_period;

    let seeded = autocorrelation(x, seed);
    let mut aut = seeded;
    let mut lag = seed;
    let mut left_limit_reached = false;

    let mut aut_left = aut;
    loop {
        aut = aut_left;
        lag -= 1;
        aut_left = autocorrelation(x, lag);
        if !(aut_left > aut && lag >= min_lag) {
            break;
        }
    }
    if lag < min_lag {
        left_limit_reached = true;
        lag = seed;
        aut = seeded;
    } else {
        lag += 1;
    }

    if lag == seed {
        let mut aut_right = aut;
        loop {
            aut = aut_right;
            lag += 1;
            aut_right = autocorrelation(x, lag);
            if !(aut_right > aut && lag <= max_lag) {
                break;
            }
        }
        if lag > max_lag {
            lag = 0;
        } else {
            lag -= 1;
        }
        if lag == seed && left_limit_reached {
            lag = 0;
        }
    }

    if aut / aut_lag0 < min_ratio {
        lag = 0;
    }
    if lag == 0 {
        None
    } else {
        Some(lag)
    }
}
