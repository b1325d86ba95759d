//! Empirical ratio-of-ratios SpO2 calibration for MAX3010x-class optical
//! front ends. The polynomial coefficients and the applicable ratio range
//! are calibration data, not tunables.

/// Lower bound of the applicable ratio range (exclusive).
pub const RATIO_MIN: f64 = 0.02;
/// Upper bound of the applicable ratio range (exclusive).
pub const RATIO_MAX: f64 = 1.84;

const CAL_A: f64 = -45.060;
const CAL_B: f64 = 30.354;
const CAL_C: f64 = 93.645;

/// Ratio of red to infrared pulsatile fractions:
/// `(ac_red / dc_red) / (ac_ir / dc_ir)`.
pub fn ratio_of_ratios(ir_ac: f64, ir_dc: f64, red_ac: f64, red_dc: f64) -> f64 {
    (red_ac * ir_dc) / (ir_ac * red_dc)
}

/// Map a ratio to an SpO2 percentage. `None` outside the open interval
/// (`RATIO_MIN`, `RATIO_MAX`) where the calibration does not apply.
pub fn spo2_from_ratio(ratio: f64) -> Option<f64> {
    if ratio > RATIO_MIN && ratio < RATIO_MAX {
        Some((CAL_A * ratio + CAL_B) * ratio + CAL_C)
    } else {
        None
    }
}
