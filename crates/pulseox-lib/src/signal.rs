use serde::{Deserialize, Serialize};

/// Sentinel reported in place of a value that could not be computed.
pub const NOT_COMPUTED: i32 = -999;

/// One full evaluation window of paired PPG intensities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpgWindow {
    /// Infrared channel, raw ADC counts
    pub ir: Vec<u32>,
    /// Red channel, raw ADC counts
    pub red: Vec<u32>,
}

impl PpgWindow {
    pub fn len(&self) -> usize {
        self.ir.len()
    }
    pub fn is_empty(&self) -> bool {
        self.ir.is_empty()
    }
}

/// Per-window estimation result. Invalid fields hold [`NOT_COMPUTED`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    /// Heart rate in bpm
    pub heart_rate: i32,
    pub hr_valid: bool,
    /// Oxygen saturation in percent
    pub spo2: f64,
    pub spo2_valid: bool,
}

impl VitalSigns {
    /// Result for a window that produced no usable measurement.
    pub fn none() -> Self {
        Self {
            heart_rate: NOT_COMPUTED,
            hr_valid: false,
            spo2: NOT_COMPUTED as f64,
            spo2_valid: false,
        }
    }
}

/// Accumulates streamed sample pairs and yields a [`PpgWindow`] once the
/// configured window length has been collected.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    window: usize,
    ir: Vec<u32>,
    red: Vec<u32>,
}

impl WindowBuffer {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            ir: Vec::with_capacity(window),
            red: Vec::with_capacity(window),
        }
    }

    /// Append one sample pair. Returns the completed window, clearing the
    /// buffer, when the window length is reached.
    pub fn push(&mut self, ir: u32, red: u32) -> Option<PpgWindow> {
        self.ir.push(ir);
        self.red.push(red);
        if self.ir.len() < self.window {
            return None;
        }
        Some(PpgWindow {
            ir: std::mem::take(&mut self.ir),
            red: std::mem::take(&mut self.red),
        })
    }

    /// Drop buffered samples. Call after a gap in the input stream; a window
    /// must contain contiguous samples, never padding.
    pub fn reset(&mut self) {
        self.ir.clear();
        self.red.clear();
    }

    pub fn len(&self) -> usize {
        self.ir.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ir.is_empty()
    }
}
