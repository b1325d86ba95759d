use crate::signal::VitalSigns;
use std::collections::VecDeque;

/// Fixed-capacity trailing average over the most recent values.
#[derive(Debug, Clone)]
pub struct TrailingAverage {
    capacity: usize,
    values: VecDeque<f64>,
}

impl TrailingAverage {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Average of the values currently held, `None` when nothing has been
    /// recorded yet.
    pub fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Trailing averages over the valid readings of a result stream. Invalid
/// fields are skipped, so the averages only ever mix real measurements.
#[derive(Debug, Clone)]
pub struct VitalsSmoother {
    hr: TrailingAverage,
    spo2: TrailingAverage,
}

impl VitalsSmoother {
    pub fn new(window: usize) -> Self {
        Self {
            hr: TrailingAverage::new(window),
            spo2: TrailingAverage::new(window),
        }
    }

    pub fn observe(&mut self, vitals: &VitalSigns) {
        if vitals.hr_valid {
            self.hr.push(vitals.heart_rate as f64);
        }
        if vitals.spo2_valid {
            self.spo2.push(vitals.spo2);
        }
    }

    pub fn heart_rate(&self) -> Option<f64> {
        self.hr.average()
    }

    pub fn spo2(&self) -> Option<f64> {
        self.spo2.average()
    }
}
