pub mod smoothing;
pub mod spo2;
