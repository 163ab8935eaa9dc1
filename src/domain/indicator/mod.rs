//! Envelope indicators.
//!
//! - [`rolling`]: fixed-count trailing window statistics
//! - [`adaptive_envelope`]: volatility-scaled moving-average envelope
//! - [`fixed_envelope`]: constant-percentage moving-average envelope

pub mod adaptive_envelope;
pub mod fixed_envelope;
pub mod rolling;

pub use adaptive_envelope::{EnvelopeParams, EnvelopeRecord};
pub use fixed_envelope::FixedEnvelopeRecord;
