//! Streaming spectral analysis core.
//!
//! A rolling [`SampleWindow`] is refilled by capture packets, one channel is
//! extracted and transformed, and the result is reduced to magnitudes and
//! chart columns. Everything here is pure computation over in-memory data.

pub mod analyzer;
pub mod chart;
pub mod error;
pub mod reducer;
pub mod transform;
pub mod window;

pub use analyzer::{ChannelSelection, SpectrumAnalyzer};
pub use chart::ChartScale;
pub use transform::{PlannedTransform, TransformEngine};
pub use window::SampleWindow;
