//! Terminal user interface: the live spectrum view and the error screen.

pub mod error;
pub mod spectrum_view;

pub use error::ErrorScreen;
pub use spectrum_view::{SessionInfo, SpectrumTui, ViewCommand};
