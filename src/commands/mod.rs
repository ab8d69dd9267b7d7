//! Application command handlers for orbscope.
//!
//! # Commands
//! - `live`: Live spectrum view of a capture device (default)
//! - `analyze`: Offline spectrum analysis of a WAV file
//! - `list_devices`: List input and loopback-capable output devices
//! - `logs`: Display recent log entries
//! - `config`: Open configuration file in user's preferred editor

pub mod analyze;
pub mod config;
pub mod list_devices;
pub mod live;
pub mod logs;

pub use analyze::handle_analyze;
pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use live::handle_live;
pub use logs::handle_logs;
