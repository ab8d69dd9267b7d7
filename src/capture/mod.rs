//! Audio capture for orbscope.
//!
//! The audio callback thread produces [`CapturePacket`]s; the render loop
//! drains them into its sample window once per frame.

pub mod device;
pub mod packet;

pub use device::AudioCapture;
