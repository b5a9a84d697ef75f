//! Live frame capture from network camera SDKs with a non-blocking polling
//! API.
//!
//! This crate bridges a callback-driven vendor camera SDK to consumers that
//! want to poll for decoded frames. The vendor side delivers a compressed
//! stream through callbacks on its own threads; this crate demultiplexes the
//! stream, drives the vendor decoder, converts each decoded YV12 frame to
//! packed BGR, and keeps the two freshest frames on a shelf the consumer
//! pops at its own pace.
//!
//! ## Architecture
//!
//! - [`Camera`] is the facade: `open`, `read`, `release`.
//! - [`sdk::DeviceSession`] and [`sdk::StreamDecoder`] are the seams to the
//!   vendor SDK; production code implements them over the vendor's FFI,
//!   tests use in-memory stubs.
//! - [`feeder::StreamFeeder`] classifies stream deliveries and feeds the
//!   decoder, stalling the network thread under backpressure rather than
//!   dropping bytes.
//! - [`buffer::FrameShelf`] holds at most two frames, evicting the oldest,
//!   and always hands out the newest first.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use netcam::{Camera, sdk::{DeviceSession, StreamDecoder}};
//!
//! fn capture(
//!     session: Arc<dyn DeviceSession>,
//!     decoder: Arc<dyn StreamDecoder>,
//! ) -> netcam::Result<()> {
//!     let mut camera = Camera::new(session, decoder);
//!     camera.open("192.168.1.64", "admin", "password")?;
//!     loop {
//!         if let Some(frame) = camera.read() {
//!             println!("{}x{} at {} ms", frame.width, frame.height, frame.timestamp_ms);
//!         }
//!     }
//! }
//! ```
//!
//! Dropping the [`Camera`] (or calling [`Camera::release`]) stops the
//! stream, releases the decode channel and logs out of the device.

pub mod buffer;
pub mod camera;
pub mod config;
pub mod convert;
pub mod error;
pub mod feeder;
pub mod sdk;
pub mod types;

#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;

pub use buffer::FrameShelf;
pub use camera::Camera;
pub use config::CameraConfig;
pub use convert::yv12_to_bgr;
pub use error::{CaptureError, Result};
pub use types::{
    DecodePort, DeviceInfo, LiveStreamOptions, PacketKind, PixelLayout, PlanarFrame, PlayHandle,
    RawPacket, UserHandle, VideoFrame,
};
