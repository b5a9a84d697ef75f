//! Core types for camera frame data.
//!
//! This module provides the foundational data structures flowing through the
//! capture pipeline:
//!
//! - [`RawPacket`] is one network delivery from the device (stream header or
//!   payload bytes), borrowed for the duration of a single callback.
//! - [`PlanarFrame`] is one decoded YV12 frame, borrowed from decoder-owned
//!   memory inside the frame callback.
//! - [`VideoFrame`] is the owned, packed BGR image handed to the consumer.
//! - The handle newtypes ([`UserHandle`], [`PlayHandle`], [`DecodePort`]) wrap
//!   the opaque integers vendor SDKs use for sessions, live streams, and
//!   decode channels.
//!
//! Ownership follows the pipeline direction: borrowed data never outlives its
//! callback; `VideoFrame` is constructed once per decoded frame and is
//! independent of any SDK memory from then on.

mod frame;
mod packet;
mod session;

pub use frame::{PixelLayout, PlanarFrame, VideoFrame};
pub use packet::{PacketKind, RawPacket};
pub use session::{DecodePort, DeviceInfo, LiveStreamOptions, PlayHandle, UserHandle};
