//! Collaborator traits for the vendor SDK surfaces.
//!
//! A capture pipeline talks to two external components: the *device session*
//! (network side: init, login, start/stop real-time streaming, logout,
//! cleanup) and the *stream decoder* (decode side: channel acquisition,
//! stream open, frame callback registration, playback, data submission).
//! Both are vendor libraries with C ABIs; this crate never binds them
//! directly. Instead these traits are the seam: application crates implement
//! them over the real SDK bindings, tests substitute scripted stubs.
//!
//! Callbacks are boxed closures carrying their own captured context. Each
//! [`Camera`](crate::Camera) registers closures that close over its own
//! state, so multiple cameras coexist in one process without any shared
//! globals.

use crate::types::{
    DecodePort, DeviceInfo, LiveStreamOptions, PlanarFrame, PlayHandle, RawPacket, UserHandle,
};
use crate::Result;

/// Callback receiving raw network packets on the SDK's network thread.
///
/// The packet borrows SDK-owned memory and must not escape the call.
pub type PacketSink = Box<dyn for<'a> Fn(RawPacket<'a>) + Send + Sync>;

/// Callback receiving decoded planar frames on the decoder's thread.
///
/// The frame borrows decoder-owned memory and must not escape the call; the
/// decoder reuses the buffer as soon as the callback returns.
pub type FrameSink = Box<dyn for<'a> Fn(PlanarFrame<'a>) + Send + Sync>;

/// Outcome of submitting payload bytes to the decoder's input.
///
/// `BufferFull` is backpressure, not an error: the decoder's bounded internal
/// buffer has no room right now and the same payload should be resubmitted
/// after a short delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// The decoder accepted the payload.
    Accepted,
    /// The decoder's input buffer is full; retry the identical payload.
    BufferFull,
}

/// Network-side device session collaborator.
///
/// Methods are expected to be cheap wrappers over the vendor SDK. Teardown
/// methods (`stop_live`, `logout`, `cleanup`) must tolerate "nothing to
/// release" — the session lifecycle calls them defensively.
pub trait DeviceSession: Send + Sync {
    /// Initialize SDK-level process resources. Idempotent in practice.
    fn init(&self) -> Result<()>;

    /// Authenticate against a device, returning the session handle and the
    /// device's self-description.
    fn login(
        &self,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<(UserHandle, DeviceInfo)>;

    /// Start real-time streaming on an authenticated session.
    ///
    /// `on_packet` is invoked on an SDK-owned thread for every network
    /// delivery (stream header or payload) until `stop_live`. The returned
    /// handle tags each delivery so late callbacks from a torn-down stream
    /// can be recognized and ignored.
    fn start_live(
        &self,
        user: UserHandle,
        options: &LiveStreamOptions,
        on_packet: PacketSink,
    ) -> Result<PlayHandle>;

    /// Stop a live stream. Tolerates an already-stopped handle.
    fn stop_live(&self, play: PlayHandle) -> Result<()>;

    /// Log out of the device. Tolerates an already-closed session.
    fn logout(&self, user: UserHandle) -> Result<()>;

    /// Release SDK-level process resources. Tolerates repeated calls.
    fn cleanup(&self) -> Result<()>;
}

/// Decode-side stream decoder collaborator.
///
/// Models the classic vendor play library: a pool of decode channels, each
/// opened with the stream's system header, fed compressed payloads, and
/// delivering raw frames through a registered callback.
pub trait StreamDecoder: Send + Sync {
    /// Acquire a free decode channel from the decoder's pool.
    fn acquire_channel(&self) -> Result<DecodePort>;

    /// Open a decode stream on a channel with the stream system header and
    /// the channel's internal buffer size in bytes.
    fn open_stream(&self, port: DecodePort, header: &[u8], buffer_size: usize) -> Result<()>;

    /// Register the decoded-frame callback for a channel.
    fn register_frame_sink(&self, port: DecodePort, sink: FrameSink) -> Result<()>;

    /// Start playback (decoding) on a channel.
    fn start(&self, port: DecodePort) -> Result<()>;

    /// Submit payload bytes to a channel's input.
    ///
    /// This is the backpressure point: a full input buffer is reported as
    /// [`FeedOutcome::BufferFull`], never as an error.
    fn feed(&self, port: DecodePort, payload: &[u8]) -> FeedOutcome;

    /// Stop and release a channel. Best-effort; tolerates a channel that is
    /// already closed.
    fn shutdown(&self, port: DecodePort) -> Result<()>;
}
