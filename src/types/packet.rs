//! Network packet types delivered by the device session callback.

use super::PlayHandle;

/// Classification of one network delivery from the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// Stream system header. Carries the codec parameters the decoder needs
    /// to open a decode session; arrives once per live stream, first.
    Header,
    /// Elementary stream payload bytes.
    Data,
}

/// One raw packet as handed to the stream feeder.
///
/// Ephemeral: exists only for the duration of a single callback invocation
/// from the network layer and is never stored. The `handle` identifies which
/// live stream the delivery belongs to, so feeders can discard deliveries
/// that race a teardown or reopen.
#[derive(Debug, Clone, Copy)]
pub struct RawPacket<'a> {
    /// Live-stream handle this packet was delivered for.
    pub handle: PlayHandle,
    /// Header or payload.
    pub kind: PacketKind,
    /// Packet bytes. May be empty; empty payloads are ignored.
    pub payload: &'a [u8],
}
