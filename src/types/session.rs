//! Opaque SDK handles and session metadata.

/// Handle of an authenticated device session, as returned by login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserHandle(pub i64);

/// Handle of one live real-time stream started on a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayHandle(pub i64);

/// Handle of one decode channel inside the vendor stream decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodePort(pub i32);

/// Device metadata reported at login time.
///
/// Mirrors the information network video recorders and IP cameras return in
/// their login response: enough to pick a channel and identify the unit in
/// logs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    /// Device serial number as reported by the firmware.
    pub serial_number: String,
    /// Number of analog/IP channels the device exposes.
    pub channel_count: u8,
    /// First valid channel number (devices commonly start at 1).
    pub start_channel: u8,
}

/// Options for starting a live real-time stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveStreamOptions {
    /// Channel to stream. Single-lens cameras expose channel 1.
    pub channel: u32,
    /// Vendor link mode (0 = TCP main stream on most SDKs).
    pub link_mode: u32,
    /// Optional native window handle for SDK-side rendering. `None` keeps
    /// the SDK from drawing anywhere and routes frames to the callback only.
    pub window: Option<usize>,
}

impl Default for LiveStreamOptions {
    fn default() -> Self {
        Self { channel: 1, link_mode: 0, window: None }
    }
}
