//! Scriptable stand-ins for the SDK collaborator traits.
//!
//! [`StubSession`] and [`StubDecoder`] implement [`DeviceSession`] and
//! [`StreamDecoder`] entirely in memory. Tests script failures up front,
//! drive the capture pipeline by injecting packets and decoded frames, and
//! assert on the recorded call history afterwards.

use std::sync::Mutex;

use crate::error::{CaptureError, Result};
use crate::sdk::{DeviceSession, FeedOutcome, FrameSink, PacketSink, StreamDecoder};
use crate::types::{
    DecodePort, DeviceInfo, LiveStreamOptions, PacketKind, PixelLayout, PlanarFrame, PlayHandle,
    RawPacket, UserHandle,
};

#[derive(Default)]
struct SessionState {
    fail_init: bool,
    fail_login: bool,
    fail_start_live: bool,
    next_user: i64,
    next_play: i64,
    current_play: Option<PlayHandle>,
    calls: Vec<String>,
}

/// In-memory [`DeviceSession`] with scriptable failures and packet injection.
#[derive(Default)]
pub struct StubSession {
    state: Mutex<SessionState>,
    sink: Mutex<Option<PacketSink>>,
}

impl StubSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `init` fail.
    pub fn fail_init(&self) {
        self.state.lock().unwrap().fail_init = true;
    }

    /// Make the next `login` fail.
    pub fn fail_login(&self) {
        self.state.lock().unwrap().fail_login = true;
    }

    /// Make the next `start_live` fail.
    pub fn fail_start_live(&self) {
        self.state.lock().unwrap().fail_start_live = true;
    }

    /// Names of every trait call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// The live-stream handle issued by the most recent `start_live`.
    pub fn current_play(&self) -> Option<PlayHandle> {
        self.state.lock().unwrap().current_play
    }

    /// Deliver a stream header through the registered packet callback.
    pub fn push_header(&self, payload: &[u8]) {
        self.push(PacketKind::Header, payload);
    }

    /// Deliver a payload packet through the registered packet callback.
    pub fn push_data(&self, payload: &[u8]) {
        self.push(PacketKind::Data, payload);
    }

    /// Deliver a packet carrying an arbitrary (possibly stale) handle.
    pub fn push_with_handle(&self, handle: PlayHandle, kind: PacketKind, payload: &[u8]) {
        let sink = self.sink.lock().unwrap();
        if let Some(sink) = sink.as_ref() {
            sink(RawPacket { handle, kind, payload });
        }
    }

    fn push(&self, kind: PacketKind, payload: &[u8]) {
        let handle = self
            .state
            .lock()
            .unwrap()
            .current_play
            .expect("push requires an active live stream");
        self.push_with_handle(handle, kind, payload);
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

impl DeviceSession for StubSession {
    fn init(&self) -> Result<()> {
        self.record("init");
        if self.state.lock().unwrap().fail_init {
            return Err(CaptureError::session("init", "scripted init failure"));
        }
        Ok(())
    }

    fn login(
        &self,
        _host: &str,
        _port: u16,
        _username: &str,
        _password: &str,
    ) -> Result<(UserHandle, DeviceInfo)> {
        self.record("login");
        let mut state = self.state.lock().unwrap();
        if state.fail_login {
            return Err(CaptureError::session("login", "scripted login failure"));
        }
        state.next_user += 1;
        let info = DeviceInfo {
            serial_number: "STUB0001".to_string(),
            channel_count: 1,
            start_channel: 1,
        };
        Ok((UserHandle(state.next_user), info))
    }

    fn start_live(
        &self,
        _user: UserHandle,
        _options: &LiveStreamOptions,
        on_packet: PacketSink,
    ) -> Result<PlayHandle> {
        self.record("start_live");
        let mut state = self.state.lock().unwrap();
        if state.fail_start_live {
            return Err(CaptureError::session("stream-start", "scripted stream-start failure"));
        }
        state.next_play += 1;
        let play = PlayHandle(state.next_play);
        state.current_play = Some(play);
        drop(state);
        *self.sink.lock().unwrap() = Some(on_packet);
        Ok(play)
    }

    fn stop_live(&self, _play: PlayHandle) -> Result<()> {
        self.record("stop_live");
        self.state.lock().unwrap().current_play = None;
        *self.sink.lock().unwrap() = None;
        Ok(())
    }

    fn logout(&self, _user: UserHandle) -> Result<()> {
        self.record("logout");
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        self.record("cleanup");
        Ok(())
    }
}

#[derive(Default)]
struct DecoderState {
    fail_acquire: bool,
    fail_open: bool,
    fail_register: bool,
    fail_start: bool,
    reject_feeds: u32,
    next_port: i32,
    started: bool,
    opened: Vec<(DecodePort, Vec<u8>, usize)>,
    feeds: Vec<(DecodePort, Vec<u8>)>,
    accepted: Vec<Vec<u8>>,
    shutdowns: Vec<DecodePort>,
}

/// In-memory [`StreamDecoder`] with scriptable failures, backpressure
/// scripting and decoded-frame injection.
#[derive(Default)]
pub struct StubDecoder {
    state: Mutex<DecoderState>,
    sink: Mutex<Option<FrameSink>>,
}

impl StubDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `acquire_channel` fail.
    pub fn fail_acquire(&self) {
        self.state.lock().unwrap().fail_acquire = true;
    }

    /// Make the next `open_stream` fail.
    pub fn fail_open(&self) {
        self.state.lock().unwrap().fail_open = true;
    }

    /// Make the next `register_frame_sink` fail.
    pub fn fail_register(&self) {
        self.state.lock().unwrap().fail_register = true;
    }

    /// Make the next `start` fail.
    pub fn fail_start(&self) {
        self.state.lock().unwrap().fail_start = true;
    }

    /// Answer the next `count` feeds with [`FeedOutcome::BufferFull`].
    pub fn reject_next_feeds(&self, count: u32) {
        self.state.lock().unwrap().reject_feeds = count;
    }

    /// Every `open_stream` call: port, header bytes, buffer size.
    pub fn opened_streams(&self) -> Vec<(DecodePort, Vec<u8>, usize)> {
        self.state.lock().unwrap().opened.clone()
    }

    /// Whether `start` has been called successfully.
    pub fn playback_started(&self) -> bool {
        self.state.lock().unwrap().started
    }

    /// Every `feed` call, accepted or rejected.
    pub fn feed_attempts(&self) -> Vec<(DecodePort, Vec<u8>)> {
        self.state.lock().unwrap().feeds.clone()
    }

    /// Payloads the decoder accepted, in order.
    pub fn accepted_payloads(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().accepted.clone()
    }

    /// Every port handed to `shutdown`.
    pub fn shutdown_ports(&self) -> Vec<DecodePort> {
        self.state.lock().unwrap().shutdowns.clone()
    }

    /// Push a decoded frame through the registered frame sink.
    ///
    /// Panics if no sink is registered yet.
    pub fn emit_frame(&self, layout: PixelLayout, width: u32, height: u32, timestamp_ms: u64, data: &[u8]) {
        let sink = self.sink.lock().unwrap();
        let sink = sink.as_ref().expect("emit_frame requires a registered frame sink");
        sink(PlanarFrame { layout, width, height, timestamp_ms, data });
    }
}

impl StreamDecoder for StubDecoder {
    fn acquire_channel(&self) -> Result<DecodePort> {
        let mut state = self.state.lock().unwrap();
        if state.fail_acquire {
            return Err(CaptureError::decoder("acquire-channel", "scripted acquisition failure"));
        }
        state.next_port += 1;
        Ok(DecodePort(state.next_port))
    }

    fn open_stream(&self, port: DecodePort, header: &[u8], buffer_size: usize) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_open {
            return Err(CaptureError::decoder("open-stream", "scripted open failure"));
        }
        state.opened.push((port, header.to_vec(), buffer_size));
        Ok(())
    }

    fn register_frame_sink(&self, _port: DecodePort, sink: FrameSink) -> Result<()> {
        if self.state.lock().unwrap().fail_register {
            return Err(CaptureError::decoder("register-sink", "scripted registration failure"));
        }
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    fn start(&self, _port: DecodePort) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_start {
            return Err(CaptureError::decoder("start", "scripted start failure"));
        }
        state.started = true;
        Ok(())
    }

    fn feed(&self, port: DecodePort, payload: &[u8]) -> FeedOutcome {
        let mut state = self.state.lock().unwrap();
        state.feeds.push((port, payload.to_vec()));
        if state.reject_feeds > 0 {
            state.reject_feeds -= 1;
            return FeedOutcome::BufferFull;
        }
        state.accepted.push(payload.to_vec());
        FeedOutcome::Accepted
    }

    fn shutdown(&self, port: DecodePort) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.shutdowns.push(port);
        *self.sink.lock().unwrap() = None;
        Ok(())
    }
}
