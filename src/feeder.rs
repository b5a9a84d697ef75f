//! Stream demultiplexing and the decode-callback sink.
//!
//! [`StreamFeeder`] is the bridge between the device session's packet
//! callback and the vendor stream decoder. It classifies each network
//! delivery (stream header vs. payload), opens a decode session on the first
//! usable header, and pushes payload bytes into the decoder with a blocking
//! retry under backpressure. [`DecodeSink`] is the other half of the bridge:
//! it receives decoded planar frames from the decoder, converts them to
//! packed BGR, and publishes them onto the shared [`FrameShelf`].
//!
//! Both run on SDK-owned threads. The feeder may stall its (network) thread
//! indefinitely while the decoder's input is full — that is the contract:
//! payload bytes are never dropped at this stage. The sink never blocks on
//! the consumer; its only shared-state interaction is one `publish` per
//! frame.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::buffer::FrameShelf;
use crate::convert;
use crate::sdk::{FeedOutcome, FrameSink, StreamDecoder};
use crate::types::{DecodePort, PacketKind, PixelLayout, PlanarFrame, PlayHandle, RawPacket};

/// Decode-channel internal buffer size handed to `open_stream`.
pub const STREAM_BUFFER_SIZE: usize = 1024 * 1024;

/// Fixed delay between resubmissions of a payload the decoder rejected.
pub const BACKPRESSURE_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Feeder lifecycle. One feeder is created per `open` and discarded on
/// release; `Faulted` is therefore terminal until the next open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeederState {
    /// Created but not yet bound to a live-stream handle.
    Idle,
    /// Bound; waiting for the stream system header.
    AwaitingHeader { play: PlayHandle },
    /// Decode session established; payload packets flow to the decoder.
    Streaming { play: PlayHandle, port: DecodePort },
    /// Decoder-open failed; all further packets for this session are dropped.
    Faulted,
}

/// What `handle_packet` decided to do, resolved under the state lock and
/// executed outside it where the work can block.
enum Action<'a> {
    OpenDecodeSession { play: PlayHandle, header: &'a [u8] },
    Feed { play: PlayHandle, port: DecodePort, payload: &'a [u8] },
    Ignore,
}

/// Packet classification state machine with backpressure handling.
pub struct StreamFeeder {
    decoder: Arc<dyn StreamDecoder>,
    shelf: Arc<FrameShelf>,
    state: Mutex<FeederState>,
}

impl StreamFeeder {
    /// Create an idle feeder publishing into `shelf` through `decoder`.
    pub fn new(decoder: Arc<dyn StreamDecoder>, shelf: Arc<FrameShelf>) -> Self {
        Self { decoder, shelf, state: Mutex::new(FeederState::Idle) }
    }

    /// Bind the feeder to the live-stream handle returned by the device
    /// session. Until bound, every delivery is ignored.
    pub fn bind(&self, play: PlayHandle) {
        let mut state = self.state.lock().expect("feeder state poisoned");
        debug!(play = play.0, "feeder bound, awaiting stream header");
        *state = FeederState::AwaitingHeader { play };
    }

    /// Tear down the feeder: release the decode channel (if any) and stop
    /// reacting to packets. Best-effort and idempotent.
    pub fn stop(&self) {
        let mut state = self.state.lock().expect("feeder state poisoned");
        let prev = std::mem::replace(&mut *state, FeederState::Idle);
        if let FeederState::Streaming { port, .. } = prev {
            if let Err(error) = self.decoder.shutdown(port) {
                warn!(port = port.0, %error, "decode channel shutdown failed");
            }
        }
    }

    /// Whether a decode session is currently established.
    pub fn is_streaming(&self) -> bool {
        matches!(
            *self.state.lock().expect("feeder state poisoned"),
            FeederState::Streaming { .. }
        )
    }

    /// Whether the feeder hit an unrecoverable decoder-open failure.
    pub fn is_faulted(&self) -> bool {
        matches!(*self.state.lock().expect("feeder state poisoned"), FeederState::Faulted)
    }

    /// Entry point for the device session's packet callback.
    ///
    /// Runs on the SDK's network thread. Deliveries carrying a stale
    /// live-stream handle (teardown/reopen races) are ignored
    /// unconditionally, as are deliveries that do not fit the current state.
    pub fn handle_packet(&self, packet: RawPacket<'_>) {
        let action = {
            let state = self.state.lock().expect("feeder state poisoned");
            self.classify(&state, &packet)
        };

        match action {
            Action::OpenDecodeSession { play, header } => self.open_decode_session(play, header),
            Action::Feed { play, port, payload } => self.feed_until_accepted(play, port, payload),
            Action::Ignore => {}
        }
    }

    fn classify<'a>(&self, state: &FeederState, packet: &RawPacket<'a>) -> Action<'a> {
        match (*state, packet.kind) {
            (FeederState::AwaitingHeader { play }, PacketKind::Header)
                if packet.handle == play =>
            {
                Action::OpenDecodeSession { play, header: packet.payload }
            }
            (FeederState::Streaming { play, port }, PacketKind::Data)
                if packet.handle == play =>
            {
                if packet.payload.is_empty() {
                    trace!("empty payload packet ignored");
                    Action::Ignore
                } else {
                    Action::Feed { play, port, payload: packet.payload }
                }
            }
            (FeederState::AwaitingHeader { play }, PacketKind::Data) if packet.handle == play => {
                trace!("payload before stream header ignored");
                Action::Ignore
            }
            (FeederState::Streaming { play, .. }, PacketKind::Header)
                if packet.handle == play =>
            {
                trace!("duplicate stream header ignored");
                Action::Ignore
            }
            _ => {
                trace!(handle = packet.handle.0, "packet for stale or unbound stream ignored");
                Action::Ignore
            }
        }
    }

    /// Open the decode pipeline off the stream system header: acquire a
    /// channel, open the stream, register the frame sink, start playback.
    /// Any failure faults the session (fatal for this session, not the
    /// process).
    fn open_decode_session(&self, play: PlayHandle, header: &[u8]) {
        let mut state = self.state.lock().expect("feeder state poisoned");

        // Re-check: a teardown may have won the race while unlocked.
        if *state != (FeederState::AwaitingHeader { play }) {
            return;
        }

        let port = match self.decoder.acquire_channel() {
            Ok(port) => port,
            Err(error) => {
                warn!(%error, "decode channel acquisition failed, session faulted");
                *state = FeederState::Faulted;
                return;
            }
        };

        if header.is_empty() {
            // Nothing to open with yet; hand the channel back and keep
            // waiting for a header that carries the codec parameters.
            debug!("stream header without payload, keeping channel pool clean");
            let _ = self.decoder.shutdown(port);
            return;
        }

        let sink = DecodeSink::new(Arc::clone(&self.shelf));
        let opened = self
            .decoder
            .open_stream(port, header, STREAM_BUFFER_SIZE)
            .and_then(|()| self.decoder.register_frame_sink(port, sink.into_frame_sink()))
            .and_then(|()| self.decoder.start(port));

        match opened {
            Ok(()) => {
                info!(play = play.0, port = port.0, "decode session established");
                *state = FeederState::Streaming { play, port };
            }
            Err(error) => {
                warn!(port = port.0, %error, "decoder open failed, session faulted");
                let _ = self.decoder.shutdown(port);
                *state = FeederState::Faulted;
            }
        }
    }

    /// Submit one payload, retrying the identical bytes on backpressure.
    ///
    /// There is no retry cap: a permanently blocked decoder stalls the
    /// network thread forever, an accepted trade against silent data loss.
    /// The single exit besides acceptance is session teardown — once this
    /// feeder no longer streams on `(play, port)` the payload is stale and
    /// abandoned, which is the stale-handle guard applied mid-retry.
    fn feed_until_accepted(&self, play: PlayHandle, port: DecodePort, payload: &[u8]) {
        let mut rejections = 0u64;
        loop {
            match self.decoder.feed(port, payload) {
                FeedOutcome::Accepted => {
                    if rejections > 0 {
                        debug!(rejections, len = payload.len(), "payload accepted after backpressure");
                    }
                    return;
                }
                FeedOutcome::BufferFull => {
                    rejections += 1;
                    if rejections == 1 {
                        trace!(len = payload.len(), "decoder input full, retrying");
                    }
                    std::thread::sleep(BACKPRESSURE_RETRY_DELAY);

                    let state = self.state.lock().expect("feeder state poisoned");
                    if *state != (FeederState::Streaming { play, port }) {
                        debug!(rejections, "session torn down during backpressure, payload abandoned");
                        return;
                    }
                }
            }
        }
    }
}

/// The decoder's raw-frame callback target.
///
/// Filters by pixel layout, converts, publishes. Every failure inside the
/// callback degrades to "frame skipped": an unwind across the decoder's C
/// boundary would corrupt its internal state, so nothing propagates from
/// here.
pub struct DecodeSink {
    shelf: Arc<FrameShelf>,
}

impl DecodeSink {
    /// Create a sink publishing into `shelf`.
    pub fn new(shelf: Arc<FrameShelf>) -> Self {
        Self { shelf }
    }

    /// Box this sink into the callback shape the decoder trait expects.
    pub fn into_frame_sink(self) -> FrameSink {
        Box::new(move |frame| self.on_frame(frame))
    }

    /// Handle one decoded frame. Runs on the decoder's thread.
    pub fn on_frame(&self, frame: PlanarFrame<'_>) {
        if frame.layout != PixelLayout::Yv12 {
            // Auxiliary frame types (audio, semi-planar variants) are not
            // processed here; skipping them is normal operation.
            trace!(layout = ?frame.layout, "non-YV12 frame skipped");
            return;
        }

        match convert::yv12_to_bgr(&frame) {
            Ok(video) => {
                trace!(width = video.width, height = video.height, "frame published");
                self.shelf.publish(video);
            }
            Err(error) => {
                warn!(%error, "dropping malformed decoded frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubDecoder;
    use crate::types::PlanarFrame;

    fn harness() -> (StreamFeeder, Arc<StubDecoder>, Arc<FrameShelf>) {
        let decoder = Arc::new(StubDecoder::new());
        let shelf = Arc::new(FrameShelf::new());
        let feeder =
            StreamFeeder::new(Arc::clone(&decoder) as Arc<dyn StreamDecoder>, Arc::clone(&shelf));
        (feeder, decoder, shelf)
    }

    fn header(handle: i64, payload: &[u8]) -> RawPacket<'_> {
        RawPacket { handle: PlayHandle(handle), kind: PacketKind::Header, payload }
    }

    fn data(handle: i64, payload: &[u8]) -> RawPacket<'_> {
        RawPacket { handle: PlayHandle(handle), kind: PacketKind::Data, payload }
    }

    #[test]
    fn header_establishes_decode_session() {
        let (feeder, decoder, _) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"sps-pps"));

        assert!(feeder.is_streaming());
        let opened = decoder.opened_streams();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].1, b"sps-pps".to_vec());
        assert_eq!(opened[0].2, STREAM_BUFFER_SIZE);
        assert!(decoder.playback_started());
    }

    #[test]
    fn empty_header_keeps_waiting_and_releases_channel() {
        let (feeder, decoder, _) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b""));

        assert!(!feeder.is_streaming());
        assert!(!feeder.is_faulted());
        assert!(decoder.opened_streams().is_empty());
        assert_eq!(decoder.shutdown_ports().len(), 1);

        // A later, complete header still succeeds
        feeder.handle_packet(header(5, b"hdr"));
        assert!(feeder.is_streaming());
    }

    #[test]
    fn channel_acquisition_failure_faults_the_session() {
        let (feeder, decoder, _) = harness();
        decoder.fail_acquire();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));

        assert!(feeder.is_faulted());
        // Further packets are dropped without touching the decoder
        feeder.handle_packet(data(5, b"payload"));
        assert!(decoder.feed_attempts().is_empty());
    }

    #[test]
    fn open_stream_failure_faults_and_releases_channel() {
        let (feeder, decoder, _) = harness();
        decoder.fail_open();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));

        assert!(feeder.is_faulted());
        assert_eq!(decoder.shutdown_ports().len(), 1);
    }

    #[test]
    fn register_sink_failure_faults_and_releases_channel() {
        let (feeder, decoder, _) = harness();
        decoder.fail_register();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));

        assert!(feeder.is_faulted());
        assert_eq!(decoder.shutdown_ports().len(), 1);
        feeder.handle_packet(data(5, b"payload"));
        assert!(decoder.feed_attempts().is_empty());
    }

    #[test]
    fn start_failure_faults_and_releases_channel() {
        let (feeder, decoder, _) = harness();
        decoder.fail_start();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));

        assert!(feeder.is_faulted());
        assert!(!decoder.playback_started());
        assert_eq!(decoder.shutdown_ports().len(), 1);
    }

    #[test]
    fn data_before_header_is_ignored() {
        let (feeder, decoder, _) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(data(5, b"early"));
        assert!(decoder.feed_attempts().is_empty());
        assert!(!feeder.is_faulted());
    }

    #[test]
    fn duplicate_header_while_streaming_is_ignored() {
        let (feeder, decoder, _) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));
        feeder.handle_packet(header(5, b"hdr-again"));
        assert_eq!(decoder.opened_streams().len(), 1);
    }

    #[test]
    fn stale_handle_is_ignored_unconditionally() {
        let (feeder, decoder, _) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(9, b"hdr"));
        assert!(decoder.opened_streams().is_empty());
        feeder.handle_packet(header(5, b"hdr"));
        feeder.handle_packet(data(9, b"payload"));
        assert!(decoder.feed_attempts().is_empty());
    }

    #[test]
    fn payload_reaches_the_decoder() {
        let (feeder, decoder, _) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));
        feeder.handle_packet(data(5, b"chunk-1"));
        feeder.handle_packet(data(5, b"chunk-2"));

        let accepted = decoder.accepted_payloads();
        assert_eq!(accepted, vec![b"chunk-1".to_vec(), b"chunk-2".to_vec()]);
    }

    #[test]
    fn empty_payload_is_not_submitted() {
        let (feeder, decoder, _) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));
        feeder.handle_packet(data(5, b""));
        assert!(decoder.feed_attempts().is_empty());
    }

    #[test]
    fn backpressure_retries_identical_payload_until_accepted() {
        let (feeder, decoder, _) = harness();
        decoder.reject_next_feeds(4);
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));
        feeder.handle_packet(data(5, b"stubborn"));

        let attempts = decoder.feed_attempts();
        // 4 rejected attempts plus the accepted one, byte-identical each time
        assert_eq!(attempts.len(), 5);
        assert!(attempts.iter().all(|(_, bytes)| bytes == b"stubborn"));
        assert_eq!(decoder.accepted_payloads(), vec![b"stubborn".to_vec()]);
    }

    #[test]
    fn stop_releases_the_channel_and_silences_the_feeder() {
        let (feeder, decoder, _) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));
        feeder.stop();

        assert!(!feeder.is_streaming());
        assert_eq!(decoder.shutdown_ports().len(), 1);

        feeder.handle_packet(data(5, b"late"));
        assert!(decoder.feed_attempts().is_empty());
    }

    #[test]
    fn stop_is_idempotent() {
        let (feeder, decoder, _) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));
        feeder.stop();
        feeder.stop();
        assert_eq!(decoder.shutdown_ports().len(), 1);
    }

    #[test]
    fn decoded_frames_flow_through_the_sink_onto_the_shelf() {
        let (feeder, decoder, shelf) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));

        let planes = vec![128u8; 2 * 2 * 3 / 2];
        decoder.emit_frame(PixelLayout::Yv12, 2, 2, 1234, &planes);

        let frame = shelf.try_take().expect("converted frame should be published");
        assert_eq!(frame.width, 2);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.timestamp_ms, 1234);
        assert_eq!(frame.data.len(), 2 * 2 * 3);
    }

    #[test]
    fn non_yv12_frames_are_filtered_out() {
        let (feeder, decoder, shelf) = harness();
        feeder.bind(PlayHandle(5));
        feeder.handle_packet(header(5, b"hdr"));

        decoder.emit_frame(PixelLayout::Pcm16, 0, 0, 0, &[0u8; 64]);
        assert!(shelf.is_empty());
    }

    #[test]
    fn malformed_frame_is_swallowed_and_prior_contents_survive() {
        let shelf = Arc::new(FrameShelf::new());
        let sink = DecodeSink::new(Arc::clone(&shelf));

        let good = vec![200u8; 2 * 2 * 3 / 2];
        sink.on_frame(PlanarFrame {
            layout: PixelLayout::Yv12,
            width: 2,
            height: 2,
            timestamp_ms: 1,
            data: &good,
        });
        assert_eq!(shelf.len(), 1);

        // Truncated buffer: conversion fails, nothing published, nothing
        // panics, prior contents untouched
        sink.on_frame(PlanarFrame {
            layout: PixelLayout::Yv12,
            width: 2,
            height: 2,
            timestamp_ms: 2,
            data: &good[..3],
        });
        assert_eq!(shelf.len(), 1);
        assert_eq!(shelf.try_take().unwrap().timestamp_ms, 1);
    }
}
