//! The public capture facade.
//!
//! [`Camera`] owns the session and decoder collaborators, the frame shelf,
//! and the per-connection [`StreamFeeder`]. Consumers interact with three
//! calls: [`Camera::open`] (or [`Camera::open_with_config`]) to establish a
//! live stream, [`Camera::read`] to poll for the freshest decoded frame, and
//! [`Camera::release`] to tear everything down. `release` also runs on drop.
//!
//! `read` never blocks and never waits for the pipeline: it pops from the
//! shelf if a frame is there and returns `None` otherwise. All decode work
//! happens on SDK-owned threads behind the scenes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::buffer::FrameShelf;
use crate::config::CameraConfig;
use crate::error::Result;
use crate::feeder::StreamFeeder;
use crate::sdk::{DeviceSession, PacketSink, StreamDecoder};
use crate::types::{PlayHandle, UserHandle, VideoFrame};

/// State held while a live stream is up.
struct LiveStream {
    user: UserHandle,
    play: PlayHandle,
    feeder: Arc<StreamFeeder>,
}

/// One camera connection with a polling frame API.
pub struct Camera {
    session: Arc<dyn DeviceSession>,
    decoder: Arc<dyn StreamDecoder>,
    shelf: Arc<FrameShelf>,
    live: Option<LiveStream>,
}

impl Camera {
    /// Create a camera over the given SDK collaborators. No device
    /// interaction happens until [`Camera::open`].
    pub fn new(session: Arc<dyn DeviceSession>, decoder: Arc<dyn StreamDecoder>) -> Self {
        Self { session, decoder, shelf: Arc::new(FrameShelf::new()), live: None }
    }

    /// Connect with default port, channel and link mode.
    pub fn open(
        &mut self,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<()> {
        self.open_with_config(&CameraConfig::new(host, username, password))
    }

    /// Connect to the device and start the live stream.
    ///
    /// Any previous session is released first, so `open` doubles as a
    /// reconnect. On failure no partial session is left running and the
    /// shelf stays empty.
    pub fn open_with_config(&mut self, config: &CameraConfig) -> Result<()> {
        self.release();
        self.shelf.clear();

        self.session.init()?;

        let (user, device) = match self.session.login(
            &config.host,
            config.port,
            &config.username,
            &config.password,
        ) {
            Ok(login) => login,
            Err(error) => {
                warn!(host = %config.host, %error, "login failed");
                self.best_effort(self.session.cleanup(), "cleanup");
                return Err(error);
            }
        };
        info!(
            host = %config.host,
            serial = %device.serial_number,
            channels = device.channel_count,
            "logged in"
        );

        let feeder = Arc::new(StreamFeeder::new(
            Arc::clone(&self.decoder),
            Arc::clone(&self.shelf),
        ));
        let packet_feeder = Arc::clone(&feeder);
        let on_packet: PacketSink = Box::new(move |packet| packet_feeder.handle_packet(packet));

        let play = match self.session.start_live(user, &config.stream_options(), on_packet) {
            Ok(play) => play,
            Err(error) => {
                warn!(host = %config.host, %error, "live stream start failed");
                self.best_effort(self.session.logout(user), "logout");
                self.best_effort(self.session.cleanup(), "cleanup");
                return Err(error);
            }
        };
        feeder.bind(play);

        info!(host = %config.host, channel = config.channel, play = play.0, "live stream started");
        self.live = Some(LiveStream { user, play, feeder });
        Ok(())
    }

    /// Pop the freshest buffered frame, if any. Never blocks.
    pub fn read(&self) -> Option<VideoFrame> {
        self.shelf.try_take()
    }

    /// Whether a live stream is currently open.
    pub fn is_open(&self) -> bool {
        self.live.is_some()
    }

    /// Tear down the live stream, the decode channel and the device login.
    ///
    /// Every step is best-effort: a failing stop never prevents the
    /// following steps from running. Calling this with nothing open is a
    /// no-op, and buffered frames remain readable until [`Camera::open`]
    /// clears them.
    pub fn release(&mut self) {
        let Some(live) = self.live.take() else {
            return;
        };
        debug!(play = live.play.0, "releasing camera session");
        self.best_effort(self.session.stop_live(live.play), "stop_live");
        live.feeder.stop();
        self.best_effort(self.session.logout(live.user), "logout");
        self.best_effort(self.session.cleanup(), "cleanup");
    }

    fn best_effort(&self, result: Result<()>, step: &str) {
        if let Err(error) = result {
            warn!(step, %error, "teardown step failed, continuing");
        }
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{StubDecoder, StubSession};
    use crate::types::PixelLayout;

    fn camera() -> (Camera, Arc<StubSession>, Arc<StubDecoder>) {
        let session = Arc::new(StubSession::new());
        let decoder = Arc::new(StubDecoder::new());
        let camera = Camera::new(
            Arc::clone(&session) as Arc<dyn DeviceSession>,
            Arc::clone(&decoder) as Arc<dyn StreamDecoder>,
        );
        (camera, session, decoder)
    }

    fn yv12_gray(width: u32, height: u32) -> Vec<u8> {
        vec![128u8; (width * height * 3 / 2) as usize]
    }

    #[test]
    fn open_logs_in_and_starts_the_stream() {
        let (mut camera, session, _) = camera();
        camera.open("cam.local", "admin", "pw").unwrap();
        assert!(camera.is_open());
        assert_eq!(session.calls(), vec!["init", "login", "start_live"]);
    }

    #[test]
    fn init_failure_aborts_open() {
        let (mut camera, session, _) = camera();
        session.fail_init();
        assert!(camera.open("cam.local", "admin", "pw").is_err());
        assert!(!camera.is_open());
        assert_eq!(session.calls(), vec!["init"]);
    }

    #[test]
    fn login_failure_aborts_open_and_cleans_up() {
        let (mut camera, session, _) = camera();
        session.fail_login();
        assert!(camera.open("cam.local", "admin", "bad-pw").is_err());
        assert!(!camera.is_open());
        assert_eq!(session.calls(), vec!["init", "login", "cleanup"]);
    }

    #[test]
    fn stream_start_failure_logs_out_again() {
        let (mut camera, session, _) = camera();
        session.fail_start_live();
        assert!(camera.open("cam.local", "admin", "pw").is_err());
        assert!(!camera.is_open());
        assert_eq!(session.calls(), vec!["init", "login", "start_live", "logout", "cleanup"]);
    }

    #[test]
    fn read_returns_none_before_any_frame() {
        let (mut camera, _, _) = camera();
        camera.open("cam.local", "admin", "pw").unwrap();
        assert!(camera.read().is_none());
    }

    #[test]
    fn decoded_frames_are_readable() {
        let (mut camera, session, decoder) = camera();
        camera.open("cam.local", "admin", "pw").unwrap();
        session.push_header(b"hdr");
        session.push_data(b"compressed");
        decoder.emit_frame(PixelLayout::Yv12, 4, 2, 77, &yv12_gray(4, 2));

        let frame = camera.read().expect("frame should be buffered");
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.timestamp_ms, 77);
        assert!(camera.read().is_none(), "single frame is drained by one read");
    }

    #[test]
    fn release_tears_down_in_order_and_is_idempotent() {
        let (mut camera, session, decoder) = camera();
        camera.open("cam.local", "admin", "pw").unwrap();
        session.push_header(b"hdr");

        camera.release();
        assert!(!camera.is_open());
        assert_eq!(
            session.calls(),
            vec!["init", "login", "start_live", "stop_live", "logout", "cleanup"]
        );
        assert_eq!(decoder.shutdown_ports().len(), 1);

        camera.release();
        assert_eq!(session.calls().len(), 6, "second release is a no-op");
    }

    #[test]
    fn read_after_release_drains_leftovers_then_none() {
        let (mut camera, session, decoder) = camera();
        camera.open("cam.local", "admin", "pw").unwrap();
        session.push_header(b"hdr");
        decoder.emit_frame(PixelLayout::Yv12, 2, 2, 1, &yv12_gray(2, 2));
        camera.release();

        assert!(camera.read().is_some(), "buffered frame survives release");
        assert!(camera.read().is_none());
    }

    #[test]
    fn reopen_releases_the_previous_session_and_clears_the_shelf() {
        let (mut camera, session, decoder) = camera();
        camera.open("cam.local", "admin", "pw").unwrap();
        session.push_header(b"hdr");
        decoder.emit_frame(PixelLayout::Yv12, 2, 2, 1, &yv12_gray(2, 2));

        camera.open("cam2.local", "admin", "pw").unwrap();
        assert!(camera.read().is_none(), "reopen discards stale frames");
        assert_eq!(
            session.calls(),
            vec![
                "init", "login", "start_live", "stop_live", "logout", "cleanup", "init", "login",
                "start_live"
            ]
        );
    }

    #[test]
    fn packets_for_a_stale_handle_are_ignored_after_reopen() {
        let (mut camera, session, decoder) = camera();
        camera.open("cam.local", "admin", "pw").unwrap();
        let stale = session.current_play().unwrap();
        camera.open("cam.local", "admin", "pw").unwrap();

        session.push_with_handle(stale, crate::types::PacketKind::Header, b"hdr");
        assert!(decoder.opened_streams().is_empty());
    }

    #[test]
    fn drop_releases_the_session() {
        let (mut camera, session, _) = camera();
        camera.open("cam.local", "admin", "pw").unwrap();
        drop(camera);
        assert_eq!(
            session.calls(),
            vec!["init", "login", "start_live", "stop_live", "logout", "cleanup"]
        );
    }
}
