//! Bounded, overwrite-on-full frame shelf.
//!
//! [`FrameShelf`] decouples decode-thread cadence from consumer-thread
//! cadence. It holds at most the two most recent converted frames; when the
//! decoder runs ahead, the oldest frame is silently discarded. The consumer
//! always receives the newest available frame first — freshness over
//! completeness, and over FIFO fairness.
//!
//! Access pattern is one fixed producer (the decode thread publishing) and
//! one fixed consumer (the caller polling). A single mutex around a two-slot
//! store provides the required guarantee: `try_take` can never observe a
//! half-inserted frame, and neither operation ever blocks beyond the other's
//! short critical section.

use std::sync::Mutex;

use tracing::trace;

use crate::types::VideoFrame;

/// How many frames the shelf retains. Newer publishes evict the oldest.
const CAPACITY: usize = 2;

#[derive(Debug, Default)]
struct Slots {
    /// `slots[0]` is the most recently published frame.
    slots: [Option<VideoFrame>; CAPACITY],
}

/// Thread-safe holder of the two most recent frames, newest first.
#[derive(Debug, Default)]
pub struct FrameShelf {
    inner: Mutex<Slots>,
}

impl FrameShelf {
    /// Create an empty shelf.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a frame as the newest element, evicting the oldest when full.
    ///
    /// Infallible: capacity is enforced mechanically, memory use is bounded
    /// by construction, and there is no error path.
    pub fn publish(&self, frame: VideoFrame) {
        let mut inner = self.inner.lock().expect("frame shelf poisoned");
        if inner.slots[CAPACITY - 1].is_some() {
            trace!(
                width = frame.width,
                height = frame.height,
                "shelf full, evicting oldest frame"
            );
        }
        inner.slots.rotate_right(1);
        inner.slots[0] = Some(frame);
    }

    /// Remove and return the most recently published frame, or `None` when
    /// empty. Never blocks, never sleeps.
    pub fn try_take(&self) -> Option<VideoFrame> {
        let mut inner = self.inner.lock().expect("frame shelf poisoned");
        let frame = inner.slots[0].take()?;
        inner.slots.rotate_left(1);
        Some(frame)
    }

    /// Discard all held frames. Used when a session is (re)opened.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("frame shelf poisoned");
        inner.slots = Default::default();
    }

    /// Number of frames currently held (0, 1, or 2).
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("frame shelf poisoned");
        inner.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether the shelf currently holds no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
