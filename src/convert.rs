//! Planar YV12 to packed BGR pixel conversion.
//!
//! This is the hot path of the decode thread: it runs synchronously inside
//! the vendor decoder's frame callback, once per decoded frame, before the
//! frame is published. It is a pure function of its input — no shared state,
//! no I/O, bounded time proportional to the frame size — so it can never
//! stall the decoder's delivery thread beyond CPU cost.
//!
//! ## Layout
//!
//! YV12 stores the full-resolution luma plane first, then the *V* chroma
//! plane, then U, each chroma plane quarter sized (half resolution in both
//! axes). Note the V-before-U order; it is what distinguishes YV12 from
//! I420 and getting it backwards swaps red and blue casts.
//!
//! ## Color transform
//!
//! ITU-R BT.601 studio-swing, in 8.8 fixed point:
//!
//! ```text
//! C = 298 * (Y - 16)
//! B = (C + 516 * (U - 128)              + 128) >> 8
//! G = (C - 100 * (U - 128) - 208 * (V - 128) + 128) >> 8
//! R = (C              + 409 * (V - 128) + 128) >> 8
//! ```
//!
//! with each channel clamped to `[0, 255]`. Output channel order is B,G,R —
//! the downstream rendering path assumes it.

use crate::types::{PlanarFrame, VideoFrame};
use crate::Result;

/// Convert one YV12 plane buffer into an owned packed BGR frame.
///
/// Fails with [`CaptureError::Format`](crate::CaptureError::Format) or
/// [`CaptureError::Geometry`](crate::CaptureError::Geometry) when the buffer
/// length does not match `width * height * 3 / 2` or the geometry is not a
/// positive even pair; the caller must not publish anything in that case.
pub fn yv12_to_bgr(frame: &PlanarFrame<'_>) -> Result<VideoFrame> {
    frame.check_yv12_shape()?;

    let width = frame.width as usize;
    let height = frame.height as usize;
    let luma_len = width * height;
    let chroma_len = luma_len / 4;

    let (y_plane, chroma) = frame.data.split_at(luma_len);
    let (v_plane, u_plane) = chroma.split_at(chroma_len);

    let chroma_width = width / 2;
    let mut packed = vec![0u8; luma_len * VideoFrame::BYTES_PER_PIXEL];

    for row in 0..height {
        let y_row = &y_plane[row * width..(row + 1) * width];
        let chroma_row = (row / 2) * chroma_width;
        let out_row = &mut packed[row * width * 3..(row + 1) * width * 3];

        for col in 0..width {
            let chroma_idx = chroma_row + col / 2;
            let luma = 298 * (y_row[col] as i32 - 16);
            let d = u_plane[chroma_idx] as i32 - 128;
            let e = v_plane[chroma_idx] as i32 - 128;

            let b = (luma + 516 * d + 128) >> 8;
            let g = (luma - 100 * d - 208 * e + 128) >> 8;
            let r = (luma + 409 * e + 128) >> 8;

            let out = &mut out_row[col * 3..col * 3 + 3];
            out[0] = b.clamp(0, 255) as u8;
            out[1] = g.clamp(0, 255) as u8;
            out[2] = r.clamp(0, 255) as u8;
        }
    }

    Ok(VideoFrame {
        data: packed,
        width: frame.width,
        height: frame.height,
        timestamp_ms: frame.timestamp_ms,
    })
}
