//! Frame types for the decode pipeline.

use crate::{CaptureError, Result};

/// Pixel layout tag attached to frames coming out of the vendor decoder.
///
/// Stream decoders emit more than video: depending on the source they also
/// deliver audio blocks and vendor-specific auxiliary frames. Only
/// [`PixelLayout::Yv12`] is converted and published; everything else is
/// ignored by the decode sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PixelLayout {
    /// YUV 4:2:0 planar, Y plane followed by V then U quarter planes.
    Yv12,
    /// YUV 4:2:0 semi-planar, Y plane followed by interleaved UV.
    Nv12,
    /// 16-bit PCM audio block.
    Pcm16,
    /// Anything the decoder tags that this library does not interpret.
    Unknown,
}

/// A decoded planar frame, borrowed from decoder-owned memory.
///
/// The vendor decoder reclaims the underlying buffer as soon as the frame
/// callback returns, which is why this type borrows: nothing derived from
/// `data` may outlive the callback. The decode sink converts it into an owned
/// [`VideoFrame`] before publishing.
#[derive(Debug, Clone, Copy)]
pub struct PlanarFrame<'a> {
    /// Pixel layout the decoder tagged this frame with.
    pub layout: PixelLayout,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Device timestamp in milliseconds, as reported by the decoder.
    pub timestamp_ms: u64,
    /// Plane bytes. For YV12 this is `width * height * 3 / 2` bytes.
    pub data: &'a [u8],
}

impl<'a> PlanarFrame<'a> {
    /// Expected byte length of a YV12 plane buffer for the given geometry.
    ///
    /// Checked arithmetic: camera SDKs report geometry from the wire, and a
    /// corrupt header must not overflow into a bogus small expectation.
    pub fn yv12_len(width: u32, height: u32) -> Option<usize> {
        let y = (width as usize).checked_mul(height as usize)?;
        y.checked_add(y / 2)
    }

    /// Validate that this frame's geometry is usable and its buffer has the
    /// exact YV12 size.
    pub fn check_yv12_shape(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(CaptureError::Geometry { width: self.width, height: self.height });
        }
        let expected = Self::yv12_len(self.width, self.height)
            .ok_or(CaptureError::Geometry { width: self.width, height: self.height })?;
        if self.data.len() != expected {
            return Err(CaptureError::format(expected, self.data.len(), self.width, self.height));
        }
        Ok(())
    }
}

/// An owned, packed BGR frame ready for the consumer.
///
/// `data` holds `height * width` interleaved B,G,R triples in row-major
/// order. The channel order is BGR because that is what the downstream
/// rendering path expects; it is part of the contract, not an implementation
/// detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// Packed pixel bytes, `width * height * 3` long.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Device timestamp in milliseconds carried over from the decoded frame.
    pub timestamp_ms: u64,
}

impl VideoFrame {
    /// Bytes per pixel in the packed output.
    pub const BYTES_PER_PIXEL: usize = 3;

    /// The B,G,R triple at pixel coordinates `(x, y)`, or `None` when out of
    /// bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        let bytes = self.data.get(offset..offset + Self::BYTES_PER_PIXEL)?;
        Some([bytes[0], bytes[1], bytes[2]])
    }
}
