// THEORY:
// The `frame` module holds the pixel containers every stage reads and writes.
// A single type, `ImagePlane`, covers the three roles the pipeline needs:
//
// 1.  **Frame**: the captured sensor image, three interleaved channels per pixel
//     in the sensor's native order. Owned by the host; the pipeline only reads it.
// 2.  **Binary mask**: a single-channel plane whose values are 0 or a single
//     "on" value (255 for masks produced by the classifier and morphology, 1 for
//     the picture handed to the region extractor).
// 3.  **Visualization / converted planes**: three-channel scratch planes the
//     classifier writes palette colors or converted color triples into.
//
// `WorkingBuffers` is the named set of scratch planes. It is allocated once, at
// the dimensions the pipeline was configured with, and reused every tick. Nothing
// is re-zeroed between ticks unless a stage clears its own target explicitly.

use crate::core_modules::palette::NUM_COLORS;
use crate::error::VisionError;

/// A "dumb" data container for a width x height grid of interleaved channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlane {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl ImagePlane {
    /// A zero-filled plane.
    pub fn new(width: u32, height: u32, channels: usize) -> Self {
        let len = width as usize * height as usize * channels;
        Self {
            width,
            height,
            channels,
            data: vec![0; len],
        }
    }

    /// Wraps an existing buffer, checking that its length matches the shape.
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, VisionError> {
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(VisionError::DimensionMismatch {
                expected: format!("{} bytes", expected),
                actual: format!("{} bytes", data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A three-channel color frame.
    pub fn color(width: u32, height: u32) -> Self {
        Self::new(width, height, NUM_COLORS)
    }

    /// A single-channel mask.
    pub fn mask(width: u32, height: u32) -> Self {
        Self::new(width, height, 1)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn shape(&self) -> (u32, u32, usize) {
        (self.width, self.height, self.channels)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte offset of the first channel of the pixel at (row, col).
    #[inline]
    pub fn offset(&self, row: u32, col: u32) -> usize {
        (row as usize * self.width as usize + col as usize) * self.channels
    }

    #[inline]
    pub fn pixel(&self, row: u32, col: u32) -> &[u8] {
        let start = self.offset(row, col);
        &self.data[start..start + self.channels]
    }

    #[inline]
    pub fn pixel_mut(&mut self, row: u32, col: u32) -> &mut [u8] {
        let start = self.offset(row, col);
        let channels = self.channels;
        &mut self.data[start..start + channels]
    }

    /// First channel of the pixel at (row, col). Meant for single-channel masks.
    #[inline]
    pub fn get(&self, row: u32, col: u32) -> u8 {
        self.data[self.offset(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: u32, col: u32, value: u8) {
        let index = self.offset(row, col);
        self.data[index] = value;
    }

    /// Bulk zero.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Iterates pixels in row-major order.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.channels)
    }

    pub fn ensure_shape(&self, width: u32, height: u32, channels: usize) -> Result<(), VisionError> {
        if self.shape() != (width, height, channels) {
            return Err(VisionError::plane_mismatch((width, height, channels), self.shape()));
        }
        Ok(())
    }

    /// Number of non-zero values. Meant for single-channel masks.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// The named scratch planes reused across ticks.
#[derive(Debug, Clone)]
pub struct WorkingBuffers {
    /// Classifier output: 255 for foreground, 0 for background, every pixel written.
    pub raw_mask: ImagePlane,
    /// Erosion result.
    pub eroded: ImagePlane,
    /// Opening result (erosion then dilation).
    pub opened: ImagePlane,
    /// Strictly 0/1 copy of `opened` handed to the region extractor.
    pub labels: ImagePlane,
    /// Y, Cb, Cr triples of the current frame. Only written in luma-chroma mode.
    pub converted: ImagePlane,
    /// Matched palette color per foreground pixel, zero elsewhere.
    pub visualization: ImagePlane,
}

impl WorkingBuffers {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raw_mask: ImagePlane::mask(width, height),
            eroded: ImagePlane::mask(width, height),
            opened: ImagePlane::mask(width, height),
            labels: ImagePlane::mask(width, height),
            converted: ImagePlane::color(width, height),
            visualization: ImagePlane::color(width, height),
        }
    }
}
