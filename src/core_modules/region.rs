// THEORY:
// Region extraction (connected-component labeling) is an external service. This
// module defines the data the pipeline exchanges with it and nothing more:
//
// 1.  **Input**: a `BinaryImage`, a borrowed view over a working plane whose
//     values are strictly 0 or 1, tagged `PictureKind::Binary`.
// 2.  **Output**: one `Region` per connected component, carrying its area,
//     bounding box, centroid and its pixels as an ordered list of horizontal
//     `Run`s. Together the runs cover exactly the region's pixels.
// 3.  **Lifetime**: regions are produced and consumed within a single tick. The
//     pipeline reads them and drops them; nothing is carried into the next frame,
//     and a region's `id` means nothing outside the tick that produced it.
//
// The pipeline never modifies a region. Runs are exposed as a forward-only
// iterator, in the order the extractor supplied them.

use crate::core_modules::frame::ImagePlane;
use crate::error::VisionError;
use std::ops::RangeInclusive;

/// A simple struct to represent a 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// Axis-aligned box, all edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

/// A horizontal strip of a region's pixels on a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub row: u32,
    /// First column, inclusive.
    pub start_column: u32,
    /// Last column, inclusive.
    pub end_column: u32,
}

impl Run {
    pub fn new(row: u32, start_column: u32, end_column: u32) -> Self {
        Self {
            row,
            start_column,
            end_column,
        }
    }

    pub fn columns(&self) -> RangeInclusive<u32> {
        self.start_column..=self.end_column
    }

    pub fn len(&self) -> u32 {
        (self.end_column + 1).saturating_sub(self.start_column)
    }
}

/// A connected component as reported by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Position of the region in this tick's extraction result.
    pub id: usize,
    /// Number of pixels in the region.
    pub area: u32,
    pub bounding_box: BoundingBox,
    pub centroid: Point,
    runs: Vec<Run>,
}

impl Region {
    pub fn new(id: usize, area: u32, bounding_box: BoundingBox, centroid: Point, runs: Vec<Run>) -> Self {
        Self {
            id,
            area,
            bounding_box,
            centroid,
            runs,
        }
    }

    /// Every pixel covered by the runs as (row, col), in run order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.runs
            .iter()
            .flat_map(|run| run.columns().map(move |col| (run.row, col)))
    }

    pub fn has_runs(&self) -> bool {
        !self.runs.is_empty()
    }
}

/// Tag describing how the extractor must interpret the picture values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureKind {
    /// Every value is 0 or 1.
    Binary,
}

/// A borrowed single-channel picture handed to the extractor.
#[derive(Debug, Clone, Copy)]
pub struct BinaryImage<'a> {
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
    pub kind: PictureKind,
}

impl<'a> BinaryImage<'a> {
    /// Wraps a 0/1 plane. Use `binarize` first if the plane holds 0/255.
    pub fn from_plane(plane: &'a ImagePlane) -> Self {
        debug_assert_eq!(plane.channels(), 1);
        Self {
            width: plane.width(),
            height: plane.height(),
            data: plane.data(),
            kind: PictureKind::Binary,
        }
    }

    #[inline]
    pub fn get(&self, row: u32, col: u32) -> u8 {
        self.data[row as usize * self.width as usize + col as usize]
    }
}

/// Maps every non-zero value of `source` to 1 in `dest`.
pub fn binarize(source: &ImagePlane, dest: &mut ImagePlane) {
    debug_assert_eq!(source.shape(), dest.shape());
    for (out, &value) in dest.data_mut().iter_mut().zip(source.data()) {
        *out = u8::from(value != 0);
    }
}

/// Connected-component labeling, supplied by the host.
///
/// Implementations must fully populate every region before returning, and must
/// give every region with a positive area a non-empty run list.
pub trait RegionExtractor {
    fn extract(&mut self, picture: &BinaryImage<'_>) -> Result<Vec<Region>, VisionError>;
}
