// THEORY:
// The `PixelClassifier` is the first analytical stage. It decides, pixel by pixel,
// whether the pixel looks like one of the palette colors, and if so which one.
//
// Algorithm, for every pixel:
// 1.  **Distance**: sum the absolute per-channel differences (L1) between the
//     pixel and each palette entry, over the classifier's active channels only.
// 2.  **Best match**: keep the entry with the smallest distance. The comparison is
//     strict, so on an exact tie the lower palette index wins.
// 3.  **Threshold**: if the best distance is strictly below the threshold the pixel
//     is foreground: the raw mask gets 255 and the visualization plane gets the
//     matched palette color on the active channels. Otherwise the mask gets 0.
//
// Every mask pixel is written every tick, so the raw mask needs no clearing. The
// visualization plane is sparse (foreground only), so it is bulk-zeroed first;
// otherwise colors from the previous tick would survive in background areas.
//
// Two strategies exist, chosen once per tick from the configured mode:
// - `DirectColorClassifier` compares the raw sensor channels, all three of them.
// - `LumaChromaClassifier` converts the frame to (Y, Cb, Cr) into the `converted`
//   working plane and compares Cb and Cr only, ignoring brightness.

use crate::config::{ChannelOrder, ColorSpaceMode};
use crate::core_modules::color_space::ColorSpaceConverter;
use crate::core_modules::frame::{ImagePlane, WorkingBuffers};
use crate::core_modules::palette::{MarkerLabel, NUM_COLORS, Palette};
use std::ops::Range;
use tracing::trace;

/// Mask value written for foreground pixels.
pub const FOREGROUND: u8 = 255;

/// Summary of one classification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassificationStats {
    pub foreground_pixels: usize,
}

/// A per-pixel foreground/background strategy.
pub trait PixelClassifier {
    /// Channels that take part in distance sums and in the color vote.
    fn active_channels(&self) -> Range<usize>;

    /// Fills `buffers.raw_mask` and `buffers.visualization` from `frame`.
    /// `frame` is never modified.
    fn classify(
        &self,
        frame: &ImagePlane,
        palette: &Palette,
        threshold: u32,
        buffers: &mut WorkingBuffers,
    ) -> ClassificationStats;
}

/// L1 distance between `pixel` and `reference` over `channels`.
#[inline]
pub fn l1_distance(pixel: &[u8], reference: &[u8], channels: Range<usize>) -> u32 {
    channels
        .map(|p| (pixel[p] as i32 - reference[p] as i32).unsigned_abs())
        .sum()
}

/// The palette entry closest to `pixel`, and its distance. Lower index wins ties.
pub fn nearest_entry(pixel: &[u8], palette: &Palette, channels: Range<usize>) -> (MarkerLabel, u32) {
    let mut min_distance = u32::MAX;
    let mut min_index = 0;
    for (index, entry) in palette.entries.iter().enumerate() {
        let distance = l1_distance(pixel, entry, channels.clone());
        if distance < min_distance {
            min_distance = distance;
            min_index = index;
        }
    }
    // Two entries, so the index is always a valid label.
    let label = MarkerLabel::from_index(min_index).unwrap_or(MarkerLabel::Primary);
    (label, min_distance)
}

fn classify_plane(
    source: &ImagePlane,
    palette: &Palette,
    threshold: u32,
    channels: Range<usize>,
    raw_mask: &mut ImagePlane,
    visualization: &mut ImagePlane,
) -> ClassificationStats {
    visualization.clear();

    let mut foreground_pixels = 0;
    let mask = raw_mask.data_mut();
    let colors = visualization.data_mut().chunks_exact_mut(NUM_COLORS);
    for ((pixel, mask_value), color) in source
        .data()
        .chunks_exact(NUM_COLORS)
        .zip(mask.iter_mut())
        .zip(colors)
    {
        let (label, distance) = nearest_entry(pixel, palette, channels.clone());
        if distance < threshold {
            *mask_value = FOREGROUND;
            let entry = palette.entry(label);
            color[channels.clone()].copy_from_slice(&entry[channels.clone()]);
            foreground_pixels += 1;
        } else {
            *mask_value = 0;
        }
    }

    trace!(foreground_pixels, threshold, "classified frame");
    ClassificationStats { foreground_pixels }
}

/// Classifies raw sensor channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectColorClassifier;

impl PixelClassifier for DirectColorClassifier {
    fn active_channels(&self) -> Range<usize> {
        0..NUM_COLORS
    }

    fn classify(
        &self,
        frame: &ImagePlane,
        palette: &Palette,
        threshold: u32,
        buffers: &mut WorkingBuffers,
    ) -> ClassificationStats {
        classify_plane(
            frame,
            palette,
            threshold,
            self.active_channels(),
            &mut buffers.raw_mask,
            &mut buffers.visualization,
        )
    }
}

/// Classifies the chroma channels of the (Y, Cb, Cr) conversion.
#[derive(Debug, Clone, Copy)]
pub struct LumaChromaClassifier {
    converter: ColorSpaceConverter,
}

impl LumaChromaClassifier {
    pub fn new(order: ChannelOrder) -> Self {
        Self {
            converter: ColorSpaceConverter::new(order),
        }
    }
}

impl PixelClassifier for LumaChromaClassifier {
    fn active_channels(&self) -> Range<usize> {
        // Channel 0 holds Y.
        1..NUM_COLORS
    }

    fn classify(
        &self,
        frame: &ImagePlane,
        palette: &Palette,
        threshold: u32,
        buffers: &mut WorkingBuffers,
    ) -> ClassificationStats {
        self.converter.convert_frame(frame, &mut buffers.converted);
        classify_plane(
            &buffers.converted,
            palette,
            threshold,
            self.active_channels(),
            &mut buffers.raw_mask,
            &mut buffers.visualization,
        )
    }
}

/// The classifier strategy selected for a tick.
#[derive(Debug, Clone, Copy)]
pub enum Classifier {
    Direct(DirectColorClassifier),
    LumaChroma(LumaChromaClassifier),
}

impl Classifier {
    pub fn for_mode(mode: ColorSpaceMode, order: ChannelOrder) -> Self {
        match mode {
            ColorSpaceMode::Direct => Classifier::Direct(DirectColorClassifier),
            ColorSpaceMode::LumaChroma => Classifier::LumaChroma(LumaChromaClassifier::new(order)),
        }
    }
}

impl PixelClassifier for Classifier {
    fn active_channels(&self) -> Range<usize> {
        match self {
            Classifier::Direct(c) => c.active_channels(),
            Classifier::LumaChroma(c) => c.active_channels(),
        }
    }

    fn classify(
        &self,
        frame: &ImagePlane,
        palette: &Palette,
        threshold: u32,
        buffers: &mut WorkingBuffers,
    ) -> ClassificationStats {
        match self {
            Classifier::Direct(c) => c.classify(frame, palette, threshold, buffers),
            Classifier::LumaChroma(c) => c.classify(frame, palette, threshold, buffers),
        }
    }
}
