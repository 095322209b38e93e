//! Configuration for marker_vision

use crate::core_modules::palette::Palette;
use crate::error::VisionError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The color space pixels are classified in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpaceMode {
    /// Compare raw sensor channels against the palette.
    Direct,
    /// Convert to Y, Cb, Cr first and compare the chroma channels only.
    LumaChroma,
}

/// Byte order of the three channels in a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Blue, green, red. The sensor's native order.
    Bgr,
    /// Red, green, blue.
    Rgb,
}

impl ChannelOrder {
    /// Reorders a native pixel into (R, G, B).
    pub fn to_rgb(self, pixel: &[u8]) -> (u8, u8, u8) {
        match self {
            ChannelOrder::Bgr => (pixel[2], pixel[1], pixel[0]),
            ChannelOrder::Rgb => (pixel[0], pixel[1], pixel[2]),
        }
    }

    /// Lays out an (R, G, B) triple in this order.
    pub fn arrange_rgb(self, red: u8, green: u8, blue: u8) -> [u8; 3] {
        match self {
            ChannelOrder::Bgr => [blue, green, red],
            ChannelOrder::Rgb => [red, green, blue],
        }
    }
}

/// Configuration for the VisionPipeline, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub image_width: u32,
    pub image_height: u32,
    /// L1 distance below which a pixel counts as foreground. Adjustable at runtime.
    pub threshold: u32,
    pub mode: ColorSpaceMode,
    pub channel_order: ChannelOrder,
    /// Pixels this close to the frame edge are never written by the morphology stage.
    pub border_margin: u32,
    /// Objects must cover strictly more pixels than this to be reported.
    pub min_area: u32,
    /// Half-length of the centroid cross drawn for each object.
    pub cross_size: u32,
    pub direct_palette: Palette,
    pub luma_chroma_palette: Palette,
    /// Host display color for each label, indexed by `MarkerLabel::index`.
    pub display_colors: [u8; 2],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image_width: 752,
            image_height: 480,
            threshold: 50,
            mode: ColorSpaceMode::Direct,
            channel_order: ChannelOrder::Bgr,
            border_margin: 2,
            min_area: 500,
            cross_size: 10,
            direct_palette: Palette::direct_default(),
            luma_chroma_palette: Palette::luma_chroma_default(),
            display_colors: [4, 2],
        }
    }
}

impl PipelineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), VisionError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(VisionError::Config("Image dimensions must be non-zero".to_string()));
        }

        if self.border_margin == 0 {
            return Err(VisionError::Config(
                "Border margin must be at least 1 for a 3x3 neighborhood".to_string(),
            ));
        }

        let margin = self.border_margin.saturating_mul(2);
        if margin >= self.image_width || margin >= self.image_height {
            return Err(VisionError::Config(format!(
                "Border margin {} leaves no interior in a {}x{} frame",
                self.border_margin, self.image_width, self.image_height
            )));
        }

        if self.threshold == 0 {
            return Err(VisionError::Config("Threshold must be positive".to_string()));
        }

        Ok(())
    }

    /// The palette used by the configured mode.
    pub fn active_palette(&self) -> &Palette {
        match self.mode {
            ColorSpaceMode::Direct => &self.direct_palette,
            ColorSpaceMode::LumaChroma => &self.luma_chroma_palette,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, VisionError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
