// THEORY:
// The `Palette` is the list of reference colors the classifier matches against.
// It holds exactly two entries, one per marker class, and its order is part of
// the contract: entry 0 wins an exact distance tie during classification, and
// entry 0 is the color every object's pixels are compared against during the
// majority vote. Swapping the entries changes results.
//
// Entries are expressed in whichever color space the active mode classifies in:
// raw sensor channels for direct mode, (Y, Cb, Cr) for luma-chroma mode.

use serde::{Deserialize, Serialize};

/// Number of channels in a color frame.
pub const NUM_COLORS: usize = 3;

/// Number of marker classes the pipeline distinguishes.
pub const NUM_LABELS: usize = 2;

/// A three-component color in the active color space.
pub type Color = [u8; NUM_COLORS];

/// The color identity assigned to a detected object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerLabel {
    /// The class of palette entry 0 (blue stones in the default palettes).
    Primary,
    /// The class of palette entry 1 (red stones in the default palettes).
    Secondary,
}

impl MarkerLabel {
    pub fn index(self) -> usize {
        match self {
            MarkerLabel::Primary => 0,
            MarkerLabel::Secondary => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(MarkerLabel::Primary),
            1 => Some(MarkerLabel::Secondary),
            _ => None,
        }
    }
}

/// An ordered pair of reference colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub entries: [Color; NUM_LABELS],
}

impl Palette {
    pub fn new(primary: Color, secondary: Color) -> Self {
        Self {
            entries: [primary, secondary],
        }
    }

    /// Blue and red stones as seen by the sensor, in native B, G, R order.
    pub fn direct_default() -> Self {
        Self::new([110, 75, 61], [34, 44, 162])
    }

    /// Blue and red stones in Y, Cb, Cr order. The Y component is never compared.
    pub fn luma_chroma_default() -> Self {
        Self::new([95, 155, 95], [90, 110, 180])
    }

    pub fn entry(&self, label: MarkerLabel) -> &Color {
        &self.entries[label.index()]
    }

    pub fn primary(&self) -> &Color {
        &self.entries[0]
    }
}
