// THEORY:
// The `ObjectColorResolver` decides which marker class each detected object
// belongs to. Pixel classification already picked a palette color per pixel, but
// an object's pixels rarely agree perfectly: edges blur, and dilation adds pixels
// that were never classified (their visualization color is zero). A majority vote
// over the whole object smooths this out.
//
// For every region whose area is strictly above `min_area`:
// 1.  Walk its runs in the order the extractor gave them.
// 2.  For every covered pixel, compare the visualization color with palette entry
//     0 on the classifier's active channels. A full match counts for `Primary`;
//     anything else (including unclassified, zero pixels) counts for `Secondary`.
// 3.  `Primary` wins only with strictly more votes. An exact tie goes to
//     `Secondary`.
//
// Regions at or below `min_area` get no label at all and are left out of every
// later stage. Labels are kept by position in the extractor's output, never by
// region id, and the assignment is rebuilt from scratch every tick.

use crate::core_modules::frame::ImagePlane;
use crate::core_modules::palette::{MarkerLabel, NUM_LABELS, Palette};
use crate::core_modules::region::Region;
use std::ops::Range;
use tracing::warn;

/// Vote counts for one region, indexed by `MarkerLabel::index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    pub votes: [u32; NUM_LABELS],
}

impl VoteTally {
    pub fn add(&mut self, label: MarkerLabel) {
        self.votes[label.index()] += 1;
    }

    pub fn count(&self, label: MarkerLabel) -> u32 {
        self.votes[label.index()]
    }

    /// `Primary` on a strict majority, `Secondary` otherwise.
    pub fn winner(&self) -> MarkerLabel {
        if self.count(MarkerLabel::Primary) > self.count(MarkerLabel::Secondary) {
            MarkerLabel::Primary
        } else {
            MarkerLabel::Secondary
        }
    }
}

/// One entry per extracted region, in extraction order. `None` marks a region
/// at or below the area floor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorAssignment {
    labels: Vec<Option<MarkerLabel>>,
}

impl ColorAssignment {
    /// Label of the region at `position` in the extractor's output.
    pub fn get(&self, position: usize) -> Option<MarkerLabel> {
        self.labels.get(position).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<MarkerLabel>> + '_ {
        self.labels.iter().copied()
    }

    /// Number of regions that received a label.
    pub fn labeled(&self) -> usize {
        self.labels.iter().flatten().count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ObjectColorResolver {
    min_area: u32,
}

impl ObjectColorResolver {
    pub fn new(min_area: u32) -> Self {
        Self { min_area }
    }

    pub fn qualifies(&self, region: &Region) -> bool {
        region.area > self.min_area
    }

    /// Tallies the visualization colors under `region`'s runs.
    pub fn tally(
        &self,
        region: &Region,
        visualization: &ImagePlane,
        palette: &Palette,
        channels: Range<usize>,
    ) -> VoteTally {
        let reference = &palette.primary()[channels.clone()];
        let mut tally = VoteTally::default();
        for (row, col) in region.pixels() {
            let color = &visualization.pixel(row, col)[channels.clone()];
            if color == reference {
                tally.add(MarkerLabel::Primary);
            } else {
                tally.add(MarkerLabel::Secondary);
            }
        }
        tally
    }

    pub fn resolve(
        &self,
        regions: &[Region],
        visualization: &ImagePlane,
        palette: &Palette,
        channels: Range<usize>,
    ) -> ColorAssignment {
        let mut labels = Vec::with_capacity(regions.len());
        for region in regions {
            if !self.qualifies(region) {
                labels.push(None);
                continue;
            }
            if !region.has_runs() {
                warn!(region = region.id, area = region.area, "region has no runs");
            }
            debug_assert!(region.has_runs(), "region {} has area but no runs", region.id);

            let tally = self.tally(region, visualization, palette, channels.clone());
            labels.push(Some(tally.winner()));
        }
        ColorAssignment { labels }
    }
}
