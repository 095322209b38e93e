// THEORY:
// This file is the main entry point for the `marker_vision` library crate.
// It exports `VisionPipeline`, the once-per-frame orchestrator, together with the
// data it exchanges with its host: the configuration, the frame container, the
// region-extraction and rendering contracts the host implements, and the
// per-tick `Report`.
//
// The individual stages live in `core_modules` and are public as well, so that a
// host (or a test) can drive a single stage against a synthetic context.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use crate::config::{ChannelOrder, ColorSpaceMode, PipelineConfig};
pub use crate::core_modules::frame::{ImagePlane, WorkingBuffers};
pub use crate::core_modules::overlay::MarkerRenderer;
pub use crate::core_modules::palette::{Color, MarkerLabel, Palette};
pub use crate::core_modules::region::{
    BinaryImage, BoundingBox, PictureKind, Point, Region, RegionExtractor, Run,
};
pub use crate::error::VisionError;
pub use crate::pipeline::{Detection, FrameAnalysis, PipelineState, Report, VisionPipeline};
