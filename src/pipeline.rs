// THEORY:
// The `pipeline` module is the top-level API of the engine. `VisionPipeline` is
// called by the host once per captured frame and sequences every stage in a fixed
// order, each stage reading only what the previous one finished in the same tick:
//
//   frame -> classify (direct or luma-chroma) -> raw mask + visualization
//         -> erode -> dilate -> binarize -> external region extraction
//         -> per-object color vote -> detections -> external renderer
//
// It is also a two-state machine. The first tick of a run, and the first tick
// after an operator reset, is an `Initializing` tick: it re-arms the manual
// threshold flag and performs no analysis. Every later tick is `Steady` and runs
// the full chain. Execution is single-threaded and each tick runs to completion.
//
// All mutable per-process state (configuration, palette, scratch planes) lives in
// a `PipelineContext` owned by the pipeline and allocated once.

use crate::config::{ColorSpaceMode, PipelineConfig};
use crate::core_modules::classifier::{Classifier, PixelClassifier};
use crate::core_modules::frame::{ImagePlane, WorkingBuffers};
use crate::core_modules::morphology::MorphologyFilter;
use crate::core_modules::overlay::{MarkerRenderer, draw_marker};
use crate::core_modules::palette::{MarkerLabel, NUM_COLORS, Palette};
use crate::core_modules::region::{BinaryImage, BoundingBox, Point, RegionExtractor, binarize};
use crate::core_modules::resolver::ObjectColorResolver;
use crate::error::VisionError;
use tracing::{debug, info};

/// Where the frame orchestrator is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// The next tick performs one-time setup and no analysis.
    Initializing,
    /// Every tick runs the full analysis chain.
    Steady,
}

/// A colored object found in the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Identity within this tick only.
    pub region_id: usize,
    pub label: MarkerLabel,
    pub bounding_box: BoundingBox,
    pub centroid: Point,
    pub area: u32,
    /// Host display color mapped from `label`.
    pub display_color: u8,
}

/// The result of one analyzed frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameAnalysis {
    pub foreground_pixels: usize,
    /// All regions the extractor returned, including those below the area floor.
    pub region_count: usize,
    pub detections: Vec<Detection>,
}

/// The primary output of the vision pipeline for a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Initializing,
    Analyzed(FrameAnalysis),
}

/// Configuration plus the scratch planes every stage works in.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub buffers: WorkingBuffers,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig) -> Result<Self, VisionError> {
        config.validate()?;
        let buffers = WorkingBuffers::new(config.image_width, config.image_height);
        Ok(Self { config, buffers })
    }

    pub fn palette(&self) -> &Palette {
        self.config.active_palette()
    }
}

/// The main, top-level struct for the vision engine.
pub struct VisionPipeline {
    context: PipelineContext,
    state: PipelineState,
    manual_threshold: bool,
}

impl VisionPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, VisionError> {
        Ok(Self {
            context: PipelineContext::new(config)?,
            state: PipelineState::Initializing,
            manual_threshold: false,
        })
    }

    /// Operator reset. The next tick initializes instead of analyzing.
    pub fn on_reset(&mut self) {
        info!("reset requested; re-entering initialization");
        self.manual_threshold = true;
        self.state = PipelineState::Initializing;
    }

    /// Runs one capture cycle. `step_counter` is the host's tick number, starting at 1.
    ///
    /// Tick 1 and the first tick after a reset only initialize. Otherwise the frame
    /// is analyzed and every detection is drawn through `renderer`.
    pub fn on_frame_tick<E, R>(
        &mut self,
        step_counter: u64,
        frame: &ImagePlane,
        extractor: &mut E,
        renderer: &mut R,
    ) -> Result<Report, VisionError>
    where
        E: RegionExtractor + ?Sized,
        R: MarkerRenderer + ?Sized,
    {
        if step_counter == 1 || self.state == PipelineState::Initializing {
            self.initialize(step_counter);
            return Ok(Report::Initializing);
        }

        let analysis = self.analyze_frame(frame, extractor)?;
        let cross_size = self.context.config.cross_size;
        for detection in &analysis.detections {
            draw_marker(
                renderer,
                detection.bounding_box,
                detection.centroid,
                detection.display_color,
                cross_size,
            );
        }
        Ok(Report::Analyzed(analysis))
    }

    fn initialize(&mut self, step_counter: u64) {
        self.manual_threshold = true;
        if self.state != PipelineState::Steady {
            info!(step_counter, "pipeline initialized");
        }
        self.state = PipelineState::Steady;
    }

    /// The full analysis chain for one frame, without drawing.
    pub fn analyze_frame<E>(&mut self, frame: &ImagePlane, extractor: &mut E) -> Result<FrameAnalysis, VisionError>
    where
        E: RegionExtractor + ?Sized,
    {
        let config = &self.context.config;
        frame.ensure_shape(config.image_width, config.image_height, NUM_COLORS)?;

        // Stage 1: Classification, strategy fixed for the whole tick
        let classifier = Classifier::for_mode(config.mode, config.channel_order);
        let palette = *self.context.palette();
        let buffers = &mut self.context.buffers;
        let stats = classifier.classify(frame, &palette, config.threshold, buffers);

        // Stage 2: Opening
        let filter = MorphologyFilter::new(config.border_margin);
        filter.open(&buffers.raw_mask, &mut buffers.eroded, &mut buffers.opened);

        // Stage 3: Region extraction on a strict 0/1 picture
        binarize(&buffers.opened, &mut buffers.labels);
        let regions = extractor.extract(&BinaryImage::from_plane(&buffers.labels))?;

        // Stage 4: Color vote
        let resolver = ObjectColorResolver::new(config.min_area);
        let assignment = resolver.resolve(
            &regions,
            &buffers.visualization,
            &palette,
            classifier.active_channels(),
        );

        let detections: Vec<Detection> = regions
            .iter()
            .zip(assignment.iter())
            .filter_map(|(region, label)| {
                let label = label?;
                Some(Detection {
                    region_id: region.id,
                    label,
                    bounding_box: region.bounding_box,
                    centroid: region.centroid,
                    area: region.area,
                    display_color: config.display_colors[label.index()],
                })
            })
            .collect();

        debug!(
            foreground_pixels = stats.foreground_pixels,
            regions = regions.len(),
            detections = detections.len(),
            "frame analyzed"
        );

        Ok(FrameAnalysis {
            foreground_pixels: stats.foreground_pixels,
            region_count: regions.len(),
            detections,
        })
    }

    pub fn set_threshold(&mut self, threshold: u32) -> Result<(), VisionError> {
        if threshold == 0 {
            return Err(VisionError::Config("Threshold must be positive".to_string()));
        }
        debug!(threshold, "threshold updated");
        self.context.config.threshold = threshold;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: ColorSpaceMode) {
        debug!(?mode, "color space mode updated");
        self.context.config.mode = mode;
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn manual_threshold(&self) -> bool {
        self.manual_threshold
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.context.config
    }

    pub fn buffers(&self) -> &WorkingBuffers {
        &self.context.buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::region::{Region, Run};

    /// Reports a fixed region list and remembers what it was shown.
    struct FixedExtractor {
        regions: Vec<Region>,
        calls: usize,
        last_foreground: usize,
    }

    impl RegionExtractor for FixedExtractor {
        fn extract(&mut self, picture: &BinaryImage<'_>) -> Result<Vec<Region>, VisionError> {
            self.calls += 1;
            assert!(picture.data.iter().all(|&v| v <= 1));
            self.last_foreground = picture.data.iter().filter(|&&v| v == 1).count();
            Ok(self.regions.clone())
        }
    }

    #[derive(Default)]
    struct CountingRenderer {
        boxes: usize,
        lines: usize,
    }

    impl MarkerRenderer for CountingRenderer {
        fn draw_bounding_box(&mut self, _: BoundingBox, _: bool, _: u8) {
            self.boxes += 1;
        }

        fn draw_line(&mut self, _: i32, _: i32, _: i32, _: i32, _: u8) {
            self.lines += 1;
        }
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            image_width: 16,
            image_height: 16,
            min_area: 4,
            ..PipelineConfig::default()
        }
    }

    /// A frame with a 6x6 block of palette entry 0 at (5..11, 5..11).
    fn block_frame() -> ImagePlane {
        let mut frame = ImagePlane::color(16, 16);
        for row in 5..11 {
            for col in 5..11 {
                frame.pixel_mut(row, col).copy_from_slice(&[110, 75, 61]);
            }
        }
        frame
    }

    fn block_region() -> Region {
        let runs = (5..11).map(|row| Run::new(row, 5, 10)).collect();
        Region::new(
            0,
            36,
            BoundingBox { left: 5, top: 5, right: 10, bottom: 10 },
            Point { x: 7, y: 7 },
            runs,
        )
    }

    fn extractor(regions: Vec<Region>) -> FixedExtractor {
        FixedExtractor { regions, calls: 0, last_foreground: 0 }
    }

    #[test]
    fn first_tick_initializes_without_analysis() {
        let mut pipeline = VisionPipeline::new(small_config()).expect("valid config");
        let mut extractor = extractor(vec![block_region()]);
        let mut renderer = CountingRenderer::default();

        assert_eq!(pipeline.state(), PipelineState::Initializing);
        let report = pipeline
            .on_frame_tick(1, &block_frame(), &mut extractor, &mut renderer)
            .expect("tick");

        assert_eq!(report, Report::Initializing);
        assert_eq!(pipeline.state(), PipelineState::Steady);
        assert!(pipeline.manual_threshold());
        assert_eq!(extractor.calls, 0);
        assert_eq!(renderer.boxes, 0);
    }

    #[test]
    fn steady_tick_detects_and_renders() {
        let mut pipeline = VisionPipeline::new(small_config()).expect("valid config");
        let mut extractor = extractor(vec![block_region()]);
        let mut renderer = CountingRenderer::default();
        let frame = block_frame();

        pipeline.on_frame_tick(1, &frame, &mut extractor, &mut renderer).expect("tick");
        let report = pipeline.on_frame_tick(2, &frame, &mut extractor, &mut renderer).expect("tick");

        let Report::Analyzed(analysis) = report else {
            panic!("expected an analyzed frame");
        };
        assert_eq!(analysis.foreground_pixels, 36);
        assert_eq!(analysis.region_count, 1);
        assert_eq!(analysis.detections.len(), 1);
        assert_eq!(analysis.detections[0].label, MarkerLabel::Primary);
        assert_eq!(analysis.detections[0].display_color, 4);
        assert_eq!(extractor.last_foreground, 36);
        assert_eq!((renderer.boxes, renderer.lines), (1, 2));
    }

    #[test]
    fn reset_skips_analysis_on_the_next_tick() {
        let mut pipeline = VisionPipeline::new(small_config()).expect("valid config");
        let mut extractor = extractor(vec![block_region()]);
        let mut renderer = CountingRenderer::default();
        let frame = block_frame();

        pipeline.on_frame_tick(1, &frame, &mut extractor, &mut renderer).expect("tick");
        pipeline.on_frame_tick(2, &frame, &mut extractor, &mut renderer).expect("tick");
        assert_eq!(extractor.calls, 1);

        pipeline.on_reset();
        assert_eq!(pipeline.state(), PipelineState::Initializing);
        let report = pipeline.on_frame_tick(3, &frame, &mut extractor, &mut renderer).expect("tick");
        assert_eq!(report, Report::Initializing);
        assert_eq!(extractor.calls, 1);

        pipeline.on_frame_tick(4, &frame, &mut extractor, &mut renderer).expect("tick");
        assert_eq!(extractor.calls, 2);
    }

    #[test]
    fn regions_at_the_area_floor_are_not_reported() {
        let mut config = small_config();
        config.min_area = 36;
        let mut pipeline = VisionPipeline::new(config).expect("valid config");
        let mut extractor = extractor(vec![block_region()]);
        let mut renderer = CountingRenderer::default();
        let frame = block_frame();

        pipeline.on_frame_tick(1, &frame, &mut extractor, &mut renderer).expect("tick");
        let report = pipeline.on_frame_tick(2, &frame, &mut extractor, &mut renderer).expect("tick");
        let Report::Analyzed(analysis) = report else {
            panic!("expected an analyzed frame");
        };
        assert_eq!(analysis.region_count, 1);
        assert!(analysis.detections.is_empty());
        assert_eq!(renderer.boxes, 0);
    }

    #[test]
    fn small_region_sharing_an_id_is_not_drawn() {
        let mut large = block_region();
        large.id = 7;
        let small = Region::new(
            7,
            1,
            BoundingBox { left: 1, top: 1, right: 1, bottom: 1 },
            Point { x: 1, y: 1 },
            vec![Run::new(1, 1, 1)],
        );
        let mut pipeline = VisionPipeline::new(small_config()).expect("valid config");
        let mut extractor = extractor(vec![large, small]);
        let mut renderer = CountingRenderer::default();
        let frame = block_frame();

        pipeline.on_frame_tick(1, &frame, &mut extractor, &mut renderer).expect("tick");
        let report = pipeline.on_frame_tick(2, &frame, &mut extractor, &mut renderer).expect("tick");
        let Report::Analyzed(analysis) = report else {
            panic!("expected an analyzed frame");
        };
        assert_eq!(analysis.region_count, 2);
        assert_eq!(analysis.detections.len(), 1);
        assert_eq!(analysis.detections[0].area, 36);
        assert_eq!(analysis.detections[0].bounding_box.left, 5);
        assert_eq!((renderer.boxes, renderer.lines), (1, 2));
    }

    #[test]
    fn wrong_frame_shape_is_an_error() {
        let mut pipeline = VisionPipeline::new(small_config()).expect("valid config");
        let mut extractor = extractor(Vec::new());
        let frame = ImagePlane::color(8, 8);
        assert!(matches!(
            pipeline.analyze_frame(&frame, &mut extractor),
            Err(VisionError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn invalid_config_and_threshold_are_rejected() {
        let mut config = small_config();
        config.threshold = 0;
        assert!(VisionPipeline::new(config).is_err());

        let mut pipeline = VisionPipeline::new(small_config()).expect("valid config");
        assert!(pipeline.set_threshold(0).is_err());
        pipeline.set_threshold(80).expect("positive threshold");
        assert_eq!(pipeline.config().threshold, 80);
    }
}
