// Offline runner: classifies a still image, opens the mask and writes it as PNG.
// Region extraction belongs to the host, so this stops at the cleaned mask.

use anyhow::Context;
use marker_vision::core_modules::classifier::{Classifier, PixelClassifier};
use marker_vision::core_modules::morphology::MorphologyFilter;
use marker_vision::core_modules::utils::image_helper;
use marker_vision::pipeline::PipelineContext;
use marker_vision::PipelineConfig;
use std::env;
use tracing::{Level, info};

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: marker_vision <input_image> <mask_output.png> [config.json]");
        return Ok(());
    }
    let input_path = &args[1];
    let output_path = &args[2];

    let mut config = match args.get(3) {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config from {path}"))?,
        None => PipelineConfig::default(),
    };

    let frame = image_helper::load_frame(input_path, config.channel_order)
        .with_context(|| format!("loading frame from {input_path}"))?;
    config.image_width = frame.width();
    config.image_height = frame.height();

    let mut context = PipelineContext::new(config)?;
    let config = &context.config;
    let palette = *context.palette();
    let classifier = Classifier::for_mode(config.mode, config.channel_order);
    let filter = MorphologyFilter::new(config.border_margin);
    let threshold = config.threshold;

    let buffers = &mut context.buffers;
    let stats = classifier.classify(&frame, &palette, threshold, buffers);
    filter.open(&buffers.raw_mask, &mut buffers.eroded, &mut buffers.opened);

    info!(
        foreground_pixels = stats.foreground_pixels,
        after_opening = buffers.opened.count_nonzero(),
        "mask ready"
    );
    image_helper::save_mask(output_path, &buffers.opened)
        .with_context(|| format!("writing mask to {output_path}"))?;

    Ok(())
}
