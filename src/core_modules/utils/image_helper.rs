// Bridges `ImagePlane` and the `image` crate: load still frames for offline runs,
// dump masks and visualization planes as PNG for debugging.

use crate::config::ChannelOrder;
use crate::core_modules::frame::ImagePlane;
use crate::error::VisionError;
use image::ImageEncoder;
use image::RgbImage;
use std::path::Path;

/// Copies an RGB image into a frame laid out in `order`.
pub fn frame_from_rgb(image: &RgbImage, order: ChannelOrder) -> ImagePlane {
    let (width, height) = image.dimensions();
    let mut frame = ImagePlane::color(width, height);
    for (out, px) in frame.data_mut().chunks_exact_mut(3).zip(image.pixels()) {
        out.copy_from_slice(&order.arrange_rgb(px[0], px[1], px[2]));
    }
    frame
}

/// Loads any image the `image` crate can decode as a frame in `order`.
pub fn load_frame(path: impl AsRef<Path>, order: ChannelOrder) -> Result<ImagePlane, VisionError> {
    let image = image::open(path)?.to_rgb8();
    Ok(frame_from_rgb(&image, order))
}

/// Writes a single-channel mask as grayscale PNG, any non-zero value as white.
pub fn save_mask(path: impl AsRef<Path>, mask: &ImagePlane) -> Result<(), VisionError> {
    mask.ensure_shape(mask.width(), mask.height(), 1)?;
    let buffer: Vec<u8> = mask.data().iter().map(|&v| if v != 0 { 255 } else { 0 }).collect();

    let output = std::fs::File::create(path)?;
    let encoder = image::codecs::png::PngEncoder::new(output);
    encoder.write_image(&buffer, mask.width(), mask.height(), image::ExtendedColorType::L8)?;

    Ok(())
}

/// Writes a three-channel plane laid out in `order` as RGB PNG.
pub fn save_color(path: impl AsRef<Path>, plane: &ImagePlane, order: ChannelOrder) -> Result<(), VisionError> {
    plane.ensure_shape(plane.width(), plane.height(), 3)?;
    let mut buffer = Vec::with_capacity(plane.data().len());
    for px in plane.pixels() {
        let (r, g, b) = order.to_rgb(px);
        buffer.extend_from_slice(&[r, g, b]);
    }

    let output = std::fs::File::create(path)?;
    let encoder = image::codecs::png::PngEncoder::new(output);
    encoder.write_image(&buffer, plane.width(), plane.height(), image::ExtendedColorType::Rgb8)?;

    Ok(())
}
