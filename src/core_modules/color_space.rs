// THEORY:
// The `ColorSpaceConverter` turns a sensor pixel into the (Y, Cb, Cr) triple used
// by luma-chroma classification. Separating brightness (Y) from color (Cb, Cr)
// lets the classifier ignore lighting changes by dropping Y from the comparison.
//
// Numeric contract:
//   Y  =       0.299 R + 0.587 G + 0.114 B
//   Cb = 128 - 0.169 R - 0.331 G + 0.500 B
//   Cr = 128 + 0.500 R - 0.419 G - 0.081 B
// Each result is converted to 8 bits by truncation toward zero, not rounding,
// saturating at 0 and 255 (the semantics of Rust's float-to-int `as` cast).
// A channel that comes out as 127.99 is stored as 127. Results are therefore
// reproducible bit for bit, and slightly biased low compared to a rounded
// conversion.

use crate::config::ChannelOrder;
use crate::core_modules::frame::ImagePlane;
use crate::core_modules::palette::Color;

/// Converts native-order sensor pixels into (Y, Cb, Cr).
#[derive(Debug, Clone, Copy)]
pub struct ColorSpaceConverter {
    order: ChannelOrder,
}

impl ColorSpaceConverter {
    pub fn new(order: ChannelOrder) -> Self {
        Self { order }
    }

    /// Converts one native-order pixel. Output is always (Y, Cb, Cr).
    #[inline]
    pub fn to_luma_chroma(&self, pixel: &[u8]) -> Color {
        let (red, green, blue) = self.order.to_rgb(pixel);
        let r = red as f64;
        let g = green as f64;
        let b = blue as f64;

        let y = 0.299_f64 * r + 0.587_f64 * g + 0.114_f64 * b;
        let cb = 128.0_f64 - 0.169_f64 * r - 0.331_f64 * g + 0.500_f64 * b;
        let cr = 128.0_f64 + 0.500_f64 * r - 0.419_f64 * g - 0.081_f64 * b;

        [y as u8, cb as u8, cr as u8]
    }

    /// Converts every pixel of `frame` into `dest`. Both planes must share a shape.
    pub fn convert_frame(&self, frame: &ImagePlane, dest: &mut ImagePlane) {
        debug_assert_eq!(frame.shape(), dest.shape());
        for (src, out) in frame
            .data()
            .chunks_exact(frame.channels())
            .zip(dest.data_mut().chunks_exact_mut(3))
        {
            out.copy_from_slice(&self.to_luma_chroma(src));
        }
    }
}
