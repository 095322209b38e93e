// THEORY:
// Drawing is done by the host. The pipeline only decides *what* to draw: for each
// reported object, an unfilled rectangle around its bounding box and a cross
// centered on its centroid, both in the display color mapped from the object's
// label. `MarkerRenderer` is the seam the host implements.

use crate::core_modules::region::{BoundingBox, Point};

/// Host-side drawing primitives.
pub trait MarkerRenderer {
    fn draw_bounding_box(&mut self, bounding_box: BoundingBox, filled: bool, color: u8);

    /// Endpoints may lie outside the frame; clipping is the renderer's job.
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u8);
}

/// Draws the bounding box and a cross of half-length `cross_size` at `centroid`.
pub fn draw_marker<R: MarkerRenderer + ?Sized>(
    renderer: &mut R,
    bounding_box: BoundingBox,
    centroid: Point,
    color: u8,
    cross_size: u32,
) {
    renderer.draw_bounding_box(bounding_box, false, color);

    let x = centroid.x as i32;
    let y = centroid.y as i32;
    let half = cross_size as i32;
    renderer.draw_line(x - half, y, x + half, y, color);
    renderer.draw_line(x, y - half, x, y + half, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        boxes: Vec<(BoundingBox, bool, u8)>,
        lines: Vec<(i32, i32, i32, i32, u8)>,
    }

    impl MarkerRenderer for Recorder {
        fn draw_bounding_box(&mut self, bounding_box: BoundingBox, filled: bool, color: u8) {
            self.boxes.push((bounding_box, filled, color));
        }

        fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u8) {
            self.lines.push((x0, y0, x1, y1, color));
        }
    }

    #[test]
    fn marker_is_a_box_and_a_cross() {
        let mut recorder = Recorder::default();
        let bbox = BoundingBox { left: 10, top: 20, right: 40, bottom: 60 };
        draw_marker(&mut recorder, bbox, Point { x: 25, y: 40 }, 4, 10);

        assert_eq!(recorder.boxes, vec![(bbox, false, 4)]);
        assert_eq!(recorder.lines, vec![(15, 40, 35, 40, 4), (25, 30, 25, 50, 4)]);
    }

    #[test]
    fn cross_may_extend_past_the_origin() {
        let mut recorder = Recorder::default();
        let bbox = BoundingBox { left: 0, top: 0, right: 4, bottom: 4 };
        draw_marker(&mut recorder, bbox, Point { x: 2, y: 3 }, 2, 10);
        assert_eq!(recorder.lines[0], (-8, 3, 12, 3, 2));
        assert_eq!(recorder.lines[1], (2, -7, 2, 13, 2));
    }
}
