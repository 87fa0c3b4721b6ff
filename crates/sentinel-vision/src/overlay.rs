//! Snapshot annotation: wall line, status banner and wave progress.
//!
//! Drawing always happens on a copy; the input frame is never modified.

use image::{Rgb, RgbImage};
use sentinel_models::{AlertLevel, WallEstimate};

use crate::frame::Frame;

const WALL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BANNER_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const TRACK_COLOR: Rgb<u8> = Rgb([64, 64, 64]);
const WAVE_COLOR: Rgb<u8> = Rgb([0, 200, 255]);

/// Banner area, in pixels from the top-left corner.
const BANNER_TOP: i64 = 10;
const BANNER_BOTTOM: i64 = 80;
const MARGIN: i64 = 10;
const WALL_THICKNESS: i64 = 3;

/// What to draw on a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Annotation {
    pub level: AlertLevel,
    pub wall: WallEstimate,
    /// Wave progress in `[0, 1]`
    pub wave_progress: f32,
}

/// Return an annotated copy of `frame`.
pub fn annotate(frame: &Frame, annotation: &Annotation) -> Frame {
    let mut image = frame.image().clone();
    let (w, h) = (image.width() as i64, image.height() as i64);
    if w == 0 || h == 0 {
        return Frame::new(image);
    }

    if let Some(y_norm) = annotation.wall.line() {
        let y = (y_norm * h as f32) as i64;
        let half = WALL_THICKNESS / 2;
        fill_rect(&mut image, 0, y - half, w, y + half + 1, WALL_COLOR);
    }

    fill_rect(&mut image, MARGIN, BANNER_TOP, w - MARGIN, BANNER_BOTTOM, BANNER_COLOR);

    let inner_left = MARGIN * 2;
    let inner_right = w - MARGIN * 2;
    let [r, g, b] = annotation.level.color_rgb();
    let swatch_right = inner_left + (inner_right - inner_left) / 4;
    fill_rect(&mut image, inner_left, 20, swatch_right, 40, Rgb([r, g, b]));

    fill_rect(&mut image, inner_left, 50, inner_right, 60, TRACK_COLOR);
    let progress = annotation.wave_progress.clamp(0.0, 1.0);
    let filled = inner_left + ((inner_right - inner_left) as f32 * progress) as i64;
    fill_rect(&mut image, inner_left, 50, filled, 60, WAVE_COLOR);

    Frame::new(image)
}

/// Fill `[x0, x1) x [y0, y1)`, clipped to the image.
fn fill_rect(image: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let (x0, x1) = (x0.clamp(0, w), x1.clamp(0, w));
    let (y0, y1) = (y0.clamp(0, h), y1.clamp(0, h));
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}
