//! Barrier edge estimation.
//!
//! Looks for the longest near-horizontal line in the lower part of the frame
//! (the top of a wall or fence) and reports its height normalized to the
//! frame. Every failure degrades to "not found".

use sentinel_models::WallEstimate;
use tracing::debug;

use crate::config::WallConfig;
use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;

#[cfg(feature = "opencv")]
use opencv::{
    core::{Mat, Rect, Size, Vec4i, Vector},
    imgproc,
    prelude::*,
};

#[cfg(feature = "opencv")]
use crate::cv;

/// Estimate the barrier line for one frame.
pub fn estimate_wall(frame: &Frame, config: &WallConfig) -> WallEstimate {
    match detect_wall_line(frame, config) {
        Ok(Some(y_norm)) => {
            debug!(y_norm, "wall line detected");
            WallEstimate::found(y_norm)
        }
        Ok(None) => WallEstimate::not_found(),
        Err(e) => {
            debug!(error = %e, "wall estimation skipped");
            WallEstimate::not_found()
        }
    }
}

/// First row of the search region and its height.
fn search_region(frame: &Frame, config: &WallConfig) -> VisionResult<(u32, u32)> {
    let (w, h) = (frame.width(), frame.height());
    let roi_start = ((h as f32) * config.roi_top_fraction.clamp(0.0, 1.0)).floor() as u32;
    let roi_start = roi_start.min(h);
    let roi_height = h - roi_start;
    if w < 3 || roi_height < 3 {
        return Err(VisionError::invalid_frame(format!(
            "wall ROI {w}x{roi_height} is too small"
        )));
    }
    Ok((roi_start, roi_height))
}

#[cfg(feature = "opencv")]
fn detect_wall_line(frame: &Frame, config: &WallConfig) -> VisionResult<Option<f32>> {
    let (roi_start, roi_height) = search_region(frame, config)?;
    let (w, h) = (frame.width(), frame.height());

    let rgb = cv::rgb_to_mat(frame.image())?;
    let gray = cv::rgb_mat_to_gray(&rgb)?;
    let roi = Mat::roi(&gray, Rect::new(0, roi_start as i32, w as i32, roi_height as i32))
        .map_err(|e| VisionError::image_processing(format!("wall roi: {e}")))?;

    let mut blurred = Mat::default();
    imgproc::gaussian_blur_def(&roi, &mut blurred, Size::new(5, 5), 0.0)
        .map_err(|e| VisionError::image_processing(format!("wall blur: {e}")))?;

    let mut edges = Mat::default();
    imgproc::canny_def(
        &blurred,
        &mut edges,
        config.canny_low as f64,
        config.canny_high as f64,
    )
    .map_err(|e| VisionError::image_processing(format!("wall canny: {e}")))?;

    let mut lines: Vector<Vec4i> = Vector::new();
    imgproc::hough_lines_p(
        &edges,
        &mut lines,
        1.0,
        std::f64::consts::PI / 180.0,
        config.hough_threshold as i32,
        (w / config.min_length_divisor.max(1)) as f64,
        config.max_line_gap as f64,
    )
    .map_err(|e| VisionError::image_processing(format!("wall hough: {e}")))?;
    debug!(count = lines.len(), "hough segments");

    let segments: Vec<LineSegment> = lines.iter().map(LineSegment::from).collect();
    Ok(longest_flat_segment(&segments, config.max_slope)
        .map(|seg| (roi_start as f32 + seg.mid_y()) / h as f32))
}

#[cfg(not(feature = "opencv"))]
fn detect_wall_line(frame: &Frame, config: &WallConfig) -> VisionResult<Option<f32>> {
    search_region(frame, config)?;
    Err(VisionError::image_processing("wall estimation needs the `opencv` feature"))
}

/// A detected segment in ROI pixel coordinates.
#[cfg(feature = "opencv")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSegment {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

#[cfg(feature = "opencv")]
impl LineSegment {
    #[cfg(test)]
    fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn length(&self) -> f32 {
        let dx = (self.x2 - self.x1) as f32;
        let dy = (self.y2 - self.y1) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Absolute slope; `None` for vertical segments.
    fn abs_slope(&self) -> Option<f32> {
        if self.x1 == self.x2 {
            return None;
        }
        Some(((self.y2 - self.y1) as f32 / (self.x2 - self.x1) as f32).abs())
    }

    fn mid_y(&self) -> f32 {
        (self.y1 + self.y2) as f32 / 2.0
    }
}

#[cfg(feature = "opencv")]
impl From<Vec4i> for LineSegment {
    fn from(v: Vec4i) -> Self {
        Self {
            x1: v[0],
            y1: v[1],
            x2: v[2],
            y2: v[3],
        }
    }
}

/// Longest segment flatter than `max_slope`; the earliest wins ties.
#[cfg(feature = "opencv")]
fn longest_flat_segment(segments: &[LineSegment], max_slope: f32) -> Option<LineSegment> {
    let mut best: Option<(LineSegment, f32)> = None;
    for seg in segments {
        let Some(slope) = seg.abs_slope() else {
            continue;
        };
        if slope >= max_slope {
            continue;
        }
        let length = seg.length();
        if best.map_or(true, |(_, best_len)| length > best_len) {
            best = Some((*seg, length));
        }
    }
    best.map(|(seg, _)| seg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const W: u32 = 320;
    const H: u32 = 240;

    fn frame_from_fn(f: impl Fn(u32, u32) -> bool) -> Frame {
        Frame::new(RgbImage::from_fn(W, H, |x, y| {
            if f(x, y) {
                Rgb([200, 200, 200])
            } else {
                Rgb([40, 40, 40])
            }
        }))
    }

    #[cfg(feature = "opencv")]
    #[test]
    fn test_finds_horizontal_edge_in_lower_area() {
        let frame = frame_from_fn(|_, y| y >= 150);
        let wall = estimate_wall(&frame, &WallConfig::default());
        assert!(wall.found);
        assert!((wall.y_norm - 0.625).abs() < 0.02, "y_norm = {}", wall.y_norm);
    }

    #[cfg(feature = "opencv")]
    #[test]
    fn test_ignores_edge_in_top_area() {
        let frame = frame_from_fn(|_, y| y >= 40);
        assert!(!estimate_wall(&frame, &WallConfig::default()).found);
    }

    #[cfg(feature = "opencv")]
    #[test]
    fn test_ignores_steep_diagonal() {
        let frame = frame_from_fn(|x, y| 2 * x < y + 60);
        assert!(!estimate_wall(&frame, &WallConfig::default()).found);
    }

    #[cfg(not(feature = "opencv"))]
    #[test]
    fn test_without_opencv_nothing_is_found() {
        let frame = frame_from_fn(|_, y| y >= 150);
        assert!(!estimate_wall(&frame, &WallConfig::default()).found);
    }

    #[test]
    fn test_blank_frame() {
        let frame = Frame::new(RgbImage::from_pixel(W, H, Rgb([90, 90, 90])));
        assert_eq!(estimate_wall(&frame, &WallConfig::default()), WallEstimate::not_found());
    }

    #[test]
    fn test_degenerate_frames_do_not_panic() {
        for (w, h) in [(0, 0), (2, 2), (100, 3), (1, 100)] {
            let frame = Frame::new(RgbImage::new(w, h));
            assert!(!estimate_wall(&frame, &WallConfig::default()).found);
        }
    }

    #[test]
    fn test_search_region() {
        let frame = Frame::new(RgbImage::new(W, H));
        assert_eq!(search_region(&frame, &WallConfig::default()).unwrap(), (72, 168));
        let tiny = Frame::new(RgbImage::new(W, 3));
        let config = WallConfig {
            roi_top_fraction: 0.5,
            ..WallConfig::default()
        };
        assert!(search_region(&tiny, &config).is_err());
    }

    #[cfg(feature = "opencv")]
    #[test]
    fn test_longest_flat_segment_selection() {
        let segments = [
            LineSegment::new(0, 10, 0, 90),   // vertical
            LineSegment::new(0, 10, 100, 40), // too steep
            LineSegment::new(0, 20, 100, 25),
            LineSegment::new(0, 50, 150, 52),
            LineSegment::new(10, 60, 160, 62), // same length as previous
        ];
        let best = longest_flat_segment(&segments, 0.1).unwrap();
        assert_eq!(best, LineSegment::new(0, 50, 150, 52));
        assert!(longest_flat_segment(&segments[..2], 0.1).is_none());
    }
}
