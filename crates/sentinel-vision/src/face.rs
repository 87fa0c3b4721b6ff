//! Face visibility and mask heuristic.
//!
//! A registered face mesh means the person faces the camera. The mouth area
//! of a bare face has lips and teeth and therefore a lot of second-derivative
//! energy; a mask or scarf is comparatively flat.

use image::{imageops, RgbImage};
use sentinel_models::{FaceLandmarkMesh, FaceStatus};
use tracing::debug;

use crate::config::FaceConfig;
use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;

#[cfg(feature = "opencv")]
use image::GrayImage;
#[cfg(feature = "opencv")]
use opencv::{
    core::{self, Mat, CV_64F},
    imgproc,
    prelude::*,
};

#[cfg(feature = "opencv")]
use crate::cv;

/// Classify a face that has a mesh. Returns `Ok` or `Mask`, never fails.
pub fn classify_face(mesh: &FaceLandmarkMesh, frame: &Frame, config: &FaceConfig) -> FaceStatus {
    match mouth_variance(mesh, frame, config) {
        Ok(Some(variance)) if variance < config.variance_threshold => {
            debug!(variance, "mouth laplacian variance");
            FaceStatus::Mask
        }
        Ok(Some(variance)) => {
            debug!(variance, "mouth laplacian variance");
            FaceStatus::Ok
        }
        Ok(None) => FaceStatus::Ok,
        Err(e) => {
            debug!(error = %e, "mask check skipped");
            FaceStatus::Ok
        }
    }
}

/// Face status for an optional mesh; no mesh means the face is not visible.
pub fn face_status(
    mesh: Option<&FaceLandmarkMesh>,
    frame: &Frame,
    config: &FaceConfig,
) -> FaceStatus {
    match mesh {
        Some(mesh) => classify_face(mesh, frame, config),
        None => FaceStatus::NoFace,
    }
}

/// Square window around the upper lip, clamped to the frame.
fn mouth_crop(mesh: &FaceLandmarkMesh, frame: &Frame, config: &FaceConfig) -> Option<RgbImage> {
    let lip = mesh.upper_lip()?;
    let (w, h) = (frame.width() as i64, frame.height() as i64);
    let half = config.crop_half_size as i64;
    let cx = (lip.x * w as f32) as i64;
    let cy = (lip.y * h as f32) as i64;

    let x0 = (cx - half).max(0);
    let x1 = (cx + half).min(w);
    let y0 = (cy - half).max(0);
    let y1 = (cy + half).min(h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some(
        imageops::crop_imm(
            frame.image(),
            x0 as u32,
            y0 as u32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        )
        .to_image(),
    )
}

#[cfg(feature = "opencv")]
fn mouth_variance(
    mesh: &FaceLandmarkMesh,
    frame: &Frame,
    config: &FaceConfig,
) -> VisionResult<Option<f64>> {
    let Some(crop) = mouth_crop(mesh, frame, config) else {
        return Ok(None);
    };
    let gray = cv::rgb_mat_to_gray(&cv::rgb_to_mat(&crop)?)?;
    mat_laplacian_variance(&gray).map(Some)
}

#[cfg(not(feature = "opencv"))]
fn mouth_variance(
    mesh: &FaceLandmarkMesh,
    frame: &Frame,
    config: &FaceConfig,
) -> VisionResult<Option<f64>> {
    if mouth_crop(mesh, frame, config).is_none() {
        return Ok(None);
    }
    Err(VisionError::image_processing("mask check needs the `opencv` feature"))
}

/// Population variance of the 4-neighbour Laplacian response.
#[cfg(feature = "opencv")]
pub fn laplacian_variance(gray: &GrayImage) -> VisionResult<f64> {
    if gray.width() == 0 || gray.height() == 0 {
        return Ok(0.0);
    }
    mat_laplacian_variance(&cv::gray_to_mat(gray)?)
}

#[cfg(feature = "opencv")]
fn mat_laplacian_variance(gray: &Mat) -> VisionResult<f64> {
    let mut response = Mat::default();
    imgproc::laplacian_def(gray, &mut response, CV_64F)
        .map_err(|e| VisionError::image_processing(format!("mouth laplacian: {e}")))?;

    let mut mean = Mat::default();
    let mut stddev = Mat::default();
    core::mean_std_dev_def(&response, &mut mean, &mut stddev)
        .map_err(|e| VisionError::image_processing(format!("mouth mean/stddev: {e}")))?;
    let sd = *stddev
        .at::<f64>(0)
        .map_err(|e| VisionError::image_processing(format!("mouth stddev: {e}")))?;
    Ok(sd * sd)
}
