//! Conversions between `image` buffers and OpenCV matrices.

use image::{GrayImage, RgbImage};
use opencv::core::{Mat, Scalar, ToInputArray, CV_8UC1, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::*;

use crate::error::{VisionError, VisionResult};

/// Copy packed RGB pixels into a new 8UC3 matrix.
pub(crate) fn rgb_to_mat(image: &RgbImage) -> VisionResult<Mat> {
    packed_to_mat(image.as_raw(), image.width(), image.height(), CV_8UC3)
}

/// Copy 8-bit gray pixels into a new 8UC1 matrix.
pub(crate) fn gray_to_mat(image: &GrayImage) -> VisionResult<Mat> {
    packed_to_mat(image.as_raw(), image.width(), image.height(), CV_8UC1)
}

fn packed_to_mat(data: &[u8], width: u32, height: u32, typ: i32) -> VisionResult<Mat> {
    if width == 0 || height == 0 {
        return Err(VisionError::invalid_frame(format!(
            "cannot build a {width}x{height} matrix"
        )));
    }
    let mut mat =
        Mat::new_rows_cols_with_default(height as i32, width as i32, typ, Scalar::all(0.0))?;
    let dst = mat.data_bytes_mut()?;
    if dst.len() != data.len() {
        return Err(VisionError::invalid_frame(format!(
            "matrix holds {} bytes, image has {}",
            dst.len(),
            data.len()
        )));
    }
    dst.copy_from_slice(data);
    Ok(mat)
}

/// RGB matrix to single-channel gray.
pub(crate) fn rgb_mat_to_gray(rgb: &impl ToInputArray) -> VisionResult<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color_def(rgb, &mut gray, imgproc::COLOR_RGB2GRAY)?;
    Ok(gray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_gray_weights() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([255, 0, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));
        let gray = rgb_mat_to_gray(&rgb_to_mat(&img).unwrap()).unwrap();
        assert_eq!(gray.channels(), 1);
        assert_eq!(*gray.at_2d::<u8>(0, 0).unwrap(), 255);
        assert_eq!(*gray.at_2d::<u8>(0, 1).unwrap(), 76);
        assert_eq!(*gray.at_2d::<u8>(0, 2).unwrap(), 29);
    }

    #[test]
    fn test_layout_is_row_major() {
        let img = GrayImage::from_fn(4, 2, |x, y| image::Luma([(y * 4 + x) as u8]));
        let mat = gray_to_mat(&img).unwrap();
        assert_eq!((mat.rows(), mat.cols()), (2, 4));
        assert_eq!(*mat.at_2d::<u8>(1, 2).unwrap(), 6);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        assert!(matches!(
            gray_to_mat(&GrayImage::new(0, 3)),
            Err(VisionError::InvalidFrame(_))
        ));
    }
}
