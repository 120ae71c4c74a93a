// src/preprocessing.rs

use anyhow::Result;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};

/// Preprocess a raw RGB frame for the 2D pose network: resize to the square
/// detector resolution, ImageNet-normalize, and convert HWC -> CHW.
pub fn preprocess(
    src: &[u8],
    src_width: usize,
    src_height: usize,
    dst_size: usize,
) -> Result<Vec<f32>> {
    anyhow::ensure!(
        src.len() == src_width * src_height * 3,
        "Frame buffer is {} bytes, expected {}x{}x3",
        src.len(),
        src_width,
        src_height
    );
    let mat = Mat::from_slice(src)?;
    let mat = mat.reshape(3, src_height as i32)?;

    let mut resized = Mat::default();
    imgproc::resize(
        &mat,
        &mut resized,
        core::Size::new(dst_size as i32, dst_size as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    const STD: [f32; 3] = [0.229, 0.224, 0.225];

    let pixels = resized.data_bytes()?;
    let mut output = vec![0.0f32; 3 * dst_size * dst_size];

    for c in 0..3 {
        for h in 0..dst_size {
            for w in 0..dst_size {
                let hwc_idx = (h * dst_size + w) * 3 + c;
                let chw_idx = c * dst_size * dst_size + h * dst_size + w;

                let pixel = pixels[hwc_idx] as f32 / 255.0;
                output[chw_idx] = (pixel - MEAN[c]) / STD[c];
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_shape() {
        let src = vec![128u8; 640 * 480 * 3];
        let result = preprocess(&src, 640, 480, 416).unwrap();
        assert_eq!(result.len(), 3 * 416 * 416);
    }

    #[test]
    fn test_preprocess_normalization() {
        // Uniform mid-gray: every output channel is (128/255 - mean) / std.
        let src = vec![128u8; 64 * 64 * 3];
        let result = preprocess(&src, 64, 64, 32).unwrap();

        let expected_r = (128.0 / 255.0 - 0.485) / 0.229;
        let expected_b = (128.0 / 255.0 - 0.406) / 0.225;
        assert!((result[0] - expected_r).abs() < 1e-5);
        assert!((result[2 * 32 * 32] - expected_b).abs() < 1e-5);
    }
}
