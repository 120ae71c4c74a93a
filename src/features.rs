// src/features.rs
//
// Turns a 3D keypoint clip into the flat feature vector the classifier was
// fitted on.

use anyhow::Result;
use ndarray::{Array2, Array3};
use std::path::PathBuf;
use tracing::debug;

use crate::archive;

/// Frame rate the training clips were captured at; target rates decimate
/// from this.
pub const NATIVE_FPS: usize = 240;

/// Decimate a `(frames, joints, 3)` clip to the target rate, keep the first
/// `n_joints` joints, and flatten frame-major, joint-major, axis-minor.
pub fn flatten_clip(clip: &Array3<f32>, step: usize, n_joints: usize) -> Vec<f32> {
    let mut out = Vec::new();
    for f in (0..clip.shape()[0]).step_by(step) {
        for j in 0..n_joints.min(clip.shape()[1]) {
            for d in 0..clip.shape()[2] {
                out.push(clip[[f, j, d]]);
            }
        }
    }
    out
}

/// Load each archive and produce one feature vector per clip,
/// `(clips, frames_after_subsampling * n_joints * 3)`.
pub fn extract_features(paths: &[PathBuf], fps: usize, n_joints: usize) -> Result<Array2<f32>> {
    anyhow::ensure!(
        fps > 0 && NATIVE_FPS % fps == 0,
        "Target fps {} must divide the native rate {}",
        fps,
        NATIVE_FPS
    );
    anyhow::ensure!(!paths.is_empty(), "No keypoint archives given");
    let step = NATIVE_FPS / fps;

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(paths.len());
    for path in paths {
        let clip = archive::load_reconstruction(path)?;
        let vector = flatten_clip(&clip, step, n_joints);
        debug!(
            "Clip {}: {} frames -> {} features",
            path.display(),
            clip.shape()[0],
            vector.len()
        );
        vectors.push(vector);
    }

    let dim = vectors[0].len();
    anyhow::ensure!(
        vectors.iter().all(|v| v.len() == dim),
        "Clips produced feature vectors of different lengths"
    );

    let flat: Vec<f32> = vectors.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((paths.len(), dim), flat)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{LOWER_BODY_JOINTS, NUM_JOINTS};

    fn clip(frames: usize) -> Array3<f32> {
        Array3::from_shape_fn((frames, NUM_JOINTS, 3), |(f, j, d)| {
            (f * 100 + j * 10 + d) as f32
        })
    }

    #[test]
    fn test_flatten_length_is_frames_by_joints_by_axes() {
        let v = flatten_clip(&clip(160), 20, NUM_JOINTS);
        assert_eq!(v.len(), 8 * NUM_JOINTS * 3);
    }

    #[test]
    fn test_flatten_order_is_frame_joint_axis() {
        let v = flatten_clip(&clip(160), 20, NUM_JOINTS);
        // First entries are frame 0, joint 0, axes 0..3.
        assert_eq!(&v[0..3], &[0.0, 1.0, 2.0]);
        // Next joint follows.
        assert_eq!(v[3], 10.0);
        // Second kept frame is frame 20.
        assert_eq!(v[NUM_JOINTS * 3], 2000.0);
    }

    #[test]
    fn test_lower_body_mode_is_joint_ratio_of_full() {
        let full = flatten_clip(&clip(160), 20, NUM_JOINTS);
        let lower = flatten_clip(&clip(160), 20, LOWER_BODY_JOINTS);
        assert_eq!(
            lower.len() * NUM_JOINTS,
            full.len() * LOWER_BODY_JOINTS
        );
        // Lower-body vectors only ever see the first 7 joints
        // (joint index is encoded in the tens digit of the test data).
        assert!(lower.iter().all(|&x| (x as usize % 100) < 70));
    }

    #[test]
    fn test_fps_must_divide_native_rate() {
        assert!(extract_features(&[], 7, NUM_JOINTS).is_err());
        assert!(extract_features(&[], 0, NUM_JOINTS).is_err());
    }
}
