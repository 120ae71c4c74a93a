// src/pose2d/refine.rs
//
// Post-processing of raw detections: COCO 17-keypoint layout to the
// canonical H36M layout, plus confidence-based interpolation of unreliable
// frames.

use anyhow::Result;
use ndarray::{Array2, Array3};

use crate::skeleton::NUM_JOINTS;

// H36M joints that have no direct COCO counterpart and are synthesized:
// head (10), thorax (8), hip (0), spine (7).
const SYNTHESIZED: [usize; 4] = [10, 8, 0, 7];

// Index permutation for the joints that map one-to-one.
const H36M_ORDER: [usize; 13] = [9, 11, 14, 12, 15, 13, 16, 4, 1, 5, 2, 6, 3];
const COCO_ORDER: [usize; 13] = [0, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];

/// Convert a COCO keypoint sequence `(frames, 17, 2)` with scores
/// `(frames, 17)` into the canonical H36M layout.
pub fn coco_to_h36m(
    kpts: &Array3<f32>,
    scores: &Array2<f32>,
) -> (Array3<f32>, Array2<f32>) {
    let frames = kpts.shape()[0];
    let mut out = Array3::zeros((frames, NUM_JOINTS, 2));
    let mut out_scores = Array2::zeros((frames, NUM_JOINTS));

    for f in 0..frames {
        // head, thorax, hip, spine
        let mut synth = [[0.0f32; 2]; 4];

        // Head: x from the eye/ear centroid, y mirrored about the nose.
        synth[0][0] = (1..5).map(|j| kpts[[f, j, 0]]).sum::<f32>() / 4.0;
        synth[0][1] = kpts[[f, 1, 1]] + kpts[[f, 2, 1]] - kpts[[f, 0, 1]];

        // Thorax: shoulder midpoint pulled a third of the way to the nose.
        for d in 0..2 {
            let mid = (kpts[[f, 5, d]] + kpts[[f, 6, d]]) / 2.0;
            synth[1][d] = mid + (kpts[[f, 0, d]] - mid) / 3.0;
        }

        // Hip: midpoint of the COCO hips.
        for d in 0..2 {
            synth[2][d] = (kpts[[f, 11, d]] + kpts[[f, 12, d]]) / 2.0;
        }

        // Spine: centroid of shoulders and hips.
        for d in 0..2 {
            synth[3][d] =
                (kpts[[f, 5, d]] + kpts[[f, 6, d]] + kpts[[f, 11, d]] + kpts[[f, 12, d]]) / 4.0;
        }

        for (slot, joint) in SYNTHESIZED.iter().enumerate() {
            out[[f, *joint, 0]] = synth[slot][0];
            out[[f, *joint, 1]] = synth[slot][1];
        }

        for (h, c) in H36M_ORDER.iter().zip(COCO_ORDER.iter()) {
            out[[f, *h, 0]] = kpts[[f, *c, 0]];
            out[[f, *h, 1]] = kpts[[f, *c, 1]];
            out_scores[[f, *h]] = scores[[f, *c]];
        }

        // Pull the neck back toward the shoulder midpoint and push the
        // spine/thorax into anatomically plausible spots.
        for d in 0..2 {
            let shoulder_mid = (kpts[[f, 5, d]] + kpts[[f, 6, d]]) / 2.0;
            out[[f, 9, d]] -= (out[[f, 9, d]] - shoulder_mid) / 4.0;
        }
        let hip_thorax_mid_x = (out[[f, 0, 0]] + out[[f, 8, 0]]) / 2.0;
        out[[f, 7, 0]] += 2.0 * (out[[f, 7, 0]] - hip_thorax_mid_x);
        let eye_mid_y = (kpts[[f, 1, 1]] + kpts[[f, 2, 1]]) / 2.0;
        out[[f, 8, 1]] -= (eye_mid_y - kpts[[f, 0, 1]]) * 2.0 / 3.0;

        out_scores[[f, 0]] = (scores[[f, 11]] + scores[[f, 12]]) / 2.0;
        out_scores[[f, 8]] = (scores[[f, 5]] + scores[[f, 6]]) / 2.0;
        out_scores[[f, 7]] = (out_scores[[f, 0]] + out_scores[[f, 8]]) / 2.0;
        out_scores[[f, 10]] = (1..5).map(|j| scores[[f, j]]).sum::<f32>() / 4.0;
    }

    (out, out_scores)
}

/// Index of the first frame with any nonzero detection.
pub fn first_valid_frame(kpts: &Array3<f32>) -> Option<usize> {
    let frames = kpts.shape()[0];
    (0..frames).find(|&f| {
        kpts.index_axis(ndarray::Axis(0), f)
            .iter()
            .any(|&v| v != 0.0)
    })
}

/// Replace frames whose mean joint confidence falls below `threshold` by
/// linear interpolation between the nearest confident neighbors. Frames at
/// the edges copy the nearest valid frame. Returns a new array.
pub fn interpolate_low_confidence(
    kpts: &Array3<f32>,
    scores: &Array2<f32>,
    threshold: f32,
) -> Result<Array3<f32>> {
    let frames = kpts.shape()[0];
    let valid: Vec<usize> = (0..frames)
        .filter(|&f| {
            let row = scores.index_axis(ndarray::Axis(0), f);
            row.mean().unwrap_or(0.0) >= threshold
        })
        .collect();

    anyhow::ensure!(
        !valid.is_empty(),
        "No frame passed the confidence threshold {:.2}",
        threshold
    );

    let mut out = kpts.clone();

    for f in 0..frames {
        if valid.binary_search(&f).is_ok() {
            continue;
        }

        let prev = valid.iter().rev().find(|&&v| v < f).copied();
        let next = valid.iter().find(|&&v| v > f).copied();

        match (prev, next) {
            (Some(p), Some(n)) => {
                let t = (f - p) as f32 / (n - p) as f32;
                for j in 0..NUM_JOINTS {
                    for d in 0..2 {
                        out[[f, j, d]] =
                            kpts[[p, j, d]] * (1.0 - t) + kpts[[n, j, d]] * t;
                    }
                }
            }
            (Some(p), None) => {
                for j in 0..NUM_JOINTS {
                    for d in 0..2 {
                        out[[f, j, d]] = kpts[[p, j, d]];
                    }
                }
            }
            (None, Some(n)) => {
                for j in 0..NUM_JOINTS {
                    for d in 0..2 {
                        out[[f, j, d]] = kpts[[n, j, d]];
                    }
                }
            }
            (None, None) => unreachable!(),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn uniform_pose(value: f32) -> Array3<f32> {
        Array3::from_elem((1, NUM_JOINTS, 2), value)
    }

    #[test]
    fn test_hip_is_coco_hip_midpoint() {
        let mut kpts = uniform_pose(0.0);
        kpts[[0, 11, 0]] = 100.0;
        kpts[[0, 11, 1]] = 200.0;
        kpts[[0, 12, 0]] = 300.0;
        kpts[[0, 12, 1]] = 400.0;
        let scores = Array2::from_elem((1, NUM_JOINTS), 0.9);

        let (h36m, _) = coco_to_h36m(&kpts, &scores);
        assert_eq!(h36m[[0, 0, 0]], 200.0);
        assert_eq!(h36m[[0, 0, 1]], 300.0);
    }

    #[test]
    fn test_one_to_one_joints_are_permuted() {
        let mut kpts = uniform_pose(0.0);
        // COCO left ankle -> H36M LeftFoot (6)
        kpts[[0, 15, 0]] = 50.0;
        kpts[[0, 15, 1]] = 60.0;
        let scores = Array2::from_elem((1, NUM_JOINTS), 0.9);

        let (h36m, h36m_scores) = coco_to_h36m(&kpts, &scores);
        assert_eq!(h36m[[0, 6, 0]], 50.0);
        assert_eq!(h36m[[0, 6, 1]], 60.0);
        assert_eq!(h36m_scores[[0, 6]], 0.9);
    }

    #[test]
    fn test_first_valid_frame_skips_empty_frames() {
        let mut kpts = Array3::zeros((3, NUM_JOINTS, 2));
        kpts[[2, 4, 0]] = 1.0;
        assert_eq!(first_valid_frame(&kpts), Some(2));

        let empty = Array3::zeros((3, NUM_JOINTS, 2));
        assert_eq!(first_valid_frame(&empty), None);
    }

    #[test]
    fn test_interpolation_fills_midpoint() {
        let mut kpts = Array3::zeros((3, NUM_JOINTS, 2));
        for j in 0..NUM_JOINTS {
            kpts[[0, j, 0]] = 10.0;
            kpts[[2, j, 0]] = 20.0;
            // Frame 1 holds garbage that must be replaced.
            kpts[[1, j, 0]] = 999.0;
        }
        let mut scores = Array2::from_elem((3, NUM_JOINTS), 0.9);
        for j in 0..NUM_JOINTS {
            scores[[1, j]] = 0.0;
        }

        let out = interpolate_low_confidence(&kpts, &scores, 0.3).unwrap();
        assert_eq!(out[[1, 0, 0]], 15.0);
        // Valid frames are untouched.
        assert_eq!(out[[0, 0, 0]], 10.0);
        assert_eq!(out[[2, 0, 0]], 20.0);
    }

    #[test]
    fn test_interpolation_edges_copy_nearest() {
        let mut kpts = Array3::zeros((3, NUM_JOINTS, 2));
        for j in 0..NUM_JOINTS {
            kpts[[1, j, 1]] = 42.0;
        }
        let mut scores = Array2::zeros((3, NUM_JOINTS));
        for j in 0..NUM_JOINTS {
            scores[[1, j]] = 0.9;
        }

        let out = interpolate_low_confidence(&kpts, &scores, 0.3).unwrap();
        assert_eq!(out[[0, 3, 1]], 42.0);
        assert_eq!(out[[2, 3, 1]], 42.0);
    }

    #[test]
    fn test_interpolation_fails_without_valid_frames() {
        let kpts = Array3::zeros((2, NUM_JOINTS, 2));
        let scores = Array2::zeros((2, NUM_JOINTS));
        assert!(interpolate_low_confidence(&kpts, &scores, 0.3).is_err());
    }
}
