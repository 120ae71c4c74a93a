// src/skeleton.rs
//
// H36M 17-joint layout shared by every pipeline stage. Joint order is a
// contract between the 2D extractor, the lifter, the feature extractor and
// the renderer.

use ndarray::{s, Array2, Array3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Joint {
    Hip = 0,
    RightHip = 1,
    RightKnee = 2,
    RightFoot = 3,
    LeftHip = 4,
    LeftKnee = 5,
    LeftFoot = 6,
    Spine = 7,
    Thorax = 8,
    Neck = 9,
    Head = 10,
    LeftShoulder = 11,
    LeftElbow = 12,
    LeftWrist = 13,
    RightShoulder = 14,
    RightElbow = 15,
    RightWrist = 16,
}

pub const NUM_JOINTS: usize = 17;

/// First 7 joints cover hip and both legs; used by the lower-body
/// feature mode.
pub const LOWER_BODY_JOINTS: usize = 7;

/// Symmetric joint index sets for the horizontal-flip augmentation.
pub const JOINTS_LEFT: [usize; 6] = [4, 5, 6, 11, 12, 13];
pub const JOINTS_RIGHT: [usize; 6] = [1, 2, 3, 14, 15, 16];

/// Bone list for the 2D overlay: (from, to, drawn in the left color group).
pub const BONES_2D: [(usize, usize, bool); 16] = [
    (0, 1, false),
    (1, 2, false),
    (2, 3, false),
    (0, 4, true),
    (4, 5, true),
    (5, 6, true),
    (0, 7, true),
    (7, 8, true),
    (8, 9, true),
    (9, 10, true),
    (8, 11, true),
    (11, 12, true),
    (12, 13, true),
    (8, 14, false),
    (14, 15, false),
    (15, 16, false),
];

/// Bone list for the 3D rendering, same color convention.
pub const BONES_3D: [(usize, usize, bool); 16] = [
    (0, 1, false),
    (0, 4, true),
    (1, 2, false),
    (4, 5, true),
    (2, 3, false),
    (5, 6, true),
    (0, 7, false),
    (7, 8, false),
    (8, 14, false),
    (8, 11, true),
    (14, 15, false),
    (15, 16, false),
    (11, 12, true),
    (12, 13, true),
    (8, 9, false),
    (9, 10, false),
];

/// Mirror a keypoint sequence `(frames, 17, dims)`: negate the x axis and
/// swap the symmetric joints. Returns a new array; applying it twice is the
/// identity.
pub fn flip_sequence(kpts: &Array3<f32>) -> Array3<f32> {
    let mut out = kpts.clone();
    out.slice_mut(s![.., .., 0]).mapv_inplace(|v| -v);
    let frames = out.shape()[0];
    let dims = out.shape()[2];
    for (&l, &r) in JOINTS_LEFT.iter().zip(JOINTS_RIGHT.iter()) {
        for f in 0..frames {
            for d in 0..dims {
                out.swap([f, l, d], [f, r, d]);
            }
        }
    }
    out
}

/// Single-frame variant of [`flip_sequence`] for un-mirroring the lifter
/// output `(17, dims)`.
pub fn flip_frame(pose: &Array2<f32>) -> Array2<f32> {
    let mut out = pose.clone();
    out.slice_mut(s![.., 0]).mapv_inplace(|v| -v);
    let dims = out.shape()[1];
    for (&l, &r) in JOINTS_LEFT.iter().zip(JOINTS_RIGHT.iter()) {
        for d in 0..dims {
            out.swap([l, d], [r, d]);
        }
    }
    out
}
