// src/pose3d/camera.rs
//
// Coordinate-space conversions between screen pixels, the lifter's
// normalized input space, and the world frame.

use ndarray::{Array2, Array3};

/// Orientation quaternion (w, x, y, z) of the capture camera; rotates
/// network-space predictions into the world frame.
pub const CAMERA_ORIENTATION: [f32; 4] = [0.140_705_65, -0.150_070_18, -0.755_240_8, 0.622_328_04];

/// Map pixel coordinates into the centered, width-scaled space the lifting
/// network was trained on: x in [-1, 1], y scaled by the same factor.
pub fn normalize_screen_coordinates(kpts: &Array3<f32>, width: f32, height: f32) -> Array3<f32> {
    let mut out = kpts.clone();
    for mut frame in out.outer_iter_mut() {
        for mut joint in frame.outer_iter_mut() {
            joint[0] = joint[0] / width * 2.0 - 1.0;
            joint[1] = joint[1] / width * 2.0 - height / width;
        }
    }
    out
}

/// Rotate a vector by a unit quaternion (w, x, y, z).
pub fn qrot(q: [f32; 4], v: [f32; 3]) -> [f32; 3] {
    let (w, qv) = (q[0], [q[1], q[2], q[3]]);
    let uv = cross(qv, v);
    let uuv = cross(qv, uv);
    [
        v[0] + 2.0 * (w * uv[0] + uuv[0]),
        v[1] + 2.0 * (w * uv[1] + uuv[1]),
        v[2] + 2.0 * (w * uv[2] + uuv[2]),
    ]
}

/// Rotate a `(17, 3)` pose from camera space into the world frame.
pub fn camera_to_world(pose: &Array2<f32>, q: [f32; 4]) -> Array2<f32> {
    let mut out = pose.clone();
    for mut joint in out.outer_iter_mut() {
        let rotated = qrot(q, [joint[0], joint[1], joint[2]]);
        joint[0] = rotated[0];
        joint[1] = rotated[1];
        joint[2] = rotated[2];
    }
    out
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_normalize_screen_coordinates() {
        let mut kpts = Array3::zeros((1, 1, 2));
        kpts[[0, 0, 0]] = 960.0;
        kpts[[0, 0, 1]] = 540.0;

        let out = normalize_screen_coordinates(&kpts, 1920.0, 1080.0);
        // Frame center maps to the origin.
        assert!(out[[0, 0, 0]].abs() < 1e-6);
        assert!(out[[0, 0, 1]].abs() < 1e-6);

        let mut corner = Array3::zeros((1, 1, 2));
        corner[[0, 0, 0]] = 1920.0;
        corner[[0, 0, 1]] = 0.0;
        let out = normalize_screen_coordinates(&corner, 1920.0, 1080.0);
        assert!((out[[0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!((out[[0, 0, 1]] + 1080.0 / 1920.0).abs() < 1e-6);
    }

    #[test]
    fn test_qrot_identity() {
        let v = [0.3, -0.7, 1.2];
        let rotated = qrot([1.0, 0.0, 0.0, 0.0], v);
        for d in 0..3 {
            assert!((rotated[d] - v[d]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_qrot_half_turn_about_z() {
        // 180 degrees about z: (w, x, y, z) = (0, 0, 0, 1)
        let rotated = qrot([0.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.5]);
        assert!((rotated[0] + 1.0).abs() < 1e-6);
        assert!(rotated[1].abs() < 1e-6);
        assert!((rotated[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_qrot_preserves_length() {
        let v = [0.3, -0.7, 1.2];
        let rotated = qrot(CAMERA_ORIENTATION, v);
        let before = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        let after = rotated.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((before - after).abs() < 1e-4);
    }
}
