// src/render.rs
//
// Debug-frame rendering: 2D skeleton overlay on the source frame and a
// fixed-viewpoint orthographic rendering of the 3D pose.

use crate::skeleton::{BONES_2D, BONES_3D, NUM_JOINTS};
use crate::types::Frame;
use anyhow::Result;
use ndarray::ArrayView2;
use opencv::{
    core::{self, Mat, Scalar},
    imgcodecs, imgproc,
    prelude::*,
};
use std::path::Path;

// BGR color convention matches the rest of the OpenCV drawing code.
const LEFT_COLOR: (f64, f64, f64) = (255.0, 0.0, 0.0);
const RIGHT_COLOR: (f64, f64, f64) = (0.0, 0.0, 255.0);
const JOINT_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);

const BONE_THICKNESS: i32 = 5;
const JOINT_RADIUS: i32 = 5;

// Fixed 3D viewpoint and framing.
const VIEW_ELEVATION_DEG: f32 = 15.0;
const VIEW_AZIMUTH_DEG: f32 = 70.0;
const AXIS_RADIUS: f32 = 0.8;
const CANVAS_WIDTH: i32 = 960;
const CANVAS_HEIGHT: i32 = 540;

fn scalar(c: (f64, f64, f64)) -> Scalar {
    Scalar::new(c.0, c.1, c.2, 0.0)
}

/// Draw the 2D skeleton onto a copy of the source frame (BGR output).
pub fn draw_pose_2d(kpts: &ArrayView2<f32>, frame: &Frame) -> Result<Mat> {
    let mat = Mat::from_slice(&frame.data)?;
    let mat = mat.reshape(3, frame.height as i32)?;

    let mut output = Mat::default();
    imgproc::cvt_color(&mat, &mut output, imgproc::COLOR_RGB2BGR, 0)?;

    for (a, b, is_left) in BONES_2D {
        let pt1 = core::Point::new(kpts[[a, 0]] as i32, kpts[[a, 1]] as i32);
        let pt2 = core::Point::new(kpts[[b, 0]] as i32, kpts[[b, 1]] as i32);
        let color = if is_left {
            scalar(LEFT_COLOR)
        } else {
            scalar(RIGHT_COLOR)
        };
        imgproc::line(&mut output, pt1, pt2, color, BONE_THICKNESS, imgproc::LINE_AA, 0)?;
    }

    for j in 0..NUM_JOINTS {
        let pt = core::Point::new(kpts[[j, 0]] as i32, kpts[[j, 1]] as i32);
        imgproc::circle(
            &mut output,
            pt,
            JOINT_RADIUS,
            scalar(JOINT_COLOR),
            -1,
            imgproc::LINE_8,
            0,
        )?;
    }

    Ok(output)
}

/// Orthographic projection of a world-space point at the fixed viewpoint.
/// Returns canvas pixel coordinates.
fn project(p: [f32; 3]) -> core::Point {
    let az = VIEW_AZIMUTH_DEG.to_radians();
    let el = VIEW_ELEVATION_DEG.to_radians();

    // Rotate about z by the azimuth, then tilt by the elevation.
    let x = az.cos() * p[0] + az.sin() * p[1];
    let y = -az.sin() * p[0] + az.cos() * p[1];
    let v = -el.sin() * y + el.cos() * p[2];

    let scale = CANVAS_HEIGHT as f32 / (2.0 * AXIS_RADIUS);
    let cx = CANVAS_WIDTH as f32 / 2.0;
    let cy = CANVAS_HEIGHT as f32 * 0.75;

    core::Point::new((cx + x * scale) as i32, (cy - v * scale) as i32)
}

/// Render the 3D skeleton onto a white canvas at the fixed viewpoint. A
/// foot joint sitting on the floor plane gets a blade-contact marker.
pub fn render_pose_3d(pose: &ArrayView2<f32>) -> Result<Mat> {
    let mut canvas = Mat::new_rows_cols_with_default(
        CANVAS_HEIGHT,
        CANVAS_WIDTH,
        core::CV_8UC3,
        Scalar::all(255.0),
    )?;

    for (a, b, is_left) in BONES_3D {
        let pt1 = project([pose[[a, 0]], pose[[a, 1]], pose[[a, 2]]]);
        let pt2 = project([pose[[b, 0]], pose[[b, 1]], pose[[b, 2]]]);
        let color = if is_left {
            scalar(LEFT_COLOR)
        } else {
            scalar(RIGHT_COLOR)
        };
        imgproc::line(&mut canvas, pt1, pt2, color, 2, imgproc::LINE_AA, 0)?;
    }

    for j in 0..NUM_JOINTS {
        let pt = project([pose[[j, 0]], pose[[j, 1]], pose[[j, 2]]]);
        imgproc::circle(&mut canvas, pt, 3, scalar(JOINT_COLOR), -1, imgproc::LINE_8, 0)?;
    }

    // Blade contact: foot joints exactly on the floor after alignment.
    for foot in [3usize, 6] {
        if pose[[foot, 2]] == 0.0 {
            let pt = project([pose[[foot, 0]], pose[[foot, 1]], 0.0]);
            imgproc::draw_marker(
                &mut canvas,
                pt,
                scalar((0.0, 165.0, 255.0)),
                imgproc::MARKER_TRIANGLE_UP,
                14,
                2,
                imgproc::LINE_AA,
            )?;
        }
    }

    Ok(canvas)
}

/// Write an indexed debug frame, e.g. `0042_3D.png`.
pub fn save_frame(dir: &Path, index: usize, suffix: &str, mat: &Mat) -> Result<()> {
    let path = dir.join(format!("{:04}_{}.png", index, suffix));
    imgcodecs::imwrite(path.to_str().unwrap(), mat, &core::Vector::new())?;
    Ok(())
}
