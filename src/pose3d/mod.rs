// src/pose3d/mod.rs

pub mod camera;
pub mod lifter;

use anyhow::Result;
use ndarray::{s, Array3, Axis};
use std::path::Path;
use tracing::{debug, info};

use crate::archive;
use crate::render;
use crate::skeleton;
use crate::video_processor;
use lifter::PoseLifter;

/// Extract the temporal window centered on `index`, clamped to the sequence
/// and edge-padded by boundary replication to exactly `frames` entries.
pub fn window_at(kpts: &Array3<f32>, index: usize, frames: usize) -> Array3<f32> {
    let len = kpts.shape()[0];
    assert!(len > 0, "Cannot window an empty keypoint sequence");
    let pad = (frames - 1) / 2;

    let start = index.saturating_sub(pad);
    let end = (index + pad).min(len - 1);

    let left_pad = pad - (index - start);
    let right_pad = pad - (end - index);

    let mut out = Array3::zeros((frames, kpts.shape()[1], kpts.shape()[2]));
    for i in 0..frames {
        // Positions outside [start, end] replicate the boundary frame.
        let src = if i < left_pad {
            start
        } else if i >= frames - right_pad {
            end
        } else {
            start + (i - left_pad)
        };
        out.index_axis_mut(Axis(0), i)
            .assign(&kpts.index_axis(Axis(0), src));
    }
    out
}

/// Lift the refined 2D sequence to 3D, one centered window per target frame.
/// Each frame is predicted twice (original and mirrored input) and the two
/// estimates are averaged to cancel left/right bias. Writes annotated 2D and
/// rendered 3D debug frames plus the compressed 3D archive, and returns the
/// `(frames, 17, 3)` world-space sequence.
pub fn lift_3d(
    video_path: &Path,
    output_dir: &Path,
    keypoints: &Array3<f32>,
    lifter: &mut PoseLifter,
    start_frame: usize,
    cut_frames: usize,
) -> Result<Array3<f32>> {
    let mut reader = video_processor::open_video(video_path)?;
    reader.seek_to(start_frame)?;

    let width = reader.width as f32;
    let height = reader.height as f32;

    let available = keypoints.shape()[0];
    let target_frames = cut_frames.min(available);
    if target_frames < cut_frames {
        info!(
            "Only {} keypoint frames available, clamping 3D stage from {}",
            available, cut_frames
        );
    }

    let dir_2d = output_dir.join("pose2D");
    let dir_3d = output_dir.join("pose3D");
    std::fs::create_dir_all(&dir_2d)?;
    std::fs::create_dir_all(&dir_3d)?;

    info!("Generating 3D pose ({} frames)...", target_frames);

    let mut poses = Array3::zeros((target_frames, skeleton::NUM_JOINTS, 3));

    for i in 0..target_frames {
        let frame = match reader.read_frame()? {
            Some(frame) => frame,
            None => {
                info!("Video ended early at frame {}", i);
                poses = poses.slice(s![..i, .., ..]).to_owned();
                break;
            }
        };

        let window = window_at(keypoints, i, lifter.frames);
        let input = camera::normalize_screen_coordinates(&window, width, height);
        let input_flipped = skeleton::flip_sequence(&input);

        let pose = lifter.lift(input)?;
        let pose_flipped = skeleton::flip_frame(&lifter.lift(input_flipped)?);

        let mut pose = (&pose + &pose_flipped) / 2.0;

        // Predictions are root-relative; pin the root to the origin.
        for d in 0..3 {
            pose[[0, d]] = 0.0;
        }

        let mut world = camera::camera_to_world(&pose, camera::CAMERA_ORIENTATION);

        // Floor alignment: lowest joint sits on z = 0.
        let min_z = world
            .slice(s![.., 2])
            .iter()
            .fold(f32::INFINITY, |acc, &v| acc.min(v));
        world.slice_mut(s![.., 2]).mapv_inplace(|v| v - min_z);

        let overlay = render::draw_pose_2d(&keypoints.index_axis(Axis(0), i), &frame)?;
        render::save_frame(&dir_2d, i, "2D", &overlay)?;

        let rendered = render::render_pose_3d(&world.view())?;
        render::save_frame(&dir_3d, i, "3D", &rendered)?;

        poses.index_axis_mut(Axis(0), i).assign(&world);

        if (i + 1) % 50 == 0 {
            debug!("Lifted {}/{} frames", i + 1, target_frames);
        }
    }

    archive::save_reconstruction(&output_dir.join("keypoints.npz"), &poses)?;

    info!("✓ 3D pose lifting complete ({} frames)", poses.shape()[0]);

    Ok(poses)
}
