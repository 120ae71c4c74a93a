// src/pose2d/mod.rs

pub mod detector;
pub mod refine;

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, Axis};
use std::path::Path;
use tracing::{debug, info};

use crate::archive;
use crate::skeleton::NUM_JOINTS;
use crate::video_processor;
use detector::PoseDetector;

pub struct Pose2dOutput {
    /// Refined H36M keypoints in source pixels, `(frames, 17, 2)`.
    pub keypoints: Array3<f32>,
    /// Per-joint confidences, `(frames, 17)`.
    pub scores: Array2<f32>,
    /// First frame with a valid detection; aligns the 3D stage.
    pub start_frame: usize,
}

/// Run the 2D detector over the whole video, convert to the canonical H36M
/// layout, interpolate unreliable frames, and persist the sequence under
/// `<output>/input_2D/keypoints.npz`.
pub fn extract_2d(
    video_path: &Path,
    output_dir: &Path,
    detector: &mut PoseDetector,
    confidence_threshold: f32,
) -> Result<Pose2dOutput> {
    let mut reader = video_processor::open_video(video_path)?;

    let mut raw_frames: Vec<Array2<f32>> = Vec::new();
    let mut raw_scores: Vec<ndarray::Array1<f32>> = Vec::new();

    while let Some(frame) = reader.read_frame()? {
        let (kpts, scores) = detector.detect(&frame)?;
        debug!(
            "Frame {} ({:.0} ms): mean confidence {:.3}",
            reader.current_frame,
            frame.timestamp_ms,
            scores.mean().unwrap_or(0.0)
        );
        raw_frames.push(kpts);
        raw_scores.push(scores);

        if reader.current_frame % 50 == 0 {
            info!(
                "2D extraction progress: {:.1}% ({}/{})",
                reader.progress(),
                reader.current_frame,
                reader.total_frames
            );
        }
    }

    anyhow::ensure!(!raw_frames.is_empty(), "Video contains no readable frames");

    let frames = raw_frames.len();
    let mut keypoints = Array3::zeros((frames, NUM_JOINTS, 2));
    let mut scores = Array2::zeros((frames, NUM_JOINTS));
    for (f, (kpts, sc)) in raw_frames.iter().zip(raw_scores.iter()).enumerate() {
        keypoints.index_axis_mut(Axis(0), f).assign(kpts);
        scores.index_axis_mut(Axis(0), f).assign(sc);
    }

    let (keypoints, scores) = refine::coco_to_h36m(&keypoints, &scores);

    let start_frame = refine::first_valid_frame(&keypoints)
        .context("No skater detected in any frame")?;
    debug!("First valid detection at frame {}", start_frame);

    let keypoints = refine::interpolate_low_confidence(&keypoints, &scores, confidence_threshold)?;

    let archive_dir = output_dir.join("input_2D");
    std::fs::create_dir_all(&archive_dir)?;
    archive::save_reconstruction_with_scores(
        &archive_dir.join("keypoints.npz"),
        &keypoints,
        &scores,
    )?;

    info!(
        "✓ 2D pose extraction complete ({} frames, start frame {})",
        frames, start_frame
    );

    Ok(Pose2dOutput {
        keypoints,
        scores,
        start_frame,
    })
}
