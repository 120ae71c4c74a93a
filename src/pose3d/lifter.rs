// src/pose3d/lifter.rs

use crate::skeleton::NUM_JOINTS;
use anyhow::{Context, Result};
use ndarray::{Array2, Array3, Array4};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use tracing::info;

/// ONNX 2D->3D lifting network. Consumes a full temporal window of
/// normalized 2D keypoints and predicts the 3D pose of the center frame.
pub struct PoseLifter {
    session: Session,
    /// Temporal receptive field; windows must match this length.
    pub frames: usize,
}

impl PoseLifter {
    pub fn new(model_path: &str, frames: usize, device_id: i32, num_threads: usize) -> Result<Self> {
        anyhow::ensure!(
            std::path::Path::new(model_path).is_file(),
            "3D lifting model not found at {}",
            model_path
        );
        anyhow::ensure!(frames % 2 == 1, "Lifter window must be odd, got {}", frames);

        info!("Loading 3D lifting model: {}", model_path);

        let session = Session::builder()?
            .with_execution_providers([CUDAExecutionProvider::default()
                .with_device_id(device_id)
                .build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_threads)?
            .with_inter_threads(1)?
            .commit_from_file(model_path)
            .context("Failed to load 3D lifting model")?;

        info!("✓ 3D pose lifter ready ({} frame window)", frames);

        Ok(Self { session, frames })
    }

    /// Lift one window `(frames, 17, 2)` to the center frame's 3D pose
    /// `(17, 3)`.
    pub fn lift(&mut self, window: Array3<f32>) -> Result<Array2<f32>> {
        anyhow::ensure!(
            window.shape() == [self.frames, NUM_JOINTS, 2],
            "Lifter expects a ({}, {}, 2) window, got {:?}",
            self.frames,
            NUM_JOINTS,
            window.shape()
        );

        let input = window.insert_axis(ndarray::Axis(0));
        let input: Array4<f32> = input
            .into_dimensionality()
            .context("Window has wrong dimensionality")?;

        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["input" => input_tensor])
            .context("3D lifting inference failed")?;

        // Output is [1, 1, 17, 3].
        let output: ndarray::ArrayViewD<f32> = outputs[0]
            .try_extract_array()
            .context("Failed to extract 3D pose tensor")?;

        anyhow::ensure!(
            output.shape() == [1, 1, NUM_JOINTS, 3],
            "Unexpected lifter output shape {:?}",
            output.shape()
        );

        let mut pose = Array2::zeros((NUM_JOINTS, 3));
        for j in 0..NUM_JOINTS {
            for d in 0..3 {
                pose[[j, d]] = output[[0, 0, j, d]];
            }
        }

        Ok(pose)
    }
}
