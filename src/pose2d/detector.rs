// src/pose2d/detector.rs

use crate::preprocessing;
use crate::skeleton::NUM_JOINTS;
use crate::types::Frame;
use anyhow::{Context, Result};
use ndarray::{Array1, Array2, Array4};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use tracing::info;

/// ONNX 2D pose detector producing 17 COCO-layout keypoints per frame.
pub struct PoseDetector {
    session: Session,
    input_size: usize,
}

impl PoseDetector {
    pub fn new(
        model_path: &str,
        input_size: usize,
        device_id: i32,
        num_threads: usize,
    ) -> Result<Self> {
        anyhow::ensure!(
            std::path::Path::new(model_path).is_file(),
            "2D pose model not found at {}",
            model_path
        );

        info!("Loading 2D pose model: {}", model_path);

        let session = Session::builder()?
            .with_execution_providers([CUDAExecutionProvider::default()
                .with_device_id(device_id)
                .build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_threads)?
            .with_inter_threads(1)?
            .commit_from_file(model_path)
            .context("Failed to load 2D pose model")?;

        info!("✓ 2D pose detector ready ({}x{} input)", input_size, input_size);

        Ok(Self {
            session,
            input_size,
        })
    }

    /// Run the detector on one RGB frame. Returns pixel-space keypoints
    /// `(17, 2)` and per-joint confidences `(17,)` in COCO order.
    pub fn detect(&mut self, frame: &Frame) -> Result<(Array2<f32>, Array1<f32>)> {
        let input =
            preprocessing::preprocess(&frame.data, frame.width, frame.height, self.input_size)?;
        let input =
            Array4::from_shape_vec((1, 3, self.input_size, self.input_size), input)?;

        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["input" => input_tensor])
            .context("2D pose inference failed")?;

        // Output is [1, 17, 3]: normalized x, normalized y, confidence.
        let output: ndarray::ArrayViewD<f32> = outputs[0]
            .try_extract_array()
            .context("Failed to extract keypoint tensor")?;

        anyhow::ensure!(
            output.shape() == [1, NUM_JOINTS, 3],
            "Unexpected detector output shape {:?}",
            output.shape()
        );

        let mut keypoints = Array2::zeros((NUM_JOINTS, 2));
        let mut scores = Array1::zeros(NUM_JOINTS);

        for j in 0..NUM_JOINTS {
            keypoints[[j, 0]] = output[[0, j, 0]] * frame.width as f32;
            keypoints[[j, 1]] = output[[0, j, 1]] * frame.height as f32;
            scores[j] = output[[0, j, 2]];
        }

        Ok((keypoints, scores))
    }
}
