// src/main.rs

mod archive;
mod classifier;
mod config;
mod features;
mod pose2d;
mod pose3d;
mod preprocessing;
mod render;
mod skeleton;
mod types;
mod video_processor;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;

use classifier::EdgeClassifier;
use pose2d::detector::PoseDetector;
use pose3d::lifter::PoseLifter;

#[derive(Parser, Debug)]
#[command(version, about = "Figure-skating jump edge-error judging from monocular video")]
struct Args {
    /// Input video file name under the configured video directory
    #[arg(long, default_value = "sample_video.mp4")]
    video: String,

    /// CUDA device index used for both ONNX sessions
    #[arg(long, default_value_t = 0)]
    gpu: i32,

    /// Target sampling rate the classifier artifacts were trained at
    #[arg(long, default_value_t = 12)]
    fps: usize,

    /// Restrict the feature vector to the 7 lower-body joints
    #[arg(long)]
    lower_body: bool,

    /// Pipeline configuration file
    #[arg(long, default_value = "config.yaml")]
    config: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = types::Config::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "lutz_edge_detection={},ort=warn",
            config.logging.level
        ))
        .init();

    info!("⛸ Edge-Error Judging Pipeline Starting");

    let video_path = Path::new(&config.video.input_dir).join(&args.video);
    anyhow::ensure!(
        video_path.is_file(),
        "Input video not found: {}",
        video_path.display()
    );

    let video_stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Video file name is not valid UTF-8")?
        .to_string();
    let output_dir = Path::new(&config.video.output_dir).join(&video_stem);
    std::fs::create_dir_all(&output_dir)?;

    info!("Processing {}", video_stem);

    // ── Stage 1: 2D pose extraction ──────────────────────────────────────
    let mut detector = PoseDetector::new(
        &config.detector.model_path,
        config.detector.input_size,
        args.gpu,
        config.inference.num_threads,
    )?;

    let pose2d = pose2d::extract_2d(
        &video_path,
        &output_dir,
        &mut detector,
        config.detector.confidence_threshold,
    )?;

    info!(
        "Mean detection confidence: {:.3}",
        pose2d.scores.mean().unwrap_or(0.0)
    );

    // ── Stage 2: 3D pose lifting ─────────────────────────────────────────
    let mut lifter = PoseLifter::new(
        &config.lifter.model_path,
        config.lifter.frames,
        args.gpu,
        config.inference.num_threads,
    )?;

    let pose3d = pose3d::lift_3d(
        &video_path,
        &output_dir,
        &pose2d.keypoints,
        &mut lifter,
        pose2d.start_frame,
        config.video.cut_frames,
    )?;
    info!(
        "3D sequence shape: ({}, {}, {})",
        pose3d.shape()[0],
        pose3d.shape()[1],
        pose3d.shape()[2]
    );

    // ── Stage 3: features + classification ───────────────────────────────
    let n_joints = if args.lower_body {
        skeleton::LOWER_BODY_JOINTS
    } else {
        skeleton::NUM_JOINTS
    };

    let feature_matrix = features::extract_features(
        &[output_dir.join("keypoints.npz")],
        args.fps,
        n_joints,
    )?;
    let feature_row = feature_matrix.row(0);
    let feature_vec: Vec<f32> = feature_row.iter().copied().collect();

    let edge_classifier = EdgeClassifier::load(&config.classifier.artifact_dir, args.fps)?;
    let verdict = edge_classifier.classify(&feature_vec)?;

    // ── Report ───────────────────────────────────────────────────────────
    let label = if verdict.is_edge_error() {
        "EDGE ERROR"
    } else {
        "NOT EDGE ERROR"
    };
    println!(
        "\nJudgeAI-LutzEdge Result: {:.2}% {}.",
        verdict.confidence_pct(),
        label
    );

    Ok(())
}
