// src/video_processor.rs

use crate::types::Frame;
use anyhow::Result;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTraitConst},
};
use std::path::Path;
use tracing::info;

pub fn open_video(path: &Path) -> Result<VideoReader> {
    info!("Opening video: {}", path.display());

    let cap = VideoCapture::from_file(path.to_str().unwrap(), videoio::CAP_ANY)?;

    if !cap.is_opened()? {
        anyhow::bail!("Failed to open video file {}", path.display());
    }

    let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
    let total_frames = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_COUNT)? as i32;
    let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as i32;
    let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

    info!(
        "Video properties: {}x{} @ {:.1} FPS, {} frames",
        width, height, fps, total_frames
    );

    Ok(VideoReader {
        cap,
        fps,
        total_frames,
        current_frame: 0,
        width,
        height,
    })
}

pub struct VideoReader {
    pub cap: VideoCapture,
    pub fps: f64,
    pub total_frames: i32,
    pub current_frame: i32,
    pub width: i32,
    pub height: i32,
}

impl VideoReader {
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        use opencv::videoio::VideoCaptureTrait;

        let mut mat = Mat::default();

        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }

        self.current_frame += 1;
        let timestamp_ms = (self.current_frame as f64 / self.fps) * 1000.0;

        let mut rgb_mat = Mat::default();
        imgproc::cvt_color(&mat, &mut rgb_mat, imgproc::COLOR_BGR2RGB, 0)?;

        let data = rgb_mat.data_bytes()?.to_vec();

        Ok(Some(Frame {
            data,
            width: self.width as usize,
            height: self.height as usize,
            timestamp_ms,
        }))
    }

    /// Jump to an absolute frame index. Used to align the 3D stage with the
    /// first valid 2D detection.
    pub fn seek_to(&mut self, frame_index: usize) -> Result<()> {
        use opencv::videoio::VideoCaptureTrait;

        VideoCaptureTrait::set(
            &mut self.cap,
            videoio::CAP_PROP_POS_FRAMES,
            frame_index as f64,
        )?;
        self.current_frame = frame_index as i32;
        Ok(())
    }

    pub fn progress(&self) -> f32 {
        if self.total_frames == 0 {
            return 0.0;
        }
        (self.current_frame as f32 / self.total_frames as f32) * 100.0
    }
}
