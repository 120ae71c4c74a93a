use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
video:
  input_dir: "demo/video"
  output_dir: "demo/output"
  cut_frames: 160
detector:
  model_path: "checkpoint/pretrained/pose_hrnet_coco.onnx"
  input_size: 416
  confidence_threshold: 0.3
lifter:
  model_path: "checkpoint/pretrained/strided_transformer_351f.onnx"
  frames: 351
classifier:
  artifact_dir: "demo/lr_data"
inference:
  num_threads: 4
logging:
  level: "info"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.video.cut_frames, 160);
        assert_eq!(config.detector.input_size, 416);
        assert_eq!(config.lifter.frames, 351);
        assert_eq!(config.logging.level, "info");
    }
}
