// src/archive.rs
//
// Compressed keypoint archives. Each archive holds a `reconstruction` entry
// with the full keypoint sequence (the 2D stage adds a parallel `scores`
// entry), so a stage can be replayed without rerunning the networks.

use anyhow::{Context, Result};
use ndarray::{Array2, Array3};
use ndarray_npy::{NpzReader, NpzWriter};
use std::fs::File;
use std::path::Path;

pub fn save_reconstruction(path: &Path, data: &Array3<f32>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create archive {}", path.display()))?;
    let mut npz = NpzWriter::new_compressed(file);
    npz.add_array("reconstruction", data)?;
    npz.finish()?;
    Ok(())
}

/// 2D-stage variant: keypoints plus the parallel per-joint confidences.
pub fn save_reconstruction_with_scores(
    path: &Path,
    data: &Array3<f32>,
    scores: &Array2<f32>,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create archive {}", path.display()))?;
    let mut npz = NpzWriter::new_compressed(file);
    npz.add_array("reconstruction", data)?;
    npz.add_array("scores", scores)?;
    npz.finish()?;
    Ok(())
}

pub fn load_reconstruction(path: &Path) -> Result<Array3<f32>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open archive {}", path.display()))?;
    let mut npz = NpzReader::new(file)?;
    let data: Array3<f32> = npz
        .by_name("reconstruction.npy")
        .with_context(|| format!("Archive {} has no reconstruction entry", path.display()))?;
    Ok(data)
}

pub fn load_scores(path: &Path) -> Result<Array2<f32>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open archive {}", path.display()))?;
    let mut npz = NpzReader::new(file)?;
    let scores: Array2<f32> = npz
        .by_name("scores.npy")
        .with_context(|| format!("Archive {} has no scores entry", path.display()))?;
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}_{}.npz", name, std::process::id()))
    }

    #[test]
    fn test_reconstruction_round_trip() {
        let path = temp_path("reconstruction_round_trip");
        let data = Array3::from_shape_fn((4, 17, 3), |(f, j, d)| (f * 100 + j * 10 + d) as f32);

        save_reconstruction(&path, &data).unwrap();
        let loaded = load_reconstruction(&path).unwrap();
        assert_eq!(data, loaded);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_scores_round_trip() {
        let path = temp_path("scores_round_trip");
        let data = Array3::from_shape_fn((3, 17, 2), |(f, j, d)| (f + j + d) as f32);
        let scores = Array2::from_shape_fn((3, 17), |(f, j)| (f * 17 + j) as f32 / 100.0);

        save_reconstruction_with_scores(&path, &data, &scores).unwrap();
        assert_eq!(load_reconstruction(&path).unwrap(), data);
        assert_eq!(load_scores(&path).unwrap(), scores);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_archive_is_an_error() {
        let path = temp_path("no_such_archive");
        assert!(load_reconstruction(&path).is_err());
    }
}
