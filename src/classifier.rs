// src/classifier.rs
//
// Pretrained logistic-regression classifier plus its fitted standard
// scaler. Both are exported from the training pipeline as JSON artifacts,
// one pair per target fps. Class 0 is "not edge error", class 1 is
// "edge error".

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open scaler artifact {}", path.display()))?;
        let scaler: Scaler = serde_json::from_reader(file)?;
        anyhow::ensure!(
            scaler.mean.len() == scaler.scale.len(),
            "Scaler mean/scale length mismatch: {} vs {}",
            scaler.mean.len(),
            scaler.scale.len()
        );
        Ok(scaler)
    }

    pub fn transform(&self, features: &[f32]) -> Result<Vec<f64>> {
        anyhow::ensure!(
            features.len() == self.mean.len(),
            "Feature vector has {} entries but the scaler was fitted on {}",
            features.len(),
            self.mean.len()
        );
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&m, &s))| (x as f64 - m) / s)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open classifier artifact {}", path.display()))?;
        let model: LogisticRegression = serde_json::from_reader(file)?;
        Ok(model)
    }

    /// Per-class probabilities `[p_not_error, p_error]`; always sums to 1.
    pub fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        anyhow::ensure!(
            features.len() == self.coefficients.len(),
            "Feature vector has {} entries but the model was fitted on {}",
            features.len(),
            self.coefficients.len()
        );
        let z: f64 = features
            .iter()
            .zip(self.coefficients.iter())
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.intercept;
        let p_error = 1.0 / (1.0 + (-z).exp());
        Ok([1.0 - p_error, p_error])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Verdict {
    /// `[p_not_error, p_error]`
    pub probabilities: [f64; 2],
}

impl Verdict {
    pub fn is_edge_error(&self) -> bool {
        self.probabilities[0] < 0.5
    }

    /// Percentage backing the printed verdict.
    pub fn confidence_pct(&self) -> f64 {
        if self.is_edge_error() {
            self.probabilities[1] * 100.0
        } else {
            self.probabilities[0] * 100.0
        }
    }
}

pub struct EdgeClassifier {
    scaler: Scaler,
    model: LogisticRegression,
}

impl EdgeClassifier {
    /// Load the scaler/model pair trained for the given target fps.
    pub fn load(artifact_dir: &str, fps: usize) -> Result<Self> {
        let dir = Path::new(artifact_dir);
        let model_path = dir.join(format!("lr_model_{}fps.json", fps));
        let scaler_path = dir.join(format!("scaler_{}fps.json", fps));

        let scaler = Scaler::load(&scaler_path)?;
        let model = LogisticRegression::load(&model_path)?;

        anyhow::ensure!(
            scaler.mean.len() == model.coefficients.len(),
            "Scaler ({}) and classifier ({}) were fitted on different dimensionalities",
            scaler.mean.len(),
            model.coefficients.len()
        );

        info!(
            "✓ Classifier ready ({} features, {}fps artifacts)",
            model.coefficients.len(),
            fps
        );

        Ok(Self { scaler, model })
    }

    /// Standardize the feature vector and classify it.
    pub fn classify(&self, features: &[f32]) -> Result<Verdict> {
        let scaled = self.scaler.transform(features)?;
        let probabilities = self.model.predict_proba(&scaled)?;
        Ok(Verdict { probabilities })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_transform() {
        let scaler = Scaler {
            mean: vec![1.0, 2.0],
            scale: vec![2.0, 4.0],
        };
        let out = scaler.transform(&[3.0, 2.0]).unwrap();
        assert_eq!(out, vec![1.0, 0.0]);
    }

    #[test]
    fn test_scaler_rejects_wrong_dimensionality() {
        let scaler = Scaler {
            mean: vec![0.0; 4],
            scale: vec![1.0; 4],
        };
        assert!(scaler.transform(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = LogisticRegression {
            coefficients: vec![0.5, -0.25],
            intercept: 0.1,
        };
        let probs = model.predict_proba(&[1.0, 2.0]).unwrap();
        assert!((probs[0] + probs[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_logit_is_even_split() {
        let model = LogisticRegression {
            coefficients: vec![0.0, 0.0],
            intercept: 0.0,
        };
        let probs = model.predict_proba(&[5.0, -3.0]).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_model_rejects_wrong_dimensionality() {
        let model = LogisticRegression {
            coefficients: vec![1.0; 3],
            intercept: 0.0,
        };
        assert!(model.predict_proba(&[1.0]).is_err());
    }

    #[test]
    fn test_verdict_threshold() {
        let error = Verdict {
            probabilities: [0.3, 0.7],
        };
        assert!(error.is_edge_error());
        assert!((error.confidence_pct() - 70.0).abs() < 1e-9);

        let clean = Verdict {
            probabilities: [0.8, 0.2],
        };
        assert!(!clean.is_edge_error());
        assert!((clean.confidence_pct() - 80.0).abs() < 1e-9);
    }
}
