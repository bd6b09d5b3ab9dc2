//! # engine::model
//!
//! Pre-trained model artifacts. The dashboard never trains anything: it
//! loads an artifact from disk and calls [`Model::predict`] once per render.
//!
//! ## Artifact format
//!
//! A multi-output linear regressor serialised as JSON. The feature contract
//! is part of the artifact, so the forecaster builds exactly the inputs the
//! model was trained on instead of guessing:
//!
//! ```json
//! {
//!   "target": "yield",
//!   "features": [ { "column": "yield", "lag": 0 }, { "column": "price", "lag": 0 } ],
//!   "coefficients": [[0.9, 0.01], ...12 rows...],
//!   "intercepts": [1.2, ...12 values...]
//! }
//! ```
//!
//! Output `i` is `intercepts[i] + Σ coefficients[i][j] * x[j]`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::ModelError, models::Column};

// ─── Contract ─────────────────────────────────────────────────────────────────

/// One input the model expects: a source column observed `lag` periods
/// before the most recent row (0 = latest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub column: Column,
    #[serde(default)]
    pub lag:    usize,
}

/// Opaque predictor. Rows of `features` are samples, columns follow
/// [`Model::features`].
pub trait Model: Send + Sync {
    fn features(&self) -> &[FeatureSpec];

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError>;
}

// ─── Linear Artifact ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    /// Informational only, e.g. `"yield"`.
    #[serde(default)]
    pub target:       Option<String>,
    pub features:     Vec<FeatureSpec>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts:   Vec<f64>,
}

impl LinearArtifact {
    /// Read and validate an artifact file.
    pub async fn load(path: &Path) -> Result<Self, ModelError> {
        let shown_path = path.display().to_string();

        let bytes = tokio::fs::read(path).await.map_err(|source| ModelError::Missing {
            path: shown_path.clone(),
            source,
        })?;

        let artifact: Self = serde_json::from_slice(&bytes).map_err(|e| ModelError::Malformed {
            path:   shown_path.clone(),
            detail: e.to_string(),
        })?;

        artifact
            .validate()
            .map_err(|detail| ModelError::Malformed { path: shown_path.clone(), detail })?;

        debug!(
            path    = %shown_path,
            target  = artifact.target.as_deref().unwrap_or("?"),
            inputs  = artifact.features.len(),
            outputs = artifact.intercepts.len(),
            "model artifact loaded"
        );
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), String> {
        if self.features.is_empty() {
            return Err("artifact declares no features".into());
        }
        if self.coefficients.len() != self.intercepts.len() {
            return Err(format!(
                "{} coefficient rows but {} intercepts",
                self.coefficients.len(),
                self.intercepts.len()
            ));
        }
        if let Some((i, row)) = self
            .coefficients
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.features.len())
        {
            return Err(format!(
                "coefficient row {i} has {} weights for {} features",
                row.len(),
                self.features.len()
            ));
        }
        Ok(())
    }
}

impl Model for LinearArtifact {
    fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        features
            .iter()
            .map(|sample| {
                if sample.len() != self.features.len() {
                    return Err(ModelError::Shape {
                        expected: self.features.len(),
                        actual:   sample.len(),
                    });
                }

                let output: Vec<f64> = self
                    .coefficients
                    .iter()
                    .zip(&self.intercepts)
                    .map(|(weights, b)| b + weights.iter().zip(sample).map(|(w, x)| w * x).sum::<f64>())
                    .collect();

                if output.iter().any(|v| !v.is_finite()) {
                    return Err(ModelError::Predict("non-finite output".into()));
                }
                Ok(output)
            })
            .collect()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
