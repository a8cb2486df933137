pub mod color_image;
pub mod normalizer;
pub mod ranker;
pub mod skin_gate;

use crate::classifier::labels::LabelTable;
use crate::classifier::ClassifierHandle;
use crate::error::AnalysisError;
use color_image::ColorImage;
use normalizer::NormalizedTensor;
use ranker::RankedResult;
use skin_gate::SkinPresenceVerdict;
use std::fmt;
use std::sync::Arc;

/// Where a request is in the pipeline. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    GateChecked,
    Normalized,
    Classified,
    Ranked,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::GateChecked => "gate-checked",
            Stage::Normalized => "normalized",
            Stage::Classified => "classified",
            Stage::Ranked => "ranked",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub verdict: SkinPresenceVerdict,
    pub result: RankedResult,
}

/// Decode, gate, normalize, classify and rank one image.
///
/// Holds no per-request state; the classifier handle is shared by all
/// requests and loaded on first use.
#[derive(Clone)]
pub struct Pipeline {
    classifier: ClassifierHandle,
    labels: Arc<LabelTable>,
}

impl Pipeline {
    pub fn new(classifier: ClassifierHandle, labels: LabelTable) -> Self {
        Self {
            classifier,
            labels: Arc::new(labels),
        }
    }

    pub fn classifier(&self) -> &ClassifierHandle {
        &self.classifier
    }

    pub async fn analyze(&self, request_id: &str, bytes: Vec<u8>) -> Result<Analysis, AnalysisError> {
        log::debug!("{}: {}", request_id, Stage::Received);

        let (verdict, tensor) = tokio::task::spawn_blocking(move || prepare(&bytes))
            .await
            .map_err(|e| AnalysisError::InferenceFailed(format!("preprocessing task failed: {}", e)))??;
        log::debug!(
            "{}: {} (skin ratio {:.4}), {}",
            request_id,
            Stage::GateChecked,
            verdict.skin_ratio,
            Stage::Normalized
        );

        let classifier = self
            .classifier
            .get()
            .await
            .map_err(|e| AnalysisError::ModelUnavailable(e.to_string()))?;
        let probabilities = tokio::task::spawn_blocking(move || classifier.predict(&tensor))
            .await
            .map_err(|e| AnalysisError::InferenceFailed(format!("inference task failed: {}", e)))?
            .map_err(|e| AnalysisError::InferenceFailed(e.to_string()))?;
        log::debug!("{}: {}", request_id, Stage::Classified);

        let result = ranker::rank(&probabilities, &self.labels)
            .map_err(|e| AnalysisError::InferenceFailed(e.to_string()))?;
        log::debug!("{}: {}", request_id, Stage::Ranked);

        log::debug!("{}: {}", request_id, Stage::Done);
        Ok(Analysis { verdict, result })
    }
}

/// CPU-bound front half of the pipeline: decode, skin gate, normalize.
fn prepare(bytes: &[u8]) -> Result<(SkinPresenceVerdict, NormalizedTensor), AnalysisError> {
    let image = ColorImage::decode(bytes).map_err(|e| AnalysisError::InvalidImage(e.to_string()))?;
    let verdict = skin_gate::evaluate(&image);
    if !verdict.skin_detected {
        return Err(AnalysisError::NoSkinDetected {
            skin_ratio: verdict.skin_ratio,
        });
    }
    Ok((verdict, normalizer::normalize(&image)))
}
