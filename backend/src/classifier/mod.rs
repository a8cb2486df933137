pub mod handle;
pub mod labels;
pub mod onnx;
#[cfg(feature = "torch")]
pub mod torch;
#[cfg(test)]
pub mod fake;

use crate::config::{ModelBackend, ModelSpec};
use crate::pipeline::normalizer::{NormalizedTensor, INPUT_SHAPE};
use serde::Deserialize;

pub use handle::ClassifierHandle;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model loading failed: {0}")]
    Load(String),
    #[error("Model unavailable: {0}")]
    Unavailable(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Raw classifier output, one value per entry of the label table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityVector(Vec<f32>);

impl ProbabilityVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Memory layout the exported model expects for its single image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    #[default]
    Nhwc,
    Nchw,
}

impl InputLayout {
    pub fn shape(&self) -> [usize; 4] {
        let [n, h, w, c] = INPUT_SHAPE;
        match self {
            InputLayout::Nhwc => [n, h, w, c],
            InputLayout::Nchw => [n, c, h, w],
        }
    }
}

/// Whether the model ends in a softmax or emits raw logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Probabilities,
    Logits,
}

pub trait Classifier: Send + Sync {
    fn predict(&self, tensor: &NormalizedTensor) -> Result<ProbabilityVector, ClassifierError>;
}

/// Produces a classifier from its artifact. Called at most once per handle.
pub trait ClassifierLoader: Send + Sync {
    fn load(&self) -> Result<Box<dyn Classifier>, ClassifierError>;
}

/// Samples in the order the model wants them.
pub(crate) fn input_samples(tensor: &NormalizedTensor, layout: InputLayout) -> Result<Vec<f32>, ClassifierError> {
    if tensor.shape() != INPUT_SHAPE {
        return Err(ClassifierError::Inference(format!(
            "expected input shape {:?}, got {:?}",
            INPUT_SHAPE,
            tensor.shape()
        )));
    }
    let view = match layout {
        InputLayout::Nhwc => tensor.as_array().view(),
        InputLayout::Nchw => tensor.as_array().view().permuted_axes([0, 3, 1, 2]),
    };
    Ok(view.iter().copied().collect())
}

/// Validates output length and applies softmax to logits.
pub(crate) fn finish_output(
    values: Vec<f32>,
    expected: usize,
    output: OutputKind,
) -> Result<ProbabilityVector, ClassifierError> {
    if values.len() != expected {
        return Err(ClassifierError::Inference(format!(
            "model produced {} outputs for {} labels",
            values.len(),
            expected
        )));
    }
    let values = match output {
        OutputKind::Probabilities => values,
        OutputKind::Logits => softmax(&values),
    };
    Ok(ProbabilityVector::new(values))
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

/// Builds the loader for the backend named in the model manifest.
pub fn loader_for(spec: &ModelSpec) -> Box<dyn ClassifierLoader> {
    match spec.backend {
        ModelBackend::Onnx => Box::new(onnx::OnnxLoader::new(spec)),
        ModelBackend::Torchscript => torchscript_loader(spec),
    }
}

#[cfg(feature = "torch")]
fn torchscript_loader(spec: &ModelSpec) -> Box<dyn ClassifierLoader> {
    Box::new(torch::TorchLoader::new(spec))
}

#[cfg(not(feature = "torch"))]
fn torchscript_loader(spec: &ModelSpec) -> Box<dyn ClassifierLoader> {
    Box::new(UnsupportedBackend {
        artifact: spec.artifact.clone(),
    })
}

#[cfg(not(feature = "torch"))]
struct UnsupportedBackend {
    artifact: std::path::PathBuf,
}

#[cfg(not(feature = "torch"))]
impl ClassifierLoader for UnsupportedBackend {
    fn load(&self) -> Result<Box<dyn Classifier>, ClassifierError> {
        Err(ClassifierError::Load(format!(
            "{} is a TorchScript model but this build lacks the `torch` feature",
            self.artifact.display()
        )))
    }
}
