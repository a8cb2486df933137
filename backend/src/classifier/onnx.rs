use super::{
    finish_output, input_samples, Classifier, ClassifierError, ClassifierLoader, InputLayout,
    OutputKind, ProbabilityVector,
};
use crate::config::ModelSpec;
use crate::pipeline::normalizer::NormalizedTensor;
use std::path::PathBuf;
use tract_onnx::prelude::*;

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

pub struct OnnxLoader {
    artifact: PathBuf,
    layout: InputLayout,
    output: OutputKind,
    label_count: usize,
}

impl OnnxLoader {
    pub fn new(spec: &ModelSpec) -> Self {
        Self {
            artifact: spec.artifact.clone(),
            layout: spec.input_layout,
            output: spec.output,
            label_count: spec.labels.len(),
        }
    }
}

impl ClassifierLoader for OnnxLoader {
    fn load(&self) -> Result<Box<dyn Classifier>, ClassifierError> {
        let shape = self.layout.shape();
        let load_err = |e: TractError| {
            ClassifierError::Load(format!("{}: {}", self.artifact.display(), e))
        };

        let plan = tract_onnx::onnx()
            .model_for_path(&self.artifact)
            .map_err(load_err)?
            .with_input_fact(0, f32::fact(shape).into())
            .map_err(load_err)?
            .into_optimized()
            .map_err(load_err)?
            .into_runnable()
            .map_err(load_err)?;

        log::info!(
            "Loaded ONNX classifier from {} ({:?} input)",
            self.artifact.display(),
            self.layout
        );

        Ok(Box::new(OnnxClassifier {
            plan,
            layout: self.layout,
            output: self.output,
            label_count: self.label_count,
        }))
    }
}

/// Runs an optimized tract plan. `run` takes `&self`, so requests share the
/// plan without locking.
pub struct OnnxClassifier {
    plan: OnnxPlan,
    layout: InputLayout,
    output: OutputKind,
    label_count: usize,
}

impl Classifier for OnnxClassifier {
    fn predict(&self, tensor: &NormalizedTensor) -> Result<ProbabilityVector, ClassifierError> {
        let samples = input_samples(tensor, self.layout)?;
        let input = Tensor::from_shape(&self.layout.shape(), &samples)
            .map_err(|e| ClassifierError::Inference(format!("Failed to build input: {}", e)))?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let first = outputs
            .first()
            .ok_or_else(|| ClassifierError::Inference("Model produced no outputs".to_string()))?;
        let values: Vec<f32> = first
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?
            .iter()
            .copied()
            .collect();

        finish_output(values, self.label_count, self.output)
    }
}
