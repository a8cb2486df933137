use super::{
    finish_output, input_samples, Classifier, ClassifierError, ClassifierLoader, InputLayout,
    OutputKind, ProbabilityVector,
};
use crate::config::ModelSpec;
use crate::pipeline::normalizer::NormalizedTensor;
use std::path::PathBuf;
use std::sync::Mutex;
use tch::{CModule, Device, Tensor};

pub struct TorchLoader {
    artifact: PathBuf,
    layout: InputLayout,
    output: OutputKind,
    label_count: usize,
}

impl TorchLoader {
    pub fn new(spec: &ModelSpec) -> Self {
        Self {
            artifact: spec.artifact.clone(),
            layout: spec.input_layout,
            output: spec.output,
            label_count: spec.labels.len(),
        }
    }
}

impl ClassifierLoader for TorchLoader {
    fn load(&self) -> Result<Box<dyn Classifier>, ClassifierError> {
        let device = Device::cuda_if_available();
        let module = CModule::load_on_device(&self.artifact, device)
            .map_err(|e| ClassifierError::Load(format!("{}: {}", self.artifact.display(), e)))?;
        log::info!(
            "Loaded TorchScript classifier from {} on {:?}",
            self.artifact.display(),
            device
        );
        Ok(Box::new(TorchClassifier {
            module: Mutex::new(module),
            device,
            layout: self.layout,
            output: self.output,
            label_count: self.label_count,
        }))
    }
}

/// TorchScript module behind a mutex; inference on this backend is serialized.
pub struct TorchClassifier {
    module: Mutex<CModule>,
    device: Device,
    layout: InputLayout,
    output: OutputKind,
    label_count: usize,
}

impl Classifier for TorchClassifier {
    fn predict(&self, tensor: &NormalizedTensor) -> Result<ProbabilityVector, ClassifierError> {
        let samples = input_samples(tensor, self.layout)?;
        let shape: Vec<i64> = self.layout.shape().iter().map(|&d| d as i64).collect();
        let input = Tensor::from_slice(&samples)
            .view(shape.as_slice())
            .to_device(self.device);

        let output = {
            let module = self
                .module
                .lock()
                .map_err(|_| ClassifierError::Inference("model lock poisoned".to_string()))?;
            tch::no_grad(|| module.forward_ts(&[input]))
                .map_err(|e| ClassifierError::Inference(e.to_string()))?
        };

        let flat = output.to_kind(tch::Kind::Float).to_device(Device::Cpu).view([-1]);
        let values = Vec::<f32>::try_from(&flat)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        finish_output(values, self.label_count, self.output)
    }
}
