use super::{Classifier, ClassifierError, ClassifierLoader, ProbabilityVector};
use crate::pipeline::normalizer::NormalizedTensor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Returns the same output for every image.
#[derive(Clone)]
pub struct FixedClassifier {
    output: Result<Vec<f32>, String>,
}

impl FixedClassifier {
    pub fn new(output: Vec<f32>) -> Self {
        Self { output: Ok(output) }
    }

    pub fn uniform(len: usize) -> Self {
        Self::new(vec![1.0 / len as f32; len])
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            output: Err(reason.to_string()),
        }
    }
}

impl Classifier for FixedClassifier {
    fn predict(&self, _tensor: &NormalizedTensor) -> Result<ProbabilityVector, ClassifierError> {
        match &self.output {
            Ok(values) => Ok(ProbabilityVector::new(values.clone())),
            Err(reason) => Err(ClassifierError::Inference(reason.clone())),
        }
    }
}

/// Hands out a `FixedClassifier` after a delay, counting how often it runs.
pub struct CountingLoader {
    classifier: FixedClassifier,
    delay: Duration,
    loads: Arc<AtomicUsize>,
}

impl CountingLoader {
    pub fn new(classifier: FixedClassifier, delay: Duration) -> Self {
        Self {
            classifier,
            delay,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.loads)
    }
}

impl ClassifierLoader for CountingLoader {
    fn load(&self) -> Result<Box<dyn Classifier>, ClassifierError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(Box::new(self.classifier.clone()))
    }
}

#[derive(Default)]
pub struct FailingLoader {
    attempts: Arc<AtomicUsize>,
}

impl FailingLoader {
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

impl ClassifierLoader for FailingLoader {
    fn load(&self) -> Result<Box<dyn Classifier>, ClassifierError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ClassifierError::Load("artifact not found".to_string()))
    }
}
