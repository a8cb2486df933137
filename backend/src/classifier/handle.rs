use super::{Classifier, ClassifierError, ClassifierLoader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

type LoadOutcome = Result<Arc<dyn Classifier>, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

struct HandleInner {
    loader: Box<dyn ClassifierLoader>,
    slot: OnceLock<LoadOutcome>,
    loading: AtomicBool,
}

/// Process-wide, lazily loaded classifier.
///
/// The artifact is loaded on the blocking pool inside a `OnceLock`, so
/// concurrent first callers wait on a single load and a caller that gives up
/// does not abandon a half-finished one. A failed load is remembered and
/// reported on every later call; the artifact is never loaded twice.
#[derive(Clone)]
pub struct ClassifierHandle {
    inner: Arc<HandleInner>,
}

impl ClassifierHandle {
    pub fn new(loader: Box<dyn ClassifierLoader>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                loader,
                slot: OnceLock::new(),
                loading: AtomicBool::new(false),
            }),
        }
    }

    pub fn state(&self) -> ClassifierState {
        match self.inner.slot.get() {
            Some(Ok(_)) => ClassifierState::Loaded,
            Some(Err(_)) => ClassifierState::Failed,
            None if self.inner.loading.load(Ordering::Acquire) => ClassifierState::Loading,
            None => ClassifierState::Unloaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == ClassifierState::Loaded
    }

    /// Returns the loaded classifier, loading it first if nobody has.
    pub async fn get(&self) -> Result<Arc<dyn Classifier>, ClassifierError> {
        if let Some(outcome) = self.inner.slot.get() {
            return unpack(outcome);
        }

        let inner = Arc::clone(&self.inner);
        let outcome = tokio::task::spawn_blocking(move || {
            inner
                .slot
                .get_or_init(|| {
                    inner.loading.store(true, Ordering::Release);
                    log::info!("Loading classifier artifact");
                    let outcome = match inner.loader.load() {
                        Ok(model) => {
                            log::info!("Classifier loaded");
                            Ok(Arc::from(model))
                        }
                        Err(e) => {
                            log::error!("Failed to load classifier: {}", e);
                            Err(e.to_string())
                        }
                    };
                    inner.loading.store(false, Ordering::Release);
                    outcome
                })
                .clone()
        })
        .await
        .map_err(|e| ClassifierError::Unavailable(format!("loader task failed: {}", e)))?;

        unpack(&outcome)
    }
}

fn unpack(outcome: &LoadOutcome) -> Result<Arc<dyn Classifier>, ClassifierError> {
    match outcome {
        Ok(model) => Ok(Arc::clone(model)),
        Err(reason) => Err(ClassifierError::Unavailable(reason.clone())),
    }
}
