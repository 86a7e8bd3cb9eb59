use std::time::Duration;

use tensorprobe_core::{
    Backend, BackendModel, Device, InvokeTimeout, ModelArtifact, ModelSpec, Tensor,
};
use tracing::{debug, info};

use crate::{InputTensors, ProbeError, Stage};

/// Outputs of a single invoke. Dropping the set releases its tensors.
#[derive(Clone, Debug)]
pub struct OutputTensors {
    tensors: Vec<Tensor>,
}

impl OutputTensors {
    pub fn get(&self, index: usize) -> Option<&Tensor> {
        self.tensors.get(index)
    }

    /// Total bytes across every output tensor.
    pub fn byte_len(&self) -> usize {
        self.tensors.iter().map(Tensor::byte_len).sum()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Timeout(InvokeTimeout),
    #[error("session is not open")]
    NotOpen,
    #[error("{0:#}")]
    Engine(anyhow::Error),
}

/// One model opened on one backend.
///
/// Starts closed; `close` is idempotent and also runs on drop.
pub struct InferenceSession<B: Backend> {
    backend: B,
    model: Option<B::Model>,
    timeout: Option<Duration>,
}

impl<B: Backend> InferenceSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            model: None,
            timeout: None,
        }
    }

    pub fn open(&mut self, artifact: &ModelArtifact, device: Device) -> Result<(), ProbeError> {
        self.close();
        let mut model = self
            .backend
            .load(artifact, device)
            .map_err(|e| ProbeError::engine(Stage::Open, e))?;
        model.set_timeout(self.timeout);
        info!(
            backend = self.backend.name(),
            model = %artifact.path().display(),
            %device,
            "model opened"
        );
        self.model = Some(model);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.model.is_some()
    }

    pub fn input_info(&self) -> Result<&ModelSpec, ProbeError> {
        self.model
            .as_ref()
            .map(BackendModel::spec)
            .ok_or_else(|| ProbeError::engine(Stage::InputInfo, InvokeError::NotOpen))
    }

    /// Applies to every following invoke; also remembered across `open`.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
        if let Some(model) = self.model.as_mut() {
            model.set_timeout(timeout);
        }
    }

    pub fn invoke(&mut self, inputs: &InputTensors) -> Result<OutputTensors, InvokeError> {
        let model = self.model.as_mut().ok_or(InvokeError::NotOpen)?;
        match model.infer(inputs.to_vec()) {
            Ok(tensors) => Ok(OutputTensors { tensors }),
            Err(err) => match err.downcast_ref::<InvokeTimeout>() {
                Some(timeout) => Err(InvokeError::Timeout(*timeout)),
                None => Err(InvokeError::Engine(err)),
            },
        }
    }

    pub fn close(&mut self) {
        if self.model.take().is_some() {
            debug!(backend = self.backend.name(), "model closed");
        }
    }
}

impl<B: Backend> Drop for InferenceSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}
