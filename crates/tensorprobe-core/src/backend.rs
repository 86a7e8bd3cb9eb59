use std::time::Duration;

use anyhow::Result;

use crate::{Device, ModelArtifact, ModelSpec, Tensor};

pub trait Backend: Send + Sync + 'static {
    type Model: BackendModel;

    fn name(&self) -> &'static str;
    fn load(&self, artifact: &ModelArtifact, device: Device) -> Result<Self::Model>;
}

pub trait BackendModel: Send + 'static {
    fn spec(&self) -> &ModelSpec;

    /// Upper bound for each subsequent `infer` call. `None` waits forever.
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Runs one synchronous forward pass.
    ///
    /// When the configured timeout elapses the call fails with an error whose
    /// chain contains [`InvokeTimeout`]; the model stays usable afterwards.
    fn infer(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("inference did not finish within {}ms", .limit.as_millis())]
pub struct InvokeTimeout {
    pub limit: Duration,
}
