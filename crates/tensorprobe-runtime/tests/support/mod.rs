#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, ensure, Result};
use tensorprobe_core::{
    Backend, BackendModel, DType, Device, InvokeTimeout, ModelArtifact, ModelSpec, Shape, Tensor,
};
use tempfile::TempDir;

pub const IMAGE_BYTES: usize = 299 * 299 * 3;

/// Counters shared between a test and the fake engine it drives.
#[derive(Clone, Default)]
pub struct Calls {
    pub loads: Arc<AtomicUsize>,
    pub invokes: Arc<AtomicUsize>,
    pub overlapped: Arc<AtomicBool>,
    pub timeouts: Arc<Mutex<Vec<Option<Duration>>>>,
    in_flight: Arc<AtomicBool>,
}

impl Calls {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn invokes(&self) -> usize {
        self.invokes.load(Ordering::SeqCst)
    }
}

/// Scripted engine: returns `scores` as a u8 output and can time out on a
/// chosen invoke.
pub struct FakeBackend {
    pub spec: ModelSpec,
    pub scores: Vec<u8>,
    pub timeout_on: Option<usize>,
    pub fail_open: bool,
    pub calls: Calls,
}

impl FakeBackend {
    pub fn inception(scores: &[u8]) -> Self {
        Self {
            spec: ModelSpec::single_input("input", DType::U8, &[1, 299, 299, 3]),
            scores: scores.to_vec(),
            timeout_on: None,
            fail_open: false,
            calls: Calls::default(),
        }
    }
}

pub struct FakeModel {
    spec: ModelSpec,
    scores: Vec<u8>,
    timeout_on: Option<usize>,
    timeout: Option<Duration>,
    calls: Calls,
}

impl Backend for FakeBackend {
    type Model = FakeModel;

    fn name(&self) -> &'static str {
        "fake"
    }

    fn load(&self, artifact: &ModelArtifact, _device: Device) -> Result<Self::Model> {
        self.calls.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            bail!("cannot open {}", artifact.path().display());
        }
        Ok(FakeModel {
            spec: self.spec.clone(),
            scores: self.scores.clone(),
            timeout_on: self.timeout_on,
            timeout: None,
            calls: self.calls.clone(),
        })
    }
}

impl BackendModel for FakeModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
        self.calls.timeouts.lock().unwrap().push(timeout);
    }

    fn infer(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        if self.calls.in_flight.swap(true, Ordering::SeqCst) {
            self.calls.overlapped.store(true, Ordering::SeqCst);
        }
        let n = self.calls.invokes.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.run(n, inputs);
        self.calls.in_flight.store(false, Ordering::SeqCst);
        result
    }
}

impl FakeModel {
    fn run(&self, n: usize, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        ensure!(inputs.len() == 1, "expected one input, got {}", inputs.len());
        ensure!(
            inputs[0].byte_len() == inputs[0].expected_byte_len(),
            "input byte size mismatch"
        );
        if self.timeout_on == Some(n) {
            let limit = self.timeout.unwrap_or_default();
            return Err(anyhow::anyhow!("run terminated").context(InvokeTimeout { limit }));
        }
        Ok(vec![Tensor::from_values(
            Shape::from_slice(&[1, self.scores.len()]),
            &self.scores,
        )])
    }
}

/// Temp dir holding a model placeholder and an input buffer of `input_len`.
pub struct Fixture {
    pub dir: TempDir,
    pub model: PathBuf,
    pub input: PathBuf,
}

impl Fixture {
    pub fn new(input_len: usize) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let model = dir.path().join("inception_v3.onnx");
        let input = dir.path().join("orange.raw");
        std::fs::write(&model, b"model")?;
        std::fs::write(&input, vec![7u8; input_len])?;
        Ok(Self { dir, model, input })
    }
}
