use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use tensorprobe_core::{
    Backend, BackendModel, DType, Device, IOName, InvokeTimeout, ModelArtifact, ModelSpec, Shape,
    Tensor, TensorSpec,
};
use ort::{
    session::{builder::SessionBuilder, RunOptions, Session, SessionInputValue},
    tensor::TensorElementType,
    value::{DynValue, ValueType},
};
use tracing::{debug, warn};

pub struct OrtBackend;

impl OrtBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrtBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OrtModel {
    spec: ModelSpec,
    session: Session,
    input_names: Vec<String>,
    timeout: Option<Duration>,
}

impl Backend for OrtBackend {
    type Model = OrtModel;

    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn load(&self, artifact: &ModelArtifact, device: Device) -> Result<Self::Model> {
        let ModelArtifact::OnnxPath(path) = artifact else {
            bail!(
                "onnxruntime backend cannot load {} models ({})",
                artifact.format(),
                artifact.path().display()
            );
        };

        let builder = Session::builder()
            .context("failed to create ORT session builder")?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .context("failed to configure ORT session builder")?;

        let builder = configure_session_builder(builder, device)?;

        let session = builder
            .commit_from_file(path)
            .with_context(|| format!("failed to load ONNX model {}", path.display()))?;

        let input_names = session
            .inputs
            .iter()
            .map(|input| input.name.clone())
            .collect();

        let spec = build_model_spec(&session)?;
        debug!(
            inputs = spec.inputs.len(),
            outputs = spec.outputs.len(),
            %device,
            "ORT session ready"
        );

        Ok(OrtModel {
            spec,
            session,
            input_names,
            timeout: None,
        })
    }
}

impl BackendModel for OrtModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn infer(&mut self, inputs: Vec<Tensor>) -> Result<Vec<Tensor>> {
        ensure!(
            inputs.len() == self.input_names.len(),
            "expected {} inputs, got {}",
            self.input_names.len(),
            inputs.len()
        );

        let mut ort_inputs = Vec::with_capacity(inputs.len());
        for (name, input) in self.input_names.iter().zip(inputs) {
            let value = tensor_to_ort_value(input)?;
            ort_inputs.push((name.clone(), SessionInputValue::from(value)));
        }

        let run_options = RunOptions::new().context("failed to create ORT run options")?;
        let timed_out = AtomicBool::new(false);
        let timeout = self.timeout;
        let session = &mut self.session;

        // The watchdog asks ORT to stop at its next check point once the limit
        // passes; dropping `done_tx` wakes it up early when the run finishes.
        let result = thread::scope(|scope| {
            let (done_tx, done_rx) = mpsc::channel::<()>();
            if let Some(limit) = timeout {
                let run_options = &run_options;
                let timed_out = &timed_out;
                scope.spawn(move || {
                    if let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(limit) {
                        timed_out.store(true, Ordering::SeqCst);
                        if let Err(err) = run_options.terminate() {
                            warn!(error = %err, "failed to terminate ORT run");
                        }
                    }
                });
            }

            let result = session
                .run_with_options(ort_inputs, &run_options)
                .map_err(anyhow::Error::from)
                .and_then(|outputs| {
                    outputs
                        .iter()
                        .map(|(_, value)| ort_value_to_tensor(&value))
                        .collect::<Result<Vec<_>>>()
                });
            drop(done_tx);
            result
        });

        match (result, timeout) {
            (Err(err), Some(limit)) if timed_out.load(Ordering::SeqCst) => {
                Err(err.context(InvokeTimeout { limit }))
            }
            (result, _) => result,
        }
    }
}

fn build_model_spec(session: &Session) -> Result<ModelSpec> {
    let inputs = session
        .inputs
        .iter()
        .map(|input| tensor_spec_from_value_type(&input.name, &input.input_type))
        .collect::<Result<Vec<_>>>()?;

    let outputs = session
        .outputs
        .iter()
        .map(|output| tensor_spec_from_value_type(&output.name, &output.output_type))
        .collect::<Result<Vec<_>>>()?;

    Ok(ModelSpec { inputs, outputs })
}

fn configure_session_builder(builder: SessionBuilder, device: Device) -> Result<SessionBuilder> {
    match device {
        Device::Cpu => Ok(builder),
        Device::Any => configure_any(builder),
        Device::Cuda { device_id } => configure_cuda(builder, device_id),
    }
}

fn configure_any(builder: SessionBuilder) -> Result<SessionBuilder> {
    #[cfg(feature = "cuda")]
    {
        // ORT silently keeps the CPU provider when CUDA cannot be registered.
        use ort::execution_providers::CUDAExecutionProvider;
        builder
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .context("failed to register ORT execution providers")
    }
    #[cfg(not(feature = "cuda"))]
    {
        debug!("no accelerator support compiled in, using CPU execution provider");
        Ok(builder)
    }
}

fn configure_cuda(builder: SessionBuilder, device_id: u32) -> Result<SessionBuilder> {
    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        let ep = CUDAExecutionProvider::default()
            .with_device_id(device_id as i32)
            .build()
            .error_on_failure();
        builder
            .with_execution_providers([ep])
            .context("failed to enable ORT CUDA execution provider")
    }
    #[cfg(not(feature = "cuda"))]
    {
        let _ = (builder, device_id);
        bail!("CUDA requested but tensorprobe-backend-ort was built without the `cuda` feature")
    }
}

fn tensor_spec_from_value_type(name: &str, value_type: &ValueType) -> Result<TensorSpec> {
    let ValueType::Tensor { ty, shape, .. } = value_type else {
        bail!("unsupported non-tensor IO value type");
    };

    let dtype = ort_tensor_element_to_dtype(*ty)?;
    let dims = shape
        .iter()
        .map(|d| if *d < 0 { None } else { Some(*d as usize) })
        .collect::<Vec<_>>();

    Ok(TensorSpec {
        name: IOName(name.to_string()),
        dtype,
        rank: shape.len(),
        dims,
    })
}

fn ort_tensor_element_to_dtype(ty: TensorElementType) -> Result<DType> {
    match ty {
        TensorElementType::Float32 => Ok(DType::F32),
        TensorElementType::Float16 => Ok(DType::F16),
        TensorElementType::Int64 => Ok(DType::I64),
        TensorElementType::Int32 => Ok(DType::I32),
        TensorElementType::Uint8 => Ok(DType::U8),
        _ => bail!("unsupported tensor element type: {ty}"),
    }
}

fn tensor_to_ort_value(tensor: Tensor) -> Result<DynValue> {
    let shape: Vec<usize> = tensor.desc.shape.0.iter().copied().collect();
    let expected_bytes = tensor.expected_byte_len();
    ensure!(
        tensor.byte_len() == expected_bytes,
        "input byte size mismatch: got {}, expected {}",
        tensor.byte_len(),
        expected_bytes
    );

    let value = match tensor.desc.dtype {
        DType::F32 => {
            let data = tensor.to_values::<f32>()?;
            ort::value::Tensor::from_array((shape, data))?.into_dyn()
        }
        DType::I64 => {
            let data = tensor.to_values::<i64>()?;
            ort::value::Tensor::from_array((shape, data))?.into_dyn()
        }
        DType::I32 => {
            let data = tensor.to_values::<i32>()?;
            ort::value::Tensor::from_array((shape, data))?.into_dyn()
        }
        DType::U8 => {
            let data = tensor.bytes.to_vec();
            ort::value::Tensor::from_array((shape, data))?.into_dyn()
        }
        DType::F16 => bail!("f16 inputs are not supported yet"),
    };

    Ok(value)
}

fn ort_value_to_tensor(value: &ort::value::ValueRef<'_>) -> Result<Tensor> {
    let ValueType::Tensor { ty, shape, .. } = value.dtype() else {
        bail!("non-tensor outputs are not supported");
    };

    let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
    let out_shape = Shape::from_slice(&dims);

    match *ty {
        TensorElementType::Float32 => {
            let array = value.try_extract_array::<f32>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Ok(Tensor::from_values(out_shape, slice))
        }
        TensorElementType::Int64 => {
            let array = value.try_extract_array::<i64>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Ok(Tensor::from_values(out_shape, slice))
        }
        TensorElementType::Int32 => {
            let array = value.try_extract_array::<i32>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Ok(Tensor::from_values(out_shape, slice))
        }
        TensorElementType::Uint8 => {
            let array = value.try_extract_array::<u8>()?;
            let slice = array.as_slice().context("non-contiguous output tensor")?;
            Ok(Tensor::from_values(out_shape, slice))
        }
        TensorElementType::Float16 => bail!("f16 outputs are not supported yet"),
        _ => bail!("unsupported output tensor element type: {ty}"),
    }
}
