use bytes::Bytes;
use tensorprobe_core::{ModelSpec, Tensor};
use tracing::debug;

use crate::BindError;

/// Dynamic dimensions (usually the batch axis) are pinned to this size.
pub const DYNAMIC_DIM_FILL: usize = 1;

/// Input tensor set handed to every invoke. Cloning shares the storage.
#[derive(Clone, Debug)]
pub struct InputTensors {
    tensors: Vec<Tensor>,
}

impl InputTensors {
    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub(crate) fn to_vec(&self) -> Vec<Tensor> {
        self.tensors.clone()
    }
}

/// Wraps `raw` into slot 0 of a tensor set shaped after the model's input.
pub fn bind(spec: &ModelSpec, raw: Bytes) -> Result<InputTensors, BindError> {
    let [slot] = spec.inputs.as_slice() else {
        return Err(BindError::InputCount(spec.inputs.len()));
    };

    if slot.is_dynamic() {
        debug!(slot = %slot.name.0, fill = DYNAMIC_DIM_FILL, "pinning dynamic input dims");
    }
    let shape = slot.resolved_shape(DYNAMIC_DIM_FILL);
    let expected = slot
        .byte_len(DYNAMIC_DIM_FILL)
        .ok_or_else(|| BindError::CapacityOverflow {
            slot: slot.name.0.clone(),
        })?;
    if raw.len() != expected {
        return Err(BindError::SizeMismatch {
            slot: slot.name.0.clone(),
            expected,
            actual: raw.len(),
        });
    }

    debug!(slot = %slot.name.0, dtype = %slot.dtype, %shape, "input bound");
    Ok(InputTensors {
        tensors: vec![Tensor::from_cpu_bytes(slot.dtype, shape, raw)],
    })
}
