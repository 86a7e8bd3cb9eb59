use anyhow::Result;
use bytes::Bytes;
use tensorprobe_core::{DType, IOName, ModelSpec, Shape, TensorSpec};
use tensorprobe_runtime::{bind, BindError};

mod support;
use support::IMAGE_BYTES;

#[test]
fn binds_buffer_into_slot_zero() -> Result<()> {
    let spec = ModelSpec::single_input("input", DType::U8, &[1, 299, 299, 3]);
    let inputs = bind(&spec, Bytes::from(vec![1u8; IMAGE_BYTES]))?;

    assert_eq!(inputs.len(), 1);
    let tensor = &inputs.tensors()[0];
    assert_eq!(tensor.desc.dtype, DType::U8);
    assert_eq!(tensor.desc.shape, Shape::from_slice(&[1, 299, 299, 3]));
    assert_eq!(tensor.byte_len(), IMAGE_BYTES);
    Ok(())
}

#[test]
fn dynamic_batch_axis_is_pinned_to_one() -> Result<()> {
    let spec = ModelSpec {
        inputs: vec![TensorSpec {
            name: IOName("images".into()),
            dtype: DType::U8,
            rank: 4,
            dims: vec![None, Some(299), Some(299), Some(3)],
        }],
        outputs: Vec::new(),
    };

    let inputs = bind(&spec, Bytes::from(vec![0u8; IMAGE_BYTES]))?;
    assert_eq!(
        inputs.tensors()[0].desc.shape,
        Shape::from_slice(&[1, 299, 299, 3])
    );
    Ok(())
}

#[test]
fn float_model_does_not_accept_byte_image() {
    let spec = ModelSpec::single_input("input", DType::F32, &[1, 299, 299, 3]);

    match bind(&spec, Bytes::from(vec![0u8; IMAGE_BYTES])) {
        Err(BindError::SizeMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, IMAGE_BYTES * 4);
            assert_eq!(actual, IMAGE_BYTES);
        }
        other => panic!("expected size mismatch, got {other:?}"),
    }
}

#[test]
fn multi_input_models_are_rejected() {
    let mut spec = ModelSpec::single_input("a", DType::U8, &[4]);
    spec.inputs.push(spec.inputs[0].clone());

    assert!(matches!(
        bind(&spec, Bytes::from_static(&[0, 0, 0, 0])),
        Err(BindError::InputCount(2))
    ));
}

#[test]
fn overflowing_input_capacity_is_rejected() {
    let spec = ModelSpec::single_input("huge", DType::F32, &[usize::MAX, 2]);

    assert!(matches!(
        bind(&spec, Bytes::from_static(&[0; 8])),
        Err(BindError::CapacityOverflow { .. })
    ));
}
