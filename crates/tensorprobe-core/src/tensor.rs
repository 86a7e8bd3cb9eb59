use std::fmt;

use anyhow::{ensure, Result};
use bytes::Bytes;
use smallvec::SmallVec;

/// Hardware target a model is opened on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    /// Let the engine pick the most capable accelerator it has.
    #[default]
    Any,
    Cpu,
    Cuda { device_id: u32 },
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Any => f.write_str("any"),
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda { device_id } => write!(f, "cuda:{device_id}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    F16,
    I64,
    I32,
    U8,
}

impl DType {
    pub fn byte_size(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 => 2,
            DType::I64 => 8,
            DType::I32 => 4,
            DType::U8 => 1,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F32 => "f32",
            DType::F16 => "f16",
            DType::I64 => "i64",
            DType::I32 => "i32",
            DType::U8 => "u8",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>()
    }
    /// Element count, or `None` if it does not fit in `usize`.
    pub fn checked_numel(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        f.write_str("]")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorDesc {
    pub dtype: DType,
    pub shape: Shape,
}

/// Plain-old-data element types that can live in a [`Tensor`].
///
/// Values are stored little-endian regardless of the host.
pub trait Element: Copy {
    const DTYPE: DType;

    fn read_le(bytes: &[u8]) -> Self;
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_le_bytes(raw)
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_element!(f32, DType::F32);
impl_element!(i64, DType::I64);
impl_element!(i32, DType::I32);
impl_element!(u8, DType::U8);

/// A CPU tensor. Storage is reference counted, so clones are cheap and share
/// the same bytes.
#[derive(Clone, Debug)]
pub struct Tensor {
    pub desc: TensorDesc,
    pub bytes: Bytes,
}

impl Tensor {
    pub fn from_cpu_bytes(dtype: DType, shape: Shape, bytes: Bytes) -> Self {
        Self {
            desc: TensorDesc { dtype, shape },
            bytes,
        }
    }

    pub fn from_values<T: Element>(shape: Shape, values: &[T]) -> Self {
        let mut out = Vec::with_capacity(values.len() * T::DTYPE.byte_size());
        for v in values {
            v.write_le(&mut out);
        }
        Self::from_cpu_bytes(T::DTYPE, shape, Bytes::from(out))
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes the declared shape and dtype call for.
    pub fn expected_byte_len(&self) -> usize {
        self.desc.shape.numel() * self.desc.dtype.byte_size()
    }

    /// Decodes the storage as a vector of `T`.
    pub fn to_values<T: Element>(&self) -> Result<Vec<T>> {
        ensure!(
            self.desc.dtype == T::DTYPE,
            "tensor holds {} values, requested {}",
            self.desc.dtype,
            T::DTYPE
        );
        let size = T::DTYPE.byte_size();
        ensure!(
            self.bytes.len() % size == 0,
            "{} tensor has invalid byte length {}",
            T::DTYPE,
            self.bytes.len()
        );
        Ok(self.bytes.chunks_exact(size).map(T::read_le).collect())
    }
}
