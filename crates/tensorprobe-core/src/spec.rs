use crate::{DType, Shape};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IOName(pub String);

#[derive(Clone, Debug)]
pub struct TensorSpec {
    pub name: IOName,
    pub dtype: super::DType,
    pub rank: usize,
    pub dims: Vec<Option<usize>>, // None = dynamic
}

impl TensorSpec {
    /// Concrete shape with every dynamic dimension pinned to `fill`.
    pub fn resolved_shape(&self, fill: usize) -> Shape {
        let dims: Vec<usize> = self.dims.iter().map(|d| d.unwrap_or(fill)).collect();
        Shape::from_slice(&dims)
    }

    pub fn is_dynamic(&self) -> bool {
        self.dims.iter().any(Option::is_none)
    }

    /// Byte capacity of one tensor of this spec, dynamic dims pinned to `fill`.
    /// `None` when the capacity overflows `usize`.
    pub fn byte_len(&self, fill: usize) -> Option<usize> {
        self.resolved_shape(fill)
            .checked_numel()?
            .checked_mul(self.dtype.byte_size())
    }
}

/// Input/output metadata of an opened model.
#[derive(Clone, Debug)]
pub struct ModelSpec {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}

impl ModelSpec {
    pub fn single_input(name: &str, dtype: DType, dims: &[usize]) -> Self {
        Self {
            inputs: vec![TensorSpec {
                name: IOName(name.to_string()),
                dtype,
                rank: dims.len(),
                dims: dims.iter().copied().map(Some).collect(),
            }],
            outputs: Vec::new(),
        }
    }
}
