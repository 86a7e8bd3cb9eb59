use std::fmt;

use tensorprobe_core::{DType, Tensor};
use tracing::debug;

use crate::{ProbeError, Stage};

/// Top-1 class index, or none when no score is positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Label(pub Option<usize>);

impl Label {
    pub const NONE: Label = Label(None);

    /// Index as printed, with `-1` meaning no confident prediction.
    pub fn as_i64(self) -> i64 {
        self.0.map_or(-1, |i| i as i64)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Index of the greatest strictly positive score. Ties keep the earliest.
pub fn top1<T: PartialOrd + Default + Copy + fmt::Debug>(scores: &[T]) -> Label {
    let zero = T::default();
    let mut best: Option<(usize, T)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if !(score > zero) {
            continue;
        }
        match best {
            Some((_, max)) if !(score > max) => {}
            _ => {
                debug!(max = ?score, label = i, "new best score");
                best = Some((i, score));
            }
        }
    }
    Label(best.map(|(i, _)| i))
}

/// Runs [`top1`] over the first `label_count` scores of `output`.
pub fn top1_label(output: &Tensor, label_count: usize) -> Result<Label, ProbeError> {
    let decode_err = |e: anyhow::Error| ProbeError::engine(Stage::Output, e);
    let label = match output.desc.dtype {
        DType::U8 => top1(head(&output.to_values::<u8>().map_err(decode_err)?, label_count)?),
        DType::I32 => top1(head(&output.to_values::<i32>().map_err(decode_err)?, label_count)?),
        DType::I64 => top1(head(&output.to_values::<i64>().map_err(decode_err)?, label_count)?),
        DType::F32 => top1(head(&output.to_values::<f32>().map_err(decode_err)?, label_count)?),
        DType::F16 => {
            return Err(ProbeError::engine(
                Stage::Output,
                anyhow::anyhow!("f16 scores are not supported"),
            ))
        }
    };
    Ok(label)
}

fn head<T>(scores: &[T], label_count: usize) -> Result<&[T], ProbeError> {
    scores.get(..label_count).ok_or_else(|| {
        ProbeError::engine(
            Stage::Output,
            anyhow::anyhow!(
                "output holds {} scores, expected at least {label_count}",
                scores.len()
            ),
        )
    })
}
