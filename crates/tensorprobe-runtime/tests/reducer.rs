use anyhow::Result;
use tensorprobe_core::{Shape, Tensor};
use tensorprobe_runtime::{top1, top1_label, Label, ProbeError, Stage};

#[test]
fn picks_unique_maximum() {
    assert_eq!(top1(&[0u8, 0, 7, 0, 2]), Label(Some(2)));
    assert_eq!(top1(&[3u8, 9, 1, 8, 2]), Label(Some(1)));
}

#[test]
fn ties_keep_the_earliest_index() {
    assert_eq!(top1(&[0u8, 5, 1, 5, 5]), Label(Some(1)));
    assert_eq!(top1(&[4i32, 4]), Label(Some(0)));
}

#[test]
fn no_positive_score_means_no_label() {
    assert_eq!(top1(&[0u8; 5]), Label::NONE);
    assert_eq!(top1(&[-3i32, 0, -1]), Label::NONE);
    assert_eq!(top1::<f32>(&[]), Label::NONE);
    assert_eq!(Label::NONE.as_i64(), -1);
    assert_eq!(Label::NONE.to_string(), "-1");
}

#[test]
fn negative_entries_never_win() {
    assert_eq!(top1(&[-9i64, -1, 2, -20]), Label(Some(2)));
}

#[test]
fn nan_scores_are_skipped() {
    assert_eq!(top1(&[f32::NAN, 0.25, f32::NAN, 0.5]), Label(Some(3)));
}

#[test]
fn only_the_first_label_count_scores_count() -> Result<()> {
    let output = Tensor::from_values(Shape::from_slice(&[1, 7]), &[0u8, 1, 0, 0, 2, 0, 200]);
    assert_eq!(top1_label(&output, 5)?, Label(Some(4)));
    Ok(())
}

#[test]
fn float_outputs_are_supported() -> Result<()> {
    let output = Tensor::from_values(Shape::from_slice(&[5]), &[0.1f32, 0.7, 0.05, 0.1, 0.05]);
    assert_eq!(top1_label(&output, 5)?, Label(Some(1)));
    Ok(())
}

#[test]
fn short_output_is_an_output_error() {
    let output = Tensor::from_values(Shape::from_slice(&[3]), &[1u8, 2, 3]);
    let err = top1_label(&output, 5).unwrap_err();
    assert!(matches!(
        err,
        ProbeError::Engine {
            stage: Stage::Output,
            ..
        }
    ));
}
