use thiserror::Error;

use super::model::{Grid, Shape};

/// Two grids cannot be compared cell by cell.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("grid size mismatch: {left} vs {right}")]
pub struct ShapeMismatch {
    pub left: Shape,
    pub right: Shape,
}

pub fn check_shapes(a: &Grid, b: &Grid) -> Result<(), ShapeMismatch> {
    if a.shape() != b.shape() {
        return Err(ShapeMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }
    Ok(())
}

/// Largest `|a - b|` over all cells.
///
/// Returns `Ok(None)` when both grids are empty, since there is no maximum
/// to take. A NaN in either grid makes the result NaN.
pub fn max_abs_difference(a: &Grid, b: &Grid) -> Result<Option<f64>, ShapeMismatch> {
    check_shapes(a, b)?;

    let max = a
        .values()
        .iter()
        .zip(b.values())
        .map(|(x, y)| (x - y).abs())
        .reduce(|acc, d| if d.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(d) });

    Ok(max)
}
