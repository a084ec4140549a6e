use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors raised while building a grid
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid of shape {rows}x{cols} cannot hold {got} values")]
    ValueCount { rows: usize, cols: usize, got: usize },

    #[error("row {row} has {got} values but row 0 has {expected}")]
    Ragged { row: usize, expected: usize, got: usize },
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Dimensions of a 2-D grid as `(rows, cols)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Shape { rows, cols }
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.rows, self.cols)
    }
}

// ---------------------------------------------------------------------------
// Grid – the numeric payload of one simulation output file
// ---------------------------------------------------------------------------

/// A row-major 2-D array of `f64` cells.
///
/// Only built through [`Grid::new`] or [`Grid::from_rows`], so the value
/// count always matches the shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    shape: Shape,
    values: Vec<f64>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, GridError> {
        if values.len() != rows * cols {
            return Err(GridError::ValueCount {
                rows,
                cols,
                got: values.len(),
            });
        }
        Ok(Grid {
            shape: Shape::new(rows, cols),
            values,
        })
    }

    /// Build a grid from a list of rows. Every row must have the same length
    /// as the first one.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, GridError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);

        let mut values = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(GridError::Ragged {
                    row: i,
                    expected: n_cols,
                    got: row.len(),
                });
            }
            values.extend(row);
        }

        Grid::new(n_rows, n_cols, values)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Cells in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.shape.rows || col >= self.shape.cols {
            return None;
        }
        self.values.get(row * self.shape.cols + col).copied()
    }

    /// Iterate over the grid one row slice at a time.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // `chunks` panics on 0, and a zero-column grid has no cells anyway.
        self.values.chunks(self.shape.cols.max(1))
    }
}

// ---------------------------------------------------------------------------
// GridMeta – auxiliary values returned alongside a grid
// ---------------------------------------------------------------------------

/// Grid spacing recorded in the source file, if any. Carried for
/// diagnostics; the comparison never reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridMeta {
    pub dx: Option<f64>,
    pub dy: Option<f64>,
}

impl fmt::Display for GridMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt(v: Option<f64>) -> String {
            v.map_or_else(|| "<none>".to_string(), |v| format!("{v:?}"))
        }
        write!(f, "dx={} dy={}", opt(self.dx), opt(self.dy))
    }
}

/// What a [`GridLoader`](super::loader::GridLoader) hands back on success.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGrid {
    pub grid: Grid,
    pub meta: GridMeta,
}

impl From<Grid> for LoadedGrid {
    fn from(grid: Grid) -> Self {
        LoadedGrid {
            grid,
            meta: GridMeta::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_keeps_row_major_order() {
        let grid = Grid::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(grid.shape(), Shape::new(2, 2));
        assert_eq!(grid.values(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(grid.get(1, 0), Some(3.0));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Grid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            GridError::Ragged {
                row: 1,
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn new_rejects_wrong_value_count() {
        assert!(Grid::new(2, 3, vec![0.0; 5]).is_err());
        assert!(Grid::new(2, 3, vec![0.0; 6]).is_ok());
    }

    #[test]
    fn empty_input_is_zero_by_zero() {
        let grid = Grid::from_rows(Vec::new()).unwrap();
        assert!(grid.shape().is_empty());
        assert_eq!(grid.rows().count(), 0);
    }

    #[test]
    fn shape_displays_like_a_tuple() {
        assert_eq!(Shape::new(3, 4).to_string(), "(3, 4)");
    }
}
