//! Data
//!
//! Borrowed matrix of subject feature rows used for batch scoring.
use crate::errors::TreeError;
use std::fmt;

/// Contiguous row major matrix data container.
///
/// Each row is one subject feature vector, so a row can be handed to the
/// evaluators as a slice without copying.
///
/// # Type Parameters
/// * `T` - The numeric type of the data (e.g., `f32`).
#[derive(Debug)]
pub struct Matrix<'a, T> {
    /// The raw data stored in a single slice.
    pub data: &'a [T],
    /// Indices of the rows to score, in output order.
    pub index: Vec<usize>,
    /// Number of rows in the matrix.
    pub rows: usize,
    /// Number of columns in the matrix.
    pub cols: usize,
}

impl<'a, T> Matrix<'a, T> {
    /// Create a new Matrix.
    ///
    /// * `data` - Row major values, `rows * cols` of them.
    /// * `rows` - Number of rows.
    /// * `cols` - Number of columns, i.e. the subject feature count.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Result<Self, TreeError> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(TreeError::InvalidParameter(
                "data".to_string(),
                format!("{} values for a {}x{} matrix", rows.saturating_mul(cols), rows, cols),
                format!("{} values", data.len()),
            ));
        }
        Ok(Matrix {
            data,
            index: (0..rows).collect(),
            rows,
            cols,
        })
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `j` - the jth column of the data to get.
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[i * self.cols + j]
    }

    /// Get a row of the matrix as a slice.
    ///
    /// * `row` - The index of the row to get.
    pub fn get_row(&self, row: usize) -> &'a [T] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }
}

impl<'a, T> fmt::Display for Matrix<'a, T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_get() {
        let v = vec![1, 2, 3, 5, 6, 7];
        let m = Matrix::new(&v, 2, 3).unwrap();
        assert_eq!(m.get(0, 0), &1);
        assert_eq!(m.get(1, 0), &5);
        assert_eq!(m.get(0, 2), &3);
        assert_eq!(m.get(1, 1), &6);
    }

    #[test]
    fn test_matrix_row() {
        let v = vec![1, 2, 3, 5, 6, 7];
        let m = Matrix::new(&v, 3, 2).unwrap();
        assert_eq!(m.get_row(0), &[1, 2]);
        assert_eq!(m.get_row(1), &[3, 5]);
        assert_eq!(m.get_row(2), &[6, 7]);
        assert_eq!(m.index, vec![0, 1, 2]);
    }

    #[test]
    fn test_matrix_shape_mismatch() {
        let v = vec![1, 2, 3];
        assert!(matches!(Matrix::new(&v, 2, 2), Err(TreeError::InvalidParameter(..))));
    }

    #[test]
    fn test_matrix_display() {
        let v = vec![1, 2, 3, 4];
        let m = Matrix::new(&v, 2, 2).unwrap();
        assert_eq!(m.to_string(), "1 2\n3 4\n");
    }
}
