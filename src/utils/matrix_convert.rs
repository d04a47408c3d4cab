//! Matrix conversion utilities for the rovib-rs library.
//!
//! The public API speaks ndarray (Array1, Array2); the linear solves in
//! the optimizer and the covariance calculation go through nalgebra
//! (DMatrix, DVector) for its decompositions. These helpers bridge the
//! two representations.

use crate::error::Result;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Convert an ndarray Array2 to a nalgebra DMatrix.
///
/// # Arguments
///
/// * `arr` - The ndarray Array2 to convert
///
/// # Returns
///
/// * A nalgebra DMatrix with the same data
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> Result<DMatrix<f64>> {
    // ndarray is row-major by default, nalgebra is column-major, so copy
    // element-wise rather than moving the backing storage.
    Ok(DMatrix::from_fn(arr.nrows(), arr.ncols(), |i, j| {
        arr[[i, j]]
    }))
}

/// Convert a nalgebra DMatrix to an ndarray Array2.
///
/// # Arguments
///
/// * `mat` - The nalgebra DMatrix to convert
///
/// # Returns
///
/// * An ndarray Array2 with the same data
pub fn nalgebra_to_ndarray(mat: &DMatrix<f64>) -> Result<Array2<f64>> {
    Ok(Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| {
        mat[(i, j)]
    }))
}

/// Convert an ndarray Array1 to a nalgebra DVector.
///
/// # Arguments
///
/// * `arr` - The ndarray Array1 to convert
///
/// # Returns
///
/// * A nalgebra DVector with the same data
pub fn ndarray_vec_to_nalgebra(arr: &Array1<f64>) -> Result<DVector<f64>> {
    Ok(DVector::from_fn(arr.len(), |i, _| arr[i]))
}

/// Convert a nalgebra DVector to an ndarray Array1.
///
/// # Arguments
///
/// * `vec` - The nalgebra DVector to convert
///
/// # Returns
///
/// * An ndarray Array1 with the same data
pub fn nalgebra_vec_to_ndarray(vec: &DVector<f64>) -> Result<Array1<f64>> {
    Ok(Array1::from_shape_fn(vec.nrows(), |i| vec[i]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ndarray_nalgebra_roundtrip() {
        let arr = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        let mat = ndarray_to_nalgebra(&arr).unwrap();
        let arr2 = nalgebra_to_ndarray(&mat).unwrap();

        assert_eq!(arr.shape(), arr2.shape());
        for i in 0..arr.nrows() {
            for j in 0..arr.ncols() {
                assert_relative_eq!(arr[[i, j]], arr2[[i, j]]);
            }
        }
    }

    #[test]
    fn test_vector_roundtrip() {
        let arr = Array1::from_vec(vec![1.0, -2.5, 3.25]);

        let vec = ndarray_vec_to_nalgebra(&arr).unwrap();
        let arr2 = nalgebra_vec_to_ndarray(&vec).unwrap();

        assert_eq!(arr.len(), arr2.len());
        for i in 0..arr.len() {
            assert_relative_eq!(arr[i], arr2[i]);
        }
    }

    #[test]
    fn test_empty_inputs() {
        let arr: Array2<f64> = Array2::zeros((0, 0));
        let mat = ndarray_to_nalgebra(&arr).unwrap();
        assert_eq!(mat.nrows(), 0);

        let vec: Array1<f64> = Array1::zeros(0);
        let dv = ndarray_vec_to_nalgebra(&vec).unwrap();
        assert_eq!(dv.nrows(), 0);
    }

    #[test]
    fn test_column_major_order_preserved() {
        // Row-major source lands in the right cells of the column-major target
        let arr = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mat = ndarray_to_nalgebra(&arr).unwrap();
        assert_relative_eq!(mat[(0, 1)], 2.0);
        assert_relative_eq!(mat[(1, 0)], 3.0);
    }
}
