//! Shape helpers shared by the transforms.

use ndarray::{Array2, ArrayD, Axis, Ix1, Ix2};

use crate::{TransformError, TransformResult};

/// Resolves a possibly negative axis index against `ndim` dimensions.
///
/// # Errors
/// Returns [`TransformError::InvalidParameter`] if the axis is out of range.
pub fn resolve_axis(axis: isize, ndim: usize) -> TransformResult<Axis> {
    let resolved = if axis < 0 {
        ndim as isize + axis
    } else {
        axis
    };
    if resolved < 0 || resolved as usize >= ndim {
        return Err(TransformError::invalid_parameter(format!(
            "axis {axis} is out of range for a tensor of rank {ndim}"
        )));
    }
    Ok(Axis(resolved as usize))
}

/// Right-multiplies the last axis of `x` by `matrix`.
///
/// Rank-1 and rank-2 inputs use a plain `dot`; higher ranks are flattened to
/// `(batch, last)` first, so every leading dimension is treated as a batch.
///
/// # Errors
/// Fails if the last dimension of `x` does not match the rows of `matrix`.
pub fn matmul_last_axis(x: &ArrayD<f64>, matrix: &Array2<f64>) -> TransformResult<ArrayD<f64>> {
    let ndim = x.ndim();
    if ndim == 0 {
        return Err(TransformError::invalid_parameter(
            "cannot project a scalar onto a filter bank",
        ));
    }
    let last = x.shape()[ndim - 1];
    if last != matrix.nrows() {
        return Err(TransformError::dimension_mismatch(format!(
            "last axis has {last} bins but the filter bank expects {}",
            matrix.nrows()
        )));
    }

    match ndim {
        1 => Ok(x.view().into_dimensionality::<Ix1>()?.dot(matrix).into_dyn()),
        2 => Ok(x.view().into_dimensionality::<Ix2>()?.dot(matrix).into_dyn()),
        _ => {
            let batch: usize = x.shape()[..ndim - 1].iter().product();
            let flat = x.to_shape((batch, last))?;
            let projected = flat.dot(matrix);
            let mut shape = x.shape().to_vec();
            shape[ndim - 1] = matrix.ncols();
            Ok(projected.into_shape_with_order(shape)?)
        }
    }
}

/// Stacks two equally shaped tensors along a new axis (negative counts from
/// the end of the stacked rank).
pub fn stack_pair(first: &ArrayD<f64>, second: &ArrayD<f64>, axis: isize) -> TransformResult<ArrayD<f64>> {
    if first.shape() != second.shape() {
        return Err(TransformError::dimension_mismatch(format!(
            "cannot stack shapes {:?} and {:?}",
            first.shape(),
            second.shape()
        )));
    }
    let axis = resolve_axis(axis, first.ndim() + 1)?;
    Ok(ndarray::stack(axis, &[first.view(), second.view()])?)
}

/// Splits a stacked tensor back into its two halves, removing the stack axis.
pub fn split_pair(x: &ArrayD<f64>, axis: isize) -> TransformResult<(ArrayD<f64>, ArrayD<f64>)> {
    let axis = resolve_axis(axis, x.ndim())?;
    let len = x.len_of(axis);
    if len != 2 {
        return Err(TransformError::dimension_mismatch(format!(
            "stack axis {} has length {len}, expected 2",
            axis.index()
        )));
    }
    Ok((
        x.index_axis(axis, 0).to_owned(),
        x.index_axis(axis, 1).to_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, array};

    #[test]
    fn test_resolve_axis() {
        assert_eq!(resolve_axis(-1, 3).unwrap(), Axis(2));
        assert_eq!(resolve_axis(-3, 3).unwrap(), Axis(0));
        assert_eq!(resolve_axis(1, 3).unwrap(), Axis(1));
        assert!(resolve_axis(3, 3).is_err());
        assert!(resolve_axis(-4, 3).is_err());
    }

    #[test]
    fn test_matmul_matches_per_rank() {
        let m = array![[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]];
        let x1 = array![1.0, 2.0].into_dyn();
        assert_eq!(matmul_last_axis(&x1, &m).unwrap(), array![1.0, 2.0, 4.0].into_dyn());

        let x3 = Array3::from_shape_fn((2, 3, 2), |(a, b, c)| (a * 6 + b * 2 + c) as f64).into_dyn();
        let out = matmul_last_axis(&x3, &m).unwrap();
        assert_eq!(out.shape(), &[2, 3, 3]);
        // row [4, 5] -> [4, 5, 13]
        assert_eq!(out[[0, 2, 0]], 4.0);
        assert_eq!(out[[0, 2, 1]], 5.0);
        assert_eq!(out[[0, 2, 2]], 13.0);
    }

    #[test]
    fn test_matmul_rejects_wrong_width() {
        let m = Array2::<f64>::zeros((4, 2));
        let x = array![[1.0, 2.0, 3.0]].into_dyn();
        assert!(matmul_last_axis(&x, &m).is_err());
    }

    #[test]
    fn test_stack_and_split() {
        let a = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
        let b = array![[5.0, 6.0], [7.0, 8.0]].into_dyn();
        let stacked = stack_pair(&a, &b, -2).unwrap();
        assert_eq!(stacked.shape(), &[2, 2, 2]);
        assert_eq!(stacked[[0, 1, 0]], 5.0);

        let (a2, b2) = split_pair(&stacked, -2).unwrap();
        assert_eq!(a2, a);
        assert_eq!(b2, b);
    }
}
