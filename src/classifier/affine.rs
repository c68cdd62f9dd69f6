#![allow(clippy::module_name_repetitions)]
//! Representation of affine transformations
use crate::OptFloat;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::ops::Mul;

/// Affine map `f(x) = Ax + b`
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Affine2 {
    basis: Array2<OptFloat>,
    shift: Array1<OptFloat>,
}

impl Display for Affine2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(
            f,
            "Basis {:?} Shift {:?}",
            self.basis.shape(),
            self.shift.shape()
        )
    }
}

impl Affine2 {
    /// # Panics
    /// If improper shapes are passed in
    pub fn new(basis: Array2<OptFloat>, shift: Array1<OptFloat>) -> Self {
        assert_eq!(basis.nrows(), shift.len());
        Self { basis, shift }
    }

    pub fn identity(ndim: usize) -> Self {
        Self {
            basis: Array2::eye(ndim),
            shift: Array1::zeros(ndim),
        }
    }

    pub fn input_dim(&self) -> usize {
        self.basis.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.shift.len()
    }

    pub fn apply(&self, x: &ArrayView1<OptFloat>) -> Array1<OptFloat> {
        self.basis.dot(x) + &self.shift
    }

    /// Applies the map to every column of `x`.
    pub fn apply_matrix(&self, x: &ArrayView2<OptFloat>) -> Array2<OptFloat> {
        self.basis.dot(x) + &self.shift.view().insert_axis(Axis(1))
    }
}

impl<'a, 'b> Mul<&'b Affine2> for &'a Affine2 {
    type Output = Affine2;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn mul(self, rhs: &'b Affine2) -> Affine2 {
        let basis = self.basis.dot(&rhs.basis);
        let shift = self.basis.dot(&rhs.shift) + &self.shift;
        Affine2 { basis, shift }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use approx::AbsDiffEq;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_apply() {
        let aff = Affine2::new(array![[1., 2.], [0., -1.]], array![0.5, 1.]);
        assert_eq!(aff.apply(&array![1., 1.].view()), array![3.5, 0.]);
    }

    proptest! {
        #[test]
        fn test_affine_composability(start in array1(4), aff_1 in affine2(2, 3), aff_2 in affine2(4, 2)) {
            let result_1 = (&aff_1 * &aff_2).apply(&start.view());
            let result_2 = aff_1.apply(&aff_2.apply(&start.view()).view());
            prop_assert!(result_1.abs_diff_eq(&result_2, 1e-8));
        }

        #[test]
        fn test_apply_matrix_matches_columns(x in array2(3, 5), aff in affine2(3, 2)) {
            let batch = aff.apply_matrix(&x.view());
            for (col, out) in x.columns().into_iter().zip(batch.columns()) {
                prop_assert!(aff.apply(&col).abs_diff_eq(&out, 1e-10));
            }
        }
    }
}
