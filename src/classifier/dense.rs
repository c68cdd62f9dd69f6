use crate::classifier::affine::Affine2;
use crate::classifier::layer::Layer;
use crate::OptFloat;
use ndarray::Array1;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Dense {
    aff: Affine2,
}

impl Dense {
    pub const fn new(aff: Affine2) -> Self {
        Self { aff }
    }
}

#[typetag::serde]
impl Layer for Dense {
    fn input_dim(&self) -> Option<usize> {
        Some(self.aff.input_dim())
    }

    fn output_dim(&self) -> Option<usize> {
        Some(self.aff.output_dim())
    }

    fn forward1(&self, input: &Array1<OptFloat>) -> Array1<OptFloat> {
        debug_assert_eq!(input.len(), self.aff.input_dim());
        self.aff.apply(&input.view())
    }

    fn forward2(&self, input: &Array2<OptFloat>) -> Array2<OptFloat> {
        self.aff.apply_matrix(&input.view())
    }
}

impl fmt::Display for Dense {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dense {}", self.aff.output_dim())
    }
}
