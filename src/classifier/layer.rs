use crate::OptFloat;
use dyn_clone::DynClone;
use ndarray::{Array1, Array2};
use std::fmt::{Debug, Display};

/// One stage of a feed-forward network.
///
/// Batched inputs hold one sample per column.
#[typetag::serde(tag = "type")]
pub trait Layer: DynClone + Display + Debug + Send + Sync {
    /// `None` for shape-preserving layers that accept any width.
    fn input_dim(&self) -> Option<usize>;

    fn output_dim(&self) -> Option<usize>;

    fn forward1(&self, input: &Array1<OptFloat>) -> Array1<OptFloat>;

    fn forward2(&self, input: &Array2<OptFloat>) -> Array2<OptFloat>;
}

// This implements `Clone` for the trait
dyn_clone::clone_trait_object!(Layer);
