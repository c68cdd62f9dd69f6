//! A small feed-forward classifier usable as a label oracle.
pub mod affine;
pub mod dense;
pub mod layer;
pub mod relu;
pub mod sequential;

pub use affine::Affine2;
pub use dense::Dense;
pub use layer::Layer;
pub use relu::ReLU;
pub use sequential::{ArgmaxClassifier, Sequential};
