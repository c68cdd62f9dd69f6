use crate::classifier::affine::Affine2;
use crate::classifier::dense::Dense;
use crate::classifier::layer::Layer;
use crate::classifier::relu::ReLU;
use crate::oracle::Oracle;
use crate::OptFloat;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A chain of layers applied in order.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    /// # Panics
    /// In debug builds, if the layer's input width disagrees with the current output width
    pub fn add_layer(&mut self, layer: Box<dyn Layer>) {
        if let (Some(out), Some(inp)) = (self.output_dim(), layer.input_dim()) {
            debug_assert_eq!(out, inp, "cannot append {} after width {}", layer, out);
        }
        self.layers.push(layer);
    }

    pub fn add_dense(&mut self, aff: Affine2) {
        self.add_layer(Box::new(Dense::new(aff)));
    }

    pub fn add_relu(&mut self, ndims: usize) {
        self.add_layer(Box::new(ReLU::new(ndims)));
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn input_dim(&self) -> Option<usize> {
        self.layers.first().and_then(|layer| layer.input_dim())
    }

    pub fn output_dim(&self) -> Option<usize> {
        self.layers.iter().rev().find_map(|layer| layer.output_dim())
    }

    pub fn forward1(&self, input: &Array1<OptFloat>) -> Array1<OptFloat> {
        self.layers
            .iter()
            .fold(input.clone(), |x, layer| layer.forward1(&x))
    }

    /// Evaluates every column of `input`.
    pub fn forward2(&self, input: &Array2<OptFloat>) -> Array2<OptFloat> {
        self.layers
            .iter()
            .fold(input.clone(), |x, layer| layer.forward2(&x))
    }
}

impl fmt::Display for Sequential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers: Vec<String> = self.layers.iter().map(ToString::to_string).collect();
        write!(f, "Input {:?} => {}", self.input_dim(), layers.join(" => "))
    }
}

/// Exposes a network's top-scoring output index and nothing else.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArgmaxClassifier {
    network: Sequential,
}

impl ArgmaxClassifier {
    pub const fn new(network: Sequential) -> Self {
        Self { network }
    }

    pub const fn network(&self) -> &Sequential {
        &self.network
    }

    /// Labels every row of `inputs`.
    pub fn predict_rows(&self, inputs: ArrayView2<OptFloat>) -> Vec<usize> {
        let scores = self.network.forward2(&inputs.t().to_owned());
        scores
            .axis_iter(Axis(1))
            .map(argmax)
            .collect()
    }
}

impl Oracle for ArgmaxClassifier {
    type Label = usize;

    fn predict(&self, input: ArrayView1<OptFloat>) -> usize {
        argmax(self.network.forward1(&input.to_owned()).view())
    }
}

/// Lowest index among the maximal entries; NaN never wins.
fn argmax(scores: ArrayView1<OptFloat>) -> usize {
    scores
        .iter()
        .enumerate()
        .fold((0, OptFloat::NEG_INFINITY), |(best, best_score), (idx, &score)| {
            if score > best_score {
                (idx, score)
            } else {
                (best, best_score)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_argmax_prefers_first_maximum() {
        assert_eq!(argmax(array![1., 3., 3., -2.].view()), 1);
        assert_eq!(argmax(array![OptFloat::NAN, -1.].view()), 1);
    }

    #[test]
    fn test_classifier_labels_by_largest_score() {
        let mut net = Sequential::default();
        net.add_dense(Affine2::new(array![[1., 0.], [0., 1.]], array![0., 0.]));
        let classifier = ArgmaxClassifier::new(net);
        assert_eq!(classifier.predict(array![2., 1.].view()), 0);
        assert_eq!(classifier.predict(array![-2., 1.].view()), 1);
        assert_eq!(
            classifier.predict_rows(array![[2., 1.], [-2., 1.]].view()),
            vec![0, 1]
        );
    }

    #[test]
    fn test_dims() {
        let mut net = Sequential::default();
        assert_eq!(net.input_dim(), None);
        net.add_dense(Affine2::identity(3));
        net.add_relu(3);
        assert_eq!(net.input_dim(), Some(3));
        assert_eq!(net.output_dim(), Some(3));
        assert_eq!(net.layers().len(), 2);
    }

    proptest! {
        #[test]
        fn test_predict_rows_matches_predict(classifier in classifier(3, 5, 4), inputs in array2(6, 3)) {
            let batch = classifier.predict_rows(inputs.view());
            for (row, label) in inputs.rows().into_iter().zip(batch) {
                prop_assert_eq!(classifier.predict(row), label);
            }
        }

        #[test]
        fn test_serde_roundtrip_preserves_predictions(classifier in classifier(2, 4, 3), x in array1(2)) {
            let json = serde_json::to_string(&classifier).unwrap();
            let restored: ArgmaxClassifier = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(restored.predict(x.view()), classifier.predict(x.view()));
        }
    }
}
