use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use opt_attack::classifier::{Affine2, ArgmaxClassifier, Sequential};
use opt_attack::initial::LabelledSamples;
use rand::Rng;

pub fn affine2<R: Rng>(in_dim: usize, out_dim: usize, rng: &mut R) -> Affine2 {
    Affine2::new(
        Array2::random_using((out_dim, in_dim), StandardNormal, rng),
        Array1::random_using(out_dim, StandardNormal, rng),
    )
}

pub fn make_classifier<R: Rng>(
    input_dim: usize,
    hidden: usize,
    num_classes: usize,
    rng: &mut R,
) -> ArgmaxClassifier {
    let mut net = Sequential::default();
    net.add_dense(affine2(input_dim, hidden, rng));
    net.add_relu(hidden);
    net.add_dense(affine2(hidden, num_classes, rng));
    ArgmaxClassifier::new(net)
}

/// Gaussian inputs labelled by `classifier`.
pub fn make_references<R: Rng>(
    classifier: &ArgmaxClassifier,
    count: usize,
    dim: usize,
    rng: &mut R,
) -> LabelledSamples<usize> {
    let inputs = Array2::random_using((count, dim), StandardNormal, rng);
    let labels = classifier.predict_rows(inputs.view());
    LabelledSamples::new(inputs, labels)
}
