#![cfg(test)]
use crate::classifier::{Affine2, ArgmaxClassifier, Sequential};
use crate::direction::Direction;
use crate::OptFloat;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;
use proptest::arbitrary::functor::ArbitraryF1;
use proptest::prelude::*;
use proptest::sample::SizeRange;

prop_compose! {
    pub fn array1(len: usize)(v in Vec::lift1_with(-10. .. 10., SizeRange::new(len..=len))) -> Array1<OptFloat> {
        Array1::from_vec(v)
    }
}

prop_compose! {
    pub fn array2(rows: usize, cols: usize)(v in Vec::lift1_with(array1(cols), SizeRange::new(rows..=rows))) -> Array2<OptFloat> {
        assert!(rows > 0);
        ndarray::stack(Axis(0), &v.iter().map(|x| x.view()).collect::<Vec<ArrayView1<OptFloat>>>()).unwrap()
    }
}

prop_compose! {
    pub fn direction(len: usize)(v in array1(len).prop_filter("nonzero", |v| v.dot(v) > 1e-6)) -> Direction {
        Direction::from_vector(v).unwrap().0
    }
}

prop_compose! {
    pub fn affine2(in_dim: usize, out_dim: usize)(basis in array2(out_dim, in_dim), shift in array1(out_dim)) -> Affine2 {
        Affine2::new(basis, shift)
    }
}

prop_compose! {
    pub fn classifier(input_size: usize, hidden: usize, nclasses: usize)(first in affine2(input_size, hidden), last in affine2(hidden, nclasses)) -> ArgmaxClassifier {
        let mut net = Sequential::default();
        net.add_dense(first);
        net.add_relu(hidden);
        net.add_dense(last);
        ArgmaxClassifier::new(net)
    }
}
