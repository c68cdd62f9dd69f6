//! Unit-norm search directions.
use crate::util::{l2_distance, l2_norm, ray_point};
use crate::OptFloat;
use ndarray::{Array1, ArrayView1};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit vector defining a ray from the attacked input.
///
/// Every constructor normalizes, and every update returns a fresh value, so a
/// `Direction` held by one optimizer iteration is never changed by the next.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Direction {
    theta: Array1<OptFloat>,
}

impl Direction {
    /// Normalizes `v`, returning the direction and the norm it had.
    ///
    /// Returns `None` for a zero or non-finite vector.
    pub fn from_vector(v: Array1<OptFloat>) -> Option<(Self, OptFloat)> {
        let norm = l2_norm(v.view());
        if norm == 0. || !norm.is_finite() {
            return None;
        }
        Some((Self { theta: v / norm }, norm))
    }

    /// Direction from `origin` towards `target`, with the distance between them.
    pub fn between(
        origin: ArrayView1<OptFloat>,
        target: ArrayView1<OptFloat>,
    ) -> Option<(Self, OptFloat)> {
        Self::from_vector(&target - &origin)
    }

    /// Uniformly distributed unit vector.
    ///
    /// # Panics
    /// If `dim` is zero
    pub fn random<R: Rng + ?Sized>(dim: usize, rng: &mut R) -> Self {
        assert!(dim > 0);
        loop {
            let v = Array1::random_using(dim, StandardNormal, rng);
            if let Some((dir, _)) = Self::from_vector(v) {
                return dir;
            }
        }
    }

    /// `normalize(self + beta * u)`
    ///
    /// Falls back to `self` in the degenerate case where the sum vanishes.
    pub fn perturbed(&self, u: &Self, beta: OptFloat) -> Self {
        let v = &self.theta + &(&u.theta * beta);
        Self::from_vector(v).map_or_else(|| self.clone(), |(dir, _)| dir)
    }

    /// `normalize(self - alpha * gradient)`
    pub fn stepped(&self, gradient: &Array1<OptFloat>, alpha: OptFloat) -> Self {
        let v = &self.theta - &(gradient * alpha);
        Self::from_vector(v).map_or_else(|| self.clone(), |(dir, _)| dir)
    }

    pub fn view(&self) -> ArrayView1<OptFloat> {
        self.theta.view()
    }

    pub fn len(&self) -> usize {
        self.theta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.theta.is_empty()
    }

    pub fn norm(&self) -> OptFloat {
        l2_norm(self.theta.view())
    }

    pub fn distance(&self, other: &Self) -> OptFloat {
        l2_distance(self.view(), other.view())
    }

    /// `x0 + lambda * self`
    pub fn point(&self, x0: ArrayView1<OptFloat>, lambda: OptFloat) -> Array1<OptFloat> {
        ray_point(x0, self.view(), lambda)
    }

    pub fn into_inner(self) -> Array1<OptFloat> {
        self.theta
    }
}

impl AsRef<Array1<OptFloat>> for Direction {
    fn as_ref(&self) -> &Array1<OptFloat> {
        &self.theta
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Direction {}", self.theta.len())
    }
}

/// A direction paired with the boundary distance measured along it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Candidate {
    pub direction: Direction,
    pub distance: OptFloat,
}

impl Candidate {
    pub const fn new(direction: Direction, distance: OptFloat) -> Self {
        Self {
            direction,
            distance,
        }
    }

    pub fn adversarial_point(&self, x0: ArrayView1<OptFloat>) -> Array1<OptFloat> {
        self.direction.point(x0, self.distance)
    }
}
