//! Utility functions
use crate::OptFloat;
use ndarray::{Array1, ArrayView1, Zip};

pub fn l2_norm(x: ArrayView1<OptFloat>) -> OptFloat {
    x.dot(&x).sqrt()
}

/// Euclidean distance between two points of equal dimension.
pub fn l2_distance(a: ArrayView1<OptFloat>, b: ArrayView1<OptFloat>) -> OptFloat {
    Zip::from(&a)
        .and(&b)
        .fold(0., |acc, &x, &y| acc + (x - y) * (x - y))
        .sqrt()
}

/// Point at scale `lambda` along `theta` from `x0`.
pub fn ray_point(
    x0: ArrayView1<OptFloat>,
    theta: ArrayView1<OptFloat>,
    lambda: OptFloat,
) -> Array1<OptFloat> {
    debug_assert_eq!(x0.len(), theta.len());
    Zip::from(&x0)
        .and(&theta)
        .map_collect(|&x, &t| x + lambda * t)
}

/// `n` evenly spaced points over `[0, upper]` with the zero endpoint dropped.
pub fn open_linspace(upper: OptFloat, n: usize) -> Array1<OptFloat> {
    if n < 2 {
        return Array1::from_elem(1, upper);
    }
    let mut grid = Array1::linspace(0., upper, n).slice(ndarray::s![1..]).to_owned();
    // Pin the endpoint; `step * (n - 1)` can round below `upper`
    grid[n - 2] = upper;
    grid
}
