//! Flat Euclidean geometry.
//!
//! `R` treats every coordinate as an independent element (`ndim = 0`), while
//! `Euclidean` treats every row as one element (`ndim = 1`). Both are the
//! default geometry of untagged parameters: retraction is addition,
//! transport is the identity, and the gradient needs no conversion.

use geoflow_core::{
    error::Result,
    linalg::sum_last_axes,
    manifold::Manifold,
    tolerance::Tolerance,
    types::{Check, Point, Scalar, TangentVector},
};
use ndarray::{ArrayD, IxDyn};
use num_traits::Float;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

/// Euclidean space over the trailing `ndim` axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Euclidean {
    ndim: usize,
}

impl Euclidean {
    /// Creates a Euclidean manifold whose last `ndim` axes form one element.
    pub fn new(ndim: usize) -> Self {
        debug!(ndim, "Created Euclidean manifold");
        Self { ndim }
    }

    /// Coordinatewise real line (`ndim = 0`).
    pub fn real() -> Self {
        Self::new(0)
    }

    /// Row-wise Euclidean space (`ndim = 1`).
    pub fn rows() -> Self {
        Self::new(1)
    }

    /// Draws a point with i.i.d. `N(mean, std²)` entries.
    pub fn random_normal<T, R>(&self, shape: &[usize], mean: T, std: T, rng: &mut R) -> Result<Point<T>>
    where
        T: Scalar,
        R: Rng + ?Sized,
    {
        Manifold::<T>::assert_check_shape(self, shape, "x")?;
        Ok(ArrayD::from_shape_simple_fn(IxDyn(shape), || {
            <T as Scalar>::from_f64(rng.sample::<f64, _>(StandardNormal)) * std + mean
        }))
    }
}

impl Default for Euclidean {
    fn default() -> Self {
        Self::real()
    }
}

impl<T: Scalar> Manifold<T> for Euclidean {
    fn name(&self) -> &str {
        if self.ndim == 0 {
            "R"
        } else {
            "Euclidean"
        }
    }

    fn ndim(&self) -> usize {
        self.ndim
    }

    fn reversible(&self) -> bool {
        true
    }

    fn verify_point(&self, _x: &Point<T>, _tol: &Tolerance<T>) -> Check {
        (true, None)
    }

    fn verify_tangent(&self, _x: &Point<T>, _u: &TangentVector<T>, _tol: &Tolerance<T>) -> Check {
        (true, None)
    }

    fn dist(&self, x: &Point<T>, y: &Point<T>, keepdim: bool) -> Result<ArrayD<T>> {
        let diff = x - y;
        Ok(sum_last_axes(&(&diff * &diff), self.ndim, keepdim).mapv(<T as Float>::sqrt))
    }

    fn retr(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<Point<T>> {
        Ok(x + u)
    }

    fn expmap(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<Point<T>> {
        Ok(x + u)
    }

    fn logmap(&self, x: &Point<T>, y: &Point<T>) -> Result<TangentVector<T>> {
        Ok(y - x)
    }

    fn transp(&self, _x: &Point<T>, _y: &Point<T>, v: &TangentVector<T>) -> Result<TangentVector<T>> {
        Ok(v.clone())
    }

    fn retr_transp(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        v: &TangentVector<T>,
    ) -> Result<(Point<T>, TangentVector<T>)> {
        Ok((x + u, v.clone()))
    }

    fn expmap_transp(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        v: &TangentVector<T>,
    ) -> Result<(Point<T>, TangentVector<T>)> {
        Ok((x + u, v.clone()))
    }

    fn transp_follow_retr(
        &self,
        _x: &Point<T>,
        _u: &TangentVector<T>,
        v: &TangentVector<T>,
    ) -> Result<TangentVector<T>> {
        Ok(v.clone())
    }

    fn transp_follow_expmap(
        &self,
        _x: &Point<T>,
        _u: &TangentVector<T>,
        v: &TangentVector<T>,
    ) -> Result<TangentVector<T>> {
        Ok(v.clone())
    }

    fn inner(
        &self,
        _x: &Point<T>,
        u: &TangentVector<T>,
        v: Option<&TangentVector<T>>,
        keepdim: bool,
    ) -> Result<ArrayD<T>> {
        let v = v.unwrap_or(u);
        Ok(sum_last_axes(&(u * v), self.ndim, keepdim))
    }

    fn proju(&self, _x: &Point<T>, u: &TangentVector<T>) -> Result<TangentVector<T>> {
        Ok(u.clone())
    }

    fn projx(&self, x: &Point<T>) -> Result<Point<T>> {
        Ok(x.clone())
    }

    fn egrad2rgrad(&self, _x: &Point<T>, u: &TangentVector<T>) -> Result<TangentVector<T>> {
        Ok(u.clone())
    }
}
