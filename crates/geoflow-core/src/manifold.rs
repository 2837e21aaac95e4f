//! The manifold operator contract.
//!
//! A manifold here is a constraint set on the trailing `ndim` axes of a
//! tensor, equipped with a Riemannian metric and the maps needed by
//! first-order optimizers and samplers:
//!
//! - **Validation**: shape checks, constraint membership, tangent membership
//! - **Metric**: `inner`, `norm`, `dist`
//! - **Maps**: `retr`, `expmap`, `logmap`
//! - **Transport**: `transp` and the fused `retr_transp` family
//! - **Projections**: `proju`, `projx`, `egrad2rgrad`
//!
//! Every leading axis of a tensor is a batch axis. Reductions (`inner`,
//! `dist`) collapse the manifold axes and return one value per batch entry.
//!
//! # Mathematical Background
//!
//! - **Retraction**: a map R_x: T_x M → M with R_x(0) = x and dR_x(0) = id,
//!   a first-order substitute for the exponential map
//! - **Exponential map**: the geodesic flow, exact where a closed form exists
//! - **Vector transport**: moves tangent vectors between tangent spaces; true
//!   parallel transport preserves inner products, approximations need not

use crate::{
    error::{ManifoldError, Result},
    tolerance::Tolerance,
    types::{Check, Point, Scalar, TangentVector},
};
use ndarray::ArrayD;
use num_traits::Float;
use std::fmt::Debug;

/// Trait for Riemannian manifolds acting on batched tensors.
///
/// Implementors provide the constraint checks (`verify_point`,
/// `verify_tangent`), the metric, a retraction and the projections. Operations
/// without a closed form keep their default, which fails with
/// [`ManifoldError::Unsupported`] so that callers can tell a missing operation
/// apart from invalid input.
///
/// Geometric operations assume their inputs already passed validation and do
/// not re-validate.
///
/// # Examples
///
/// ```rust,ignore
/// use geoflow_core::prelude::*;
///
/// fn walk<M: Manifold<f64>>(m: &M, x: &Point<f64>, egrad: &TangentVector<f64>) -> Result<Point<f64>> {
///     let rgrad = m.egrad2rgrad(x, egrad)?;
///     m.retr(x, &(-rgrad * 0.1))
/// }
/// ```
pub trait Manifold<T: Scalar>: Debug + Send + Sync {
    /// Human-readable name, used in error messages.
    fn name(&self) -> &str;

    /// Number of trailing axes that are manifold axes.
    fn ndim(&self) -> usize;

    /// Whether `retr` with `-u` undoes `retr` with `u`.
    fn reversible(&self) -> bool {
        false
    }

    /// Checks that a shape carries enough manifold axes.
    ///
    /// Manifolds with further shape requirements (matching axis sizes,
    /// square matrices) override this.
    fn check_shape(&self, shape: &[usize], name: &str) -> Check {
        if shape.len() >= self.ndim() {
            (true, None)
        } else {
            (
                false,
                Some(format!(
                    "`{}` on the {} manifold requires more than {} dim",
                    name,
                    self.name(),
                    self.ndim()
                )),
            )
        }
    }

    /// Constraint membership of a point with a valid shape.
    fn verify_point(&self, x: &Point<T>, tol: &Tolerance<T>) -> Check;

    /// Tangent membership of `u` at a valid point `x`.
    fn verify_tangent(&self, x: &Point<T>, u: &TangentVector<T>, tol: &Tolerance<T>) -> Check;

    /// Checks the shape of a point.
    fn check_point(&self, x: &Point<T>) -> Check {
        self.check_shape(x.shape(), "x")
    }

    /// Checks the shape of a point, failing with a `Shape` error.
    fn assert_check_point(&self, x: &Point<T>) -> Result<()> {
        self.assert_check_shape(x.shape(), "x")
    }

    /// Checks the shape of a tangent vector.
    fn check_vector(&self, u: &TangentVector<T>) -> Check {
        self.check_shape(u.shape(), "u")
    }

    /// Checks the shape of a tangent vector, failing with a `Shape` error.
    fn assert_check_vector(&self, u: &TangentVector<T>) -> Result<()> {
        self.assert_check_shape(u.shape(), "u")
    }

    /// Checks the shape, then the constraint, of a point.
    fn check_point_on_manifold(&self, x: &Point<T>, tol: &Tolerance<T>) -> Check {
        let (ok, reason) = self.check_point(x);
        if !ok {
            return (ok, reason);
        }
        self.verify_point(x, tol)
    }

    /// Asserting variant of [`Manifold::check_point_on_manifold`].
    fn assert_check_point_on_manifold(&self, x: &Point<T>, tol: &Tolerance<T>) -> Result<()> {
        self.assert_check_point(x)?;
        match self.verify_point(x, tol) {
            (true, _) => Ok(()),
            (false, reason) => Err(ManifoldError::not_on_manifold(
                self.name(),
                reason.unwrap_or_default(),
            )),
        }
    }

    /// Checks that `u` lies on the tangent space at `x`.
    ///
    /// Unless `ok_point` is set, both shapes and the constraint on `x` are
    /// checked first.
    fn check_vector_on_tangent(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        ok_point: bool,
        tol: &Tolerance<T>,
    ) -> Check {
        if !ok_point {
            for check in [
                self.check_shape(x.shape(), "x"),
                self.check_shape(u.shape(), "u"),
            ] {
                if !check.0 {
                    return check;
                }
            }
            let check = self.verify_point(x, tol);
            if !check.0 {
                return check;
            }
        }
        self.verify_tangent(x, u, tol)
    }

    /// Asserting variant of [`Manifold::check_vector_on_tangent`].
    fn assert_check_vector_on_tangent(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        ok_point: bool,
        tol: &Tolerance<T>,
    ) -> Result<()> {
        if !ok_point {
            self.assert_check_shape(x.shape(), "x")?;
            self.assert_check_shape(u.shape(), "u")?;
            if let (false, reason) = self.verify_point(x, tol) {
                return Err(ManifoldError::not_on_manifold(
                    self.name(),
                    reason.unwrap_or_default(),
                ));
            }
        }
        match self.verify_tangent(x, u, tol) {
            (true, _) => Ok(()),
            (false, reason) => Err(ManifoldError::not_on_tangent(
                self.name(),
                reason.unwrap_or_default(),
            )),
        }
    }

    /// Geodesic distance between `x` and `y`, one value per batch entry.
    fn dist(&self, _x: &Point<T>, _y: &Point<T>, _keepdim: bool) -> Result<ArrayD<T>> {
        Err(ManifoldError::unsupported(self.name(), "dist"))
    }

    /// Retraction from `x` along `u`.
    fn retr(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<Point<T>>;

    /// Exponential map from `x` along `u`.
    fn expmap(&self, _x: &Point<T>, _u: &TangentVector<T>) -> Result<Point<T>> {
        Err(ManifoldError::unsupported(self.name(), "expmap"))
    }

    /// Logarithmic map: the tangent vector at `x` pointing to `y`.
    fn logmap(&self, _x: &Point<T>, _y: &Point<T>) -> Result<TangentVector<T>> {
        Err(ManifoldError::unsupported(self.name(), "logmap"))
    }

    /// Transports `v` from the tangent space at `x` to the one at `y`.
    fn transp(&self, _x: &Point<T>, _y: &Point<T>, _v: &TangentVector<T>) -> Result<TangentVector<T>> {
        Err(ManifoldError::unsupported(self.name(), "transp"))
    }

    /// Transports several vectors from `x` to `y`.
    fn transp_many(
        &self,
        x: &Point<T>,
        y: &Point<T>,
        vs: &[&TangentVector<T>],
    ) -> Result<Vec<TangentVector<T>>> {
        vs.iter().map(|v| self.transp(x, y, v)).collect()
    }

    /// Retraction followed by transport along the same retraction.
    fn retr_transp(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        v: &TangentVector<T>,
    ) -> Result<(Point<T>, TangentVector<T>)> {
        let y = self.retr(x, u)?;
        let v = self.transp(x, &y, v)?;
        Ok((y, v))
    }

    /// Exponential map followed by transport along the same geodesic.
    fn expmap_transp(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        v: &TangentVector<T>,
    ) -> Result<(Point<T>, TangentVector<T>)> {
        let y = self.expmap(x, u)?;
        let v = self.transp(x, &y, v)?;
        Ok((y, v))
    }

    /// Transports `v` to the endpoint of `retr(x, u)`.
    fn transp_follow_retr(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        v: &TangentVector<T>,
    ) -> Result<TangentVector<T>> {
        let y = self.retr(x, u)?;
        self.transp(x, &y, v)
    }

    /// Transports `v` to the endpoint of `expmap(x, u)`.
    fn transp_follow_expmap(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        v: &TangentVector<T>,
    ) -> Result<TangentVector<T>> {
        let y = self.expmap(x, u)?;
        self.transp(x, &y, v)
    }

    /// Riemannian inner product at `x`; `v` defaults to `u`.
    fn inner(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        v: Option<&TangentVector<T>>,
        keepdim: bool,
    ) -> Result<ArrayD<T>>;

    /// Norm induced by [`Manifold::inner`].
    fn norm(&self, x: &Point<T>, u: &TangentVector<T>, keepdim: bool) -> Result<ArrayD<T>> {
        Ok(self.inner(x, u, None, keepdim)?.mapv(<T as Float>::sqrt))
    }

    /// Projects an ambient vector onto the tangent space at `x`.
    fn proju(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<TangentVector<T>>;

    /// Maps an ambient point onto the manifold.
    fn projx(&self, x: &Point<T>) -> Result<Point<T>>;

    /// Converts a Euclidean gradient into the Riemannian gradient at `x`.
    fn egrad2rgrad(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<TangentVector<T>>;

    /// Asserting variant of [`Manifold::check_shape`].
    fn assert_check_shape(&self, shape: &[usize], name: &str) -> Result<()> {
        match self.check_shape(shape, name) {
            (true, _) => Ok(()),
            (false, reason) => Err(ManifoldError::shape(
                self.name(),
                name,
                reason.unwrap_or_default(),
            )),
        }
    }
}
