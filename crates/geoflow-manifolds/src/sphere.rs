//! Sphere manifold S^{n-1} = {x in R^n : ||x|| = 1}, optionally constrained
//! to a linear subspace.
//!
//! The subspace is given by a spanning basis and is either intersected with
//! the sphere (`x ∈ span`) or complemented (`x ⊥ span`). It is stored as an
//! orthogonal projector built once from the orthonormal basis `Q` of the
//! numerical range of the given basis:
//!
//! - intersection: `P = Q Qᵀ`
//! - complement: `P = I - Q Qᵀ`
//!
//! The projector is immutable after construction, so a sphere can be shared
//! across threads without locking.
//!
//! # Mathematical Properties
//!
//! - **Tangent space**: T_x S = {u : <x, u> = 0} ∩ range(P)
//! - **Riemannian metric**: the ambient dot product
//! - **Exponential map**: exp_x(u) = cos(|u|) x + sin(|u|) u/|u|
//! - **Distance**: d(x, y) = arccos(<x, y>)

use geoflow_core::{
    error::{ManifoldError, Result},
    linalg::{apply_to_last_axis, numerical_rank, select_where, span_projector, sum_last_axes},
    manifold::Manifold,
    tolerance::Tolerance,
    types::{Check, DMatrix, Point, Scalar, TangentVector},
};
use ndarray::{ArrayD, IxDyn};
use num_traits::Float;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

/// Construction options of a [`Sphere`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SphereConfig<T: Scalar> {
    /// Basis whose span the points must lie in, one vector per column
    pub intersection: Option<DMatrix<T>>,
    /// Basis whose span the points must be orthogonal to, one vector per column
    pub complement: Option<DMatrix<T>>,
    /// Use the exponential map as the retraction
    pub exact: bool,
}

impl<T: Scalar> Default for SphereConfig<T> {
    fn default() -> Self {
        Self {
            intersection: None,
            complement: None,
            exact: false,
        }
    }
}

impl<T: Scalar> SphereConfig<T> {
    /// Creates an unconstrained, inexact configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts points to the span of `basis`.
    pub fn with_intersection(mut self, basis: DMatrix<T>) -> Self {
        self.intersection = Some(basis);
        self
    }

    /// Restricts points to the orthogonal complement of the span of `basis`.
    pub fn with_complement(mut self, basis: DMatrix<T>) -> Self {
        self.complement = Some(basis);
        self
    }

    /// Retracts with the exponential map.
    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }
}

/// The unit sphere, possibly intersected with a linear subspace.
///
/// With `exact` set, `retr`, `transp_follow_retr` and `retr_transp` follow
/// the exponential map instead of the projection retraction.
#[derive(Debug, Clone)]
pub struct Sphere<T: Scalar> {
    projector: Option<DMatrix<T>>,
    exact: bool,
}

impl<T: Scalar> Sphere<T> {
    /// The unconstrained sphere.
    pub fn new() -> Self {
        Self {
            projector: None,
            exact: false,
        }
    }

    /// The unconstrained sphere retracting with the exponential map.
    pub fn exact() -> Self {
        Self {
            projector: None,
            exact: true,
        }
    }

    /// Sphere intersected with the span of `basis`.
    pub fn intersection(basis: DMatrix<T>) -> Result<Self> {
        Self::from_config(SphereConfig::new().with_intersection(basis))
    }

    /// Sphere intersected with the orthogonal complement of the span of `basis`.
    pub fn complement(basis: DMatrix<T>) -> Result<Self> {
        Self::from_config(SphereConfig::new().with_complement(basis))
    }

    /// Builds a sphere from its configuration.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if both an intersection and a
    /// complement are given, or if the constrained subspace has dimension
    /// below 2 (the sphere would be empty or two isolated points).
    pub fn from_config(config: SphereConfig<T>) -> Result<Self> {
        let projector = match (config.intersection, config.complement) {
            (Some(_), Some(_)) => {
                return Err(ManifoldError::configuration(
                    "can't initialize with both intersection and complement, specify only one",
                ))
            }
            (Some(basis), None) => Some(span_projector(&basis)?),
            (None, Some(basis)) => {
                let p = span_projector(&basis)?;
                Some(DMatrix::identity(p.nrows(), p.ncols()) - p)
            }
            (None, None) => None,
        };

        if let Some(p) = &projector {
            let rank = numerical_rank(p);
            debug!(
                dtype = T::DTYPE,
                size = p.nrows(),
                rank,
                exact = config.exact,
                "Created subspace-constrained sphere"
            );
            if rank < 2 {
                return Err(ManifoldError::configuration(format!(
                    "manifold only consists of isolated points when the subspace is {}-dimensional",
                    rank
                )));
            }
        } else {
            debug!(dtype = T::DTYPE, exact = config.exact, "Created sphere");
        }

        Ok(Self {
            projector,
            exact: config.exact,
        })
    }

    /// The orthogonal projector onto the constrained subspace, if any.
    pub fn projector(&self) -> Option<&DMatrix<T>> {
        self.projector.as_ref()
    }

    /// Whether the retraction is the exponential map.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// Draws a random point: Gaussian ambient noise, projected and normalized.
    ///
    /// Under a subspace constraint the result is not distributed according
    /// to the invariant measure of the constrained sphere.
    pub fn random_uniform<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> Result<Point<T>> {
        self.assert_check_shape(shape, "x")?;
        let noise = ArrayD::from_shape_simple_fn(IxDyn(shape), || {
            <T as Scalar>::from_f64(rng.sample::<f64, _>(StandardNormal))
        });
        self.projx(&noise)
    }

    fn project_on_subspace(&self, x: &ArrayD<T>) -> ArrayD<T> {
        match &self.projector {
            Some(p) => apply_to_last_axis(x, p),
            None => x.clone(),
        }
    }

    fn row_dot(a: &ArrayD<T>, b: &ArrayD<T>, keepdim: bool) -> ArrayD<T> {
        sum_last_axes(&(a * b), 1, keepdim)
    }

    fn row_norm(a: &ArrayD<T>) -> ArrayD<T> {
        Self::row_dot(a, a, true).mapv(<T as Float>::sqrt)
    }

    /// Replaces norms at or below the map epsilon by one, for safe division.
    fn guarded(norm: &ArrayD<T>) -> ArrayD<T> {
        norm.mapv(|n| if n > T::MAP_EPSILON { n } else { T::one() })
    }
}

impl<T: Scalar> Default for Sphere<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Manifold<T> for Sphere<T> {
    fn name(&self) -> &str {
        if self.exact {
            "SphereExact"
        } else {
            "Sphere"
        }
    }

    fn ndim(&self) -> usize {
        1
    }

    fn check_shape(&self, shape: &[usize], name: &str) -> Check {
        let Some(&last) = shape.last() else {
            return (
                false,
                Some(format!("`{}` should have at least 1 dimension but has 0", name)),
            );
        };
        match &self.projector {
            Some(p) if last != p.nrows() => (
                false,
                Some(format!(
                    "the size of the subspace does not match `{}`: {} != {}",
                    name,
                    last,
                    p.nrows()
                )),
            ),
            None if last == 1 => (
                false,
                Some("manifold only consists of isolated points when subspace is 1-dimensional".to_string()),
            ),
            _ => (true, None),
        }
    }

    fn verify_point(&self, x: &Point<T>, tol: &Tolerance<T>) -> Check {
        let norm = Self::row_dot(x, x, false).mapv(<T as Float>::sqrt);
        if !tol.allclose_to(&norm, T::one()) {
            return (false, Some(format!("`norm(x) != 1` {}", tol.describe())));
        }
        if !tol.allclose(&self.project_on_subspace(x), x) {
            return (
                false,
                Some(format!("`x` is not in the subspace of the manifold {}", tol.describe())),
            );
        }
        (true, None)
    }

    fn verify_tangent(&self, x: &Point<T>, u: &TangentVector<T>, tol: &Tolerance<T>) -> Check {
        let inner = Self::row_dot(x, u, true);
        if tol.allclose_to(&inner, T::zero()) {
            (true, None)
        } else {
            (false, Some(format!("`<x, u> != 0` {}", tol.describe())))
        }
    }

    fn dist(&self, x: &Point<T>, y: &Point<T>, keepdim: bool) -> Result<ArrayD<T>> {
        let inner = Self::row_dot(x, y, keepdim);
        Ok(inner.mapv(|c| Float::acos(Float::min(Float::max(c, -T::one()), T::one()))))
    }

    fn retr(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<Point<T>> {
        if self.exact {
            return self.expmap(x, u);
        }
        self.projx(&(x + u))
    }

    fn expmap(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<Point<T>> {
        let norm_u = Self::row_norm(u);
        let safe = Self::guarded(&norm_u);
        let exp = &(x * &norm_u.mapv(<T as Float>::cos)) + &(u * &(norm_u.mapv(<T as Float>::sin) / &safe));
        let retr = self.projx(&(x + u))?;
        let cond = norm_u.mapv(|n| n > T::MAP_EPSILON);
        select_where(&cond, &exp, &retr)
    }

    fn logmap(&self, x: &Point<T>, y: &Point<T>) -> Result<TangentVector<T>> {
        let u = self.proju(x, &(y - x))?;
        let dist = self.dist(x, y, true)?;
        let norm_u = Self::row_norm(&u);
        let far = dist.mapv(|d| d > T::MAP_EPSILON);
        let degenerate = far
            .iter()
            .zip(norm_u.iter())
            .any(|(&far, &n)| far && n <= T::MAP_EPSILON);
        if degenerate {
            return Err(ManifoldError::unsupported(
                self.name(),
                "logmap between antipodal points",
            ));
        }
        let rescaled = &u * &(&dist / &Self::guarded(&norm_u));
        select_where(&far, &rescaled, &u)
    }

    fn transp(&self, _x: &Point<T>, y: &Point<T>, v: &TangentVector<T>) -> Result<TangentVector<T>> {
        self.proju(y, v)
    }

    fn inner(
        &self,
        _x: &Point<T>,
        u: &TangentVector<T>,
        v: Option<&TangentVector<T>>,
        keepdim: bool,
    ) -> Result<ArrayD<T>> {
        Ok(Self::row_dot(u, v.unwrap_or(u), keepdim))
    }

    fn proju(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<TangentVector<T>> {
        let radial = Self::row_dot(x, u, true);
        let u = u - &(x * &radial);
        Ok(self.project_on_subspace(&u))
    }

    fn projx(&self, x: &Point<T>) -> Result<Point<T>> {
        let x = self.project_on_subspace(x);
        let norm = Self::row_norm(&x);
        Ok(&x / &norm)
    }

    fn egrad2rgrad(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<TangentVector<T>> {
        self.proju(x, u)
    }
}
