//! # Symmetric Positive Definite Manifold S⁺⁺(n)
//!
//! The manifold of n×n symmetric positive definite matrices under the
//! affine-invariant metric. Points are tensors of shape `(..., n, n)`.
//!
//! ## Geometric Structure
//!
//! ### Tangent Space
//! The tangent space at any point is the space of symmetric matrices:
//! ```text
//! T_X S⁺⁺(n) = {U ∈ ℝⁿˣⁿ : U = Uᵀ}
//! ```
//!
//! ### Affine-Invariant Metric
//! ```text
//! g_X(U, V) = tr(X⁻¹ U X⁻¹ V)
//! ```
//!
//! ### Maps
//! Every map is computed in the frame of the Cholesky factor `X = L Lᵀ`:
//! ```text
//! exp_X(U) = L exp(L⁻¹ U L⁻ᵀ) Lᵀ
//! log_X(Y) = L log(L⁻¹ Y L⁻ᵀ) Lᵀ
//! R_X(U)   = X + U + ½ Sᵀ S,   S = L⁻¹ U
//! d(X, Y)² = Σᵢ log²(λᵢ(L⁻¹ Y L⁻ᵀ))
//! ```
//!
//! ### Parallel Transport
//! ```text
//! Γ_{X→Y}(V) = E V Eᵀ,   E = X^{1/2} (X^{-1/2} Y X^{-1/2})^{1/2} X^{-1/2}
//! ```
//! Exact transport costs several eigendecompositions per matrix, so the
//! default transport is the identity. The policy is fixed at construction.
//!
//! ## Numerical Considerations
//!
//! - Spectra are clamped into `[wmin, wmax]` by `projx` and before taking
//!   logarithms in `dist`; clamping is a correction, never an error.
//! - Geometric operations trust their inputs. A point whose Cholesky
//!   factorization fails surfaces as a `Numerical` error.

use geoflow_core::{
    error::{ManifoldError, Result},
    linalg::{
        axat, congruence, expm, multisym, multitrans, reduce_matrices, spd_proj, sym,
        sym_funcm_single, zip_matrices, zip_reduce_matrices, SpectralFactorization,
    },
    manifold::Manifold,
    tolerance::Tolerance,
    types::{Check, DMatrix, Point, Scalar, TangentVector},
};
use ndarray::{ArrayD, Axis, IxDyn};
use num_traits::Float;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

/// How tangent vectors are moved between tangent spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportPolicy {
    /// Identity transport
    #[default]
    Approximate,
    /// True affine-invariant parallel transport
    Exact,
}

/// How the Cholesky factor is inverted in `retr`, `dist`, `expmap`, `logmap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveStrategy {
    /// Triangular solves against `L`
    #[default]
    Triangular,
    /// Explicit inverse of `L`
    DirectInverse,
}

/// Construction options of a [`SymmetricPositiveDefinite`] manifold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpdConfig<T> {
    /// Lower eigenvalue bound
    pub wmin: T,
    /// Upper eigenvalue bound
    pub wmax: T,
    /// Transport used by `transp` and the fused operations
    pub transport: TransportPolicy,
    /// Factor inversion strategy
    pub solver: SolveStrategy,
    /// Compute `inner` with general solves against `X` instead of Cholesky solves
    pub differentiable: bool,
}

impl<T: Scalar> Default for SpdConfig<T> {
    fn default() -> Self {
        Self {
            wmin: <T as Scalar>::from_f64(1e-8),
            wmax: <T as Scalar>::from_f64(1e8),
            transport: TransportPolicy::default(),
            solver: SolveStrategy::default(),
            differentiable: false,
        }
    }
}

impl<T: Scalar> SpdConfig<T> {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the eigenvalue bounds.
    pub fn with_bounds(mut self, wmin: T, wmax: T) -> Self {
        self.wmin = wmin;
        self.wmax = wmax;
        self
    }

    /// Sets the transport policy.
    pub fn with_transport(mut self, transport: TransportPolicy) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the factor inversion strategy.
    pub fn with_solver(mut self, solver: SolveStrategy) -> Self {
        self.solver = solver;
        self
    }

    /// Selects general solves for `inner`.
    pub fn with_differentiable(mut self, differentiable: bool) -> Self {
        self.differentiable = differentiable;
        self
    }

    /// Validates the bounds.
    pub fn validate(&self) -> Result<()> {
        if !(self.wmin > T::zero()) {
            return Err(ManifoldError::configuration(format!(
                "wmin must be positive, got {}",
                self.wmin
            )));
        }
        if !(self.wmin < self.wmax) {
            return Err(ManifoldError::configuration(format!(
                "wmin must be below wmax, got wmin={}, wmax={}",
                self.wmin, self.wmax
            )));
        }
        Ok(())
    }
}

/// The manifold of symmetric positive definite matrices.
#[derive(Debug, Clone)]
pub struct SymmetricPositiveDefinite<T: Scalar> {
    config: SpdConfig<T>,
}

impl<T: Scalar> SymmetricPositiveDefinite<T> {
    /// SPD manifold with default bounds `[1e-8, 1e8]`.
    pub fn new() -> Self {
        Self {
            config: SpdConfig::default(),
        }
    }

    /// SPD manifold with the given eigenvalue bounds.
    pub fn with_bounds(wmin: T, wmax: T) -> Result<Self> {
        Self::from_config(SpdConfig::new().with_bounds(wmin, wmax))
    }

    /// Builds the manifold from a validated configuration.
    pub fn from_config(config: SpdConfig<T>) -> Result<Self> {
        config.validate()?;
        debug!(
            dtype = T::DTYPE,
            wmin = <T as Scalar>::to_f64(config.wmin),
            wmax = <T as Scalar>::to_f64(config.wmax),
            transport = ?config.transport,
            solver = ?config.solver,
            differentiable = config.differentiable,
            "Created SPD manifold"
        );
        Ok(Self { config })
    }

    /// The configuration the manifold was built with.
    pub fn config(&self) -> &SpdConfig<T> {
        &self.config
    }

    /// Squared geodesic distance.
    pub fn dist_squared(&self, x: &Point<T>, y: &Point<T>, keepdim: bool) -> Result<ArrayD<T>> {
        let (wmin, wmax) = (self.config.wmin, self.config.wmax);
        let sq = zip_reduce_matrices(x, y, |x, y| {
            let a = self.whiten(&self.cholesky(x)?, y)?;
            let w = SpectralFactorization::of(&a).clamp(wmin, wmax).eigenvalues;
            Ok(w.iter().fold(T::zero(), |acc, &w| {
                let l = Float::ln(w);
                acc + l * l
            }))
        })?;
        Ok(Self::keep_matrix_axes(sq, keepdim))
    }

    /// True parallel transport of `v` from `x` to `y`, whatever the policy.
    pub fn ptransp(&self, x: &Point<T>, y: &Point<T>, v: &TangentVector<T>) -> Result<TangentVector<T>> {
        let e = zip_matrices(x, y, |x, y| Ok(self.transport_factor(x, y)))?;
        zip_matrices(&e, v, |e, v| Ok(congruence(e, v)))
    }

    /// Draws a random point of shape `(*batch_shape, n, n)`.
    ///
    /// A Gaussian symmetric matrix is mapped through the matrix exponential
    /// and clamped into the configured bounds.
    pub fn random<R: Rng + ?Sized>(&self, batch_shape: &[usize], n: usize, rng: &mut R) -> Result<Point<T>> {
        let mut shape = batch_shape.to_vec();
        shape.extend([n, n]);
        self.assert_check_shape(&shape, "x")?;
        let noise = ArrayD::from_shape_simple_fn(IxDyn(&shape), || {
            <T as Scalar>::from_f64(rng.sample::<f64, _>(StandardNormal))
        });
        self.projx(&expm(&multisym(&noise))?)
    }

    fn cholesky(&self, x: &DMatrix<T>) -> Result<DMatrix<T>> {
        x.clone()
            .cholesky()
            .map(|c| c.l())
            .ok_or_else(|| ManifoldError::numerical("Cholesky factorization failed: matrix is not positive definite"))
    }

    /// `L⁻¹ U` for a lower-triangular factor.
    fn solve_factor(&self, l: &DMatrix<T>, u: &DMatrix<T>) -> Result<DMatrix<T>> {
        let solved = match self.config.solver {
            SolveStrategy::Triangular => l.solve_lower_triangular(u),
            SolveStrategy::DirectInverse => l.clone().try_inverse().map(|l_inv| l_inv * u),
        };
        solved.ok_or_else(|| ManifoldError::numerical("singular Cholesky factor"))
    }

    /// `L⁻¹ Y L⁻ᵀ`, symmetrized.
    fn whiten(&self, l: &DMatrix<T>, y: &DMatrix<T>) -> Result<DMatrix<T>> {
        let left = self.solve_factor(l, y)?;
        let both = self.solve_factor(l, &left.transpose())?;
        Ok(sym(&both))
    }

    fn transport_factor(&self, x: &DMatrix<T>, y: &DMatrix<T>) -> DMatrix<T> {
        let clamp: Option<(T, T)> = Some((Float::min_positive_value(), Float::infinity()));
        let x_sqrt = sym_funcm_single(x, <T as Float>::sqrt, clamp);
        let x_inv_sqrt = sym_funcm_single(x, |w| T::one() / Float::sqrt(w), clamp);
        let middle = sym_funcm_single(&sym(&congruence(&x_inv_sqrt, y)), <T as Float>::sqrt, clamp);
        x_sqrt * middle * x_inv_sqrt
    }

    /// `X⁻¹ U` through the configured solve path.
    fn solve_point(&self, x: &DMatrix<T>, u: &DMatrix<T>) -> Result<DMatrix<T>> {
        if self.config.differentiable {
            x.clone()
                .lu()
                .solve(u)
                .ok_or_else(|| ManifoldError::numerical("singular matrix in linear solve"))
        } else {
            let chol = x
                .clone()
                .cholesky()
                .ok_or_else(|| ManifoldError::numerical("Cholesky factorization failed: matrix is not positive definite"))?;
            Ok(chol.solve(u))
        }
    }

    fn keep_matrix_axes(a: ArrayD<T>, keepdim: bool) -> ArrayD<T> {
        if !keepdim {
            return a;
        }
        let mut a = a;
        for _ in 0..2 {
            let end = a.ndim();
            a.insert_axis_inplace(Axis(end));
        }
        a
    }

    fn is_symmetric(a: &ArrayD<T>, tol: &Tolerance<T>) -> bool {
        tol.allclose(a, &multitrans(a))
    }
}

impl<T: Scalar> Default for SymmetricPositiveDefinite<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Manifold<T> for SymmetricPositiveDefinite<T> {
    fn name(&self) -> &str {
        "SymmetricPositiveDefinite"
    }

    fn ndim(&self) -> usize {
        2
    }

    fn check_shape(&self, shape: &[usize], name: &str) -> Check {
        if shape.len() < 2 {
            return (
                false,
                Some(format!(
                    "`{}` should have at least 2 dimensions but has {}",
                    name,
                    shape.len()
                )),
            );
        }
        let (rows, cols) = (shape[shape.len() - 2], shape[shape.len() - 1]);
        if rows != cols {
            return (
                false,
                Some(format!("`{}` is not square: {}x{}", name, rows, cols)),
            );
        }
        (true, None)
    }

    fn verify_point(&self, x: &Point<T>, tol: &Tolerance<T>) -> Check {
        if !Self::is_symmetric(x, tol) {
            return (false, Some(format!("the matrix is not symmetric {}", tol.describe())));
        }
        let wmin = self.config.wmin;
        // a spectrum clamped exactly at wmin must still pass after reconstruction
        let floor = wmin - tol.rtol * wmin;
        let positive = reduce_matrices(x, |m| {
            Ok(SpectralFactorization::of(m)
                .eigenvalues
                .iter()
                .all(|&w| w >= floor))
        });
        match positive {
            Ok(flags) if flags.iter().all(|&ok| ok) => (true, None),
            Ok(_) => (
                false,
                Some(format!("the matrix is not positive definite with wmin={}", wmin)),
            ),
            Err(e) => (false, Some(e.to_string())),
        }
    }

    fn verify_tangent(&self, _x: &Point<T>, u: &TangentVector<T>, tol: &Tolerance<T>) -> Check {
        if Self::is_symmetric(u, tol) {
            (true, None)
        } else {
            (false, Some(format!("the matrix is not symmetric {}", tol.describe())))
        }
    }

    fn dist(&self, x: &Point<T>, y: &Point<T>, keepdim: bool) -> Result<ArrayD<T>> {
        Ok(self.dist_squared(x, y, keepdim)?.mapv(<T as Float>::sqrt))
    }

    fn retr(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<Point<T>> {
        let half = <T as Scalar>::from_f64(0.5);
        zip_matrices(x, u, |x, u| {
            let s = self.solve_factor(&self.cholesky(x)?, u)?;
            Ok(x + u + (s.transpose() * s) * half)
        })
    }

    fn expmap(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<Point<T>> {
        zip_matrices(x, u, |x, u| {
            let l = self.cholesky(x)?;
            let a = self.whiten(&l, u)?;
            Ok(congruence(&l, &sym_funcm_single(&a, <T as Float>::exp, None)))
        })
    }

    fn logmap(&self, x: &Point<T>, y: &Point<T>) -> Result<TangentVector<T>> {
        let clamp: Option<(T, T)> = Some((Float::min_positive_value(), Float::infinity()));
        zip_matrices(x, y, |x, y| {
            let l = self.cholesky(x)?;
            let a = self.whiten(&l, y)?;
            Ok(congruence(&l, &sym_funcm_single(&a, <T as Float>::ln, clamp)))
        })
    }

    fn transp(&self, x: &Point<T>, y: &Point<T>, v: &TangentVector<T>) -> Result<TangentVector<T>> {
        match self.config.transport {
            TransportPolicy::Approximate => Ok(v.clone()),
            TransportPolicy::Exact => self.ptransp(x, y, v),
        }
    }

    fn inner(
        &self,
        x: &Point<T>,
        u: &TangentVector<T>,
        v: Option<&TangentVector<T>>,
        keepdim: bool,
    ) -> Result<ArrayD<T>> {
        let value = match v {
            None => zip_reduce_matrices(x, u, |x, u| {
                let a = self.solve_point(x, u)?;
                Ok((&a * &a).trace())
            })?,
            Some(v) => {
                let x_inv_u = zip_matrices(x, u, |x, u| self.solve_point(x, u))?;
                let x_inv_v = zip_matrices(x, v, |x, v| self.solve_point(x, v))?;
                zip_reduce_matrices(&x_inv_u, &x_inv_v, |a, b| Ok((a * b).trace()))?
            }
        };
        Ok(Self::keep_matrix_axes(value, keepdim))
    }

    fn proju(&self, _x: &Point<T>, u: &TangentVector<T>) -> Result<TangentVector<T>> {
        Ok(multisym(u))
    }

    fn projx(&self, x: &Point<T>) -> Result<Point<T>> {
        spd_proj(x, self.config.wmin, self.config.wmax)
    }

    fn egrad2rgrad(&self, x: &Point<T>, u: &TangentVector<T>) -> Result<TangentVector<T>> {
        axat(x, &multisym(u))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geoflow_core::test_utils::{assert_allclose, seeded_rng};
    use ndarray::{arr2, Array3};

    fn eye(n: usize) -> ArrayD<f64> {
        ndarray::Array2::eye(n).into_dyn()
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(matches!(
            SymmetricPositiveDefinite::<f64>::with_bounds(0.0, 1.0),
            Err(ManifoldError::Configuration { .. })
        ));
        assert!(SymmetricPositiveDefinite::<f64>::with_bounds(2.0, 1.0).is_err());
        assert!(SymmetricPositiveDefinite::<f64>::with_bounds(1e-3, 1e3).is_ok());
    }

    #[test]
    fn test_inner_at_identity() {
        let spd = SymmetricPositiveDefinite::new();
        let u = eye(2);
        let value = spd.inner(&eye(2), &u, None, false).unwrap();
        assert_relative_eq!(value.sum(), 2.0, epsilon = 1e-12);
        assert_eq!(spd.inner(&eye(2), &u, None, true).unwrap().shape(), &[1, 1]);
    }

    #[test]
    fn test_inner_paths_agree() {
        let x = arr2(&[[2.0, 0.5], [0.5, 1.0]]).into_dyn();
        let u = arr2(&[[1.0, 0.3], [0.3, -1.0]]).into_dyn();
        let v = arr2(&[[0.0, 1.0], [1.0, 2.0]]).into_dyn();
        let fast = SymmetricPositiveDefinite::new();
        let general =
            SymmetricPositiveDefinite::from_config(SpdConfig::new().with_differentiable(true)).unwrap();
        let a = fast.inner(&x, &u, Some(&v), false).unwrap();
        let b = general.inner(&x, &u, Some(&v), false).unwrap();
        assert_allclose(&a, &b, 1e-12);
    }

    #[test]
    fn test_zero_step_is_identity() {
        let spd = SymmetricPositiveDefinite::new();
        let zero = ArrayD::zeros(IxDyn(&[2, 2]));
        assert_allclose(&spd.retr(&eye(2), &zero).unwrap(), &eye(2), 1e-12);
        assert_allclose(&spd.expmap(&eye(2), &zero).unwrap(), &eye(2), 1e-12);
    }

    #[test]
    fn test_retr_second_order_term() {
        let spd = SymmetricPositiveDefinite::new();
        let u = arr2(&[[1.0, 0.0], [0.0, 2.0]]).into_dyn();
        // I + U + ½ U²
        let expected = arr2(&[[2.5, 0.0], [0.0, 5.0]]).into_dyn();
        assert_allclose(&spd.retr(&eye(2), &u).unwrap(), &expected, 1e-12);
    }

    #[test]
    fn test_expmap_logmap_round_trip() {
        let spd = SymmetricPositiveDefinite::new();
        let x = arr2(&[[2.0, 0.5], [0.5, 1.0]]).into_dyn();
        let u = arr2(&[[0.3, -0.1], [-0.1, 0.2]]).into_dyn();
        let y = spd.expmap(&x, &u).unwrap();
        assert!(spd.check_point_on_manifold(&y, &Tolerance::default()).0);
        assert_allclose(&spd.logmap(&x, &y).unwrap(), &u, 1e-9);
    }

    #[test]
    fn test_dist_identity_to_scaled_identity() {
        let spd = SymmetricPositiveDefinite::new();
        let d = spd.dist(&eye(2), &(eye(2) * 4.0), false).unwrap();
        assert_relative_eq!(d.sum(), 2.0_f64.sqrt() * 4.0_f64.ln(), epsilon = 1e-12);
        let sq = spd.dist_squared(&eye(2), &(eye(2) * 4.0), false).unwrap();
        assert_relative_eq!(sq.sum(), 2.0 * 4.0_f64.ln().powi(2), epsilon = 1e-12);
        let zero = spd.dist(&eye(2), &eye(2), false).unwrap();
        assert_relative_eq!(zero.sum(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solver_strategies_agree() {
        let direct =
            SymmetricPositiveDefinite::from_config(SpdConfig::new().with_solver(SolveStrategy::DirectInverse))
                .unwrap();
        let triangular = SymmetricPositiveDefinite::new();
        let x = arr2(&[[3.0, 1.0], [1.0, 2.0]]).into_dyn();
        let y = arr2(&[[1.0, 0.2], [0.2, 4.0]]).into_dyn();
        let u = arr2(&[[0.1, 0.2], [0.2, 0.3]]).into_dyn();
        assert_allclose(&direct.dist(&x, &y, false).unwrap(), &triangular.dist(&x, &y, false).unwrap(), 1e-10);
        assert_allclose(&direct.retr(&x, &u).unwrap(), &triangular.retr(&x, &u).unwrap(), 1e-10);
    }

    #[test]
    fn test_exact_transport_preserves_inner_product() {
        let spd = SymmetricPositiveDefinite::from_config(
            SpdConfig::new().with_transport(TransportPolicy::Exact),
        )
        .unwrap();
        let x = arr2(&[[2.0, 0.3], [0.3, 1.0]]).into_dyn();
        let y = arr2(&[[1.0, -0.2], [-0.2, 3.0]]).into_dyn();
        let u = arr2(&[[1.0, 0.5], [0.5, -0.5]]).into_dyn();
        let v = arr2(&[[0.2, 0.0], [0.0, 1.0]]).into_dyn();
        let tu = spd.transp(&x, &y, &u).unwrap();
        let tv = spd.transp(&x, &y, &v).unwrap();
        let before = spd.inner(&x, &u, Some(&v), false).unwrap();
        let after = spd.inner(&y, &tu, Some(&tv), false).unwrap();
        assert_allclose(&after, &before, 1e-9);
    }

    #[test]
    fn test_default_transport_is_identity() {
        let spd = SymmetricPositiveDefinite::new();
        let u = arr2(&[[1.0, 0.5], [0.5, -0.5]]).into_dyn();
        let y = eye(2) * 3.0;
        assert_eq!(spd.transp(&eye(2), &y, &u).unwrap(), u);
        assert_ne!(spd.ptransp(&eye(2), &y, &u).unwrap(), u);
    }

    #[test]
    fn test_projx_clamps_and_symmetrizes() {
        let spd = SymmetricPositiveDefinite::with_bounds(1e-2, 1e2).unwrap();
        let x = arr2(&[[-1.0, 2.0], [0.0, 500.0]]).into_dyn();
        let p = spd.projx(&x).unwrap();
        assert_relative_eq!(p[[0, 1]], p[[1, 0]], epsilon = 1e-12);
        assert!(spd.check_point_on_manifold(&p, &Tolerance::default()).0);
    }

    #[test]
    fn test_egrad2rgrad_conjugates_by_point() {
        let spd = SymmetricPositiveDefinite::new();
        let x = eye(2) * 2.0;
        let u = arr2(&[[1.0, 2.0], [0.0, 1.0]]).into_dyn();
        let r = spd.egrad2rgrad(&x, &u).unwrap();
        assert_allclose(&r, &arr2(&[[4.0, 4.0], [4.0, 4.0]]).into_dyn(), 1e-12);
    }

    #[test]
    fn test_validation() {
        let spd = SymmetricPositiveDefinite::new();
        let tol = Tolerance::default();
        let asym = arr2(&[[1.0, 2.0], [0.0, 1.0]]).into_dyn();
        let (ok, reason) = spd.check_point_on_manifold(&asym, &tol);
        assert!(!ok);
        assert!(reason.unwrap().contains("symmetric"));
        let indefinite = arr2(&[[1.0, 0.0], [0.0, -1.0]]).into_dyn();
        assert!(matches!(
            spd.assert_check_point_on_manifold(&indefinite, &tol),
            Err(ManifoldError::NotOnManifold { .. })
        ));
        assert!(!spd.check_vector_on_tangent(&eye(2), &asym, true, &tol).0);
        assert!(!spd.check_point(&ArrayD::zeros(IxDyn(&[2, 3]))).0);
    }

    #[test]
    fn test_batched_random_points() {
        let spd = SymmetricPositiveDefinite::new();
        let x: ArrayD<f64> = spd.random(&[4], 3, &mut seeded_rng(5)).unwrap();
        assert_eq!(x.shape(), &[4, 3, 3]);
        assert!(spd.check_point_on_manifold(&x, &Tolerance::default()).0);

        // one batched distance equals the per-entry distances
        let y = Array3::from_shape_fn((4, 3, 3), |(_, i, j)| if i == j { 2.0 } else { 0.0 }).into_dyn();
        let batched = spd.dist(&x, &y, false).unwrap();
        for (b, expected) in batched.iter().enumerate() {
            let xb = x.index_axis(Axis(0), b).to_owned();
            let yb = y.index_axis(Axis(0), b).to_owned();
            assert_relative_eq!(spd.dist(&xb, &yb, false).unwrap().sum(), *expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_factorization_failure_is_numerical() {
        let spd = SymmetricPositiveDefinite::new();
        let bad = arr2(&[[1.0, 0.0], [0.0, -1.0]]).into_dyn();
        assert!(matches!(
            spd.retr(&bad, &eye(2)),
            Err(ManifoldError::Numerical { .. })
        ));
    }
}
