//! Test utilities for property-based testing of manifolds.
//!
//! Available under `cfg(test)` and the `test-utils` feature, so that the
//! manifold and sampler crates can share the same helpers.

use crate::{
    manifold::Manifold,
    tolerance::Tolerance,
    types::{Point, Scalar, TangentVector},
};
use ndarray::{ArrayD, IxDyn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Deterministic rng for reproducible tests.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Tensor of i.i.d. standard normal entries.
pub fn randn<T: Scalar, R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> ArrayD<T> {
    ArrayD::from_shape_simple_fn(IxDyn(shape), || {
        <T as Scalar>::from_f64(rng.sample::<f64, _>(StandardNormal))
    })
}

/// Panics unless `actual` and `expected` are elementwise close.
#[track_caller]
pub fn assert_allclose<T: Scalar>(actual: &ArrayD<T>, expected: &ArrayD<T>, atol: T) {
    let tol = Tolerance::new(atol, T::zero());
    assert!(
        tol.allclose(actual, expected),
        "arrays differ {}:\n  actual: {}\nexpected: {}",
        tol.describe(),
        actual,
        expected
    );
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropertyTestConfig<T> {
    /// Tolerance used for membership checks
    pub tolerance: Tolerance<T>,
    /// Number of random points to test
    pub num_points: usize,
    /// Scale factor for tangent vectors
    pub tangent_scale: T,
}

impl<T: Scalar> Default for PropertyTestConfig<T> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            num_points: 10,
            tangent_scale: <T as Scalar>::from_f64(0.1),
        }
    }
}

/// Results from property tests.
#[derive(Debug, Default)]
pub struct PropertyTestResult {
    /// Number of checks performed
    pub num_tests: usize,
    /// Description of every failed check
    pub errors: Vec<String>,
}

impl PropertyTestResult {
    /// Whether every check passed.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, ok: bool, what: impl FnOnce() -> String) {
        self.num_tests += 1;
        if !ok {
            self.errors.push(what());
        }
    }
}

/// Property-based tests shared by every manifold.
pub struct ManifoldPropertyTester;

impl ManifoldPropertyTester {
    /// Checks that `projx` of random ambient samples of `shape` lands on the
    /// manifold.
    pub fn check_projection<T, M, R>(
        manifold: &M,
        shape: &[usize],
        config: &PropertyTestConfig<T>,
        rng: &mut R,
    ) -> PropertyTestResult
    where
        T: Scalar,
        M: Manifold<T> + ?Sized,
        R: Rng + ?Sized,
    {
        let mut result = PropertyTestResult::default();
        for i in 0..config.num_points {
            match manifold.projx(&randn(shape, rng)) {
                Ok(x) => {
                    let (ok, reason) = manifold.check_point_on_manifold(&x, &config.tolerance);
                    result.record(ok, || format!("sample {}: projx off manifold: {:?}", i, reason));
                }
                Err(e) => result.record(false, || format!("sample {}: projx failed: {}", i, e)),
            }
        }
        result
    }

    /// Checks the tangent-space and retraction invariants at each point:
    ///
    /// - `proju` lands on the tangent space and is idempotent
    /// - `retr(x, 0) = x`
    /// - `retr` of a small tangent step stays on the manifold
    /// - the point returned by `retr_transp` equals `retr`, when supported
    pub fn check_contract<T, M, R>(
        manifold: &M,
        points: &[Point<T>],
        config: &PropertyTestConfig<T>,
        rng: &mut R,
    ) -> PropertyTestResult
    where
        T: Scalar,
        M: Manifold<T> + ?Sized,
        R: Rng + ?Sized,
    {
        let mut result = PropertyTestResult::default();
        let tol = &config.tolerance;
        for (i, x) in points.iter().enumerate() {
            let (ok, reason) = manifold.check_point_on_manifold(x, tol);
            result.record(ok, || format!("point {}: not on manifold: {:?}", i, reason));

            let ambient: TangentVector<T> = randn(x.shape(), rng);
            let u = match manifold.proju(x, &ambient) {
                Ok(u) => u * config.tangent_scale,
                Err(e) => {
                    result.record(false, || format!("point {}: proju failed: {}", i, e));
                    continue;
                }
            };
            let (ok, reason) = manifold.check_vector_on_tangent(x, &u, true, tol);
            result.record(ok, || format!("point {}: proju off tangent: {:?}", i, reason));

            let again = manifold.proju(x, &u);
            result.record(
                again.map(|again| tol.allclose(&again, &u)).unwrap_or(false),
                || format!("point {}: proju is not idempotent", i),
            );

            let zero: TangentVector<T> = ArrayD::zeros(x.raw_dim());
            let same = manifold.retr(x, &zero);
            result.record(
                same.map(|same| tol.allclose(&same, x)).unwrap_or(false),
                || format!("point {}: retr(x, 0) != x", i),
            );

            let moved: Option<Point<T>> = manifold.retr(x, &u).ok();
            let on = moved
                .as_ref()
                .map(|y| manifold.check_point_on_manifold(y, tol).0)
                .unwrap_or(false);
            result.record(on, || format!("point {}: retr left the manifold", i));

            match manifold.retr_transp(x, &u, &u) {
                Ok((y, _)) => result.record(
                    moved.map(|m| tol.allclose(&m, &y)).unwrap_or(false),
                    || format!("point {}: retr_transp point differs from retr", i),
                ),
                Err(e) if e.is_unsupported() => {}
                Err(e) => result.record(false, || format!("point {}: retr_transp failed: {}", i, e)),
            }
        }
        result
    }
}
