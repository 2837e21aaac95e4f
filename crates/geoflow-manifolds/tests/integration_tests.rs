//! Integration tests for geoflow-manifolds
//!
//! These tests exercise every manifold through the shared contract, the way
//! samplers and optimizers see them: as `Arc<dyn Manifold<T>>`.

use approx::assert_relative_eq;
use geoflow_core::{
    manifold::Manifold,
    test_utils::{assert_allclose, randn, seeded_rng, ManifoldPropertyTester, PropertyTestConfig},
    tolerance::Tolerance,
    types::DMatrix,
    ManifoldError,
};
use geoflow_manifolds::{
    Euclidean, SpdConfig, Sphere, SphereConfig, SymmetricPositiveDefinite, TransportPolicy,
};
use ndarray::{arr1, Array3, ArrayD, Axis};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

type Shared = Arc<dyn Manifold<f64>>;

fn shared<M: Manifold<f64> + 'static>(m: M) -> Shared {
    Arc::new(m)
}

fn subspace_basis() -> DMatrix<f64> {
    DMatrix::from_row_slice(5, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0])
}

/// Every manifold paired with the ambient shape it is sampled at.
fn all_manifolds() -> Vec<(Shared, Vec<usize>)> {
    vec![
        (shared(Euclidean::real()), vec![3, 2]),
        (shared(Euclidean::rows()), vec![3, 4]),
        (shared(Sphere::<f64>::new()), vec![6, 4]),
        (shared(Sphere::<f64>::exact()), vec![6, 4]),
        (shared(Sphere::intersection(subspace_basis()).unwrap()), vec![6, 5]),
        (shared(Sphere::complement(subspace_basis()).unwrap()), vec![6, 5]),
        (shared(SymmetricPositiveDefinite::<f64>::new()), vec![3, 3, 3]),
        (
            shared(
                SymmetricPositiveDefinite::from_config(
                    SpdConfig::new().with_transport(TransportPolicy::Exact),
                )
                .unwrap(),
            ),
            vec![2, 3, 3],
        ),
    ]
}

/// Well-conditioned sample points for each manifold.
fn sampled_manifolds(rng: &mut rand::rngs::StdRng) -> Vec<(Shared, Vec<ArrayD<f64>>)> {
    let euclidean = Euclidean::rows();
    let sphere = Sphere::<f64>::new();
    let exact = Sphere::<f64>::exact();
    let inside = Sphere::intersection(subspace_basis()).unwrap();
    let outside = Sphere::complement(subspace_basis()).unwrap();
    let spd = SymmetricPositiveDefinite::<f64>::new();
    let spd_exact =
        SymmetricPositiveDefinite::from_config(SpdConfig::new().with_transport(TransportPolicy::Exact)).unwrap();

    let mut out = Vec::new();
    let points = (0..5).map(|_| euclidean.random_normal(&[3, 4], 0.0, 1.0, rng).unwrap()).collect();
    out.push((shared(euclidean), points));
    let points = (0..5).map(|_| sphere.random_uniform(&[6, 4], rng).unwrap()).collect();
    out.push((shared(sphere), points));
    let points = (0..5).map(|_| exact.random_uniform(&[6, 4], rng).unwrap()).collect();
    out.push((shared(exact), points));
    let points = (0..5).map(|_| inside.random_uniform(&[6, 5], rng).unwrap()).collect();
    out.push((shared(inside), points));
    let points = (0..5).map(|_| outside.random_uniform(&[6, 5], rng).unwrap()).collect();
    out.push((shared(outside), points));
    let points = (0..5).map(|_| spd.random(&[3], 3, rng).unwrap()).collect();
    out.push((shared(spd), points));
    let points = (0..5).map(|_| spd_exact.random(&[2], 3, rng).unwrap()).collect();
    out.push((shared(spd_exact), points));
    out
}

#[test]
fn test_contract_properties_hold_for_every_manifold() {
    let config = PropertyTestConfig::default();
    let mut rng = seeded_rng(42);
    for (manifold, points) in sampled_manifolds(&mut rng) {
        let result = ManifoldPropertyTester::check_contract(manifold.as_ref(), &points, &config, &mut rng);
        assert!(result.passed(), "{} failed: {:?}", manifold.name(), result.errors);
        assert!(result.num_tests > 0);
    }
}

#[test]
fn test_projx_output_is_on_manifold() {
    let config = PropertyTestConfig::default();
    let mut rng = seeded_rng(1);
    for (manifold, shape) in all_manifolds() {
        let result = ManifoldPropertyTester::check_projection(manifold.as_ref(), &shape, &config, &mut rng);
        assert!(result.passed(), "{} failed: {:?}", manifold.name(), result.errors);
    }
}

#[test]
fn test_manifolds_are_shareable_across_threads() {
    let sphere: Arc<dyn Manifold<f64>> = Arc::new(Sphere::<f64>::new());
    let handles: Vec<_> = (0..4)
        .map(|seed| {
            let sphere = Arc::clone(&sphere);
            std::thread::spawn(move || {
                let mut rng = seeded_rng(seed);
                let x = sphere.projx(&randn(&[8, 3], &mut rng)).unwrap();
                sphere.check_point_on_manifold(&x, &Tolerance::default()).0
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_two_sphere_round_trip() {
    let sphere: Sphere<f64> = Sphere::new();
    let x = arr1(&[1.0, 0.0, 0.0]).into_dyn();
    let u = arr1(&[0.0, 0.01, 0.0]).into_dyn();
    let y = sphere.expmap(&x, &u).unwrap();
    assert_allclose(&sphere.logmap(&x, &y).unwrap(), &u, 1e-6);
}

#[test]
fn test_antipodal_distance_is_pi() {
    let sphere: Sphere<f64> = Sphere::new();
    let x = arr1(&[1.0, 0.0]).into_dyn();
    let d = sphere.dist(&x, &(-&x), false).unwrap();
    assert_relative_eq!(d.sum(), std::f64::consts::PI, epsilon = 1e-10);
}

#[test]
fn test_spd_identity_examples() {
    let spd: SymmetricPositiveDefinite<f64> = SymmetricPositiveDefinite::new();
    let eye = ndarray::Array2::<f64>::eye(2).into_dyn();
    let zero = ArrayD::zeros(eye.raw_dim());
    assert_allclose(&spd.retr(&eye, &zero).unwrap(), &eye, 1e-12);
    assert_relative_eq!(spd.inner(&eye, &eye, None, false).unwrap().sum(), 2.0, epsilon = 1e-12);
    let d = spd.dist(&eye, &(&eye * 4.0), false).unwrap();
    assert_relative_eq!(d.sum(), 2.0_f64.sqrt() * 4.0_f64.ln(), epsilon = 1e-12);
}

#[test]
fn test_one_dimensional_subspace_is_configuration_error() {
    let line = DMatrix::from_row_slice(3, 1, &[0.0, 0.0, 1.0]);
    let err = Sphere::<f64>::intersection(line).unwrap_err();
    assert!(matches!(err, ManifoldError::Configuration { .. }));
}

#[test]
fn test_batched_sphere_matches_per_row() {
    let sphere: Sphere<f64> = Sphere::new();
    let mut rng = seeded_rng(9);
    let x = sphere.random_uniform(&[2, 3, 4], &mut rng).unwrap();
    let u = sphere.proju(&x, &randn(&[2, 3, 4], &mut rng)).unwrap();
    let batched = sphere.expmap(&x, &u).unwrap();
    for i in 0..2 {
        let xi = x.index_axis(Axis(0), i).to_owned();
        let ui = u.index_axis(Axis(0), i).to_owned();
        let single = sphere.expmap(&xi, &ui).unwrap();
        assert_allclose(&batched.index_axis(Axis(0), i).to_owned(), &single, 1e-14);
    }
}

#[test]
fn test_retr_transp_point_equals_retr() {
    let spd: SymmetricPositiveDefinite<f64> = SymmetricPositiveDefinite::new();
    let mut rng = seeded_rng(4);
    let x = spd.random(&[3], 3, &mut rng).unwrap();
    let u = spd.proju(&x, &(randn(&[3, 3, 3], &mut rng) * 0.1)).unwrap();
    let (y, v) = spd.retr_transp(&x, &u, &u).unwrap();
    assert_allclose(&y, &spd.retr(&x, &u).unwrap(), 1e-14);
    assert_eq!(v, u);
}

#[test]
fn test_spd_expmap_stays_batched() {
    let spd: SymmetricPositiveDefinite<f64> = SymmetricPositiveDefinite::new();
    let x = Array3::from_shape_fn((5, 2, 2), |(b, i, j)| if i == j { 1.0 + b as f64 } else { 0.1 }).into_dyn();
    let u = Array3::from_elem((5, 2, 2), 0.05).into_dyn();
    let y = spd.expmap(&x, &u).unwrap();
    assert_eq!(y.shape(), &[5, 2, 2]);
    assert!(spd.check_point_on_manifold(&y, &Tolerance::default()).0);
}

#[test]
fn test_config_builders() {
    let config = SphereConfig::<f64>::new().with_exact(true);
    assert_eq!(config.clone(), SphereConfig { intersection: None, complement: None, exact: true });
    let sphere = Sphere::from_config(config).unwrap();
    assert!(sphere.is_exact());

    let spd = SpdConfig::<f64>::new().with_bounds(1e-4, 1e4);
    assert_eq!(spd.wmin, 1e-4);
    assert_eq!(spd.transport, TransportPolicy::Approximate);
}

#[cfg(feature = "serde")]
#[test]
fn test_configs_serialize() {
    let spd = SpdConfig::<f64>::new().with_transport(TransportPolicy::Exact);
    let json = serde_json::to_string(&spd).unwrap();
    let back: SpdConfig<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(spd, back);

    let sphere = SphereConfig::<f64>::new().with_complement(DMatrix::identity(3, 2));
    let json = serde_json::to_string(&sphere).unwrap();
    let back: SphereConfig<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(sphere, back);
}

proptest! {
    #[test]
    fn prop_sphere_log_exp_round_trip(
        seed in 0u64..1000,
        scale in 0.01f64..1.0,
    ) {
        let sphere: Sphere<f64> = Sphere::new();
        let mut rng = seeded_rng(seed);
        let x = sphere.random_uniform(&[4], &mut rng).unwrap();
        let dir = sphere.proju(&x, &randn(&[4], &mut rng)).unwrap();
        let norm = dir.iter().map(|v| v * v).sum::<f64>().sqrt();
        prop_assume!(norm > 1e-3);
        let u = dir * (scale / norm);
        let y = sphere.expmap(&x, &u).unwrap();
        let back = sphere.logmap(&x, &y).unwrap();
        for (a, b) in back.iter().zip(u.iter()) {
            prop_assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn prop_spd_log_exp_round_trip(seed in 0u64..1000) {
        let spd: SymmetricPositiveDefinite<f64> = SymmetricPositiveDefinite::new();
        let mut rng = seeded_rng(seed);
        let x = spd.random(&[], 3, &mut rng).unwrap();
        let u = spd.proju(&x, &(randn(&[3, 3], &mut rng) * 0.2)).unwrap();
        let y = spd.expmap(&x, &u).unwrap();
        let back = spd.logmap(&x, &y).unwrap();
        for (a, b) in back.iter().zip(u.iter()) {
            prop_assert!((a - b).abs() < 1e-6);
        }
    }
}
