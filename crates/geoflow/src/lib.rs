//! geoflow - Manifold-constrained geometry and sampling in Rust.
//!
//! This crate re-exports the workspace members under one roof:
//!
//! - [`core`]: the manifold contract, errors, tolerances and the batched
//!   spectral engine
//! - [`manifolds`]: the real line, the subspace-constrained sphere and the
//!   SPD cone with its affine-invariant metric
//! - [`optim`]: RSGLD, SGRHMC and Riemannian SGD
//!
//! # Example
//!
//! ```rust
//! use geoflow::prelude::*;
//! use ndarray::{arr1, ArrayD};
//! use std::sync::Arc;
//!
//! let sphere = Arc::new(Sphere::<f64>::new());
//! let x = ManifoldParameter::on_manifold(arr1(&[0.0, 1.0]).into_dyn(), sphere).unwrap();
//! let mut sampler = Rsgld::new(vec![x], RsgldConfig::new().with_seed(1)).unwrap();
//! sampler.set_burnin(false);
//! sampler
//!     .step(|params| {
//!         params[0].set_grad(ArrayD::zeros(params[0].data().raw_dim()));
//!         0.0
//!     })
//!     .unwrap();
//! assert_eq!(sampler.steps(), 1);
//! ```

pub use geoflow_core as core;
pub use geoflow_manifolds as manifolds;
pub use geoflow_optim as optim;

pub use nalgebra;
pub use ndarray;

/// Everything needed to build manifolds and run samplers.
pub mod prelude {
    pub use geoflow_core::prelude::*;
    pub use geoflow_manifolds::{
        Euclidean, SolveStrategy, SpdConfig, Sphere, SphereConfig, SymmetricPositiveDefinite,
        TransportPolicy,
    };
    pub use geoflow_optim::{
        ManifoldParameter, Rsgd, RsgdConfig, Rsgld, RsgldConfig, Sampler, SamplerState, Sgrhmc,
        SgrhmcConfig,
    };
}
