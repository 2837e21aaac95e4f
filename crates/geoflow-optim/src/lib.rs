//! geoflow Optimization - Samplers and optimizers over manifold-constrained parameters.
//!
//! This crate provides the consumers of the manifold contract: Markov chain
//! samplers that keep their parameters on a manifold while exploring an
//! unnormalized density, and a Riemannian SGD optimizer.
//!
//! # Available Algorithms
//!
//! - **RSGLD**: Riemannian stochastic gradient Langevin dynamics
//! - **SGRHMC**: Stochastic gradient Riemannian Hamiltonian Monte Carlo
//! - **RSGD**: Riemannian stochastic gradient descent with momentum
//!
//! Gradients are supplied by the caller: every `step` takes a closure that
//! evaluates the objective at the current parameters and fills their
//! gradient buffers.
//!
//! # Examples
//!
//! ```rust
//! use geoflow_manifolds::Sphere;
//! use geoflow_optim::{ManifoldParameter, Rsgld, RsgldConfig, Sampler};
//! use ndarray::{arr1, ArrayD};
//! use std::sync::Arc;
//!
//! let sphere = Arc::new(Sphere::<f64>::new());
//! let x = ManifoldParameter::on_manifold(arr1(&[1.0, 0.0, 0.0]).into_dyn(), sphere).unwrap();
//! let mut sampler = Rsgld::new(vec![x], RsgldConfig::new().with_seed(7)).unwrap();
//!
//! for _ in 0..10 {
//!     sampler
//!         .step(|params| {
//!             params[0].set_grad(ArrayD::zeros(params[0].data().raw_dim()));
//!             0.0
//!         })
//!         .unwrap();
//! }
//! sampler.stabilize().unwrap();
//! ```

pub mod parameter;
pub mod rsgd;
pub mod rsgld;
pub mod sampler;
pub mod sgrhmc;

// Re-export main types for convenience
pub use parameter::ManifoldParameter;
pub use rsgd::{Rsgd, RsgdConfig};
pub use rsgld::{Rsgld, RsgldConfig};
pub use sampler::{Sampler, SamplerState};
pub use sgrhmc::{Sgrhmc, SgrhmcConfig};

// Re-export commonly used items from core
pub use geoflow_core::error::{OptimizerError, OptimizerResult};
