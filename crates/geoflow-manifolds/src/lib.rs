//! geoflow manifolds - concrete implementations of the manifold contract.
//!
//! - [`euclidean`]: flat space, the default geometry of untagged parameters
//! - [`sphere`]: the unit sphere, optionally constrained to a linear subspace
//! - [`spd`]: symmetric positive definite matrices with the affine-invariant metric

pub mod euclidean;
pub mod spd;
pub mod sphere;

// Re-export main manifolds for convenience
pub use euclidean::Euclidean;
pub use spd::{SolveStrategy, SpdConfig, SymmetricPositiveDefinite, TransportPolicy};
pub use sphere::{Sphere, SphereConfig};
