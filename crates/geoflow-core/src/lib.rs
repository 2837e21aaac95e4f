//! Core traits and types for manifold-constrained optimization and sampling.
//!
//! This crate provides the manifold operator contract shared by every
//! concrete manifold, the error taxonomy, membership tolerances, and the
//! batched spectral engine that matrix manifolds build on.
//!
//! # Key Concepts
//!
//! - **Points and tangent vectors**: `ndarray` tensors whose trailing axes
//!   are manifold axes and whose leading axes are batch axes
//! - **Manifolds**: immutable values exposing validation, metric, retraction,
//!   transport and projections
//! - **Matrix functions**: `f(X) = V f(Λ) Vᵀ` over batches of symmetric
//!   matrices, with optional eigenvalue clamping
//!
//! # Modules
//!
//! - [`error`]: Error types for manifold and sampler operations
//! - [`linalg`]: Batched linear algebra and matrix functions
//! - [`manifold`]: The manifold contract
//! - [`tolerance`]: Absolute/relative tolerances for membership checks
//! - [`types`]: Scalar trait and tensor aliases

pub mod error;
pub mod linalg;
pub mod manifold;
pub mod tolerance;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used items at the crate root
pub use error::{ManifoldError, OptimizerError, OptimizerResult, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use geoflow_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ManifoldError, OptimizerError, OptimizerResult, Result};
    pub use crate::linalg::{
        axat, expm, inv_sqrtm, logm, multisym, multitrans, spd_proj, sqrtm, sym_funcm,
        SpectralFactorization,
    };
    pub use crate::manifold::Manifold;
    pub use crate::tolerance::Tolerance;
    pub use crate::types::{Check, DMatrix, DVector, Point, Scalar, TangentVector};
}
