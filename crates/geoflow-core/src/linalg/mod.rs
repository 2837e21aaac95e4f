//! Batched linear algebra shared by the matrix manifolds.
//!
//! - [`batch`]: splitting `ArrayD` tensors into per-entry nalgebra matrices
//! - [`spectral`]: eigenvalue-based matrix functions (exp, log, sqrt, clamping)
//! - [`decomposition`]: orthonormal bases and numerical rank

pub mod batch;
pub mod decomposition;
pub mod spectral;

pub use batch::{
    apply_to_last_axis, broadcast_pair, broadcast_shape, map_matrices, reduce_matrices, select_where,
    sum_last_axes, zip_matrices, zip_reduce_matrices, MatrixBatch,
};
pub use decomposition::{numerical_rank, orthonormal_basis, span_projector};
pub use spectral::{
    axat, congruence, expm, hgie, inv_sqrtm, logm, multisym, multitrans, spd_proj, sqrtm, sym,
    sym_funcm, sym_funcm_single, SpectralFactorization,
};
