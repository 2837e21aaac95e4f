//! Type definitions and aliases for manifold computations.
//!
//! This module provides the scalar trait shared by every crate of the
//! workspace, the tensor aliases used for points and tangent vectors, and
//! the dtype-dependent constants used by numerically guarded formulas.

use nalgebra::{RealField, Scalar as NalgebraScalar};
use ndarray::{ArrayD, ScalarOperand};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used in manifold computations (f32 or f64).
///
/// This trait combines the numeric traits required by the nalgebra
/// decompositions (eigen, Cholesky, QR) and by batched ndarray arithmetic.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + ScalarOperand
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Norm below which closed-form exponential and logarithmic maps fall
    /// back to their first-order counterparts.
    ///
    /// 1e-4 in single precision, 1e-8 in double precision.
    const MAP_EPSILON: Self;

    /// Default absolute tolerance for membership checks.
    const DEFAULT_ATOL: Self;

    /// Default relative tolerance for membership checks.
    const DEFAULT_RTOL: Self;

    /// Name of the dtype, attached to construction log events.
    const DTYPE: &'static str;

    /// Convert from f64 (for constants).
    fn from_f64(v: f64) -> Self;

    /// Convert to f64 (for logging/display).
    fn to_f64(self) -> f64;

    /// Convert from usize (for counts and dimensions).
    fn from_usize(v: usize) -> Self {
        <Self as Scalar>::from_f64(v as f64)
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const MAP_EPSILON: Self = 1e-4;
    const DEFAULT_ATOL: Self = 1e-5;
    const DEFAULT_RTOL: Self = 1e-5;
    const DTYPE: &'static str = "f32";

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const MAP_EPSILON: Self = 1e-8;
    const DEFAULT_ATOL: Self = 1e-5;
    const DEFAULT_RTOL: Self = 1e-5;
    const DTYPE: &'static str = "f64";

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// A point on a manifold.
///
/// The trailing `ndim` axes are manifold axes, every leading axis is a
/// batch axis.
pub type Point<T> = ArrayD<T>;

/// A tangent vector, laid out like the point it is attached to.
pub type TangentVector<T> = ArrayD<T>;

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = nalgebra::DMatrix<T>;

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = nalgebra::DVector<T>;

/// Outcome of a validation: whether it passed and, if not, why.
pub type Check = (bool, Option<String>);
