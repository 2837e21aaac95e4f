//! Absolute/relative tolerances for membership checks.

use crate::{linalg::batch::broadcast_shape, types::Scalar};
use ndarray::{ArrayD, IxDyn, Zip};
use num_traits::Float;

/// Tolerance pair used by `check_point_on_manifold` and friends.
///
/// Two values `a` and `b` are close when `|a - b| <= atol + rtol * |b|`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance<T> {
    /// Absolute tolerance
    pub atol: T,
    /// Relative tolerance
    pub rtol: T,
}

impl<T: Scalar> Default for Tolerance<T> {
    fn default() -> Self {
        Self {
            atol: T::DEFAULT_ATOL,
            rtol: T::DEFAULT_RTOL,
        }
    }
}

impl<T: Scalar> Tolerance<T> {
    /// Creates a tolerance pair.
    pub fn new(atol: T, rtol: T) -> Self {
        Self { atol, rtol }
    }

    /// Whether two scalars are close.
    #[inline]
    pub fn close(&self, a: T, b: T) -> bool {
        Float::abs(a - b) <= self.atol + self.rtol * Float::abs(b)
    }

    /// Whether two arrays are elementwise close after broadcasting.
    ///
    /// Arrays whose shapes do not broadcast are never close.
    pub fn allclose(&self, a: &ArrayD<T>, b: &ArrayD<T>) -> bool {
        let Some(shape) = broadcast_shape(a.shape(), b.shape()) else {
            return false;
        };
        let (Some(a), Some(b)) = (a.broadcast(IxDyn(&shape)), b.broadcast(IxDyn(&shape))) else {
            return false;
        };
        Zip::from(&a).and(&b).all(|&x, &y| self.close(x, y))
    }

    /// Whether every element of `a` is close to `value`.
    pub fn allclose_to(&self, a: &ArrayD<T>, value: T) -> bool {
        a.iter().all(|&x| self.close(x, value))
    }

    /// Human-readable suffix appended to validation reasons.
    pub fn describe(&self) -> String {
        format!("with atol={}, rtol={}", self.atol, self.rtol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_close_is_asymmetric_like_numpy() {
        let tol = Tolerance::new(0.0, 0.1);
        assert!(tol.close(1.05, 1.0));
        assert!(!tol.close(0.0, 1e-3));
    }

    #[test]
    fn test_allclose_broadcasts() {
        let tol = Tolerance::<f64>::default();
        let a = arr2(&[[1.0, 2.0], [1.0, 2.0]]).into_dyn();
        let b = arr1(&[1.0, 2.0 + 1e-7]).into_dyn();
        assert!(tol.allclose(&a, &b));

        let c = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        assert!(!tol.allclose(&a, &c));
    }

    #[test]
    fn test_allclose_to_scalar() {
        let tol = Tolerance::<f64>::default();
        let a = arr1(&[1.0, 1.0 + 1e-6]).into_dyn();
        assert!(tol.allclose_to(&a, 1.0));
        assert!(!tol.allclose_to(&a, 0.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_tolerance_serde() {
        let tol = Tolerance::<f64>::new(1e-6, 1e-4);
        let json = serde_json::to_string(&tol).unwrap();
        let back: Tolerance<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(tol, back);
    }
}
