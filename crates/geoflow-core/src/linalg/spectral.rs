//! Spectral matrix functions on batches of symmetric matrices.
//!
//! For a symmetric matrix `X = V Λ Vᵀ` and a scalar function `f`, the matrix
//! function is `f(X) = V f(Λ) Vᵀ`. Eigenvalues can be clamped into a window
//! before `f` is applied, which keeps `log` and `sqrt` finite when rounding
//! pushes an eigenvalue to zero or below. Clamping is a silent correction,
//! never an error.
//!
//! Each matrix costs O(n³); a batch of B matrices is processed in parallel.

use crate::{
    error::Result,
    linalg::batch::{map_matrices, zip_matrices},
    types::{DMatrix, DVector, Scalar},
};
use ndarray::ArrayD;
use num_traits::Float;

/// Eigendecomposition of one symmetric matrix, eigenvalues ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFactorization<T: Scalar> {
    /// Eigenvalues in ascending order
    pub eigenvalues: DVector<T>,
    /// Orthonormal eigenvectors, one per column, matching `eigenvalues`
    pub eigenvectors: DMatrix<T>,
}

impl<T: Scalar> SpectralFactorization<T> {
    /// Decomposes a symmetric matrix.
    ///
    /// Only the lower triangle is trusted; callers symmetrize first when the
    /// input may be slightly asymmetric.
    pub fn of(m: &DMatrix<T>) -> Self {
        let eigen = m.clone().symmetric_eigen();
        let n = eigen.eigenvalues.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[a]
                .partial_cmp(&eigen.eigenvalues[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let eigenvalues = DVector::from_fn(n, |i, _| eigen.eigenvalues[order[i]]);
        let eigenvectors = DMatrix::from_fn(m.nrows(), n, |r, c| eigen.eigenvectors[(r, order[c])]);
        Self {
            eigenvalues,
            eigenvectors,
        }
    }

    /// Clamps the spectrum into `[min, max]`.
    pub fn clamp(mut self, min: T, max: T) -> Self {
        self.eigenvalues
            .apply(|w| *w = Float::min(Float::max(*w, min), max));
        self
    }

    /// Applies `f` to every eigenvalue.
    pub fn map<F: Fn(T) -> T>(mut self, f: F) -> Self {
        self.eigenvalues.apply(|w| *w = f(*w));
        self
    }

    /// Rebuilds `V diag(w) Vᵀ`.
    pub fn reconstruct(&self) -> DMatrix<T> {
        hgie(&self.eigenvalues, &self.eigenvectors)
    }
}

/// Inverse of the eigendecomposition: `V diag(w) Vᵀ`.
pub fn hgie<T: Scalar>(w: &DVector<T>, v: &DMatrix<T>) -> DMatrix<T> {
    let mut scaled = v.clone();
    for (j, &wj) in w.iter().enumerate() {
        scaled.column_mut(j).scale_mut(wj);
    }
    scaled * v.transpose()
}

/// Symmetric part `(X + Xᵀ) / 2` of one matrix.
#[inline]
pub fn sym<T: Scalar>(m: &DMatrix<T>) -> DMatrix<T> {
    (m + m.transpose()) * <T as Scalar>::from_f64(0.5)
}

/// Congruence `A X Aᵀ` of one matrix.
#[inline]
pub fn congruence<T: Scalar>(a: &DMatrix<T>, x: &DMatrix<T>) -> DMatrix<T> {
    a * x * a.transpose()
}

/// Applies `f` to the clamped spectrum of one symmetric matrix.
pub fn sym_funcm_single<T, F>(m: &DMatrix<T>, f: F, clamp: Option<(T, T)>) -> DMatrix<T>
where
    T: Scalar,
    F: Fn(T) -> T,
{
    let mut factorization = SpectralFactorization::of(m);
    if let Some((min, max)) = clamp {
        factorization = factorization.clamp(min, max);
    }
    factorization.map(f).reconstruct()
}

/// Applies `f` to the spectrum of every symmetric matrix of a batch.
///
/// With `clamp = Some((min, max))` the eigenvalues are clamped before `f`.
pub fn sym_funcm<T, F>(x: &ArrayD<T>, f: F, clamp: Option<(T, T)>) -> Result<ArrayD<T>>
where
    T: Scalar,
    F: Fn(T) -> T + Sync + Send,
{
    map_matrices(x, |m| Ok(sym_funcm_single(m, &f, clamp)))
}

/// Matrix exponential of a batch of symmetric matrices.
pub fn expm<T: Scalar>(x: &ArrayD<T>) -> Result<ArrayD<T>> {
    sym_funcm(x, <T as Float>::exp, None)
}

/// Matrix logarithm of a batch of SPD matrices, spectrum clamped to `[min, max]`.
pub fn logm<T: Scalar>(x: &ArrayD<T>, min: T, max: T) -> Result<ArrayD<T>> {
    sym_funcm(x, <T as Float>::ln, Some((positive_floor(min), max)))
}

/// Matrix square root of a batch of PSD matrices, spectrum clamped at zero.
pub fn sqrtm<T: Scalar>(x: &ArrayD<T>) -> Result<ArrayD<T>> {
    sym_funcm(x, <T as Float>::sqrt, Some((T::zero(), Float::infinity())))
}

/// Inverse square root of a batch of SPD matrices, spectrum clamped to `[min, max]`.
pub fn inv_sqrtm<T: Scalar>(x: &ArrayD<T>, min: T, max: T) -> Result<ArrayD<T>> {
    sym_funcm(x, |w| T::one() / Float::sqrt(w), Some((positive_floor(min), max)))
}

/// Projects onto the SPD cone: symmetrize, then clamp the spectrum.
pub fn spd_proj<T: Scalar>(x: &ArrayD<T>, min: T, max: T) -> Result<ArrayD<T>> {
    map_matrices(x, |m| Ok(sym_funcm_single(&sym(m), |w| w, Some((min, max)))))
}

/// Transposes every matrix of a batch.
pub fn multitrans<T: Scalar>(x: &ArrayD<T>) -> ArrayD<T> {
    let n = x.ndim();
    let mut axes: Vec<usize> = (0..n).collect();
    if n >= 2 {
        axes.swap(n - 1, n - 2);
    }
    x.view().permuted_axes(axes).to_owned()
}

/// Symmetric part of every matrix of a batch.
pub fn multisym<T: Scalar>(x: &ArrayD<T>) -> ArrayD<T> {
    (x + &multitrans(x)) * <T as Scalar>::from_f64(0.5)
}

/// Batched congruence `A X Aᵀ`, broadcasting over leading axes.
pub fn axat<T: Scalar>(a: &ArrayD<T>, x: &ArrayD<T>) -> Result<ArrayD<T>> {
    zip_matrices(a, x, |a, x| Ok(congruence(a, x)))
}

fn positive_floor<T: Scalar>(min: T) -> T {
    if min > T::zero() {
        min
    } else {
        Float::min_positive_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr2, Array3};

    fn diag(values: &[f64]) -> ArrayD<f64> {
        let n = values.len();
        let mut a = ndarray::Array2::zeros((n, n));
        for (i, &v) in values.iter().enumerate() {
            a[[i, i]] = v;
        }
        a.into_dyn()
    }

    #[test]
    fn test_factorization_is_ascending() {
        let m = DMatrix::from_row_slice(3, 3, &[3.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 2.0]);
        let f = SpectralFactorization::of(&m);
        assert_eq!(f.eigenvalues.as_slice(), &[-1.0, 2.0, 3.0]);
        assert_relative_eq!(f.reconstruct(), m, epsilon = 1e-12);
    }

    #[test]
    fn test_expm_logm_inverse() {
        let x = arr2(&[[2.0, 0.5], [0.5, 1.0]]).into_dyn();
        let back = expm(&logm(&x, 1e-12, 1e12).unwrap()).unwrap();
        for (a, b) in back.iter().zip(x.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_sqrtm_of_diagonal() {
        let s = sqrtm(&diag(&[4.0, 9.0])).unwrap();
        assert_relative_eq!(s[[0, 0]], 2.0, epsilon = 1e-12);
        assert_relative_eq!(s[[1, 1]], 3.0, epsilon = 1e-12);
        assert_relative_eq!(s[[0, 1]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inv_sqrtm_whitens() {
        let x = arr2(&[[4.0, 1.0], [1.0, 3.0]]).into_dyn();
        let w = inv_sqrtm(&x, 1e-12, 1e12).unwrap();
        // W X W = I
        let w = DMatrix::from_row_slice(2, 2, w.as_slice().unwrap());
        let x = DMatrix::from_row_slice(2, 2, x.as_slice().unwrap());
        assert_relative_eq!(&w * x * &w, DMatrix::identity(2, 2), epsilon = 1e-12);

        let d = inv_sqrtm(&diag(&[0.0, 4.0]), 1e-2, 1e2).unwrap();
        assert_relative_eq!(d[[0, 0]], 10.0, epsilon = 1e-10);
        assert_relative_eq!(d[[1, 1]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_logm_clamps_nonpositive_eigenvalues() {
        let x = diag(&[0.0, -1.0, 1.0]);
        let l = logm(&x, 1e-8, 1e8).unwrap();
        assert!(l.iter().all(|v| v.is_finite()));
        assert_relative_eq!(l[[0, 0]], (1e-8_f64).ln(), epsilon = 1e-9);
    }

    #[test]
    fn test_clamped_application_is_idempotent() {
        let x = arr2(&[[3.0, 1.0], [1.0, 2.0]]).into_dyn();
        let once = spd_proj(&x, 0.5, 10.0).unwrap();
        let twice = spd_proj(&once, 0.5, 10.0).unwrap();
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
        for (a, b) in once.iter().zip(x.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spd_proj_clamps_out_of_window() {
        let p = spd_proj(&diag(&[1e-3, 5.0, 50.0]), 0.1, 10.0).unwrap();
        assert_relative_eq!(p[[0, 0]], 0.1, epsilon = 1e-12);
        assert_relative_eq!(p[[1, 1]], 5.0, epsilon = 1e-12);
        assert_relative_eq!(p[[2, 2]], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_batched_axat_and_multitrans() {
        let a = arr2(&[[1.0, 2.0], [0.0, 1.0]]).into_dyn();
        let x = Array3::from_shape_fn((2, 2, 2), |(b, i, j)| if i == j { (b + 1) as f64 } else { 0.0 })
            .into_dyn();
        let y = axat(&a, &x).unwrap();
        assert_eq!(y.shape(), &[2, 2, 2]);
        // A diag(2, 2) Aᵀ = 2 A Aᵀ
        assert_relative_eq!(y[[1, 0, 0]], 10.0, epsilon = 1e-12);
        assert_relative_eq!(y[[1, 0, 1]], 4.0, epsilon = 1e-12);

        let t = multitrans(&a);
        assert_eq!(t[[1, 0]], 2.0);
        let s = multisym(&a);
        assert_eq!(s[[0, 1]], 1.0);
        assert_eq!(s[[1, 0]], 1.0);
    }
}
