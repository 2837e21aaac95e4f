//! Orthonormal bases and ranks of single matrices.

use crate::{
    error::{ManifoldError, Result},
    types::{DMatrix, DVector, Scalar},
};
use num_traits::Float;

/// Orthonormal basis of the column span of `span`.
///
/// Keeps the left singular vectors whose singular values exceed the rank
/// threshold of [`numerical_rank`], so a rank-deficient `n x k` input yields
/// an `n x rank` factor `Q` and never gains directions outside its span.
pub fn orthonormal_basis<T: Scalar>(span: &DMatrix<T>) -> Result<DMatrix<T>> {
    if span.nrows() == 0 || span.ncols() == 0 {
        return Err(ManifoldError::numerical(format!(
            "cannot orthonormalize an empty {}x{} basis",
            span.nrows(),
            span.ncols()
        )));
    }
    if span.iter().any(|v| !Float::is_finite(*v)) {
        return Err(ManifoldError::numerical("basis contains non-finite values"));
    }
    let svd = span.clone().svd(true, false);
    let threshold = rank_threshold(span, &svd.singular_values);
    let kept: Vec<usize> = svd
        .singular_values
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s > threshold)
        .map(|(i, _)| i)
        .collect();
    let u = svd
        .u
        .ok_or_else(|| ManifoldError::numerical("SVD did not produce left singular vectors"))?;
    let q = u.select_columns(kept.iter());
    if q.iter().any(|v| !Float::is_finite(*v)) {
        return Err(ManifoldError::numerical("SVD produced non-finite values"));
    }
    Ok(q)
}

fn rank_threshold<T: Scalar>(m: &DMatrix<T>, singular: &DVector<T>) -> T {
    let sigma_max = singular.iter().fold(T::zero(), |acc, &s| Float::max(acc, s));
    <T as Scalar>::from_usize(m.nrows().max(m.ncols())) * T::EPSILON * sigma_max
}

/// Orthogonal projector `Q Qᵀ` onto the column span of `span`.
pub fn span_projector<T: Scalar>(span: &DMatrix<T>) -> Result<DMatrix<T>> {
    let q = orthonormal_basis(span)?;
    Ok(&q * q.transpose())
}

/// Numerical rank from the singular values.
///
/// Singular values below `max(r, c) * eps * sigma_max` count as zero.
pub fn numerical_rank<T: Scalar>(m: &DMatrix<T>) -> usize {
    if m.is_empty() {
        return 0;
    }
    let singular = m.clone().singular_values();
    let threshold = rank_threshold(m, &singular);
    singular.iter().filter(|&&s| s > threshold).count()
}
