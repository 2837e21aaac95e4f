//! Batched views between ndarray tensors and nalgebra matrices.
//!
//! Points are `ArrayD` tensors whose leading axes are batch axes. Matrix
//! manifolds need per-entry linear algebra, so the trailing two axes are
//! split off into owned `DMatrix` values, processed in parallel with rayon,
//! and reassembled in the original batch order.

use crate::{
    error::{ManifoldError, Result},
    types::{DMatrix, Scalar},
};
use ndarray::{ArrayD, Axis, IxDyn, Zip};
use rayon::prelude::*;

/// Computes the broadcast shape of two shapes, numpy style.
///
/// Returns `None` if the shapes are not broadcast-compatible.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let len = a.len().max(b.len());
    let mut shape = vec![0; len];
    for i in 0..len {
        let da = if i < len - a.len() { 1 } else { a[i - (len - a.len())] };
        let db = if i < len - b.len() { 1 } else { b[i - (len - b.len())] };
        shape[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => return None,
        };
    }
    Some(shape)
}

/// Broadcasts two tensors to their common shape and returns owned copies.
pub fn broadcast_pair<T: Scalar>(a: &ArrayD<T>, b: &ArrayD<T>) -> Result<(ArrayD<T>, ArrayD<T>)> {
    if a.shape() == b.shape() {
        return Ok((a.clone(), b.clone()));
    }
    let shape = broadcast_shape(a.shape(), b.shape()).ok_or_else(|| not_broadcastable(a.shape(), b.shape()))?;
    let dim = IxDyn(&shape);
    match (a.broadcast(dim.clone()), b.broadcast(dim)) {
        (Some(a), Some(b)) => Ok((a.to_owned(), b.to_owned())),
        _ => Err(not_broadcastable(a.shape(), b.shape())),
    }
}

fn not_broadcastable(a: &[usize], b: &[usize]) -> ManifoldError {
    ManifoldError::shape(
        "batch",
        "operands",
        format!("shapes {:?} and {:?} cannot be broadcast together", a, b),
    )
}

/// A batch of matrices taken from the trailing two axes of a tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixBatch<T: Scalar> {
    batch_shape: Vec<usize>,
    nrows: usize,
    ncols: usize,
    matrices: Vec<DMatrix<T>>,
}

impl<T: Scalar> MatrixBatch<T> {
    /// Splits a tensor of shape `(..., r, c)` into its matrices.
    pub fn from_array(a: &ArrayD<T>) -> Result<Self> {
        let shape = a.shape();
        if shape.len() < 2 {
            return Err(ManifoldError::shape(
                "batch",
                "matrix",
                format!("expected a tensor with at least 2 dims, got shape {:?}", shape),
            ));
        }
        let nrows = shape[shape.len() - 2];
        let ncols = shape[shape.len() - 1];
        let batch_shape = shape[..shape.len() - 2].to_vec();
        let standard = a.as_standard_layout();
        let matrices = match standard.as_slice() {
            Some(data) if nrows * ncols > 0 => data
                .chunks_exact(nrows * ncols)
                .map(|chunk| DMatrix::from_row_slice(nrows, ncols, chunk))
                .collect(),
            _ => {
                let count = batch_shape.iter().product();
                vec![DMatrix::zeros(nrows, ncols); count]
            }
        };
        Ok(Self {
            batch_shape,
            nrows,
            ncols,
            matrices,
        })
    }

    /// Wraps a single matrix as a batch with no batch axes.
    pub fn single(m: DMatrix<T>) -> Self {
        Self {
            batch_shape: Vec::new(),
            nrows: m.nrows(),
            ncols: m.ncols(),
            matrices: vec![m],
        }
    }

    /// Reassembles the tensor of shape `(..., r, c)`.
    pub fn into_array(self) -> Result<ArrayD<T>> {
        let (nrows, ncols) = self
            .matrices
            .first()
            .map(|m| (m.nrows(), m.ncols()))
            .unwrap_or((self.nrows, self.ncols));
        let mut shape = self.batch_shape;
        shape.push(nrows);
        shape.push(ncols);
        let mut data = Vec::with_capacity(self.matrices.len() * nrows * ncols);
        for m in &self.matrices {
            for i in 0..nrows {
                for j in 0..ncols {
                    data.push(m[(i, j)]);
                }
            }
        }
        ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| ManifoldError::numerical(format!("cannot rebuild batch: {}", e)))
    }

    /// Leading batch axes.
    pub fn batch_shape(&self) -> &[usize] {
        &self.batch_shape
    }

    /// Number of matrices in the batch.
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Whether the batch holds no matrix.
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// The matrices in batch order.
    pub fn matrices(&self) -> &[DMatrix<T>] {
        &self.matrices
    }

    /// Applies a fallible `f` to every matrix, in parallel.
    pub fn try_map<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&DMatrix<T>) -> Result<DMatrix<T>> + Sync + Send,
    {
        let matrices = self.matrices.par_iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(self.with_matrices(matrices))
    }

    /// Applies a fallible `f` to every matrix and collects one value per entry.
    pub fn try_reduce<R, F>(&self, f: F) -> Result<ArrayD<R>>
    where
        R: Send + Clone,
        F: Fn(&DMatrix<T>) -> Result<R> + Sync + Send,
    {
        let values = self.matrices.par_iter().map(f).collect::<Result<Vec<_>>>()?;
        ArrayD::from_shape_vec(IxDyn(&self.batch_shape), values)
            .map_err(|e| ManifoldError::numerical(format!("cannot rebuild batch: {}", e)))
    }

    /// Pairs matrices of two batches with the same batch shape.
    pub fn try_zip_map<F>(&self, other: &Self, f: F) -> Result<Self>
    where
        F: Fn(&DMatrix<T>, &DMatrix<T>) -> Result<DMatrix<T>> + Sync + Send,
    {
        self.ensure_same_batch(other)?;
        let matrices = self
            .matrices
            .par_iter()
            .zip(other.matrices.par_iter())
            .map(|(a, b)| f(a, b))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_matrices(matrices))
    }

    /// Pairs matrices of two batches and collects one value per entry.
    pub fn try_zip_reduce<R, F>(&self, other: &Self, f: F) -> Result<ArrayD<R>>
    where
        R: Send + Clone,
        F: Fn(&DMatrix<T>, &DMatrix<T>) -> Result<R> + Sync + Send,
    {
        self.ensure_same_batch(other)?;
        let values = self
            .matrices
            .par_iter()
            .zip(other.matrices.par_iter())
            .map(|(a, b)| f(a, b))
            .collect::<Result<Vec<_>>>()?;
        ArrayD::from_shape_vec(IxDyn(&self.batch_shape), values)
            .map_err(|e| ManifoldError::numerical(format!("cannot rebuild batch: {}", e)))
    }

    fn ensure_same_batch(&self, other: &Self) -> Result<()> {
        if self.batch_shape != other.batch_shape {
            return Err(ManifoldError::shape(
                "batch",
                "operands",
                format!("batch shapes {:?} and {:?} differ", self.batch_shape, other.batch_shape),
            ));
        }
        Ok(())
    }

    fn with_matrices(&self, matrices: Vec<DMatrix<T>>) -> Self {
        let (nrows, ncols) = matrices
            .first()
            .map(|m| (m.nrows(), m.ncols()))
            .unwrap_or((self.nrows, self.ncols));
        Self {
            batch_shape: self.batch_shape.clone(),
            nrows,
            ncols,
            matrices,
        }
    }
}

/// Applies `f` to every matrix of the trailing two axes of `a`.
pub fn map_matrices<T, F>(a: &ArrayD<T>, f: F) -> Result<ArrayD<T>>
where
    T: Scalar,
    F: Fn(&DMatrix<T>) -> Result<DMatrix<T>> + Sync + Send,
{
    MatrixBatch::from_array(a)?.try_map(f)?.into_array()
}

/// Applies `f` to matching matrices of `a` and `b` after broadcasting.
pub fn zip_matrices<T, F>(a: &ArrayD<T>, b: &ArrayD<T>, f: F) -> Result<ArrayD<T>>
where
    T: Scalar,
    F: Fn(&DMatrix<T>, &DMatrix<T>) -> Result<DMatrix<T>> + Sync + Send,
{
    let (a, b) = broadcast_pair(a, b)?;
    let a = MatrixBatch::from_array(&a)?;
    let b = MatrixBatch::from_array(&b)?;
    a.try_zip_map(&b, f)?.into_array()
}

/// Reduces every matrix of `a` to one value, keeping the batch shape.
pub fn reduce_matrices<T, R, F>(a: &ArrayD<T>, f: F) -> Result<ArrayD<R>>
where
    T: Scalar,
    R: Send + Clone,
    F: Fn(&DMatrix<T>) -> Result<R> + Sync + Send,
{
    MatrixBatch::from_array(a)?.try_reduce(f)
}

/// Reduces matching matrices of `a` and `b` to one value after broadcasting.
pub fn zip_reduce_matrices<T, R, F>(a: &ArrayD<T>, b: &ArrayD<T>, f: F) -> Result<ArrayD<R>>
where
    T: Scalar,
    R: Send + Clone,
    F: Fn(&DMatrix<T>, &DMatrix<T>) -> Result<R> + Sync + Send,
{
    let (a, b) = broadcast_pair(a, b)?;
    let a = MatrixBatch::from_array(&a)?;
    let b = MatrixBatch::from_array(&b)?;
    a.try_zip_reduce(&b, f)
}

/// Computes `y[..., i] = sum_j m[i, j] * a[..., j]` along the last axis.
pub fn apply_to_last_axis<T: Scalar>(a: &ArrayD<T>, m: &DMatrix<T>) -> ArrayD<T> {
    let axis = Axis(a.ndim() - 1);
    let mut out = ArrayD::zeros(a.raw_dim());
    Zip::from(out.lanes_mut(axis))
        .and(a.lanes(axis))
        .for_each(|mut o, lane| {
            for r in 0..m.nrows() {
                let mut acc = T::zero();
                for (c, &v) in lane.iter().enumerate() {
                    acc += m[(r, c)] * v;
                }
                o[r] = acc;
            }
        });
    out
}

/// Picks `a` where `cond` holds and `b` elsewhere.
///
/// `cond` broadcasts against `b`, so a mask with a trailing axis of size 1
/// selects whole rows. This keeps per-entry formula choices inside one
/// batched call.
pub fn select_where<T: Scalar>(cond: &ArrayD<bool>, a: &ArrayD<T>, b: &ArrayD<T>) -> Result<ArrayD<T>> {
    let (a, mut out) = broadcast_pair(a, b)?;
    let mask = cond.broadcast(out.raw_dim()).ok_or_else(|| {
        ManifoldError::shape(
            "batch",
            "mask",
            format!("mask of shape {:?} does not broadcast to {:?}", cond.shape(), out.shape()),
        )
    })?;
    Zip::from(&mut out)
        .and(&a)
        .and(&mask)
        .for_each(|o, &a, &c| {
            if c {
                *o = a;
            }
        });
    Ok(out)
}

/// Sums over the last `k` axes, keeping them with size 1 when `keepdim` is set.
pub fn sum_last_axes<T: Scalar>(a: &ArrayD<T>, k: usize, keepdim: bool) -> ArrayD<T> {
    let k = k.min(a.ndim());
    let mut out = a.to_owned();
    for _ in 0..k {
        let axis = Axis(out.ndim() - 1);
        out = out.sum_axis(axis);
    }
    if keepdim {
        for _ in 0..k {
            let end = out.ndim();
            out.insert_axis_inplace(Axis(end));
        }
    }
    out
}
