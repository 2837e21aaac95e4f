//! Tracked parameters for samplers and optimizers.
//!
//! A [`ManifoldParameter`] owns its current value, an optional gradient
//! buffer filled by the caller's closure, and the manifold that constrains it.
//! Untagged parameters live on the coordinatewise real line.

use geoflow_core::{
    error::Result,
    manifold::Manifold,
    tolerance::Tolerance,
    types::{Point, Scalar, TangentVector},
};
use geoflow_manifolds::Euclidean;
use std::fmt;
use std::sync::Arc;

/// A tensor tracked by a sampler or an optimizer.
#[derive(Clone)]
pub struct ManifoldParameter<T: Scalar> {
    data: Point<T>,
    grad: Option<TangentVector<T>>,
    manifold: Arc<dyn Manifold<T>>,
    tagged: bool,
}

impl<T: Scalar> ManifoldParameter<T> {
    /// Creates an unconstrained parameter.
    pub fn new(data: Point<T>) -> Self {
        Self {
            data,
            grad: None,
            manifold: Arc::new(Euclidean::real()),
            tagged: false,
        }
    }

    /// Creates a parameter constrained to `manifold`.
    ///
    /// Only the shape of `data` is validated; call [`Self::check`] or
    /// [`Self::project`] to enforce membership.
    pub fn on_manifold(data: Point<T>, manifold: Arc<dyn Manifold<T>>) -> Result<Self> {
        manifold.assert_check_point(&data)?;
        Ok(Self {
            data,
            grad: None,
            manifold,
            tagged: true,
        })
    }

    /// Current value.
    pub fn data(&self) -> &Point<T> {
        &self.data
    }

    /// Replaces the current value.
    pub fn set_data(&mut self, data: Point<T>) {
        self.data = data;
    }

    /// Consumes the parameter and returns its value.
    pub fn into_data(self) -> Point<T> {
        self.data
    }

    /// Gradient buffer, if the closure filled one.
    pub fn grad(&self) -> Option<&TangentVector<T>> {
        self.grad.as_ref()
    }

    /// Stores the Euclidean gradient of the objective at the current value.
    pub fn set_grad(&mut self, grad: TangentVector<T>) {
        self.grad = Some(grad);
    }

    /// Adds `grad` to the gradient buffer, creating it when empty.
    pub fn accumulate_grad(&mut self, grad: &TangentVector<T>) {
        match &mut self.grad {
            Some(g) => *g += grad,
            None => self.grad = Some(grad.clone()),
        }
    }

    /// Removes and returns the gradient buffer.
    pub fn take_grad(&mut self) -> Option<TangentVector<T>> {
        self.grad.take()
    }

    /// Zeros the gradient buffer, keeping its allocation.
    pub fn zero_grad(&mut self) {
        if let Some(g) = &mut self.grad {
            g.fill(T::zero());
        }
    }

    /// Manifold the parameter lives on.
    pub fn manifold(&self) -> &dyn Manifold<T> {
        self.manifold.as_ref()
    }

    /// Whether the parameter was created with an explicit manifold.
    pub fn is_tagged(&self) -> bool {
        self.tagged
    }

    /// Checks that the current value lies on the manifold.
    pub fn check(&self, tol: &Tolerance<T>) -> Result<()> {
        self.manifold.assert_check_point_on_manifold(&self.data, tol)
    }

    /// Re-projects the current value onto the manifold.
    pub fn project(&mut self) -> Result<()> {
        self.data = self.manifold.projx(&self.data)?;
        Ok(())
    }
}

impl<T: Scalar> fmt::Debug for ManifoldParameter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifoldParameter")
            .field("manifold", &self.manifold.name())
            .field("shape", &self.data.shape())
            .field("has_grad", &self.grad.is_some())
            .finish()
    }
}
