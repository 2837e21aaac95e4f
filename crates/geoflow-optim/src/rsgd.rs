//! Riemannian Stochastic Gradient Descent (RSGD).
//!
//! The update mirrors Euclidean SGD with momentum, with the geometry entering
//! in three places:
//!
//! 1. The Euclidean gradient (plus weight decay) is converted to a
//!    Riemannian gradient with `egrad2rgrad`
//! 2. The step is taken with a retraction instead of an addition
//! 3. The momentum buffer is carried to the new tangent space with the
//!    fused `retr_transp`
//!
//! Repeated retractions accumulate numerical drift; `stabilize` periodically
//! re-projects points and momentum buffers.

use crate::parameter::ManifoldParameter;
use geoflow_core::{
    error::{OptimizerError, OptimizerResult},
    types::{Scalar, TangentVector},
};
use tracing::{debug, trace};

/// Configuration for the Riemannian SGD optimizer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RsgdConfig<T> {
    /// Learning rate
    pub lr: T,
    /// Momentum factor (0 disables momentum)
    pub momentum: T,
    /// Dampening applied to the gradient entering the momentum buffer
    pub dampening: T,
    /// L2 penalty added to the Euclidean gradient
    pub weight_decay: T,
    /// Whether to use Nesterov momentum
    pub nesterov: bool,
    /// Stabilize every `stabilize` steps (`None` = never)
    pub stabilize: Option<usize>,
}

impl<T: Scalar> Default for RsgdConfig<T> {
    fn default() -> Self {
        Self {
            lr: <T as Scalar>::from_f64(1e-3),
            momentum: T::zero(),
            dampening: T::zero(),
            weight_decay: T::zero(),
            nesterov: false,
            stabilize: None,
        }
    }
}

impl<T: Scalar> RsgdConfig<T> {
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the learning rate.
    pub fn with_lr(mut self, lr: T) -> Self {
        self.lr = lr;
        self
    }

    /// Sets classical momentum.
    pub fn with_momentum(mut self, momentum: T) -> Self {
        self.momentum = momentum;
        self
    }

    /// Sets the dampening of the momentum buffer.
    pub fn with_dampening(mut self, dampening: T) -> Self {
        self.dampening = dampening;
        self
    }

    /// Sets the weight decay.
    pub fn with_weight_decay(mut self, weight_decay: T) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Sets Nesterov momentum with the given factor.
    pub fn with_nesterov_momentum(mut self, momentum: T) -> Self {
        self.momentum = momentum;
        self.nesterov = true;
        self
    }

    /// Stabilizes parameters every `period` steps.
    pub fn with_stabilize(mut self, period: usize) -> Self {
        self.stabilize = Some(period);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OptimizerResult<()> {
        let checks = [
            (self.lr, "lr", "learning rate must be non-negative"),
            (self.momentum, "momentum", "momentum must be non-negative"),
            (self.weight_decay, "weight_decay", "weight decay must be non-negative"),
        ];
        for (value, parameter, reason) in checks {
            if value < T::zero() {
                return Err(OptimizerError::invalid_configuration(reason, parameter, value.to_string()));
            }
        }
        if self.nesterov && (self.momentum <= T::zero() || self.dampening != T::zero()) {
            return Err(OptimizerError::invalid_configuration(
                "Nesterov momentum requires a momentum and zero dampening",
                "nesterov",
                format!("momentum={}, dampening={}", self.momentum, self.dampening),
            ));
        }
        if self.stabilize == Some(0) {
            return Err(OptimizerError::invalid_configuration(
                "stabilization period must be positive",
                "stabilize",
                "0",
            ));
        }
        Ok(())
    }
}

/// Riemannian Stochastic Gradient Descent optimizer.
///
/// # Examples
///
/// ```rust
/// use geoflow_manifolds::Sphere;
/// use geoflow_optim::{ManifoldParameter, Rsgd, RsgdConfig};
/// use ndarray::arr1;
/// use std::sync::Arc;
///
/// let sphere = Arc::new(Sphere::<f64>::new());
/// let x = ManifoldParameter::on_manifold(arr1(&[0.6, 0.8]).into_dyn(), sphere).unwrap();
/// let mut rsgd = Rsgd::new(vec![x], RsgdConfig::new().with_lr(0.1).with_momentum(0.9)).unwrap();
///
/// // Minimize -x₀ on the unit circle
/// for _ in 0..200 {
///     rsgd.step(|params| {
///         params[0].set_grad(arr1(&[-1.0, 0.0]).into_dyn());
///         -params[0].data()[[0]]
///     })
///     .unwrap();
/// }
/// assert!((rsgd.params()[0].data()[[0]] - 1.0).abs() < 1e-3);
/// ```
#[derive(Debug)]
pub struct Rsgd<T: Scalar> {
    config: RsgdConfig<T>,
    params: Vec<ManifoldParameter<T>>,
    buffers: Vec<Option<TangentVector<T>>>,
    steps: usize,
}

impl<T: Scalar> Rsgd<T> {
    /// Creates an optimizer over `params`.
    pub fn new(params: Vec<ManifoldParameter<T>>, config: RsgdConfig<T>) -> OptimizerResult<Self> {
        config.validate()?;
        debug!(
            lr = <T as Scalar>::to_f64(config.lr),
            momentum = <T as Scalar>::to_f64(config.momentum),
            nesterov = config.nesterov,
            stabilize = ?config.stabilize,
            num_params = params.len(),
            "Created Riemannian SGD optimizer"
        );
        let buffers = vec![None; params.len()];
        Ok(Self {
            config,
            params,
            buffers,
            steps: 0,
        })
    }

    /// Optimizer configuration.
    pub fn config(&self) -> &RsgdConfig<T> {
        &self.config
    }

    /// Tracked parameters.
    pub fn params(&self) -> &[ManifoldParameter<T>] {
        &self.params
    }

    /// Mutable access to the tracked parameters.
    pub fn params_mut(&mut self) -> &mut [ManifoldParameter<T>] {
        &mut self.params
    }

    /// Consumes the optimizer and returns its parameters.
    pub fn into_params(self) -> Vec<ManifoldParameter<T>> {
        self.params
    }

    /// Momentum buffer of parameter `index`, once it has been created.
    pub fn momentum_buffer(&self, index: usize) -> Option<&TangentVector<T>> {
        self.buffers.get(index).and_then(Option::as_ref)
    }

    /// Number of completed steps.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Evaluates the closure, then applies one update.
    ///
    /// The closure returns the loss and fills the gradient buffers.
    pub fn step<F>(&mut self, mut closure: F) -> OptimizerResult<T>
    where
        F: FnMut(&mut [ManifoldParameter<T>]) -> T,
    {
        let loss = closure(&mut self.params);
        self.apply()?;
        Ok(loss)
    }

    /// Applies one update from the current gradient buffers.
    ///
    /// Parameters without a gradient are left untouched. Consumed gradient
    /// buffers are cleared. When a manifold operation fails, no parameter,
    /// gradient or momentum buffer is modified.
    pub fn apply(&mut self) -> OptimizerResult<()> {
        let RsgdConfig {
            lr,
            momentum,
            dampening,
            weight_decay,
            nesterov,
            ..
        } = self.config;
        let use_momentum = momentum > T::zero();

        // every update is computed before any parameter or buffer changes
        let mut updates = Vec::with_capacity(self.params.len());
        for (point, buffer) in self.params.iter().zip(self.buffers.iter()) {
            let Some(egrad) = point.grad() else {
                updates.push(None);
                continue;
            };
            let mut grad = egrad.clone();
            grad.scaled_add(weight_decay, point.data());

            let manifold = point.manifold();
            let grad = manifold.egrad2rgrad(point.data(), &grad)?;
            let update = if use_momentum {
                let previous = buffer.as_ref().unwrap_or(egrad);
                let buf = previous * momentum + &grad * (T::one() - dampening);
                let direction = if nesterov { grad + &buf * momentum } else { buf.clone() };
                let (next, transported) = manifold.retr_transp(point.data(), &(direction * -lr), &buf)?;
                (next, Some(transported))
            } else {
                (manifold.retr(point.data(), &(grad * -lr))?, None)
            };
            updates.push(Some(update));
        }

        for ((point, buffer), update) in self.params.iter_mut().zip(self.buffers.iter_mut()).zip(updates) {
            let Some((next, transported)) = update else {
                continue;
            };
            point.take_grad();
            point.set_data(next);
            if transported.is_some() {
                *buffer = transported;
            }
        }

        self.steps += 1;
        trace!(steps = self.steps, "Riemannian SGD step");
        if let Some(period) = self.config.stabilize {
            if self.steps % period == 0 {
                self.stabilize()?;
            }
        }
        Ok(())
    }

    /// Re-projects manifold-tagged parameters and their momentum buffers.
    pub fn stabilize(&mut self) -> OptimizerResult<()> {
        for (point, buffer) in self.params.iter_mut().zip(self.buffers.iter_mut()) {
            if !point.is_tagged() {
                continue;
            }
            point.project()?;
            if let Some(buf) = buffer {
                *buf = point.manifold().proju(point.data(), buf)?;
            }
        }
        debug!(steps = self.steps, "Stabilized Riemannian SGD parameters");
        Ok(())
    }
}
