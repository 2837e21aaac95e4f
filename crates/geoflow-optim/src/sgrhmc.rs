//! Stochastic Gradient Riemannian Hamiltonian Monte Carlo (SGRHMC).
//!
//! Every step resamples the momentum `v ~ N(0, ε²)` and runs `n_steps + 1`
//! leapfrog updates. Each update moves the point along the momentum with a
//! fused retraction and transport, then applies friction `α`, the gradient
//! force and tangent noise of variance `2αε`.

use crate::{
    parameter::ManifoldParameter,
    sampler::{chain_rng, gaussian, positive, take_grads, Sampler, SamplerState},
};
use geoflow_core::{
    error::{OptimizerError, OptimizerResult},
    types::{Scalar, TangentVector},
};
use num_traits::Float;
use rand::rngs::StdRng;
use tracing::{debug, trace};

/// Configuration for [`Sgrhmc`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SgrhmcConfig<T> {
    /// Step size ε
    pub epsilon: T,
    /// Number of leapfrog updates beyond the first
    pub n_steps: usize,
    /// Friction; the momentum keeps a `1 - alpha` share each update
    pub alpha: T,
    /// Seed of the chain's noise; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl<T: Scalar> Default for SgrhmcConfig<T> {
    fn default() -> Self {
        Self {
            epsilon: <T as Scalar>::from_f64(1e-3),
            n_steps: 1,
            alpha: <T as Scalar>::from_f64(0.1),
            seed: None,
        }
    }
}

impl<T: Scalar> SgrhmcConfig<T> {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the step size.
    pub fn with_epsilon(mut self, epsilon: T) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the number of extra leapfrog updates.
    pub fn with_n_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = n_steps;
        self
    }

    /// Sets the friction.
    pub fn with_alpha(mut self, alpha: T) -> Self {
        self.alpha = alpha;
        self
    }

    /// Seeds the chain's noise.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects a non-positive step size and a friction outside `[0, 1]`.
    pub fn validate(&self) -> OptimizerResult<()> {
        positive(self.epsilon, "epsilon")?;
        if !(self.alpha >= T::zero() && self.alpha <= T::one()) {
            return Err(OptimizerError::invalid_configuration(
                "friction must lie in [0, 1]",
                "alpha",
                self.alpha.to_string(),
            ));
        }
        Ok(())
    }
}

/// Stochastic Gradient Riemannian Hamiltonian Monte Carlo sampler.
#[derive(Debug)]
pub struct Sgrhmc<T: Scalar> {
    config: SgrhmcConfig<T>,
    params: Vec<ManifoldParameter<T>>,
    momenta: Vec<TangentVector<T>>,
    state: SamplerState<T>,
    rng: StdRng,
}

impl<T: Scalar> Sgrhmc<T> {
    /// Creates a sampler over `params` with zero momenta.
    pub fn new(params: Vec<ManifoldParameter<T>>, config: SgrhmcConfig<T>) -> OptimizerResult<Self> {
        config.validate()?;
        debug!(
            epsilon = <T as Scalar>::to_f64(config.epsilon),
            alpha = <T as Scalar>::to_f64(config.alpha),
            n_steps = config.n_steps,
            num_params = params.len(),
            "Created SGRHMC sampler"
        );
        let momenta = params.iter().map(|p| TangentVector::zeros(p.data().raw_dim())).collect();
        Ok(Self {
            rng: chain_rng(config.seed),
            config,
            params,
            momenta,
            state: SamplerState::default(),
        })
    }

    /// Sampler configuration.
    pub fn config(&self) -> &SgrhmcConfig<T> {
        &self.config
    }

    /// Current momentum of every parameter.
    pub fn momenta(&self) -> &[TangentVector<T>] {
        &self.momenta
    }

    /// Mutable access to the tracked parameters.
    pub fn params_mut(&mut self) -> &mut [ManifoldParameter<T>] {
        &mut self.params
    }

    /// Consumes the sampler and returns its parameters.
    pub fn into_params(self) -> Vec<ManifoldParameter<T>> {
        self.params
    }
}

impl<T: Scalar> Sampler<T> for Sgrhmc<T> {
    fn name(&self) -> &str {
        "SGRHMC"
    }

    fn params(&self) -> &[ManifoldParameter<T>] {
        &self.params
    }

    fn state(&self) -> &SamplerState<T> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SamplerState<T> {
        &mut self.state
    }

    fn step<F>(&mut self, mut closure: F) -> OptimizerResult<T>
    where
        F: FnMut(&mut [ManifoldParameter<T>]) -> T,
    {
        let SgrhmcConfig { epsilon, n_steps, alpha, .. } = self.config;
        let friction = T::one() - alpha;
        let diffusion = Float::sqrt(<T as Scalar>::from_f64(2.0) * alpha * epsilon);

        for (v, param) in self.momenta.iter_mut().zip(&self.params) {
            *v = gaussian(param.data().shape(), epsilon, &mut self.rng);
        }

        let mut log_prob: T = Float::nan();
        for _ in 0..=n_steps {
            log_prob = closure(&mut self.params);
            let grads = take_grads(&mut self.params)?;
            let mut updates = Vec::with_capacity(grads.len());
            for ((param, v), grad) in self.params.iter().zip(&self.momenta).zip(grads) {
                let manifold = param.manifold();
                let (next, moved) = manifold.retr_transp(param.data(), v, v)?;
                let ambient = gaussian(next.shape(), T::one(), &mut self.rng);
                let n = manifold.egrad2rgrad(&next, &ambient)?;
                updates.push((next, moved * friction + grad * epsilon + n * diffusion));
            }
            for ((param, v), (next, momentum)) in self.params.iter_mut().zip(self.momenta.iter_mut()).zip(updates) {
                param.set_data(next);
                *v = momentum;
            }
        }

        trace!(
            log_prob = <T as Scalar>::to_f64(log_prob),
            steps = self.state.steps,
            burnin = self.state.burnin,
            "SGRHMC step"
        );
        self.state.record(log_prob);
        Ok(log_prob)
    }

    fn stabilize(&mut self) -> OptimizerResult<()> {
        let mut projected = 0;
        for (param, v) in self.params.iter_mut().zip(self.momenta.iter_mut()) {
            if !param.is_tagged() {
                continue;
            }
            param.project()?;
            *v = param.manifold().proju(param.data(), v)?;
            projected += 1;
        }
        debug!(projected, steps = self.state.steps, "Stabilized SGRHMC parameters");
        Ok(())
    }
}
