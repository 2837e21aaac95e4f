//! Shared sampler machinery.
//!
//! Samplers own their tracked parameters and advance a Markov chain one step
//! at a time. The caller drives each step through a closure that evaluates
//! the unnormalized log-density at the current parameters and fills every
//! parameter's gradient buffer.

use crate::parameter::ManifoldParameter;
use geoflow_core::{
    error::{OptimizerError, OptimizerResult},
    types::{Point, Scalar},
};
use ndarray::{ArrayD, IxDyn};
use num_traits::Float;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::{debug, warn};

/// Chain bookkeeping shared by every sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerState<T> {
    /// Number of recorded steps (burn-in steps are not counted)
    pub steps: usize,
    /// Whether the chain is still burning in
    pub burnin: bool,
    /// Log-density at every recorded step
    pub log_probs: Vec<T>,
}

impl<T> Default for SamplerState<T> {
    fn default() -> Self {
        Self {
            steps: 0,
            burnin: true,
            log_probs: Vec::new(),
        }
    }
}

impl<T: Scalar> SamplerState<T> {
    /// Records the log-density of a finished step unless burning in.
    pub fn record(&mut self, log_prob: T) {
        if !Float::is_finite(log_prob) {
            warn!(log_prob = <T as Scalar>::to_f64(log_prob), steps = self.steps, "Non-finite log-density");
        }
        if !self.burnin {
            self.steps += 1;
            self.log_probs.push(log_prob);
        }
    }

    /// Switches the burn-in phase on or off.
    pub fn set_burnin(&mut self, burnin: bool) {
        if self.burnin != burnin {
            debug!(burnin, steps = self.steps, "Burn-in phase changed");
        }
        self.burnin = burnin;
    }
}

/// A Markov chain over manifold-constrained parameters.
pub trait Sampler<T: Scalar> {
    /// Sampler name, used in logs.
    fn name(&self) -> &str;

    /// Tracked parameters, in insertion order.
    fn params(&self) -> &[ManifoldParameter<T>];

    /// Chain bookkeeping.
    fn state(&self) -> &SamplerState<T>;

    /// Mutable chain bookkeeping.
    fn state_mut(&mut self) -> &mut SamplerState<T>;

    /// Advances the chain by one step and returns the log-density evaluated
    /// by the closure.
    ///
    /// Every update moves all parameters together: if a manifold operation
    /// fails, the parameters keep the values of the last completed update.
    fn step<F>(&mut self, closure: F) -> OptimizerResult<T>
    where
        F: FnMut(&mut [ManifoldParameter<T>]) -> T;

    /// Re-projects manifold-tagged parameters onto their manifolds.
    ///
    /// Repeated first-order retractions drift off the manifold; callers
    /// invoke this periodically.
    fn stabilize(&mut self) -> OptimizerResult<()>;

    /// Switches the burn-in phase on or off.
    fn set_burnin(&mut self, burnin: bool) {
        self.state_mut().set_burnin(burnin);
    }

    /// Number of recorded steps.
    fn steps(&self) -> usize {
        self.state().steps
    }

    /// Log-density at every recorded step.
    fn log_probs(&self) -> &[T] {
        &self.state().log_probs
    }
}

/// Rng for a chain: seeded when reproducibility is requested.
pub(crate) fn chain_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Tensor of i.i.d. `N(0, std²)` entries.
pub(crate) fn gaussian<T: Scalar, R: Rng + ?Sized>(shape: &[usize], std: T, rng: &mut R) -> Point<T> {
    ArrayD::from_shape_simple_fn(IxDyn(shape), || {
        <T as Scalar>::from_f64(rng.sample::<f64, _>(StandardNormal)) * std
    })
}

/// Takes every gradient buffer, failing before any is consumed when the
/// closure left one empty.
pub(crate) fn take_grads<T: Scalar>(params: &mut [ManifoldParameter<T>]) -> OptimizerResult<Vec<Point<T>>> {
    if let Some(index) = params.iter().position(|p| p.grad().is_none()) {
        return Err(OptimizerError::MissingGradient { index });
    }
    Ok(params.iter_mut().filter_map(|p| p.take_grad()).collect())
}

/// Validates a strictly positive step size.
pub(crate) fn positive<T: Scalar>(value: T, parameter: &str) -> OptimizerResult<()> {
    if value > T::zero() && Float::is_finite(value) {
        Ok(())
    } else {
        Err(OptimizerError::invalid_configuration(
            "must be positive and finite",
            parameter,
            value.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burnin_steps_are_not_recorded() {
        let mut state = SamplerState::<f64>::default();
        assert!(state.burnin);
        state.record(-1.0);
        assert_eq!(state.steps, 0);
        state.set_burnin(false);
        state.record(-2.0);
        state.record(f64::NAN);
        assert_eq!(state.steps, 2);
        assert_eq!(state.log_probs[0], -2.0);
        assert!(state.log_probs[1].is_nan());
    }

    #[test]
    fn test_seeded_chains_are_reproducible() {
        let a: Point<f64> = gaussian(&[4], 1.0, &mut chain_rng(Some(3)));
        let b: Point<f64> = gaussian(&[4], 1.0, &mut chain_rng(Some(3)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_positive_rejects_zero_and_nan() {
        assert!(positive(1e-3, "epsilon").is_ok());
        assert!(matches!(
            positive(0.0, "epsilon"),
            Err(OptimizerError::InvalidConfiguration { .. })
        ));
        assert!(positive(f64::NAN, "epsilon").is_err());
    }
}
