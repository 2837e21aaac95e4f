//! Error types for manifold operations and samplers.
//!
//! Validation failures name the manifold and the violated condition.
//! Unimplemented operations use their own variant so that callers can tell
//! them apart from invalid input.

use thiserror::Error;

/// Errors that can occur during manifold operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManifoldError {
    /// A tensor has too few trailing axes or a mismatching manifold axis.
    #[error("`{name}` has an invalid shape for the {manifold} manifold: {reason}")]
    Shape {
        /// Manifold the tensor was checked against
        manifold: String,
        /// Name of the offending argument (`x`, `u`, ...)
        name: String,
        /// Description of the shape violation
        reason: String,
    },

    /// Point fails the manifold constraint within tolerance.
    #[error("`x` is not lying on the {manifold} manifold: {reason}")]
    NotOnManifold {
        /// Manifold the point was checked against
        manifold: String,
        /// Description of why the point is invalid
        reason: String,
    },

    /// Vector fails the tangent-space membership test.
    #[error("`u` is not lying on the tangent space of the {manifold} manifold: {reason}")]
    NotOnTangent {
        /// Manifold the vector was checked against
        manifold: String,
        /// Description of why the tangent vector is invalid
        reason: String,
    },

    /// The manifold has no implementation of the requested operation.
    #[error("operation `{operation}` is not supported by the {manifold} manifold")]
    Unsupported {
        /// Manifold that lacks the operation
        manifold: String,
        /// Name of the operation
        operation: String,
    },

    /// Invalid construction parameters.
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// Description of the configuration error
        reason: String,
    },

    /// A factorization or solve failed on the given input.
    #[error("numerical failure: {reason}")]
    Numerical {
        /// Description of the numerical issue
        reason: String,
    },
}

impl ManifoldError {
    /// Create a Shape error.
    pub fn shape<M, N, R>(manifold: M, name: N, reason: R) -> Self
    where
        M: Into<String>,
        N: Into<String>,
        R: Into<String>,
    {
        Self::Shape {
            manifold: manifold.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotOnManifold error.
    pub fn not_on_manifold<M: Into<String>, R: Into<String>>(manifold: M, reason: R) -> Self {
        Self::NotOnManifold {
            manifold: manifold.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotOnTangent error.
    pub fn not_on_tangent<M: Into<String>, R: Into<String>>(manifold: M, reason: R) -> Self {
        Self::NotOnTangent {
            manifold: manifold.into(),
            reason: reason.into(),
        }
    }

    /// Create an Unsupported error for a specific operation.
    pub fn unsupported<M: Into<String>, O: Into<String>>(manifold: M, operation: O) -> Self {
        Self::Unsupported {
            manifold: manifold.into(),
            operation: operation.into(),
        }
    }

    /// Create a Configuration error.
    pub fn configuration<S: Into<String>>(reason: S) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a Numerical error.
    pub fn numerical<S: Into<String>>(reason: S) -> Self {
        Self::Numerical {
            reason: reason.into(),
        }
    }

    /// Whether this error reports a missing operation rather than bad input.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Errors that can occur while stepping a sampler or an optimizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    /// Invalid sampler or optimizer configuration.
    #[error("invalid configuration of `{parameter}` ({value}): {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// The closure did not fill the gradient buffer of a tracked parameter.
    #[error("parameter {index} has no gradient after evaluating the closure")]
    MissingGradient {
        /// Position of the parameter in the tracked set
        index: usize,
    },

    /// Propagated manifold error.
    #[error("manifold operation failed: {0}")]
    Manifold(#[from] ManifoldError),
}

impl OptimizerError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }
}

/// Result type alias for operations that can produce ManifoldError.
pub type Result<T> = std::result::Result<T, ManifoldError>;

/// Result type alias for sampler and optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ManifoldError::not_on_manifold("Sphere", "`norm(x) != 1`");
        assert!(matches!(err, ManifoldError::NotOnManifold { .. }));
        assert_eq!(
            err.to_string(),
            "`x` is not lying on the Sphere manifold: `norm(x) != 1`"
        );

        let err = ManifoldError::shape("SPD", "x", "requires at least 2 dims");
        assert!(err.to_string().contains("`x`"));
        assert!(err.to_string().contains("SPD"));
    }

    #[test]
    fn test_unsupported_is_distinct() {
        let err = ManifoldError::unsupported("R", "logmap");
        assert!(err.is_unsupported());
        assert!(!ManifoldError::not_on_tangent("R", "bad").is_unsupported());
        assert!(!ManifoldError::configuration("bad").is_unsupported());
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            ManifoldError::shape("Sphere", "u", "last dim is 1"),
            ManifoldError::not_on_manifold("Sphere", "not unit norm"),
            ManifoldError::not_on_tangent("Sphere", "not orthogonal to point"),
            ManifoldError::unsupported("SPD", "logmap"),
            ManifoldError::configuration("both intersection and complement"),
            ManifoldError::numerical("cholesky failed"),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_manifold_error_propagation() {
        let manifold_err = ManifoldError::not_on_manifold("Sphere", "not on sphere");
        let optimizer_err: OptimizerError = manifold_err.into();

        assert!(matches!(optimizer_err, OptimizerError::Manifold(_)));
        assert!(optimizer_err.to_string().contains("manifold operation failed"));
        assert!(optimizer_err.to_string().contains("not on sphere"));
    }

    #[test]
    fn test_invalid_configuration() {
        let err = OptimizerError::invalid_configuration("must be positive", "epsilon", "-0.1");
        assert!(err.to_string().contains("epsilon"));
        assert!(err.to_string().contains("-0.1"));
    }
}
