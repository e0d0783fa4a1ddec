use thiserror::Error;

/// Malformed problem or parameters. Always raised before the first cost evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("varmin has {varmin} entries but varmax has {varmax}")]
    DimensionMismatch { varmin: usize, varmax: usize },
    #[error("bounds are empty")]
    EmptyBounds,
    #[error("bound {index} is invalid: varmin {min} must be finite and below varmax {max}")]
    InvalidBound { index: usize, min: f64, max: f64 },
    #[error("{name} must be at least 1")]
    NonPositiveCount { name: &'static str },
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("velocity_limit_scale must be positive, got {0}")]
    VelocityLimitScale(f64),
    #[error("bound {index} spans a range too wide to sample: [{min}, {max}]")]
    UnboundedRange { index: usize, min: f64, max: f64 },
    #[error("velocity limit of dimension {index} is too large to sample: {limit}")]
    VelocityLimit { index: usize, limit: f64 },
    #[error("cannot allocate a swarm of {0} particles")]
    SwarmTooLarge(usize),
}

#[derive(Error, Debug)]
pub enum PsoError<E> {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("cost function failed")]
    CostFunction(#[source] E),
}

impl<E> PsoError<E> {
    pub fn is_configuration(&self) -> bool {
        matches!(self, PsoError::Configuration(_))
    }
}
