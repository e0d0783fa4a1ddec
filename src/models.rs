use std::convert::Infallible;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Constriction coefficient from Clerc & Kennedy for `c1 = c2 = 2.05`.
pub const DEFAULT_CONSTRICTION: f64 = 0.7298437881283576;

/// A scalar objective to minimize. `A` is the auxiliary context handed to every evaluation.
pub trait CostFunction<A: ?Sized = ()> {
    type Error;

    fn evaluate(&self, position: &[f64], args: &A) -> Result<f64, Self::Error>;
}

impl<A: ?Sized, F> CostFunction<A> for F
where
    F: Fn(&[f64], &A) -> f64,
{
    type Error = Infallible;

    fn evaluate(&self, position: &[f64], args: &A) -> Result<f64, Infallible> {
        Ok(self(position, args))
    }
}

/// Cost function plus the axis-aligned box it is searched over.
#[derive(Debug, Clone)]
pub struct Problem<C> {
    cost_function: C,
    varmin: Vec<f64>,
    varmax: Vec<f64>,
}

impl<C> Problem<C> {
    pub fn new(cost_function: C, varmin: Vec<f64>, varmax: Vec<f64>) -> Result<Self, ConfigurationError> {
        validate_bounds(&varmin, &varmax)?;
        Ok(Problem {
            cost_function,
            varmin,
            varmax,
        })
    }

    pub fn cost_function(&self) -> &C {
        &self.cost_function
    }

    pub fn varmin(&self) -> &[f64] {
        &self.varmin
    }

    pub fn varmax(&self) -> &[f64] {
        &self.varmax
    }

    pub fn dimension(&self) -> usize {
        self.varmin.len()
    }

    /// Per-dimension velocity bound `scale * (varmax - varmin)`.
    pub fn velocity_limits(&self, scale: f64) -> Vec<f64> {
        self.varmin
            .iter()
            .zip(&self.varmax)
            .map(|(min, max)| scale * (max - min))
            .collect()
    }
}

fn validate_bounds(varmin: &[f64], varmax: &[f64]) -> Result<(), ConfigurationError> {
    if varmin.len() != varmax.len() {
        return Err(ConfigurationError::DimensionMismatch {
            varmin: varmin.len(),
            varmax: varmax.len(),
        });
    }
    if varmin.is_empty() {
        return Err(ConfigurationError::EmptyBounds);
    }
    for (index, (&min, &max)) in varmin.iter().zip(varmax).enumerate() {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ConfigurationError::InvalidBound { index, min, max });
        }
        if !(max - min).is_finite() {
            return Err(ConfigurationError::UnboundedRange { index, min, max });
        }
    }
    Ok(())
}

/// How particle velocities are seeded before the first iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityInit {
    /// Uniform in `[-vmax_i, vmax_i]`.
    #[default]
    Random,
    Zero,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsoParameters {
    pub maxit: usize,
    pub n_part: usize,
    pub w: f64,
    pub wdamp: f64,
    pub c1: f64,
    pub c2: f64,
    pub con: f64,
    pub display_info: bool,
    pub early_stopping: bool,
    pub early_stopping_rounds: usize,
    /// Minimum decrease of the global best that counts as an improvement.
    pub early_stopping_tolerance: f64,
    pub velocity_limit_scale: f64,
    pub velocity_init: VelocityInit,
    /// Fixed RNG seed for reproducible runs. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for PsoParameters {
    fn default() -> Self {
        PsoParameters {
            maxit: 30,
            n_part: 15,
            w: 1.0,
            wdamp: 1.0,
            c1: 2.05,
            c2: 2.05,
            con: DEFAULT_CONSTRICTION,
            display_info: true,
            early_stopping: false,
            early_stopping_rounds: 10,
            early_stopping_tolerance: 0.0,
            velocity_limit_scale: 0.2,
            velocity_init: VelocityInit::Random,
            seed: None,
        }
    }
}

impl PsoParameters {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let counts = [
            ("maxit", self.maxit),
            ("n_part", self.n_part),
            ("early_stopping_rounds", self.early_stopping_rounds),
        ];
        for (name, value) in counts {
            if value < 1 {
                return Err(ConfigurationError::NonPositiveCount { name });
            }
        }

        let reals = [
            ("w", self.w),
            ("wdamp", self.wdamp),
            ("c1", self.c1),
            ("c2", self.c2),
            ("con", self.con),
            ("early_stopping_tolerance", self.early_stopping_tolerance),
            ("velocity_limit_scale", self.velocity_limit_scale),
        ];
        for (name, value) in reals {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFinite { name, value });
            }
        }

        for (name, value) in [
            ("c1", self.c1),
            ("c2", self.c2),
            ("early_stopping_tolerance", self.early_stopping_tolerance),
        ] {
            if value < 0.0 {
                return Err(ConfigurationError::Negative { name, value });
            }
        }

        if self.velocity_limit_scale <= 0.0 {
            return Err(ConfigurationError::VelocityLimitScale(self.velocity_limit_scale));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxIterations,
    EarlyStopping,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsoResult {
    pub best_cost: f64,
    pub best_position: Vec<f64>,
    /// Global best after each completed iteration.
    pub best_costs: Vec<f64>,
    pub iterations: usize,
    pub stop_reason: StopReason,
    /// Number of cost function calls, initialization included.
    pub evaluations: usize,
}

impl PsoResult {
    /// `(gbest_cost, gbest_position, best_costs)`
    pub fn into_parts(self) -> (f64, Vec<f64>, Vec<f64>) {
        (self.best_cost, self.best_position, self.best_costs)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OptimizationStatus {
    /// Distinguishes concurrent runs sharing one status stream.
    pub run_id: u64,
    pub iteration: usize,
    pub elapsed_time: Duration,
    pub best_cost: f64,
    pub best_position: Vec<f64>,
    pub inertia_weight: f64,
    pub converged_particles: usize,
    pub mean_distance: f64,
    pub is_finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let params = PsoParameters::default();
        assert_eq!(params.maxit, 30);
        assert_eq!(params.n_part, 15);
        assert_eq!(params.w, 1.0);
        assert_eq!(params.wdamp, 1.0);
        assert_eq!(params.c1, 2.05);
        assert_eq!(params.c2, 2.05);
        assert!((params.con - 0.7298).abs() < 1e-4);
        assert!(params.display_info);
        assert!(!params.early_stopping);
        assert_eq!(params.early_stopping_rounds, 10);
        assert_eq!(params.velocity_limit_scale, 0.2);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_parameters_fill_missing_fields_from_defaults() {
        let params: PsoParameters =
            serde_json::from_str(r#"{"maxit": 15, "n_part": 30, "early_stopping": true, "velocity_init": "zero"}"#)
                .unwrap();
        assert_eq!(params.maxit, 15);
        assert_eq!(params.n_part, 30);
        assert!(params.early_stopping);
        assert_eq!(params.velocity_init, VelocityInit::Zero);
        assert_eq!(params.c1, 2.05);
        assert_eq!(params.seed, None);
    }

    #[test]
    fn test_invalid_parameters() {
        let params = PsoParameters { n_part: 0, ..Default::default() };
        assert_eq!(
            params.validate(),
            Err(ConfigurationError::NonPositiveCount { name: "n_part" })
        );

        let params = PsoParameters { maxit: 0, ..Default::default() };
        assert_eq!(
            params.validate(),
            Err(ConfigurationError::NonPositiveCount { name: "maxit" })
        );

        let params = PsoParameters { c2: -1.0, ..Default::default() };
        assert!(matches!(params.validate(), Err(ConfigurationError::Negative { name: "c2", .. })));

        let params = PsoParameters { velocity_limit_scale: 0.0, ..Default::default() };
        assert_eq!(params.validate(), Err(ConfigurationError::VelocityLimitScale(0.0)));

        let params = PsoParameters { w: f64::NAN, ..Default::default() };
        assert!(matches!(params.validate(), Err(ConfigurationError::NonFinite { name: "w", .. })));
    }

    #[test]
    fn test_problem_bounds_validation() {
        let cost = |x: &[f64], _: &()| x[0];

        let err = Problem::new(cost, vec![0.0], vec![0.0, 1.0]).err().expect("mismatched bounds accepted");
        assert_eq!(err, ConfigurationError::DimensionMismatch { varmin: 1, varmax: 2 });

        let err = Problem::new(cost, vec![], vec![]).err().expect("empty bounds accepted");
        assert_eq!(err, ConfigurationError::EmptyBounds);

        let err = Problem::new(cost, vec![0.0, 2.0], vec![1.0, 2.0])
            .err()
            .expect("degenerate bound accepted");
        assert!(matches!(err, ConfigurationError::InvalidBound { index: 1, .. }));

        let err = Problem::new(cost, vec![0.0, -1e308], vec![1.0, 1e308])
            .err()
            .expect("overflowing range accepted");
        assert!(matches!(err, ConfigurationError::UnboundedRange { index: 1, .. }));

        let problem = Problem::new(cost, vec![-10.0, 0.0], vec![10.0, 1.0])
            .ok()
            .expect("valid bounds rejected");
        assert_eq!(problem.dimension(), 2);
        assert_eq!(problem.velocity_limits(0.2), vec![4.0, 0.2]);
    }
}
