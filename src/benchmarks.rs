//! Standard test functions for exercising the optimizer.
//!
//! Every benchmark is evaluated at `x - shift`, so the known minimum of each
//! function can be moved anywhere in the search box. `Circle` is the classic
//! "find the centre of a circle" demo: its cost is `|r^2 - |x - shift|^2|`,
//! which is zero on the circle of radius `r` around `shift`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::CostFunction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Benchmark {
    Sphere,
    Circle,
    Rastrigin,
    Rosenbrock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkContext {
    /// Empty means no shift.
    pub shift: Vec<f64>,
    pub radius: f64,
}

impl Default for BenchmarkContext {
    fn default() -> Self {
        BenchmarkContext {
            shift: Vec::new(),
            radius: 5.0,
        }
    }
}

impl BenchmarkContext {
    pub fn shifted(shift: Vec<f64>) -> Self {
        BenchmarkContext {
            shift,
            ..Default::default()
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BenchmarkError {
    #[error("shift has {shift} components but the position has {position}")]
    ShiftLength { shift: usize, position: usize },
    #[error("rosenbrock needs at least 2 dimensions")]
    RosenbrockDimension,
}

impl CostFunction<BenchmarkContext> for Benchmark {
    type Error = BenchmarkError;

    fn evaluate(&self, position: &[f64], context: &BenchmarkContext) -> Result<f64, BenchmarkError> {
        let x: Vec<f64> = if context.shift.is_empty() {
            position.to_vec()
        } else if context.shift.len() == position.len() {
            position.iter().zip(&context.shift).map(|(x, s)| x - s).collect()
        } else {
            return Err(BenchmarkError::ShiftLength {
                shift: context.shift.len(),
                position: position.len(),
            });
        };

        let cost = match self {
            Benchmark::Sphere => sphere(&x),
            Benchmark::Circle => (context.radius.powi(2) - sphere(&x)).abs(),
            Benchmark::Rastrigin => {
                10.0 * x.len() as f64
                    + x.iter().map(|v| v * v - 10.0 * (2.0 * PI * v).cos()).sum::<f64>()
            }
            Benchmark::Rosenbrock => {
                if x.len() < 2 {
                    return Err(BenchmarkError::RosenbrockDimension);
                }
                x.windows(2)
                    .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
                    .sum()
            }
        };
        Ok(cost)
    }
}

fn sphere(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_minima() {
        let context = BenchmarkContext::default();
        assert_eq!(Benchmark::Sphere.evaluate(&[0.0, 0.0], &context), Ok(0.0));
        assert_eq!(Benchmark::Rastrigin.evaluate(&[0.0, 0.0, 0.0], &context), Ok(0.0));
        assert_eq!(Benchmark::Rosenbrock.evaluate(&[1.0, 1.0, 1.0], &context), Ok(0.0));
        assert_eq!(Benchmark::Circle.evaluate(&[3.0, 4.0], &context), Ok(0.0));
    }

    #[test]
    fn test_shift_moves_the_minimum() {
        let context = BenchmarkContext::shifted(vec![3.0, 4.0]);
        assert_eq!(Benchmark::Sphere.evaluate(&[3.0, 4.0], &context), Ok(0.0));
        assert_relative_eq!(
            Benchmark::Sphere.evaluate(&[0.0, 0.0], &context).unwrap(),
            25.0
        );
        // Centre of the circle itself is maximally far from the rim.
        assert_relative_eq!(
            Benchmark::Circle.evaluate(&[3.0, 4.0], &context).unwrap(),
            25.0
        );
    }

    #[test]
    fn test_shift_length_mismatch() {
        let context = BenchmarkContext::shifted(vec![1.0]);
        assert_eq!(
            Benchmark::Sphere.evaluate(&[0.0, 0.0], &context),
            Err(BenchmarkError::ShiftLength { shift: 1, position: 2 })
        );
    }

    #[test]
    fn test_rosenbrock_needs_two_dimensions() {
        assert_eq!(
            Benchmark::Rosenbrock.evaluate(&[1.0], &BenchmarkContext::default()),
            Err(BenchmarkError::RosenbrockDimension)
        );
    }

    #[test]
    fn test_context_deserializes_with_defaults() {
        let context: BenchmarkContext = serde_json::from_str(r#"{"shift": [1.0, 2.0]}"#).unwrap();
        assert_eq!(context.shift, vec![1.0, 2.0]);
        assert_eq!(context.radius, 5.0);
        let benchmark: Benchmark = serde_json::from_str(r#""rastrigin""#).unwrap();
        assert_eq!(benchmark, Benchmark::Rastrigin);
    }
}
