//! Particle Swarm Optimization over box-bounded real parameter spaces.
//!
//! ```no_run
//! use pso_engine::{optimize, Problem, PsoParameters};
//!
//! let cost = |x: &[f64], _: &()| (x[0] - 3.0).powi(2) + (x[1] - 4.0).powi(2);
//! let problem = Problem::new(cost, vec![-10.0, -10.0], vec![10.0, 10.0]).unwrap();
//! let params = PsoParameters { maxit: 50, ..Default::default() };
//!
//! let (best_cost, best_position, best_costs) = optimize(&problem, &params, &()).unwrap().into_parts();
//! ```

pub mod benchmarks;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pso;

pub use error::{ConfigurationError, PsoError};
pub use models::{CostFunction, Problem, PsoParameters, PsoResult, StopReason, VelocityInit};
pub use pso::observer::{IterationInfo, LogObserver, Observer};
pub use pso::optimizer::{optimize, optimize_with_observer, Swarm};
pub use pso::particle::Particle;
pub use pso::stopping::SearchState;
