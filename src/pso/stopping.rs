use crate::models::{PsoParameters, StopReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Running,
    Stopped(StopReason),
}

/// Counts consecutive iterations in which the global best failed to improve.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    enabled: bool,
    rounds: usize,
    tolerance: f64,
    reference_cost: f64,
    no_improve_counter: usize,
}

impl EarlyStopping {
    pub fn new(parameters: &PsoParameters, initial_cost: f64) -> Self {
        EarlyStopping {
            enabled: parameters.early_stopping,
            rounds: parameters.early_stopping_rounds,
            tolerance: parameters.early_stopping_tolerance,
            reference_cost: initial_cost,
            no_improve_counter: 0,
        }
    }

    pub fn no_improve_counter(&self) -> usize {
        self.no_improve_counter
    }

    /// Feeds the global best of a completed iteration.
    pub fn record(&mut self, best_cost: f64) -> SearchState {
        if best_cost < self.reference_cost - self.tolerance {
            self.reference_cost = best_cost;
            self.no_improve_counter = 0;
        } else {
            self.no_improve_counter += 1;
        }

        if self.enabled && self.no_improve_counter >= self.rounds {
            SearchState::Stopped(StopReason::EarlyStopping)
        } else {
            SearchState::Running
        }
    }
}
