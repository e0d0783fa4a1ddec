use std::time::Duration;

use log::info;

use super::particle::Particle;
use crate::models::{OptimizationStatus, PsoResult};

/// Snapshot of the swarm after one completed iteration.
#[derive(Debug, Clone, Copy)]
pub struct IterationInfo<'a> {
    pub iteration: usize,
    pub best_cost: f64,
    pub best_position: &'a [f64],
    pub inertia_weight: f64,
    pub particles: &'a [Particle],
    pub elapsed_time: Duration,
}

impl IterationInfo<'_> {
    /// Particles sitting exactly on the global best.
    pub fn converged_particles(&self) -> usize {
        self.particles
            .iter()
            .filter(|particle| particle.position == self.best_position)
            .count()
    }

    /// Mean Euclidean distance from the particles to the global best.
    pub fn mean_distance(&self) -> f64 {
        if self.particles.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .particles
            .iter()
            .map(|particle| {
                particle
                    .position
                    .iter()
                    .zip(self.best_position)
                    .map(|(x, g)| (x - g).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .sum();
        total / self.particles.len() as f64
    }

    pub fn to_status(&self, run_id: u64) -> OptimizationStatus {
        OptimizationStatus {
            run_id,
            iteration: self.iteration,
            elapsed_time: self.elapsed_time,
            best_cost: self.best_cost,
            best_position: self.best_position.to_vec(),
            inertia_weight: self.inertia_weight,
            converged_particles: self.converged_particles(),
            mean_distance: self.mean_distance(),
            is_finished: false,
        }
    }
}

/// Sink for per-iteration progress.
pub trait Observer {
    fn observe(&mut self, info: &IterationInfo<'_>);

    fn finish(&mut self, _result: &PsoResult) {}
}

impl Observer for () {
    fn observe(&mut self, _info: &IterationInfo<'_>) {}
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn observe(&mut self, info: &IterationInfo<'_>) {
        (**self).observe(info);
    }

    fn finish(&mut self, result: &PsoResult) {
        (**self).finish(result);
    }
}

/// Writes iteration info through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn observe(&mut self, info: &IterationInfo<'_>) {
        info!(
            "Iteration: {}  Best cost: {}  Best position: {:?}",
            info.iteration, info.best_cost, info.best_position
        );
    }

    fn finish(&mut self, result: &PsoResult) {
        info!(
            "Finished after {} iterations ({:?}). Best cost: {}  Best position: {:?}",
            result.iterations, result.stop_reason, result.best_cost, result.best_position
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn particle(position: Vec<f64>) -> Particle {
        Particle {
            pbest_position: position.clone(),
            position,
            velocity: vec![0.0, 0.0],
            cost: 0.0,
            pbest_cost: 0.0,
        }
    }

    #[test]
    fn test_swarm_diagnostics() {
        let particles = vec![
            particle(vec![0.0, 0.0]),
            particle(vec![3.0, 4.0]),
            particle(vec![0.0, 0.0]),
        ];
        let info = IterationInfo {
            iteration: 4,
            best_cost: 1.5,
            best_position: &[0.0, 0.0],
            inertia_weight: 0.9,
            particles: &particles,
            elapsed_time: Duration::from_millis(3),
        };

        assert_eq!(info.converged_particles(), 2);
        assert_relative_eq!(info.mean_distance(), 5.0 / 3.0, epsilon = 1e-12);

        let status = info.to_status(7);
        assert_eq!(status.run_id, 7);
        assert_eq!(status.iteration, 4);
        assert_eq!(status.converged_particles, 2);
        assert_eq!(status.best_position, vec![0.0, 0.0]);
        assert!(!status.is_finished);
    }
}
