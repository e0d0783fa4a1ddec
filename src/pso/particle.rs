use rand::Rng;

use crate::models::VelocityInit;

/// Constants of the constricted, inertia-weighted velocity rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCoefficients {
    pub con: f64,
    pub inertia_weight: f64,
    pub cognitive_weight: f64,
    pub social_weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub cost: f64,
    pub pbest_position: Vec<f64>,
    pub pbest_cost: f64,
}

impl Particle {
    /// Samples a particle uniformly inside the box. Costs stay at `+inf` until the first evaluation.
    pub fn new<R: Rng>(
        rng: &mut R,
        varmin: &[f64],
        varmax: &[f64],
        velocity_limits: &[f64],
        velocity_init: VelocityInit,
    ) -> Self {
        let position: Vec<f64> = varmin
            .iter()
            .zip(varmax)
            .map(|(&min, &max)| rng.random_range(min..=max))
            .collect();

        let velocity = match velocity_init {
            VelocityInit::Random => velocity_limits
                .iter()
                .map(|&vmax| rng.random_range(-vmax..=vmax))
                .collect(),
            VelocityInit::Zero => vec![0.0; velocity_limits.len()],
        };

        Particle {
            pbest_position: position.clone(),
            position,
            velocity,
            cost: f64::INFINITY,
            pbest_cost: f64::INFINITY,
        }
    }

    pub fn update_velocity<R: Rng>(
        &mut self,
        rng: &mut R,
        gbest: &[f64],
        coefficients: &VelocityCoefficients,
        velocity_limits: &[f64],
    ) {
        for i in 0..self.velocity.len() {
            let r1: f64 = rng.random();
            let r2: f64 = rng.random();

            let cognitive = coefficients.cognitive_weight * r1 * (self.pbest_position[i] - self.position[i]);
            let social = coefficients.social_weight * r2 * (gbest[i] - self.position[i]);

            let velocity = coefficients.con * (coefficients.inertia_weight * self.velocity[i] + cognitive + social);
            self.velocity[i] = velocity.clamp(-velocity_limits[i], velocity_limits[i]);
        }
    }

    /// Moves the particle and hard-clamps it back into the box.
    pub fn update_position(&mut self, varmin: &[f64], varmax: &[f64]) {
        for i in 0..self.position.len() {
            self.position[i] += self.velocity[i];
            self.position[i] = self.position[i].clamp(varmin[i], varmax[i]);
        }
    }

    /// Records the cost at the current position. Returns `true` on a new personal best.
    pub fn update_personal_best(&mut self, cost: f64) -> bool {
        self.cost = cost;
        if cost < self.pbest_cost {
            self.pbest_cost = cost;
            self.pbest_position.clone_from(&self.position);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const VARMIN: [f64; 3] = [-1.0, 0.0, 10.0];
    const VARMAX: [f64; 3] = [1.0, 5.0, 10.5];

    fn limits() -> Vec<f64> {
        VARMIN.iter().zip(VARMAX).map(|(min, max)| 0.2 * (max - min)).collect()
    }

    #[test]
    fn test_new_particle_is_inside_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let limits = limits();
        for _ in 0..100 {
            let particle = Particle::new(&mut rng, &VARMIN, &VARMAX, &limits, VelocityInit::Random);
            for i in 0..3 {
                assert!(particle.position[i] >= VARMIN[i] && particle.position[i] <= VARMAX[i]);
                assert!(particle.velocity[i].abs() <= limits[i]);
            }
            assert_eq!(particle.pbest_position, particle.position);
            assert_eq!(particle.pbest_cost, f64::INFINITY);
        }
    }

    #[test]
    fn test_zero_velocity_init() {
        let mut rng = StdRng::seed_from_u64(7);
        let particle = Particle::new(&mut rng, &VARMIN, &VARMAX, &limits(), VelocityInit::Zero);
        assert_eq!(particle.velocity, vec![0.0; 3]);
    }

    #[test]
    fn test_velocity_is_clamped() {
        let mut rng = StdRng::seed_from_u64(1);
        let limits = limits();
        let mut particle = Particle {
            position: vec![-1.0, 0.0, 10.0],
            velocity: vec![0.0; 3],
            cost: 0.0,
            pbest_position: vec![-1.0, 0.0, 10.0],
            pbest_cost: 0.0,
        };
        let coefficients = VelocityCoefficients {
            con: 1.0,
            inertia_weight: 1.0,
            cognitive_weight: 100.0,
            social_weight: 100.0,
        };
        for _ in 0..20 {
            particle.update_velocity(&mut rng, &[1.0, 5.0, 10.5], &coefficients, &limits);
            for i in 0..3 {
                assert!(particle.velocity[i].abs() <= limits[i]);
            }
        }
    }

    #[test]
    fn test_velocity_follows_inertia_when_at_bests() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut particle = Particle {
            position: vec![0.0],
            velocity: vec![0.5],
            cost: 0.0,
            pbest_position: vec![0.0],
            pbest_cost: 0.0,
        };
        let coefficients = VelocityCoefficients {
            con: 0.5,
            inertia_weight: 0.8,
            cognitive_weight: 2.05,
            social_weight: 2.05,
        };
        particle.update_velocity(&mut rng, &[0.0], &coefficients, &[10.0]);
        assert!((particle.velocity[0] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_position_is_clamped_to_nearest_bound() {
        let mut particle = Particle {
            position: vec![0.9, 0.1, 10.2],
            velocity: vec![0.5, -0.5, 0.1],
            cost: 0.0,
            pbest_position: vec![0.0; 3],
            pbest_cost: 0.0,
        };
        particle.update_position(&VARMIN, &VARMAX);
        assert_eq!(particle.position[0], 1.0);
        assert_eq!(particle.position[1], 0.0);
        assert!((particle.position[2] - 10.3).abs() < 1e-12);
    }

    #[test]
    fn test_personal_best_is_a_copy() {
        let mut particle = Particle {
            position: vec![1.0, 2.0],
            velocity: vec![0.5, 0.5],
            cost: 5.0,
            pbest_position: vec![0.0, 0.0],
            pbest_cost: 5.0,
        };
        assert!(particle.update_personal_best(3.0));
        assert_eq!(particle.pbest_position, vec![1.0, 2.0]);

        particle.update_position(&[-10.0, -10.0], &[10.0, 10.0]);
        assert_eq!(particle.pbest_position, vec![1.0, 2.0]);

        assert!(!particle.update_personal_best(3.0));
        assert_eq!(particle.cost, 3.0);
        assert_eq!(particle.pbest_position, vec![1.0, 2.0]);
    }
}
