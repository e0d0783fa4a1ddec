use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::observer::{IterationInfo, LogObserver, Observer};
use super::particle::{Particle, VelocityCoefficients};
use super::stopping::{EarlyStopping, SearchState};
use crate::error::{ConfigurationError, PsoError};
use crate::models::{CostFunction, Problem, PsoParameters, PsoResult, StopReason};

pub struct Swarm<'a, C, A: ?Sized, R = StdRng> {
    problem: &'a Problem<C>,
    parameters: &'a PsoParameters,
    args: &'a A,
    rng: R,
    particles: Vec<Particle>,
    velocity_limits: Vec<f64>,
    global_best_position: Vec<f64>,
    global_best_cost: f64,
    inertia_weight: f64,
    best_costs: Vec<f64>,
    early_stopping: EarlyStopping,
    evaluations: usize,
    state: SearchState,
    start_time: Instant,
}

impl<'a, C, A> Swarm<'a, C, A, StdRng>
where
    C: CostFunction<A>,
    A: ?Sized,
{
    /// Builds and evaluates the initial swarm, seeding the RNG from `parameters.seed`.
    pub fn new(
        problem: &'a Problem<C>,
        parameters: &'a PsoParameters,
        args: &'a A,
    ) -> Result<Self, PsoError<C::Error>> {
        let rng = match parameters.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(problem, parameters, args, rng)
    }
}

impl<'a, C, A, R> Swarm<'a, C, A, R>
where
    C: CostFunction<A>,
    A: ?Sized,
    R: Rng,
{
    pub fn with_rng(
        problem: &'a Problem<C>,
        parameters: &'a PsoParameters,
        args: &'a A,
        mut rng: R,
    ) -> Result<Self, PsoError<C::Error>> {
        parameters.validate()?;

        let velocity_limits = problem.velocity_limits(parameters.velocity_limit_scale);
        // Velocities are drawn from [-limit, limit], so twice the limit must stay finite.
        for (index, &limit) in velocity_limits.iter().enumerate() {
            if !(2.0 * limit).is_finite() {
                return Err(ConfigurationError::VelocityLimit { index, limit }.into());
            }
        }

        let mut particles: Vec<Particle> = Vec::new();
        particles
            .try_reserve_exact(parameters.n_part)
            .map_err(|_| ConfigurationError::SwarmTooLarge(parameters.n_part))?;
        for _ in 0..parameters.n_part {
            particles.push(Particle::new(
                &mut rng,
                problem.varmin(),
                problem.varmax(),
                &velocity_limits,
                parameters.velocity_init,
            ));
        }

        let mut evaluations = 0;
        for particle in &mut particles {
            let cost = evaluate(problem, &particle.position, args)?;
            evaluations += 1;
            particle.update_personal_best(cost);
        }

        // First particle wins ties.
        let mut best = 0;
        for (i, particle) in particles.iter().enumerate() {
            if particle.pbest_cost < particles[best].pbest_cost {
                best = i;
            }
        }
        let global_best_position = particles[best].pbest_position.clone();
        let global_best_cost = particles[best].pbest_cost;

        debug!(
            "Swarm initialized with {} particles, {} dimensions each. Initial best cost: {}",
            parameters.n_part,
            problem.dimension(),
            global_best_cost
        );

        Ok(Swarm {
            problem,
            parameters,
            args,
            rng,
            particles,
            velocity_limits,
            global_best_position,
            global_best_cost,
            inertia_weight: parameters.w,
            // Grows per iteration; maxit may be far larger than the run ever gets.
            best_costs: Vec::new(),
            early_stopping: EarlyStopping::new(parameters, global_best_cost),
            evaluations,
            state: SearchState::Running,
            start_time: Instant::now(),
        })
    }

    /// Runs one full iteration over every particle. A stopped swarm is left untouched.
    pub fn step(&mut self) -> Result<SearchState, PsoError<C::Error>> {
        if let SearchState::Stopped(_) = self.state {
            return Ok(self.state);
        }

        let coefficients = VelocityCoefficients {
            con: self.parameters.con,
            inertia_weight: self.inertia_weight,
            cognitive_weight: self.parameters.c1,
            social_weight: self.parameters.c2,
        };

        // Every particle steers by the global best of the previous iteration.
        for particle in &mut self.particles {
            particle.update_velocity(
                &mut self.rng,
                &self.global_best_position,
                &coefficients,
                &self.velocity_limits,
            );
            particle.update_position(self.problem.varmin(), self.problem.varmax());

            let cost = evaluate(self.problem, &particle.position, self.args)?;
            self.evaluations += 1;
            particle.update_personal_best(cost);
        }

        self.update_global_best();
        self.best_costs.push(self.global_best_cost);
        self.inertia_weight *= self.parameters.wdamp;

        self.state = match self.early_stopping.record(self.global_best_cost) {
            SearchState::Running if self.best_costs.len() >= self.parameters.maxit => {
                SearchState::Stopped(StopReason::MaxIterations)
            }
            state => state,
        };
        Ok(self.state)
    }

    fn update_global_best(&mut self) {
        for particle in &self.particles {
            if particle.pbest_cost < self.global_best_cost {
                self.global_best_cost = particle.pbest_cost;
                self.global_best_position.clone_from(&particle.pbest_position);
            }
        }
    }

    /// Iterates until the iteration cap or early stopping ends the search.
    pub fn run<O: Observer>(mut self, mut observer: O) -> Result<PsoResult, PsoError<C::Error>> {
        let mut display = self.parameters.display_info.then_some(LogObserver);

        loop {
            let state = self.step()?;

            let info = self.iteration_info();
            if let Some(display) = display.as_mut() {
                display.observe(&info);
            }
            observer.observe(&info);

            if let SearchState::Stopped(reason) = state {
                if reason == StopReason::EarlyStopping && display.is_some() {
                    info!(
                        "Stopping at iteration {} as there was no improvement in {} iterations",
                        info.iteration, self.parameters.early_stopping_rounds
                    );
                }

                let result = self.into_result(reason);
                if let Some(display) = display.as_mut() {
                    display.finish(&result);
                }
                observer.finish(&result);
                return Ok(result);
            }
        }
    }

    pub fn iteration_info(&self) -> IterationInfo<'_> {
        IterationInfo {
            iteration: self.best_costs.len().saturating_sub(1),
            best_cost: self.global_best_cost,
            best_position: &self.global_best_position,
            inertia_weight: self.inertia_weight,
            particles: &self.particles,
            elapsed_time: self.start_time.elapsed(),
        }
    }

    fn into_result(self, stop_reason: StopReason) -> PsoResult {
        PsoResult {
            best_cost: self.global_best_cost,
            best_position: self.global_best_position,
            iterations: self.best_costs.len(),
            best_costs: self.best_costs,
            stop_reason,
            evaluations: self.evaluations,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn global_best_cost(&self) -> f64 {
        self.global_best_cost
    }

    pub fn global_best_position(&self) -> &[f64] {
        &self.global_best_position
    }

    pub fn best_costs(&self) -> &[f64] {
        &self.best_costs
    }

    /// Inertia weight the next iteration will use.
    pub fn inertia_weight(&self) -> f64 {
        self.inertia_weight
    }

    pub fn velocity_limits(&self) -> &[f64] {
        &self.velocity_limits
    }

    pub fn no_improve_counter(&self) -> usize {
        self.early_stopping.no_improve_counter()
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn state(&self) -> SearchState {
        self.state
    }
}

/// Calls the cost function. Non-finite costs rank as `+inf`.
fn evaluate<C, A>(problem: &Problem<C>, position: &[f64], args: &A) -> Result<f64, PsoError<C::Error>>
where
    C: CostFunction<A>,
    A: ?Sized,
{
    let cost = problem
        .cost_function()
        .evaluate(position, args)
        .map_err(PsoError::CostFunction)?;

    if cost.is_finite() {
        Ok(cost)
    } else {
        warn!("Cost function returned {} at {:?}, treating it as +inf", cost, position);
        Ok(f64::INFINITY)
    }
}

pub fn optimize<C, A>(
    problem: &Problem<C>,
    parameters: &PsoParameters,
    args: &A,
) -> Result<PsoResult, PsoError<C::Error>>
where
    C: CostFunction<A>,
    A: ?Sized,
{
    optimize_with_observer(problem, parameters, args, ())
}

pub fn optimize_with_observer<C, A, O>(
    problem: &Problem<C>,
    parameters: &PsoParameters,
    args: &A,
    observer: O,
) -> Result<PsoResult, PsoError<C::Error>>
where
    C: CostFunction<A>,
    A: ?Sized,
    O: Observer,
{
    Swarm::new(problem, parameters, args)?.run(observer)
}
