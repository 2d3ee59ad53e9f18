//! Velocity-Verlet time propagation.
//!
//! [`IntegratorState`] owns the per-atom arrays of one running simulation. Forces are
//! populated lazily: a freshly built state is *cold* and the first step evaluates the
//! starting geometry once before integrating; afterwards the state is *warm* and every
//! step costs exactly one evaluation.
//!
//! Each step is transactional. The half kick and drift are computed into scratch buffers,
//! the evaluator runs on the scratch positions, and only a validated result is committed,
//! so a failing or non-finite evaluation leaves the state exactly as it was.

use super::config::IntegratorConfig;
use super::error::EngineError;
use super::evaluation::{evaluate_checked, max_mobile_force};
use super::thermal::{ThermalVelocityInitializer, kinetic_energy_of};
use crate::core::error::UsageError;
use crate::core::evaluator::Evaluator;
use nalgebra::{Point3, Vector3};
use tracing::{debug, trace};

/// Ratios of duration to step size this close to an integer are treated as that integer.
const STEP_RATIO_TOLERANCE: f64 = 1e-9;

/// Energies and forces after a completed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDiagnostics {
    pub potential_energy: f64,
    pub kinetic_energy: f64,
    pub temperature: f64,
    pub max_force: f64,
}

/// What one call to [`IntegratorState::simulate`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationReport {
    pub steps: usize,
    pub step_size: f64,
    /// Diagnostics of the last step, `None` if no step was taken.
    pub diagnostics: Option<StepDiagnostics>,
}

/// Number of equal sub-steps needed to cover `duration` without exceeding `max_step`.
///
/// `duration / max_step` is rounded up, except that a ratio within a relative `1e-9` of an
/// integer snaps to it, so `0.01 / 0.0025` gives 4 steps even when the floating-point
/// quotient lands just above 4. Always at least one.
pub fn sub_step_count(duration: f64, max_step: f64) -> usize {
    let ratio = duration / max_step;
    let nearest = ratio.round();
    let count = if (ratio - nearest).abs() <= STEP_RATIO_TOLERANCE * nearest.max(1.0) {
        nearest
    } else {
        ratio.ceil()
    };
    (count as usize).max(1)
}

fn check_finite<T>(values: &[T], what: impl Fn(usize) -> UsageError) -> Result<(), UsageError>
where
    T: std::ops::Index<usize, Output = f64>,
{
    match values
        .iter()
        .position(|v| !(0..3).all(|k| v[k].is_finite()))
    {
        Some(index) => Err(what(index)),
        None => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct IntegratorState {
    masses: Vec<f64>,
    positions: Vec<Point3<f64>>,
    velocities: Vec<Vector3<f64>>,
    /// `None` until the first evaluation.
    forces: Option<Vec<Vector3<f64>>>,
    potential_energy: Option<f64>,
    next_positions: Vec<Point3<f64>>,
    next_velocities: Vec<Vector3<f64>>,
    max_step: f64,
    thermal: ThermalVelocityInitializer,
}

impl IntegratorState {
    /// Creates a cold state.
    ///
    /// # Errors
    ///
    /// [`UsageError::LengthMismatch`] if the three arrays differ in length,
    /// [`UsageError::InvalidMass`] for a negative or non-finite mass and
    /// [`UsageError::NonFinitePosition`] for a non-finite position or velocity.
    pub fn new(
        masses: Vec<f64>,
        positions: Vec<Point3<f64>>,
        velocities: Vec<Vector3<f64>>,
        config: &IntegratorConfig,
    ) -> Result<Self, UsageError> {
        let n = masses.len();
        for (what, found) in [("positions", positions.len()), ("velocities", velocities.len())] {
            if found != n {
                return Err(UsageError::LengthMismatch {
                    what,
                    expected: n,
                    found,
                });
            }
        }
        if let Some((index, &mass)) = masses
            .iter()
            .enumerate()
            .find(|(_, m)| !m.is_finite() || **m < 0.0)
        {
            return Err(UsageError::InvalidMass { index, mass });
        }
        check_finite(&positions, UsageError::NonFinitePosition)?;
        check_finite(&velocities, UsageError::NonFinitePosition)?;
        if !(config.max_step.is_finite() && config.max_step > 0.0) {
            return Err(UsageError::InvalidStepSize(config.max_step));
        }

        Ok(Self {
            next_positions: positions.clone(),
            next_velocities: velocities.clone(),
            masses,
            positions,
            velocities,
            forces: None,
            potential_energy: None,
            max_step: config.max_step,
            thermal: ThermalVelocityInitializer::with_boltzmann(config.boltzmann),
        })
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vector3<f64>] {
        &self.velocities
    }

    /// Forces at the current positions, once they have been evaluated.
    pub fn forces(&self) -> Option<&[Vector3<f64>]> {
        self.forces.as_deref()
    }

    pub fn potential_energy(&self) -> Option<f64> {
        self.potential_energy
    }

    pub fn is_warm(&self) -> bool {
        self.forces.is_some()
    }

    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    pub fn kinetic_energy(&self) -> f64 {
        kinetic_energy_of(&self.velocities, &self.masses)
    }

    pub fn temperature(&self) -> f64 {
        self.thermal.temperature_of(&self.velocities, &self.masses)
    }

    /// Rescales the velocities of mobile atoms to exactly `temperature`.
    pub fn thermostat(&mut self, temperature: f64) -> Result<(), EngineError> {
        self.thermal
            .rescale_to_temperature(&mut self.velocities, &self.masses, temperature)
    }

    /// Advances the state by `duration`, split into equal sub-steps of at most `max_step`.
    ///
    /// A zero duration does nothing. If a sub-step fails the state keeps the result of the
    /// last successful sub-step.
    ///
    /// # Errors
    ///
    /// [`UsageError::InvalidDuration`] for negative or non-finite durations, plus any
    /// error from [`step`](Self::step).
    pub fn simulate<E: Evaluator + ?Sized>(
        &mut self,
        duration: f64,
        evaluator: &mut E,
    ) -> Result<SimulationReport, EngineError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(UsageError::InvalidDuration(duration).into());
        }
        if duration == 0.0 {
            return Ok(SimulationReport {
                steps: 0,
                step_size: 0.0,
                diagnostics: None,
            });
        }

        let steps = sub_step_count(duration, self.max_step);
        let step_size = duration / steps as f64;
        debug!(duration, steps, step_size, "Simulating.");

        let mut diagnostics = None;
        for _ in 0..steps {
            diagnostics = Some(self.step(step_size, evaluator)?);
        }
        Ok(SimulationReport {
            steps,
            step_size,
            diagnostics,
        })
    }

    /// One velocity-Verlet step of size `dt`.
    ///
    /// Anchors (mass `0`) keep their position and velocity but are still passed to the
    /// evaluator.
    pub fn step<E: Evaluator + ?Sized>(
        &mut self,
        dt: f64,
        evaluator: &mut E,
    ) -> Result<StepDiagnostics, EngineError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(UsageError::InvalidStepSize(dt).into());
        }

        let forces = match self.forces.take() {
            Some(forces) => forces,
            None => {
                trace!("Cold start; evaluating initial forces.");
                let seed = evaluate_checked(evaluator, &self.positions)?;
                self.potential_energy = Some(seed.energy);
                seed.forces
            }
        };

        let half = 0.5 * dt;
        for i in 0..self.masses.len() {
            let m = self.masses[i];
            if m > 0.0 {
                self.next_velocities[i] = self.velocities[i] + forces[i] * (half / m);
                self.next_positions[i] = self.positions[i] + self.next_velocities[i] * dt;
            } else {
                self.next_velocities[i] = self.velocities[i];
                self.next_positions[i] = self.positions[i];
            }
        }

        let result = match evaluate_checked(evaluator, &self.next_positions) {
            Ok(result) => result,
            Err(e) => {
                self.forces = Some(forces);
                return Err(e);
            }
        };

        for i in 0..self.masses.len() {
            let m = self.masses[i];
            if m > 0.0 {
                self.next_velocities[i] += result.forces[i] * (half / m);
            }
        }
        std::mem::swap(&mut self.positions, &mut self.next_positions);
        std::mem::swap(&mut self.velocities, &mut self.next_velocities);

        let diagnostics = StepDiagnostics {
            potential_energy: result.energy,
            kinetic_energy: self.kinetic_energy(),
            temperature: self.temperature(),
            max_force: max_mobile_force(&result.forces, &self.masses),
        };
        self.potential_energy = Some(result.energy);
        self.forces = Some(result.forces);
        trace!(?diagnostics, "Step complete.");
        Ok(diagnostics)
    }
}
