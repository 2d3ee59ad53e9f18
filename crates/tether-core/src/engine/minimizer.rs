use super::config::MinimizerConfig;
use super::error::EngineError;
use super::evaluation::{evaluate_checked, max_mobile_force};
use super::progress::{Progress, ProgressReporter};
use crate::core::evaluator::Evaluator;
use crate::core::models::fixture::Fixture;
use crate::core::models::trajectory::{Frame, Trajectory};
use nalgebra::{Point3, Vector3};
use tracing::{debug, info, instrument, trace};

/// Adaptive state of the FIRE scheme between iterations.
#[derive(Debug, Clone, Copy)]
struct FireState {
    dt: f64,
    alpha: f64,
    downhill_steps: usize,
}

/// Relaxes a fixture to a local energy minimum with FIRE, keeping its constraint group
/// symmetric and its anchors in place.
#[derive(Debug, Clone)]
pub struct ConstrainedMinimizer {
    config: MinimizerConfig,
}

impl ConstrainedMinimizer {
    pub fn new(config: MinimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MinimizerConfig {
        &self.config
    }

    /// Runs the relaxation and returns every intermediate geometry.
    ///
    /// The first frame is the fixture's input geometry and one frame is appended per FIRE
    /// step, so the last frame is the geometry at which the force criterion was met. Every
    /// frame after the first has the constrained axis component identical across the group.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Convergence`] when the iteration budget runs out.
    /// - [`EngineError::Evaluator`] or [`EngineError::NonFinite`] for bad evaluator output.
    #[instrument(skip_all, name = "minimize", fields(atoms = fixture.system().len()))]
    pub fn minimize<E: Evaluator + ?Sized>(
        &self,
        fixture: &Fixture,
        evaluator: &mut E,
        reporter: &ProgressReporter,
    ) -> Result<Trajectory, EngineError> {
        let system = fixture.system();
        let masses = system.masses();
        let template = system.atoms();
        let constraint = fixture.constraint();
        let fire = &self.config.fire;

        let mut positions = system.positions();
        let mut velocities = vec![Vector3::zeros(); positions.len()];
        let mut frames = vec![system.to_frame()];
        let mut state = FireState {
            dt: self.config.timestep,
            alpha: fire.alpha_start,
            downhill_steps: 0,
        };

        info!(
            tolerance = self.config.force_tolerance,
            max_iterations = self.config.max_iterations,
            "Starting constrained relaxation."
        );
        reporter.report(Progress::TaskStart {
            total_steps: self.config.max_iterations as u64,
        });

        let mut max_force = f64::INFINITY;
        for iteration in 0..self.config.max_iterations {
            let mut forces = evaluate_checked(evaluator, &positions)?.forces;
            if let Some(group) = constraint {
                group.symmetrize(&mut forces);
            }

            max_force = max_mobile_force(&forces, masses);
            reporter.report(Progress::Relaxation {
                iteration,
                max_force,
            });
            reporter.report(Progress::TaskIncrement);

            if max_force < self.config.force_tolerance {
                reporter.report(Progress::TaskFinish);
                info!(iterations = iteration, max_force, "Relaxation converged.");
                return Ok(Trajectory::new(frames)?);
            }

            self.fire_step(&mut state, &mut positions, &mut velocities, &forces, masses);
            if let Some(group) = constraint {
                group.symmetrize(&mut positions);
            }
            frames.push(Frame::from_positions(template, &positions));

            debug!(
                iteration,
                max_force,
                dt = state.dt,
                alpha = state.alpha,
                "Relaxation step."
            );
        }

        reporter.report(Progress::TaskFinish);
        Err(EngineError::Convergence {
            iterations: self.config.max_iterations,
            max_force,
        })
    }

    /// One mass-weighted semi-implicit Euler step with FIRE velocity mixing.
    fn fire_step(
        &self,
        state: &mut FireState,
        positions: &mut [Point3<f64>],
        velocities: &mut [Vector3<f64>],
        forces: &[Vector3<f64>],
        masses: &[f64],
    ) {
        let fire = &self.config.fire;
        let mobile = |i: usize| masses[i] > 0.0;

        for (i, v) in velocities.iter_mut().enumerate() {
            if mobile(i) {
                *v += forces[i] * (state.dt / masses[i]);
            }
        }

        let (mut power, mut v_norm_sq, mut f_norm_sq) = (0.0, 0.0, 0.0);
        for i in (0..masses.len()).filter(|&i| mobile(i)) {
            power += forces[i].dot(&velocities[i]);
            v_norm_sq += velocities[i].norm_squared();
            f_norm_sq += forces[i].norm_squared();
        }

        if power > 0.0 {
            let ratio = if f_norm_sq > 0.0 {
                (v_norm_sq / f_norm_sq).sqrt()
            } else {
                0.0
            };
            for (i, v) in velocities.iter_mut().enumerate() {
                if mobile(i) {
                    *v = *v * (1.0 - state.alpha) + forces[i] * (state.alpha * ratio);
                }
            }
            state.downhill_steps += 1;
            if state.downhill_steps > fire.n_min {
                state.dt = (state.dt * fire.f_inc).min(self.config.max_timestep);
                state.alpha *= fire.f_alpha;
            }
        } else {
            trace!(power, "Uphill step; resetting FIRE velocities.");
            velocities.iter_mut().for_each(|v| *v = Vector3::zeros());
            state.dt *= fire.f_dec;
            state.alpha = fire.alpha_start;
            state.downhill_steps = 0;
        }

        let mut scale = 1.0;
        if let Some(limit) = self.config.max_displacement {
            let longest = velocities
                .iter()
                .enumerate()
                .filter(|&(i, _)| mobile(i))
                .map(|(_, v)| v.norm() * state.dt)
                .fold(0.0, f64::max);
            if longest > limit {
                scale = limit / longest;
            }
        }

        for (i, position) in positions.iter_mut().enumerate() {
            if mobile(i) {
                *position += velocities[i] * (state.dt * scale);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::evaluator::reference::{Spring, SpringNetwork, ZeroForce};
    use crate::core::evaluator::{EvaluatorError, Singlepoint};
    use crate::core::models::atom::Atom;
    use crate::core::models::constraint::{Axis, ConstraintGroup};
    use crate::core::models::element::Element;
    use crate::core::models::system::ParticleSystem;
    use crate::engine::config::MinimizerConfigBuilder;
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    fn config() -> MinimizerConfig {
        MinimizerConfigBuilder::new()
            .force_tolerance(1e-6)
            .timestep(0.05)
            .max_timestep(0.5)
            .build()
            .unwrap()
    }

    fn dimer(separation: f64) -> Fixture {
        let atoms = vec![
            Atom::new(Element::CARBON, Point3::new(0.0, 0.0, 0.0)),
            Atom::new(Element::CARBON, Point3::new(separation, 0.0, 0.0)),
        ];
        Fixture::free(ParticleSystem::new(atoms, vec![1.0, 1.0]).unwrap())
    }

    fn bond(i: usize, j: usize) -> Spring {
        Spring {
            i,
            j,
            stiffness: 1.0,
            rest_length: 1.0,
        }
    }

    fn distance(frame: &Frame, i: usize, j: usize) -> f64 {
        (frame.atoms[i].position - frame.atoms[j].position).norm()
    }

    /// Two surface atoms bonded to an anchored atom below them, with the pair held at the
    /// same height.
    fn tripod() -> Fixture {
        let atoms = vec![
            Atom::new(Element::SILICON, Point3::new(0.0, 0.0, 0.0)),
            Atom::new(Element::CARBON, Point3::new(-0.7, 0.0, 0.9)),
            Atom::new(Element::CARBON, Point3::new(0.8, 0.1, 0.6)),
        ];
        let system = ParticleSystem::new(atoms, vec![28.0, 12.0, 12.0]).unwrap();
        let group = ConstraintGroup::new(Axis::Z, vec![1, 2]).unwrap();
        Fixture::new(system, [0], Some(group)).unwrap()
    }

    fn tripod_springs() -> SpringNetwork {
        SpringNetwork::new(vec![bond(0, 1), bond(0, 2), bond(1, 2)])
    }

    #[test]
    fn stretched_dimer_relaxes_to_rest_length() {
        let mut springs = SpringNetwork::new(vec![bond(0, 1)]);
        let trajectory = ConstrainedMinimizer::new(config())
            .minimize(&dimer(1.5), &mut springs, &ProgressReporter::new())
            .unwrap();

        assert!(trajectory.len() > 1);
        assert_eq!(trajectory.first(), &dimer(1.5).system().to_frame());
        assert_relative_eq!(distance(trajectory.last(), 0, 1), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn converged_input_yields_a_single_frame() {
        let trajectory = ConstrainedMinimizer::new(config())
            .minimize(&dimer(1.0), &mut ZeroForce, &ProgressReporter::new())
            .unwrap();
        assert_eq!(trajectory.len(), 1);
    }

    #[test]
    fn relaxation_is_deterministic() {
        let minimizer = ConstrainedMinimizer::new(config());
        let a = minimizer
            .minimize(&tripod(), &mut tripod_springs(), &ProgressReporter::new())
            .unwrap();
        let b = minimizer
            .minimize(&tripod(), &mut tripod_springs(), &ProgressReporter::new())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn constraint_holds_after_every_step_and_anchor_stays_put() {
        let fixture = tripod();
        let group = fixture.constraint().unwrap().clone();
        let trajectory = ConstrainedMinimizer::new(config())
            .minimize(&fixture, &mut tripod_springs(), &ProgressReporter::new())
            .unwrap();

        for frame in &trajectory.frames()[1..] {
            assert_eq!(group.spread(&frame.positions()), 0.0);
            assert_eq!(frame.atoms[0].position, Point3::origin());
        }
        let last = trajectory.last();
        assert_relative_eq!(distance(last, 0, 1), 1.0, epsilon = 1e-4);
        assert_relative_eq!(distance(last, 1, 2), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn displacement_cap_limits_each_step() {
        let config = MinimizerConfigBuilder::new()
            .force_tolerance(1e-6)
            .timestep(0.05)
            .max_timestep(0.5)
            .max_displacement(0.01)
            .build()
            .unwrap();
        let mut springs = SpringNetwork::new(vec![bond(0, 1)]);
        let trajectory = ConstrainedMinimizer::new(config)
            .minimize(&dimer(1.5), &mut springs, &ProgressReporter::new())
            .unwrap();

        for pair in trajectory.frames().windows(2) {
            for (a, b) in pair[0].atoms.iter().zip(&pair[1].atoms) {
                assert!((b.position - a.position).norm() <= 0.01 + 1e-12);
            }
        }
    }

    #[test]
    fn exhausted_budget_reports_last_force() {
        let config = MinimizerConfigBuilder::new()
            .force_tolerance(1e-9)
            .timestep(0.01)
            .max_iterations(3)
            .build()
            .unwrap();
        let mut springs = SpringNetwork::new(vec![bond(0, 1)]);
        let result = ConstrainedMinimizer::new(config).minimize(
            &dimer(2.0),
            &mut springs,
            &ProgressReporter::new(),
        );
        match result {
            Err(EngineError::Convergence {
                iterations,
                max_force,
            }) => {
                assert_eq!(iterations, 3);
                assert!(max_force > 1e-9);
            }
            other => panic!("expected a convergence failure, got {:?}", other),
        }
    }

    #[test]
    fn non_finite_forces_are_rejected() {
        let mut eval = |positions: &[Point3<f64>]| {
            let mut sp = Singlepoint::zeros(positions.len());
            sp.forces[1].y = f64::NAN;
            Ok::<_, EvaluatorError>(sp)
        };
        let result = ConstrainedMinimizer::new(config()).minimize(
            &dimer(1.5),
            &mut eval,
            &ProgressReporter::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::NonFinite {
                quantity: "force",
                atom: Some(1)
            })
        ));
    }

    #[test]
    fn progress_reports_one_event_per_iteration() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Relaxation { iteration, .. } = event {
                events.lock().unwrap().push(iteration);
            }
        }));
        let mut springs = SpringNetwork::new(vec![bond(0, 1)]);
        let trajectory = ConstrainedMinimizer::new(config())
            .minimize(&dimer(1.5), &mut springs, &reporter)
            .unwrap();
        drop(reporter);

        let seen = events.into_inner().unwrap();
        assert_eq!(seen.len(), trajectory.len());
        assert_eq!(seen, (0..trajectory.len()).collect::<Vec<_>>());
    }
}
