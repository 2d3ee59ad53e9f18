use crate::core::error::UsageError;
use crate::core::evaluator::{Evaluator, Fingerprinted};
use crate::core::models::atom::Atom;
use crate::core::models::fixture::Fixture;
use crate::core::models::trajectory::{Frame, Trajectory};
use crate::engine::cache::{CacheKey, TrajectoryCache, TrajectoryStore};
use crate::engine::config::{DynamicsConfig, MinimizerConfig};
use crate::engine::error::EngineError;
use crate::engine::integrator::{IntegratorState, StepDiagnostics};
use crate::engine::minimizer::ConstrainedMinimizer;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::thermal::ThermalVelocityInitializer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Version tag of the relaxation algorithm. Bump it whenever the minimizer can produce a
/// different trajectory for the same inputs, so stale cache entries stop matching.
pub const ALGORITHM_VERSION: &str = "fire-constrained/1";

/// The cache namespace for relaxing `fixture` with a given evaluator and minimizer.
///
/// Besides the atoms (which the key hashes separately) a relaxation depends on the
/// algorithm version, the evaluator, the minimizer settings, the masses (which encode the
/// anchors) and the constraint group. All of them are part of the namespace.
pub fn cache_namespace(
    fixture: &Fixture,
    evaluator_fingerprint: &str,
    minimizer: &MinimizerConfig,
) -> String {
    format!(
        "{}|{}|{:?}|masses={:?}|constraint={:?}",
        ALGORITHM_VERSION,
        evaluator_fingerprint,
        minimizer,
        fixture.system().masses(),
        fixture.constraint(),
    )
}

/// The key under which the relaxation of `fixture` is cached.
pub fn relaxation_key(
    fixture: &Fixture,
    evaluator_fingerprint: &str,
    minimizer: &MinimizerConfig,
) -> CacheKey {
    CacheKey::derive(
        &cache_namespace(fixture, evaluator_fingerprint, minimizer),
        fixture.system().atoms(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Equilibration,
    Production,
}

/// One row of per-frame diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameDiagnostics {
    pub phase: Phase,
    pub frame: usize,
    pub time: f64,
    pub potential_energy: f64,
    pub kinetic_energy: f64,
    pub temperature: f64,
    pub max_force: f64,
}

impl FrameDiagnostics {
    fn new(phase: Phase, frame: usize, time: f64, step: &StepDiagnostics) -> Self {
        Self {
            phase,
            frame,
            time,
            potential_energy: step.potential_energy,
            kinetic_energy: step.kinetic_energy,
            temperature: step.temperature,
            max_force: step.max_force,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DynamicsResult {
    /// The relaxation trajectory, from the input geometry to the relaxed one.
    pub relaxation: Trajectory,
    /// The state after equilibration at its time stamp, followed by every production frame.
    pub frames: Trajectory,
    /// One row per equilibration and production interval, in order.
    pub diagnostics: Vec<FrameDiagnostics>,
}

/// Relaxes a fixture, reusing a cached trajectory when the same relaxation has run before.
#[instrument(skip_all, name = "relax_workflow")]
pub fn relax<E, S>(
    fixture: &Fixture,
    evaluator: &mut E,
    store: &S,
    config: &MinimizerConfig,
    reporter: &ProgressReporter,
) -> Result<Trajectory, EngineError>
where
    E: Fingerprinted + ?Sized,
    S: TrajectoryStore + ?Sized,
{
    reporter.report(Progress::PhaseStart { name: "Relaxation" });
    let namespace = cache_namespace(fixture, &evaluator.fingerprint(), config);
    let cache = TrajectoryCache::new(store, namespace);
    let minimizer = ConstrainedMinimizer::new(config.clone());

    let trajectory = cache.load_or_compute(fixture.system().atoms(), || {
        minimizer.minimize(fixture, evaluator, reporter)
    })?;
    reporter.report(Progress::PhaseFinish);
    Ok(trajectory)
}

/// Relaxes the fixture, draws thermal velocities, equilibrates and records production
/// frames.
///
/// During equilibration the velocities are rescaled to the target temperature after every
/// frame interval; production runs without a thermostat. Frame times start at zero at the
/// relaxed geometry.
#[instrument(skip_all, name = "dynamics_workflow")]
pub fn run<E, S>(
    fixture: &Fixture,
    evaluator: &mut E,
    store: &S,
    config: &DynamicsConfig,
    reporter: &ProgressReporter,
) -> Result<DynamicsResult, EngineError>
where
    E: Fingerprinted + ?Sized,
    S: TrajectoryStore + ?Sized,
{
    // === Phase 1: Relaxation ===
    let relaxation = relax(fixture, evaluator, store, &config.minimizer, reporter)?;
    let template = fixture.system().atoms();
    let masses = fixture.system().masses();

    // === Phase 2: Velocity seeding ===
    reporter.report(Progress::PhaseStart { name: "Seeding" });
    let thermal = ThermalVelocityInitializer::with_boltzmann(config.integrator.boltzmann);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut velocities = thermal.sample_boltzmann(masses, config.temperature, &mut rng)?;
    if config.remove_drift {
        thermal.remove_drift(&mut velocities, masses)?;
    }
    if thermal.kinetic_energy(&velocities, masses)? > 0.0 {
        thermal.rescale_to_temperature(&mut velocities, masses, config.temperature)?;
    } else if config.temperature > 0.0 {
        warn!("No kinetic energy left after seeding; starting from rest.");
    }
    let mut state = IntegratorState::new(
        masses.to_vec(),
        relaxation.last().positions(),
        velocities,
        &config.integrator,
    )?;
    info!(
        seed = config.seed,
        temperature = state.temperature(),
        "Velocities seeded."
    );
    reporter.report(Progress::PhaseFinish);

    let interval = config.frame_interval;
    let mut diagnostics =
        Vec::with_capacity(config.equilibration_frames + config.production_frames);
    let mut elapsed_frames = 0usize;

    // === Phase 3: Equilibration ===
    if config.equilibration_frames > 0 {
        reporter.report(Progress::PhaseStart {
            name: "Equilibration",
        });
        reporter.report(Progress::TaskStart {
            total_steps: config.equilibration_frames as u64,
        });
        for index in 0..config.equilibration_frames {
            let step = advance(&mut state, interval, evaluator)?;
            elapsed_frames += 1;
            diagnostics.push(FrameDiagnostics::new(
                Phase::Equilibration,
                index,
                elapsed_frames as f64 * interval,
                &step,
            ));
            state.thermostat(config.temperature)?;
            reporter.report(Progress::Frame {
                index,
                temperature: step.temperature,
            });
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);
        info!(
            frames = config.equilibration_frames,
            "Equilibration complete."
        );
    }

    // === Phase 4: Production ===
    reporter.report(Progress::PhaseStart { name: "Production" });
    reporter.report(Progress::TaskStart {
        total_steps: config.production_frames as u64,
    });
    let mut frames = Vec::with_capacity(config.production_frames + 1);
    frames.push(timed_frame(&state, template, elapsed_frames as f64 * interval));
    for index in 0..config.production_frames {
        let step = advance(&mut state, interval, evaluator)?;
        elapsed_frames += 1;
        let time = elapsed_frames as f64 * interval;
        diagnostics.push(FrameDiagnostics::new(Phase::Production, index, time, &step));
        frames.push(timed_frame(&state, template, time));
        reporter.report(Progress::Frame {
            index,
            temperature: step.temperature,
        });
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    info!(frames = config.production_frames, "Production complete.");

    Ok(DynamicsResult {
        relaxation,
        frames: Trajectory::new(frames)?,
        diagnostics,
    })
}

fn advance<E: Evaluator + ?Sized>(
    state: &mut IntegratorState,
    interval: f64,
    evaluator: &mut E,
) -> Result<StepDiagnostics, EngineError> {
    let report = state.simulate(interval, evaluator)?;
    // Only a zero interval takes no step.
    Ok(report
        .diagnostics
        .ok_or(UsageError::InvalidDuration(interval))?)
}

fn timed_frame(state: &IntegratorState, template: &[Atom], time: f64) -> Frame {
    let frame = Frame::from_positions(template, state.positions());
    Frame::at_time(frame.atoms, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::evaluator::Named;
    use crate::core::evaluator::reference::{Spring, SpringNetwork, ZeroForce};
    use crate::core::models::constraint::{Axis, ConstraintGroup};
    use crate::core::models::element::Element;
    use crate::core::models::system::ParticleSystem;
    use crate::engine::cache::MemoryStore;
    use crate::engine::config::{
        DynamicsConfigBuilder, IntegratorConfig, MinimizerConfigBuilder,
    };
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use std::cell::Cell;

    fn triangle() -> Fixture {
        let atoms = vec![
            Atom::new(Element::CARBON, Point3::new(0.0, 0.0, 0.0)),
            Atom::new(Element::CARBON, Point3::new(1.3, 0.0, 0.0)),
            Atom::new(Element::CARBON, Point3::new(0.4, 0.8, 0.0)),
        ];
        let system = ParticleSystem::new(atoms, vec![1.0, 1.0, 1.0]).unwrap();
        Fixture::new(system, [0], None).unwrap()
    }

    fn springs() -> SpringNetwork {
        let bond = |i, j| Spring {
            i,
            j,
            stiffness: 1.0,
            rest_length: 1.0,
        };
        SpringNetwork::new(vec![bond(0, 1), bond(1, 2), bond(0, 2)])
    }

    fn minimizer() -> MinimizerConfig {
        MinimizerConfigBuilder::new()
            .force_tolerance(1e-6)
            .timestep(0.05)
            .max_timestep(0.5)
            .build()
            .unwrap()
    }

    fn dynamics(equilibration: usize, production: usize) -> DynamicsConfig {
        DynamicsConfigBuilder::new()
            .minimizer(minimizer())
            .integrator(IntegratorConfig::new(0.01).unwrap().with_boltzmann(1.0).unwrap())
            .temperature(0.05)
            .equilibration_frames(equilibration)
            .production_frames(production)
            .frame_interval(0.1)
            .seed(7)
            .build()
            .unwrap()
    }

    #[test]
    fn namespace_changes_with_every_relaxation_input() {
        let fixture = triangle();
        let base = cache_namespace(&fixture, "springs", &minimizer());

        assert_ne!(base, cache_namespace(&fixture, "other", &minimizer()));

        let looser = MinimizerConfigBuilder::new()
            .force_tolerance(1e-3)
            .timestep(0.05)
            .max_timestep(0.5)
            .build()
            .unwrap();
        assert_ne!(base, cache_namespace(&fixture, "springs", &looser));

        let unanchored = Fixture::free(fixture.system().clone());
        assert_ne!(base, cache_namespace(&unanchored, "springs", &minimizer()));

        let group = ConstraintGroup::new(Axis::Y, vec![1, 2]).unwrap();
        let constrained = Fixture::new(fixture.system().clone(), [0], Some(group)).unwrap();
        assert_ne!(base, cache_namespace(&constrained, "springs", &minimizer()));
    }

    #[test]
    fn relax_uses_the_cache_on_second_call() {
        let store = MemoryStore::new();
        let calls = Cell::new(0);
        let mut network = springs();
        let fingerprint = network.fingerprint();
        let mut counting = Named::new(fingerprint, |positions: &[Point3<f64>]| {
            calls.set(calls.get() + 1);
            network.evaluate(positions)
        });

        let first = relax(
            &triangle(),
            &mut counting,
            &store,
            &minimizer(),
            &ProgressReporter::new(),
        )
        .unwrap();
        let after_first = calls.get();
        let second = relax(
            &triangle(),
            &mut counting,
            &store,
            &minimizer(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert!(after_first > 0);
        assert_eq!(calls.get(), after_first);
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn differently_named_closures_do_not_share_a_relaxation() {
        let store = MemoryStore::new();
        let fixture = Fixture::free(triangle().system().clone());
        let dimer_spring = |rest_length| {
            let mut network = SpringNetwork::new(vec![Spring {
                i: 0,
                j: 1,
                stiffness: 1.0,
                rest_length,
            }]);
            move |positions: &[Point3<f64>]| network.evaluate(positions)
        };
        let bond_length = |trajectory: &Trajectory| {
            let p = trajectory.last().positions();
            (p[1] - p[0]).norm()
        };

        let short = relax(
            &fixture,
            &mut Named::new("dimer r0=1.0", dimer_spring(1.0)),
            &store,
            &minimizer(),
            &ProgressReporter::new(),
        )
        .unwrap();
        let long = relax(
            &fixture,
            &mut Named::new("dimer r0=2.0", dimer_spring(2.0)),
            &store,
            &minimizer(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(store.len(), 2);
        assert_relative_eq!(bond_length(&short), 1.0, epsilon = 1e-4);
        assert_relative_eq!(bond_length(&long), 2.0, epsilon = 1e-4);
    }

    #[test]
    fn run_produces_timed_frames_and_diagnostics() {
        let store = MemoryStore::new();
        let result = run(
            &triangle(),
            &mut springs(),
            &store,
            &dynamics(3, 5),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(result.frames.len(), 6);
        assert_eq!(result.diagnostics.len(), 8);
        assert_relative_eq!(result.frames.first().time.unwrap(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(result.frames.last().time.unwrap(), 0.8, epsilon = 1e-12);
        assert_eq!(result.diagnostics[2].phase, Phase::Equilibration);
        assert_eq!(result.diagnostics[3].phase, Phase::Production);
        assert_eq!(result.diagnostics[3].frame, 0);

        for frame in result.frames.frames() {
            assert_eq!(frame.atoms[0].position, Point3::origin());
        }
        assert_eq!(
            result.frames.first().positions(),
            result.relaxation.last().positions()
        );
    }

    #[test]
    fn run_is_reproducible_for_a_seed() {
        let a = run(
            &triangle(),
            &mut springs(),
            &MemoryStore::new(),
            &dynamics(2, 4),
            &ProgressReporter::new(),
        )
        .unwrap();
        let b = run(
            &triangle(),
            &mut springs(),
            &MemoryStore::new(),
            &dynamics(2, 4),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(a.frames, b.frames);
        assert_eq!(a.diagnostics, b.diagnostics);
    }

    #[test]
    fn zero_temperature_without_forces_stays_still() {
        let config = DynamicsConfigBuilder::new()
            .minimizer(minimizer())
            .integrator(IntegratorConfig::new(0.01).unwrap())
            .temperature(0.0)
            .production_frames(3)
            .frame_interval(0.05)
            .build()
            .unwrap();
        let result = run(
            &triangle(),
            &mut ZeroForce,
            &MemoryStore::new(),
            &config,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(result.relaxation.len(), 1);
        for frame in result.frames.frames() {
            assert_eq!(frame.positions(), triangle().system().positions());
        }
        assert!(result.diagnostics.iter().all(|d| d.temperature == 0.0));
    }
}
