//! # Tether Core Library
//!
//! Constrained relaxation, trajectory caching and velocity-Verlet dynamics for small
//! atomic systems driven by an external force and energy evaluator.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ParticleSystem`, `Fixture`,
//!   `Trajectory`), the `Evaluator` seam with reference potentials, and I/O utilities for
//!   the binary trajectory codec, fixture files, XYZ frames and CSV diagnostics.
//!
//! - **[`engine`]: The Logic Core.** The algorithms: the FIRE `ConstrainedMinimizer`, the
//!   velocity-Verlet `IntegratorState`, the `ThermalVelocityInitializer` and the
//!   content-addressed `TrajectoryCache`.
//!
//! - **[`workflows`]: The Public API.** Complete procedures that tie the layers together:
//!   relax a fixture through the cache, seed velocities, equilibrate and record production
//!   frames.

pub mod core;
pub mod engine;
pub mod workflows;
