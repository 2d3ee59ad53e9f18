//! # Engine Module
//!
//! The stateful algorithms that turn a fixture and an evaluator into trajectories.
//!
//! ## Overview
//!
//! Everything here is a synchronous, single-threaded state machine. The engine never
//! computes physics itself: forces and energies come from an injected
//! [`Evaluator`](crate::core::evaluator::Evaluator), and every result it returns is
//! validated before it touches any state.
//!
//! ## Architecture
//!
//! - **Relaxation** ([`minimizer`]) - FIRE minimization under a symmetry constraint
//! - **Dynamics** ([`integrator`]) - velocity-Verlet propagation with adaptive sub-stepping
//! - **Thermal** ([`thermal`]) - Maxwell-Boltzmann sampling and exact temperature rescaling
//! - **Caching** ([`cache`]) - content-addressed persistence of relaxation trajectories
//! - **Configuration** ([`config`]) - validated parameter sets and their builders
//! - **Progress Monitoring** ([`progress`]) - callback events for front ends
//! - **Error Handling** ([`error`]) - runtime failures and their recoverability

pub mod cache;
pub mod config;
pub mod error;
pub(crate) mod evaluation;
pub mod integrator;
pub mod minimizer;
pub mod progress;
pub mod thermal;
