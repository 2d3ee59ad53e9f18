//! # Core Module
//!
//! Stateless foundations shared by the engine and the workflows.
//!
//! - **Errors** ([`error`]) - the usage-error class returned by validated constructors
//! - **Units** ([`units`]) - constants for the default ps / nm / yg / zJ unit system
//! - **Models** ([`models`]) - elements, atoms, particle systems, fixtures, trajectories
//! - **Evaluators** ([`evaluator`]) - the injected force/energy capability and reference potentials
//! - **I/O** ([`io`]) - binary trajectory codec, fixture files, XYZ and CSV output

pub mod error;
pub mod evaluator;
pub mod io;
pub mod models;
pub mod units;
