//! # Workflows Module
//!
//! High-level entry points that run a complete procedure from a fixture to results.
//!
//! - **Dynamics Workflow** ([`dynamics`]) - cached relaxation followed by thermostatted
//!   equilibration and production dynamics.

pub mod dynamics;
