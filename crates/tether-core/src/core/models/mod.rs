//! Data structures describing the atoms being simulated and the results produced.
//!
//! - [`element`] - chemical identity and standard masses
//! - [`atom`] - element + position records
//! - [`system`] - the ordered particle list with its parallel mass array
//! - [`constraint`] - axis-symmetry constraint groups
//! - [`fixture`] - a system plus anchors and constraint, validated together
//! - [`trajectory`] - frames and trajectories

pub mod atom;
pub mod constraint;
pub mod element;
pub mod fixture;
pub mod system;
pub mod trajectory;
