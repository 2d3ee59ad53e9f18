//! The single-point evaluator seam.
//!
//! The engine never computes physics itself. Both the minimizer and the integrator ask an
//! [`Evaluator`] for forces and the potential energy at a set of positions, and treat it as
//! stateless. Anything implementing `FnMut(&[Point3<f64>]) -> Result<Singlepoint, EvaluatorError>`
//! is an evaluator, which keeps tests and ad-hoc potentials cheap to write.
//!
//! Cached workflows additionally need a [`Fingerprinted`] evaluator. A closure has no
//! identity of its own, so it has to be wrapped in [`Named`] before its relaxations can
//! be cached.

pub mod reference;

use nalgebra::{Point3, Vector3};
use thiserror::Error;

/// Forces and potential energy at one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Singlepoint {
    /// One force vector per atom, in input order.
    pub forces: Vec<Vector3<f64>>,
    /// Potential energy of the configuration.
    pub energy: f64,
}

impl Singlepoint {
    pub fn new(forces: Vec<Vector3<f64>>, energy: f64) -> Self {
        Self { forces, energy }
    }

    /// A zero-force, zero-energy result for `n` atoms.
    pub fn zeros(n: usize) -> Self {
        Self {
            forces: vec![Vector3::zeros(); n],
            energy: 0.0,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluatorError {
    #[error("Evaluator backend failed: {0}")]
    Backend(String),

    #[error("Evaluator returned {found} forces for {expected} atoms")]
    ForceCount { expected: usize, found: usize },
}

/// Computes forces and energy for a configuration.
pub trait Evaluator {
    /// Evaluates the configuration. `positions` is ordered like the particle system.
    fn evaluate(&mut self, positions: &[Point3<f64>]) -> Result<Singlepoint, EvaluatorError>;
}

/// An evaluator that can describe itself.
pub trait Fingerprinted: Evaluator {
    /// A stable description of the evaluator and its parameters.
    ///
    /// It becomes part of the trajectory cache namespace, so two evaluators that can produce
    /// different forces for the same positions must return different fingerprints.
    fn fingerprint(&self) -> String;
}

impl<F> Evaluator for F
where
    F: FnMut(&[Point3<f64>]) -> Result<Singlepoint, EvaluatorError>,
{
    fn evaluate(&mut self, positions: &[Point3<f64>]) -> Result<Singlepoint, EvaluatorError> {
        self(positions)
    }
}

/// Attaches a caller-chosen fingerprint to an evaluator, typically a closure.
#[derive(Debug, Clone)]
pub struct Named<E> {
    fingerprint: String,
    inner: E,
}

impl<E: Evaluator> Named<E> {
    pub fn new(fingerprint: impl Into<String>, inner: E) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            inner,
        }
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Evaluator> Evaluator for Named<E> {
    fn evaluate(&mut self, positions: &[Point3<f64>]) -> Result<Singlepoint, EvaluatorError> {
        self.inner.evaluate(positions)
    }
}

impl<E: Evaluator> Fingerprinted for Named<E> {
    fn fingerprint(&self) -> String {
        self.fingerprint.clone()
    }
}
