//! Small analytic evaluators for tests, examples and the command-line demo.
//!
//! These are not force fields. They give the engine something cheap and exactly
//! solvable to drive: a potential that is identically zero and a network of harmonic
//! springs with optional harmonic tethers to fixed points.

use super::{Evaluator, EvaluatorError, Fingerprinted, Singlepoint};
use nalgebra::{Point3, Vector3};
use serde::Deserialize;

/// Zero force and zero energy everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroForce;

impl Evaluator for ZeroForce {
    fn evaluate(&mut self, positions: &[Point3<f64>]) -> Result<Singlepoint, EvaluatorError> {
        Ok(Singlepoint::zeros(positions.len()))
    }
}

impl Fingerprinted for ZeroForce {
    fn fingerprint(&self) -> String {
        String::from("zero-force")
    }
}

/// A harmonic bond `E = k/2 (|r_i - r_j| - r0)^2`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Spring {
    pub i: usize,
    pub j: usize,
    pub stiffness: f64,
    #[serde(rename = "rest-length")]
    pub rest_length: f64,
}

/// A harmonic restraint `E = k/2 |r_i - target|^2`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tether {
    pub index: usize,
    pub stiffness: f64,
    pub target: [f64; 3],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpringNetwork {
    springs: Vec<Spring>,
    tethers: Vec<Tether>,
}

impl SpringNetwork {
    pub fn new(springs: Vec<Spring>) -> Self {
        Self {
            springs,
            tethers: Vec::new(),
        }
    }

    pub fn with_tethers(mut self, tethers: Vec<Tether>) -> Self {
        self.tethers = tethers;
        self
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    fn check_index(index: usize, len: usize) -> Result<(), EvaluatorError> {
        if index < len {
            Ok(())
        } else {
            Err(EvaluatorError::Backend(format!(
                "spring network references atom {} but only {} positions were given",
                index, len
            )))
        }
    }
}

impl Evaluator for SpringNetwork {
    fn evaluate(&mut self, positions: &[Point3<f64>]) -> Result<Singlepoint, EvaluatorError> {
        let n = positions.len();
        let mut forces = vec![Vector3::zeros(); n];
        let mut energy = 0.0;

        for spring in &self.springs {
            Self::check_index(spring.i, n)?;
            Self::check_index(spring.j, n)?;
            let delta = positions[spring.i] - positions[spring.j];
            let r = delta.norm();
            let stretch = r - spring.rest_length;
            energy += 0.5 * spring.stiffness * stretch * stretch;
            // Coincident atoms have no defined bond direction.
            if r > 0.0 {
                let f = delta * (-spring.stiffness * stretch / r);
                forces[spring.i] += f;
                forces[spring.j] -= f;
            }
        }

        for tether in &self.tethers {
            Self::check_index(tether.index, n)?;
            let target = Point3::from(tether.target);
            let delta = positions[tether.index] - target;
            energy += 0.5 * tether.stiffness * delta.norm_squared();
            forces[tether.index] -= delta * tether.stiffness;
        }

        Ok(Singlepoint { forces, energy })
    }
}

impl Fingerprinted for SpringNetwork {
    fn fingerprint(&self) -> String {
        format!("spring-network:{:?}:{:?}", self.springs, self.tethers)
    }
}
