use super::atom::Atom;
use super::trajectory::Frame;
use crate::core::error::UsageError;
use crate::core::units::daltons_to_yoctograms;
use nalgebra::Point3;

/// An ordered collection of atoms with a parallel mass array.
///
/// The index of an atom is its identity: masses, positions, velocities, forces and
/// constraint index sets all refer to atoms by position in this list. The two arrays are
/// only ever created together through [`ParticleSystem::new`], which rejects mismatched
/// lengths, and neither can be reordered or resized afterwards.
///
/// A mass of exactly `0.0` marks an anchor: the atom is evaluated by the force provider but
/// never moves.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystem {
    atoms: Vec<Atom>,
    masses: Vec<f64>,
}

impl ParticleSystem {
    /// Creates a system from atoms and their masses.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::LengthMismatch`] if the arrays differ in length,
    /// [`UsageError::InvalidMass`] for negative or non-finite masses and
    /// [`UsageError::NonFinitePosition`] for atoms with non-finite coordinates.
    pub fn new(atoms: Vec<Atom>, masses: Vec<f64>) -> Result<Self, UsageError> {
        if atoms.len() != masses.len() {
            return Err(UsageError::LengthMismatch {
                what: "masses",
                expected: atoms.len(),
                found: masses.len(),
            });
        }
        if let Some((index, &mass)) = masses
            .iter()
            .enumerate()
            .find(|(_, m)| !m.is_finite() || **m < 0.0)
        {
            return Err(UsageError::InvalidMass { index, mass });
        }
        if let Some(index) = atoms.iter().position(|a| !a.is_finite()) {
            return Err(UsageError::NonFinitePosition(index));
        }
        Ok(Self { atoms, masses })
    }

    /// Creates a system where each atom carries the standard mass of its element, in yoctograms.
    pub fn with_standard_masses(atoms: Vec<Atom>) -> Result<Self, UsageError> {
        let masses = atoms
            .iter()
            .map(|a| daltons_to_yoctograms(a.element.standard_mass()))
            .collect();
        Self::new(atoms, masses)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    #[inline]
    pub fn is_anchor(&self, index: usize) -> bool {
        self.masses.get(index).is_some_and(|&m| m == 0.0)
    }

    pub fn mobile_count(&self) -> usize {
        self.masses.iter().filter(|&&m| m > 0.0).count()
    }

    /// Overwrites every atom position, keeping element identity and order.
    pub fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), UsageError> {
        if positions.len() != self.atoms.len() {
            return Err(UsageError::LengthMismatch {
                what: "positions",
                expected: self.atoms.len(),
                found: positions.len(),
            });
        }
        if let Some(index) = positions
            .iter()
            .position(|p| !p.coords.iter().all(|c| c.is_finite()))
        {
            return Err(UsageError::NonFinitePosition(index));
        }
        for (atom, position) in self.atoms.iter_mut().zip(positions) {
            atom.position = *position;
        }
        Ok(())
    }

    /// Marks an atom as an anchor by zeroing its mass.
    pub(crate) fn anchor(&mut self, index: usize) -> Result<(), UsageError> {
        let len = self.masses.len();
        let mass = self
            .masses
            .get_mut(index)
            .ok_or(UsageError::IndexOutOfRange { index, len })?;
        *mass = 0.0;
        Ok(())
    }

    pub fn to_frame(&self) -> Frame {
        Frame::new(self.atoms.clone())
    }
}
