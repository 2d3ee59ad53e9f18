use super::atom::Atom;
use crate::core::error::UsageError;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A snapshot of every atom at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub atoms: Vec<Atom>,
    /// Simulation time of the snapshot, if it belongs to a time series.
    pub time: Option<f64>,
}

impl Frame {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms, time: None }
    }

    pub fn at_time(atoms: Vec<Atom>, time: f64) -> Self {
        Self {
            atoms,
            time: Some(time),
        }
    }

    /// Builds a frame from an element template and a matching list of positions.
    pub fn from_positions(template: &[Atom], positions: &[Point3<f64>]) -> Self {
        debug_assert_eq!(template.len(), positions.len());
        let atoms = template
            .iter()
            .zip(positions)
            .map(|(atom, &position)| Atom::new(atom.element, position))
            .collect();
        Self::new(atoms)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }
}

/// A non-empty, ordered sequence of frames describing one system.
///
/// Every frame has the same atom count and the same element at every index as the first
/// frame. The first frame is the starting geometry and the last is the final state.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    frames: Vec<Frame>,
}

impl Trajectory {
    /// # Errors
    ///
    /// Returns [`UsageError::EmptyTrajectory`] for an empty list and
    /// [`UsageError::InconsistentFrame`] when a frame disagrees with the first one.
    pub fn new(frames: Vec<Frame>) -> Result<Self, UsageError> {
        let first = frames.first().ok_or(UsageError::EmptyTrajectory)?;
        for (index, frame) in frames.iter().enumerate().skip(1) {
            if frame.len() != first.len() {
                return Err(UsageError::InconsistentFrame {
                    frame: index,
                    reason: format!("{} atoms instead of {}", frame.len(), first.len()),
                });
            }
            if let Some(atom) = frame
                .atoms
                .iter()
                .zip(&first.atoms)
                .position(|(a, b)| a.element != b.element)
            {
                return Err(UsageError::InconsistentFrame {
                    frame: index,
                    reason: format!("element of atom {} differs", atom),
                });
            }
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn first(&self) -> &Frame {
        &self.frames[0]
    }

    pub fn last(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}
