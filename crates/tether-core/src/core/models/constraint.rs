use crate::core::error::UsageError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::IndexMut;

/// A Cartesian axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// A set of atoms whose components along one axis are kept equal during minimization.
///
/// Typical use is the feet of a multi-legged fixture: three symmetry-equivalent atoms that
/// must stay at the same height so the relaxed structure does not tilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintGroup {
    axis: Axis,
    indices: Vec<usize>,
}

impl ConstraintGroup {
    /// # Errors
    ///
    /// Returns [`UsageError::EmptyConstraintGroup`] for an empty index list and
    /// [`UsageError::DuplicateIndex`] when an index is repeated.
    pub fn new(axis: Axis, indices: Vec<usize>) -> Result<Self, UsageError> {
        if indices.is_empty() {
            return Err(UsageError::EmptyConstraintGroup);
        }
        let mut seen = HashSet::with_capacity(indices.len());
        for &index in &indices {
            if !seen.insert(index) {
                return Err(UsageError::DuplicateIndex(index));
            }
        }
        Ok(Self { axis, indices })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Checks that every index addresses an atom of a system with `len` atoms.
    pub fn validate_for(&self, len: usize) -> Result<(), UsageError> {
        match self.indices.iter().find(|&&i| i >= len) {
            Some(&index) => Err(UsageError::IndexOutOfRange { index, len }),
            None => Ok(()),
        }
    }

    /// Replaces the axis component of every member with the arithmetic mean of that
    /// component across the group.
    ///
    /// Works on anything indexable by component, so it serves both forces
    /// (`Vector3<f64>`) and positions (`Point3<f64>`). Indices must already be validated.
    pub fn symmetrize<T>(&self, values: &mut [T])
    where
        T: IndexMut<usize, Output = f64>,
    {
        let axis = self.axis.index();
        let mean = self.indices.iter().map(|&i| values[i][axis]).sum::<f64>()
            / self.indices.len() as f64;
        for &i in &self.indices {
            values[i][axis] = mean;
        }
    }

    /// Largest pairwise difference of the axis component across the group.
    pub fn spread<T>(&self, values: &[T]) -> f64
    where
        T: std::ops::Index<usize, Output = f64>,
    {
        let axis = self.axis.index();
        let (min, max) = self
            .indices
            .iter()
            .map(|&i| values[i][axis])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        max - min
    }
}
