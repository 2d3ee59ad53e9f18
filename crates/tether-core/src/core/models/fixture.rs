use super::constraint::ConstraintGroup;
use super::system::ParticleSystem;
use crate::core::error::UsageError;
use std::collections::BTreeSet;

/// Everything a geometry provider hands to the engine: the atoms, which of them are held
/// in place, and an optional symmetry constraint.
///
/// Construction is the only place the three pieces are checked against each other. Anchor
/// atoms get their mass set to zero here, so downstream code only needs to look at masses.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    system: ParticleSystem,
    anchors: BTreeSet<usize>,
    constraint: Option<ConstraintGroup>,
}

impl Fixture {
    /// # Errors
    ///
    /// - [`UsageError::IndexOutOfRange`] if an anchor or constraint index does not exist.
    /// - [`UsageError::AnchorInConstraintGroup`] if an anchor is also constrained; averaging
    ///   positions would otherwise move an atom that must stay fixed.
    pub fn new(
        mut system: ParticleSystem,
        anchors: impl IntoIterator<Item = usize>,
        constraint: Option<ConstraintGroup>,
    ) -> Result<Self, UsageError> {
        let anchors: BTreeSet<usize> = anchors.into_iter().collect();
        for &index in &anchors {
            system.anchor(index)?;
        }
        if let Some(group) = &constraint {
            group.validate_for(system.len())?;
            if let Some(&index) = group.indices().iter().find(|&&i| system.is_anchor(i)) {
                return Err(UsageError::AnchorInConstraintGroup(index));
            }
        }
        Ok(Self {
            system,
            anchors,
            constraint,
        })
    }

    /// A fixture with no anchors and no constraint.
    pub fn free(system: ParticleSystem) -> Self {
        Self {
            system,
            anchors: BTreeSet::new(),
            constraint: None,
        }
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut ParticleSystem {
        &mut self.system
    }

    pub fn anchors(&self) -> &BTreeSet<usize> {
        &self.anchors
    }

    pub fn constraint(&self) -> Option<&ConstraintGroup> {
        self.constraint.as_ref()
    }
}
