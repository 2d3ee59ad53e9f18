use super::element::Element;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A single atom record: what it is and where it is.
///
/// This is the unit stored in every [`Frame`](super::trajectory::Frame) and hashed into
/// every cache key. Masses are not part of the record; they belong to the
/// [`ParticleSystem`](super::system::ParticleSystem) that owns the atom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// The chemical element of the atom.
    pub element: Element,
    /// Position in caller units (nm with the library defaults).
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(element: Element, position: Point3<f64>) -> Self {
        Self { element, position }
    }

    /// Returns `true` when every coordinate is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|c| c.is_finite())
    }
}
