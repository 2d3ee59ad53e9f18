use crate::core::error::UsageError;
use crate::core::evaluator::reference::{Spring, SpringNetwork, Tether};
use crate::core::models::atom::Atom;
use crate::core::models::constraint::{Axis, ConstraintGroup};
use crate::core::models::element::Element;
use crate::core::models::fixture::Fixture;
use crate::core::models::system::ParticleSystem;
use crate::core::units::daltons_to_yoctograms;
use nalgebra::Point3;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unknown element symbol '{symbol}' on atom {index}")]
    UnknownElement { index: usize, symbol: String },
    #[error("Invalid fixture: {0}")]
    Invalid(#[from] UsageError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAtom {
    element: String,
    position: [f64; 3],
    /// Explicit mass in yoctograms. Falls back to the element's standard mass.
    mass: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConstraint {
    axis: Axis,
    indices: Vec<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFixture {
    atoms: Vec<RawAtom>,
    #[serde(default)]
    anchors: Vec<usize>,
    constraint: Option<RawConstraint>,
    #[serde(default)]
    springs: Vec<Spring>,
    #[serde(default)]
    tethers: Vec<Tether>,
}

/// A fixture read from disk, together with the spring network it declares (if any).
#[derive(Debug, Clone)]
pub struct LoadedFixture {
    pub fixture: Fixture,
    pub springs: SpringNetwork,
}

/// Reads fixture descriptions written in TOML.
///
/// ```toml
/// anchors = [0]
///
/// [[atoms]]
/// element = "Si"
/// position = [0.0, 0.0, 0.0]
///
/// [[atoms]]
/// element = "C"
/// position = [0.0, 0.0, 0.19]
/// mass = 19.94
///
/// [constraint]
/// axis = "z"
/// indices = [1]
///
/// [[springs]]
/// i = 0
/// j = 1
/// stiffness = 300.0
/// rest-length = 0.187
/// ```
pub struct FixtureFile;

impl FixtureFile {
    pub fn load(path: &Path) -> Result<LoadedFixture, FixtureLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| FixtureLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<LoadedFixture, FixtureLoadError> {
        let raw: RawFixture = toml::from_str(content)?;

        let mut atoms = Vec::with_capacity(raw.atoms.len());
        let mut masses = Vec::with_capacity(raw.atoms.len());
        for (index, entry) in raw.atoms.into_iter().enumerate() {
            let element: Element =
                entry
                    .element
                    .parse()
                    .map_err(|_| FixtureLoadError::UnknownElement {
                        index,
                        symbol: entry.element.clone(),
                    })?;
            masses.push(
                entry
                    .mass
                    .unwrap_or_else(|| daltons_to_yoctograms(element.standard_mass())),
            );
            atoms.push(Atom::new(element, Point3::from(entry.position)));
        }

        let system = ParticleSystem::new(atoms, masses)?;
        let constraint = raw
            .constraint
            .map(|c| ConstraintGroup::new(c.axis, c.indices))
            .transpose()?;
        let fixture = Fixture::new(system, raw.anchors, constraint)?;
        let springs = SpringNetwork::new(raw.springs).with_tethers(raw.tethers);

        Ok(LoadedFixture { fixture, springs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const TRIPOD: &str = r#"
        anchors = [0]

        [[atoms]]
        element = "Ge"
        position = [0.0, 0.0, 0.0]

        [[atoms]]
        element = "C"
        position = [0.1, 0.0, 0.2]

        [[atoms]]
        element = "C"
        position = [-0.05, 0.087, 0.2]
        mass = 12.0

        [[atoms]]
        element = "C"
        position = [-0.05, -0.087, 0.2]

        [constraint]
        axis = "z"
        indices = [1, 2, 3]

        [[springs]]
        i = 0
        j = 1
        stiffness = 100.0
        rest-length = 0.2
    "#;

    #[test]
    fn parse_builds_a_validated_fixture() {
        let loaded = FixtureFile::parse(TRIPOD).unwrap();
        let system = loaded.fixture.system();

        assert_eq!(system.len(), 4);
        assert_eq!(system.atoms()[0].element, Element::GERMANIUM);
        assert!(system.is_anchor(0));
        assert_eq!(system.masses()[2], 12.0);
        assert!((system.masses()[1] - 19.9447).abs() < 1e-3);
        assert_eq!(loaded.fixture.constraint().unwrap().axis(), Axis::Z);
        assert_eq!(loaded.springs.springs().len(), 1);
    }

    #[test]
    fn unknown_symbol_is_reported_with_index() {
        let content = r#"
            [[atoms]]
            element = "Zz"
            position = [0.0, 0.0, 0.0]
        "#;
        assert!(matches!(
            FixtureFile::parse(content),
            Err(FixtureLoadError::UnknownElement { index: 0, .. })
        ));
    }

    #[test]
    fn inconsistent_constraint_is_a_usage_error() {
        let content = r#"
            anchors = [0]
            [[atoms]]
            element = "C"
            position = [0.0, 0.0, 0.0]
            [constraint]
            axis = "x"
            indices = [0]
        "#;
        assert!(matches!(
            FixtureFile::parse(content),
            Err(FixtureLoadError::Invalid(
                UsageError::AnchorInConstraintGroup(0)
            ))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let content = r#"
            colour = "red"
            [[atoms]]
            element = "C"
            position = [0.0, 0.0, 0.0]
        "#;
        assert!(matches!(
            FixtureFile::parse(content),
            Err(FixtureLoadError::Toml(_))
        ));
    }

    #[test]
    fn load_reads_from_disk_and_reports_missing_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tripod.toml");
        let mut file = File::create(&path).unwrap();
        write!(file, "{}", TRIPOD).unwrap();

        assert!(FixtureFile::load(&path).is_ok());
        assert!(matches!(
            FixtureFile::load(&dir.path().join("missing.toml")),
            Err(FixtureLoadError::Io { .. })
        ));
    }
}
