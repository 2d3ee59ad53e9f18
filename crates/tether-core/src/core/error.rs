use thiserror::Error;

/// Programmer errors: arguments or inputs that violate a documented precondition.
///
/// These are never the result of physics going wrong. A caller that receives one has
/// built an inconsistent system or passed a nonsensical parameter, and retrying the same
/// call will fail the same way.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UsageError {
    #[error("Length mismatch for {what}: expected {expected}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Atom index {index} is out of range for a system of {len} atoms")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Constraint group must contain at least one atom")]
    EmptyConstraintGroup,

    #[error("Atom index {0} appears more than once")]
    DuplicateIndex(usize),

    #[error("Anchor atom {0} cannot be part of the constraint group")]
    AnchorInConstraintGroup(usize),

    #[error("Invalid mass {mass} for atom {index}: masses must be finite and non-negative")]
    InvalidMass { index: usize, mass: f64 },

    #[error("Unknown atomic number {0}")]
    UnknownElement(u8),

    #[error("Invalid step size {0}: must be finite and positive")]
    InvalidStepSize(f64),

    #[error("Invalid duration {0}: must be finite and non-negative")]
    InvalidDuration(f64),

    #[error("Invalid temperature {0}: must be finite and non-negative")]
    InvalidTemperature(f64),

    #[error("Non-finite coordinate on atom {0}")]
    NonFinitePosition(usize),

    #[error("A trajectory must contain at least one frame")]
    EmptyTrajectory,

    #[error("Frame {frame} is inconsistent with the first frame: {reason}")]
    InconsistentFrame { frame: usize, reason: String },
}
