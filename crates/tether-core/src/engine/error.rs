use crate::core::error::UsageError;
use crate::core::evaluator::EvaluatorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThermalError {
    #[error("Cannot rescale to {target} K: the mobile atoms have no kinetic energy")]
    ZeroKineticEnergy { target: f64 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid usage: {0}")]
    Usage(#[from] UsageError),

    #[error("Minimization did not converge after {iterations} iterations (max force {max_force:.3e})")]
    Convergence { iterations: usize, max_force: f64 },

    #[error("Evaluator failed: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("Evaluator returned a non-finite {quantity}{}", atom_suffix(.atom))]
    NonFinite {
        quantity: &'static str,
        atom: Option<usize>,
    },

    #[error("Thermostat failed: {0}")]
    Thermal(#[from] ThermalError),
}

fn atom_suffix(atom: &Option<usize>) -> String {
    atom.map(|i| format!(" on atom {}", i)).unwrap_or_default()
}

impl EngineError {
    /// Whether the failure is a runtime outcome the caller may retry or log.
    ///
    /// Usage errors are the only non-recoverable class: they mean the inputs themselves
    /// are inconsistent.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::Usage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_are_not_recoverable() {
        let usage = EngineError::from(UsageError::InvalidStepSize(0.0));
        assert!(!usage.is_recoverable());

        let convergence = EngineError::Convergence {
            iterations: 1000,
            max_force: 1.0,
        };
        assert!(convergence.is_recoverable());
        assert!(
            EngineError::NonFinite {
                quantity: "energy",
                atom: None
            }
            .is_recoverable()
        );
    }

    #[test]
    fn non_finite_message_names_the_atom() {
        let err = EngineError::NonFinite {
            quantity: "force",
            atom: Some(3),
        };
        assert_eq!(
            err.to_string(),
            "Evaluator returned a non-finite force on atom 3"
        );
        let err = EngineError::NonFinite {
            quantity: "energy",
            atom: None,
        };
        assert_eq!(err.to_string(), "Evaluator returned a non-finite energy");
    }
}
