use super::error::EngineError;
use crate::core::evaluator::{Evaluator, EvaluatorError, Singlepoint};
use nalgebra::{Point3, Vector3};

/// Calls the evaluator and rejects any result that must not reach the dynamics: a wrong
/// number of forces, a non-finite force component or a non-finite energy.
pub(crate) fn evaluate_checked<E: Evaluator + ?Sized>(
    evaluator: &mut E,
    positions: &[Point3<f64>],
) -> Result<Singlepoint, EngineError> {
    let result = evaluator.evaluate(positions)?;
    if result.forces.len() != positions.len() {
        return Err(EvaluatorError::ForceCount {
            expected: positions.len(),
            found: result.forces.len(),
        }
        .into());
    }
    if let Some(atom) = result
        .forces
        .iter()
        .position(|f| !f.iter().all(|c| c.is_finite()))
    {
        return Err(EngineError::NonFinite {
            quantity: "force",
            atom: Some(atom),
        });
    }
    if !result.energy.is_finite() {
        return Err(EngineError::NonFinite {
            quantity: "energy",
            atom: None,
        });
    }
    Ok(result)
}

/// Largest force magnitude over atoms with non-zero mass. Zero when nothing can move.
pub(crate) fn max_mobile_force(forces: &[Vector3<f64>], masses: &[f64]) -> f64 {
    forces
        .iter()
        .zip(masses)
        .filter(|&(_, &m)| m > 0.0)
        .map(|(f, _)| f.norm())
        .fold(0.0, f64::max)
}
