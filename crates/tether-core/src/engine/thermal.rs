use super::error::{EngineError, ThermalError};
use crate::core::error::UsageError;
use crate::core::units::BOLTZMANN_ZJ_PER_K;
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, instrument};

fn check_lengths(velocities: usize, masses: usize) -> Result<(), UsageError> {
    if velocities == masses {
        Ok(())
    } else {
        Err(UsageError::LengthMismatch {
            what: "velocities",
            expected: masses,
            found: velocities,
        })
    }
}

fn check_temperature(temperature: f64) -> Result<(), UsageError> {
    if temperature.is_finite() && temperature >= 0.0 {
        Ok(())
    } else {
        Err(UsageError::InvalidTemperature(temperature))
    }
}

/// `Σ ½ m |v|²` over atoms with non-zero mass. Lengths must already agree.
pub(crate) fn kinetic_energy_of(velocities: &[Vector3<f64>], masses: &[f64]) -> f64 {
    velocities
        .iter()
        .zip(masses)
        .filter(|&(_, &m)| m > 0.0)
        .map(|(v, &m)| 0.5 * m * v.norm_squared())
        .sum()
}

fn mobile_count(masses: &[f64]) -> usize {
    masses.iter().filter(|&&m| m > 0.0).count()
}

/// Draws, measures and corrects atomic velocities for a target temperature.
///
/// Anchors (mass `0`) are ignored everywhere: they receive zero velocity, do not count
/// toward the degrees of freedom and are never rescaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalVelocityInitializer {
    boltzmann: f64,
}

impl Default for ThermalVelocityInitializer {
    fn default() -> Self {
        Self {
            boltzmann: BOLTZMANN_ZJ_PER_K,
        }
    }
}

impl ThermalVelocityInitializer {
    /// Uses the given Boltzmann constant (energy unit per kelvin) instead of the default.
    pub fn with_boltzmann(boltzmann: f64) -> Self {
        Self { boltzmann }
    }

    pub fn boltzmann(&self) -> f64 {
        self.boltzmann
    }

    /// Samples each mobile atom's velocity components from `N(0, sqrt(k_B T / m))`.
    #[instrument(level = "debug", skip_all, fields(temperature))]
    pub fn sample_boltzmann(
        &self,
        masses: &[f64],
        temperature: f64,
        rng: &mut impl Rng,
    ) -> Result<Vec<Vector3<f64>>, UsageError> {
        check_temperature(temperature)?;
        let mut velocities = vec![Vector3::zeros(); masses.len()];
        if temperature == 0.0 {
            return Ok(velocities);
        }
        for (v, &m) in velocities.iter_mut().zip(masses) {
            if m <= 0.0 {
                continue;
            }
            let sigma = (self.boltzmann * temperature / m).sqrt();
            let normal =
                Normal::new(0.0, sigma).map_err(|_| UsageError::InvalidTemperature(temperature))?;
            *v = Vector3::new(
                normal.sample(rng),
                normal.sample(rng),
                normal.sample(rng),
            );
        }
        Ok(velocities)
    }

    /// Subtracts the mass-weighted mean velocity of the mobile atoms so the system has no
    /// net momentum.
    pub fn remove_drift(
        &self,
        velocities: &mut [Vector3<f64>],
        masses: &[f64],
    ) -> Result<(), UsageError> {
        check_lengths(velocities.len(), masses.len())?;
        let (momentum, total_mass) = velocities
            .iter()
            .zip(masses)
            .filter(|&(_, &m)| m > 0.0)
            .fold((Vector3::zeros(), 0.0), |(p, mt), (v, &m)| (p + v * m, mt + m));
        if total_mass == 0.0 {
            return Ok(());
        }
        let drift = momentum / total_mass;
        for (v, &m) in velocities.iter_mut().zip(masses) {
            if m > 0.0 {
                *v -= drift;
            }
        }
        Ok(())
    }

    pub fn kinetic_energy(
        &self,
        velocities: &[Vector3<f64>],
        masses: &[f64],
    ) -> Result<f64, UsageError> {
        check_lengths(velocities.len(), masses.len())?;
        Ok(kinetic_energy_of(velocities, masses))
    }

    /// `T = 2 KE / (3 N k_B)` over the mobile atoms; `0` when nothing can move.
    pub fn instantaneous_temperature(
        &self,
        velocities: &[Vector3<f64>],
        masses: &[f64],
    ) -> Result<f64, UsageError> {
        check_lengths(velocities.len(), masses.len())?;
        Ok(self.temperature_of(velocities, masses))
    }

    pub(crate) fn temperature_of(&self, velocities: &[Vector3<f64>], masses: &[f64]) -> f64 {
        let n = mobile_count(masses);
        if n == 0 {
            return 0.0;
        }
        2.0 * kinetic_energy_of(velocities, masses) / (3.0 * n as f64 * self.boltzmann)
    }

    /// Scales mobile velocities so the instantaneous temperature equals `temperature`.
    ///
    /// The expected kinetic energy is `1.5 k_B T` per mobile atom. A target of 0 K stops
    /// every mobile atom. A system at rest cannot be heated by scaling and yields
    /// [`ThermalError::ZeroKineticEnergy`].
    pub fn rescale_to_temperature(
        &self,
        velocities: &mut [Vector3<f64>],
        masses: &[f64],
        temperature: f64,
    ) -> Result<(), EngineError> {
        check_lengths(velocities.len(), masses.len())?;
        check_temperature(temperature)?;

        let n = mobile_count(masses);
        if n == 0 {
            return Ok(());
        }
        let expected = 1.5 * self.boltzmann * temperature * n as f64;
        let actual = kinetic_energy_of(velocities, masses);

        let scale = if expected == 0.0 {
            0.0
        } else if actual > 0.0 {
            (expected / actual).sqrt()
        } else {
            return Err(ThermalError::ZeroKineticEnergy {
                target: temperature,
            }
            .into());
        };
        debug!(actual, expected, scale, "Rescaling velocities.");

        for (v, &m) in velocities.iter_mut().zip(masses) {
            if m > 0.0 {
                *v *= scale;
            }
        }
        Ok(())
    }
}
