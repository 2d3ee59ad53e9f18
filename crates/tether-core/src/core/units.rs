//! Physical constants for the molecular unit system used by the library defaults.
//!
//! The engine performs no unit conversion. Every quantity handed to it has to be expressed
//! in one mutually consistent system, and the defaults assume the following one:
//!
//! | quantity | unit |
//! |----------|------|
//! | time     | picosecond (ps) |
//! | length   | nanometer (nm) |
//! | mass     | yoctogram (yg) |
//! | energy   | zeptojoule (zJ = yg·nm²/ps²) |
//! | force    | piconewton (pN = zJ/nm) |
//! | temperature | kelvin (K) |

/// Boltzmann constant in zJ/K.
pub const BOLTZMANN_ZJ_PER_K: f64 = 1.380649e-2;

/// One unified atomic mass unit (Dalton) in yoctograms.
pub const YOCTOGRAMS_PER_DALTON: f64 = 1.660_539_066_60;

/// Converts a mass in Daltons to yoctograms.
#[inline]
pub fn daltons_to_yoctograms(daltons: f64) -> f64 {
    daltons * YOCTOGRAMS_PER_DALTON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carbon_mass_converts_to_yoctograms() {
        let carbon = daltons_to_yoctograms(12.011);
        assert!((carbon - 19.9447).abs() < 1e-3);
    }

    #[test]
    fn thermal_energy_at_room_temperature_is_a_few_zeptojoules() {
        let kt = BOLTZMANN_ZJ_PER_K * 300.0;
        assert!((kt - 4.142).abs() < 1e-2);
    }
}
