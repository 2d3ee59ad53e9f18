use crate::core::units::BOLTZMANN_ZJ_PER_K;
use thiserror::Error;

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn require_positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{} is not a finite positive number", value),
        })
    }
}

fn require_in_range(
    name: &'static str,
    value: f64,
    low: f64,
    high: f64,
    high_inclusive: bool,
) -> Result<f64, ConfigError> {
    let below_high = if high_inclusive { value <= high } else { value < high };
    if value > low && below_high {
        Ok(value)
    } else {
        let bracket = if high_inclusive { ']' } else { ')' };
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{} is outside ({}, {}{}", value, low, high, bracket),
        })
    }
}

/// Tuning constants of the FIRE relaxation scheme.
///
/// The defaults are the values from Bitzek et al., PRL 97, 170201 (2006).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireParameters {
    /// Number of consecutive downhill steps before the timestep may grow.
    pub n_min: usize,
    pub f_inc: f64,
    pub f_dec: f64,
    pub alpha_start: f64,
    pub f_alpha: f64,
}

impl FireParameters {
    /// Checks that the constants keep FIRE stable: the timestep may only grow by
    /// `f_inc >= 1` and shrink by `f_dec` in (0, 1), with mixing fractions in (0, 1).
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(self.f_inc.is_finite() && self.f_inc >= 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "fire.f_inc",
                reason: format!("{} is not a finite number of at least 1", self.f_inc),
            });
        }
        require_in_range("fire.f_dec", self.f_dec, 0.0, 1.0, false)?;
        require_in_range("fire.alpha_start", self.alpha_start, 0.0, 1.0, false)?;
        require_in_range("fire.f_alpha", self.f_alpha, 0.0, 1.0, true)?;
        Ok(self)
    }
}

impl Default for FireParameters {
    fn default() -> Self {
        Self {
            n_min: 5,
            f_inc: 1.1,
            f_dec: 0.5,
            alpha_start: 0.1,
            f_alpha: 0.99,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizerConfig {
    pub max_iterations: usize,
    /// Converged once the largest force on a mobile atom drops below this value.
    pub force_tolerance: f64,
    /// Initial FIRE timestep.
    pub timestep: f64,
    /// Upper bound for the adaptive FIRE timestep.
    pub max_timestep: f64,
    /// Largest distance any atom may move in one iteration; `None` leaves steps uncapped.
    pub max_displacement: Option<f64>,
    pub fire: FireParameters,
}

#[derive(Default)]
pub struct MinimizerConfigBuilder {
    max_iterations: Option<usize>,
    force_tolerance: Option<f64>,
    timestep: Option<f64>,
    max_timestep: Option<f64>,
    max_displacement: Option<f64>,
    fire: Option<FireParameters>,
}

impl MinimizerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn force_tolerance(mut self, tolerance: f64) -> Self {
        self.force_tolerance = Some(tolerance);
        self
    }
    pub fn timestep(mut self, dt: f64) -> Self {
        self.timestep = Some(dt);
        self
    }
    pub fn max_timestep(mut self, dt: f64) -> Self {
        self.max_timestep = Some(dt);
        self
    }
    pub fn max_displacement(mut self, distance: f64) -> Self {
        self.max_displacement = Some(distance);
        self
    }
    pub fn fire(mut self, parameters: FireParameters) -> Self {
        self.fire = Some(parameters);
        self
    }

    /// Builds the configuration. `max_timestep` defaults to ten times `timestep`.
    pub fn build(self) -> Result<MinimizerConfig, ConfigError> {
        let force_tolerance = require_positive(
            "force_tolerance",
            self.force_tolerance
                .ok_or(ConfigError::MissingParameter("force_tolerance"))?,
        )?;
        let timestep = require_positive(
            "timestep",
            self.timestep
                .ok_or(ConfigError::MissingParameter("timestep"))?,
        )?;
        let max_timestep =
            require_positive("max_timestep", self.max_timestep.unwrap_or(10.0 * timestep))?;
        if max_timestep < timestep {
            return Err(ConfigError::InvalidParameter {
                name: "max_timestep",
                reason: format!("{} is smaller than the initial timestep {}", max_timestep, timestep),
            });
        }
        let max_displacement = self
            .max_displacement
            .map(|d| require_positive("max_displacement", d))
            .transpose()?;
        let max_iterations = self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        if max_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_iterations",
                reason: "must be at least 1".into(),
            });
        }

        Ok(MinimizerConfig {
            max_iterations,
            force_tolerance,
            timestep,
            max_timestep,
            max_displacement,
            fire: self.fire.unwrap_or_default().validate()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorConfig {
    /// Largest sub-step `simulate` may take.
    pub max_step: f64,
    /// Boltzmann constant in the caller's energy unit per kelvin, used for temperatures.
    pub boltzmann: f64,
}

impl IntegratorConfig {
    /// Creates a configuration in the library's default unit system.
    pub fn new(max_step: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            max_step: require_positive("max_step", max_step)?,
            boltzmann: BOLTZMANN_ZJ_PER_K,
        })
    }

    /// Overrides the Boltzmann constant, e.g. `1.0` for reduced units.
    pub fn with_boltzmann(mut self, boltzmann: f64) -> Result<Self, ConfigError> {
        self.boltzmann = require_positive("boltzmann", boltzmann)?;
        Ok(self)
    }
}

/// Everything one end-to-end dynamics run needs, fixed for the lifetime of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsConfig {
    pub minimizer: MinimizerConfig,
    pub integrator: IntegratorConfig,
    /// Target temperature in kelvin.
    pub temperature: f64,
    /// Frames during which velocities are rescaled to the target after each interval.
    pub equilibration_frames: usize,
    /// Frames recorded after equilibration without any thermostat.
    pub production_frames: usize,
    /// Simulated time between consecutive frames.
    pub frame_interval: f64,
    /// Seed for the Maxwell-Boltzmann velocity draw.
    pub seed: u64,
    /// Subtract the centre-of-mass velocity after sampling.
    pub remove_drift: bool,
}

#[derive(Default)]
pub struct DynamicsConfigBuilder {
    minimizer: Option<MinimizerConfig>,
    integrator: Option<IntegratorConfig>,
    temperature: Option<f64>,
    equilibration_frames: Option<usize>,
    production_frames: Option<usize>,
    frame_interval: Option<f64>,
    seed: Option<u64>,
    remove_drift: Option<bool>,
}

impl DynamicsConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimizer(mut self, config: MinimizerConfig) -> Self {
        self.minimizer = Some(config);
        self
    }
    pub fn integrator(mut self, config: IntegratorConfig) -> Self {
        self.integrator = Some(config);
        self
    }
    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn equilibration_frames(mut self, frames: usize) -> Self {
        self.equilibration_frames = Some(frames);
        self
    }
    pub fn production_frames(mut self, frames: usize) -> Self {
        self.production_frames = Some(frames);
        self
    }
    pub fn frame_interval(mut self, duration: f64) -> Self {
        self.frame_interval = Some(duration);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn remove_drift(mut self, enabled: bool) -> Self {
        self.remove_drift = Some(enabled);
        self
    }

    pub fn build(self) -> Result<DynamicsConfig, ConfigError> {
        let temperature = self
            .temperature
            .ok_or(ConfigError::MissingParameter("temperature"))?;
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "temperature",
                reason: format!("{} K is not a valid temperature", temperature),
            });
        }
        Ok(DynamicsConfig {
            minimizer: self
                .minimizer
                .ok_or(ConfigError::MissingParameter("minimizer"))?,
            integrator: self
                .integrator
                .ok_or(ConfigError::MissingParameter("integrator"))?,
            temperature,
            equilibration_frames: self.equilibration_frames.unwrap_or(0),
            production_frames: self
                .production_frames
                .ok_or(ConfigError::MissingParameter("production_frames"))?,
            frame_interval: require_positive(
                "frame_interval",
                self.frame_interval
                    .ok_or(ConfigError::MissingParameter("frame_interval"))?,
            )?,
            seed: self.seed.unwrap_or(0),
            remove_drift: self.remove_drift.unwrap_or(true),
        })
    }
}
