pub mod defaults;

use crate::cli::{FixtureArgs, RunArgs};
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tether::engine::config::{
    self as core_config, DynamicsConfigBuilder, FireParameters, IntegratorConfig,
    MinimizerConfigBuilder,
};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialFireConfig {
    n_min: Option<usize>,
    f_inc: Option<f64>,
    f_dec: Option<f64>,
    alpha_start: Option<f64>,
    f_alpha: Option<f64>,
}

impl PartialFireConfig {
    fn merge(self) -> FireParameters {
        let d = FireParameters::default();
        FireParameters {
            n_min: self.n_min.unwrap_or(d.n_min),
            f_inc: self.f_inc.unwrap_or(d.f_inc),
            f_dec: self.f_dec.unwrap_or(d.f_dec),
            alpha_start: self.alpha_start.unwrap_or(d.alpha_start),
            f_alpha: self.f_alpha.unwrap_or(d.f_alpha),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMinimizerConfig {
    max_iterations: Option<usize>,
    force_tolerance: Option<f64>,
    timestep: Option<f64>,
    max_timestep: Option<f64>,
    max_displacement: Option<f64>,
    fire: Option<PartialFireConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialIntegratorConfig {
    max_step: Option<f64>,
    boltzmann: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialDynamicsConfig {
    temperature: Option<f64>,
    equilibration_frames: Option<usize>,
    production_frames: Option<usize>,
    frame_interval: Option<f64>,
    seed: Option<u64>,
    remove_drift: Option<bool>,
}

/// A run configuration file as written by the user; every field is optional.
///
/// ```toml
/// cache-dir = "cache"
///
/// [minimizer]
/// force-tolerance = 1e-3
/// timestep = 0.001
///
/// [integrator]
/// max-step = 0.001
///
/// [dynamics]
/// temperature = 300.0
/// production-frames = 200
/// frame-interval = 0.01
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialRunConfig {
    cache_dir: Option<PathBuf>,
    minimizer: Option<PartialMinimizerConfig>,
    integrator: Option<PartialIntegratorConfig>,
    dynamics: Option<PartialDynamicsConfig>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file named by `--config`, or starts from an empty configuration.
    pub fn load(args: &FixtureArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_set_values(&args.set_values)?;
        Ok(config)
    }

    /// Flag, then file, then built-in default.
    pub fn cache_dir(&self, cli_value: Option<&PathBuf>) -> PathBuf {
        cli_value
            .cloned()
            .or_else(|| self.cache_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DefaultsConfig::default().cache_dir))
    }

    pub fn minimizer_config(&self, args: &FixtureArgs) -> Result<core_config::MinimizerConfig> {
        let defaults = DefaultsConfig::default();
        let file = self.minimizer.as_ref();
        let pick = |f: fn(&PartialMinimizerConfig) -> Option<f64>| file.and_then(f);

        let mut builder = MinimizerConfigBuilder::new()
            .max_iterations(
                args.max_iterations
                    .or(file.and_then(|m| m.max_iterations))
                    .unwrap_or(defaults.max_iterations),
            )
            .force_tolerance(
                args.force_tolerance
                    .or(pick(|m| m.force_tolerance))
                    .unwrap_or(defaults.force_tolerance),
            )
            .timestep(pick(|m| m.timestep).unwrap_or(defaults.timestep));
        if let Some(max_timestep) = pick(|m| m.max_timestep) {
            builder = builder.max_timestep(max_timestep);
        }
        if let Some(max_displacement) = pick(|m| m.max_displacement) {
            builder = builder.max_displacement(max_displacement);
        }
        if let Some(fire) = file.and_then(|m| m.fire.clone()) {
            builder = builder.fire(fire.merge());
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn dynamics_config(&self, args: &RunArgs) -> Result<core_config::DynamicsConfig> {
        let defaults = DefaultsConfig::default();
        let integrator = self.integrator.as_ref();
        let dynamics = self.dynamics.as_ref();

        let mut integrator_config = IntegratorConfig::new(
            integrator
                .and_then(|i| i.max_step)
                .unwrap_or(defaults.max_step),
        )
        .map_err(|e| CliError::Config(e.to_string()))?;
        if let Some(boltzmann) = integrator.and_then(|i| i.boltzmann) {
            integrator_config = integrator_config
                .with_boltzmann(boltzmann)
                .map_err(|e| CliError::Config(e.to_string()))?;
        }

        DynamicsConfigBuilder::new()
            .minimizer(self.minimizer_config(&args.fixture)?)
            .integrator(integrator_config)
            .temperature(
                args.temperature
                    .or(dynamics.and_then(|d| d.temperature))
                    .unwrap_or(defaults.temperature),
            )
            .equilibration_frames(
                dynamics
                    .and_then(|d| d.equilibration_frames)
                    .unwrap_or(defaults.equilibration_frames),
            )
            .production_frames(
                dynamics
                    .and_then(|d| d.production_frames)
                    .unwrap_or(defaults.production_frames),
            )
            .frame_interval(
                dynamics
                    .and_then(|d| d.frame_interval)
                    .unwrap_or(defaults.frame_interval),
            )
            .seed(
                args.seed
                    .or(dynamics.and_then(|d| d.seed))
                    .unwrap_or(defaults.seed),
            )
            .remove_drift(
                dynamics
                    .and_then(|d| d.remove_drift)
                    .unwrap_or(defaults.remove_drift),
            )
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            match key {
                "cache-dir" => self.cache_dir = Some(PathBuf::from(value)),
                "minimizer.max-iterations" => {
                    self.minimizer_mut().max_iterations = Some(parse_value(key, value)?)
                }
                "minimizer.force-tolerance" => {
                    self.minimizer_mut().force_tolerance = Some(parse_value(key, value)?)
                }
                "minimizer.timestep" => {
                    self.minimizer_mut().timestep = Some(parse_value(key, value)?)
                }
                "minimizer.max-timestep" => {
                    self.minimizer_mut().max_timestep = Some(parse_value(key, value)?)
                }
                "minimizer.max-displacement" => {
                    self.minimizer_mut().max_displacement = Some(parse_value(key, value)?)
                }
                "integrator.max-step" => {
                    self.integrator_mut().max_step = Some(parse_value(key, value)?)
                }
                "integrator.boltzmann" => {
                    self.integrator_mut().boltzmann = Some(parse_value(key, value)?)
                }
                "dynamics.temperature" => {
                    self.dynamics_mut().temperature = Some(parse_value(key, value)?)
                }
                "dynamics.equilibration-frames" => {
                    self.dynamics_mut().equilibration_frames = Some(parse_value(key, value)?)
                }
                "dynamics.production-frames" => {
                    self.dynamics_mut().production_frames = Some(parse_value(key, value)?)
                }
                "dynamics.frame-interval" => {
                    self.dynamics_mut().frame_interval = Some(parse_value(key, value)?)
                }
                "dynamics.seed" => self.dynamics_mut().seed = Some(parse_value(key, value)?),
                "dynamics.remove-drift" => {
                    self.dynamics_mut().remove_drift = Some(parse_value(key, value)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn minimizer_mut(&mut self) -> &mut PartialMinimizerConfig {
        self.minimizer.get_or_insert_with(Default::default)
    }

    fn integrator_mut(&mut self) -> &mut PartialIntegratorConfig {
        self.integrator.get_or_insert_with(Default::default)
    }

    fn dynamics_mut(&mut self) -> &mut PartialDynamicsConfig {
        self.dynamics.get_or_insert_with(Default::default)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}
