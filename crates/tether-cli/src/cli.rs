use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "tether - constrained relaxation and velocity-Verlet dynamics with a persistent trajectory cache.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relax a fixture to its constrained minimum, reusing cached results.
    Relax(RelaxArgs),
    /// Relax, thermalize and record production dynamics for a fixture.
    Run(RunArgs),
    /// Inspect or clear the trajectory cache.
    Cache(CacheArgs),
}

/// Arguments shared by every command that relaxes a fixture.
#[derive(Args, Debug, Clone)]
pub struct FixtureArgs {
    /// Path to the fixture description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to a run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the force tolerance of the relaxation.
    #[arg(long, value_name = "FLOAT")]
    pub force_tolerance: Option<f64>,

    /// Override the maximum number of relaxation iterations.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S dynamics.seed=7
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `relax` subcommand.
#[derive(Args, Debug)]
pub struct RelaxArgs {
    #[command(flatten)]
    pub fixture: FixtureArgs,

    /// Directory holding cached trajectories.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Write the full relaxation trajectory as multi-frame XYZ.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub fixture: FixtureArgs,

    /// Directory holding cached trajectories.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Path for the production frames as multi-frame XYZ.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Write per-frame energies and temperatures as CSV.
    #[arg(short, long, value_name = "PATH")]
    pub diagnostics: Option<PathBuf>,

    /// Override the target temperature in kelvin.
    #[arg(short, long, value_name = "KELVIN")]
    pub temperature: Option<f64>,

    /// Override the seed of the velocity draw.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

/// Arguments for the `cache` subcommand.
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Print the cache key a fixture's relaxation is stored under.
    Key(FixtureArgs),
    /// Delete every cached trajectory.
    Clear {
        /// Directory holding cached trajectories.
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_command_parses_overrides() {
        let cli = Cli::parse_from([
            "tether",
            "-vv",
            "run",
            "-i",
            "fixture.toml",
            "-o",
            "frames.xyz",
            "--temperature",
            "150",
            "-S",
            "dynamics.seed=3",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected the run subcommand");
        };
        assert_eq!(args.fixture.input, PathBuf::from("fixture.toml"));
        assert_eq!(args.temperature, Some(150.0));
        assert_eq!(args.fixture.set_values, vec!["dynamics.seed=3".to_string()]);
        assert!(args.diagnostics.is_none());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["tether", "-q", "-v", "cache", "clear"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_requires_an_output() {
        let result = Cli::try_parse_from(["tether", "run", "-i", "fixture.toml"]);
        assert!(result.is_err());
    }
}
