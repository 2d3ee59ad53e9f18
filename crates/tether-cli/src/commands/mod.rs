pub mod cache;
pub mod relax;
pub mod run;

use crate::error::{CliError, Result};
use std::fmt::Display;
use std::path::Path;
use tether::core::io::fixture_file::{FixtureFile, LoadedFixture};
use tracing::info;

fn load_fixture(path: &Path) -> Result<LoadedFixture> {
    info!("Loading fixture from {:?}", path);
    let loaded = FixtureFile::load(path).map_err(|e| CliError::fixture(path, e))?;
    info!(
        atoms = loaded.fixture.system().len(),
        anchors = loaded.fixture.anchors().len(),
        springs = loaded.springs.springs().len(),
        "Fixture loaded."
    );
    Ok(loaded)
}

/// Prints a status line for the user unless `--quiet` was given.
fn status(quiet: bool, message: impl Display) {
    if !quiet {
        println!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const DIMER: &str = r#"
        [[atoms]]
        element = "C"
        position = [0.0, 0.0, 0.0]

        [[atoms]]
        element = "C"
        position = [0.2, 0.0, 0.0]

        [[springs]]
        i = 0
        j = 1
        stiffness = 500.0
        rest-length = 0.15
    "#;

    fn parse(argv: &[&str]) -> Commands {
        let mut full = vec!["tether"];
        full.extend_from_slice(argv);
        Cli::parse_from(full).command
    }

    fn entries(dir: &Path) -> usize {
        fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn relax_then_clear_round_trips_through_the_cache() {
        let dir = tempdir().unwrap();
        let fixture = dir.path().join("dimer.toml");
        let cache = dir.path().join("cache");
        let output = dir.path().join("relaxed.xyz");
        fs::write(&fixture, DIMER).unwrap();

        let relax = |out: &Path, quiet: bool| {
            let Commands::Relax(args) = parse(&[
                "relax",
                "-i",
                fixture.to_str().unwrap(),
                "--cache-dir",
                cache.to_str().unwrap(),
                "-o",
                out.to_str().unwrap(),
                "--force-tolerance",
                "1e-3",
                "-S",
                "minimizer.timestep=0.01",
                "-S",
                "minimizer.max-timestep=0.1",
            ]) else {
                panic!("expected the relax subcommand");
            };
            super::relax::run(args, quiet).unwrap();
        };

        relax(&output, false);
        assert_eq!(entries(&cache), 1);
        let first = fs::read_to_string(&output).unwrap();
        assert!(first.starts_with("2\nframe=0\n"));

        let again = dir.path().join("again.xyz");
        relax(&again, true);
        assert_eq!(entries(&cache), 1);
        assert_eq!(fs::read_to_string(&again).unwrap(), first);

        let Commands::Cache(args) =
            parse(&["cache", "clear", "--cache-dir", cache.to_str().unwrap()])
        else {
            panic!("expected the cache subcommand");
        };
        super::cache::run(args, true).unwrap();
        assert_eq!(entries(&cache), 0);
    }

    #[test]
    fn missing_fixture_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let Commands::Relax(args) = parse(&[
            "relax",
            "-i",
            dir.path().join("absent.toml").to_str().unwrap(),
            "--cache-dir",
            dir.path().join("cache").to_str().unwrap(),
        ]) else {
            panic!("expected the relax subcommand");
        };
        assert!(matches!(
            super::relax::run(args, true),
            Err(crate::error::CliError::FileParsing { .. })
        ));
    }
}
