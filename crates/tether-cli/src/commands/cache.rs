use super::{load_fixture, status};
use crate::cli::{CacheArgs, CacheCommands, FixtureArgs};
use crate::config::PartialRunConfig;
use crate::error::Result;
use std::path::PathBuf;
use tether::core::evaluator::Fingerprinted;
use tether::engine::cache::DirectoryStore;
use tether::workflows::dynamics;
use tracing::info;

pub fn run(args: CacheArgs, quiet: bool) -> Result<()> {
    match args.command {
        CacheCommands::Key(fixture_args) => print_key(&fixture_args),
        CacheCommands::Clear { cache_dir } => clear(cache_dir, quiet),
    }
}

fn print_key(args: &FixtureArgs) -> Result<()> {
    let partial_config = PartialRunConfig::load(args)?;
    let minimizer = partial_config.minimizer_config(args)?;
    let loaded = load_fixture(&args.input)?;
    let fingerprint = loaded.springs.fingerprint();
    let key = dynamics::relaxation_key(&loaded.fixture, &fingerprint, &minimizer);
    println!("{}", key);
    Ok(())
}

fn clear(cache_dir: Option<PathBuf>, quiet: bool) -> Result<()> {
    let cache_dir = PartialRunConfig::default().cache_dir(cache_dir.as_ref());
    if !cache_dir.is_dir() {
        status(
            quiet,
            format_args!("Nothing to clear: {} does not exist.", cache_dir.display()),
        );
        return Ok(());
    }
    let removed = DirectoryStore::open(&cache_dir)?.clear()?;
    info!(removed, cache = ?cache_dir, "Cache cleared.");
    status(
        quiet,
        format_args!(
            "✓ Removed {} cached trajectory(ies) from {}",
            removed,
            cache_dir.display()
        ),
    );
    Ok(())
}
