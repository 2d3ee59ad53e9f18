use super::{load_fixture, status};
use crate::cli::RelaxArgs;
use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use tether::core::evaluator::Fingerprinted;
use tether::core::io::traits::TrajectoryFile;
use tether::core::io::xyz::XyzFile;
use tether::engine::cache::DirectoryStore;
use tether::engine::progress::ProgressReporter;
use tether::workflows::dynamics;
use tracing::info;

pub fn run(args: RelaxArgs, quiet: bool) -> Result<()> {
    let partial_config = PartialRunConfig::load(&args.fixture)?;
    let minimizer = partial_config.minimizer_config(&args.fixture)?;
    let cache_dir = partial_config.cache_dir(args.cache_dir.as_ref());

    let mut loaded = load_fixture(&args.fixture.input)?;
    let store = DirectoryStore::open(&cache_dir)?;
    let fingerprint = loaded.springs.fingerprint();
    let key = dynamics::relaxation_key(&loaded.fixture, &fingerprint, &minimizer);
    info!(%key, cache = ?cache_dir, "Relaxing fixture.");

    let progress_handler = CliProgressHandler::new(quiet);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    status(
        quiet,
        format_args!("Relaxing {} atoms...", loaded.fixture.system().len()),
    );
    let trajectory = dynamics::relax(
        &loaded.fixture,
        &mut loaded.springs,
        &store,
        &minimizer,
        &reporter,
    )?;

    status(
        quiet,
        format_args!(
            "✓ Relaxed in {} frame(s); cache key {}",
            trajectory.len(),
            key
        ),
    );

    if let Some(output) = &args.output {
        XyzFile::write_to_path(&trajectory, output).map_err(|e| CliError::xyz(output, e))?;
        status(
            quiet,
            format_args!("✓ Relaxation trajectory written to: {}", output.display()),
        );
    }
    Ok(())
}
