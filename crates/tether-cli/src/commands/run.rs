use super::{load_fixture, status};
use crate::cli::RunArgs;
use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use tether::core::io::diagnostics::write_rows_to_path;
use tether::core::io::traits::TrajectoryFile;
use tether::core::io::xyz::XyzFile;
use tether::engine::cache::DirectoryStore;
use tether::engine::progress::ProgressReporter;
use tether::workflows::dynamics;
use tracing::info;

pub fn run(args: RunArgs, quiet: bool) -> Result<()> {
    let partial_config = PartialRunConfig::load(&args.fixture)?;
    let config = partial_config.dynamics_config(&args)?;
    let cache_dir = partial_config.cache_dir(args.cache_dir.as_ref());

    let mut loaded = load_fixture(&args.fixture.input)?;
    let store = DirectoryStore::open(&cache_dir)?;

    let progress_handler = CliProgressHandler::new(quiet);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    status(
        quiet,
        format_args!(
            "Running dynamics at {} K ({} equilibration + {} production frames)...",
            config.temperature, config.equilibration_frames, config.production_frames
        ),
    );
    info!("Invoking the dynamics workflow...");
    let result = dynamics::run(
        &loaded.fixture,
        &mut loaded.springs,
        &store,
        &config,
        &reporter,
    )?;

    XyzFile::write_to_path(&result.frames, &args.output)
        .map_err(|e| CliError::xyz(&args.output, e))?;
    status(
        quiet,
        format_args!(
            "✓ {} frame(s) written to: {}",
            result.frames.len(),
            args.output.display()
        ),
    );

    if let Some(path) = &args.diagnostics {
        write_rows_to_path(&result.diagnostics, path)
            .map_err(|e| CliError::diagnostics(path, e))?;
        status(
            quiet,
            format_args!("✓ Diagnostics written to: {}", path.display()),
        );
    }
    Ok(())
}
