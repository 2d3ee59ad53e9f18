use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;
use tether::engine::progress::{Progress, ProgressCallback};

const TICK: Duration = Duration::from_millis(80);

/// Draws engine progress on stderr.
///
/// A spinner labelled with the current phase, which turns into a bar while a counted task
/// (relaxation iterations, dynamics frames) runs. The latest force or temperature reading
/// is shown next to it.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: ProgressBar,
}

impl CliProgressHandler {
    /// A handler drawing to stderr, or drawing nothing when `quiet` is set.
    pub fn new(quiet: bool) -> Self {
        let target = if quiet {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        Self::with_target(target)
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        pb.finish_and_clear();
        Self { pb }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();
        Box::new(move |event| render(&pb, event))
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new(false)
    }
}

fn render(pb: &ProgressBar, event: Progress) {
    match event {
        Progress::PhaseStart { name } => {
            pb.reset();
            pb.set_length(0);
            pb.set_style(spinner_style());
            pb.set_prefix(name);
            pb.set_message("");
            pb.enable_steady_tick(TICK);
        }
        Progress::PhaseFinish => {
            pb.disable_steady_tick();
            pb.set_style(spinner_style());
            pb.finish_with_message("done");
        }
        Progress::TaskStart { total_steps } => {
            pb.disable_steady_tick();
            pb.set_length(total_steps);
            pb.set_position(0);
            pb.set_style(bar_style());
        }
        Progress::TaskIncrement => pb.inc(1),
        Progress::TaskFinish => {
            // Converged relaxations stop short of their iteration budget.
            if let Some(len) = pb.length() {
                pb.set_position(len);
            }
        }
        Progress::Relaxation {
            iteration,
            max_force,
        } => pb.set_message(format!("iter {} | fmax {:.3e} pN", iteration, max_force)),
        Progress::Frame { index, temperature } => {
            pb.set_message(format!("frame {} | {:.1} K", index, temperature))
        }
        Progress::Message(text) => pb.println(text),
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:<12.bold} [{bar:32.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn hidden() -> CliProgressHandler {
        CliProgressHandler::with_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn quiet_handler_draws_nothing() {
        assert!(CliProgressHandler::new(true).pb.is_hidden());
        assert!(hidden().pb.is_finished());
    }

    #[test]
    fn relaxation_events_drive_the_bar() {
        let handler = hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Relaxation" });
        assert_eq!(handler.pb.prefix(), "Relaxation");
        assert!(!handler.pb.is_finished());

        callback(Progress::TaskStart { total_steps: 100 });
        callback(Progress::TaskIncrement);
        callback(Progress::Relaxation {
            iteration: 0,
            max_force: 12.5,
        });
        assert_eq!(handler.pb.length(), Some(100));
        assert_eq!(handler.pb.position(), 1);
        assert_eq!(handler.pb.message(), "iter 0 | fmax 1.250e1 pN");

        callback(Progress::TaskFinish);
        assert_eq!(handler.pb.position(), 100);

        callback(Progress::PhaseFinish);
        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.message(), "done");
    }

    #[test]
    fn a_new_phase_starts_from_an_empty_bar() {
        let handler = hidden();
        let callback = handler.get_callback();
        callback(Progress::PhaseStart { name: "Relaxation" });
        callback(Progress::TaskStart { total_steps: 10 });
        callback(Progress::TaskIncrement);
        callback(Progress::PhaseFinish);

        callback(Progress::PhaseStart { name: "Production" });
        assert_eq!(handler.pb.prefix(), "Production");
        assert_eq!(handler.pb.position(), 0);
        assert_eq!(handler.pb.message(), "");
    }

    #[test]
    fn frame_events_show_the_temperature() {
        let handler = hidden();
        let callback = handler.get_callback();
        callback(Progress::Frame {
            index: 4,
            temperature: 299.96,
        });
        assert_eq!(handler.pb.message(), "frame 4 | 300.0 K");
    }

    #[test]
    fn callback_can_run_on_another_thread() {
        let handler = hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Equilibration" });
            callback(Progress::TaskIncrement);
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.message(), "done");
    }
}
