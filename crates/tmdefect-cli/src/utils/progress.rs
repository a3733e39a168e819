use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tmdefect::engine::progress::{Progress, ProgressCallback};
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;
const SPINNER_TEMPLATE: &str = "{spinner:.green} {prefix:.bold} {msg}";
const BAR_TEMPLATE: &str = "{prefix:.bold:>20} [{bar:40.cyan/blue}] {pos}/{len} structures ({per_sec}, eta {eta})";

/// Draws workflow progress on stderr: a spinner per phase, a counted bar per task.
///
/// The phase name is shown as the bar prefix so it stays visible while a task runs.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
    skipped: Arc<AtomicUsize>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(style(SPINNER_TEMPLATE));
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
            skipped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Items reported as skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();
        let skipped = self.skipped.clone();

        Box::new(move |event: Progress| {
            let Ok(pb) = pb.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };
            if let Progress::ItemSkipped { .. } = &event {
                skipped.fetch_add(1, Ordering::Relaxed);
            }
            render(&pb, event);
        })
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn render(pb: &ProgressBar, event: Progress) {
    match event {
        Progress::PhaseStart { name } => {
            pb.reset();
            pb.set_length(0);
            pb.set_style(style(SPINNER_TEMPLATE));
            pb.set_prefix(name);
            pb.set_message("");
            pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        }
        Progress::TaskStart { total_steps } => {
            pb.disable_steady_tick();
            pb.reset();
            pb.set_style(style(BAR_TEMPLATE));
            pb.set_length(total_steps);
        }
        Progress::TaskIncrement => pb.inc(1),
        Progress::TaskFinish => {
            if let Some(length) = pb.length() {
                pb.set_position(length);
            }
            pb.finish();
        }
        Progress::PhaseFinish => {
            pb.disable_steady_tick();
            pb.set_style(style(SPINNER_TEMPLATE));
            pb.finish_with_message("done");
        }
        Progress::ItemSkipped { id, reason } => pb.println(format!("  skipped {id}: {reason}")),
        Progress::Message(msg) => pb.println(format!("  {msg}")),
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
