use histo::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Renders batch progress on stderr: one bar per batch, the current
/// structure and step as its message, failures printed above it.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
    failures: Arc<Mutex<u64>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.disable_steady_tick();
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
            failures: Arc::new(Mutex::new(0)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();
        let failures = self.failures.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::BatchStart { total_items } => {
                    if let Ok(mut count) = failures.lock() {
                        *count = 0;
                    }
                    pb_guard.reset();
                    pb_guard.set_length(total_items);
                    pb_guard.set_position(0);
                    pb_guard.set_style(Self::bar_style());
                    pb_guard.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::StepStart { pdb_code, step } => {
                    pb_guard.set_message(format!("{} · {}", pdb_code, step));
                }
                Progress::StepFinish {
                    pdb_code,
                    step,
                    success: false,
                } => {
                    pb_guard.println(format!("  ✗ {} failed '{}'", pdb_code, step));
                }
                Progress::StepFinish { .. } => {}
                Progress::ItemDone { success, .. } => {
                    if !success {
                        if let Ok(mut count) = failures.lock() {
                            *count += 1;
                        }
                    }
                    pb_guard.inc(1);
                }
                Progress::BatchFinish => {
                    pb_guard.disable_steady_tick();
                    let failed = failures.lock().map(|c| *c).unwrap_or(0);
                    if failed == 0 {
                        pb_guard.finish_with_message("✓ Done");
                    } else {
                        pb_guard.finish_with_message(format!("✗ {} failed", failed));
                    }
                }
                Progress::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
