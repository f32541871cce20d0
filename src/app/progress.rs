//! Progress UI (bar or spinner) for a single transfer.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use media_transfer::format_file_name;
use media_transfer::transfer::ProgressSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const BAR_TEMPLATE: &str =
    "{msg:26} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {binary_bytes_per_sec}";
const SPINNER_TEMPLATE: &str = "{spinner} {msg:26} {bytes} {binary_bytes_per_sec}";

/// Spawns the progress renderer when enabled.
///
/// The task ends when the notifier side of `rx` is dropped, which happens when
/// the session finishes.
pub(crate) fn spawn_progress_ui(
    enabled: bool,
    label: &str,
    mut rx: watch::Receiver<Option<ProgressSnapshot>>,
) -> Option<JoinHandle<()>> {
    if !enabled {
        return None;
    }
    let label = format_file_name(label);
    Some(tokio::spawn(async move {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(label);
        bar.enable_steady_tick(Duration::from_millis(100));

        let mut has_total = false;
        while rx.changed().await.is_ok() {
            let Some(snapshot) = rx.borrow_and_update().clone() else {
                continue;
            };
            if !has_total && let Some(total) = snapshot.total_bytes {
                bar.set_length(total);
                bar.set_style(bar_style());
                has_total = true;
            }
            bar.set_position(snapshot.bytes_transferred);
        }
        bar.finish_and_clear();
    }))
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
