use std::io::{BufRead, BufReader, IsTerminal};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::domain::entities::cancel::CancelToken;
use crate::usecase::ports::progress::{ProgressReporter, SilentReporter};

/// Progress bars only when stderr is a terminal.
pub fn reporter() -> Box<dyn ProgressReporter> {
    if std::io::stderr().is_terminal() {
        Box::new(CliReporter::new())
    } else {
        Box::new(SilentReporter)
    }
}

/// Returns a token that trips when the user types `q` and Enter on an
/// interactive stdin. Piped input never cancels.
pub fn stop_on_request() -> CancelToken {
    let token = CancelToken::new();
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        info!("type q then Enter to stop after the current item");
        let _ = listen_for_stop(BufReader::new(stdin), token.clone());
    }
    token
}

fn is_stop_line(line: &str) -> bool {
    matches!(line.trim(), "q" | "Q" | "quit" | "stop")
}

/// Reads lines until a stop word or end of input. The thread is detached
/// by callers that do not need to join it.
pub fn listen_for_stop<R>(input: R, token: CancelToken) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else { break };
            if is_stop_line(&line) {
                debug!("stop requested");
                token.cancel();
                break;
            }
        }
    })
}

/// Renders engine progress as one indicatif bar per operation.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.cyan} {prefix} [{bar:30.cyan/dim}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

impl ProgressReporter for CliReporter {
    fn on_start(&self, operation: &str, total: usize) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(bar_style());
        pb.set_prefix(operation.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_item(&self, _index: usize, _total: usize, label: &str) {
        self.with_bar(|pb| pb.set_message(label.to_string()));
    }

    fn on_item_done(&self, _label: &str) {
        self.with_bar(|pb| pb.inc(1));
    }

    fn on_finish(&self, operation: &str, produced: usize) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
        eprintln!("  \x1b[32m✓\x1b[0m {operation} complete: {produced}");
    }
}
