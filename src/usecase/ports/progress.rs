/// Receives progress of a long-running engine operation.
///
/// The CLI renders these with indicatif, or drops them through
/// [`SilentReporter`] when stderr is not a terminal.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_start(&self, _operation: &str, _total: usize) {}
    fn on_item(&self, _index: usize, _total: usize, _label: &str) {}
    fn on_item_done(&self, _label: &str) {}
    fn on_finish(&self, _operation: &str, _produced: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
