//! User-facing progress reporting.

use std::sync::Arc;

/// Shared handle to a progress sink.
pub type DynUi = Arc<dyn Ui>;

/// Fire-and-forget user-visible progress notifications.
///
/// Implementations never surface errors to callers; a notification that
/// cannot be delivered is dropped.
pub trait Ui: Send + Sync {
    /// Shows a single progress message.
    fn say(&self, message: &str);
}

/// Writes progress messages to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalUi;

impl Ui for TerminalUi {
    fn say(&self, message: &str) {
        println!("{message}");
    }
}
