//! Core module for knot
//!
//! Shared types, the file discovery collaborator, and event plumbing.

pub mod scanner;
mod types;

pub use scanner::{FileSource, FsSource};
pub use types::*;

use crossbeam_channel::Sender;

/// Notify helper for optional sender
pub(crate) fn notify(tx: &Option<Sender<AnalysisEvent>>, event: AnalysisEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event);
    }
}
