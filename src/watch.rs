//! Watch mode: re-run the analysis when source files change
//!
//! The graph is still rebuilt from scratch on every run; watching only decides
//! when to force a refresh.

use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};
use std::time::{Duration, Instant};

/// Watch event for file changes
#[derive(Debug, Clone)]
pub enum WatchEvent {
    Modified(PathBuf),
    Created(PathBuf),
    Deleted(PathBuf),
    Error(String),
}

impl WatchEvent {
    pub fn path(&self) -> Option<&Path> {
        match self {
            WatchEvent::Modified(p) | WatchEvent::Created(p) | WatchEvent::Deleted(p) => Some(p),
            WatchEvent::Error(_) => None,
        }
    }
}

/// File watcher for a project root
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<WatchEvent>,
}

impl FileWatcher {
    /// Create a new file watcher for the given path
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    for path in event.paths {
                        let watch_event = match event.kind {
                            notify::EventKind::Modify(_) => WatchEvent::Modified(path),
                            notify::EventKind::Create(_) => WatchEvent::Created(path),
                            notify::EventKind::Remove(_) => WatchEvent::Deleted(path),
                            _ => continue,
                        };
                        let _ = tx.send(watch_event);
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatchEvent::Error(e.to_string()));
                }
            },
            Config::default(),
        )?;

        watcher.watch(path, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Get the next watch event (blocking with timeout)
    pub fn next_event(&self, timeout: Duration) -> Option<WatchEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Get all pending events (non-blocking)
    pub fn pending_events(&self) -> Vec<WatchEvent> {
        self.receiver.try_iter().collect()
    }
}

/// Debounce file events to avoid a refresh per editor save burst
pub struct Debouncer {
    last_events: HashMap<PathBuf, Instant>,
    delay: Duration,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            last_events: HashMap::new(),
            delay,
        }
    }

    /// Check if an event should be processed (not debounced)
    pub fn should_process(&mut self, path: &Path) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_events.get(path)
            && now.duration_since(*last) < self.delay
        {
            return false;
        }
        self.last_events.insert(path.to_path_buf(), now);
        true
    }

    /// Clear old entries to prevent memory growth
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        self.last_events
            .retain(|_, last| now.duration_since(*last) < self.delay * 10);
    }
}

/// True if a change to `path` can affect the graph
pub fn is_relevant(path: &Path, source_extensions: &[String]) -> bool {
    if path
        .components()
        .any(|c| matches!(c.as_os_str().to_str(), Some("node_modules" | ".git")))
    {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| source_extensions.iter().any(|e| e == ext))
}
