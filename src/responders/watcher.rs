//! Response file watcher.
//!
//! Bridges notify's callback thread into two tokio channels, one for change events and one
//! for watch errors, so a single async task can consume both.
//!
//! The parent directory is watched, not the file, so a file replaced through `rename` or a
//! symlink swap keeps producing events. Only events naming the watched file are forwarded.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Receiving ends of a watch subscription.
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<Event>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// A live watch on the response file.
///
/// Dropping it stops notify, which closes both channels of the matching [`WatchStreams`].
pub struct ResponseFileWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

/// Failure modes when subscribing.
#[derive(Debug)]
pub enum SubscribeError {
    /// The platform watcher could not be created at all.
    Init(notify::Error),
    /// The watcher exists but the directory could not be registered (e.g. it was removed).
    Register(notify::Error),
}

impl ResponseFileWatcher {
    /// Start watching `path` through its parent directory.
    pub fn subscribe(path: &Path) -> Result<(Self, WatchStreams), SubscribeError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();

        let file_name = path.file_name().map(OsString::from);
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !event.kind.is_access() && concerns(&event, file_name.as_deref()) {
                        let _ = events_tx.send(event);
                    }
                }
                Err(e) => {
                    let _ = errors_tx.send(e);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )
        .map_err(SubscribeError::Init)?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(SubscribeError::Register)?;

        tracing::info!(path = ?path, directory = ?directory, "Response file watcher started");
        Ok((
            Self {
                path: path.to_path_buf(),
                _watcher: watcher,
            },
            WatchStreams {
                events: events_rx,
                errors: errors_rx,
            },
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// True when one of the event paths names the watched file.
fn concerns(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    match file_name {
        Some(name) => event.paths.iter().any(|p| p.file_name() == Some(name)),
        None => true,
    }
}

impl Drop for ResponseFileWatcher {
    fn drop(&mut self) {
        tracing::debug!(path = ?self.path, "Response file watcher released");
    }
}
