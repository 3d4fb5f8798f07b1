//! File responder: serves a response described by a JSON file and follows its changes.
//!
//! # Synchronization
//! ```text
//! watch task ──(change event)──▶ lock → needs_sync = true
//! request    ──▶ lock → needs_sync? clear it, take generation + path → unlock
//!            ──▶ read + parse + validate (no lock held)
//!            ──▶ lock → newest generation so far? cached = new spec → unlock
//! ```
//!
//! The flag is cleared when a reload starts, so an event landing during the read marks the
//! state dirty again. Each reload takes a generation number when it starts and installs its
//! result only if no later reload installed first, so a slow read never overwrites a newer
//! spec. A failed reload keeps the previous spec and is reported only to the request that
//! attempted it; the next change event triggers another attempt. Until the first successful
//! load every request tries to load.

use axum::body::Body;
use axum::http::Response;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::observability::metrics;
use crate::responders::spec::ResponseSpec;
use crate::responders::watcher::{ResponseFileWatcher, SubscribeError, WatchStreams};
use crate::responders::ResponderError;

/// State shared between the watch task and request handlers.
#[derive(Debug)]
struct FileState {
    cached: Option<Arc<ResponseSpec>>,
    needs_sync: bool,
    file_path: PathBuf,
    /// Last generation handed to a reload.
    started: u64,
    /// Generation of `cached`.
    installed: u64,
}

enum SyncAction {
    Serve(Arc<ResponseSpec>),
    Reload { generation: u64, path: PathBuf },
}

impl FileState {
    fn new(file_path: PathBuf) -> Self {
        Self {
            cached: None,
            needs_sync: true,
            file_path,
            started: 0,
            installed: 0,
        }
    }

    /// Serve the cache, or start a reload when it is stale or empty.
    fn begin(&mut self) -> SyncAction {
        match &self.cached {
            Some(spec) if !self.needs_sync => SyncAction::Serve(spec.clone()),
            _ => {
                self.needs_sync = false;
                self.started += 1;
                SyncAction::Reload {
                    generation: self.started,
                    path: self.file_path.clone(),
                }
            }
        }
    }

    /// Install `spec` unless a later generation is already installed.
    ///
    /// Returns the spec to serve and whether `spec` was installed.
    fn install(&mut self, generation: u64, spec: Arc<ResponseSpec>) -> (Arc<ResponseSpec>, bool) {
        if generation > self.installed {
            self.installed = generation;
            self.cached = Some(spec.clone());
            return (spec, true);
        }
        match &self.cached {
            Some(newer) => (newer.clone(), false),
            None => (spec, false),
        }
    }
}

pub struct FileResponder {
    state: Arc<Mutex<FileState>>,
    subscription: Mutex<Option<ResponseFileWatcher>>,
    path: PathBuf,
}

impl FileResponder {
    /// Create a responder for `path`.
    ///
    /// The path is resolved to its canonical absolute form. The file itself may not exist
    /// yet, but its directory must.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ResponderError> {
        let path = path.as_ref();
        let resolved = resolve_path(path).map_err(|source| ResponderError::Resolve {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!(path = ?resolved, "File responder created");
        Ok(Self {
            state: Arc::new(Mutex::new(FileState::new(resolved.clone()))),
            subscription: Mutex::new(None),
            path: resolved,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serve the cached response, reloading it first if the file changed.
    pub async fn respond(&self) -> Result<Response<Body>, ResponderError> {
        self.ensure_watching()?;

        let action = lock(&self.state).begin();
        let spec = match action {
            SyncAction::Serve(spec) => spec,
            SyncAction::Reload { generation, path } => self.reload(generation, &path).await?,
        };
        Ok(spec.to_response())
    }

    /// Release the watch subscription. Safe to call repeatedly.
    pub fn close(&self) {
        if let Some(watcher) = lock(&self.subscription).take() {
            drop(watcher);
        }
    }

    async fn reload(&self, generation: u64, path: &Path) -> Result<Arc<ResponseSpec>, ResponderError> {
        let loaded = match tokio::fs::read(path).await {
            Ok(content) => ResponseSpec::from_file_content(&content),
            Err(source) => Err(ResponderError::Read {
                path: path.display().to_string(),
                source,
            }),
        };

        match loaded {
            Ok(spec) => {
                let (spec, installed) = lock(&self.state).install(generation, Arc::new(spec));
                if installed {
                    metrics::record_reload("success");
                    tracing::info!(path = ?path, status = %spec.status, generation, "Response reloaded");
                } else {
                    metrics::record_reload("superseded");
                    tracing::debug!(path = ?path, generation, "Reload superseded by a newer one");
                }
                Ok(spec)
            }
            Err(e) => {
                metrics::record_reload("failure");
                tracing::warn!(path = ?path, error = %e, "Response reload failed, keeping previous response");
                Err(e)
            }
        }
    }

    /// Subscribe to file changes on first use.
    fn ensure_watching(&self) -> Result<(), ResponderError> {
        let mut subscription = lock(&self.subscription);
        if subscription.is_some() {
            return Ok(());
        }

        match ResponseFileWatcher::subscribe(&self.path) {
            Ok((watcher, streams)) => {
                tokio::spawn(watch_response_file(self.state.clone(), streams));
                *subscription = Some(watcher);
                Ok(())
            }
            Err(SubscribeError::Register(source)) => Err(ResponderError::Watch {
                path: self.path.display().to_string(),
                source,
            }),
            Err(SubscribeError::Init(e)) => {
                tracing::error!(error = %e, "Failed to start the response watcher");
                std::process::exit(1);
            }
        }
    }
}

impl Drop for FileResponder {
    fn drop(&mut self) {
        self.close();
    }
}

/// Consume watch notifications until the subscription is released.
///
/// A watch error means responses may silently go stale, so it terminates the process.
async fn watch_response_file(state: Arc<Mutex<FileState>>, mut streams: WatchStreams) {
    loop {
        tokio::select! {
            event = streams.events.recv() => match event {
                Some(event) => {
                    tracing::debug!(kind = ?event.kind, "Response file changed");
                    lock(&state).needs_sync = true;
                }
                None => break,
            },
            error = streams.errors.recv() => match error {
                Some(e) => {
                    tracing::error!(error = %e, "Failed to watch response file");
                    std::process::exit(1);
                }
                None => break,
            },
        }
    }
    tracing::debug!("Response watch task finished");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Canonicalize the directory of `path` and re-append the file name.
///
/// The file itself is not resolved: it may not exist yet, and a symlink at that name must
/// stay the watched entry so swapping the link is noticed.
fn resolve_path(path: &Path) -> std::io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(std::fs::canonicalize(parent)?.join(file_name))
}
