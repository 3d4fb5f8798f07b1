//! Traffic log: the request and response records printed for the developer.
//!
//! # Layout
//! ```text
//! 2024/05/01 10:00:00 POST /orders?x=1
//!  > content-type: application/json
//!
//! {"a":1}
//!
//! 201 Created
//!  > x-request-id: abc123
//!
//! {"success":true}
//!
//! ```
//!
//! Records are separate from `tracing` diagnostics so they can be piped on their own.
//! Bodies longer than the display limit are cut and followed by a `[N more bytes not shown]`
//! line; the traffic itself is never shortened.
//!
//! Records are rendered on the calling task and written by a dedicated thread, so a slow
//! stdout never stalls request handling.

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use bytes::Bytes;
use chrono::{DateTime, Local};
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};

use crate::observability::format::{BodyFormat, BodyFormatter};

/// A body as shown in the traffic log, cut to the display limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggedBody {
    pub shown: Bytes,
    /// Bytes past the display limit.
    pub omitted: usize,
}

impl LoggedBody {
    pub fn clip(body: &Bytes, limit: usize) -> Self {
        let shown = body.len().min(limit);
        Self {
            shown: body.slice(..shown),
            omitted: body.len() - shown,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty() && self.omitted == 0
    }

    fn write_omitted(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.omitted == 0 {
            return Ok(());
        }
        if !self.shown.is_empty() {
            f.write_str("\n")?;
        }
        write!(f, "[{} more bytes not shown]", self.omitted)
    }
}

impl From<Bytes> for LoggedBody {
    fn from(shown: Bytes) -> Self {
        Self { shown, omitted: 0 }
    }
}

/// An inbound request as shown in the traffic log.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub timestamp: DateTime<Local>,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Option<LoggedBody>,
}

impl fmt::Display for RequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp.format("%Y/%m/%d %H:%M:%S"),
            self.method,
            self.uri
        )?;
        write_headers(f, &self.headers)?;
        if let Some(body) = self.body.as_ref().filter(|b| !b.is_empty()) {
            write!(f, "\n\n{}", String::from_utf8_lossy(&body.shown))?;
            body.write_omitted(f)?;
        }
        write!(f, "\n\n")
    }
}

/// An outbound response as shown in the traffic log.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: LoggedBody,
    pub format: BodyFormat,
}

impl fmt::Display for ResponseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or_default()
        )?;
        write_headers(f, &self.headers)?;
        if !self.body.is_empty() {
            // A cut body is no longer valid JSON, show it as is.
            if self.body.omitted == 0 {
                let formatted =
                    BodyFormatter::for_headers(&self.headers).format(&self.body.shown, self.format);
                write!(f, "\n\n{}", String::from_utf8_lossy(&formatted))?;
            } else {
                write!(f, "\n\n{}", String::from_utf8_lossy(&self.body.shown))?;
                self.body.write_omitted(f)?;
            }
        }
        write!(f, "\n\n")
    }
}

/// One ` > name: v1; v2` line per header name.
fn write_headers(f: &mut fmt::Formatter<'_>, headers: &HeaderMap) -> fmt::Result {
    for name in headers.keys() {
        let values: Vec<_> = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        write!(f, "\n > {}: {}", name, values.join("; "))?;
    }
    Ok(())
}

enum Command {
    Record(String),
    Flush(oneshot::Sender<()>),
}

/// Shared sink for traffic records.
///
/// Cloning is cheap; every clone feeds the same writer thread, which exits once the last
/// clone is dropped.
#[derive(Clone)]
pub struct TrafficLog {
    commands: mpsc::UnboundedSender<Command>,
}

impl TrafficLog {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        std::thread::spawn(move || drain(writer, receiver));
        Self { commands }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Queue one record; records are written whole, in the order they were queued.
    pub fn write(&self, record: &impl fmt::Display) {
        if self.commands.send(Command::Record(record.to_string())).is_err() {
            tracing::warn!("Traffic log writer has stopped, record dropped");
        }
    }

    /// Wait until every record queued so far has been written.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

impl fmt::Debug for TrafficLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrafficLog").finish_non_exhaustive()
    }
}

fn drain(mut writer: impl Write, mut commands: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.blocking_recv() {
        match command {
            Command::Record(rendered) => {
                if let Err(e) = writer.write_all(rendered.as_bytes()).and_then(|_| writer.flush()) {
                    tracing::warn!(error = %e, "Failed to write traffic record");
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

/// In-memory writer for inspecting traffic records.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let buffer = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
