//! Event recorder
//!
//! Merges the program's stdout and stderr into one chronologically ordered
//! list. Each completed read from either pipe becomes one event tagged with
//! its stream.
//!
//! Order across the two pipes is only as fine as the capture tasks are
//! scheduled. Writes to stdout and stderr that land within the same few
//! microseconds may come out swapped, and consecutive stdout writes around
//! a stderr write can be read back as a single chunk. Writes separated by a
//! measurable pause keep their order.

use crate::error::{Result, SandboxError};
use crate::types::{Event, EventKind};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Raw bytes captured from one stream at one point in time
#[derive(Debug, Clone)]
pub struct Chunk {
    pub kind: EventKind,
    pub bytes: Vec<u8>,
    pub at: Instant,
}

/// Collects chunks from any number of capture tasks
pub struct Recorder {
    started: Instant,
    tx: mpsc::UnboundedSender<Chunk>,
    rx: mpsc::UnboundedReceiver<Chunk>,
}

impl Recorder {
    /// Start recording; event delays are measured from `started`
    pub fn new(started: Instant) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { started, tx, rx }
    }

    /// Spawn a task that forwards every read from `reader` as a chunk
    pub fn capture<R>(&self, reader: R, kind: EventKind) -> JoinHandle<std::io::Result<()>>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut reader = reader;
            let mut buf = vec![0u8; READ_BUFFER_SIZE];
            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    return Ok(());
                }
                let chunk = Chunk {
                    kind,
                    bytes: buf[..n].to_vec(),
                    at: Instant::now(),
                };
                if tx.send(chunk).is_err() {
                    return Ok(());
                }
            }
        })
    }

    /// Wait for every capture task to finish and return the recording
    pub async fn finish(self) -> Recording {
        let Recorder {
            started,
            tx,
            mut rx,
        } = self;
        drop(tx);

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        Recording { started, chunks }
    }
}

/// Drained, append-only capture of one execution
#[derive(Debug, Clone)]
pub struct Recording {
    pub started: Instant,
    pub chunks: Vec<Chunk>,
}

impl Recording {
    pub fn new(started: Instant, chunks: Vec<Chunk>) -> Self {
        Self { started, chunks }
    }

    /// Ordered, timed events.
    ///
    /// Chunks are ordered by capture time, which is when a read returned
    /// rather than when the program wrote; see the module docs for the
    /// cross-stream resolution this gives. A multi-byte UTF-8 sequence split
    /// across two reads of the same stream is joined before decoding; bytes
    /// that are not valid UTF-8 fail with `SandboxError::Decode`.
    pub fn events(&self) -> Result<Vec<Event>> {
        let mut chunks: Vec<&Chunk> = self.chunks.iter().collect();
        chunks.sort_by_key(|c| c.at);

        let mut pending_stdout = Vec::new();
        let mut pending_stderr = Vec::new();
        let mut last = self.started;
        let mut events = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let pending = match chunk.kind {
                EventKind::Stdout => &mut pending_stdout,
                EventKind::Stderr => &mut pending_stderr,
            };
            pending.extend_from_slice(&chunk.bytes);

            let message = take_complete_utf8(pending, chunk.kind)?;
            if message.is_empty() {
                continue;
            }

            let delay = chunk.at.saturating_duration_since(last);
            last = chunk.at;
            events.push(Event::new(message, chunk.kind, delay));
        }

        for (kind, pending) in [
            (EventKind::Stdout, &pending_stdout),
            (EventKind::Stderr, &pending_stderr),
        ] {
            if !pending.is_empty() {
                return Err(SandboxError::Decode(format!(
                    "{} ended inside a UTF-8 sequence ({} trailing bytes)",
                    kind,
                    pending.len()
                )));
            }
        }

        Ok(events)
    }

    /// Concatenated text of one stream, ignoring timing
    pub fn text(&self, kind: EventKind) -> Result<String> {
        let bytes: Vec<u8> = self
            .chunks
            .iter()
            .filter(|c| c.kind == kind)
            .flat_map(|c| c.bytes.iter().copied())
            .collect();
        String::from_utf8(bytes).map_err(|e| SandboxError::Decode(format!("{}: {}", kind, e)))
    }
}

/// Split off the longest valid UTF-8 prefix of `pending`, leaving an
/// incomplete trailing sequence behind for the next chunk.
fn take_complete_utf8(pending: &mut Vec<u8>, kind: EventKind) -> Result<String> {
    let valid_up_to = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => {
            return Err(SandboxError::Decode(format!(
                "invalid UTF-8 on {} at byte {}",
                kind,
                e.valid_up_to()
            )))
        }
    };

    let rest = pending.split_off(valid_up_to);
    let complete = std::mem::replace(pending, rest);
    String::from_utf8(complete).map_err(|e| SandboxError::Decode(e.to_string()))
}
