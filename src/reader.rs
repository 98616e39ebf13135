//! Background streaming ingestion.
//!
//! One ingestion thread per load session. It pulls fixed-size byte
//! buffers from a `ByteSource`, detects the encoding on the first
//! accumulation, decodes incrementally, and appends line-aligned chunks
//! to the store while reporting progress over an mpsc channel.
//!
//! The line-alignment rule is the key correctness mechanism for
//! pagination: when the pending decoded text reaches the chunk
//! threshold, everything up to and including the last newline is emitted
//! and the tail is carried into the next accumulation. Every chunk
//! except possibly the final flush therefore ends at a line boundary.

use crate::cancel::CancelToken;
use crate::chunk::{Chunk, ChunkWriter};
use crate::encoding::{detect, StreamDecoder};
use crate::error::LoadError;
use crate::source::ByteSource;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default size of a single I/O read.
pub const DEFAULT_IO_BUFFER_SIZE: usize = 64 * 1024;

/// Default decoded-text threshold for emitting a chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Pause briefly after this many processed bytes so the host scheduler
/// is never starved during a long load.
const YIELD_INTERVAL_BYTES: u64 = 1024 * 1024;
const YIELD_PAUSE: Duration = Duration::from_millis(1);

/// Messages sent from the ingestion thread to the controller.
#[derive(Debug)]
pub enum LoadMessage {
    /// Completion ratio in `[0, 1]`; only sent when total size is known.
    Progress(f64),
    /// A chunk was appended to the store.
    ChunkAdded,
    /// End of source reached; the store holds the whole file.
    Complete,
    /// Cancellation observed; the store holds a consistent prefix.
    Cancelled,
    /// The session failed. Chunks appended before the error remain.
    Error(LoadError),
}

enum Outcome {
    Complete,
    Cancelled,
}

/// Streaming reader configuration; `spawn` starts one load session.
#[derive(Debug, Clone, Copy)]
pub struct StreamingReader {
    io_buffer_size: usize,
    chunk_size: usize,
}

impl Default for StreamingReader {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingReader {
    pub fn new() -> Self {
        Self {
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override buffer sizes. The I/O buffer should be smaller than the
    /// chunk threshold; tests use tiny sizes to force many boundaries.
    pub fn with_sizes(io_buffer_size: usize, chunk_size: usize) -> Self {
        Self {
            io_buffer_size,
            chunk_size,
        }
    }

    /// Run one load session on a background thread.
    pub fn spawn<S: ByteSource + 'static>(
        self,
        source: S,
        writer: ChunkWriter,
        tx: Sender<LoadMessage>,
        cancel: CancelToken,
    ) -> JoinHandle<()> {
        thread::spawn(move || self.run(source, &writer, &tx, &cancel))
    }

    /// Run one load session on the current thread (used by `spawn` and
    /// directly by tests).
    pub fn run<S: ByteSource>(
        &self,
        source: S,
        writer: &ChunkWriter,
        tx: &Sender<LoadMessage>,
        cancel: &CancelToken,
    ) {
        // Send results best-effort: a dropped receiver means the
        // controller abandoned the session.
        match self.ingest(source, writer, tx, cancel) {
            Ok(Outcome::Complete) => {
                let _ = tx.send(LoadMessage::Complete);
            }
            Ok(Outcome::Cancelled) => {
                let _ = tx.send(LoadMessage::Cancelled);
            }
            Err(err) => {
                let _ = tx.send(LoadMessage::Error(err));
            }
        }
    }

    fn ingest<S: ByteSource>(
        &self,
        mut source: S,
        writer: &ChunkWriter,
        tx: &Sender<LoadMessage>,
        cancel: &CancelToken,
    ) -> Result<Outcome, LoadError> {
        let total_size = source.total_size().filter(|&s| s > 0);

        let mut raw = vec![0u8; self.io_buffer_size.max(1)];
        // Bytes accumulated before the encoding is known.
        let mut detection_buf: Vec<u8> = Vec::new();
        let mut decoder: Option<StreamDecoder> = None;
        // Decoded text not yet emitted; its tail past the last newline is
        // the carried-over pending remainder.
        let mut pending = String::new();
        let mut processed: u64 = 0;
        let mut last_pause: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }

            let n = source.read(&mut raw).map_err(|e| LoadError::io_unnamed(&e))?;
            if n == 0 {
                break;
            }
            processed += n as u64;

            match decoder.as_mut() {
                Some(active) => active.decode_to(&raw[..n], &mut pending),
                None => {
                    detection_buf.extend_from_slice(&raw[..n]);
                    if detection_buf.len() >= self.chunk_size {
                        let mut pinned = StreamDecoder::new(detect(&detection_buf)?);
                        pinned.decode_to(&detection_buf, &mut pending);
                        detection_buf = Vec::new();
                        decoder = Some(pinned);
                    }
                }
            }

            if let Some(total) = total_size {
                let progress = (processed as f64 / total as f64).clamp(0.0, 1.0);
                if tx.send(LoadMessage::Progress(progress)).is_err() {
                    // Receiver gone; treat like cancellation.
                    return Ok(Outcome::Cancelled);
                }
            }

            if pending.len() >= self.chunk_size {
                self.emit_complete_lines(&mut pending, writer, tx);
            }

            if processed - last_pause >= YIELD_INTERVAL_BYTES {
                last_pause = processed;
                thread::sleep(YIELD_PAUSE);
            }
        }

        // Small files never hit the detection threshold; pin now.
        let mut decoder = match decoder {
            Some(active) => active,
            None => {
                let mut pinned = StreamDecoder::new(detect(&detection_buf)?);
                pinned.decode_to(&detection_buf, &mut pending);
                pinned
            }
        };
        decoder.finish(&mut pending);

        // Final flush regardless of trailing-newline completeness.
        if !pending.is_empty() {
            writer.append(Chunk::new(std::mem::take(&mut pending)));
            let _ = tx.send(LoadMessage::ChunkAdded);
        }
        let _ = tx.send(LoadMessage::Progress(1.0));

        Ok(Outcome::Complete)
    }

    /// Emit everything up to and including the last newline in `pending`;
    /// the rest stays as the carried remainder. A buffer with no newline
    /// at all is held whole — chunks never contain zero complete lines.
    fn emit_complete_lines(
        &self,
        pending: &mut String,
        writer: &ChunkWriter,
        tx: &Sender<LoadMessage>,
    ) {
        if let Some(cut) = pending.rfind('\n') {
            let remainder = pending.split_off(cut + 1);
            let chunk_text = std::mem::replace(pending, remainder);
            writer.append(Chunk::new(chunk_text));
            let _ = tx.send(LoadMessage::ChunkAdded);
        }
    }
}
