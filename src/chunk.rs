//! Decoded text chunks and the shared chunk store.
//!
//! The store is the single source of truth for everything read so far:
//! an append-only, ordered sequence of decoded chunks plus running line
//! and chunk totals. Append order is file order; concatenating the
//! chunks in order reconstructs the decoded prefix exactly.
//!
//! Writer discipline is enforced by construction: readers hold cloned
//! `ChunkStore` handles, while `writer()` hands out the one `ChunkWriter`
//! per load session and the controller moves it into the ingestion
//! thread. Readers always observe a consistent prefix because a chunk is
//! only visible once fully appended under the write lock.

use memchr::memchr_iter;
use std::ops::Range;
use std::sync::{Arc, RwLock};

/// Immutable decoded fragment plus the number of lines it contributes.
#[derive(Debug, Clone)]
pub struct Chunk {
    text: String,
    line_count: usize,
}

impl Chunk {
    /// Wrap decoded text, counting the lines it contributes.
    ///
    /// A trailing line without a final newline still counts as a line;
    /// the streaming reader only ever produces that shape for the last
    /// chunk of a file.
    pub fn new(text: String) -> Self {
        let line_count = count_lines(&text);
        Self { text, line_count }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }
}

/// Lines contributed by `text`: newline count, plus one for a non-empty
/// trailing remainder.
pub(crate) fn count_lines(text: &str) -> usize {
    let newlines = memchr_iter(b'\n', text.as_bytes()).count();
    if text.is_empty() || text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

#[derive(Default)]
struct StoreInner {
    chunks: Vec<Chunk>,
    total_lines: usize,
}

/// Shared read handle over the ordered chunk sequence.
#[derive(Clone, Default)]
pub struct ChunkStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the write side. The controller calls this once per load
    /// session and moves the writer into the ingestion thread; no other
    /// writer may exist for the session.
    pub fn writer(&self) -> ChunkWriter {
        ChunkWriter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Total lines across all appended chunks.
    pub fn total_lines(&self) -> usize {
        self.inner.read().unwrap().total_lines
    }

    pub fn chunk_count(&self) -> usize {
        self.inner.read().unwrap().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().chunks.is_empty()
    }

    /// Concatenation of all chunk texts in append order.
    pub fn all_text(&self) -> String {
        let inner = self.inner.read().unwrap();
        let capacity: usize = inner.chunks.iter().map(|c| c.text.len()).sum();
        let mut out = String::with_capacity(capacity);
        for chunk in &inner.chunks {
            out.push_str(&chunk.text);
        }
        out
    }

    /// Concatenation of the chunks in the given index range, clamped to
    /// the chunks that exist.
    pub fn range_text(&self, range: Range<usize>) -> String {
        let inner = self.inner.read().unwrap();
        let end = range.end.min(inner.chunks.len());
        let start = range.start.min(end);
        let mut out = String::new();
        for chunk in &inner.chunks[start..end] {
            out.push_str(&chunk.text);
        }
        out
    }

    /// Reset to empty. Only valid between load sessions; the controller
    /// joins the previous ingestion thread before calling this.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.chunks.clear();
        inner.total_lines = 0;
    }
}

/// Write side of a `ChunkStore`; owned by exactly one ingestion thread
/// per load session.
pub struct ChunkWriter {
    inner: Arc<RwLock<StoreInner>>,
}

impl ChunkWriter {
    pub fn append(&self, chunk: Chunk) {
        let mut inner = self.inner.write().unwrap();
        inner.total_lines += chunk.line_count;
        inner.chunks.push(chunk);
    }
}
