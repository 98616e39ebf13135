//! Viewer controller: load-session lifecycle, view mode, and page state.
//!
//! `TextViewer` owns all mutable view state on the caller's thread and
//! supervises one background ingestion session at a time. Callers drive
//! it by polling: `poll()` drains the ingestion channel and updates
//! state, page totals, and progress. Partial content is readable while a
//! load is still running; page counts are only authoritative once the
//! state is `Ready`.

use crate::cancel::CancelToken;
use crate::chunk::ChunkStore;
use crate::config::ViewerConfig;
use crate::error::LoadError;
use crate::paginator;
use crate::reader::{LoadMessage, StreamingReader};
use crate::source::{ByteSource, FileSource};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;

/// Presentation policy: the full decoded stream, or fixed-length pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Scroll,
    Page,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scroll" => Ok(ViewMode::Scroll),
            "page" => Ok(ViewMode::Page),
            other => Err(format!("unknown view mode: {} (expected scroll|page)", other)),
        }
    }
}

/// Lifecycle of the current load session.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    NotStarted,
    /// Loading with the last reported completion ratio.
    Loading(f64),
    Ready,
    /// Cancelled; the store keeps the ingested prefix.
    Cancelled,
    Failed(LoadError),
}

impl LoadState {
    fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoadState::Ready | LoadState::Cancelled | LoadState::Failed(_)
        )
    }
}

struct LoadSession {
    receiver: Receiver<LoadMessage>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

/// The viewer engine's public face: start loads, read page or stream
/// text, navigate pages, switch modes.
pub struct TextViewer {
    store: ChunkStore,
    reader: StreamingReader,
    lines_per_page: usize,
    view_mode: ViewMode,
    current_page: usize,
    total_pages: usize,
    state: LoadState,
    session: Option<LoadSession>,
}

impl Default for TextViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextViewer {
    pub fn new() -> Self {
        Self::with_config(&ViewerConfig::default())
    }

    pub fn with_config(config: &ViewerConfig) -> Self {
        Self {
            store: ChunkStore::new(),
            reader: StreamingReader::with_sizes(config.io_buffer_size, config.chunk_size),
            lines_per_page: config.lines_per_page,
            view_mode: config.view_mode,
            current_page: 1,
            total_pages: 1,
            state: LoadState::NotStarted,
            session: None,
        }
    }

    /// Open a file and start loading it.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let source = FileSource::open(path)?;
        self.start_load(source);
        Ok(())
    }

    /// Begin a load session. Any in-flight session is cancelled and its
    /// store cleared first — two sessions never write the same store.
    pub fn start_load<S: ByteSource + 'static>(&mut self, source: S) {
        self.cancel_load();
        self.store.clear();
        self.state = LoadState::Loading(0.0);
        self.current_page = 1;
        self.total_pages = 1;

        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let handle = self
            .reader
            .spawn(source, self.store.writer(), tx, cancel.clone());
        self.session = Some(LoadSession {
            receiver: rx,
            cancel,
            handle: Some(handle),
        });
    }

    /// Drain pending ingestion messages. Returns true when any state,
    /// progress, or content changed.
    pub fn poll(&mut self) -> bool {
        let mut messages = Vec::new();
        if let Some(session) = &self.session {
            while let Ok(message) = session.receiver.try_recv() {
                messages.push(message);
            }
        }

        let mut changed = false;
        for message in messages {
            changed |= self.handle_message(message);
        }
        self.reap_finished_session();
        changed
    }

    /// Block until the current session reaches a terminal state. Calls
    /// `on_progress` with each reported ratio along the way.
    pub fn wait_with<F: FnMut(f64)>(&mut self, mut on_progress: F) {
        let Some(session) = self.session.take() else {
            return;
        };
        while let Ok(message) = session.receiver.recv() {
            if let LoadMessage::Progress(p) = &message {
                on_progress(*p);
            }
            self.handle_message(message);
        }
        if let Some(handle) = session.handle {
            let _ = handle.join();
        }
        // The sender hanging up without a terminal message means the
        // thread died; surface that instead of spinning forever.
        if !self.state.is_terminal() {
            self.state = LoadState::Failed(LoadError::Io {
                path: None,
                message: "ingestion thread exited unexpectedly".to_string(),
            });
        }
    }

    /// Block until the current session reaches a terminal state.
    pub fn wait(&mut self) {
        self.wait_with(|_| {});
    }

    /// Request cancellation of the in-flight session and wait for the
    /// ingestion thread to stop. No-op when nothing is loading.
    pub fn cancel_load(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.cancel.cancel();
        // Dropping the receiver also unblocks any pending send.
        drop(session.receiver);
        if let Some(handle) = session.handle {
            let _ = handle.join();
        }
        if matches!(self.state, LoadState::Loading(_)) {
            self.state = LoadState::Cancelled;
        }
        self.recompute_pages();
    }

    fn handle_message(&mut self, message: LoadMessage) -> bool {
        match message {
            LoadMessage::Progress(p) => {
                if matches!(self.state, LoadState::Loading(_)) {
                    self.state = LoadState::Loading(p);
                    return true;
                }
                false
            }
            LoadMessage::ChunkAdded => {
                // Live pagination while loading; deterministic for a
                // given ingested prefix.
                if self.view_mode == ViewMode::Page {
                    self.recompute_pages();
                }
                true
            }
            LoadMessage::Complete => {
                self.state = LoadState::Ready;
                self.recompute_pages();
                true
            }
            LoadMessage::Cancelled => {
                self.state = LoadState::Cancelled;
                self.recompute_pages();
                true
            }
            LoadMessage::Error(err) => {
                self.state = LoadState::Failed(err);
                self.recompute_pages();
                true
            }
        }
    }

    fn reap_finished_session(&mut self) {
        if self.state.is_terminal() {
            if let Some(session) = self.session.take() {
                if let Some(handle) = session.handle {
                    let _ = handle.join();
                }
            }
        }
    }

    fn recompute_pages(&mut self) {
        match self.view_mode {
            ViewMode::Page => {
                self.total_pages =
                    paginator::page_count(self.store.total_lines(), self.lines_per_page);
                self.current_page = self.current_page.clamp(1, self.total_pages);
            }
            ViewMode::Scroll => {
                self.total_pages = 1;
                self.current_page = 1;
            }
        }
    }

    /// Text for the current view: the current page in Page mode, the
    /// whole decoded stream in Scroll mode. Readable while loading.
    pub fn current_page_text(&self) -> String {
        match self.view_mode {
            ViewMode::Scroll => self.store.all_text(),
            ViewMode::Page => {
                paginator::page_text(&self.store, self.current_page, self.lines_per_page)
            }
        }
    }

    /// Jump to a page, clamped to `[1, total_pages]`. No-op in Scroll
    /// mode.
    pub fn go_to_page(&mut self, page: usize) {
        if self.view_mode != ViewMode::Page {
            return;
        }
        self.current_page = page.clamp(1, self.total_pages);
    }

    /// Advance one page; no-op at the last page or in Scroll mode.
    pub fn next_page(&mut self) {
        if self.view_mode == ViewMode::Page && self.current_page < self.total_pages {
            self.current_page += 1;
        }
    }

    /// Go back one page; no-op at the first page or in Scroll mode.
    pub fn previous_page(&mut self) {
        if self.view_mode == ViewMode::Page && self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    /// Switch presentation mode, recomputing and clamping page state.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode == mode {
            return;
        }
        self.view_mode = mode;
        self.recompute_pages();
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading(_))
    }

    /// Completion ratio: 0 before a load, the last report while loading,
    /// 1 once ready.
    pub fn progress(&self) -> f64 {
        match self.state {
            LoadState::NotStarted => 0.0,
            LoadState::Loading(p) => p,
            LoadState::Ready => 1.0,
            LoadState::Cancelled | LoadState::Failed(_) => 0.0,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn total_lines(&self) -> usize {
        self.store.total_lines()
    }

    pub fn chunk_count(&self) -> usize {
        self.store.chunk_count()
    }
}

impl Drop for TextViewer {
    fn drop(&mut self) {
        // Stop the ingestion thread before the store goes away.
        self.cancel_load();
    }
}
