//! Viewer configuration.
//!
//! Read from an optional JSON file; missing fields fall back to the
//! defaults. Writing settings back is a front-end concern and not done
//! here.

use crate::reader::{DEFAULT_CHUNK_SIZE, DEFAULT_IO_BUFFER_SIZE};
use crate::viewer::ViewMode;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Page height in Page mode.
    pub lines_per_page: usize,
    /// Initial presentation mode.
    pub view_mode: ViewMode,
    /// Size of a single I/O read.
    pub io_buffer_size: usize,
    /// Decoded-text threshold for emitting a chunk.
    pub chunk_size: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            lines_per_page: crate::paginator::DEFAULT_LINES_PER_PAGE,
            view_mode: ViewMode::default(),
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ViewerConfig {
    /// Load from a JSON file and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: ViewerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lines_per_page == 0 {
            bail!("lines_per_page must be greater than zero");
        }
        if self.io_buffer_size == 0 || self.chunk_size == 0 {
            bail!("io_buffer_size and chunk_size must be greater than zero");
        }
        if self.io_buffer_size > self.chunk_size {
            bail!(
                "io_buffer_size ({}) must not exceed chunk_size ({})",
                self.io_buffer_size,
                self.chunk_size
            );
        }
        Ok(())
    }
}
