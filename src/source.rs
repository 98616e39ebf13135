//! Byte sources feeding the streaming reader.
//!
//! A source is any sequential reader that can additionally report its
//! total size when known; the size hint drives progress reporting and
//! nothing else.

use crate::error::LoadError;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

/// Sequential byte access to the underlying content.
pub trait ByteSource: Read + Send {
    /// Total size in bytes, if the source knows it up front.
    ///
    /// `None` degrades progress reporting to "1.0 at end of source".
    fn total_size(&self) -> Option<u64>;
}

/// File-backed source; size comes from metadata at open time.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    size: Option<u64>,
    path: PathBuf,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| LoadError::io(&path, &e))?;
        // Size hint is best-effort: a FIFO or special file may not have one.
        let size = file
            .metadata()
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len());

        Ok(Self { file, size, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

impl ByteSource for FileSource {
    fn total_size(&self) -> Option<u64> {
        self.size
    }
}

/// In-memory source for piped input and tests; size is always known.
pub struct MemorySource {
    cursor: Cursor<Vec<u8>>,
    size: u64,
}

impl MemorySource {
    pub fn new(bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            cursor: Cursor::new(bytes),
            size,
        }
    }
}

impl Read for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl ByteSource for MemorySource {
    fn total_size(&self) -> Option<u64> {
        Some(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_reports_size() -> anyhow::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"hello\nworld\n")?;
        temp_file.flush()?;

        let source = FileSource::open(temp_file.path())?;
        assert_eq!(source.total_size(), Some(12));
        assert_eq!(source.path(), temp_file.path());

        Ok(())
    }

    #[test]
    fn test_file_source_reads_sequentially() -> anyhow::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"abcdef")?;
        temp_file.flush()?;

        let mut source = FileSource::open(temp_file.path())?;
        let mut buf = [0u8; 4];
        assert_eq!(source.read(&mut buf)?, 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(source.read(&mut buf)?, 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(source.read(&mut buf)?, 0);

        Ok(())
    }

    #[test]
    fn test_file_source_missing_file_is_io_error() {
        let err = FileSource::open("/nonexistent/really/not/here.txt").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("not/here.txt"));
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new(b"12345".to_vec());
        assert_eq!(source.total_size(), Some(5));

        let mut out = Vec::new();
        source.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"12345");
    }

    #[test]
    fn test_memory_source_empty() {
        let mut source = MemorySource::new(Vec::new());
        assert_eq!(source.total_size(), Some(0));
        let mut buf = [0u8; 8];
        assert_eq!(source.read(&mut buf).unwrap(), 0);
    }
}
