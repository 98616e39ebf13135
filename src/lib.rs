// Library interface for folio
// The binary and embedding front-ends drive TextViewer; everything below
// it is exposed for reuse and tests.

pub mod cancel;
pub mod chunk;
pub mod config;
pub mod encoding;
pub mod error;
pub mod paginator;
pub mod reader;
pub mod source;
pub mod viewer;
