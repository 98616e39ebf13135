//! Fixed-length page windows over the chunk store.
//!
//! A page is a 1-based window of `lines_per_page` absolute lines over the
//! concatenated decoded text. Page math is pure; slicing reads the store
//! once so the result is a consistent snapshot even during ingestion.

use crate::chunk::{count_lines, ChunkStore};

/// Default page height, in lines.
pub const DEFAULT_LINES_PER_PAGE: usize = 100;

/// Number of pages for `total_lines`. An empty document still has one
/// (empty) page.
pub fn page_count(total_lines: usize, lines_per_page: usize) -> usize {
    total_lines.div_ceil(lines_per_page).max(1)
}

/// Text of the given page: lines `[(page-1)*lpp, min(page*lpp, total))`
/// joined with single newlines. Out-of-range page numbers clamp.
pub fn page_text(store: &ChunkStore, page: usize, lines_per_page: usize) -> String {
    let text = store.all_text();
    // Recomputed from the snapshot rather than read separately from the
    // store, so page slicing never races an in-flight append.
    let total_lines = count_lines(&text);

    let pages = page_count(total_lines, lines_per_page);
    let page = page.clamp(1, pages);

    let start = (page - 1) * lines_per_page;
    let end = (page * lines_per_page).min(total_lines);
    if start >= end {
        return String::new();
    }

    // split('\n') yields a phantom empty tail when the text ends with a
    // newline; it is never selected because end <= total_lines.
    let selected: Vec<&str> = text.split('\n').skip(start).take(end - start).collect();
    selected.join("\n")
}
