use anyhow::{anyhow, Context, Result};
use clap::Parser;
use folio::config::ViewerConfig;
use folio::source::MemorySource;
use folio::viewer::{LoadState, TextViewer, ViewMode};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "A viewer for huge plain-text files with streaming decode and pagination", long_about = None)]
struct Args {
    /// File to view (use - for stdin)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Jump to a page (implies page mode)
    #[arg(short, long, value_name = "N")]
    page: Option<usize>,

    /// Presentation mode: scroll (whole stream) or page
    #[arg(long, value_name = "MODE")]
    mode: Option<ViewMode>,

    /// Page height in lines
    #[arg(long, value_name = "N")]
    lines_per_page: Option<usize>,

    /// Path to a JSON config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print totals (lines, pages, chunks) instead of content
    #[arg(long)]
    info: bool,

    /// Suppress the progress line on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(lines_per_page) = args.lines_per_page {
        config.lines_per_page = lines_per_page;
    }
    if let Some(mode) = args.mode {
        config.view_mode = mode;
    }
    if args.page.is_some() {
        config.view_mode = ViewMode::Page;
    }
    config.validate()?;

    let mut viewer = TextViewer::with_config(&config);

    if args.file.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read from stdin")?;
        viewer.start_load(MemorySource::new(bytes));
    } else {
        viewer
            .open(&args.file)
            .with_context(|| format!("Failed to open: {}", args.file.display()))?;
    }

    load_with_progress(&mut viewer, args.quiet);

    match viewer.state() {
        LoadState::Ready => {}
        LoadState::Failed(err) => return Err(anyhow::Error::new(err.clone())),
        other => return Err(anyhow!("load ended in unexpected state: {:?}", other)),
    }

    if args.info {
        println!("lines:  {}", viewer.total_lines());
        println!("pages:  {}", viewer.total_pages());
        println!("chunks: {}", viewer.chunk_count());
        return Ok(());
    }

    if let Some(page) = args.page {
        viewer.go_to_page(page);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(viewer.current_page_text().as_bytes())?;
    // Page text carries no trailing newline; keep the shell prompt clean.
    if viewer.view_mode() == ViewMode::Page {
        writeln!(out)?;
    }

    Ok(())
}

/// Pump the viewer until the load finishes, drawing a progress line on
/// stderr for interactive use.
fn load_with_progress(viewer: &mut TextViewer, quiet: bool) {
    while viewer.is_loading() {
        if viewer.poll() && !quiet {
            eprint!("\rloading... {:3.0}%", viewer.progress() * 100.0);
        }
        std::thread::sleep(PROGRESS_POLL_INTERVAL);
    }
    if !quiet {
        eprint!("\r                 \r");
    }
}
