use std::fs::{self, File};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use quire::autosave::AutoSaver;
use quire::renderer::{PlainRenderer, Renderer, StyleDescriptor};
use quire::session::{ReaderSession, SessionOptions};
use quire::settings;
use quire::store::{self, JsonStore, PersistenceGateway};
use quire::{EpubProvider, Position};

#[derive(Parser, Debug)]
#[command(
    name = "quire",
    version,
    about = "Read EPUB books from the terminal, resuming where you left off"
)]
struct Cli {
    /// EPUB file to open
    book: PathBuf,

    /// Page width in columns (overrides the config file)
    #[arg(long)]
    width: Option<u16>,

    /// Page height in lines (overrides the config file)
    #[arg(long)]
    height: Option<u16>,

    /// Line spacing factor (overrides the config file)
    #[arg(long)]
    line_spacing: Option<f32>,

    /// Font size; scales the style hint passed to the renderer
    #[arg(long)]
    font_size: Option<u16>,

    /// Print the table of contents and exit
    #[arg(long)]
    toc: bool,

    /// Print search hits for the query and exit
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,

    /// Jump to a 1-based chapter (and optional page) before printing
    #[arg(long, value_name = "CHAPTER[:PAGE]")]
    goto: Option<String>,

    /// Move this many pages forward (negative: backward) before printing
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    advance: i64,

    /// Toggle a bookmark at the resulting position
    #[arg(long)]
    bookmark: bool,

    /// Note to attach when --bookmark creates one
    #[arg(long, value_name = "NOTE")]
    note: Option<String>,

    /// List bookmarks for this book and exit
    #[arg(long)]
    bookmarks: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut display = settings::load_settings();
    let mut changed = false;
    if let Some(width) = cli.width {
        display.page_width = width;
        changed = true;
    }
    if let Some(height) = cli.height {
        display.page_height = height;
        changed = true;
    }
    if let Some(spacing) = cli.line_spacing {
        display.line_spacing = spacing;
        changed = true;
    }
    if let Some(size) = cli.font_size {
        display.font_size = size;
        changed = true;
    }
    let geometry = display.geometry().context("Rejected display settings")?;
    if changed {
        settings::save_settings(&display);
    }

    let store: Arc<dyn PersistenceGateway> = Arc::new(JsonStore::load_or_ephemeral(
        store::default_store_path().as_deref(),
    ));
    let provider = EpubProvider::new();
    let mut session = ReaderSession::open(
        &provider,
        store.clone(),
        &cli.book,
        geometry,
        SessionOptions {
            inactivity_threshold: display.inactivity_threshold(),
        },
    )
    .with_context(|| format!("Failed to open {:?}", cli.book))?;
    info!("Session opened for {:?}", cli.book);

    if cli.toc {
        for entry in session.toc() {
            println!("{:>3}  {}", entry.chapter_index + 1, entry.title);
        }
        session.close()?;
        return Ok(());
    }

    if let Some(query) = &cli.search {
        for hit in session.search(query) {
            println!(
                "{} · pg {}: {}",
                hit.chapter_title,
                hit.position.page + 1,
                hit.line.trim()
            );
        }
        session.close()?;
        return Ok(());
    }

    if cli.bookmarks {
        for bookmark in session.bookmarks() {
            let note = bookmark.note.as_deref().unwrap_or("");
            println!(
                "#{} ch {} pg {} {}",
                bookmark.id,
                bookmark.position.chapter + 1,
                bookmark.position.page + 1,
                note
            );
        }
        session.close()?;
        return Ok(());
    }

    // Snapshots published here reach the store within one interval even if
    // the process is killed before the final close.
    let autosave = AutoSaver::start(store, display.auto_save_interval());

    if let Some(target) = &cli.goto {
        session.goto(parse_goto(target)?);
    }
    for _ in 0..cli.advance.abs() {
        if cli.advance > 0 {
            session.next_page();
        } else {
            session.prev_page();
        }
    }
    if cli.bookmark {
        session.toggle_bookmark(cli.note.clone());
    }
    autosave.publish(session.snapshot_record());

    let style = StyleDescriptor::from(session.geometry());
    let progress = session.progress();
    PlainRenderer::new(stdout()).render_page(session.current_page(), &style, progress)?;

    autosave.stop();
    session.close()?;
    Ok(())
}

/// Parse "CHAPTER" or "CHAPTER:PAGE" (1-based) into a position.
fn parse_goto(target: &str) -> Result<Position> {
    let (chapter, page) = match target.split_once(':') {
        Some((chapter, page)) => (chapter, page.parse::<usize>()?),
        None => (target, 1),
    };
    let chapter = chapter.parse::<usize>()?;
    if chapter == 0 || page == 0 {
        bail!("chapter and page are 1-based");
    }
    Ok(Position::new(chapter - 1, page - 1))
}

fn init_logging() {
    let Some(base) = dirs::state_dir().or_else(dirs::cache_dir) else {
        return;
    };
    let log_dir = base.join("quire");
    if fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    if let Ok(file) = File::create(log_dir.join("quire.log")) {
        let _ = WriteLogger::init(LevelFilter::Info, Config::default(), file);
    }
}
