use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use bookflip::api::HttpRemoteStore;
use bookflip::event_source::TerminalEventSource;
use bookflip::panic_handler;
use bookflip::settings::Settings;
use bookflip::{App, run_app_with_event_source};

#[derive(Parser, Debug)]
#[command(name = "bookflip", about = "Terminal flipbook viewer with notes and highlights")]
struct Cli {
    /// Base URL of the book server
    #[arg(long, default_value = "http://localhost:5000")]
    server: String,

    /// Book id on the server
    #[arg(long)]
    book: i64,

    /// Number of pages in the book
    #[arg(long)]
    pages: usize,

    /// Title shown in the header
    #[arg(long, default_value = "Book")]
    title: String,

    /// Show one page per view instead of facing pairs
    #[arg(long)]
    single_page: bool,

    /// Log file path
    #[arg(long, default_value = "bookflip.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create(&cli.log_file)?,
    )?;
    panic_handler::initialize_panic_handler();

    info!("starting bookflip for book {} at {}", cli.book, cli.server);

    let mut settings = Settings::load();
    if cli.single_page {
        settings.spread = false;
    }

    // The initial annotation load happens before the terminal switches
    // modes, so a slow server never leaves a broken screen behind.
    let remote = Box::new(HttpRemoteStore::new(cli.server, cli.book));
    let mut app = App::new(remote, cli.pages, cli.title, settings);

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_source = TerminalEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("application error: {err:?}");
        println!("{err:?}");
    }

    info!("shutting down bookflip");
    Ok(())
}
