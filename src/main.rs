//! Entry point for the terminal book reader.
//!
//! - Parse command-line arguments.
//! - Load configuration (default `conf/config.toml`).
//! - Either dump one chapter or start the interactive reader.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use swiftdown::chapter_store::ChapterStore;
use swiftdown::cli::Cli;
use swiftdown::config::{AppConfig, load_config};
use swiftdown::net::{ApiClient, HttpTransport};
use swiftdown::normalizer::ContentNormalizer;
use swiftdown::pagination::Paginator;
use swiftdown::reader::{Message, ReaderSession, ReaderWindowState, Runtime};
use swiftdown::terminal::{self, TerminalSurface};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let cli = Cli::parse();
    let reload_handle = init_tracing();
    if let Err(err) = run(&cli, &reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, reload_handle: &ReloadHandle) -> Result<()> {
    let config = load_config(&cli.config);
    let level = cli
        .verbosity_filter()
        .unwrap_or_else(|| config.log_level.as_filter_str());
    set_log_level(reload_handle, level);
    info!(
        book_id = %cli.book_id,
        base_url = %config.base_url,
        config = %cli.config.display(),
        "Starting reader"
    );

    let mut store = build_store(&config, &cli.book_id)?;
    let start_chapter = cli.chapter.unwrap_or(1).saturating_sub(1);

    if cli.dump {
        let mut stdout = io::stdout().lock();
        return terminal::dump_chapter(&mut store, start_chapter, &mut stdout);
    }

    let wait = Duration::from_secs(config.request_timeout_secs.max(1) + 1);
    let session = ReaderSession::new(
        store,
        ReaderWindowState::new(config.total_virtual_sections),
        config.page_height,
        config.initial_batch,
    );
    let mut runtime = Runtime::new(
        session,
        TerminalSurface::new(io::stdout()),
        config.download_threads,
    );
    runtime.start();
    if !runtime.run_until_idle(wait) {
        warn!("Continuing before every initial request finished");
    }
    if runtime.session().store().is_empty() {
        anyhow::bail!("Book {} has no chapters", cli.book_id);
    }
    if start_chapter > 0 {
        runtime.dispatch(Message::JumpToChapter(start_chapter));
        runtime.run_until_idle(wait);
    }

    terminal::run_interactive(&mut runtime, io::stdin().lock(), wait)
}

fn build_store(config: &AppConfig, book_id: &str) -> Result<ChapterStore> {
    let transport = HttpTransport::new(config).context("Preparing HTTP transport")?;
    let client = ApiClient::new(Arc::new(transport), config);
    Ok(ChapterStore::new(
        client,
        Paginator::from_config(config),
        ContentNormalizer::from_config(config),
        book_id,
    ))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        info!("RUST_LOG is set; keeping its filter");
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level");
    }
}
