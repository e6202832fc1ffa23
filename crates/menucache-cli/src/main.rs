//! menucache - interactive driver for the offline-aware menu cache.
//!
//! Loads the configured menu API (or the bundled sample menu), mirrors it to
//! the local cache directory and reads commands from stdin so connectivity
//! transitions can be simulated by hand.

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use menucache_core::utils::{format_price, truncate_string};
use menucache_core::{
    ApiClient, Config, Connectivity, ConnectivityMonitor, FileStorage, LocalMenuStore, MenuCache,
    MenuCollection, MenuItem, MenuSource, MenuView,
};

/// Log file written inside the cache directory
const LOG_FILE: &str = "menucache.log";

/// Width of the name column when listing items
const NAME_COLUMN_WIDTH: usize = 28;

const HELP: &str = "\
Commands:
  show            print the current menu view
  featured        list featured items
  online          report that the network came back
  offline         report that the network went away
  refresh         retry syncing with the remote menu
  save <file>     save a JSON menu through the write path
  status          print connectivity and sync status
  help            show this help
  quit            exit";

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: menucache [--offline] [--write-config]\n\n{}", HELP);
        return Ok(());
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    if args.iter().any(|a| a == "--offline") {
        config.start_offline = true;
    }
    if args.iter().any(|a| a == "--write-config") {
        config.save()?;
        println!("Wrote {}", Config::config_path()?.display());
        return Ok(());
    }

    let cache_dir = config.cache_dir()?;
    let storage = FileStorage::new(cache_dir.clone())?;
    let _log_guard = init_tracing(&cache_dir);
    info!(cache_dir = ?storage.cache_dir(), api = ?config.api_base_url, "menucache starting");

    let remote: Option<Arc<dyn MenuSource>> = match &config.api_base_url {
        Some(url) => Some(Arc::new(
            ApiClient::with_timeout(url.clone(), config.request_timeout())
                .context("Failed to build API client")?,
        )),
        None => {
            warn!("No API URL configured, serving the cached or sample menu");
            None
        }
    };

    let initial = if config.start_offline {
        Connectivity::Offline
    } else {
        Connectivity::Online
    };
    let monitor = ConnectivityMonitor::new(initial).with_reconnect_window(config.reconnect_window());
    let store = LocalMenuStore::new(Arc::new(storage));
    let cache = MenuCache::start(monitor.clone(), store, remote).await;

    println!("{}", HELP);
    print_view(&cache.view());

    let result = run_repl(&cache, &monitor).await;
    cache.shutdown().await;

    info!("menucache shutting down");
    result
}

async fn run_repl(cache: &MenuCache, monitor: &ConnectivityMonitor) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };

        match command {
            "show" => print_view(&cache.view()),
            "featured" => {
                let view = cache.view();
                for item in view.items.featured() {
                    println!("  * {} {}", item.name, format_price(item.price));
                }
            }
            "online" => monitor.report(Connectivity::Online),
            "offline" => monitor.report(Connectivity::Offline),
            "refresh" => cache.refresh(),
            "save" => match parts.next() {
                Some(path) => match read_menu(Path::new(path)) {
                    Ok(items) => match cache.save_menu_items(items).await {
                        Ok(()) => println!("Saved."),
                        Err(e) => println!("Save failed: {}", e),
                    },
                    Err(e) => println!("Could not read {}: {:#}", path, e),
                },
                None => println!("Usage: save <file>"),
            },
            "status" => {
                let state = monitor.current();
                let view = cache.view();
                println!(
                    "network: {:?}{}  source: {:?}  sync: {:?}  last synced: {}",
                    state.status,
                    if state.just_reconnected { " (just reconnected)" } else { "" },
                    view.source,
                    view.sync_status,
                    view.last_synced_display(),
                );
            }
            "help" => println!("{}", HELP),
            "quit" | "exit" => break,
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
    }

    Ok(())
}

fn read_menu(path: &Path) -> Result<MenuCollection> {
    let contents = std::fs::read_to_string(path)?;
    Ok(MenuCollection::from_json(&contents)?)
}

fn print_view(view: &MenuView) {
    if view.loading {
        println!("Loading menu...");
        return;
    }
    if let Some(ref error) = view.error {
        println!("Menu unavailable: {}", error);
    }

    let mut flags = Vec::new();
    if view.is_offline {
        flags.push("offline");
    }
    if view.is_syncing {
        flags.push("syncing");
    }
    if view.sync_failed() {
        flags.push("sync failed");
    }
    println!(
        "{} items from {:?}{}",
        view.items.len(),
        view.source,
        if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        }
    );

    for category in view.items.categories() {
        println!("{}", category);
        print_items(&view.items.in_category(category));
    }
    let other = view.items.uncategorized();
    if !other.is_empty() {
        println!("Other");
        print_items(&other);
    }
}

fn print_items(items: &[&MenuItem]) {
    for item in items {
        println!(
            "  {:<width$} {:>8}  {}",
            truncate_string(&item.name, NAME_COLUMN_WIDTH),
            format_price(item.price),
            if item.is_available() { "" } else { "sold out" },
            width = NAME_COLUMN_WIDTH,
        );
    }
}
