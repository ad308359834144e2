//! Quiz admin console - a line-oriented client for the quiz platform admin API.
//!
//! Sessions are cookie based. When a session can no longer be refreshed the
//! console clears its state and returns to the login screen.

mod app;
mod commands;
mod input;
mod render;

use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, Flow};
use input::Input;
use quizadmin_core::Config;

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "quizadmin.log";

/// Initialize the tracing subscriber for logging
///
/// Logs go to a daily file so they never interleave with console output.
/// The returned guard must stay alive for buffered lines to be flushed.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match config.log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let _log_guard = init_tracing(&config);
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    info!(base_url = %config.base_url(), "Quiz admin console starting");

    let mut app = App::new(config)?;
    app.start().await;

    let result = run_console(&mut app).await;
    app.shutdown();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Quiz admin console shutting down");
    Ok(())
}

/// Read commands until `quit` or end of input.
///
/// Location changes are echoed as they happen, including redirects caused by
/// an expired session in the middle of a command.
async fn run_console(app: &mut App) -> Result<()> {
    let hide_passwords = io::stdin().is_terminal();
    let mut input = Input::new(BufReader::new(tokio::io::stdin()), hide_passwords);
    let mut location = app.router.watch();
    location.borrow_and_update();

    loop {
        print_prompt(&app.router.current_path())?;

        let line = tokio::select! {
            line = input.next_line() => line?,
            changed = location.changed() => {
                if changed.is_ok() {
                    println!();
                    println!("-> {}", location.borrow_and_update().as_str());
                }
                continue;
            }
        };

        let Some(line) = line else {
            println!();
            break;
        };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let flow = app.execute(command, &mut input).await?;
        // Navigation performed by the command itself is already on screen
        location.borrow_and_update();
        if flow == Flow::Quit {
            break;
        }
    }

    Ok(())
}

fn print_prompt(path: &str) -> Result<()> {
    print!("quizadmin {}> ", path);
    io::stdout().flush()?;
    Ok(())
}
