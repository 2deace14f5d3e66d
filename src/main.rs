/*!
# Jotter - A Small Journaling Service

This file contains the main application flow: it parses arguments, sets up
logging, loads configuration, and dispatches to the requested subcommand.

## Usage

```
jotter [OPTIONS] <COMMAND>

Commands:
  list    Print all posts, newest first, with the current streak
  add     Add a post
  edit    Replace the text of a post
  delete  Delete a post
  streak  Print the current streak in days
  serve   Run the HTTP server

Options:
      --data-file <PATH>         Path to the posts file (overrides JOTTER_DATA_FILE)
      --log-format <LOG_FORMAT>  Log output format [default: text] [possible values: text, json]
      --log-level <LOG_LEVEL>    Log level or filter directive [default: info]
  -v, --verbose                  Shorthand for --log-level debug
```

## Configuration

- `JOTTER_DATA_FILE`: the posts file (defaults to `posts.json` in the working directory)
- `JOTTER_BIND`: the HTTP listen address (defaults to `127.0.0.1:5000`)
- `RUST_LOG`: overrides `--log-level`
*/

use clap::Parser;
use jotter::cli::{CliArgs, Command};
use jotter::config::Config;
use jotter::constants::{TRACING_ROOT_SPAN_NAME, TRACING_SERVICE_NAME};
use jotter::errors::{AppError, AppResult};
use jotter::logging::init_tracing;
use jotter::ops;
use jotter::post_io::PostStore;
use jotter::server;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, info_span};

fn run(args: CliArgs) -> AppResult<()> {
    let config = Config::load()?.with_overrides(args.data_file.as_deref(), args.bind_override())?;
    config.validate()?;
    debug!("Configuration: {:?}", config);

    let store = PostStore::new(config.data_file.clone());
    let mut stdout = io::stdout().lock();

    match args.command {
        Command::List => ops::list_posts(&store, &mut stdout),
        Command::Add { content } => ops::add_post(&store, content, &mut stdout).map(|_| ()),
        Command::Edit { id, content } => ops::edit_post(&store, id, content, &mut stdout),
        Command::Delete { id } => ops::delete_post(&store, id, &mut stdout),
        Command::Streak => ops::show_streak(&store, &mut stdout).map(|_| ()),
        Command::Serve { .. } => {
            drop(stdout);
            let addr = config.socket_addr()?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| AppError::Server(format!("Failed to start runtime: {}", e)))?;
            runtime.block_on(server::serve(Arc::new(store), addr))
        }
    }
}

/// The main entry point for the jotter application.
///
/// Logging is set up before anything else so that configuration errors are
/// reported through the same channel. Every invocation runs inside a root
/// span carrying a fresh correlation id.
fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = init_tracing(args.log_format, args.effective_log_level()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let correlation_id = uuid::Uuid::new_v4();
    let root_span = info_span!(
        TRACING_ROOT_SPAN_NAME,
        service_name = TRACING_SERVICE_NAME,
        correlation_id = %correlation_id
    );
    let _enter = root_span.enter();

    info!("Starting jotter");
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
