/*!
# Jotter

Jotter is a small journaling service. You write short dated posts; it keeps
them in a single JSON file, lists them newest first, and tells you how many
days in a row you have written.

## Core Features

- Add, edit and delete posts over HTTP or from the command line
- List posts in reverse-chronological order
- Current streak: consecutive days with at least one post, ending today or yesterday
- One human-readable JSON file, replaced atomically on every write

## Architecture

- `post_core`: the `Post` model and pure transforms (append, edit, delete, ordering)
- `post_io`: `PostStore`, the file-backed collection with serialized writes
- `streak`: streak calculation over a slice of posts
- `server`: axum routes over the store
- `ops`: the operations behind the CLI subcommands
- `cli`, `config`, `logging`, `errors`: the ambient plumbing

## Usage Example

```rust,no_run
use jotter::post_core::{sorted_descending, PostDraft};
use jotter::post_io::PostStore;
use jotter::streak::current_streak;

fn main() -> jotter::AppResult<()> {
    let store = PostStore::new("posts.json");
    store.append(PostDraft::with_content("Started a journal"))?;

    let posts = store.load_posts()?;
    println!("streak: {}", current_streak(&posts));
    for post in sorted_descending(&posts) {
        println!("{} {}", post.timestamp, post.content);
    }
    Ok(())
}
```
*/

/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Constants used throughout the application
pub mod constants;
/// Error types and utilities for error handling
pub mod errors;
/// Tracing subscriber setup
pub mod logging;
/// High-level operations behind the CLI
pub mod ops;
/// Post model and pure collection transforms
pub mod post_core;
/// File-backed post store
pub mod post_io;
/// HTTP routes
pub mod server;
/// Streak calculation
pub mod streak;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use post_core::{Post, PostDraft};
pub use post_io::{LoadOutcome, PostStore};
