//! High-level operations behind the CLI subcommands.
//!
//! Each operation takes the store and a writer for its output, so the binary
//! prints to stdout while tests capture into a buffer.

pub mod entry;
pub mod view;

// Re-export commonly used functions
pub use entry::{add_post, delete_post, edit_post};
pub use view::{list_posts, show_streak};
