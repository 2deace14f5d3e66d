//! Read-only views of the journal.

use crate::constants::DISPLAY_TIMESTAMP_FORMAT;
use crate::errors::AppResult;
use crate::post_core::{sorted_descending, Post};
use crate::post_io::PostStore;
use crate::streak::current_streak;
use std::io::Write;
use tracing::debug;

fn day_word(days: u32) -> &'static str {
    if days == 1 {
        "day"
    } else {
        "days"
    }
}

fn write_post(out: &mut impl Write, post: &Post) -> AppResult<()> {
    writeln!(
        out,
        "#{}  {}",
        post.id,
        post.timestamp.format(DISPLAY_TIMESTAMP_FORMAT)
    )?;
    for line in post.content.lines() {
        writeln!(out, "    {}", line)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Prints the current streak followed by every post, newest first.
///
/// # Flow
///
/// 1. Load the collection (a missing or corrupt file reads as empty)
/// 2. Compute the streak against today
/// 3. Print posts in descending timestamp order
///
/// # Errors
///
/// Returns an error if the posts file cannot be read or the writer fails.
pub fn list_posts(store: &PostStore, out: &mut impl Write) -> AppResult<()> {
    let posts = store.load_posts()?;
    let streak = current_streak(&posts);
    debug!("Listing {} posts", posts.len());

    writeln!(out, "Current streak: {} {}", streak, day_word(streak))?;
    if posts.is_empty() {
        writeln!(out, "No posts yet.")?;
        return Ok(());
    }

    writeln!(out)?;
    for post in sorted_descending(&posts) {
        write_post(out, &post)?;
    }
    Ok(())
}

/// Prints the current streak as a bare number.
pub fn show_streak(store: &PostStore, out: &mut impl Write) -> AppResult<u32> {
    let streak = current_streak(&store.load_posts()?);
    writeln!(out, "{}", streak)?;
    Ok(streak)
}
