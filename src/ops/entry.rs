//! Create, edit and delete posts from the command line.

use crate::errors::AppResult;
use crate::post_core::PostDraft;
use crate::post_io::PostStore;
use std::io::Write;

/// Adds a post and prints its id.
///
/// # Errors
///
/// Returns `AppError::Post` for blank content, or a store error if the
/// posts file cannot be locked, read or written.
pub fn add_post(store: &PostStore, content: String, out: &mut impl Write) -> AppResult<u64> {
    let (_, id) = store.append(PostDraft::with_content(content))?;
    writeln!(out, "Added post #{}", id)?;
    Ok(id)
}

/// Replaces the text of post `id`.
pub fn edit_post(
    store: &PostStore,
    id: u64,
    content: String,
    out: &mut impl Write,
) -> AppResult<()> {
    store.edit(id, Some(content))?;
    writeln!(out, "Updated post #{}", id)?;
    Ok(())
}

/// Deletes post `id`.
pub fn delete_post(store: &PostStore, id: u64, out: &mut impl Write) -> AppResult<()> {
    store.delete(id)?;
    writeln!(out, "Deleted post #{}", id)?;
    Ok(())
}
