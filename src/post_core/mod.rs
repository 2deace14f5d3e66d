//! Core post functionality without I/O operations.
//!
//! This module contains the `Post` data model and the pure transforms over a
//! collection of posts: append, edit, delete and the view-time ordering. Every
//! transform takes an owned snapshot and returns the next one, leaving the
//! decision of when to persist to the caller. The reference time is passed in
//! explicitly so callers (and tests) control the clock.

use crate::constants::RESERVED_POST_FIELDS;
use crate::errors::PostError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A single journal entry.
///
/// `id`, `content` and `timestamp` are owned by the store. Any other fields a
/// client sent along are kept in `extra` and written back verbatim.
///
/// # Examples
///
/// ```
/// use jotter::post_core::Post;
///
/// let json = r#"{"id": 3, "content": "hello", "timestamp": "2024-01-15T14:30:00.123456", "mood": "calm"}"#;
/// let post: Post = serde_json::from_str(json).unwrap();
///
/// assert_eq!(post.id, 3);
/// assert_eq!(post.extra["mood"], "calm");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Positive id, unique within the store.
    pub id: u64,

    /// The entry text.
    pub content: String,

    /// Local wall-clock time of creation or of the last edit.
    ///
    /// Serialized as ISO-8601 without an offset, e.g. `2024-01-15T14:30:00.123456`.
    pub timestamp: NaiveDateTime,

    /// Caller-supplied side fields, preserved but not interpreted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The body of a create request.
///
/// `content` is optional at the type level so that a missing field surfaces as
/// a `PostError::Validation` rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    /// The entry text. Required.
    #[serde(default)]
    pub content: Option<String>,

    /// Any other fields the client sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PostDraft {
    /// Creates a draft carrying only content.
    pub fn with_content(content: impl Into<String>) -> Self {
        PostDraft {
            content: Some(content.into()),
            extra: Map::new(),
        }
    }
}

/// The body of an edit request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    /// Replacement text. Required.
    #[serde(default)]
    pub content: Option<String>,
}

/// Returns the id the next appended post receives: one past the largest id,
/// or `1` for an empty collection.
///
/// # Examples
///
/// ```
/// use jotter::post_core::next_id;
///
/// assert_eq!(next_id(&[]), 1);
/// ```
pub fn next_id(posts: &[Post]) -> u64 {
    posts.iter().map(|post| post.id).max().unwrap_or(0) + 1
}

fn require_content(content: Option<String>) -> Result<String, PostError> {
    match content {
        None => Err(PostError::Validation("content is required".to_string())),
        Some(text) if text.trim().is_empty() => Err(PostError::Validation(
            "content must not be empty".to_string(),
        )),
        Some(text) => Ok(text),
    }
}

/// Appends a new post built from `draft`.
///
/// Assigns `id = max(existing ids) + 1` (or `1`) and `timestamp = now`. Any
/// `id` or `timestamp` the client put in the draft is discarded.
///
/// # Returns
///
/// The updated collection (new post at the end) and the assigned id.
///
/// # Errors
///
/// Returns `PostError::Validation` if the draft has no content or only whitespace.
///
/// # Examples
///
/// ```
/// use jotter::post_core::{append, PostDraft};
/// use chrono::NaiveDate;
///
/// let now = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let (posts, id) = append(Vec::new(), PostDraft::with_content("first"), now).unwrap();
///
/// assert_eq!(id, 1);
/// assert_eq!(posts[0].timestamp, now);
/// ```
pub fn append(
    mut posts: Vec<Post>,
    draft: PostDraft,
    now: NaiveDateTime,
) -> Result<(Vec<Post>, u64), PostError> {
    let content = require_content(draft.content)?;
    let id = next_id(&posts);

    let mut extra = draft.extra;
    for key in RESERVED_POST_FIELDS {
        extra.remove(*key);
    }

    posts.push(Post {
        id,
        content,
        timestamp: now,
        extra,
    });

    Ok((posts, id))
}

/// Replaces the content of the post with `id` and refreshes its timestamp.
///
/// The id and all extra fields are left untouched.
///
/// # Errors
///
/// - `PostError::Validation` if `new_content` is absent or blank
/// - `PostError::NotFound` if no post has this id; the collection is dropped
///   unchanged in that case, the caller still holds its own snapshot
pub fn edit(
    mut posts: Vec<Post>,
    id: u64,
    new_content: Option<String>,
    now: NaiveDateTime,
) -> Result<Vec<Post>, PostError> {
    let content = require_content(new_content)?;

    let post = posts
        .iter_mut()
        .find(|post| post.id == id)
        .ok_or(PostError::NotFound { id })?;
    post.content = content;
    post.timestamp = now;

    Ok(posts)
}

/// Removes the post with `id`.
///
/// # Errors
///
/// Returns `PostError::NotFound` if the collection length is unchanged.
pub fn delete(mut posts: Vec<Post>, id: u64) -> Result<Vec<Post>, PostError> {
    let before = posts.len();
    posts.retain(|post| post.id != id);

    if posts.len() == before {
        return Err(PostError::NotFound { id });
    }

    Ok(posts)
}

/// Returns a copy of `posts` ordered newest first.
///
/// Ties on timestamp fall back to the higher id first so the view is stable.
/// The input is never reordered.
pub fn sorted_descending(posts: &[Post]) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    sorted
}

/// Checks the id invariants of a collection read from disk.
///
/// Duplicate ids are tolerated here; files written by earlier versions can
/// contain them. See [`renumber_duplicates`].
///
/// # Errors
///
/// Returns a description of the first violation: a zero id.
pub fn check_integrity(posts: &[Post]) -> Result<(), String> {
    if posts.iter().any(|post| post.id == 0) {
        return Err("post id 0 is not a valid id".to_string());
    }
    Ok(())
}

/// Returns every id that appears more than once, in order of first repeat.
pub fn duplicate_ids(posts: &[Post]) -> Vec<u64> {
    let mut seen = HashSet::with_capacity(posts.len());
    let mut duplicates = Vec::new();
    for post in posts {
        if !seen.insert(post.id) && !duplicates.contains(&post.id) {
            duplicates.push(post.id);
        }
    }
    duplicates
}

/// Gives every repeated id a fresh one past the current maximum.
///
/// The first post carrying an id keeps it; later ones are renumbered in
/// collection order. Nothing else about the posts changes.
///
/// # Examples
///
/// ```
/// use jotter::post_core::{renumber_duplicates, Post};
///
/// let posts: Vec<Post> = serde_json::from_str(r#"[
///     {"id": 2, "content": "a", "timestamp": "2024-01-14T09:00:00"},
///     {"id": 3, "content": "b", "timestamp": "2024-01-15T09:00:00"},
///     {"id": 3, "content": "c", "timestamp": "2024-01-16T09:00:00"}
/// ]"#).unwrap();
///
/// let ids: Vec<u64> = renumber_duplicates(posts).iter().map(|p| p.id).collect();
/// assert_eq!(ids, vec![2, 3, 4]);
/// ```
pub fn renumber_duplicates(mut posts: Vec<Post>) -> Vec<Post> {
    let mut next = next_id(&posts);
    let mut seen = HashSet::with_capacity(posts.len());
    for post in posts.iter_mut() {
        if !seen.insert(post.id) {
            post.id = next;
            seen.insert(next);
            next += 1;
        }
    }
    posts
}
