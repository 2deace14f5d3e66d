//! Durable storage for the post collection.
//!
//! This module owns everything that touches the posts file: reading it,
//! replacing it atomically, and serializing read-modify-write cycles so that
//! two concurrent writers can never lose each other's change. The transforms
//! themselves live in `post_core`.

use crate::constants::{
    CORRUPT_FILE_INFIX, CORRUPT_FILE_TIMESTAMP_FORMAT, JSON_INDENT, LOCK_FILE_SUFFIX,
    LOCK_RETRY_ATTEMPTS, LOCK_RETRY_INTERVAL_MS,
};
use crate::errors::{AppError, AppResult, LockError};
use crate::post_core::{self, Post, PostDraft};
use chrono::{Local, NaiveDateTime};
use fs2::FileExt;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What reading the posts file found.
///
/// Absent and corrupt files both yield an empty collection through
/// `into_posts`, but callers that care can tell them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The file does not exist yet. Expected on first run.
    Missing,
    /// The file parsed and passed the id checks.
    Loaded(Vec<Post>),
    /// The file exists but is not a valid posts array.
    Corrupt {
        /// Why the content was rejected
        reason: String,
    },
}

impl LoadOutcome {
    /// Returns the loaded posts, or an empty collection for a missing or corrupt file.
    pub fn into_posts(self) -> Vec<Post> {
        match self {
            LoadOutcome::Loaded(posts) => posts,
            LoadOutcome::Missing | LoadOutcome::Corrupt { .. } => Vec::new(),
        }
    }

    /// Returns true when the file existed but could not be used.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, LoadOutcome::Corrupt { .. })
    }
}

/// Parses the raw content of a posts file.
fn parse_posts(bytes: &[u8]) -> LoadOutcome {
    let posts: Vec<Post> = match serde_json::from_slice(bytes) {
        Ok(posts) => posts,
        Err(e) => {
            return LoadOutcome::Corrupt {
                reason: e.to_string(),
            }
        }
    };

    match post_core::check_integrity(&posts) {
        Ok(()) => LoadOutcome::Loaded(posts),
        Err(reason) => LoadOutcome::Corrupt { reason },
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Appends `suffix` to the file name of `path`.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Holds the exclusive advisory lock until dropped.
struct FileLockGuard {
    file: File,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("Failed to release posts lock explicitly: {}", e);
        }
    }
}

/// The post collection backed by a single JSON file.
///
/// A `PostStore` is constructed with an explicit location, so tests and
/// embedders can point it at a temporary directory. Reads go straight to the
/// file; writes go through [`PostStore::modify`], which holds both an
/// in-process mutex and a cross-process file lock for the whole cycle.
///
/// # Examples
///
/// ```no_run
/// use jotter::post_core::PostDraft;
/// use jotter::post_io::PostStore;
///
/// let store = PostStore::new("/tmp/posts.json");
/// let (posts, id) = store.append(PostDraft::with_content("Ran 5k")).unwrap();
/// assert!(posts.iter().any(|p| p.id == id));
/// ```
#[derive(Debug)]
pub struct PostStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl PostStore {
    /// Creates a store backed by the file at `path`. Nothing is read or created yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PostStore {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    /// The location of the posts file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        with_suffix(&self.path, LOCK_FILE_SUFFIX)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Reads the posts file.
    ///
    /// # Returns
    ///
    /// - `LoadOutcome::Missing` if the file does not exist
    /// - `LoadOutcome::Corrupt` if it is not a JSON array of posts, or an id is zero
    /// - `LoadOutcome::Loaded` otherwise
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` for read failures other than "not found", such
    /// as permission denied. Those say nothing about whether the store is empty.
    pub fn load(&self) -> AppResult<LoadOutcome> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Posts file {} does not exist yet", self.path.display());
                return Ok(LoadOutcome::Missing);
            }
            Err(e) => {
                return Err(AppError::Io(io::Error::new(
                    e.kind(),
                    format!("Failed to read posts file {}: {}", self.path.display(), e),
                )))
            }
        };

        let outcome = parse_posts(&bytes);
        match &outcome {
            LoadOutcome::Corrupt { reason } => {
                warn!(
                    "Posts file {} is corrupt, treating as empty: {}",
                    self.path.display(),
                    reason
                );
            }
            LoadOutcome::Loaded(posts) => {
                debug!("Loaded {} posts", posts.len());
                let duplicates = post_core::duplicate_ids(posts);
                if !duplicates.is_empty() {
                    warn!(
                        "Posts file {} repeats ids {:?}; they are renumbered on the next write",
                        self.path.display(),
                        duplicates
                    );
                }
            }
            LoadOutcome::Missing => {}
        }
        Ok(outcome)
    }

    /// Reads the posts file, masking a missing or corrupt file as an empty collection.
    pub fn load_posts(&self) -> AppResult<Vec<Post>> {
        Ok(self.load()?.into_posts())
    }

    /// Replaces the posts file with `posts`, pretty-printed.
    ///
    /// The content is written to a temporary file in the same directory,
    /// synced, and renamed over the target, so a concurrent `load` sees either
    /// the old or the new collection, never a partial one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the directory cannot be created or the file
    /// cannot be written, synced or renamed (disk full, permission denied, ...).
    pub fn save(&self, posts: &[Post]) -> AppResult<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".posts-")
            .suffix(".tmp")
            .tempfile_in(dir)?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let mut serializer = serde_json::Serializer::with_formatter(
                &mut writer,
                PrettyFormatter::with_indent(JSON_INDENT),
            );
            posts.serialize(&mut serializer)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        #[cfg(unix)]
        {
            let permissions = fs::Permissions::from_mode(crate::constants::DEFAULT_FILE_PERMISSIONS);
            temp.as_file().set_permissions(permissions)?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| {
            AppError::Io(io::Error::new(
                e.error.kind(),
                format!("Failed to replace posts file {}: {}", self.path.display(), e.error),
            ))
        })?;

        debug!("Saved {} posts to {}", posts.len(), self.path.display());
        Ok(())
    }

    fn acquire_file_lock(&self) -> AppResult<FileLockGuard> {
        let lock_path = self.lock_path();
        fs::create_dir_all(self.parent_dir()).map_err(|source| LockError::AcquisitionFailed {
            path: lock_path.clone(),
            source,
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| LockError::AcquisitionFailed {
                path: lock_path.clone(),
                source,
            })?;

        let contended = fs2::lock_contended_error().raw_os_error();
        for attempt in 1..=LOCK_RETRY_ATTEMPTS {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLockGuard { file }),
                Err(e) if e.raw_os_error() == contended => {
                    debug!("Posts lock busy (attempt {})", attempt);
                    thread::sleep(Duration::from_millis(LOCK_RETRY_INTERVAL_MS));
                }
                Err(source) => {
                    return Err(LockError::AcquisitionFailed {
                        path: lock_path,
                        source,
                    }
                    .into())
                }
            }
        }

        Err(LockError::FileBusy { path: lock_path }.into())
    }

    /// Moves a corrupt posts file aside so the next save does not destroy it.
    fn preserve_corrupt_file(&self) -> AppResult<PathBuf> {
        let stamp = Local::now().format(CORRUPT_FILE_TIMESTAMP_FORMAT);
        let backup = with_suffix(&self.path, &format!("{}{}", CORRUPT_FILE_INFIX, stamp));
        fs::rename(&self.path, &backup)?;
        warn!(
            "Moved corrupt posts file {} to {}",
            self.path.display(),
            backup.display()
        );
        Ok(backup)
    }

    /// Runs one serialized load → transform → save cycle.
    ///
    /// `f` receives the current collection and returns the next one plus a
    /// value for the caller. Nothing is written if `f` fails.
    ///
    /// # Returns
    ///
    /// The saved collection and the value produced by `f`.
    ///
    /// # Errors
    ///
    /// - `AppError::Lock` if the file lock cannot be acquired in time
    /// - `AppError::Io` if reading or writing the file fails
    /// - whatever `f` returns
    pub fn modify<T, F>(&self, f: F) -> AppResult<(Vec<Post>, T)>
    where
        F: FnOnce(Vec<Post>) -> AppResult<(Vec<Post>, T)>,
    {
        // The guarded value is (), so a poisoned mutex carries no broken state
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _file_lock = self.acquire_file_lock()?;

        let outcome = self.load()?;
        let was_corrupt = outcome.is_corrupt();

        let posts = post_core::renumber_duplicates(outcome.into_posts());
        let (posts, value) = f(posts)?;

        if was_corrupt {
            self.preserve_corrupt_file()?;
        }
        self.save(&posts)?;

        Ok((posts, value))
    }

    /// Appends a post built from `draft`, timestamped now, and persists it.
    ///
    /// # Returns
    ///
    /// The saved collection and the id assigned to the new post.
    pub fn append(&self, draft: PostDraft) -> AppResult<(Vec<Post>, u64)> {
        let (posts, id) = self.modify(|posts| Ok(post_core::append(posts, draft, local_now())?))?;
        info!("Created post {}", id);
        Ok((posts, id))
    }

    /// Replaces the content of post `id`, refreshes its timestamp, and persists it.
    pub fn edit(&self, id: u64, content: Option<String>) -> AppResult<Vec<Post>> {
        let (posts, ()) = self.modify(|posts| {
            Ok((post_core::edit(posts, id, content, local_now())?, ()))
        })?;
        info!("Edited post {}", id);
        Ok(posts)
    }

    /// Removes post `id` and persists the result.
    pub fn delete(&self, id: u64) -> AppResult<Vec<Post>> {
        let (posts, ()) = self.modify(|posts| Ok((post_core::delete(posts, id)?, ())))?;
        info!("Deleted post {}", id);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PostError;
    use chrono::NaiveDate;
    use serde_json::Map;
    use tempfile::tempdir;

    fn sample_posts() -> Vec<Post> {
        let mut extra = Map::new();
        extra.insert("mood".to_string(), serde_json::json!("bright"));
        vec![
            Post {
                id: 1,
                content: "first".to_string(),
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 14)
                    .unwrap()
                    .and_hms_micro_opt(8, 15, 0, 250)
                    .unwrap(),
                extra,
            },
            Post {
                id: 2,
                content: "zweiter Eintrag – äöü".to_string(),
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                    .unwrap()
                    .and_hms_opt(21, 0, 0)
                    .unwrap(),
                extra: Map::new(),
            },
        ]
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let store = PostStore::new(temp_dir.path().join("posts.json"));

        assert_eq!(store.load().unwrap(), LoadOutcome::Missing);
        assert!(store.load_posts().unwrap().is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_masked_but_observable() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("posts.json");
        fs::write(&path, "[{\"id\": 1, \"content\": ").unwrap();
        let store = PostStore::new(&path);

        let outcome = store.load().unwrap();
        assert!(outcome.is_corrupt());
        assert!(outcome.into_posts().is_empty());
    }

    #[test]
    fn test_load_rejects_non_utf8_and_wrong_shape() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("posts.json");
        let store = PostStore::new(&path);

        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(store.load().unwrap().is_corrupt());

        fs::write(&path, "{\"posts\": []}").unwrap();
        assert!(store.load().unwrap().is_corrupt());

        fs::write(&path, "").unwrap();
        assert!(store.load().unwrap().is_corrupt());
    }

    #[test]
    fn test_load_keeps_duplicate_ids() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("posts.json");
        fs::write(
            &path,
            r#"[
    {"id": 1, "content": "a", "timestamp": "2024-01-15T10:00:00"},
    {"id": 1, "content": "b", "timestamp": "2024-01-15T11:00:00"}
]"#,
        )
        .unwrap();

        match PostStore::new(&path).load().unwrap() {
            LoadOutcome::Loaded(posts) => {
                let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
                assert_eq!(ids, vec![1, 1]);
            }
            other => panic!("Expected Loaded, got {:?}", other),
        }
    }

    #[test]
    fn test_modify_renumbers_duplicate_ids_before_saving() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("posts.json");
        fs::write(
            &path,
            r#"[
    {"id": 2, "content": "a", "timestamp": "2024-01-14T10:00:00"},
    {"id": 3, "content": "b", "timestamp": "2024-01-15T10:00:00"},
    {"id": 3, "content": "c", "timestamp": "2024-01-16T10:00:00"}
]"#,
        )
        .unwrap();
        let store = PostStore::new(&path);

        let (posts, id) = store.append(PostDraft::with_content("d")).unwrap();

        assert_eq!(id, 5);
        let ids: Vec<(u64, &str)> = posts.iter().map(|p| (p.id, p.content.as_str())).collect();
        assert_eq!(ids, vec![(2, "a"), (3, "b"), (4, "c"), (5, "d")]);
        assert_eq!(store.load().unwrap(), LoadOutcome::Loaded(posts));

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains(".corrupt-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_load_directory_is_io_error() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let store = PostStore::new(temp_dir.path());

        assert!(matches!(store.load(), Err(AppError::Io(_))));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let store = PostStore::new(temp_dir.path().join("posts.json"));
        let posts = sample_posts();

        store.save(&posts).unwrap();

        assert_eq!(store.load().unwrap(), LoadOutcome::Loaded(posts));
    }

    #[test]
    fn test_save_is_pretty_printed_with_four_spaces() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("posts.json");
        let store = PostStore::new(&path);

        store.save(&sample_posts()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[\n    {\n        \"id\": 1,"));
        assert!(content.contains("äöü"));
        assert!(content.ends_with("]\n"));
    }

    #[test]
    fn test_save_creates_parent_directories_and_leaves_no_temp_files() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("nested").join("deeper").join("posts.json");
        let store = PostStore::new(&path);

        store.save(&sample_posts()).unwrap();
        store.save(&[]).unwrap();

        assert!(path.exists());
        let names: Vec<String> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["posts.json".to_string()]);
        assert_eq!(store.load().unwrap(), LoadOutcome::Loaded(Vec::new()));
    }

    #[test]
    fn test_save_sets_owner_only_permissions() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("posts.json");
        PostStore::new(&path).save(&sample_posts()).unwrap();

        #[cfg(unix)]
        {
            let metadata = fs::metadata(&path).expect("Failed to get file metadata");
            assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
        }
    }

    #[test]
    fn test_save_onto_directory_fails_with_io_error() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let target = temp_dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "x").unwrap();

        let result = PostStore::new(&target).save(&sample_posts());

        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_append_edit_delete_persist() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let store = PostStore::new(temp_dir.path().join("posts.json"));

        let (_, first) = store.append(PostDraft::with_content("one")).unwrap();
        let (_, second) = store.append(PostDraft::with_content("two")).unwrap();
        assert_eq!((first, second), (1, 2));

        store.edit(first, Some("one, revised".to_string())).unwrap();
        let remaining = store.delete(second).unwrap();
        assert_eq!(remaining.len(), 1);

        let posts = store.load_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, 1);
        assert_eq!(posts[0].content, "one, revised");
    }

    #[test]
    fn test_failed_transform_writes_nothing() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("posts.json");
        let store = PostStore::new(&path);

        let result = store.append(PostDraft::default());
        assert!(matches!(result, Err(AppError::Post(PostError::Validation(_)))));
        assert!(!path.exists());

        store.append(PostDraft::with_content("kept")).unwrap();
        let before = fs::read_to_string(&path).unwrap();
        assert!(matches!(
            store.delete(42),
            Err(AppError::Post(PostError::NotFound { id: 42 }))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_modify_preserves_corrupt_file_before_overwriting() {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let path = temp_dir.path().join("posts.json");
        fs::write(&path, "this is not json").unwrap();
        let store = PostStore::new(&path);

        let (posts, id) = store.append(PostDraft::with_content("fresh start")).unwrap();
        assert_eq!(id, 1);
        assert_eq!(posts.len(), 1);

        let preserved: Vec<PathBuf> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(preserved.len(), 1);
        assert_eq!(fs::read_to_string(&preserved[0]).unwrap(), "this is not json");
    }

    #[test]
    fn test_lock_file_is_sidecar() {
        let store = PostStore::new("/data/posts.json");
        assert_eq!(store.lock_path(), PathBuf::from("/data/posts.json.lock"));
        assert_eq!(PostStore::new("posts.json").parent_dir(), Path::new("."));
    }
}
