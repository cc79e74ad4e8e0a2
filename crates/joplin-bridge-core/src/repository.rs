//! Lists and looks up a user's Joplin notes.
//!
//! Nothing is cached: every call enumerates the user's folders and re-parses every
//! candidate file. A file that fails to parse is logged and left out; storage
//! failures (missing folder, unreadable file) abort the call.

use log::{debug, warn};

use crate::item::{deserialize, FileItem, MalformedItemError};
use crate::notes::{to_note, Note};
use crate::selector::select_candidates;
use crate::storage::{Entry, FileId, Folder, Storage, StorageError};

/// Placeholder replaced by the user id in a folder template.
pub const USER_PLACEHOLDER: &str = "{user}";

/// Where Joplin syncs to inside a user's storage.
pub const DEFAULT_FOLDER_TEMPLATE: &str = "/{user}/files/Joplin";

/// A candidate file that did not parse as an item.
#[derive(Debug)]
pub struct SkippedFile {
    pub file_id: FileId,
    pub name: String,
    pub error: MalformedItemError,
}

/// Outcome of parsing every candidate file, split into items and skipped files.
#[derive(Debug, Default)]
pub struct ItemScan {
    pub items: Vec<FileItem>,
    pub skipped: Vec<SkippedFile>,
}

impl ItemScan {
    fn partition(outcomes: Vec<(Entry, Result<FileItem, MalformedItemError>)>) -> Self {
        let mut scan = ItemScan::default();
        for (entry, outcome) in outcomes {
            match outcome {
                Ok(item) => scan.items.push(item),
                Err(error) => scan.skipped.push(SkippedFile {
                    file_id: entry.id,
                    name: entry.name,
                    error,
                }),
            }
        }
        scan
    }
}

/// Read-only note access over a [`Storage`].
#[derive(Debug, Clone)]
pub struct NoteRepository<S> {
    storage: S,
    folder_template: String,
}

impl<S: Storage> NoteRepository<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            folder_template: DEFAULT_FOLDER_TEMPLATE.to_string(),
        }
    }

    /// Use another folder layout, e.g. `/{user}/Sync/Joplin`.
    pub fn with_folder_template(mut self, template: impl Into<String>) -> Self {
        self.folder_template = template.into();
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Storage path of the user's Joplin folder.
    pub fn folder_path(&self, user_id: &str) -> String {
        self.folder_template.replace(USER_PLACEHOLDER, user_id)
    }

    pub fn list_folders(&self, user_id: &str) -> Result<Vec<Folder>, RepoError> {
        let path = self.folder_path(user_id);
        if !self.storage.path_exists(&path) {
            return Err(RepoError::NotFound {
                user_id: user_id.to_string(),
                path,
            });
        }
        let folder = self.storage.resolve(&path).map_err(|e| match e {
            StorageError::NotFound(path) => RepoError::NotFound {
                user_id: user_id.to_string(),
                path,
            },
            other => RepoError::Storage(other),
        })?;
        Ok(vec![folder])
    }

    /// Parses every candidate file in the user's folders, in enumeration order.
    pub fn scan_items(&self, user_id: &str) -> Result<ItemScan, RepoError> {
        let mut outcomes = Vec::new();
        for folder in self.list_folders(user_id)? {
            let entries = self.storage.list_entries(&folder)?;
            for entry in select_candidates(entries) {
                let content = self.storage.read_content(&entry)?;
                let outcome = deserialize(&content).map(|item| FileItem {
                    file_id: entry.id.clone(),
                    item,
                });
                outcomes.push((entry, outcome));
            }
        }

        let scan = ItemScan::partition(outcomes);
        for skipped in &scan.skipped {
            warn!(
                "event=item_skipped module=repository status=error file={} error={}",
                skipped.file_id,
                summarize(&skipped.error)
            );
        }
        debug!(
            "event=items_scanned module=repository status=ok user={} items={} skipped={}",
            user_id,
            scan.items.len(),
            scan.skipped.len()
        );
        Ok(scan)
    }

    /// Every item that parsed, notes or not.
    pub fn list_items(&self, user_id: &str) -> Result<Vec<FileItem>, RepoError> {
        Ok(self.scan_items(user_id)?.items)
    }

    /// All notes of the user. With `meta_only`, note bodies are left out.
    pub fn list_notes(&self, user_id: &str, meta_only: bool) -> Result<Vec<Note>, RepoError> {
        Ok(self
            .list_items(user_id)?
            .iter()
            .filter(|item| item.item.is_note())
            .map(|item| to_note(item, meta_only))
            .collect())
    }

    /// Full note by storage id, or `None` if no note has that id.
    pub fn get_note(&self, user_id: &str, id: &FileId) -> Result<Option<Note>, RepoError> {
        Ok(self
            .list_notes(user_id, false)?
            .into_iter()
            .find(|note| &note.id == id))
    }

    /// Whether `id` is a parsed item of any type, e.g. to tell a Joplin folder from an unknown id.
    pub fn is_item_file(&self, user_id: &str, id: &FileId) -> Result<bool, RepoError> {
        Ok(self
            .list_items(user_id)?
            .iter()
            .any(|item| &item.file_id == id))
    }
}

/// First line of the error; the full file content is too noisy for a log line.
fn summarize(error: &MalformedItemError) -> String {
    match error {
        MalformedItemError::InvalidProperty { line, .. } => format!("invalid property line {line:?}"),
        MalformedItemError::MissingType { .. } => "missing type_".to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("no such notes location for user {user_id}: {path}")]
    NotFound { user_id: String, path: String },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsStorage;

    fn repo_with(files: &[(&str, &str)]) -> (tempfile::TempDir, NoteRepository<FsStorage>) {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("alice/files/Joplin");
        std::fs::create_dir_all(&folder).unwrap();
        for (name, content) in files {
            std::fs::write(folder.join(name), content).unwrap();
        }
        let repo = NoteRepository::new(FsStorage::new(dir.path()));
        (dir, repo)
    }

    #[test]
    fn folder_path_substitutes_user() {
        let (_dir, repo) = repo_with(&[]);
        assert_eq!(repo.folder_path("alice"), "/alice/files/Joplin");
        let repo = repo.with_folder_template("/{user}/Sync");
        assert_eq!(repo.folder_path("bob"), "/bob/Sync");
    }

    #[test]
    fn missing_folder_is_not_found() {
        let (_dir, repo) = repo_with(&[]);
        let err = repo.list_notes("bob", true).unwrap_err();
        assert!(matches!(err, RepoError::NotFound { ref user_id, .. } if user_id == "bob"));
        assert!(err.to_string().contains("no such notes location"));
    }

    #[test]
    fn corrupt_file_is_skipped_not_fatal() {
        let (_dir, repo) = repo_with(&[
            ("a.md", "Good\n\ntext\n\nid: a\ntype_: 1"),
            ("b.md", "no properties here"),
        ]);
        let scan = repo.scan_items("alice").unwrap();
        assert_eq!(scan.items.len(), 1);
        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].name, "b.md");

        let notes = repo.list_notes("alice", false).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Good");
    }

    #[test]
    fn summarize_leaves_out_content() {
        let error = deserialize(b"secret body\n\nno colon").unwrap_err();
        let summary = summarize(&error);
        assert_eq!(summary, "invalid property line \"no colon\"");
        assert!(!summary.contains("secret"));
    }
}
