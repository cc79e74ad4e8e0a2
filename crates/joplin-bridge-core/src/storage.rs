//! The file storage backend the bridge reads from.
//!
//! We never own the files: the sync target (Joplin's filesystem sync) writes them,
//! we only enumerate folders and read bytes. [`FsStorage`] serves a local directory.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// Opaque, stable identifier the storage backend hands out for a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A resolved folder inside the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    /// Storage-relative path, `/`-separated.
    pub path: String,
}

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_directory: bool,
    pub id: FileId,
    /// Storage-relative path, `/`-separated.
    pub path: String,
}

/// Minimal contract the note repository needs from a storage backend.
pub trait Storage {
    fn path_exists(&self, path: &str) -> bool;

    /// Resolves a folder; `StorageError::NotFound` if it is absent or not a folder.
    fn resolve(&self, path: &str) -> Result<Folder, StorageError>;

    /// Direct children of `folder`, in the backend's enumeration order.
    fn list_entries(&self, folder: &Folder) -> Result<Vec<Entry>, StorageError>;

    fn read_content(&self, entry: &Entry) -> Result<Vec<u8>, StorageError>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn path_exists(&self, path: &str) -> bool {
        (**self).path_exists(path)
    }

    fn resolve(&self, path: &str) -> Result<Folder, StorageError> {
        (**self).resolve(path)
    }

    fn list_entries(&self, folder: &Folder) -> Result<Vec<Entry>, StorageError> {
        (**self).list_entries(folder)
    }

    fn read_content(&self, entry: &Entry) -> Result<Vec<u8>, StorageError> {
        (**self).read_content(entry)
    }
}

/// Storage backed by a local directory, e.g. a Nextcloud data dir or a sync target.
/// Listings are sorted by file name so repeated calls enumerate in the same order.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute local path for a storage-relative path. Paths with `..` are `NotFound`.
    pub fn local_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(StorageError::NotFound(path.to_string()));
        }
        if relative.as_os_str().is_empty() {
            return Ok(self.root.clone());
        }
        Ok(self.root.join(relative))
    }

    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Storage for FsStorage {
    fn path_exists(&self, path: &str) -> bool {
        self.local_path(path).is_ok_and(|local| local.exists())
    }

    fn resolve(&self, path: &str) -> Result<Folder, StorageError> {
        let local = self.local_path(path)?;
        if !local.is_dir() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(Folder {
            path: self.relative_path(&local),
        })
    }

    fn list_entries(&self, folder: &Folder) -> Result<Vec<Entry>, StorageError> {
        let dir = self.local_path(&folder.path)?;
        let mut entries = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| StorageError::Walk(e.to_string()))?;
            let path = self.relative_path(entry.path());
            entries.push(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory: entry.file_type().is_dir(),
                id: FileId::new(path.clone()),
                path,
            });
        }
        Ok(entries)
    }

    fn read_content(&self, entry: &Entry) -> Result<Vec<u8>, StorageError> {
        let local = self.local_path(&entry.path)?;
        std::fs::read(&local).map_err(|e| StorageError::Io(local, e))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no such path: {0}")]
    NotFound(String),
    #[error("walk error: {0}")]
    Walk(String),
    #[error("read error for {0}: {1}")]
    Io(PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_with_folder() -> (tempfile::TempDir, FsStorage) {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("alice/files/Joplin");
        std::fs::create_dir_all(folder.join(".resource")).unwrap();
        std::fs::write(folder.join("b.md"), "b").unwrap();
        std::fs::write(folder.join("a.md"), "a").unwrap();
        let storage = FsStorage::new(dir.path());
        (dir, storage)
    }

    #[test]
    fn resolve_ignores_leading_slash() {
        let (_dir, storage) = storage_with_folder();
        assert!(storage.path_exists("/alice/files/Joplin"));
        let folder = storage.resolve("/alice/files/Joplin").unwrap();
        assert_eq!(folder.path, "alice/files/Joplin");
    }

    #[test]
    fn resolve_missing_is_not_found() {
        let (_dir, storage) = storage_with_folder();
        assert!(!storage.path_exists("/bob/files/Joplin"));
        let err = storage.resolve("/bob/files/Joplin").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(p) if p == "/bob/files/Joplin"));
    }

    #[test]
    fn parent_components_are_not_found() {
        let (dir, _) = storage_with_folder();
        std::fs::create_dir_all(dir.path().join("alice/outside")).unwrap();
        let storage = FsStorage::new(dir.path().join("alice/files"));

        assert!(!storage.path_exists("/../outside"));
        assert!(matches!(
            storage.resolve("Joplin/../../outside"),
            Err(StorageError::NotFound(_))
        ));
        let entry = Entry {
            name: "a.md".to_string(),
            is_directory: false,
            id: FileId::new("../files/Joplin/a.md"),
            path: "../files/Joplin/a.md".to_string(),
        };
        assert!(matches!(storage.read_content(&entry), Err(StorageError::NotFound(_))));
        assert_eq!(storage.local_path("/").unwrap(), storage.root());
    }

    #[test]
    fn list_entries_is_sorted_and_shallow() {
        let (_dir, storage) = storage_with_folder();
        let folder = storage.resolve("alice/files/Joplin").unwrap();
        let entries = storage.list_entries(&folder).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, [".resource", "a.md", "b.md"]);
        assert!(entries[0].is_directory);
        assert_eq!(entries[1].id.as_str(), "alice/files/Joplin/a.md");
        assert_eq!(storage.read_content(&entries[2]).unwrap(), b"b");
    }
}
