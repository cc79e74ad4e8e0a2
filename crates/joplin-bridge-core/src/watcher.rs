//! File watcher for a user's Joplin folder on local storage. Re-lists notes when files change.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use log::{error, info};
use notify_debouncer_mini::notify;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};

use crate::notes::Note;
use crate::repository::{NoteRepository, RepoError};
use crate::storage::{FsStorage, StorageError};

const DEBOUNCE: Duration = Duration::from_millis(400);

/// Watches the user's folders and calls `on_change` with a fresh listing whenever
/// files change (debounced). Blocks until the process is stopped (e.g. Ctrl+C).
/// Returns Err on setup failure, including a missing notes folder.
pub fn watch_notes(
    repo: NoteRepository<FsStorage>,
    user_id: &str,
    meta_only: bool,
    on_change: impl Fn(Result<Vec<Note>, RepoError>) + Send + 'static,
) -> Result<(), WatchError> {
    let dirs: Vec<PathBuf> = repo
        .list_folders(user_id)?
        .iter()
        .map(|folder| repo.storage().local_path(&folder.path))
        .collect::<Result<Vec<_>, StorageError>>()
        .map_err(RepoError::from)?;

    let user = user_id.to_string();
    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
        Ok(_) => on_change(repo.list_notes(&user, meta_only)),
        Err(e) => error!("event=watch_error module=watcher status=error error={}", e),
    })
    .map_err(|e| WatchError::Notify(e.to_string()))?;

    for dir in &dirs {
        debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::Watch(e.to_string()))?;
        info!(
            "event=watch_start module=watcher status=ok dir={}",
            dir.display()
        );
    }

    let (_tx, rx) = mpsc::channel::<()>();
    rx.recv().ok();
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("{0}")]
    Repo(#[from] RepoError),
    #[error("watcher init: {0}")]
    Notify(String),
    #[error("watch failed: {0}")]
    Watch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_folder_fails_before_watching() {
        let dir = tempfile::tempdir().unwrap();
        let repo = NoteRepository::new(FsStorage::new(dir.path()));
        let err = watch_notes(repo, "alice", true, |_| {}).unwrap_err();
        assert!(matches!(err, WatchError::Repo(RepoError::NotFound { .. })));
    }
}
