//! All backend logic independent of how the bridge is run.
//!
//! Joplin's filesystem sync leaves one `.md` file per item in a user's storage.
//! This crate picks those files out, parses them, and serves the note items as
//! [`Note`]s. It never writes to the user's storage; its own config lives in
//! the app data directory (see [app_data]).

pub mod app_data;
pub mod config;
pub mod item;
pub mod logging;
pub mod notes;
pub mod repository;
pub mod selector;
pub mod storage;
pub mod watcher;

pub use app_data::app_data_dir;
pub use config::{
    get_storage_root, load_config, load_config_from, save_config, save_config_to,
    set_storage_root, Config, ConfigError,
};
pub use item::{deserialize, FileItem, Item, ItemType, MalformedItemError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use notes::{to_note, Note, PLACEHOLDER_MODIFIED};
pub use repository::{
    ItemScan, NoteRepository, RepoError, SkippedFile, DEFAULT_FOLDER_TEMPLATE,
};
pub use selector::{is_candidate, select_candidates};
pub use storage::{Entry, FileId, Folder, FsStorage, Storage, StorageError};
pub use watcher::{watch_notes, WatchError};

/// Returns a short status string. Used to verify the backend is wired up.
pub fn status() -> &'static str {
    "joplin-bridge-core ready"
}
