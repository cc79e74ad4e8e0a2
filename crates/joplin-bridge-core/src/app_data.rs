//! Where the bridge stores its own data (config, logs).
//!
//! Joplin files stay in the user's storage. We only store app state here.

use std::path::PathBuf;

/// Returns the directory where the bridge stores config and logs.
/// On Linux: `~/.local/share/joplinbridge/`.
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = directories::ProjectDirs::from("app", "JoplinBridge", "JoplinBridge")?
        .data_local_dir()
        .to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Default directory for rolling log files.
pub fn log_dir() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("logs"))
}
