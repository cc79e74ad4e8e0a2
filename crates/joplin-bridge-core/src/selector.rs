//! Picks the listing entries that may be Joplin items. Only name and type are looked at;
//! a selected file can still fail to parse.

use crate::storage::Entry;

/// Extensions (lowercase) a Joplin item file can carry.
pub const ITEM_EXTENSIONS: &[&str] = &["md"];

/// Keeps the regular files whose extension is in [`ITEM_EXTENSIONS`], case-insensitively.
pub fn select_candidates(entries: Vec<Entry>) -> Vec<Entry> {
    entries.into_iter().filter(is_candidate).collect()
}

pub fn is_candidate(entry: &Entry) -> bool {
    if entry.is_directory {
        return false;
    }
    extension(&entry.name)
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| ITEM_EXTENSIONS.contains(&ext.as_str()))
}

/// Text after the last dot. A bare dotfile like `.md` counts as extension `md`.
fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}
