//! The note record handed to the rest of the application, built from note-type items.

use serde::Serialize;

use crate::item::FileItem;
use crate::storage::FileId;

/// Stand-in modification time (unix seconds) for every note.
/// TODO: read `updated_time` from the item properties once timestamps are parsed.
pub const PLACEHOLDER_MODIFIED: i64 = 1_573_592_772;

/// A Joplin note as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Storage id of the item file; Joplin's own ids are not exposed here.
    pub id: FileId,
    pub title: String,
    /// Note body. `None` for meta-only listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Always empty: notebooks and tags are not mapped.
    pub category: String,
    pub modified: i64,
}

/// Converts a note item. Callers only pass note-type items.
pub fn to_note(item: &FileItem, meta_only: bool) -> Note {
    let content = if meta_only {
        None
    } else {
        Some(item.item.body.clone().unwrap_or_default())
    };
    Note {
        id: item.file_id.clone(),
        title: item.item.title.clone().unwrap_or_default(),
        content,
        category: String::new(),
        modified: PLACEHOLDER_MODIFIED,
    }
}
