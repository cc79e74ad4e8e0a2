//! Deserializing Joplin sync items.
//!
//! An item file is a free-text section followed by a property block:
//!
//! ```text
//! Shopping list
//!
//! - milk
//! - eggs
//!
//! id: 8f2c0e1d4b7a4c5e9d3f2a1b0c9d8e7f
//! parent_id: 2b9f...
//! type_: 1
//! ```
//!
//! The property block sits at the end and the body may itself contain blank lines
//! and colons, so lines are read from the last one up. The first blank line seen
//! that way ends the property block; everything above it is the body section.
//! Its first line is the title and its second line is a separator that is dropped.

use std::collections::{BTreeMap, VecDeque};

use crate::storage::FileId;

/// Property holding the item type code. Required on every item.
pub const TYPE_PROPERTY: &str = "type_";

/// Known Joplin item type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Note,
    Folder,
    Resource,
    Tag,
    NoteTag,
    Other(i64),
}

impl ItemType {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ItemType::Note,
            2 => ItemType::Folder,
            4 => ItemType::Resource,
            5 => ItemType::Tag,
            6 => ItemType::NoteTag,
            other => ItemType::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ItemType::Note => 1,
            ItemType::Folder => 2,
            ItemType::Resource => 4,
            ItemType::Tag => 5,
            ItemType::NoteTag => 6,
            ItemType::Other(code) => code,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemType::Note => "note",
            ItemType::Folder => "folder",
            ItemType::Resource => "resource",
            ItemType::Tag => "tag",
            ItemType::NoteTag => "note_tag",
            ItemType::Other(_) => "other",
        }
    }
}

/// One parsed item. `body` is only ever set on notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Every `key: value` line of the property block, `type_` included as written.
    pub properties: BTreeMap<String, String>,
    pub item_type: i64,
    /// First line of the body section, if there was one.
    pub title: Option<String>,
    pub body: Option<String>,
}

impl Item {
    pub fn parse(content: &str) -> Result<Self, MalformedItemError> {
        let mut state = ScanState::ReadingProperties;
        let mut properties = BTreeMap::new();
        let mut lines = VecDeque::new();

        for line in content.split('\n').rev() {
            let (next, step) = state.step(line);
            state = next;
            match step {
                Step::Separator => {}
                // Scanning upwards, so on duplicate keys the one earlier in the file wins.
                Step::Property { key, value } => {
                    properties.insert(key.to_string(), value.to_string());
                }
                Step::Body(line) => lines.push_front(line),
                Step::Invalid(line) => {
                    return Err(MalformedItemError::InvalidProperty {
                        line: line.to_string(),
                        content: content.to_string(),
                    })
                }
            }
        }

        let item_type = properties
            .get(TYPE_PROPERTY)
            .map(|raw| leading_int(raw))
            .ok_or_else(|| MalformedItemError::MissingType {
                content: content.to_string(),
            })?;

        let (title, text) = split_title(lines);
        let body = if item_type == ItemType::Note.code() {
            text
        } else {
            None
        };

        Ok(Item {
            properties,
            item_type,
            title,
            body,
        })
    }

    pub fn kind(&self) -> ItemType {
        ItemType::from_code(self.item_type)
    }

    pub fn is_note(&self) -> bool {
        self.kind() == ItemType::Note
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Parses raw file bytes. Invalid UTF-8 is replaced rather than rejected.
pub fn deserialize(content: &[u8]) -> Result<Item, MalformedItemError> {
    Item::parse(&String::from_utf8_lossy(content))
}

/// An item together with the storage id of the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub file_id: FileId,
    pub item: Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ReadingProperties,
    ReadingBody,
}

#[derive(Debug, PartialEq, Eq)]
enum Step<'a> {
    /// The blank line closing the property block.
    Separator,
    Property { key: &'a str, value: &'a str },
    Body(&'a str),
    /// A non-blank property-block line without a colon.
    Invalid(&'a str),
}

impl ScanState {
    fn step(self, line: &str) -> (ScanState, Step<'_>) {
        match self {
            ScanState::ReadingBody => (ScanState::ReadingBody, Step::Body(line)),
            ScanState::ReadingProperties => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return (ScanState::ReadingBody, Step::Separator);
                }
                match trimmed.split_once(':') {
                    Some((key, value)) => (
                        ScanState::ReadingProperties,
                        Step::Property {
                            key: key.trim(),
                            value: value.trim(),
                        },
                    ),
                    None => (ScanState::ReadingProperties, Step::Invalid(trimmed)),
                }
            }
        }
    }
}

/// Integer prefix of `raw`: optional sign then leading digits, saturating.
/// No digits gives 0, so `1.0` is 1 and `abc` is 0.
fn leading_int(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(digit - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(d)
        } else {
            value.saturating_mul(10).saturating_add(d)
        };
    }
    value
}

/// Title and remaining text of the body section. The line after the title is dropped
/// whatever it contains.
fn split_title(mut lines: VecDeque<&str>) -> (Option<String>, Option<String>) {
    let Some(title) = lines.pop_front() else {
        return (None, None);
    };
    lines.pop_front();
    let text = lines.into_iter().collect::<Vec<_>>().join("\n");
    (Some(title.to_string()), Some(text))
}

#[derive(Debug, thiserror::Error)]
pub enum MalformedItemError {
    #[error("invalid property format: {line}: {content}")]
    InvalidProperty { line: String, content: String },
    #[error("missing required property: type_: {content}")]
    MissingType { content: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_with_title_separator_and_body() {
        let item =
            Item::parse("title line\nseparator\nbody line 1\nbody line 2\n\ntype_: 1").unwrap();
        assert_eq!(item.item_type, 1);
        assert!(item.is_note());
        assert_eq!(item.title.as_deref(), Some("title line"));
        assert_eq!(item.body.as_deref(), Some("body line 1\nbody line 2"));
    }

    #[test]
    fn joplin_note_layout() {
        let content = "Shopping list\n\n- milk\n\n- eggs: a dozen\n\nid: 8f2c\nparent_id: 2b9f\ncreated_time: 2019-11-12T21:06:12.000Z\ntype_: 1";
        let item = Item::parse(content).unwrap();
        assert_eq!(item.title.as_deref(), Some("Shopping list"));
        assert_eq!(item.body.as_deref(), Some("- milk\n\n- eggs: a dozen"));
        assert_eq!(item.property("id"), Some("8f2c"));
        assert_eq!(item.property("created_time"), Some("2019-11-12T21:06:12.000Z"));
        assert_eq!(item.property("type_"), Some("1"));
        assert_eq!(item.properties.len(), 4);
    }

    #[test]
    fn properties_only() {
        let item = Item::parse("id: abc\nparent_id: \ntype_: 2").unwrap();
        assert_eq!(item.properties.len(), 3);
        assert_eq!(item.property("parent_id"), Some(""));
        assert_eq!(item.kind(), ItemType::Folder);
        assert_eq!(item.title, None);
        assert_eq!(item.body, None);
    }

    #[test]
    fn properties_only_note_has_no_title_or_body() {
        let item = Item::parse("id: abc\ntype_: 1").unwrap();
        assert_eq!(item.title, None);
        assert_eq!(item.body, None);
    }

    #[test]
    fn property_lines_are_trimmed_and_split_on_first_colon() {
        let item = Item::parse("  source_url :  https://example.com/a:b  \n\ttype_:1 ").unwrap();
        assert_eq!(item.property("source_url"), Some("https://example.com/a:b"));
        assert_eq!(item.item_type, 1);
    }

    #[test]
    fn empty_content_is_missing_type() {
        let err = Item::parse("").unwrap_err();
        assert!(matches!(err, MalformedItemError::MissingType { .. }));
    }

    #[test]
    fn missing_type_fails() {
        let err = Item::parse("Title\n\nbody\n\nid: abc").unwrap_err();
        assert!(matches!(err, MalformedItemError::MissingType { .. }));
        assert!(err.to_string().contains("type_"));
    }

    #[test]
    fn fractional_type_truncates_to_note() {
        let item = Item::parse("Title\n\nbody\n\ntype_: 1.0").unwrap();
        assert!(item.is_note());
        assert_eq!(item.property("type_"), Some("1.0"));
        assert_eq!(item.body.as_deref(), Some("body"));
    }

    #[test]
    fn non_numeric_type_is_type_zero() {
        let item = Item::parse("Title\n\ntype_: abc").unwrap();
        assert_eq!(item.item_type, 0);
        assert_eq!(item.kind(), ItemType::Other(0));
        assert_eq!(item.body, None);
    }

    #[test]
    fn leading_int_cases() {
        assert_eq!(leading_int("12"), 12);
        assert_eq!(leading_int("-5x"), -5);
        assert_eq!(leading_int("+7"), 7);
        assert_eq!(leading_int(""), 0);
        assert_eq!(leading_int("-"), 0);
        assert_eq!(leading_int("99999999999999999999"), i64::MAX);
        assert_eq!(leading_int("-99999999999999999999"), i64::MIN);
    }

    #[test]
    fn colon_free_property_line_fails_with_line_and_content() {
        let content = "Title\n\nid: abc\nnot a property\ntype_: 1";
        let err = Item::parse(content).unwrap_err();
        match &err {
            MalformedItemError::InvalidProperty { line, content: c } => {
                assert_eq!(line, "not a property");
                assert_eq!(c, content);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("not a property"));
    }

    #[test]
    fn properties_must_trail_the_body() {
        let err = Item::parse("type_: 1\n\ntitle line\nseparator\nbody line 1\nbody line 2")
            .unwrap_err();
        assert!(
            matches!(err, MalformedItemError::InvalidProperty { ref line, .. } if line == "body line 2")
        );
    }

    #[test]
    fn empty_title_and_separator() {
        let item = Item::parse("\n\nbody\n\ntype_: 1").unwrap();
        assert_eq!(item.title.as_deref(), Some(""));
        assert_eq!(item.body.as_deref(), Some("body"));
    }

    #[test]
    fn separator_line_is_dropped_whatever_it_holds() {
        let item = Item::parse("Title\nkept? no\nbody\n\ntype_: 1").unwrap();
        assert_eq!(item.title.as_deref(), Some("Title"));
        assert_eq!(item.body.as_deref(), Some("body"));
    }

    #[test]
    fn title_only_note_has_empty_body() {
        let item = Item::parse("Title\n\ntype_: 1").unwrap();
        assert_eq!(item.title.as_deref(), Some("Title"));
        assert_eq!(item.body.as_deref(), Some(""));
    }

    #[test]
    fn body_lines_are_kept_verbatim() {
        let item = Item::parse("Title\n\n  indented  \r\nkey: value in body\n\ntype_: 1").unwrap();
        assert_eq!(item.body.as_deref(), Some("  indented  \r\nkey: value in body"));
        assert_eq!(item.property("key"), None);
    }

    #[test]
    fn non_note_items_never_carry_a_body() {
        let item = Item::parse("Work\n\nstray text\n\nid: f1\ntype_: 2").unwrap();
        assert_eq!(item.title.as_deref(), Some("Work"));
        assert_eq!(item.body, None);

        let tag = Item::parse("urgent\n\n\n\ntype_: 5").unwrap();
        assert_eq!(tag.kind(), ItemType::Tag);
        assert_eq!(tag.body, None);
    }

    #[test]
    fn duplicate_keys_keep_the_earliest_in_file() {
        let item = Item::parse("id: first\nid: second\ntype_: 1\ntype_: 4").unwrap();
        assert_eq!(item.property("id"), Some("first"));
        assert_eq!(item.item_type, 1);
        assert!(item.is_note());
    }

    #[test]
    fn trailing_newline_means_an_empty_property_block() {
        // The final empty line is the separator, so the real properties become body text.
        let err = Item::parse("Title\n\nbody\n\ntype_: 1\n").unwrap_err();
        assert!(matches!(err, MalformedItemError::MissingType { .. }));
    }

    #[test]
    fn deserialize_replaces_invalid_utf8() {
        let item = deserialize(b"Caf\xe9\n\nbody\n\ntype_: 1").unwrap();
        assert_eq!(item.title.as_deref(), Some("Caf\u{fffd}"));
    }

    #[test]
    fn step_switches_to_body_on_first_blank_line_only() {
        let (state, step) = ScanState::ReadingProperties.step("   ");
        assert_eq!(state, ScanState::ReadingBody);
        assert_eq!(step, Step::Separator);

        let (state, step) = ScanState::ReadingBody.step("");
        assert_eq!(state, ScanState::ReadingBody);
        assert_eq!(step, Step::Body(""));

        let (state, step) = ScanState::ReadingProperties.step("a: b");
        assert_eq!(state, ScanState::ReadingProperties);
        assert_eq!(step, Step::Property { key: "a", value: "b" });
    }

    #[test]
    fn item_type_codes() {
        assert_eq!(ItemType::from_code(1), ItemType::Note);
        assert_eq!(ItemType::from_code(13), ItemType::Other(13));
        assert_eq!(ItemType::Other(13).code(), 13);
        assert_eq!(ItemType::NoteTag.label(), "note_tag");
    }
}
