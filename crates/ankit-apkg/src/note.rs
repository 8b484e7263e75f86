//! Notes.

use std::collections::{BTreeSet, HashSet};

/// Field separator character (ASCII unit separator).
pub const FIELD_SEPARATOR: char = '\x1f';

/// One flashcard's data.
///
/// Notes are created through [`NoteType::create_note`](crate::NoteType::create_note)
/// and are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    model_id: i64,
    fields: Vec<String>,
    tags: Vec<String>,
    guid: String,
}

impl Note {
    pub(crate) fn new(model_id: i64, fields: Vec<String>, tags: Vec<String>, guid: String) -> Self {
        let mut seen = HashSet::new();
        let tags = tags
            .into_iter()
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join("_"))
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
        Self {
            model_id,
            fields,
            tags,
            guid,
        }
    }

    /// Id of the note type this note belongs to.
    pub fn model_id(&self) -> i64 {
        self.model_id
    }

    /// Field values in note type order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Tags in first-seen order, deduplicated, with inner whitespace replaced by `_`.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Stable identifier used by the importer to recognise re-imports.
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Get tags as a space-separated string with surrounding spaces.
    pub fn tags_string(&self) -> String {
        if self.tags.is_empty() {
            String::new()
        } else {
            format!(" {} ", self.tags.join(" "))
        }
    }

    /// Field values joined with [`FIELD_SEPARATOR`].
    pub fn joined_fields(&self) -> String {
        self.fields.join(&FIELD_SEPARATOR.to_string())
    }

    pub(crate) fn non_empty_fields(&self) -> BTreeSet<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(i, _)| i)
            .collect()
    }
}
