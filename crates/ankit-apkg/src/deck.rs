//! Decks.

use crate::ids::random_id;
use crate::note::Note;

/// Named, ordered collection of notes.
///
/// Note order is kept; it fixes the order cards are created in and
/// therefore the order note and card ids are handed out.
#[derive(Debug, Clone)]
pub struct Deck {
    id: i64,
    name: String,
    description: String,
    notes: Vec<Note>,
}

impl Deck {
    /// Create an empty deck. A random id is generated when `id` is `None`.
    pub fn new(id: Option<i64>, name: impl Into<String>) -> Self {
        Self {
            id: id.unwrap_or_else(random_id),
            name: name.into(),
            description: String::new(),
            notes: Vec::new(),
        }
    }

    /// Set the deck description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a note.
    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Deck id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Deck name (use `::` for hierarchy).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deck description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Notes in insertion order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}
