//! Normalized AnkiPro export data and its conversion into decks.
//!
//! Reading, decompressing and parsing the export archive, and downloading
//! attachments, happen before this point. What arrives here is a list of
//! decks with front/back HTML per note, plus the media that was actually
//! obtained.
//!
//! ```json
//! [
//!   {
//!     "deck_id": 1607392319,
//!     "name": "Mass Spectrometry",
//!     "notes": [
//!       {
//!         "id": 8812,
//!         "front": "Ionization method?",
//!         "back": "ESI",
//!         "tags": ["methods"],
//!         "attachments": [{ "filename": "esi.png", "side": "back" }]
//!       }
//!     ]
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::deck::Deck;
use crate::error::Result;
use crate::hash::guid_for;
use crate::media::MediaStore;
use crate::model::NoteType;

/// One deck from the source export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDeck {
    /// Deck id carried over from the source; random when absent.
    #[serde(default)]
    pub deck_id: Option<i64>,

    /// Deck name; the configured default when absent or empty.
    #[serde(default)]
    pub name: Option<String>,

    /// Notes in source order.
    #[serde(default)]
    pub notes: Vec<SourceNote>,
}

/// One note from the source export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceNote {
    /// Source note id. When present the GUID is derived from it alone, so
    /// edits to the card text still re-import as the same note.
    #[serde(default)]
    pub id: Option<SourceId>,

    /// Front side HTML.
    #[serde(default)]
    pub front: String,

    /// Back side HTML.
    #[serde(default)]
    pub back: String,

    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Media attached to the note.
    #[serde(default)]
    pub attachments: Vec<SourceAttachment>,
}

/// A source note id, numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    /// Numeric id.
    Number(i64),
    /// Textual id.
    Text(String),
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceId::Number(n) => write!(f, "{n}"),
            SourceId::Text(s) => f.write_str(s),
        }
    }
}

/// An attachment reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAttachment {
    /// Media filename.
    pub filename: String,

    /// Side the image is appended to.
    #[serde(default)]
    pub side: Side,
}

/// Card side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Question side.
    Front,
    /// Answer side.
    #[default]
    Back,
}

/// Convert source decks into decks of `note_type`.
///
/// `note_type` must have two fields (front, back). Attachments are linked
/// with an `<img>` tag only when their filename is present in `media`.
///
/// # Errors
///
/// Returns [`Error::Arity`](crate::Error::Arity) if the note type does not
/// have exactly two fields.
pub fn convert_decks(
    sources: &[SourceDeck],
    note_type: &NoteType,
    media: &MediaStore,
    default_deck_name: &str,
) -> Result<Vec<Deck>> {
    let mut decks = Vec::with_capacity(sources.len());

    for source in sources {
        let name = source
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(default_deck_name);
        let mut deck = Deck::new(source.deck_id, name);

        for source_note in &source.notes {
            let (front, back) = render_sides(source_note, media);
            let guid = source_note
                .id
                .as_ref()
                .map(|id| guid_for(&[id.to_string()]));
            let note = note_type.create_note([front, back], source_note.tags.clone(), guid)?;
            deck.add_note(note);
        }

        debug!(deck = %deck.name(), id = deck.id(), notes = deck.notes().len(), "Converted deck");
        decks.push(deck);
    }

    Ok(decks)
}

/// Front and back HTML with available attachments appended.
fn render_sides(note: &SourceNote, media: &MediaStore) -> (String, String) {
    let mut front = note.front.clone();
    let mut back = note.back.clone();

    for attachment in &note.attachments {
        if !media.contains(&attachment.filename) {
            warn!(filename = %attachment.filename, "Attachment missing from media, skipping");
            continue;
        }
        let tag = format!(r#"<br><img src="{}">"#, attachment.filename);
        match attachment.side {
            Side::Front => front.push_str(&tag),
            Side::Back => back.push_str(&tag),
        }
    }

    (front, back)
}
