//! Construction of the embedded collection database.
//!
//! Rows are derived from the note type and decks at build time: one `col`
//! row, one `notes` row per note and one `cards` row per (note, satisfied
//! template) pair. The note type and deck definitions stored inside `col`
//! are typed records serialized to the JSON shape the importer expects.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use rusqlite::{Connection, params};
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::deck::Deck;
use crate::error::{Error, Result};
use crate::hash::sort_field_checksum;
use crate::ids::IdAllocator;
use crate::model::{NoteType, RequirementKind};
use crate::note::Note;
use crate::sql::{
    DEFAULT_CONF, DEFAULT_DCONF, INSERT_CARD, INSERT_COL, INSERT_NOTE, LATEX_POST, LATEX_PRE,
    SCHEMA, SCHEMA_VERSION,
};

/// Id of the importer's built-in default deck.
pub const DEFAULT_DECK_ID: i64 = 1;

/// Row counts written by a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    /// Number of note rows.
    pub notes: usize,
    /// Number of card rows.
    pub cards: usize,
}

#[derive(Debug, Serialize)]
struct FieldRecord<'a> {
    name: &'a str,
    ord: usize,
    sticky: bool,
    rtl: bool,
    font: &'static str,
    size: u32,
    media: [&'static str; 0],
}

#[derive(Debug, Serialize)]
struct TemplateRecord<'a> {
    name: &'a str,
    ord: usize,
    qfmt: &'a str,
    afmt: &'a str,
    bqfmt: &'static str,
    bafmt: &'static str,
    did: Option<i64>,
    bfont: &'static str,
    bsize: u32,
}

/// `[ord, "all" | "any" | "none", [field, ...]]`
#[derive(Debug, Serialize)]
struct RequirementRecord<'a>(usize, RequirementKind, &'a BTreeSet<usize>);

#[derive(Debug, Serialize)]
struct ModelRecord<'a> {
    id: i64,
    name: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(rename = "mod")]
    modified: i64,
    usn: i64,
    sortf: usize,
    did: Option<i64>,
    tmpls: Vec<TemplateRecord<'a>>,
    flds: Vec<FieldRecord<'a>>,
    css: &'a str,
    #[serde(rename = "latexPre")]
    latex_pre: &'static str,
    #[serde(rename = "latexPost")]
    latex_post: &'static str,
    latexsvg: bool,
    req: Vec<RequirementRecord<'a>>,
    tags: [&'static str; 0],
    vers: [&'static str; 0],
}

impl<'a> ModelRecord<'a> {
    fn new(model: &'a NoteType, now: i64) -> Self {
        Self {
            id: model.id(),
            name: model.name(),
            kind: 0,
            modified: now,
            usn: -1,
            sortf: model.sort_field(),
            did: None,
            tmpls: model
                .templates()
                .iter()
                .enumerate()
                .map(|(ord, t)| TemplateRecord {
                    name: &t.name,
                    ord,
                    qfmt: &t.question,
                    afmt: &t.answer,
                    bqfmt: "",
                    bafmt: "",
                    did: None,
                    bfont: "",
                    bsize: 0,
                })
                .collect(),
            flds: model
                .fields()
                .iter()
                .enumerate()
                .map(|(ord, name)| FieldRecord {
                    name,
                    ord,
                    sticky: false,
                    rtl: false,
                    font: "Arial",
                    size: 20,
                    media: [],
                })
                .collect(),
            css: model.css(),
            latex_pre: LATEX_PRE,
            latex_post: LATEX_POST,
            latexsvg: false,
            req: model
                .requirements()
                .iter()
                .enumerate()
                .map(|(ord, r)| RequirementRecord(ord, r.kind(), r.fields()))
                .collect(),
            tags: [],
            vers: [],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeckRecord<'a> {
    id: i64,
    #[serde(rename = "mod")]
    modified: i64,
    name: &'a str,
    usn: i64,
    lrn_today: [i64; 2],
    rev_today: [i64; 2],
    new_today: [i64; 2],
    time_today: [i64; 2],
    collapsed: bool,
    browser_collapsed: bool,
    desc: &'a str,
    #[serde(rename = "dyn")]
    dynamic: u8,
    conf: i64,
    extend_new: u32,
    extend_rev: u32,
}

impl<'a> DeckRecord<'a> {
    fn new(id: i64, name: &'a str, desc: &'a str, now: i64) -> Self {
        Self {
            id,
            modified: now,
            name,
            usn: -1,
            lrn_today: [0, 0],
            rev_today: [0, 0],
            new_today: [0, 0],
            time_today: [0, 0],
            collapsed: false,
            browser_collapsed: false,
            desc,
            dynamic: 0,
            conf: 1,
            extend_new: 10,
            extend_rev: 50,
        }
    }
}

/// One card to be written.
struct PlannedCard {
    note: usize,
    deck_id: i64,
    ord: usize,
}

/// Builds the collection database for one note type and a set of decks.
pub struct CollectionBuilder<'a> {
    note_type: &'a NoteType,
    decks: &'a [Deck],
    timestamp_ms: i64,
}

impl<'a> CollectionBuilder<'a> {
    /// Create a builder. `timestamp_ms` is used for every timestamp column.
    pub fn new(note_type: &'a NoteType, decks: &'a [Deck], timestamp_ms: i64) -> Self {
        Self {
            note_type,
            decks,
            timestamp_ms,
        }
    }

    /// Build the note type JSON for the col table.
    pub fn models_json(&self) -> Result<String> {
        let now = self.timestamp_ms / 1000;
        let mut models = BTreeMap::new();
        models.insert(
            self.note_type.id().to_string(),
            ModelRecord::new(self.note_type, now),
        );
        Ok(serde_json::to_string(&models)?)
    }

    /// Build the decks JSON for the col table.
    ///
    /// Always includes the importer's `Default` deck.
    pub fn decks_json(&self) -> Result<String> {
        let now = self.timestamp_ms / 1000;
        let mut decks = BTreeMap::new();
        decks.insert(
            DEFAULT_DECK_ID.to_string(),
            DeckRecord::new(DEFAULT_DECK_ID, "Default", "", now),
        );
        for deck in self.decks {
            decks.insert(
                deck.id().to_string(),
                DeckRecord::new(deck.id(), deck.name(), deck.description(), now),
            );
        }
        Ok(serde_json::to_string(&decks)?)
    }

    /// Create the schema and insert every row into `conn`.
    ///
    /// Note ids and card ids are reserved from `ids` as two disjoint blocks.
    pub fn write(&self, conn: &mut Connection, ids: &mut IdAllocator) -> Result<CollectionStats> {
        let notes: Vec<(&Deck, &Note)> = self
            .decks
            .iter()
            .flat_map(|deck| deck.notes().iter().map(move |note| (deck, note)))
            .collect();

        let mut cards = Vec::new();
        for (index, (deck, note)) in notes.iter().enumerate() {
            if note.model_id() != self.note_type.id() {
                return Err(Error::schema(
                    self.note_type.name(),
                    format!(
                        "note {} belongs to note type {}, not {}",
                        note.guid(),
                        note.model_id(),
                        self.note_type.id()
                    ),
                ));
            }
            let ords = self.note_type.cards_for(note);
            if ords.is_empty() {
                warn!(guid = %note.guid(), deck = %deck.name(), "Note produces no cards");
            }
            cards.extend(ords.into_iter().map(|ord| PlannedCard {
                note: index,
                deck_id: deck.id(),
                ord,
            }));
        }

        let note_ids: Vec<i64> = ids.reserve(notes.len())?.collect();
        let card_ids = ids.reserve(cards.len())?;

        let now_s = self.timestamp_ms / 1000;
        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        tx.execute(
            INSERT_COL,
            params![
                now_s,
                self.timestamp_ms,
                self.timestamp_ms,
                SCHEMA_VERSION,
                DEFAULT_CONF,
                self.models_json()?,
                self.decks_json()?,
                DEFAULT_DCONF
            ],
        )?;

        {
            let sort_field = self.note_type.sort_field();
            let mut insert_note = tx.prepare(INSERT_NOTE)?;
            for ((_, note), note_id) in notes.iter().zip(&note_ids) {
                let sfld = note.fields().get(sort_field).cloned().unwrap_or_default();
                let csum = sort_field_checksum(&sfld);
                insert_note.execute(params![
                    note_id,
                    note.guid(),
                    note.model_id(),
                    now_s,
                    note.tags_string(),
                    note.joined_fields(),
                    sfld,
                    csum
                ])?;
            }

            let mut insert_card = tx.prepare(INSERT_CARD)?;
            for (card, card_id) in cards.iter().zip(card_ids) {
                // New cards are due in note order, starting at 1.
                let due = card.note as i64 + 1;
                insert_card.execute(params![
                    card_id,
                    note_ids[card.note],
                    card.deck_id,
                    card.ord as i64,
                    now_s,
                    due
                ])?;
            }
        }
        tx.commit()?;

        let stats = CollectionStats {
            notes: notes.len(),
            cards: cards.len(),
        };
        info!(notes = stats.notes, cards = stats.cards, "Collection written");
        Ok(stats)
    }

    /// Build the collection in a scratch SQLite file and return its bytes.
    ///
    /// The connection and scratch directory are released before returning,
    /// on success and on error.
    pub fn build_bytes(&self, ids: &mut IdAllocator) -> Result<(Vec<u8>, CollectionStats)> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("collection.anki2");

        let mut conn = Connection::open(&db_path)?;
        let stats = self.write(&mut conn, ids)?;
        conn.close().map_err(|(_, e)| e)?;

        let bytes = std::fs::read(&db_path)?;
        debug!(bytes = bytes.len(), "Collection serialized");
        Ok((bytes, stats))
    }
}
