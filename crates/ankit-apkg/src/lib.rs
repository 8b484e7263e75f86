//! Assemble Anki `.apkg` packages from normalized flashcard data.
//!
//! The crate turns a note type, a set of decks and raw media bytes into a
//! single archive that Anki imports directly. It is the packaging half of an
//! AnkiPro to Anki converter: reading the AnkiPro export and downloading its
//! attachments happen elsewhere and hand over plain data.
//!
//! # Building blocks
//!
//! - [`NoteType`]: fields, card templates and per-template [`Requirement`]s
//! - [`Note`]: field values plus a stable GUID
//! - [`Deck`]: ordered notes under a name
//! - [`Package`]: decks and media, finalized once into archive bytes
//!
//! # Example
//!
//! ```
//! use ankit_apkg::{Deck, NoteType, Package};
//!
//! # fn main() -> ankit_apkg::Result<()> {
//! let model = NoteType::front_back(None, "AnkiPro Imported Model");
//!
//! let mut deck = Deck::new(None, "Spanish::Basics");
//! deck.add_note(model.create_note(["Hola", "Hello"], ["greetings"], None)?);
//! deck.add_note(model.create_note(["Adios", "Goodbye"], ["greetings"], None)?);
//!
//! let mut package = Package::new(model);
//! package.add_deck(deck)?;
//! let apkg = package.finalize()?;
//! assert!(apkg.starts_with(b"PK"));
//! # Ok(())
//! # }
//! ```
//!
//! # Converting AnkiPro data
//!
//! ```
//! use ankit_apkg::{BuildConfig, MediaStore, Package, SourceDeck, convert_decks};
//!
//! # fn main() -> ankit_apkg::Result<()> {
//! let sources: Vec<SourceDeck> = serde_json::from_str(
//!     r#"[{ "name": "Bio", "notes": [{ "id": 1, "front": "Cell?", "back": "Unit of life" }] }]"#,
//! )?;
//! let config = BuildConfig::default();
//! let model = config.note_type();
//! let media = MediaStore::new();
//!
//! let mut package = Package::new(model.clone());
//! for deck in convert_decks(&sources, &model, &media, &config.deck.default_name)? {
//!     package.add_deck(deck)?;
//! }
//! let apkg = package.finalize()?;
//! # let _ = apkg;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod deck;
pub mod error;
pub mod hash;
pub mod ids;
pub mod media;
pub mod model;
pub mod note;
pub mod package;
pub mod source;

mod sql;

pub use collection::{CollectionBuilder, CollectionStats};
pub use config::{BuildConfig, Compression};
pub use deck::Deck;
pub use error::{Error, Result};
pub use media::{MediaEntry, MediaStore};
pub use model::{NoteType, Requirement, RequirementKind, Template};
pub use note::Note;
pub use package::{COLLECTION_FILE, MEDIA_MANIFEST_FILE, Package};
pub use source::{SourceAttachment, SourceDeck, SourceId, SourceNote, Side, convert_decks};
