//! .apkg package assembly.
//!
//! A [`Package`] accumulates decks and media, then is finalized exactly once
//! into the bytes of a ZIP archive holding:
//!
//! - `collection.anki2`: the SQLite collection
//! - `media`: JSON manifest mapping entry names to original filenames
//! - `0`, `1`, ...: the media payloads

use std::io::{Cursor, Write};
use std::path::Path;

use tracing::{info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::collection::{CollectionBuilder, CollectionStats};
use crate::config::Compression;
use crate::deck::Deck;
use crate::error::{Error, Result};
use crate::ids::{IdAllocator, now_millis};
use crate::media::MediaStore;
use crate::model::NoteType;

/// Archive entry name of the collection database.
pub const COLLECTION_FILE: &str = "collection.anki2";

/// Archive entry name of the media manifest.
pub const MEDIA_MANIFEST_FILE: &str = "media";

/// Builder for one .apkg file.
///
/// # Example
///
/// ```
/// use ankit_apkg::{Deck, NoteType, Package};
///
/// # fn main() -> ankit_apkg::Result<()> {
/// let model = NoteType::front_back(None, "Basic");
/// let mut deck = Deck::new(None, "Chemistry");
/// deck.add_note(model.create_note(
///     ["H2O", r#"water<br><img src="water.png">"#],
///     ["molecules"],
///     None,
/// )?);
///
/// let mut package = Package::new(model);
/// package.add_deck(deck)?;
/// package.add_media("water.png", vec![0x89, b'P', b'N', b'G'])?;
///
/// let bytes = package.finalize()?;
/// assert!(!bytes.is_empty());
/// assert!(package.finalize().is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Package {
    note_type: NoteType,
    decks: Vec<Deck>,
    media: MediaStore,
    ids: IdAllocator,
    timestamp_ms: i64,
    compression: Compression,
    finalized: bool,
}

impl Package {
    /// Create an empty package for a note type.
    pub fn new(note_type: NoteType) -> Self {
        let timestamp_ms = now_millis();
        Self {
            note_type,
            decks: Vec::new(),
            media: MediaStore::new(),
            ids: IdAllocator::new(timestamp_ms),
            timestamp_ms,
            compression: Compression::default(),
            finalized: false,
        }
    }

    /// Fix the package timestamp (milliseconds) instead of using the clock.
    ///
    /// Timestamps and note/card ids are derived from it, so two packages with
    /// the same content and timestamp produce identical collections.
    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self.ids = IdAllocator::new(timestamp_ms);
        self
    }

    /// Choose how archive entries are compressed.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Replace the package's media with `media`, keeping its order.
    pub fn with_media(mut self, media: MediaStore) -> Self {
        self.media = media;
        self
    }

    /// Add a deck.
    pub fn add_deck(&mut self, deck: Deck) -> Result<()> {
        self.ensure_open()?;
        self.decks.push(deck);
        Ok(())
    }

    /// Add a media payload under its original filename.
    pub fn add_media(&mut self, name: impl Into<String>, data: Vec<u8>) -> Result<()> {
        self.ensure_open()?;
        self.media.insert(name, data);
        Ok(())
    }

    /// Add a media payload read from disk.
    pub fn add_media_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_open()?;
        self.media.insert_file(path)
    }

    /// The package's note type.
    pub fn note_type(&self) -> &NoteType {
        &self.note_type
    }

    /// Decks added so far.
    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    /// Media added so far.
    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Whether [`finalize`](Self::finalize) has succeeded.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Build the archive.
    ///
    /// On error the package stays unfinalized and keeps its contents.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyFinalized`] on a second call
    /// - [`Error::MediaWrite`] for empty or unwritable media payloads
    /// - [`Error::IdentifierOverflow`] if note and card ids run out
    /// - [`Error::Schema`] if a deck holds a note of another note type
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        let (archive, ids, stats) = self.build_archive()?;
        self.commit(ids, &stats, archive.len());
        Ok(archive)
    }

    /// Finalize and write the archive to `path`.
    ///
    /// The package is only marked finalized once the file has been written.
    pub fn write_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let (archive, ids, stats) = self.build_archive()?;
        std::fs::write(path, &archive)?;
        self.commit(ids, &stats, archive.len());
        Ok(())
    }

    /// Build the archive without changing the package.
    fn build_archive(&self) -> Result<(Vec<u8>, IdAllocator, CollectionStats)> {
        self.ensure_open()?;
        self.media.validate()?;

        if self.decks.is_empty() {
            warn!("Finalizing a package with no decks");
        }

        let mut ids = self.ids.clone();
        let builder = CollectionBuilder::new(&self.note_type, &self.decks, self.timestamp_ms);
        let (collection, stats) = builder.build_bytes(&mut ids)?;
        let archive = self.write_archive(&collection)?;
        Ok((archive, ids, stats))
    }

    fn commit(&mut self, ids: IdAllocator, stats: &CollectionStats, bytes: usize) {
        self.ids = ids;
        self.finalized = true;
        log_summary(stats, self.decks.len(), self.media.len(), bytes);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finalized {
            Err(Error::AlreadyFinalized)
        } else {
            Ok(())
        }
    }

    fn write_archive(&self, collection: &[u8]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(self.compression.into());

        zip.start_file(COLLECTION_FILE, options)?;
        zip.write_all(collection)?;

        zip.start_file(MEDIA_MANIFEST_FILE, options)?;
        zip.write_all(self.media.manifest_json()?.as_bytes())?;

        for (index, entry) in self.media.indexed() {
            zip.start_file(index, options)
                .map_err(|e| Error::media_write(entry.name.as_str(), e.to_string()))?;
            zip.write_all(&entry.data)
                .map_err(|e| Error::media_write(entry.name.as_str(), e.to_string()))?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

fn log_summary(stats: &CollectionStats, decks: usize, media: usize, bytes: usize) {
    info!(
        decks,
        notes = stats.notes,
        cards = stats.cards,
        media,
        bytes,
        "Package finalized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package_with_note() -> Package {
        let model = NoteType::front_back(Some(1), "Basic");
        let mut deck = Deck::new(Some(2), "Deck");
        deck.add_note(model.create_note(["Q", "A"], Vec::<String>::new(), None).unwrap());
        let mut package = Package::new(model).with_timestamp(1_000_000);
        package.add_deck(deck).unwrap();
        package
    }

    #[test]
    fn test_finalize_once() {
        let mut package = package_with_note();
        let first = package.finalize().unwrap();
        assert!(!first.is_empty());
        assert!(package.is_finalized());

        assert!(matches!(package.finalize(), Err(Error::AlreadyFinalized)));
        assert!(matches!(
            package.add_deck(Deck::new(Some(3), "Late")),
            Err(Error::AlreadyFinalized)
        ));
        assert!(matches!(
            package.add_media("late.png", vec![1]),
            Err(Error::AlreadyFinalized)
        ));
        assert_eq!(package.decks().len(), 1);
    }

    #[test]
    fn test_failed_finalize_leaves_package_open() {
        let mut package = package_with_note();
        package.add_media("empty.png", vec![]).unwrap();

        assert!(matches!(package.finalize(), Err(Error::MediaWrite { .. })));
        assert!(!package.is_finalized());

        // Replacing the bad payload makes the package finalizable again.
        package.add_media("empty.png", vec![1, 2, 3]).unwrap();
        assert!(package.finalize().is_ok());
    }

    #[test]
    fn test_deterministic_output_for_fixed_timestamp() {
        let a = package_with_note().finalize().unwrap();
        let b = package_with_note().finalize().unwrap();
        let archive_a = zip::ZipArchive::new(Cursor::new(a)).unwrap();
        let archive_b = zip::ZipArchive::new(Cursor::new(b)).unwrap();
        let names_a: Vec<_> = archive_a.file_names().collect();
        let names_b: Vec<_> = archive_b.file_names().collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn test_with_media_keeps_order() {
        let mut media = MediaStore::new();
        media.insert("b.png", vec![1]);
        media.insert("a.png", vec![2]);

        let package = package_with_note().with_media(media);
        let manifest = package.media().manifest();
        assert_eq!(manifest["0"], "b.png");
        assert_eq!(manifest["1"], "a.png");
    }

    #[test]
    fn test_stored_compression() {
        let mut package = package_with_note().with_compression(Compression::Stored);
        let bytes = package.finalize().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let entry = archive.by_name(COLLECTION_FILE).unwrap();
        assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
    }
}
