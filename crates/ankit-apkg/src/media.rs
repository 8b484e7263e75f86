//! Media payloads and the archive manifest.
//!
//! Media files are stored in the archive under their position in insertion
//! order ("0", "1", ...). The manifest maps those positions back to the
//! original filenames that note fields refer to.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// One media payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    /// Filename as referenced in note fields (e.g. `cat.png`).
    pub name: String,
    /// Raw bytes.
    pub data: Vec<u8>,
}

/// Media payloads in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MediaStore {
    entries: Vec<MediaEntry>,
}

impl MediaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a payload.
    ///
    /// Adding a filename that is already present replaces its bytes and
    /// keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == name) {
            debug!(name = %name, "Replacing media payload");
            existing.data = data;
        } else {
            debug!(name = %name, index = self.entries.len(), bytes = data.len(), "Adding media");
            self.entries.push(MediaEntry { name, data });
        }
    }

    /// Read a payload from disk, named after the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MediaWrite`] if the path has no file name or cannot
    /// be read.
    pub fn insert_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::media_write(path.display().to_string(), "no file name"))?
            .to_string();
        let data =
            std::fs::read(path).map_err(|e| Error::media_write(name.as_str(), e.to_string()))?;
        self.insert(name, data);
        Ok(())
    }

    /// Whether a payload with this filename exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Number of payloads.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Payloads paired with their archive entry names.
    pub fn indexed(&self) -> impl Iterator<Item = (String, &MediaEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i.to_string(), e))
    }

    /// Check that every payload can be written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MediaWrite`] for the first empty payload.
    pub fn validate(&self) -> Result<()> {
        match self.entries.iter().find(|e| e.data.is_empty()) {
            Some(empty) => Err(Error::media_write(empty.name.as_str(), "payload is empty")),
            None => Ok(()),
        }
    }

    /// Manifest mapping archive entry name to original filename.
    pub fn manifest(&self) -> BTreeMap<String, &str> {
        self.indexed()
            .map(|(index, e)| (index, e.name.as_str()))
            .collect()
    }

    /// The manifest serialized as a JSON object.
    pub fn manifest_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.manifest())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_insertion_order() {
        let mut media = MediaStore::new();
        media.insert("zebra.png", vec![1]);
        media.insert("apple.png", vec![2]);
        media.insert("mango.mp3", vec![3]);

        let names: Vec<(String, &str)> = media
            .indexed()
            .map(|(i, e)| (i, e.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("0".to_string(), "zebra.png"),
                ("1".to_string(), "apple.png"),
                ("2".to_string(), "mango.mp3"),
            ]
        );
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut media = MediaStore::new();
        media.insert("a.png", vec![1]);
        media.insert("b.png", vec![2]);
        media.insert("a.png", vec![9, 9]);

        assert_eq!(media.len(), 2);
        let first = media.indexed().next().unwrap();
        assert_eq!(first.0, "0");
        assert_eq!(first.1.data, vec![9, 9]);
    }

    #[test]
    fn test_manifest_json() {
        let mut media = MediaStore::new();
        assert_eq!(media.manifest_json().unwrap(), "{}");

        media.insert("cat.png", vec![0xFF]);
        assert_eq!(media.manifest_json().unwrap(), r#"{"0":"cat.png"}"#);
    }

    #[test]
    fn test_empty_payload_rejected() {
        let mut media = MediaStore::new();
        media.insert("ok.png", vec![1]);
        media.insert("empty.png", vec![]);

        match media.validate() {
            Err(Error::MediaWrite { name, .. }) => assert_eq!(name, "empty.png"),
            other => panic!("expected MediaWrite, got {other:?}"),
        }
    }

    #[test]
    fn test_insert_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sound.mp3");
        std::fs::write(&path, b"ID3").unwrap();

        let mut media = MediaStore::new();
        media.insert_file(&path).unwrap();
        assert!(media.contains("sound.mp3"));

        let missing = media.insert_file(dir.path().join("missing.mp3"));
        assert!(matches!(missing, Err(Error::MediaWrite { .. })));
    }
}
