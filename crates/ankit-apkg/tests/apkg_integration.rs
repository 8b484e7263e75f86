//! Integration tests for .apkg generation.
//!
//! These tests finalize real packages and verify their contents by
//! inspecting the SQLite database and ZIP structure.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use ankit_apkg::{
    BuildConfig, Deck, Error, MediaStore, NoteType, Package, Requirement, SourceDeck, Template,
    convert_decks,
};
use rusqlite::Connection;
use tempfile::{TempDir, tempdir};
use zip::ZipArchive;

/// An extracted collection; the directory lives as long as the connection.
struct Collection {
    conn: Connection,
    _dir: TempDir,
}

impl Collection {
    fn count(&self, table: &str) -> i64 {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    fn ids(&self, table: &str) -> Vec<i64> {
        self.conn
            .prepare(&format!("SELECT id FROM {table} ORDER BY id"))
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }
}

/// Helper to extract and open the SQLite database from .apkg bytes.
fn open_collection(apkg: &[u8]) -> Collection {
    let mut archive = ZipArchive::new(Cursor::new(apkg)).unwrap();
    let mut db_file = archive.by_name("collection.anki2").unwrap();
    let mut db_bytes = Vec::new();
    db_file.read_to_end(&mut db_bytes).unwrap();

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("collection.anki2");
    std::fs::write(&db_path, &db_bytes).unwrap();

    Collection {
        conn: Connection::open(&db_path).unwrap(),
        _dir: dir,
    }
}

/// Helper to get the media manifest from .apkg bytes.
fn media_manifest(apkg: &[u8]) -> HashMap<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(apkg)).unwrap();
    let mut media_file = archive.by_name("media").unwrap();
    let mut content = String::new();
    media_file.read_to_string(&mut content).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn read_entry(apkg: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(apkg)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    bytes
}

fn basic_model() -> NoteType {
    NoteType::front_back(Some(1_500_000_000), "Basic")
}

#[test]
fn test_single_note_with_media() {
    let model = basic_model();
    let mut deck = Deck::new(Some(1_600_000_000), "Imaging");
    deck.add_note(
        model
            .create_note(
                ["Which organelle?", r#"Mitochondria<br><img src="mito.png">"#],
                Vec::<String>::new(),
                None,
            )
            .unwrap(),
    );

    let mut package = Package::new(model);
    package.add_deck(deck).unwrap();
    package.add_media("mito.png", vec![0x89, b'P', b'N', b'G']).unwrap();
    let apkg = package.finalize().unwrap();

    let manifest = media_manifest(&apkg);
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest["0"], "mito.png");
    assert_eq!(read_entry(&apkg, "0"), vec![0x89, b'P', b'N', b'G']);

    let col = open_collection(&apkg);
    assert_eq!(col.count("notes"), 1);
    assert_eq!(col.count("cards"), 1);
}

#[test]
fn test_archive_entries() {
    let mut package = Package::new(basic_model());
    package.add_deck(Deck::new(Some(2), "Empty")).unwrap();
    package.add_media("b.mp3", vec![1]).unwrap();
    package.add_media("a.png", vec![2]).unwrap();
    let apkg = package.finalize().unwrap();

    let archive = ZipArchive::new(Cursor::new(apkg.as_slice())).unwrap();
    let mut names: Vec<_> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["0", "1", "collection.anki2", "media"]);

    let manifest = media_manifest(&apkg);
    assert_eq!(manifest["0"], "b.mp3");
    assert_eq!(manifest["1"], "a.png");
}

#[test]
fn test_database_schema() {
    let mut package = Package::new(basic_model());
    let apkg = package.finalize().unwrap();
    let col = open_collection(&apkg);

    let tables: Vec<String> = col
        .conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(tables, vec!["cards", "col", "graves", "notes", "revlog"]);
    assert_eq!(col.count("col"), 1);
    assert_eq!(col.count("revlog"), 0);
}

#[test]
fn test_ten_thousand_notes_get_distinct_increasing_ids() {
    let model = basic_model();
    let mut deck = Deck::new(Some(3), "Bulk");
    for i in 0..10_000 {
        deck.add_note(
            model
                .create_note([format!("Q{i}"), format!("A{i}")], Vec::<String>::new(), None)
                .unwrap(),
        );
    }

    let mut package = Package::new(model).with_timestamp(1_700_000_000_000);
    package.add_deck(deck).unwrap();
    let apkg = package.finalize().unwrap();
    let col = open_collection(&apkg);

    let note_ids = col.ids("notes");
    assert_eq!(note_ids.len(), 10_000);
    assert!(note_ids.windows(2).all(|w| w[0] < w[1]));

    let card_ids = col.ids("cards");
    assert_eq!(card_ids.len(), 10_000);
    assert!(card_ids.iter().all(|id| note_ids.binary_search(id).is_err()));
}

#[test]
fn test_ids_follow_deck_and_note_order() {
    let model = basic_model();
    let mut first = Deck::new(Some(10), "First");
    first.add_note(model.create_note(["a", "1"], Vec::<String>::new(), None).unwrap());
    first.add_note(model.create_note(["b", "2"], Vec::<String>::new(), None).unwrap());
    let mut second = Deck::new(Some(20), "Second");
    second.add_note(model.create_note(["c", "3"], Vec::<String>::new(), None).unwrap());

    let mut package = Package::new(model).with_timestamp(1_000);
    package.add_deck(first).unwrap();
    package.add_deck(second).unwrap();
    let col = open_collection(&package.finalize().unwrap());

    let rows: Vec<(i64, String, i64)> = col
        .conn
        .prepare(
            "SELECT n.id, n.sfld, c.did FROM notes n JOIN cards c ON c.nid = n.id ORDER BY n.id",
        )
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(
        rows,
        vec![
            (1_000, "a".to_string(), 10),
            (1_001, "b".to_string(), 10),
            (1_002, "c".to_string(), 20),
        ]
    );
}

#[test]
fn test_requirements_control_card_rows() {
    let model = NoteType::new(
        Some(42),
        "Strict",
        vec!["Term".to_string(), "Definition".to_string()],
        vec![Template::new("Card 1", "{{Term}}", "{{Definition}}")],
        vec![Requirement::all([0, 1])],
    )
    .unwrap();

    let mut deck = Deck::new(Some(7), "Terms");
    deck.add_note(model.create_note(["", "orphan"], Vec::<String>::new(), None).unwrap());
    deck.add_note(model.create_note(["ion", "charged"], Vec::<String>::new(), None).unwrap());

    let mut package = Package::new(model);
    package.add_deck(deck).unwrap();
    let col = open_collection(&package.finalize().unwrap());

    assert_eq!(col.count("notes"), 2);
    assert_eq!(col.count("cards"), 1);
}

#[test]
fn test_model_and_deck_json_in_col() {
    let model = basic_model().with_css(".card { color: navy; }");
    let deck = Deck::new(Some(1_234), "Parent::Child").with_description("nested");
    let mut package = Package::new(model);
    package.add_deck(deck).unwrap();
    let col = open_collection(&package.finalize().unwrap());

    let (models, decks): (String, String) = col
        .conn
        .query_row("SELECT models, decks FROM col", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();

    let models: serde_json::Value = serde_json::from_str(&models).unwrap();
    let model = &models["1500000000"];
    assert_eq!(model["name"], "Basic");
    assert_eq!(model["css"], ".card { color: navy; }");
    assert_eq!(model["tmpls"][0]["afmt"], r#"{{FrontSide}}<hr id="answer">{{Back}}"#);

    let decks: serde_json::Value = serde_json::from_str(&decks).unwrap();
    assert_eq!(decks["1"]["name"], "Default");
    assert_eq!(decks["1234"]["name"], "Parent::Child");
    assert_eq!(decks["1234"]["desc"], "nested");
}

#[test]
fn test_guid_stability_across_packages() {
    let build = |back: &str| {
        let model = basic_model();
        let mut deck = Deck::new(Some(1), "Deck");
        deck.add_note(model.create_note(["Q", back], Vec::<String>::new(), None).unwrap());
        let mut package = Package::new(model);
        package.add_deck(deck).unwrap();
        let col = open_collection(&package.finalize().unwrap());
        col.conn
            .query_row("SELECT guid FROM notes", [], |row| row.get::<_, String>(0))
            .unwrap()
    };

    assert_eq!(build("A"), build("A"));
    assert_ne!(build("A"), build("B"));
}

#[test]
fn test_finalize_twice() {
    let mut package = Package::new(basic_model());
    let first = package.finalize().unwrap();
    assert!(matches!(package.finalize(), Err(Error::AlreadyFinalized)));

    // The first archive is still intact.
    assert!(media_manifest(&first).is_empty());
}

#[test]
fn test_empty_media_aborts_finalize() {
    let mut package = Package::new(basic_model());
    package.add_media("blank.png", Vec::new()).unwrap();
    assert!(matches!(package.finalize(), Err(Error::MediaWrite { .. })));
    assert!(!package.is_finalized());
}

#[test]
fn test_write_to_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("deck.apkg");

    let mut package = Package::new(basic_model());
    package.add_deck(Deck::new(Some(1), "Deck")).unwrap();
    package.write_to_file(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(open_collection(&bytes).count("col"), 1);
}

#[test]
fn test_failed_file_write_can_be_retried() {
    let dir = tempdir().unwrap();
    let missing_dir = dir.path().join("missing").join("deck.apkg");
    let path = dir.path().join("deck.apkg");

    let mut package = Package::new(basic_model());
    package.add_deck(Deck::new(Some(5), "Deck")).unwrap();

    assert!(matches!(
        package.write_to_file(&missing_dir),
        Err(Error::Io(_))
    ));
    assert!(!package.is_finalized());

    package.write_to_file(&path).unwrap();
    assert!(package.is_finalized());
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(open_collection(&bytes).count("col"), 1);
}

#[test]
fn test_add_media_file() {
    let dir = tempdir().unwrap();
    let media_path = dir.path().join("clip.mp3");
    std::fs::write(&media_path, b"ID3\x03").unwrap();

    let mut package = Package::new(basic_model());
    package.add_media_file(&media_path).unwrap();
    let apkg = package.finalize().unwrap();

    assert_eq!(media_manifest(&apkg)["0"], "clip.mp3");
    assert_eq!(read_entry(&apkg, "0"), b"ID3\x03");
}

#[test]
fn test_convert_source_export() {
    let json = r#"[
        {
            "deck_id": 1607392319,
            "name": "Mass Spectrometry",
            "notes": [
                {
                    "id": 8812,
                    "front": "Ionization method?",
                    "back": "ESI",
                    "tags": ["methods"],
                    "attachments": [{ "filename": "esi.png", "side": "back" }]
                },
                { "front": "Analyzer?", "back": "TOF" }
            ]
        },
        { "notes": [{ "front": "Loose", "back": "note" }] }
    ]"#;
    let sources: Vec<SourceDeck> = serde_json::from_str(json).unwrap();
    let config = BuildConfig::parse("[model]\nid = 99\n").unwrap();
    let model = config.note_type();

    let mut media = MediaStore::new();
    media.insert("esi.png", vec![7, 7, 7]);
    let decks = convert_decks(&sources, &model, &media, &config.deck.default_name).unwrap();
    assert_eq!(decks[1].name(), "Imported AnkiPro Deck");

    let mut package = Package::new(model);
    for deck in decks {
        package.add_deck(deck).unwrap();
    }
    package.add_media("esi.png", vec![7, 7, 7]).unwrap();
    let apkg = package.finalize().unwrap();

    let col = open_collection(&apkg);
    assert_eq!(col.count("notes"), 3);
    assert_eq!(col.count("cards"), 3);

    let flds: String = col
        .conn
        .query_row(
            "SELECT flds FROM notes WHERE tags = ' methods '",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(flds, "Ionization method?\x1fESI<br><img src=\"esi.png\">");
    assert_eq!(media_manifest(&apkg)["0"], "esi.png");
}
