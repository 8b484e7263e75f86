//! Example: Build an Anki deck in code
//!
//! This example demonstrates how to use ankit-apkg to:
//! 1. Define a two-template note type
//! 2. Fill a deck with notes
//! 3. Generate an .apkg file
//!
//! Run with: cargo run -p ankit-apkg --example build_deck

use ankit_apkg::{Deck, NoteType, Package, Template};

const WORDS: &[(&str, &str, &[&str])] = &[
    ("Hola", "Hello", &["greetings"]),
    ("Adios", "Goodbye", &["greetings"]),
    ("uno", "one", &["numbers"]),
    ("dos", "two", &["numbers"]),
    ("tres", "three", &["numbers"]),
];

fn main() -> ankit_apkg::Result<()> {
    let model = NoteType::with_derived_requirements(
        None,
        "Basic Spanish",
        vec!["Spanish".to_string(), "English".to_string()],
        vec![
            Template::new("Spanish -> English", "{{Spanish}}", "{{FrontSide}}<hr>{{English}}"),
            Template::new("English -> Spanish", "{{English}}", "{{FrontSide}}<hr>{{Spanish}}"),
        ],
    )?;

    let mut deck = Deck::new(None, "Spanish::Basics").with_description("Basic Spanish vocabulary");
    for (spanish, english, tags) in WORDS {
        deck.add_note(model.create_note([*spanish, *english], tags.iter().copied(), None)?);
    }

    println!("  Note type: {} ({})", model.name(), model.id());
    println!("  Deck: {} ({} notes)", deck.name(), deck.notes().len());

    let mut package = Package::new(model);
    package.add_deck(deck)?;

    let output_path = std::env::temp_dir().join("spanish_basics.apkg");
    println!("\nGenerating .apkg file: {}", output_path.display());
    package.write_to_file(&output_path)?;

    let metadata = std::fs::metadata(&output_path)?;
    println!("  Created: {} bytes", metadata.len());
    println!("\nDone! You can import this file into Anki.");

    Ok(())
}
