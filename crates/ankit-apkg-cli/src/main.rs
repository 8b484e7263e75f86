//! Command-line front end for building Anki `.apkg` packages.
//!
//! Takes AnkiPro deck data that has already been extracted to JSON (see
//! [`ankit_apkg::SourceDeck`]) plus a directory of downloaded attachments,
//! and writes an importable package.

use std::path::{Path, PathBuf};

use ankit_apkg::{BuildConfig, MediaStore, Package, SourceDeck, convert_decks};
use clap::Parser;
use tracing::{debug, info, warn};

/// Build an Anki .apkg package from extracted AnkiPro deck data.
#[derive(Parser, Debug)]
#[command(name = "ankit-apkg")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file with the extracted decks
    input: PathBuf,

    /// Where to write the .apkg file
    output: PathBuf,

    /// Directory holding attachment files referenced by the decks
    #[arg(long)]
    media_dir: Option<PathBuf>,

    /// TOML build configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    if !args
        .output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("apkg"))
    {
        warn!(output = %args.output.display(), "Output path does not end with .apkg");
    }

    let config = match &args.config {
        Some(path) => BuildConfig::from_file(path)?,
        None => BuildConfig::default(),
    };

    let content = std::fs::read_to_string(&args.input)?;
    let sources: Vec<SourceDeck> = serde_json::from_str(&content)?;
    info!(decks = sources.len(), input = %args.input.display(), "Loaded source decks");

    let media = match &args.media_dir {
        Some(dir) => load_media(&sources, dir),
        None => MediaStore::new(),
    };

    let note_type = config.note_type();
    let decks = convert_decks(&sources, &note_type, &media, &config.deck.default_name)?;

    let mut package = Package::new(note_type)
        .with_compression(config.archive.compression)
        .with_media(media);
    for deck in decks {
        package.add_deck(deck)?;
    }

    package.write_to_file(&args.output)?;
    println!("Created {}", args.output.display());
    Ok(())
}

/// Load every attachment the decks reference that exists in `dir`.
///
/// Missing or unreadable files are skipped; their attachments are dropped
/// from the notes during conversion.
fn load_media(sources: &[SourceDeck], dir: &Path) -> MediaStore {
    let mut media = MediaStore::new();
    let filenames = sources
        .iter()
        .flat_map(|deck| &deck.notes)
        .flat_map(|note| &note.attachments)
        .map(|attachment| attachment.filename.as_str());

    for filename in filenames {
        if media.contains(filename) {
            continue;
        }
        match media.insert_file(dir.join(filename)) {
            Ok(()) => debug!(filename, "Loaded attachment"),
            Err(e) => warn!(filename, error = %e, "Skipping attachment"),
        }
    }

    media
}
