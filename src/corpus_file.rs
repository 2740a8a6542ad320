//! Loading a [`Corpus`] from disk.
//!
//! Two formats are supported:
//! - JSON: an array of `{ "surah": 1, "ayah": 1, "text": "..." }` objects.
//! - Tanzil text: one verse per line as `surah|ayah|text`, with `#` comments and blank lines
//!   ignored (the layout of the Tanzil project's plain-text downloads).

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::info;

use crate::corpus::{Corpus, Verse};
use crate::{Error, Result};

/// On-disk corpus layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    Json,
    Tanzil,
}

impl CorpusFormat {
    /// Pick a format from the file extension, falling back to sniffing the content prefix.
    fn detect(path: &Path, prefix: &[u8]) -> Self {
        let is_json_ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json_ext {
            return Self::Json;
        }

        match prefix.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'[') => Self::Json,
            _ => Self::Tanzil,
        }
    }
}

/// Load a corpus file, detecting its format.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Corpus> {
    let path = path.as_ref();
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|err| Error::msg(format!("failed to read corpus '{}': {err}", path.display())))?;

    let format = CorpusFormat::detect(path, &bytes);
    let corpus = match format {
        CorpusFormat::Json => read_json(bytes.as_slice()),
        CorpusFormat::Tanzil => read_tanzil(BufReader::new(bytes.as_slice())),
    }
    .map_err(|err| Error::InvalidCorpus(format!("{}: {err}", path.display())))?;

    info!(
        path = %path.display(),
        ?format,
        verses = corpus.len(),
        canonical = corpus.is_canonical(),
        "corpus loaded"
    );
    Ok(corpus)
}

/// Read a JSON array of verses.
pub fn read_json<R: Read>(r: R) -> Result<Corpus> {
    let verses: Vec<Verse> = serde_json::from_reader(r)?;
    Corpus::from_verses(verses)
}

/// Read Tanzil-style `surah|ayah|text` lines.
pub fn read_tanzil<R: BufRead>(r: R) -> Result<Corpus> {
    let mut verses = Vec::new();
    for (idx, line) in r.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        verses.push(parse_tanzil_line(trimmed).ok_or_else(|| {
            Error::InvalidCorpus(format!(
                "line {}: expected 'surah|ayah|text', got '{trimmed}'",
                idx + 1
            ))
        })?);
    }
    Corpus::from_verses(verses)
}

fn parse_tanzil_line(line: &str) -> Option<Verse> {
    let mut parts = line.splitn(3, '|');
    let surah = parts.next()?.trim().parse().ok()?;
    let ayah = parts.next()?.trim().parse().ok()?;
    let text = parts.next()?.trim().to_owned();
    Some(Verse { surah, ayah, text })
}
