//! The verse corpus: an immutable table of canonical ayat.
//!
//! A `Corpus` is built once at startup (see `corpus_file` for loaders) and is read-only for
//! the rest of its life, so it can be shared across threads behind an `Arc` without locking.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Number of surahs in the mushaf.
pub const SURAH_COUNT: usize = 114;

/// Ayat per surah in the standard (Kufan) numbering, indexed by `surah - 1`.
pub const CANONICAL_VERSE_COUNTS: [usize; SURAH_COUNT] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53, 89,
    59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12, 12, 30,
    52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26, 30, 20, 15,
    21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Total ayat in a canonical corpus.
pub const CANONICAL_VERSE_TOTAL: usize = 6236;

/// A single canonical verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub surah: usize,
    pub ayah: usize,
    pub text: String,
}

/// A borrowed view of one verse, yielded by [`Corpus::verses`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseRef<'a> {
    pub surah: usize,
    pub ayah: usize,
    pub text: &'a str,
}

/// An immutable, fully-populated table of verses addressable by `(surah, ayah)`.
///
/// Surahs missing from a partial corpus report a verse count of zero; they are still in range.
#[derive(Debug, Clone)]
pub struct Corpus {
    // Always `SURAH_COUNT` entries; `surahs[s - 1][a - 1]` is the text of `s:a`.
    surahs: Vec<Vec<String>>,
    total: usize,
}

impl Corpus {
    /// Build a corpus from verses in any order.
    ///
    /// Within each surah the ayat must run contiguously from 1 with no duplicates, and every
    /// text must be non-blank.
    pub fn from_verses<I>(verses: I) -> Result<Self>
    where
        I: IntoIterator<Item = Verse>,
    {
        let mut verses: Vec<Verse> = verses.into_iter().collect();
        verses.sort_by_key(|v| (v.surah, v.ayah));

        let mut surahs: Vec<Vec<String>> = vec![Vec::new(); SURAH_COUNT];
        for verse in verses {
            if !(1..=SURAH_COUNT).contains(&verse.surah) {
                return Err(Error::InvalidCorpus(format!(
                    "verse {}:{} names a surah outside 1..={SURAH_COUNT}",
                    verse.surah, verse.ayah
                )));
            }

            let ayat = &mut surahs[verse.surah - 1];
            let expected = ayat.len() + 1;
            if verse.ayah != expected {
                let problem = if verse.ayah < expected {
                    "is duplicated"
                } else {
                    "leaves a gap"
                };
                return Err(Error::InvalidCorpus(format!(
                    "verse {}:{} {problem} (expected ayah {expected})",
                    verse.surah, verse.ayah
                )));
            }

            if verse.text.trim().is_empty() {
                return Err(Error::InvalidCorpus(format!(
                    "verse {}:{} has empty text",
                    verse.surah, verse.ayah
                )));
            }

            ayat.push(verse.text);
        }

        let total = surahs.iter().map(Vec::len).sum();
        debug!(verses = total, "corpus built");

        Ok(Self { surahs, total })
    }

    /// Number of ayat in `surah`.
    pub fn verse_count(&self, surah: usize) -> Result<usize> {
        Ok(self.surah(surah)?.len())
    }

    /// Canonical text of `surah:ayah`.
    pub fn verse_text(&self, surah: usize, ayah: usize) -> Result<&str> {
        let ayat = self.surah(surah)?;
        if ayah == 0 || ayah > ayat.len() {
            return Err(Error::ayah_out_of_range(surah, ayah, ayat.len()));
        }
        Ok(&ayat[ayah - 1])
    }

    /// Iterate every verse in canonical order (surah, then ayah).
    pub fn verses(&self) -> impl Iterator<Item = VerseRef<'_>> + '_ {
        self.surahs.iter().enumerate().flat_map(|(s, ayat)| {
            ayat.iter().enumerate().map(move |(a, text)| VerseRef {
                surah: s + 1,
                ayah: a + 1,
                text,
            })
        })
    }

    /// Total number of verses.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Whether every surah carries exactly its canonical number of ayat.
    pub fn is_canonical(&self) -> bool {
        self.surahs
            .iter()
            .zip(CANONICAL_VERSE_COUNTS)
            .all(|(ayat, expected)| ayat.len() == expected)
    }

    /// Fail unless the corpus is complete.
    pub fn ensure_canonical(&self) -> Result<()> {
        for (idx, (ayat, expected)) in self.surahs.iter().zip(CANONICAL_VERSE_COUNTS).enumerate() {
            if ayat.len() != expected {
                return Err(Error::InvalidCorpus(format!(
                    "surah {} has {} ayat, expected {expected}",
                    idx + 1,
                    ayat.len()
                )));
            }
        }
        Ok(())
    }

    fn surah(&self, surah: usize) -> Result<&[String]> {
        if surah == 0 || surah > SURAH_COUNT {
            return Err(Error::surah_out_of_range(surah, SURAH_COUNT));
        }
        Ok(&self.surahs[surah - 1])
    }
}
