//! Text normalization applied before scoring.
//!
//! ASR output for a recitation is usually plain Arabic letters with stray punctuation, while
//! the canonical text carries full tashkeel and Quranic annotation marks. A fixed policy,
//! applied identically to the fragment and every candidate, keeps those differences from
//! drowning out the letters that actually matter.

use serde::{Deserialize, Serialize};

/// How text is reduced before it is compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Compare text verbatim.
    None,

    /// Trim and collapse whitespace only.
    Whitespace,

    /// Strip diacritics and annotation marks, fold letter variants, drop punctuation.
    #[default]
    Arabic,
}

/// Apply `policy` to `text`.
pub fn normalize(text: &str, policy: Normalization) -> String {
    match policy {
        Normalization::None => text.to_owned(),
        Normalization::Whitespace => collapse_whitespace(text),
        Normalization::Arabic => normalize_arabic(text),
    }
}

/// Reduce Arabic text to bare, folded letters separated by single spaces.
pub fn normalize_arabic(text: &str) -> String {
    let folded: String = text
        .chars()
        .filter(|&c| !is_mark(c))
        .map(|c| match fold_letter(c) {
            c if c.is_alphanumeric() || c.is_whitespace() => c,
            _ => ' ',
        })
        .collect();
    collapse_whitespace(&folded)
}

/// Trim and replace every run of whitespace with a single ASCII space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Harakat, tanween, shadda, sukun, superscript alef, tatweel and the Quranic annotation block.
fn is_mark(c: char) -> bool {
    matches!(
        c,
        '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{0640}' | '\u{06D6}'..='\u{06ED}'
    )
}

fn fold_letter(c: char) -> char {
    match c {
        'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
        'ى' => 'ي',
        'ة' => 'ه',
        'ؤ' => 'و',
        'ئ' => 'ي',
        other => other,
    }
}
