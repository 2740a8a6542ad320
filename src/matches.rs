use serde::{Deserialize, Serialize};

/// A transcript segment confidently identified as one ayah.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Start time of the originating segment, in seconds.
    pub start: f64,
    /// End time of the originating segment, in seconds.
    pub end: f64,
    pub surah: usize,
    pub ayah: usize,
    /// Canonical (unnormalized) verse text.
    pub ayah_text: String,
    /// Similarity score in `0..=100`.
    pub score: u8,
}

impl Match {
    /// `surah:ayah`, e.g. `"1:7"`.
    pub fn verse_key(&self) -> String {
        format!("{}:{}", self.surah, self.ayah)
    }
}
