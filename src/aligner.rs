//! Best-verse search for a single transcript segment.
//!
//! The sweep is exhaustive: every ayah of every surah is scored, in canonical
//! order, and the first strictly-best candidate wins. There is no secondary ranking signal, so
//! that iteration order *is* the tie-break.

use tracing::trace;

use crate::cancel::CancelSignal;
use crate::corpus::{Corpus, SURAH_COUNT};
use crate::matches::Match;
use crate::score::Scorer;
use crate::segments::Segment;
use crate::{Error, Result};

/// Minimum score a best candidate must *exceed* to be accepted.
pub const MATCH_THRESHOLD: u8 = 85;

/// The corpus reduced through a scorer's `prepare` step, in canonical order.
///
/// Built once per engine so the sweep never re-normalizes verse text.
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    // `surahs[s - 1][a - 1]` is the prepared text of `s:a`.
    surahs: Vec<Vec<String>>,
}

impl PreparedCorpus {
    /// Prepare every verse of `corpus`, reading it through its public lookup contract.
    pub fn new<S: Scorer + ?Sized>(corpus: &Corpus, scorer: &S) -> Result<Self> {
        let mut surahs = Vec::with_capacity(SURAH_COUNT);
        for surah in 1..=SURAH_COUNT {
            let count = corpus.verse_count(surah)?;
            let mut ayat = Vec::with_capacity(count);
            for ayah in 1..=count {
                let text = corpus.verse_text(surah, ayah)?;
                ayat.push(scorer.prepare(text).into_owned());
            }
            surahs.push(ayat);
        }
        Ok(Self { surahs })
    }
}

/// Aligns one segment against the whole corpus.
pub struct SegmentAligner<'a, S: Scorer + ?Sized> {
    corpus: &'a Corpus,
    prepared: &'a PreparedCorpus,
    scorer: &'a S,
    threshold: u8,
}

#[derive(Debug, Clone, Copy)]
struct Best {
    surah: usize,
    ayah: usize,
    score: u8,
}

impl<'a, S: Scorer + ?Sized> SegmentAligner<'a, S> {
    pub fn new(
        corpus: &'a Corpus,
        prepared: &'a PreparedCorpus,
        scorer: &'a S,
        threshold: u8,
    ) -> Self {
        Self {
            corpus,
            prepared,
            scorer,
            threshold,
        }
    }

    /// Find the best verse for `segment`, returning a match only if its score is strictly
    /// above the threshold.
    ///
    /// `cancel` is polled before each surah. A cancelled sweep returns [`Error::Cancelled`].
    pub fn align(&self, segment: &Segment, cancel: &dyn CancelSignal) -> Result<Option<Match>> {
        let fragment = self.scorer.prepare(&segment.text);
        if fragment.trim().is_empty() {
            return Ok(None);
        }

        let mut best: Option<Best> = None;
        for (s, ayat) in self.prepared.surahs.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            for (a, reference) in ayat.iter().enumerate() {
                let score = self.scorer.score_prepared(&fragment, reference);
                // Strictly greater: an equal score never displaces an earlier verse.
                if score > best.map_or(0, |b| b.score) {
                    best = Some(Best {
                        surah: s + 1,
                        ayah: a + 1,
                        score,
                    });
                }
            }
        }

        let Some(best) = best else {
            return Ok(None);
        };
        trace!(
            surah = best.surah,
            ayah = best.ayah,
            score = best.score,
            "best candidate"
        );
        if best.score <= self.threshold {
            return Ok(None);
        }

        let ayah_text = self.corpus.verse_text(best.surah, best.ayah)?;
        Ok(Some(Match {
            start: segment.start,
            end: segment.end,
            surah: best.surah,
            ayah: best.ayah,
            ayah_text: ayah_text.to_owned(),
            score: best.score,
        }))
    }
}
