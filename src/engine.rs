//! High-level API for aligning transcripts with Tartil.
//!
//! We expose a single entry point (`Engine`) that wraps corpus preparation, the per-segment
//! aligner, parallel scheduling, and output encoding.
//!
//! The intent is:
//! - We load the corpus once (at process start) and share it read-only.
//! - We prepare (normalize) every verse once, when the engine is built.
//! - We reuse the engine to align many transcripts.
//! - Callers choose output format and behavior via `Opts`.

use std::io::{BufWriter, Write};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::aligner::{PreparedCorpus, SegmentAligner};
use crate::cancel::CancelSignal;
use crate::corpus::Corpus;
use crate::json_array_encoder::JsonArrayEncoder;
use crate::match_encoder::MatchEncoder;
use crate::matches::Match;
use crate::opts::Opts;
use crate::output_type::OutputType;
use crate::score::{PartialRatio, Scorer};
use crate::segments::Segment;
use crate::vtt_encoder::VttEncoder;
use crate::{Error, Result};

/// The main alignment entry point.
///
/// `Engine` owns the long-lived resources required for alignment:
/// - a shared, read-only `Corpus`
/// - the corpus as prepared by the scorer
/// - a dedicated worker pool
///
/// Typical usage:
/// - Construct once (corpus preparation happens here).
/// - Call `align_all` or `align_to_writer` many times, from any thread.
pub struct Engine<S: Scorer = PartialRatio> {
    corpus: Arc<Corpus>,
    prepared: PreparedCorpus,
    scorer: S,
    threshold: u8,
    pool: rayon::ThreadPool,
}

impl Engine<PartialRatio> {
    /// Create an engine with the built-in partial-ratio scorer and the normalization from
    /// `opts`.
    pub fn new(corpus: Arc<Corpus>, opts: &Opts) -> Result<Self> {
        Self::with_scorer(corpus, PartialRatio::new(opts.normalization), opts)
    }
}

impl<S: Scorer> Engine<S> {
    /// Create an engine with a custom scorer.
    pub fn with_scorer(corpus: Arc<Corpus>, scorer: S, opts: &Opts) -> Result<Self> {
        let prepared = PreparedCorpus::new(&corpus, &scorer)?;

        let threads = opts.thread_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tartil-align-{i}"))
            .build()
            .map_err(|err| Error::Other(Box::new(err)))?;

        info!(
            verses = corpus.len(),
            threads,
            threshold = opts.threshold,
            "alignment engine ready"
        );

        Ok(Self {
            corpus,
            prepared,
            scorer,
            threshold: opts.threshold,
            pool,
        })
    }

    /// Align a single segment.
    ///
    /// The segment is not validated here; see [`Engine::align_all`] for the batch path that
    /// skips malformed segments.
    pub fn align(&self, segment: &Segment, cancel: &dyn CancelSignal) -> Result<Option<Match>> {
        self.aligner().align(segment, cancel)
    }

    /// Align every segment, returning matches in input order.
    ///
    /// - An empty `segments` slice fails with [`Error::PreconditionFailed`].
    /// - Segments with invalid timing are skipped with a warning.
    /// - Segments without a confident match are omitted.
    /// - If `cancel` fires, the whole call returns [`Error::Cancelled`].
    pub fn align_all(&self, segments: &[Segment], cancel: &dyn CancelSignal) -> Result<Vec<Match>> {
        if segments.is_empty() {
            return Err(Error::PreconditionFailed(
                "no transcript segments to align".to_owned(),
            ));
        }

        let aligner = self.aligner();

        // Indexed parallel iterators collect in input order regardless of completion order.
        let results: Vec<Option<Match>> = self.pool.install(|| {
            segments
                .par_iter()
                .enumerate()
                .map(|(index, segment)| {
                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                    if let Err(err) = segment.validate() {
                        warn!(index, error = %err, "skipping segment");
                        return Ok(None);
                    }
                    let found = aligner.align(segment, cancel)?;
                    if let Some(m) = &found {
                        debug!(index, surah = m.surah, ayah = m.ayah, score = m.score, "matched");
                    }
                    Ok(found)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let matches: Vec<Match> = results.into_iter().flatten().collect();
        info!(
            segments = segments.len(),
            matches = matches.len(),
            "alignment finished"
        );
        Ok(matches)
    }

    /// Align `segments` and write the matches to `w` in the requested format.
    ///
    /// The encoder is always closed, even when alignment fails, so callers get well-formed
    /// (if empty) output; the alignment error takes precedence over a close error.
    pub fn align_to_writer<W: Write>(
        &self,
        segments: &[Segment],
        w: W,
        output_type: OutputType,
        cancel: &dyn CancelSignal,
    ) -> Result<usize> {
        let writer = BufWriter::new(w);

        // Select an encoder based on the requested output type.
        match output_type {
            OutputType::Json => {
                let mut encoder = JsonArrayEncoder::new(writer);
                let run_res = self.align_with_encoder(segments, &mut encoder, cancel);
                merge_run_and_close(run_res, encoder.close())
            }
            OutputType::Vtt => {
                let mut encoder = VttEncoder::new(writer);
                let run_res = self.align_with_encoder(segments, &mut encoder, cancel);
                merge_run_and_close(run_res, encoder.close())
            }
        }
    }

    fn align_with_encoder<E: MatchEncoder>(
        &self,
        segments: &[Segment],
        encoder: &mut E,
        cancel: &dyn CancelSignal,
    ) -> Result<usize> {
        let matches = self.align_all(segments, cancel)?;
        for m in &matches {
            encoder.write_match(m)?;
        }
        Ok(matches.len())
    }

    fn aligner(&self) -> SegmentAligner<'_, S> {
        SegmentAligner::new(&self.corpus, &self.prepared, &self.scorer, self.threshold)
    }

    /// Access the shared corpus.
    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    /// Access the configured scorer.
    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// The acceptance threshold in effect.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

fn merge_run_and_close<T>(run_res: Result<T>, close_res: Result<()>) -> Result<T> {
    match (run_res, close_res) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "encoder close failed after alignment error");
            Err(err)
        }
    }
}
