//! `tartil`: aligns time-stamped transcripts of Quran recitations to canonical ayat.
//!
//! This crate provides:
//! - An immutable verse corpus with bounds-checked lookups, plus JSON/Tanzil loaders
//! - A partial-ratio similarity scorer over normalized Arabic text
//! - The alignment engine: an exhaustive best-verse search per segment with a strict
//!   acceptance threshold, run in parallel across segments
//! - Pluggable output encoders (JSON, VTT)
//! - A fetch → transcribe → align pipeline with the collaborators behind traits
//!
//! The library is designed to be used by both CLI tools and long-running services: the
//! corpus and engine are built once and shared read-only.

mod error;

pub use error::{Error, Result};

// High-level API (most consumers should start here).
pub mod engine;
pub mod opts;
pub mod pipeline;

// Corpus access and loading.
pub mod corpus;
pub mod corpus_file;

// Scoring and alignment.
pub mod aligner;
pub mod cancel;
pub mod normalize;
pub mod score;

// Input and output records.
pub mod matches;
pub mod segments;
pub mod transcript;

// External collaborators.
pub mod fetch;
pub mod transcribe;
pub mod wav;

// Output selection and encoder interfaces.
pub mod match_encoder;
pub mod output_type;

// Output encoders that serialize matches into various formats.
pub mod json_array_encoder;
pub mod vtt_encoder;

// Logging configuration.
#[cfg(feature = "logging")]
pub mod logging;

pub use aligner::MATCH_THRESHOLD;
pub use cancel::{CancelSignal, NeverCancel};
pub use corpus::{Corpus, Verse};
pub use corpus_file::load_corpus;
pub use engine::Engine;
pub use matches::Match;
pub use normalize::Normalization;
pub use opts::Opts;
pub use output_type::OutputType;
pub use pipeline::{Pipeline, ProcessRequest, ProcessResponse};
pub use score::{PartialRatio, Scorer};
pub use segments::Segment;

#[cfg(feature = "logging")]
pub use logging::init as init_logging;
