//! End-to-end processing of one recitation: fetch audio, transcribe it, align the transcript.
//!
//! Audio acquisition and transcription are external collaborators reached through the
//! [`AudioFetcher`] and [`Transcriber`] traits. The engine only runs once both have
//! succeeded; a collaborator failure surfaces as [`Error::Upstream`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::cancel::CancelSignal;
use crate::engine::Engine;
use crate::matches::Match;
use crate::score::{PartialRatio, Scorer};
use crate::segments::Segment;
use crate::wav::probe_wav;
use crate::{Error, Result};

/// A request to process one recitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Where the recitation lives, e.g. a media URL. Resolved by the [`AudioFetcher`].
    #[serde(alias = "sourceReference", alias = "youtube_url")]
    pub source_reference: String,
}

/// The result of processing one recitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// Where the fetched audio can be retrieved by the caller.
    pub audio_location: String,
    /// Confident matches in transcript order.
    pub matches: Vec<Match>,
}

/// Audio that an [`AudioFetcher`] placed on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAudio {
    /// Local WAV path handed to the transcriber.
    pub path: PathBuf,
    /// Caller-facing location reported in the response.
    pub location: String,
}

/// Resolves a source reference to a local WAV file.
pub trait AudioFetcher: Send + Sync {
    fn fetch(&self, source_reference: &str) -> Result<FetchedAudio>;
}

/// Turns a local audio file into time-stamped transcript segments.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>>;
}

/// Wires the collaborators to a shared [`Engine`].
pub struct Pipeline<F, T, S: Scorer = PartialRatio> {
    fetcher: F,
    transcriber: T,
    engine: Arc<Engine<S>>,
}

impl<F, T, S> Pipeline<F, T, S>
where
    F: AudioFetcher,
    T: Transcriber,
    S: Scorer,
{
    pub fn new(fetcher: F, transcriber: T, engine: Arc<Engine<S>>) -> Self {
        Self {
            fetcher,
            transcriber,
            engine,
        }
    }

    /// Fetch, probe, transcribe, and align.
    pub fn process(
        &self,
        request: &ProcessRequest,
        cancel: &dyn CancelSignal,
    ) -> Result<ProcessResponse> {
        let source = request.source_reference.trim();
        if source.is_empty() {
            return Err(Error::PreconditionFailed(
                "source reference must be provided".to_owned(),
            ));
        }

        let span = info_span!("process", source);
        let _enter = span.enter();

        let audio = self
            .fetcher
            .fetch(source)
            .map_err(|err| match err {
                Error::PreconditionFailed(_) | Error::Cancelled => err,
                other => Error::upstream("audio fetch", other),
            })?;
        let wav = probe_wav(&audio.path).map_err(|err| Error::upstream("audio fetch", err))?;
        info!(
            path = %audio.path.display(),
            duration_seconds = wav.duration_seconds,
            sample_rate = wav.sample_rate,
            "audio fetched"
        );

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let segments = self
            .transcriber
            .transcribe(&audio.path)
            .map_err(|err| Error::upstream("transcription", err))?;
        info!(segments = segments.len(), "transcription finished");

        let matches = self.engine.align_all(&segments, cancel)?;

        Ok(ProcessResponse {
            audio_location: audio.location,
            matches,
        })
    }

    pub fn engine(&self) -> &Arc<Engine<S>> {
        &self.engine
    }
}
