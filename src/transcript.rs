//! Ingesting transcription output.
//!
//! This is the boundary where loosely-shaped collaborator output becomes validated
//! [`Segment`]s. Two document shapes are accepted:
//! - a bare JSON array of segments
//! - an object with a `segments` array (the shape Whisper's `transcribe()` returns)
//!
//! Individual entries that fail validation are logged and dropped; the rest keep their order.

use std::io::Read;

use serde::Deserialize;
use tracing::warn;

use crate::Result;
use crate::segments::{RawSegment, Segment};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptDoc {
    Segments(Vec<RawSegment>),
    Transcription { segments: Vec<RawSegment> },
}

impl TranscriptDoc {
    fn into_raw(self) -> Vec<RawSegment> {
        match self {
            TranscriptDoc::Segments(raw) => raw,
            TranscriptDoc::Transcription { segments } => segments,
        }
    }
}

/// Parse a transcript document from a reader.
pub fn read_segments<R: Read>(r: R) -> Result<Vec<Segment>> {
    let doc: TranscriptDoc = serde_json::from_reader(r)?;
    Ok(validate_all(doc.into_raw()))
}

/// Parse a transcript document from a string.
pub fn parse_segments(s: &str) -> Result<Vec<Segment>> {
    let doc: TranscriptDoc = serde_json::from_str(s)?;
    Ok(validate_all(doc.into_raw()))
}

/// Convert raw entries into segments, skipping the malformed ones.
pub fn validate_all(raw: Vec<RawSegment>) -> Vec<Segment> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match Segment::try_from(raw) {
            Ok(segment) => Some(segment),
            Err(err) => {
                warn!(index, error = %err, "skipping transcript segment");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_array() -> anyhow::Result<()> {
        let segs = parse_segments(r#"[{"start":0.0,"end":3.2,"text":"بسم الله"}]"#)?;
        assert_eq!(segs, vec![Segment::new(0.0, 3.2, "بسم الله")]);
        Ok(())
    }

    #[test]
    fn accepts_whisper_result_object_and_ignores_extra_fields() -> anyhow::Result<()> {
        let json = r#"{
            "text": "full transcript",
            "language": "ar",
            "segments": [
                {"id": 0, "seek": 0, "start": 0.0, "end": 2.0, "text": " قل هو الله أحد", "avg_logprob": -0.2},
                {"id": 1, "seek": 0, "start": 2.0, "end": 3.5, "text": " الله الصمد"}
            ]
        }"#;
        let segs = parse_segments(json)?;
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].text, " الله الصمد");
        Ok(())
    }

    #[test]
    fn malformed_entries_are_skipped_in_order() -> anyhow::Result<()> {
        let json = r#"[
            {"start": 0.0, "end": 1.0, "text": "a"},
            {"start": 3.0, "end": 2.0, "text": "reversed"},
            {"start": 4.0, "end": 5.0},
            {"start_seconds": 5.0, "end_seconds": 6.0, "text": "b"}
        ]"#;
        let segs = read_segments(json.as_bytes())?;
        let texts: Vec<&str> = segs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn non_transcript_json_is_an_error() {
        assert!(parse_segments(r#"{"not":"a transcript"}"#).is_err());
        assert!(parse_segments("not json").is_err());
    }
}
