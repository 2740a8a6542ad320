use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One time-stamped transcript fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Recognized text. May be empty or noisy.
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Check timing invariants: finite timestamps with `start <= end`.
    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(Error::MalformedSegment(format!(
                "non-finite timestamps ({} -> {})",
                self.start, self.end
            )));
        }
        if self.end < self.start {
            return Err(Error::MalformedSegment(format!(
                "end {} precedes start {}",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

/// A segment as a transcription collaborator emits it, before validation.
///
/// Every field is optional here so one bad entry doesn't sink the whole transcript.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSegment {
    #[serde(default, alias = "start_seconds")]
    pub start: Option<f64>,
    #[serde(default, alias = "end_seconds")]
    pub end: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
}

impl TryFrom<RawSegment> for Segment {
    type Error = Error;

    fn try_from(raw: RawSegment) -> Result<Self> {
        let missing = |field: &str| Error::MalformedSegment(format!("missing `{field}`"));
        let segment = Segment {
            start: raw.start.ok_or_else(|| missing("start"))?,
            end: raw.end.ok_or_else(|| missing("end"))?,
            text: raw.text.ok_or_else(|| missing("text"))?,
        };
        segment.validate()?;
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_segment_is_valid() -> anyhow::Result<()> {
        Segment::new(1.5, 1.5, "").validate()?;
        Ok(())
    }

    #[test]
    fn reversed_and_non_finite_timing_is_malformed() {
        let err = Segment::new(3.0, 2.0, "x").validate().unwrap_err();
        assert!(matches!(err, Error::MalformedSegment(_)));
        assert!(err.to_string().contains("precedes"));

        let err = Segment::new(f64::NAN, 2.0, "x").validate().unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn raw_segment_requires_every_field() {
        let raw = RawSegment {
            start: Some(0.0),
            end: Some(1.0),
            text: None,
        };
        let err = Segment::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("missing `text`"));
    }

    #[test]
    fn raw_segment_accepts_seconds_aliases() -> anyhow::Result<()> {
        let raw: RawSegment =
            serde_json::from_str(r#"{"start_seconds":0.5,"end_seconds":2.0,"text":"قل"}"#)?;
        let seg = Segment::try_from(raw)?;
        assert_eq!(seg, Segment::new(0.5, 2.0, "قل"));
        Ok(())
    }
}
