use std::str::FromStr;

use crate::Error;

/// Output formats for encoded matches, shared by the CLI, the server and library callers.
///
/// Each variant maps to one `MatchEncoder` implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputType {
    /// A JSON array of matches.
    #[default]
    Json,

    /// WebVTT cues (`surah:ayah text`).
    Vtt,
}

impl OutputType {
    /// HTTP content type for this format.
    pub fn content_type(self) -> &'static str {
        match self {
            OutputType::Json => "application/json; charset=utf-8",
            OutputType::Vtt => "text/vtt; charset=utf-8",
        }
    }
}

/// Case-insensitive, surrounding whitespace ignored.
impl FromStr for OutputType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("json") {
            Ok(OutputType::Json)
        } else if s.eq_ignore_ascii_case("vtt") {
            Ok(OutputType::Vtt)
        } else {
            Err(Error::msg(format!(
                "unknown output type '{s}' (expected 'json' or 'vtt')"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats_case_insensitively() -> anyhow::Result<()> {
        assert_eq!(" json ".parse::<OutputType>()?, OutputType::Json);
        assert_eq!("VTT".parse::<OutputType>()?, OutputType::Vtt);
        Ok(())
    }

    #[test]
    fn rejects_unknown_format() {
        let err = "srt".parse::<OutputType>().unwrap_err();
        assert!(err.to_string().contains("unknown output type 'srt'"));
    }
}
