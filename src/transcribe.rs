use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::pipeline::Transcriber;
use crate::segments::Segment;
use crate::transcript::parse_segments;
use crate::{Error, Result};

/// Placeholder replaced with the audio path in [`CommandTranscriber::args`].
pub const AUDIO_PLACEHOLDER: &str = "{audio}";

/// A [`Transcriber`] that runs an external program and reads a JSON transcript from its
/// stdout.
///
/// Any argument containing `{audio}` has it replaced with the audio path; if no argument does,
/// the path is appended as the last argument. The program should be configured for Arabic so
/// its text shares the corpus script.
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandTranscriber {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn resolved_args(&self, audio_path: &Path) -> Vec<String> {
        let audio = audio_path.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(AUDIO_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(AUDIO_PLACEHOLDER, &audio)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(audio.into_owned());
        }
        args
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>> {
        let args = self.resolved_args(audio_path);
        debug!(program = %self.program, ?args, "running transcription");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|err| Error::msg(format!("failed to run '{}': {err}", self.program)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::msg(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = std::str::from_utf8(&output.stdout)
            .map_err(|err| Error::msg(format!("transcript is not UTF-8: {err}")))?;
        parse_segments(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_substituted_in_place() {
        let t = CommandTranscriber::new(
            "transcribe",
            vec!["-o".into(), "json".into(), "--audio={audio}".into()],
        );
        assert_eq!(
            t.resolved_args(Path::new("/a/audio.wav")),
            vec!["-o", "json", "--audio=/a/audio.wav"]
        );
    }

    #[test]
    fn path_is_appended_without_placeholder() {
        let t = CommandTranscriber::new("whisper-json", vec!["--language".into(), "ar".into()]);
        assert_eq!(
            t.resolved_args(Path::new("/a/audio.wav")),
            vec!["--language", "ar", "/a/audio.wav"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn stdout_transcript_is_parsed() -> anyhow::Result<()> {
        let t = CommandTranscriber::new(
            "sh",
            vec![
                "-c".into(),
                r#"printf '[{"start":0.0,"end":1.5,"text":"%s"}]' "$0""#.into(),
            ],
        );
        let segments = t.transcribe(Path::new("قل"))?;
        assert_eq!(segments, vec![Segment::new(0.0, 1.5, "قل")]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_status_and_stderr() {
        let t = CommandTranscriber::new("sh", vec!["-c".into(), "echo boom >&2; exit 3".into()]);
        let err = t.transcribe(Path::new("/a/audio.wav")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exited with"));
        assert!(msg.contains("boom"));
    }
}
