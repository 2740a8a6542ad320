use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};
use uuid::Uuid;

use crate::pipeline::{AudioFetcher, FetchedAudio};
use crate::{Error, Result};

/// File name of the extracted audio inside each per-request directory.
pub const AUDIO_FILE_NAME: &str = "audio.wav";

/// An [`AudioFetcher`] that shells out to `yt-dlp`.
///
/// Each fetch gets its own directory under `audio_root`, named by a fresh UUID, so concurrent
/// requests never overwrite each other's audio. The reported location is
/// `{public_base_url}/{uuid}/audio.wav`.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    /// Program to run (defaults to `yt-dlp`).
    pub program: String,
    /// Directory that per-request audio directories are created in.
    pub audio_root: PathBuf,
    /// URL prefix under which `audio_root` is served.
    pub public_base_url: String,
}

impl CommandFetcher {
    pub fn new(audio_root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            program: "yt-dlp".to_owned(),
            audio_root: audio_root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Arguments passed to the program for one fetch.
    fn args(&self, source_reference: &str, output_template: &str) -> Vec<String> {
        [
            "--format",
            "bestaudio/best",
            "--no-playlist",
            "--extract-audio",
            "--audio-format",
            "wav",
            "--output",
            output_template,
            "--",
            source_reference,
        ]
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
    }

    fn location(&self, id: &Uuid) -> String {
        format!(
            "{}/{id}/{AUDIO_FILE_NAME}",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

impl AudioFetcher for CommandFetcher {
    fn fetch(&self, source_reference: &str) -> Result<FetchedAudio> {
        if source_reference.starts_with('-') {
            return Err(Error::PreconditionFailed(format!(
                "source reference may not start with '-': {source_reference}"
            )));
        }

        let id = Uuid::new_v4();
        let dir = self.audio_root.join(id.to_string());
        std::fs::create_dir_all(&dir)?;

        let template = dir.join("audio.%(ext)s");
        let args = self.args(source_reference, &template.to_string_lossy());
        debug!(program = %self.program, ?args, "running audio fetch");

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

        let path = dir.join(AUDIO_FILE_NAME);
        if !path.is_file() {
            return Err(Error::msg(format!(
                "'{}' succeeded but produced no '{}'",
                self.program,
                path.display()
            )));
        }

        info!(%id, path = %path.display(), "audio fetched");
        Ok(FetchedAudio {
            path,
            location: self.location(&id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_extract_wav_and_end_options_before_source() {
        let fetcher = CommandFetcher::new("/tmp/audio", "http://localhost:8080/static/audio");
        let args = fetcher.args("https://example.com/watch?v=1", "/tmp/audio/x/audio.%(ext)s");
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/watch?v=1"));
        assert_eq!(args[args.len() - 2], "--");
        assert!(args.windows(2).any(|w| w == ["--audio-format", "wav"]));
        assert!(args.contains(&"--no-playlist".to_owned()));
    }

    #[test]
    fn location_joins_base_url_without_double_slash() {
        let fetcher = CommandFetcher::new("/tmp/audio", "http://localhost:8080/static/audio/");
        let id = Uuid::nil();
        assert_eq!(
            fetcher.location(&id),
            "http://localhost:8080/static/audio/00000000-0000-0000-0000-000000000000/audio.wav"
        );
    }

    #[test]
    fn option_like_source_is_rejected() {
        let fetcher = CommandFetcher::new("/tmp/audio", "http://localhost");
        let err = fetcher.fetch("--exec=rm").unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));
    }

    #[test]
    fn missing_program_is_reported() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let mut fetcher = CommandFetcher::new(root.path(), "http://localhost");
        fetcher.program = "tartil-definitely-missing-program".to_owned();
        let err = fetcher.fetch("https://example.com/v").unwrap_err();
        assert!(err.to_string().contains("failed to run"));
        Ok(())
    }
}
