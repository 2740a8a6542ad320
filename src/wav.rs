use std::io::{Read, Seek};
use std::path::Path;

use hound::WavReader;

use crate::{Error, Result};

/// Basic facts about a fetched WAV file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub duration_seconds: f64,
}

/// Open a WAV file and read its header.
///
/// We only look at the header: this exists to fail fast when the audio collaborator
/// produced something that is not decodable WAV, before we spend time transcribing it.
pub fn probe_wav(path: impl AsRef<Path>) -> Result<WavInfo> {
    let path = path.as_ref();
    let reader = WavReader::open(path)
        .map_err(|err| Error::msg(format!("failed to read WAV '{}': {err}", path.display())))?;
    wav_info(&reader)
}

/// Read the header of WAV data from any seekable reader.
pub fn probe_wav_reader<R: Read + Seek>(r: R) -> Result<WavInfo> {
    let reader = WavReader::new(r)?;
    wav_info(&reader)
}

fn wav_info<R: Read>(reader: &WavReader<R>) -> Result<WavInfo> {
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(Error::msg(format!(
            "WAV header declares {} channels at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }

    // `duration()` counts frames (samples per channel).
    let duration_seconds = f64::from(reader.duration()) / f64::from(spec.sample_rate);
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::io::Cursor;

    fn wav_bytes(channels: u16, sample_rate: u32, frames: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).expect("wav writer");
            for _ in 0..frames * u32::from(channels) {
                writer.write_sample(0i16).expect("write sample");
            }
            writer.finalize().expect("finalize");
        }
        cursor.into_inner()
    }

    #[test]
    fn probe_reports_duration_from_frames() -> anyhow::Result<()> {
        let info = probe_wav_reader(Cursor::new(wav_bytes(2, 16_000, 8_000)))?;
        assert_eq!(info.channels, 2);
        assert_eq!(info.sample_rate, 16_000);
        assert!((info.duration_seconds - 0.5).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn probe_rejects_non_wav_bytes() {
        assert!(probe_wav_reader(Cursor::new(b"not a wav file".to_vec())).is_err());
    }

    #[test]
    fn probe_wav_names_missing_path() {
        let err = probe_wav("/nope/audio.wav").unwrap_err();
        assert!(err.to_string().contains("/nope/audio.wav"));
    }
}
