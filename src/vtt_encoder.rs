use std::io::Write;

use crate::Result;
use crate::match_encoder::{EncoderState, MatchEncoder};
use crate::matches::Match;

/// Writes matches as a WebVTT caption track over the recitation audio.
///
/// Cues are numbered from 1, span the originating segment, and carry `surah:ayah` followed
/// by the canonical verse text:
///
/// ```text
/// WEBVTT
///
/// 1
/// 00:00:00.000 --> 00:00:03.200
/// 1:1 بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ
/// ```
pub struct VttEncoder<W: Write> {
    w: W,
    state: EncoderState,
}

impl<W: Write> VttEncoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            state: EncoderState::Pending,
        }
    }

    fn write_header(&mut self) -> Result<()> {
        self.w.write_all(b"WEBVTT\n\n")?;
        Ok(())
    }
}

impl<W: Write> MatchEncoder for VttEncoder<W> {
    fn write_match(&mut self, m: &Match) -> Result<()> {
        self.state.check_writable()?;
        if self.state == EncoderState::Pending {
            self.write_header()?;
        }

        let cue = self.state.written() + 1;
        write!(
            self.w,
            "{cue}\n{} --> {}\n{} {}\n\n",
            format_timestamp_vtt(m.start),
            format_timestamp_vtt(m.end),
            m.verse_key(),
            m.ayah_text
        )?;
        self.state = EncoderState::Open(cue);

        self.w.flush()?;
        Ok(())
    }

    /// A track with no cues is still a valid (header-only) file.
    fn close(&mut self) -> Result<()> {
        match self.state {
            EncoderState::Closed => return Ok(()),
            EncoderState::Pending => self.write_header()?,
            EncoderState::Open(_) => {}
        }
        self.w.flush()?;
        self.state = EncoderState::Closed;
        Ok(())
    }
}

/// `HH:MM:SS.mmm`, rounded to the millisecond. Negative input clamps to zero.
fn format_timestamp_vtt(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (h, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (m, rem) = (rem / 60_000, rem % 60_000);
    let (s, ms) = (rem / 1000, rem % 1000);
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}
