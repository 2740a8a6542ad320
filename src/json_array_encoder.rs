use std::io::Write;

use crate::Result;
use crate::match_encoder::{EncoderState, MatchEncoder};
use crate::matches::Match;

/// Streams matches as one JSON array, one element per line.
///
/// ```json
/// [
/// {"start":0.0,"end":3.2,"surah":1,"ayah":1,"ayah_text":"...","score":100}
/// ]
/// ```
///
/// When nothing matched, `close` still produces `[]`.
pub struct JsonArrayEncoder<W: Write> {
    w: W,
    state: EncoderState,
}

impl<W: Write> JsonArrayEncoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            state: EncoderState::Pending,
        }
    }
}

impl<W: Write> MatchEncoder for JsonArrayEncoder<W> {
    fn write_match(&mut self, m: &Match) -> Result<()> {
        self.state.check_writable()?;

        let written = self.state.written();
        let sep: &[u8] = match self.state {
            EncoderState::Pending => b"[\n",
            _ => b",\n",
        };
        self.w.write_all(sep)?;
        serde_json::to_writer(&mut self.w, m)?;
        self.state = EncoderState::Open(written + 1);

        self.w.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let tail: &[u8] = match self.state {
            EncoderState::Closed => return Ok(()),
            EncoderState::Pending => b"[]\n",
            EncoderState::Open(_) => b"\n]\n",
        };
        self.w.write_all(tail)?;
        self.w.flush()?;
        self.state = EncoderState::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(surah: usize, ayah: usize, text: &str) -> Match {
        Match {
            start: 0.0,
            end: 1.0,
            surah,
            ayah,
            ayah_text: text.to_string(),
            score: 100,
        }
    }

    #[test]
    fn empty_output_is_an_empty_array() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = JsonArrayEncoder::new(&mut out);
        enc.close()?;

        let v: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(v, serde_json::json!([]));
        Ok(())
    }

    #[test]
    fn matches_become_array_elements_in_order() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = JsonArrayEncoder::new(&mut out);
        enc.write_match(&m(1, 1, "بسم الله الرحمن الرحيم"))?;
        enc.write_match(&m(112, 1, "قل هو الله احد"))?;
        enc.close()?;

        let text = std::str::from_utf8(&out)?;
        assert_eq!(text.lines().count(), 4);

        let v: serde_json::Value = serde_json::from_str(text)?;
        let arr = v.as_array().expect("array");
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["ayah_text"], "بسم الله الرحمن الرحيم");
        assert_eq!(arr[1]["surah"], 112);
        Ok(())
    }

    #[test]
    fn close_twice_writes_the_tail_once() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = JsonArrayEncoder::new(&mut out);
        enc.write_match(&m(1, 2, "الحمد لله"))?;
        enc.close()?;
        enc.close()?;

        assert_eq!(std::str::from_utf8(&out)?.matches(']').count(), 1);
        Ok(())
    }

    #[test]
    fn write_after_close_errors() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = JsonArrayEncoder::new(&mut out);
        enc.close()?;
        let err = enc.write_match(&m(1, 1, "nope")).unwrap_err();
        assert!(err.to_string().contains("already closed"));
        Ok(())
    }
}
