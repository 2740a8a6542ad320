use crate::matches::Match;
use crate::{Error, Result};

/// A sink that serializes matches into some output format.
///
/// Encoders are stateful: `close` finalizes the output and is idempotent, and writing after
/// `close` is an error.
pub trait MatchEncoder {
    fn write_match(&mut self, m: &Match) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// Lifecycle shared by the streaming encoders.
///
/// Output formats with a preamble (`[`, `WEBVTT`) emit it lazily on the transition out of
/// `Pending`, so nothing reaches the writer before there is something to say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EncoderState {
    #[default]
    Pending,
    /// Preamble written; holds the number of matches written so far.
    Open(usize),
    Closed,
}

impl EncoderState {
    /// Error out if the encoder was already closed.
    pub(crate) fn check_writable(self) -> Result<()> {
        match self {
            EncoderState::Closed => Err(Error::msg(
                "cannot write match: encoder is already closed",
            )),
            _ => Ok(()),
        }
    }

    /// Matches written so far.
    pub(crate) fn written(self) -> usize {
        match self {
            EncoderState::Open(n) => n,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_state_rejects_writes() {
        assert!(EncoderState::Pending.check_writable().is_ok());
        assert!(EncoderState::Open(3).check_writable().is_ok());
        assert!(EncoderState::Closed.check_writable().is_err());
        assert_eq!(EncoderState::Open(3).written(), 3);
        assert_eq!(EncoderState::Pending.written(), 0);
    }
}
