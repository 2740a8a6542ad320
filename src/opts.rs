use crate::aligner::MATCH_THRESHOLD;
use crate::normalize::Normalization;
use crate::output_type::OutputType;

/// Options that control how an alignment is performed.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The binaries are responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - other frontends (APIs, tests, batch jobs) can construct options programmatically
#[derive(Debug, Clone)]
pub struct Opts {
    /// A segment's best score must be strictly greater than this to produce a match.
    ///
    /// Defaults to [`MATCH_THRESHOLD`].
    pub threshold: u8,

    /// Normalization applied to both the fragment and every candidate verse.
    pub normalization: Normalization,

    /// The desired output format when matches are written to a stream.
    pub output_type: OutputType,

    /// Worker threads for aligning segments in parallel.
    ///
    /// When `None`, we use one thread per logical CPU.
    pub threads: Option<usize>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
            normalization: Normalization::default(),
            output_type: OutputType::default(),
            threads: None,
        }
    }
}

impl Opts {
    /// Resolve the worker thread count.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_named_threshold_and_arabic_normalization() {
        let opts = Opts::default();
        assert_eq!(opts.threshold, 85);
        assert_eq!(opts.normalization, Normalization::Arabic);
        assert!(matches!(opts.output_type, OutputType::Json));
        assert!(opts.thread_count() >= 1);
    }

    #[test]
    fn zero_threads_is_clamped_to_one() {
        let opts = Opts {
            threads: Some(0),
            ..Opts::default()
        };
        assert_eq!(opts.thread_count(), 1);
    }
}
