use std::fs::File;
use std::io::{self, BufReader, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use tartil::transcript::read_segments;
use tartil::{Engine, MATCH_THRESHOLD, NeverCancel, Normalization, Opts, OutputType, load_corpus};

#[derive(Parser, Debug)]
#[command(name = "tartil")]
#[command(about = "Align a recitation transcript to canonical ayat")]
struct Params {
    /// Corpus file: JSON array of verses or Tanzil `surah|ayah|text` lines.
    #[arg(short = 'c', long = "corpus")]
    corpus_path: String,

    /// Transcript JSON (`-` reads stdin).
    #[arg(short = 't', long = "transcript", default_value = "-")]
    transcript_path: String,

    #[arg(
        short = 'o',
        long = "output-type",
        value_enum,
        default_value_t = OutputType::Json
    )]
    output_type: OutputType,

    /// A best score must exceed this to count as a match.
    #[arg(long = "threshold", default_value_t = MATCH_THRESHOLD, value_parser = clap::value_parser!(u8).range(0..=100))]
    threshold: u8,

    #[arg(long = "normalization", value_enum, default_value_t = Normalization::Arabic)]
    normalization: Normalization,

    /// Worker threads (defaults to one per CPU).
    #[arg(long = "threads")]
    threads: Option<usize>,

    /// Accept a corpus that does not contain all 6,236 ayat.
    #[arg(long = "allow-partial-corpus", default_value_t = false)]
    allow_partial_corpus: bool,
}

fn main() -> Result<()> {
    tartil::init_logging();
    let params = Params::parse();

    let corpus = load_corpus(&params.corpus_path)
        .with_context(|| format!("failed to load corpus '{}'", params.corpus_path))?;
    if !params.allow_partial_corpus {
        corpus
            .ensure_canonical()
            .context("corpus is incomplete (pass --allow-partial-corpus to use it anyway)")?;
    }

    let opts = Opts {
        threshold: params.threshold,
        normalization: params.normalization,
        output_type: params.output_type,
        threads: params.threads,
    };
    let engine = Engine::new(Arc::new(corpus), &opts)?;

    let segments = read_segments(open_transcript(&params.transcript_path)?)
        .with_context(|| format!("failed to read transcript '{}'", params.transcript_path))?;

    let stdout = io::stdout();
    engine.align_to_writer(&segments, stdout.lock(), opts.output_type, &NeverCancel)?;
    Ok(())
}

fn open_transcript(path: &str) -> Result<Box<dyn Read>> {
    if path == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("failed to open '{path}'"))?;
    Ok(Box::new(BufReader::new(file)))
}
