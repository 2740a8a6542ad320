use std::fs::File;
use std::sync::Arc;

use tartil::transcript::read_segments;
use tartil::{Engine, Error, NeverCancel, Opts, OutputType, Segment, load_corpus};

const CORPUS: &str = "tests/fixtures/corpus.txt";
const TRANSCRIPT: &str = "tests/fixtures/transcript.json";

fn engine() -> anyhow::Result<Engine> {
    let corpus = load_corpus(CORPUS)?;
    let opts = Opts {
        threads: Some(2),
        ..Opts::default()
    };
    Ok(Engine::new(Arc::new(corpus), &opts)?)
}

#[test]
fn fixture_corpus_is_partial() -> anyhow::Result<()> {
    let corpus = load_corpus(CORPUS)?;
    assert_eq!(corpus.len(), 17);
    assert_eq!(corpus.verse_count(1)?, 7);
    assert_eq!(corpus.verse_count(2)?, 0);
    assert!(!corpus.is_canonical());

    let err = corpus.ensure_canonical().unwrap_err();
    assert!(matches!(err, Error::InvalidCorpus(_)));
    assert!(err.to_string().contains("surah 2 has 0 ayat"));
    Ok(())
}

#[test]
fn aligns_whisper_transcript_in_order() -> anyhow::Result<()> {
    let engine = engine()?;
    let segments = read_segments(File::open(TRANSCRIPT)?)?;

    // The entry without text is dropped at ingest.
    assert_eq!(segments.len(), 8);

    let matches = engine.align_all(&segments, &NeverCancel)?;
    let keys: Vec<String> = matches.iter().map(|m| m.verse_key()).collect();

    // "موسيقى" (music) scores below the threshold and is omitted.
    assert_eq!(
        keys,
        vec!["1:1", "1:2", "1:4", "1:5", "1:6", "114:1", "114:2"]
    );
    assert!(matches.iter().all(|m| m.score == 100));

    assert_eq!(matches[2].start, 11.0);
    assert_eq!(matches[2].end, 14.5);
    assert_eq!(matches[2].ayah_text, "مَالِكِ يَوْمِ الدِّينِ");
    Ok(())
}

#[test]
fn tied_verses_resolve_to_the_earliest() -> anyhow::Result<()> {
    let engine = engine()?;

    // Contained in both 1:1 and 1:3.
    let m = engine
        .align(&Segment::new(0.0, 2.0, "الرحمن الرحيم"), &NeverCancel)?
        .expect("match");
    assert_eq!((m.surah, m.ayah), (1, 1));

    // Contained in most of An-Nas; 114:1 comes first.
    let m = engine
        .align(&Segment::new(0.0, 1.0, "الناس"), &NeverCancel)?
        .expect("match");
    assert_eq!((m.surah, m.ayah), (114, 1));
    Ok(())
}

#[test]
fn folded_spelling_matches_hamza_forms() -> anyhow::Result<()> {
    let engine = engine()?;
    let m = engine
        .align(&Segment::new(0.0, 2.0, "قل هو الله احد"), &NeverCancel)?
        .expect("match");
    assert_eq!(m.verse_key(), "112:1");
    assert_eq!(m.score, 100);
    Ok(())
}

#[test]
fn writes_vtt_captions() -> anyhow::Result<()> {
    let engine = engine()?;
    let segments = vec![
        Segment::new(0.0, 4.2, "بسم الله الرحمن الرحيم"),
        Segment::new(4.2, 5.0, "موسيقى"),
        Segment::new(5.0, 7.5, "من الجنة والناس"),
    ];

    let mut out = Vec::new();
    let written = engine.align_to_writer(&segments, &mut out, OutputType::Vtt, &NeverCancel)?;
    assert_eq!(written, 2);

    let vtt = String::from_utf8(out)?;
    assert!(vtt.starts_with("WEBVTT\n\n"));
    assert!(vtt.contains("1\n00:00:00.000 --> 00:00:04.200\n1:1 "));
    assert!(vtt.contains("2\n00:00:05.000 --> 00:00:07.500\n114:6 "));
    assert!(!vtt.contains("00:00:04.200 --> 00:00:05.000"));
    Ok(())
}

#[test]
fn writes_json_array() -> anyhow::Result<()> {
    let engine = engine()?;
    let segments = read_segments(File::open(TRANSCRIPT)?)?;

    let mut out = Vec::new();
    engine.align_to_writer(&segments, &mut out, OutputType::Json, &NeverCancel)?;

    let value: serde_json::Value = serde_json::from_slice(&out)?;
    let arr = value.as_array().expect("array");
    assert_eq!(arr.len(), 7);
    assert_eq!(arr[0]["surah"], 1);
    assert_eq!(arr[0]["ayah"], 1);
    assert_eq!(arr[6]["surah"], 114);
    assert_eq!(arr[6]["ayah"], 2);
    Ok(())
}

#[test]
fn empty_transcript_is_rejected() -> anyhow::Result<()> {
    let engine = engine()?;
    let segments = tartil::transcript::parse_segments("[]")?;
    let err = engine.align_all(&segments, &NeverCancel).unwrap_err();
    assert!(matches!(err, Error::PreconditionFailed(_)));
    Ok(())
}
