//! Bounded string similarity for noisy transcript fragments.
//!
//! The built-in scorer is a *partial ratio*: the shorter string is treated as the needle and
//! compared against same-length windows of the longer string, so a clean rendering of part of
//! a verse still scores 100. Window similarity is the SequenceMatcher ratio `2*M / T`, where
//! `M` counts characters in matching blocks and `T` is the combined length.
//!
//! Matching blocks follow the longest-common-substring recursion: find the leftmost longest
//! common run, then recurse on the pieces to its left and right. No "popular element" junk
//! heuristic is applied, so long verses are scored on every character.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::normalize::{Normalization, normalize};

/// Best possible score.
pub const MAX_SCORE: u8 = 100;

/// A similarity function between a transcript fragment and a candidate verse.
///
/// Implementations must be deterministic and free of shared mutable state: the engine calls
/// `score_prepared` concurrently from many threads and in no particular order.
pub trait Scorer: Send + Sync {
    /// Reduce text to the form that is actually compared.
    ///
    /// The engine prepares every corpus verse once up front and each fragment once per
    /// segment, so the same reduction always applies to both sides.
    fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(text)
    }

    /// Score two already-prepared strings. Must return a value in `0..=100`.
    fn score_prepared(&self, fragment: &str, reference: &str) -> u8;

    /// Prepare both sides and score them.
    fn score(&self, fragment: &str, reference: &str) -> u8 {
        self.score_prepared(&self.prepare(fragment), &self.prepare(reference))
    }
}

/// Partial-ratio scoring over normalized text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialRatio {
    pub normalization: Normalization,
}

impl PartialRatio {
    pub fn new(normalization: Normalization) -> Self {
        Self { normalization }
    }
}

impl Scorer for PartialRatio {
    fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self.normalization {
            Normalization::None => Cow::Borrowed(text),
            policy => Cow::Owned(normalize(text, policy)),
        }
    }

    fn score_prepared(&self, fragment: &str, reference: &str) -> u8 {
        partial_ratio(fragment, reference)
    }
}

/// Best-window similarity of the shorter string inside the longer one, scaled to `0..=100`.
///
/// Returns 0 when either side is empty. Argument order only matters when both strings have
/// the same length, in which case the first is the needle.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut best = 0.0_f64;
    for block in matching_blocks(shorter, longer) {
        let start = block.b.saturating_sub(block.a);
        let end = (start + shorter.len()).min(longer.len());
        let r = sequence_ratio(shorter, &longer[start..end]);
        if r > 0.995 {
            return MAX_SCORE;
        }
        best = best.max(r);
    }

    to_score(best)
}

/// Whole-string SequenceMatcher similarity scaled to `0..=100`.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    to_score(sequence_ratio(&a, &b))
}

fn to_score(r: f64) -> u8 {
    (r * f64::from(MAX_SCORE)).round_ties_even().clamp(0.0, 100.0) as u8
}

fn sequence_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched: usize = matching_blocks(a, b).iter().map(|m| m.size).sum();
    2.0 * matched as f64 / total as f64
}

/// A run where `a[a..a + size] == b[b..b + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a: usize,
    b: usize,
    size: usize,
}

/// Non-overlapping matching blocks in ascending order, adjacent runs merged, terminated by a
/// zero-size sentinel at `(a.len(), b.len())`.
fn matching_blocks(a: &[char], b: &[char]) -> Vec<Block> {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
        b2j.entry(c).or_default().push(j);
    }

    let mut found = Vec::new();
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let m = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if m.size == 0 {
            continue;
        }
        if alo < m.a && blo < m.b {
            queue.push((alo, m.a, blo, m.b));
        }
        if m.a + m.size < ahi && m.b + m.size < bhi {
            queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
        }
        found.push(m);
    }
    found.sort_by_key(|m| (m.a, m.b));

    let mut merged: Vec<Block> = Vec::with_capacity(found.len() + 1);
    for m in found {
        match merged.last_mut() {
            Some(prev) if prev.a + prev.size == m.a && prev.b + prev.size == m.b => {
                prev.size += m.size;
            }
            _ => merged.push(m),
        }
    }
    merged.push(Block {
        a: a.len(),
        b: b.len(),
        size: 0,
    });
    merged
}

/// Leftmost longest common run of `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties prefer the smallest `a` index, then the smallest `b` index.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> Block {
    let mut best = Block {
        a: alo,
        b: blo,
        size: 0,
    };

    // j2len[j] = length of the run ending at a[i - 1], b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| j2len.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next.insert(j, k);
                if k > best.size {
                    best = Block {
                        a: i + 1 - k,
                        b: j + 1 - k,
                        size: k,
                    };
                }
            }
        }
        j2len = next;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fragment_scores_zero() {
        assert_eq!(partial_ratio("", "بسم الله"), 0);
        assert_eq!(partial_ratio("بسم الله", ""), 0);
        assert_eq!(partial_ratio("", ""), 0);
        assert_eq!(ratio("", "x"), 0);
    }

    #[test]
    fn identical_strings_score_one_hundred() {
        let text = "بسم الله الرحمن الرحيم";
        assert_eq!(partial_ratio(text, text), 100);
        assert_eq!(ratio(text, text), 100);
    }

    #[test]
    fn clean_substring_scores_one_hundred() {
        assert_eq!(partial_ratio("الرحمن الرحيم", "بسم الله الرحمن الرحيم"), 100);
        assert_eq!(partial_ratio("this is a test", "this is a test!"), 100);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(partial_ratio("abc", "xyz"), 0);
    }

    #[test]
    fn known_partial_scores() {
        // One substituted character in a ten-character needle.
        assert_eq!(partial_ratio("abcdefghij", "xxabcdeXghijxx"), 90);
        assert_eq!(ratio("abcd", "abce"), 75);
    }

    #[test]
    fn needle_is_the_shorter_string_regardless_of_order() {
        let long = "الحمد لله رب العالمين";
        let short = "لله رب";
        assert_eq!(partial_ratio(short, long), partial_ratio(long, short));
        assert_eq!(partial_ratio("abcxe", "zzabcdezz"), partial_ratio("zzabcdezz", "abcxe"));
    }

    #[test]
    fn scores_are_bounded_and_deterministic() {
        let samples = ["", "a", "قل هو", "abc abc abc", "بسم الله الرحمن الرحيم", "zz"];
        for a in samples {
            for b in samples {
                let first = partial_ratio(a, b);
                assert!(first <= 100);
                assert_eq!(first, partial_ratio(a, b));
            }
        }
    }

    #[test]
    fn matching_blocks_end_with_sentinel_and_merge_runs() {
        let a: Vec<char> = "abxcd".chars().collect();
        let b: Vec<char> = "abcd".chars().collect();
        let blocks = matching_blocks(&a, &b);
        assert_eq!(
            blocks,
            vec![
                Block { a: 0, b: 0, size: 2 },
                Block { a: 3, b: 2, size: 2 },
                Block { a: 5, b: 4, size: 0 },
            ]
        );
    }

    #[test]
    fn partial_ratio_scorer_normalizes_both_sides() {
        let scorer = PartialRatio::new(Normalization::Arabic);
        let uthmani = "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ";
        assert_eq!(scorer.score("بسم الله الرحمن الرحيم", uthmani), 100);

        let verbatim = PartialRatio::new(Normalization::None);
        assert!(verbatim.score("بسم الله الرحمن الرحيم", uthmani) < 100);
    }

    #[test]
    fn punctuation_only_fragment_scores_zero_after_normalization() {
        let scorer = PartialRatio::default();
        assert_eq!(scorer.score("...،؟", "قل هو الله احد"), 0);
    }
}
