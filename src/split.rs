//! Segment splitter — greedy hierarchical boundary search.
//!
//! The synthesis engine accepts at most a fixed number of characters per
//! call. Longer utterances are partitioned at natural boundaries, trying the
//! coarsest level first: sentences, then clauses, then single words. A word
//! that is itself longer than the limit cannot be subdivided any further and
//! fails the whole request with [`TtsError::UnsplittableUnit`].
//!
//! Delimiters are consumed while splitting and re-inserted in normalized
//! form (delimiter plus a single space), so the output does not round-trip
//! byte-for-byte with the input; the word sequence is preserved exactly.

use tracing::debug;

use crate::error::{Result, TtsError};

// ─────────────────────────────────────────────────────────────────────────────
// Boundary levels
// ─────────────────────────────────────────────────────────────────────────────

/// Boundary levels in priority order. Each level knows how to cut the text
/// and which joiner to use when pieces are re-accumulated into a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Sentence,
    Clause,
    Word,
}

impl Boundary {
    fn pieces<'a>(self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self {
            Boundary::Sentence => Box::new(text.split('.')),
            Boundary::Clause => Box::new(text.split(',')),
            Boundary::Word => Box::new(text.split_whitespace()),
        }
    }

    fn joiner(self) -> &'static str {
        match self {
            Boundary::Sentence => ". ",
            Boundary::Clause => ", ",
            Boundary::Word => " ",
        }
    }

    /// The next finer level, or `None` at word level.
    fn finer(self) -> Option<Boundary> {
        match self {
            Boundary::Sentence => Some(Boundary::Clause),
            Boundary::Clause => Some(Boundary::Word),
            Boundary::Word => None,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Boundary::Sentence => "sentences",
            Boundary::Clause => "clauses",
            Boundary::Word => "words",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Greedy accumulator
// ─────────────────────────────────────────────────────────────────────────────

/// Accumulator shared by all boundary levels: pieces are joined onto the
/// pending segment until the next piece would overflow the limit. Lengths
/// are counted in Unicode scalar values, matching the engine's limit.
struct Accumulator {
    segments: Vec<String>,
    current: String,
    current_len: usize,
    limit: usize,
}

impl Accumulator {
    fn new(limit: usize) -> Self {
        Self { segments: Vec::new(), current: String::new(), current_len: 0, limit }
    }

    /// Length of the pending segment if `piece` were joined at `level`.
    fn joined_len(&self, piece_len: usize, level: Boundary) -> usize {
        if self.current.is_empty() {
            piece_len
        } else {
            self.current_len + level.joiner().len() + piece_len
        }
    }

    fn append(&mut self, piece: &str, piece_len: usize, level: Boundary) {
        if !self.current.is_empty() {
            self.current.push_str(level.joiner());
            self.current_len += level.joiner().len();
        }
        self.current.push_str(piece);
        self.current_len += piece_len;
    }

    /// Emit the pending segment, if any.
    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.segments.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }
}

fn fill(acc: &mut Accumulator, text: &str, level: Boundary) -> Result<()> {
    for piece in level.pieces(text) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let piece_len = piece.chars().count();

        if acc.joined_len(piece_len, level) <= acc.limit {
            acc.append(piece, piece_len, level);
        } else if piece_len > acc.limit {
            match level.finer() {
                Some(finer) => {
                    debug!(
                        "Piece of {piece_len} characters exceeds the limit, splitting by {}",
                        finer.describe()
                    );
                    fill(acc, piece, finer)?;
                }
                None => {
                    return Err(TtsError::UnsplittableUnit {
                        word: piece.to_string(),
                        len: piece_len,
                        limit: acc.limit,
                    });
                }
            }
        } else {
            acc.flush();
            acc.append(piece, piece_len, level);
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Split `text` into segments of at most `limit` characters, preferring
/// sentence boundaries, then clauses, then words.
///
/// Empty input (or input containing only delimiters) produces zero segments;
/// callers reject empty text before rendering. A single word longer than
/// `limit` fails with [`TtsError::UnsplittableUnit`].
pub fn split(text: &str, limit: usize) -> Result<Vec<String>> {
    let mut acc = Accumulator::new(limit);
    fill(&mut acc, text, Boundary::Sentence)?;
    acc.flush();
    Ok(acc.segments)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
