use crate::config::ChunkingConfig;
use crate::error::{codes, AppError};

/// Break points in order of preference: paragraph, line, sentence, word.
/// When none fits inside the window the chunk is cut at the size limit.
const SEPARATOR_LEVELS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "? ", "! "], &[" "]];

/// Fixed-size splitter with overlap. Sizes are counted in characters
/// (Unicode scalar values), not tokens.
///
/// Every chunk holds at most `chunk_size` characters and each chunk starts
/// exactly `chunk_overlap` characters before the previous one ended, so
/// dropping the first `chunk_overlap` characters of every chunk after the first
/// and concatenating reproduces the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(AppError::new(
                codes::CONFIG_INVALID,
                "Chunk overlap must be smaller than a non-zero chunk size",
            )
            .with_details(format!(
                "chunk_size={chunk_size}; chunk_overlap={chunk_overlap}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(cfg: &ChunkingConfig) -> Result<Self, AppError> {
        Self::new(cfg.chunk_size, cfg.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // bounds[i] is the byte offset of char i; the last entry is text.len().
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = bounds.len() - 1;

        let mut out = Vec::new();
        let mut start = 0usize;
        loop {
            let hard_end = (start + self.chunk_size).min(total);
            if hard_end == total {
                out.push(text[bounds[start]..].to_string());
                break;
            }

            // Only snap inside the tail of the window, and always past the
            // overlap so the next start moves forward.
            let floor = start + (self.chunk_overlap + 1).max(self.chunk_size / 2);
            let end = snap_end(text, &bounds, start, floor, hard_end).unwrap_or(hard_end);

            out.push(text[bounds[start]..bounds[end]].to_string());
            start = end - self.chunk_overlap;
        }

        out
    }
}

/// Char index just past the best separator ending in `floor..=hard_end`.
fn snap_end(
    text: &str,
    bounds: &[usize],
    start: usize,
    floor: usize,
    hard_end: usize,
) -> Option<usize> {
    let base = bounds[start];
    let window = &text[base..bounds[hard_end]];

    for level in SEPARATOR_LEVELS {
        let best = level
            .iter()
            .filter_map(|sep| window.rfind(sep).map(|pos| base + pos + sep.len()))
            .filter_map(|end_byte| bounds.binary_search(&end_byte).ok())
            .filter(|end| *end >= floor)
            .max();
        if best.is_some() {
            return best;
        }
    }
    None
}

/// One-shot helper for callers that do not keep a [`Chunker`] around.
pub fn chunk(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<String>, AppError> {
    Ok(Chunker::new(chunk_size, chunk_overlap)?.split(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, c) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(c);
            } else {
                out.extend(c.chars().skip(overlap));
            }
        }
        out
    }

    fn prose(words: usize) -> String {
        (0..words)
            .map(|i| {
                if i % 17 == 16 {
                    format!("sentence{i}.")
                } else {
                    format!("word{i}")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk("Employment Pass overview", 1000, 200).unwrap();
        assert_eq!(chunks, vec!["Employment Pass overview".to_string()]);
    }

    #[test]
    fn blank_text_yields_no_chunks() {
        assert!(chunk("", 1000, 200).unwrap().is_empty());
        assert!(chunk("  \n ", 1000, 200).unwrap().is_empty());
    }

    #[test]
    fn separator_free_text_follows_the_window_formula() {
        for len in [1000usize, 1001, 1800, 2600, 5123] {
            let text = "x".repeat(len);
            let chunks = chunk(&text, 1000, 200).unwrap();
            let expected = (len - 200 + 799) / 800;
            assert_eq!(chunks.len(), expected, "len={len}");
            assert!(chunks.iter().all(|c| char_len(c) <= 1000));
        }
    }

    #[test]
    fn prose_respects_cap_overlap_and_reconstructs() {
        let text = prose(900);
        assert!(char_len(&text) > 1000);
        let chunks = chunk(&text, 1000, 200).unwrap();
        assert!(chunks.len() > 1);

        for c in &chunks {
            assert!(char_len(c) <= 1000);
        }
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(char_len(&pair[0]) - 200).collect();
            let head: String = pair[1].chars().take(200).collect();
            assert_eq!(tail, head);
        }
        // Only the final chunk may fall short of the snapping floor.
        for c in &chunks[..chunks.len() - 1] {
            assert!(char_len(c) >= 500);
        }
        assert_eq!(reconstruct(&chunks, 200), text);
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a".repeat(700), "b".repeat(700));
        let chunks = chunk(&text, 1000, 200).unwrap();
        assert_eq!(chunks[0], format!("{}\n\n", "a".repeat(700)));
        assert_eq!(reconstruct(&chunks, 200), text);
    }

    #[test]
    fn prefers_sentence_over_word_breaks() {
        let first = format!("{} end.", "word ".repeat(120));
        let text = format!("{first} {}", "tail ".repeat(200));
        let chunks = chunk(&text, 1000, 200).unwrap();
        assert!(chunks[0].ends_with("end. "), "got {:?}", &chunks[0]);
    }

    #[test]
    fn ignores_separators_too_early_in_the_window() {
        let text = format!("ab\n\n{}", "c".repeat(1500));
        let chunks = chunk(&text, 1000, 200).unwrap();
        assert_eq!(char_len(&chunks[0]), 1000);
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "é".repeat(2500);
        let chunks = chunk(&text, 1000, 200).unwrap();
        assert!(chunks.iter().all(|c| char_len(c) <= 1000));
        assert_eq!(reconstruct(&chunks, 200), text);
    }

    #[test]
    fn split_is_deterministic() {
        let text = prose(700);
        let chunker = Chunker::new(300, 50).unwrap();
        assert_eq!(chunker.split(&text), chunker.split(&text));
    }

    #[test]
    fn rejects_overlap_not_below_size() {
        assert_eq!(Chunker::new(100, 100).unwrap_err().code, codes::CONFIG_INVALID);
        assert!(Chunker::new(0, 0).is_err());
    }
}
