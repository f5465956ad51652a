//! Recursive character splitting tuned for markdown documents.
//!
//! The text is cut at the coarsest separator present (headings first, single
//! characters last). Each separator stays attached to the start of the piece
//! that follows it. Pieces are then merged greedily into chunks of at most
//! `chunk_size` characters, and each chunk repeats up to `chunk_overlap`
//! characters of trailing pieces from the previous one.

use regex::Regex;
use tracing::warn;

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Markdown separators, coarsest first. The empty pattern splits into characters.
const MARKDOWN_SEPARATORS: &[&str] = &[
    r"\n#{1,6} ",
    r"```\n",
    r"\n\*\*\*+\n",
    r"\n---+\n",
    r"\n___+\n",
    r"\n\n",
    r"\n",
    r" ",
    "",
];

#[derive(Debug, Clone)]
pub struct MarkdownTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<Separator>,
}

#[derive(Debug, Clone)]
enum Separator {
    Pattern(Regex),
    Characters,
}

impl Separator {
    fn is_present(&self, text: &str) -> bool {
        match self {
            Separator::Pattern(re) => re.is_match(text),
            Separator::Characters => true,
        }
    }

    /// Splits `text`, keeping each match at the start of the following piece.
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            Separator::Characters => text
                .char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect(),
            Separator::Pattern(re) => {
                let mut pieces = Vec::new();
                let mut start = 0;
                for m in re.find_iter(text) {
                    if m.start() > start {
                        pieces.push(&text[start..m.start()]);
                    }
                    start = m.start();
                }
                if start < text.len() {
                    pieces.push(&text[start..]);
                }
                pieces
            }
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl Default for MarkdownTextSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl MarkdownTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let separators = MARKDOWN_SEPARATORS
            .iter()
            .map(|pattern| {
                if pattern.is_empty() {
                    Separator::Characters
                } else {
                    // The patterns are constants; a failure here is a programming error.
                    Separator::Pattern(Regex::new(pattern).expect("valid separator regex"))
                }
            })
            .collect();
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size),
            separators,
        }
    }

    /// Splits `text` into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[Separator]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|s| s.is_present(text))
            .unwrap_or(separators.len().saturating_sub(1));
        let Some(separator) = separators.get(position) else {
            return Vec::new();
        };
        let finer = &separators[position + 1..];

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in separator.split(text) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                if let Some(chunk) = trimmed(piece) {
                    chunks.push(chunk);
                }
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }
        chunks
    }

    /// Greedily joins pieces into chunks, carrying the overlap forward.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {total}, which is longer than the specified {}",
                        self.chunk_size
                    );
                }
                if !current.is_empty() {
                    if let Some(chunk) = trimmed(&current.concat()) {
                        chunks.push(chunk);
                    }
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        let dropped = current.remove(0);
                        total -= char_len(dropped);
                    }
                }
            }
            current.push(piece);
            total += len;
        }

        if let Some(chunk) = trimmed(&current.concat()) {
            chunks.push(chunk);
        }
        chunks
    }
}

fn trimmed(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = MarkdownTextSplitter::default();
        let chunks = splitter.split_text("  # Title\n\nSome body text.  ");
        assert_eq!(chunks, vec!["# Title\n\nSome body text."]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let splitter = MarkdownTextSplitter::default();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n ").is_empty());
    }

    #[test]
    fn test_headings_start_chunks() {
        let splitter = MarkdownTextSplitter::new(30, 0);
        let text = "intro line\n## First\nalpha beta gamma\n## Second\ndelta epsilon";
        let chunks = splitter.split_text(text);
        assert_eq!(
            chunks,
            vec![
                "intro line",
                "## First\nalpha beta gamma",
                "## Second\ndelta epsilon",
            ]
        );
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = MarkdownTextSplitter::new(50, 10);
        let paragraph = "lorem ipsum dolor sit amet consectetur adipiscing elit ".repeat(8);
        let text = format!("# Heading\n{paragraph}\n\n{paragraph}");
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 4);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 50, "chunk too long: {chunk:?}");
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn test_overlap_repeats_trailing_words() {
        let splitter = MarkdownTextSplitter::new(20, 10);
        let chunks = splitter.split_text("one two three four five six seven eight");
        assert!(chunks.len() >= 2);
        // The last word of a chunk reappears at the start of the next one.
        let first_tail = chunks[0].split_whitespace().last().unwrap();
        assert!(chunks[1].starts_with(first_tail));
    }

    #[test]
    fn test_unbreakable_word_falls_back_to_characters() {
        let splitter = MarkdownTextSplitter::new(4, 0);
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_separator_kept_at_start() {
        let separator = Separator::Pattern(Regex::new(r"\n\n").unwrap());
        assert_eq!(separator.split("a\n\nb\n\nc"), vec!["a", "\n\nb", "\n\nc"]);
        assert_eq!(separator.split("\n\nb"), vec!["\n\nb"]);
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let splitter = MarkdownTextSplitter::new(6, 0);
        let chunks = splitter.split_text("ééééé ààààà");
        assert_eq!(chunks, vec!["ééééé", "ààààà"]);
    }
}
