//! Recursive character text splitter.
//!
//! Tries separators in order (`"\n\n"`, `"\n"`, `" "`, `""`): the text is split
//! on the first separator it contains, pieces that still exceed the chunk size
//! are split again with the remaining separators, and small pieces are merged
//! back up to the chunk size. Separators stay attached to the start of the
//! following piece. Length is measured by a [`LengthFunction`].

use std::collections::VecDeque;
use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::document::Document;

use super::IngestError;

pub const DEFAULT_CHUNK_SIZE: usize = 250;
pub const DEFAULT_CHUNK_OVERLAP: usize = 0;
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// How chunk length is measured.
#[derive(Clone)]
pub enum LengthFunction {
    Chars,
    /// BPE token count.
    Tokens(Arc<CoreBPE>),
}

impl LengthFunction {
    /// `cl100k_base` token counter.
    pub fn cl100k() -> Result<Self, IngestError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| IngestError::Splitter(e.to_string()))?;
        Ok(Self::Tokens(Arc::new(bpe)))
    }

    pub fn len(&self, text: &str) -> usize {
        match self {
            LengthFunction::Chars => text.chars().count(),
            LengthFunction::Tokens(bpe) => bpe.encode_with_special_tokens(text).len(),
        }
    }
}

impl std::fmt::Debug for LengthFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthFunction::Chars => f.write_str("Chars"),
            LengthFunction::Tokens(_) => f.write_str("Tokens"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecursiveCharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    length: LengthFunction,
}

impl RecursiveCharacterTextSplitter {
    pub fn new(
        chunk_size: usize,
        chunk_overlap: usize,
        length: LengthFunction,
    ) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::Splitter("chunk size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(IngestError::Splitter(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            length,
        })
    }

    /// Splitter measuring chunks in `cl100k_base` tokens.
    pub fn from_tiktoken(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        Self::new(chunk_size, chunk_overlap, LengthFunction::cl100k()?)
    }

    pub fn with_separators<I, T>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Splits each document; chunks keep their document's metadata.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.page_content)
                    .into_iter()
                    .map(move |chunk| Document {
                        page_content: chunk,
                        metadata: doc.metadata.clone(),
                    })
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, s) in separators.iter().enumerate() {
            if s.is_empty() {
                separator = "";
                break;
            }
            if text.contains(s.as_str()) {
                separator = s;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if self.length.len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    /// Greedily joins pieces up to the chunk size, keeping `chunk_overlap` of
    /// trailing context between consecutive chunks.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;
        for piece in pieces {
            let len = self.length.len(piece);
            if total + len > self.chunk_size && !current.is_empty() {
                push_trimmed(&mut out, &current);
                while total > self.chunk_overlap
                    || (total + len > self.chunk_size && total > 0)
                {
                    match current.pop_front() {
                        Some((_, l)) => total -= l,
                        None => break,
                    }
                }
            }
            current.push_back((piece.as_str(), len));
            total += len;
        }
        push_trimmed(&mut out, &current);
        out
    }
}

fn push_trimmed(out: &mut Vec<String>, current: &VecDeque<(&str, usize)>) {
    let joined: String = current.iter().map(|(s, _)| *s).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Splits on `separator`, prefixing every piece after the first with it. Empty
/// pieces are dropped; an empty separator splits into characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut pieces = Vec::new();
    for (i, part) in text.split(separator).enumerate() {
        let piece = if i == 0 {
            part.to_string()
        } else {
            format!("{}{}", separator, part)
        };
        if !piece.is_empty() {
            pieces.push(piece);
        }
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(size: usize, overlap: usize) -> RecursiveCharacterTextSplitter {
        RecursiveCharacterTextSplitter::new(size, overlap, LengthFunction::Chars).unwrap()
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chars(100, 0).split_text("  hello world  "), vec!["hello world"]);
        assert!(chars(100, 0).split_text("").is_empty());
    }

    /// **Scenario**: Paragraphs that fit together are merged; a paragraph break starts a new chunk once full.
    #[test]
    fn splits_on_paragraphs_first() {
        let text = "aaaa bbbb\n\ncccc dddd\n\neeee";
        let chunks = chars(12, 0).split_text(text);
        assert_eq!(chunks, vec!["aaaa bbbb", "cccc dddd", "eeee"]);
    }

    #[test]
    fn long_words_fall_through_to_characters() {
        let chunks = chars(4, 0).split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    /// **Scenario**: Trailing pieces up to the overlap carry into the next chunk; longer ones do not.
    #[test]
    fn overlap_repeats_trailing_pieces() {
        let chunks = chars(10, 4).split_text("one two three four");
        assert_eq!(chunks, vec!["one two", "two three", "four"]);
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        assert!(RecursiveCharacterTextSplitter::new(0, 0, LengthFunction::Chars).is_err());
        assert!(RecursiveCharacterTextSplitter::new(5, 5, LengthFunction::Chars).is_err());
    }

    #[test]
    fn documents_keep_metadata() {
        let doc = Document::new("alpha beta gamma").with_source("notes.md");
        let chunks = chars(6, 0).split_documents(&[doc]);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.source() == Some("notes.md")));
    }

    #[test]
    fn token_length_counts_bpe_tokens() {
        let len = LengthFunction::cl100k().unwrap();
        assert_eq!(len.len("hello world"), 2);
        let splitter = RecursiveCharacterTextSplitter::from_tiktoken(250, 0).unwrap();
        assert_eq!(splitter.split_text("hello world"), vec!["hello world"]);
    }
}
