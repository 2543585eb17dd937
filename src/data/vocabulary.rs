// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Maps words to dictionary indices. Index 0 is reserved for
// words the vocabulary has never seen, so every token of
// every sentence gets a valid column of the embedding matrix.
//
// A vocabulary serializes as its word list in index order, so
// saving it next to a model pins the column of every word.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const UNKNOWN_WORD: &str = "*UNKNOWN*";
pub const UNKNOWN_INDEX: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let mut vocab = Self { words: Vec::new(), index: HashMap::new() };
        vocab.insert(UNKNOWN_WORD);
        vocab
    }
}

impl Vocabulary {
    /// Vocabulary from a fixed word list, in the given order after the
    /// unknown-word entry. Duplicates keep their first position.
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vocab = Self::default();
        for w in words {
            vocab.insert(w);
        }
        vocab
    }

    /// Add `word` if absent and return its index.
    pub fn insert(&mut self, word: &str) -> usize {
        if let Some(&i) = self.index.get(word) {
            return i;
        }
        let i = self.words.len();
        self.words.push(word.to_string());
        self.index.insert(word.to_string(), i);
        i
    }

    pub fn lookup(&self, word: &str) -> usize {
        self.index.get(word).copied().unwrap_or(UNKNOWN_INDEX)
    }

    /// Number of entries, including the unknown word.
    pub fn len(&self) -> usize {
        self.words.len()
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(words: Vec<String>) -> Self {
        Self::from_words(words.iter().map(String::as_str))
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.words
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_word_is_index_zero() {
        let vocab = Vocabulary::from_words(["good", "bad"]);
        assert_eq!(vocab.lookup(UNKNOWN_WORD), UNKNOWN_INDEX);
        assert_eq!(vocab.lookup("good"), 1);
        assert_eq!(vocab.lookup("bad"), 2);
        assert_eq!(vocab.lookup("ugly"), UNKNOWN_INDEX);
        assert_eq!(vocab.len(), 3);
    }

    #[test]
    fn test_duplicates_keep_first_index() {
        let mut vocab = Vocabulary::from_words(["a", "b", "a"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.insert("b"), 2);
        assert_eq!(vocab.insert("c"), 3);
    }

    #[test]
    fn test_serializes_as_word_list() {
        let vocab = Vocabulary::from_words(["good", "bad"]);
        let json  = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["*UNKNOWN*","good","bad"]"#);

        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab);
    }
}
