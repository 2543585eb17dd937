// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads a plain-text data directory:
//
//   data_dir/
//     labels.txt   one category name per line (defines C and
//                  the label index of each name)
//     vocab.txt    optional, one word per line
//     train.txt    one example per line
//     test.txt     one example per line
//
// Example lines are either `label<TAB>w1 w2 w3 ...` or just
// `w1 w2 w3 ...` for an unlabeled sentence. A label of `?`
// also means unlabeled. Blank lines are skipped.
//
// When labels.txt is missing the categories are the sorted set
// of labels that appear. When vocab.txt is missing the
// vocabulary is built from the train tokens, then the test
// tokens, in first-seen order.
//
// An inference loader is handed the vocabulary the model was
// trained with. It still reads train.txt so the caller can see
// that training data is present, but those examples never
// shape the categories or the word indices, and their labels
// are not checked.
//
// Reference: Rust Book §8 (Collections)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use super::vocabulary::Vocabulary;
use crate::domain::dataset::Dataset;
use crate::domain::example::LabeledExample;
use crate::domain::traits::DatasetSource;

pub const LABELS_FILE: &str = "labels.txt";
pub const VOCAB_FILE:  &str = "vocab.txt";
pub const TRAIN_FILE:  &str = "train.txt";
pub const TEST_FILE:   &str = "test.txt";

const UNLABELED: &str = "?";

/// One parsed line before vocabulary and category lookup.
#[derive(Debug, Clone, PartialEq)]
struct RawExample {
    line:   usize,
    label:  Option<String>,
    tokens: Vec<String>,
}

/// Where the word indices come from.
#[derive(Debug, Clone)]
enum Mode {
    /// vocab.txt, or every word of the directory
    Training,
    /// The vocabulary saved with a trained model
    Inference(Vocabulary),
}

/// Loads a dataset from a directory of text files.
pub struct TextDatasetLoader {
    dir:  PathBuf,
    mode: Mode,
}

impl TextDatasetLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), mode: Mode::Training }
    }

    /// Loader for applying a model trained with `vocabulary`.
    pub fn for_inference(dir: impl Into<PathBuf>, vocabulary: Vocabulary) -> Self {
        Self { dir: dir.into(), mode: Mode::Inference(vocabulary) }
    }

    /// The vocab.txt of the directory, if it has one.
    pub fn read_vocabulary_file(&self) -> Result<Option<Vocabulary>> {
        Ok(read_lines(&self.dir.join(VOCAB_FILE))?
            .map(|words| Vocabulary::from_words(words.iter().map(String::as_str))))
    }

    /// Load the dataset along with the vocabulary its word indices refer to.
    pub fn load_with_vocabulary(&self) -> Result<(Dataset, Vocabulary)> {
        if !self.dir.is_dir() {
            bail!("Data directory '{}' does not exist", self.dir.display());
        }

        let train_raw = read_examples(&self.dir.join(TRAIN_FILE))?;
        let test_raw  = read_examples(&self.dir.join(TEST_FILE))?;
        let inference = matches!(self.mode, Mode::Inference(_));

        // examples allowed to shape categories and vocabulary
        let shaping: Vec<&RawExample> = if inference {
            test_raw.iter().collect()
        } else {
            train_raw.iter().chain(&test_raw).collect()
        };

        // ── Categories ────────────────────────────────────────────────────────
        let categories = match read_lines(&self.dir.join(LABELS_FILE))? {
            Some(names) => names,
            None => {
                let seen: BTreeSet<&str> = shaping
                    .iter()
                    .filter_map(|e| e.label.as_deref())
                    .collect();
                tracing::warn!(
                    "No {} in '{}'; using the {} labels found in the data",
                    LABELS_FILE,
                    self.dir.display(),
                    seen.len()
                );
                seen.into_iter().map(str::to_string).collect()
            }
        };

        // ── Vocabulary ────────────────────────────────────────────────────────
        let vocabulary = match &self.mode {
            Mode::Inference(saved) => saved.clone(),
            Mode::Training => match self.read_vocabulary_file()? {
                Some(vocab) => vocab,
                None => Vocabulary::from_words(
                    shaping.iter().flat_map(|e| e.tokens.iter().map(String::as_str)),
                ),
            },
        };

        let train = resolve(&train_raw, &categories, &vocabulary, TRAIN_FILE, !inference)?;
        let test  = resolve(&test_raw, &categories, &vocabulary, TEST_FILE, true)?;

        tracing::info!(
            "Loaded {} train / {} test examples, {} categories, vocabulary of {}",
            train.len(),
            test.len(),
            categories.len(),
            vocabulary.len()
        );

        let dataset = Dataset {
            categories,
            vocabulary_size: vocabulary.len(),
            train,
            test,
        };
        Ok((dataset, vocabulary))
    }
}

impl DatasetSource for TextDatasetLoader {
    fn load(&self) -> Result<Dataset> {
        self.load_with_vocabulary().map(|(dataset, _)| dataset)
    }
}

/// Non-blank, trimmed lines of `path`, or None if the file does not exist.
fn read_lines(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(Some(
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
    ))
}

/// Parse an example file. A missing file is an empty sequence.
fn read_examples(path: &Path) -> Result<Vec<RawExample>> {
    if !path.exists() {
        tracing::debug!("'{}' not found, treating as empty", path.display());
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    Ok(text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| parse_line(i + 1, l))
        .collect())
}

fn parse_line(line: usize, text: &str) -> RawExample {
    let (label, sentence) = match text.split_once('\t') {
        Some((label, sentence)) => {
            let label = label.trim();
            let label = (!label.is_empty() && label != UNLABELED).then(|| label.to_string());
            (label, sentence)
        }
        None => (None, text),
    };

    RawExample {
        line,
        label,
        tokens: sentence.split_whitespace().map(str::to_string).collect(),
    }
}

/// Look up labels and words. With `strict` off, an unknown label
/// leaves the example unlabeled instead of failing.
fn resolve(
    raw:        &[RawExample],
    categories: &[String],
    vocabulary: &Vocabulary,
    file:       &str,
    strict:     bool,
) -> Result<Vec<LabeledExample>> {
    raw.iter()
        .map(|e| {
            let label = match &e.label {
                Some(name) => match categories.iter().position(|c| c == name) {
                    Some(i) => Some(i),
                    None if strict => bail!("{}:{}: unknown category '{}'", file, e.line, name),
                    None => None,
                },
                None => None,
            };
            let words = e.tokens.iter().map(|t| vocabulary.lookup(t)).collect();
            Ok(LabeledExample::new(words, label))
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocabulary::UNKNOWN_INDEX;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_parse_labeled_and_unlabeled_lines() {
        let e = parse_line(3, "pos\tgreat movie");
        assert_eq!(e.label.as_deref(), Some("pos"));
        assert_eq!(e.tokens, vec!["great", "movie"]);

        let e = parse_line(4, "?\tno idea");
        assert_eq!(e.label, None);

        let e = parse_line(5, "just words here");
        assert_eq!(e.label, None);
        assert_eq!(e.tokens.len(), 3);
    }

    #[test]
    fn test_load_full_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), LABELS_FILE, "neg\npos\n");
        write(dir.path(), TRAIN_FILE, "pos\tgood fun\nneg\tbad dull\n\nsome unlabeled text\n");
        write(dir.path(), TEST_FILE, "pos\tgood\nneg\tawful\n");

        let ds = TextDatasetLoader::new(dir.path()).load().unwrap();

        assert_eq!(ds.categories, vec!["neg", "pos"]);
        assert_eq!(ds.train.len(), 3);
        assert_eq!(ds.train[0].label, Some(1));
        assert_eq!(ds.train[1].label, Some(0));
        assert_eq!(ds.train[2].label, None);
        // unknown + good fun bad dull some unlabeled text + awful
        assert_eq!(ds.vocabulary_size, 9);
        assert_eq!(ds.test[0].words, ds.train[0].words[..1].to_vec());
        assert!(ds.test_labels_known());
    }

    #[test]
    fn test_fixed_vocabulary_maps_unknown_words() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), LABELS_FILE, "a\nb\n");
        write(dir.path(), VOCAB_FILE, "x\ny\n");
        write(dir.path(), TEST_FILE, "x z y\n");

        let ds = TextDatasetLoader::new(dir.path()).load().unwrap();

        assert_eq!(ds.vocabulary_size, 3);
        assert!(ds.train.is_empty());
        assert_eq!(ds.test[0].words, vec![1, UNKNOWN_INDEX, 2]);
        assert!(!ds.test_labels_known());
    }

    #[test]
    fn test_categories_inferred_when_labels_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), TRAIN_FILE, "zeta\tone\nalpha\ttwo\n");

        let ds = TextDatasetLoader::new(dir.path()).load().unwrap();
        assert_eq!(ds.categories, vec!["alpha", "zeta"]);
        assert_eq!(ds.train[0].label, Some(1));
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), LABELS_FILE, "neg\npos\n");
        write(dir.path(), TEST_FILE, "pos\tok\nmeh\tok\n");

        let err = TextDatasetLoader::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("test.txt:2"));
    }

    #[test]
    fn test_inference_ignores_training_words_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), TRAIN_FILE, "other\tzzz yyy good\n");
        write(dir.path(), TEST_FILE, "pos\tgood xxx\nneg\tbad\n");
        let saved = Vocabulary::from_words(["bad", "good"]);

        let (ds, vocab) = TextDatasetLoader::for_inference(dir.path(), saved.clone())
            .load_with_vocabulary()
            .unwrap();

        assert_eq!(vocab, saved);
        assert_eq!(ds.vocabulary_size, 3);
        assert_eq!(ds.categories, vec!["neg", "pos"]);
        assert_eq!(ds.test[0].words, vec![2, UNKNOWN_INDEX]);
        assert_eq!(ds.test[1].words, vec![1]);
        assert_eq!(ds.train.len(), 1);
        assert_eq!(ds.train[0].label, None);
    }

    #[test]
    fn test_training_mode_returns_built_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), LABELS_FILE, "a\n");
        write(dir.path(), TRAIN_FILE, "a\tone two\n");
        write(dir.path(), TEST_FILE, "a\tthree one\n");

        let loader = TextDatasetLoader::new(dir.path());
        let (ds, vocab) = loader.load_with_vocabulary().unwrap();

        assert!(loader.read_vocabulary_file().unwrap().is_none());
        assert_eq!(vocab, Vocabulary::from_words(["one", "two", "three"]));
        assert_eq!(ds.test[0].words, vec![3, 1]);
    }

    #[test]
    fn test_missing_directory() {
        let loader = TextDatasetLoader::new("/definitely/not/here");
        assert!(loader.load().is_err());
    }
}
