// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to run one stage of
// the pipeline. The stage is chosen once at startup and carries
// only the configuration it needs:
//
//   PipelineStage::Train(TrainConfig)  → TrainUseCase
//   PipelineStage::Infer(ApplyConfig)  → ApplyUseCase
//
// Rules for this layer:
//   - No numeric code here (that's Layer 5)
//   - No direct file formats here (that's Layer 4 and 6)
//   - Only workflow coordination and the result lines printed
//     to standard output
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

use anyhow::Result;

// The training workflow
pub mod train_use_case;

// The inference workflow
pub mod apply_use_case;

use apply_use_case::{ApplyConfig, ApplyUseCase};
use train_use_case::{TrainConfig, TrainUseCase};

/// The stage a run executes.
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Train(TrainConfig),
    Infer(ApplyConfig),
}

impl PipelineStage {
    pub fn run(self) -> Result<()> {
        match self {
            PipelineStage::Train(cfg) => TrainUseCase::new(cfg).execute(),
            PipelineStage::Infer(cfg) => ApplyUseCase::new(cfg).execute().map(|_| ()),
        }
    }
}

// ─── Test Fixtures ────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod testdata {
    use std::{
        fs,
        io,
        path::{Path, PathBuf},
        sync::{Arc, Mutex},
    };

    use tracing_subscriber::fmt::MakeWriter;

    use super::train_use_case::TrainConfig;

    const SENTENCES: [&str; 10] = [
        "a fine and moving film",
        "dull plot and flat acting",
        "moving story with fine acting",
        "the plot is dull",
        "a fine film",
        "flat and dull",
        "story is moving",
        "acting with a flat story",
        "the film is fine",
        "a dull film with flat plot",
    ];

    /// Write `root/name/` with labels.txt, test.txt and optionally
    /// train.txt and vocab.txt. Labels cycle through `labels`.
    pub fn write_data_dir(
        root:       &Path,
        name:       &str,
        labels:     &[&str],
        with_train: bool,
        with_vocab: bool,
    ) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("labels.txt"), labels.join("\n")).unwrap();

        let lines = |offset: usize| -> String {
            SENTENCES
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}\t{}\n", labels[(i + offset) % labels.len()], s))
                .collect()
        };
        fs::write(dir.join("test.txt"), lines(0)).unwrap();
        if with_train {
            fs::write(dir.join("train.txt"), lines(1)).unwrap();
        }
        if with_vocab {
            let mut words: Vec<&str> = SENTENCES.iter().flat_map(|s| s.split_whitespace()).collect();
            words.sort_unstable();
            words.dedup();
            fs::write(dir.join("vocab.txt"), words.join("\n")).unwrap();
        }
        dir
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` and return what it produced along with every warning
    /// (or worse) it logged on this thread.
    pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(buffer.clone())
            .finish();

        let out = tracing::subscriber::with_default(subscriber, f);

        let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (out, text.lines().map(str::to_string).collect())
    }

    /// A configuration small enough to train in a unit test.
    pub fn toy_config(root: &Path, data_dir: &Path) -> TrainConfig {
        TrainConfig {
            data_dir:              data_dir.display().to_string(),
            model_file:            root.join("model.json").display().to_string(),
            classifier_file:       Some(root.join("classifier.json").display().to_string()),
            embedding_size:        3,
            max_iterations:        3,
            classifier_iterations: 10,
            ..TrainConfig::default()
        }
    }
}
