// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the artifacts of a training run:
//
//   1. <model>              — the trained ParameterSet
//   2. <model>.vocab.json   — the word list behind its dictionary
//   3. <classifier>         — the softmax classifier (optional)
//   4. <model>.config.json  — the TrainConfig that produced it
//
// The model file is self-describing JSON written in a fixed
// field order:
//
//   { "dimensions": { E, H, V, C, D },
//     "theta":      [ ... L values ... ],
//     "format_version": 1 }
//
// Loading rejects an unknown format version, dimensions the
// encoder cannot run with, and a theta whose length does not
// match the declared dimensions.
// serde_json is built with `float_roundtrip`, so every f64
// survives save/load bit for bit.
//
// Every file is opened, fully written or read, flushed and
// closed inside the call that touches it.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json documentation (to_writer / from_reader)

use std::{
    ffi::OsString,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::vocabulary::Vocabulary;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::theta::{Dimensions, ParameterSet};
use crate::ml::softmax::SoftmaxClassifier;

/// Version tag written into every model file.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk form of one ParameterSet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedModel {
    pub dimensions:     Dimensions,
    pub theta:          Vec<f64>,
    pub format_version: u32,
}

impl From<&ParameterSet> for PersistedModel {
    fn from(params: &ParameterSet) -> Self {
        Self {
            dimensions:     params.dims(),
            theta:          params.as_slice().to_vec(),
            format_version: FORMAT_VERSION,
        }
    }
}

impl PersistedModel {
    /// Rebuild the ParameterSet, checking version, dimensions and length first.
    pub fn into_parameter_set(self, path: &Path) -> PipelineResult<ParameterSet> {
        if self.format_version != FORMAT_VERSION {
            return Err(PipelineError::deserialization(
                path,
                format!(
                    "format version {} is not supported (expected {})",
                    self.format_version, FORMAT_VERSION
                ),
            ));
        }
        self.dimensions
            .check_supported()
            .map_err(|e| PipelineError::deserialization(path, e))?;
        ParameterSet::from_flat(self.dimensions, self.theta)
            .map_err(|e| PipelineError::deserialization(path, e))
    }
}

/// Owns the artifact paths of one run.
pub struct CheckpointManager {
    model_path:      PathBuf,
    classifier_path: Option<PathBuf>,
}

impl CheckpointManager {
    pub fn new(model_path: impl Into<PathBuf>, classifier_path: Option<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            classifier_path,
        }
    }

    pub fn classifier_path(&self) -> Option<&Path> {
        self.classifier_path.as_deref()
    }

    /// `<model>.config.json`, next to the model file.
    pub fn config_path(&self) -> PathBuf {
        self.sibling(".config.json")
    }

    /// `<model>.vocab.json`, next to the model file.
    pub fn vocabulary_path(&self) -> PathBuf {
        self.sibling(".vocab.json")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.model_path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    // ─── Model ────────────────────────────────────────────────────────────────
    pub fn save_model(&self, params: &ParameterSet) -> PipelineResult<()> {
        write_json(&self.model_path, &PersistedModel::from(params))?;
        tracing::info!(
            "Saved model ({}, {} parameters) to '{}'",
            params.dims(),
            params.len(),
            self.model_path.display()
        );
        Ok(())
    }

    pub fn load_model(&self) -> PipelineResult<ParameterSet> {
        let persisted: PersistedModel = read_json(&self.model_path)?;
        let params = persisted.into_parameter_set(&self.model_path)?;
        tracing::info!("Loaded model ({}) from '{}'", params.dims(), self.model_path.display());
        Ok(params)
    }

    // ─── Vocabulary ───────────────────────────────────────────────────────────
    pub fn save_vocabulary(&self, vocabulary: &Vocabulary) -> PipelineResult<()> {
        let path = self.vocabulary_path();
        write_json(&path, vocabulary)?;
        tracing::info!("Saved vocabulary of {} words to '{}'", vocabulary.len(), path.display());
        Ok(())
    }

    /// The vocabulary saved with the model, if there is one.
    pub fn load_vocabulary(&self) -> PipelineResult<Option<Vocabulary>> {
        let path = self.vocabulary_path();
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    // ─── Classifier ───────────────────────────────────────────────────────────
    pub fn save_classifier(&self, classifier: &SoftmaxClassifier) -> PipelineResult<()> {
        let path = self
            .classifier_path
            .as_deref()
            .ok_or_else(|| PipelineError::configuration("no classifier file configured"))?;
        write_json(path, classifier)?;
        tracing::info!("Saved classifier to '{}'", path.display());
        Ok(())
    }

    /// The configured classifier, or `None` when no classifier file is set.
    pub fn load_classifier(&self) -> PipelineResult<Option<SoftmaxClassifier>> {
        let Some(path) = self.classifier_path.as_deref() else {
            return Ok(None);
        };
        let classifier: SoftmaxClassifier = read_json(path)?;
        classifier
            .validate()
            .map_err(|reason| PipelineError::deserialization(path, reason))?;
        tracing::info!("Loaded classifier from '{}'", path.display());
        Ok(Some(classifier))
    }

    // ─── Training configuration ───────────────────────────────────────────────
    pub fn save_config(&self, cfg: &TrainConfig) -> PipelineResult<()> {
        let path = self.config_path();
        write_json(&path, cfg)?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// The config saved alongside the model, if there is one.
    pub fn load_config(&self) -> PipelineResult<Option<TrainConfig>> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| PipelineError::io(path, e.into()))?;
    writer.flush().map_err(|e| PipelineError::io(path, e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> PipelineResult<T> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        if e.is_io() {
            PipelineError::io(path, e.into())
        } else {
            PipelineError::deserialization(path, e)
        }
    })
}
