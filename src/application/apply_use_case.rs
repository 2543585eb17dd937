// ============================================================
// Layer 2 — ApplyUseCase
// ============================================================
// Applies a trained model to the test set of a data directory:
//
//   Step 1: Check the requested outputs    (this layer)
//   Step 2: Load the model                 (Layer 6 - infra)
//   Step 3: Load the test set against the  (Layer 4 - data)
//           vocabulary saved with the model
//   Step 4: Run inference                  (Layer 5 - ml)
//   Step 5: Write features/probabilities   (Layer 6 - infra)
//   Step 6: Print the test accuracy        (when labels are known)
//
// Inference fails before any output file is created, so a
// failed run never leaves partial outputs behind.
//
// Word indices come from the model's saved vocabulary, falling
// back to the data directory's vocab.txt for models saved
// without one. train.txt never influences them.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::loader::TextDatasetLoader;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::traits::DatasetSource;
use crate::infra::{checkpoint::CheckpointManager, report};
use crate::ml::{
    features::RaeFeatureExtractor,
    inferencer::{InferenceController, Report},
};

// ─── Apply Configuration ─────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyConfig {
    pub data_dir:           String,
    pub model_file:         String,
    pub classifier_file:    Option<String>,
    pub features_file:      Option<String>,
    pub probabilities_file: Option<String>,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            data_dir:           "data".to_string(),
            model_file:         "model/rae.json".to_string(),
            classifier_file:    None,
            features_file:      None,
            probabilities_file: None,
        }
    }
}

impl ApplyConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.probabilities_file.is_some() && self.classifier_file.is_none() {
            return Err(PipelineError::configuration(
                "a probabilities file needs a classifier file",
            ));
        }
        Ok(())
    }
}

// ─── ApplyUseCase ─────────────────────────────────────────────────────────────
pub struct ApplyUseCase {
    config: ApplyConfig,
}

impl ApplyUseCase {
    pub fn new(config: ApplyConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Report> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;
        let ckpt = CheckpointManager::new(&cfg.model_file, cfg.classifier_file.as_ref().map(PathBuf::from));

        // ── Step 2: Load the model ────────────────────────────────────────────
        println!("Using the trained RAE. Model file retrieved from {}", cfg.model_file);
        match ckpt.load_config() {
            Ok(Some(train_cfg)) => tracing::info!(
                "Model was trained on '{}' with alpha_cat={} beta={} lambda={} max_iterations={}",
                train_cfg.data_dir,
                train_cfg.alpha_cat,
                train_cfg.beta,
                train_cfg.lambda,
                train_cfg.max_iterations
            ),
            Ok(None) => tracing::debug!("No training config next to the model"),
            Err(e) => tracing::warn!("Ignoring unreadable training config: {e}"),
        }
        let model = ckpt.load_model()?;

        // ── Step 3: Load the dataset ──────────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.data_dir);
        let vocabulary = match ckpt.load_vocabulary()? {
            Some(vocabulary) => vocabulary,
            None => TextDatasetLoader::new(&cfg.data_dir)
                .read_vocabulary_file()?
                .ok_or_else(|| {
                    PipelineError::configuration(format!(
                        "no vocabulary saved with '{}' and no vocab.txt in '{}'",
                        cfg.model_file, cfg.data_dir
                    ))
                })?,
        };
        let dataset = TextDatasetLoader::for_inference(&cfg.data_dir, vocabulary).load()?;
        if dataset.vocabulary_size > model.dims().dictionary_size {
            tracing::warn!(
                "Vocabulary has {} words but the model knows {}; the rest are treated as unknown",
                dataset.vocabulary_size,
                model.dims().dictionary_size
            );
        }

        // ── Step 4: Inference ─────────────────────────────────────────────────
        let report = InferenceController::new(&ckpt).run(&dataset, &model, RaeFeatureExtractor::new)?;

        // ── Step 5: Outputs ───────────────────────────────────────────────────
        if let Some(path) = &cfg.features_file {
            report::write_features(Path::new(path), &report.features)?;
        }
        if let (Some(path), Some(probabilities)) = (&cfg.probabilities_file, &report.probabilities) {
            report::write_probabilities(Path::new(path), probabilities)?;
        }

        // ── Step 6: Accuracy ──────────────────────────────────────────────────
        if let Some(accuracy) = &report.accuracy {
            println!("{}", report::report_accuracy(accuracy));
        }
        tracing::info!(
            "Applied the model to {} test examples ({} training examples ignored)",
            report.features.len(),
            report.ignored_training_examples
        );

        Ok(report)
    }
}
