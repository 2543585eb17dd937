// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the training stage in order:
//
//   Step 1: Load the data directory       (Layer 4 - data)
//   Step 2: Resolve and check the config  (this layer)
//   Step 3: Pretrain the RAE              (Layer 5 - ml)
//   Step 4: Log solver history            (Layer 6 - infra)
//   Step 5: Save model, vocabulary and    (Layer 6 - infra)
//           config
//   Step 6: Train the classifier          (Layer 5 - ml)
//           on features of the training set, if a classifier
//           file is configured
//
// A failure at any step aborts the run. The model is only
// written after pretraining has fully succeeded.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{bail, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::loader::TextDatasetLoader;
use crate::domain::dataset::Dataset;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::theta::{Dimensions, ParameterSet};
use crate::domain::traits::FeatureExtractor;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    cost::RaeHyperParams,
    features::{feature_size, RaeFeatureExtractor},
    lbfgs::QnMinimizer,
    softmax::SoftmaxClassifier,
    trainer::TrainingController,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run needs. Saved next to the model so
// an apply run can report how the model was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:              String,
    pub model_file:            String,
    pub classifier_file:       Option<String>,
    pub metrics_file:          Option<String>,
    pub embedding_size:        usize,
    /// Defaults to embedding_size
    pub hidden_size:           Option<usize>,
    /// Defaults to embedding_size
    pub visible_size:          Option<usize>,
    /// Defaults to the vocabulary size of the dataset
    pub dictionary_size:       Option<usize>,
    pub alpha_cat:             f64,
    pub beta:                  f64,
    pub lambda:                f64,
    pub classifier_lambda:     f64,
    pub tolerance:             f64,
    pub max_iterations:        usize,
    pub classifier_iterations: usize,
    pub seed:                  u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:              "data".to_string(),
            model_file:            "model/rae.json".to_string(),
            classifier_file:       None,
            metrics_file:          None,
            embedding_size:        50,
            hidden_size:           None,
            visible_size:          None,
            dictionary_size:       None,
            alpha_cat:             0.2,
            beta:                  0.5,
            lambda:                1e-5,
            classifier_lambda:     1e-6,
            tolerance:             1e-6,
            max_iterations:        80,
            classifier_iterations: 200,
            seed:                  42,
        }
    }
}

impl TrainConfig {
    pub fn hyper_params(&self) -> RaeHyperParams {
        RaeHyperParams {
            alpha_cat: self.alpha_cat,
            beta:      self.beta,
            lambda:    self.lambda,
        }
    }

    /// Fill in the defaulted sizes from `dataset` and check the result.
    pub fn resolve(&self, dataset: &Dataset) -> PipelineResult<Dimensions> {
        let e = self.embedding_size;
        let h = self.hidden_size.unwrap_or(e);
        let v = self.visible_size.unwrap_or(e);
        let c = dataset.num_categories();
        let d = self.dictionary_size.unwrap_or(dataset.vocabulary_size);

        let fail = |reason: String| -> PipelineResult<Dimensions> {
            Err(PipelineError::configuration(reason))
        };

        let dims = Dimensions::new(e, h, v, c, d);
        if let Err(err) = dims.check_supported() {
            return fail(err.to_string());
        }
        if d < dataset.vocabulary_size {
            return fail(format!(
                "dictionary size {d} cannot hold the {} word vocabulary",
                dataset.vocabulary_size
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha_cat) {
            return fail(format!("alpha_cat {} is outside [0, 1]", self.alpha_cat));
        }
        if !(self.beta >= 0.0 && self.lambda >= 0.0 && self.classifier_lambda >= 0.0) {
            return fail("regularization weights must be non-negative".into());
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return fail(format!("tolerance {} must be a positive number", self.tolerance));
        }
        if self.max_iterations == 0 || self.classifier_iterations == 0 {
            return fail("iteration budgets must be at least 1".into());
        }

        Ok(dims)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training stage end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load the dataset ──────────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.data_dir);
        let (dataset, vocabulary) = TextDatasetLoader::new(&cfg.data_dir).load_with_vocabulary()?;
        tracing::info!(
            "Loaded {} training and {} test examples, {} categories, {} words",
            dataset.train.len(),
            dataset.test.len(),
            dataset.num_categories(),
            dataset.vocabulary_size
        );
        if dataset.train.is_empty() {
            bail!("No training examples found in '{}'", cfg.data_dir);
        }

        // ── Step 2: Resolve dimensions ────────────────────────────────────────
        let dims = cfg.resolve(&dataset)?;
        if cfg.classifier_file.is_some() && dataset.train.iter().all(|e| e.label.is_none()) {
            return Err(PipelineError::configuration(
                "a classifier file was given but no training example has a label",
            )
            .into());
        }

        // ── Step 3: Pretrain ──────────────────────────────────────────────────
        println!("Training the RAE. Model file will be saved in {}", cfg.model_file);
        let mut rng    = StdRng::seed_from_u64(cfg.seed);
        let mut solver = QnMinimizer::default();
        let controller = TrainingController::new(dims, cfg.hyper_params(), cfg.tolerance, cfg.max_iterations);
        let model      = controller.run(&dataset.train, &mut solver, &mut rng)?;

        // ── Step 4: Solver history ────────────────────────────────────────────
        if let Some(path) = &cfg.metrics_file {
            MetricsLogger::new(path)?.log(solver.history())?;
        }

        // ── Step 5: Persist ───────────────────────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.model_file, cfg.classifier_file.as_ref().map(PathBuf::from));
        ckpt.save_model(&model)?;
        ckpt.save_vocabulary(&vocabulary)?;
        ckpt.save_config(cfg)?;
        println!("RAE trained. The model file is saved in {}", cfg.model_file);

        // ── Step 6: Classifier ────────────────────────────────────────────────
        if ckpt.classifier_path().is_some() {
            self.train_classifier(&dataset, &model, &ckpt)?;
        }

        Ok(())
    }

    fn train_classifier(
        &self,
        dataset: &Dataset,
        model:   &ParameterSet,
        ckpt:    &CheckpointManager,
    ) -> Result<()> {
        let cfg = &self.config;
        let features = RaeFeatureExtractor::new(model).extract_all(&dataset.train);
        let dims     = model.dims();
        let mut classifier =
            SoftmaxClassifier::new(dims.num_categories, feature_size(&dims), cfg.classifier_lambda);

        let accuracy = classifier.train(
            &features,
            &mut QnMinimizer::default(),
            cfg.tolerance,
            cfg.classifier_iterations,
        )?;
        println!("Train Accuracy : {accuracy}");

        ckpt.save_classifier(&classifier)?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testdata::{toy_config, write_data_dir};
    use crate::domain::example::LabeledExample;
    use std::fs;
    use tempfile::TempDir;

    fn dataset(categories: usize, vocabulary_size: usize) -> Dataset {
        Dataset {
            categories: (0..categories).map(|c| c.to_string()).collect(),
            vocabulary_size,
            train: vec![LabeledExample::unlabeled(vec![1, 2])],
            test:  Vec::new(),
        }
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let cfg  = TrainConfig { embedding_size: 5, ..TrainConfig::default() };
        let dims = cfg.resolve(&dataset(2, 100)).unwrap();
        assert_eq!(dims, Dimensions::new(5, 5, 5, 2, 100));
    }

    #[test]
    fn test_resolve_keeps_larger_dictionary() {
        let cfg = TrainConfig { embedding_size: 4, dictionary_size: Some(500), ..TrainConfig::default() };
        assert_eq!(cfg.resolve(&dataset(3, 120)).unwrap().dictionary_size, 500);
    }

    #[test]
    fn test_resolve_rejects_bad_configs() {
        let base = TrainConfig { embedding_size: 4, ..TrainConfig::default() };
        let bad = [
            TrainConfig { embedding_size: 0, ..base.clone() },
            TrainConfig { hidden_size: Some(6), ..base.clone() },
            TrainConfig { dictionary_size: Some(10), ..base.clone() },
            TrainConfig { alpha_cat: 1.5, ..base.clone() },
            TrainConfig { lambda: -1.0, ..base.clone() },
            TrainConfig { tolerance: 0.0, ..base.clone() },
            TrainConfig { max_iterations: 0, ..base.clone() },
        ];
        for cfg in bad {
            let err = cfg.resolve(&dataset(2, 50)).unwrap_err();
            assert!(matches!(err, PipelineError::Configuration(_)), "{cfg:?}");
        }
        assert!(base.resolve(&dataset(0, 50)).is_err());
    }

    #[test]
    fn test_training_writes_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let data_dir = write_data_dir(dir.path(), "data", &["neg", "pos"], true, false);
        let cfg = TrainConfig {
            metrics_file: Some(dir.path().join("metrics.csv").display().to_string()),
            ..toy_config(dir.path(), &data_dir)
        };

        TrainUseCase::new(cfg.clone()).execute().unwrap();

        let ckpt  = CheckpointManager::new(&cfg.model_file, cfg.classifier_file.as_ref().map(PathBuf::from));
        let model = ckpt.load_model().unwrap();
        assert_eq!(model.num_categories(), 2);
        assert_eq!(model.len(), model.dims().num_params());
        assert_eq!(ckpt.load_config().unwrap(), Some(cfg.clone()));
        let vocab = ckpt.load_vocabulary().unwrap().unwrap();
        assert_eq!(vocab.len(), model.dims().dictionary_size);

        let classifier = ckpt.load_classifier().unwrap().unwrap();
        assert_eq!(classifier.num_features(), feature_size(&model.dims()));

        let metrics = fs::read_to_string(cfg.metrics_file.unwrap()).unwrap();
        assert!(metrics.starts_with("iteration,cost,gradient_norm,step,evaluations"));
    }

    #[test]
    fn test_same_seed_reproduces_model() {
        let dir = TempDir::new().unwrap();
        let data_dir = write_data_dir(dir.path(), "data", &["neg", "pos"], true, false);
        let first  = toy_config(dir.path(), &data_dir);
        let second = TrainConfig {
            model_file: dir.path().join("again.json").display().to_string(),
            classifier_file: None,
            ..first.clone()
        };

        TrainUseCase::new(first.clone()).execute().unwrap();
        TrainUseCase::new(second.clone()).execute().unwrap();

        let a = CheckpointManager::new(&first.model_file, None).load_model().unwrap();
        let b = CheckpointManager::new(&second.model_file, None).load_model().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_classifier_needs_labeled_training_data() {
        let dir = TempDir::new().unwrap();
        let data_dir = write_data_dir(dir.path(), "data", &["neg", "pos"], true, false);
        fs::write(data_dir.join("train.txt"), "?\ta fine film\n?\tflat and dull\n").unwrap();
        let cfg = toy_config(dir.path(), &data_dir);

        let err = TrainUseCase::new(cfg.clone()).execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Configuration(_))
        ));
        assert!(!PathBuf::from(&cfg.model_file).exists());

        // without a classifier file the same data pretrains fine
        let cfg = TrainConfig { classifier_file: None, ..cfg };
        TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!(PathBuf::from(&cfg.model_file).exists());
    }

    #[test]
    fn test_missing_training_data_is_an_error() {
        let dir = TempDir::new().unwrap();
        let data_dir = write_data_dir(dir.path(), "data", &["neg", "pos"], false, false);
        let cfg = toy_config(dir.path(), &data_dir);

        assert!(TrainUseCase::new(cfg.clone()).execute().is_err());
        assert!(!PathBuf::from(&cfg.model_file).exists());
    }
}
