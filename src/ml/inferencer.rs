// ============================================================
// Layer 5 — Inference Controller
// ============================================================
// Applies a trained model to the test set of a dataset:
//
//   1. gate   model C == dataset C, else DimensionMismatch
//             (checked before any feature is extracted)
//   2. warn   once if the dataset also carries training data;
//             it is ignored in this stage
//   3. load   the classifier once, if one is configured
//   4. extract one feature vector per test example, in order
//   5. classify each vector, in the same order, and score the
//             whole set when every test example has a label
//
// The controller only reads. Writing the report to disk is the
// OutputReporter's job.

use crate::domain::accuracy::Accuracy;
use crate::domain::dataset::Dataset;
use crate::domain::distribution::ProbabilityDistribution;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::example::FeatureVector;
use crate::domain::theta::ParameterSet;
use crate::domain::traits::{Classifier, FeatureExtractor};
use crate::infra::checkpoint::CheckpointManager;

/// Everything inference produced, in test-set order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub features:      Vec<FeatureVector>,
    /// Present when a classifier was configured.
    pub probabilities: Option<Vec<ProbabilityDistribution>>,
    /// Present when a classifier was configured and all test labels are known.
    pub accuracy:      Option<Accuracy>,
    pub ignored_training_examples: usize,
}

pub struct InferenceController<'a> {
    checkpoint: &'a CheckpointManager,
}

impl<'a> InferenceController<'a> {
    pub fn new(checkpoint: &'a CheckpointManager) -> Self {
        Self { checkpoint }
    }

    /// `make_extractor` binds a feature extractor to the loaded model.
    pub fn run<'m, X, F>(
        &self,
        dataset:        &Dataset,
        model:          &'m ParameterSet,
        make_extractor: F,
    ) -> PipelineResult<Report>
    where
        X: FeatureExtractor,
        F: FnOnce(&'m ParameterSet) -> X,
    {
        check_categories(model.num_categories(), dataset.num_categories())?;

        let ignored = dataset.train.len();
        if ignored > 0 {
            tracing::warn!(
                "Dataset carries {} training examples; they are ignored when applying a model",
                ignored
            );
        }

        let classifier = self.checkpoint.load_classifier()?;
        if let Some(clf) = &classifier {
            check_categories(clf.num_categories(), dataset.num_categories())?;
        }

        let extractor = make_extractor(model);
        let features  = extractor.extract_all(&dataset.test);
        tracing::info!("Extracted {} feature vectors", features.len());

        let mut report = Report {
            features,
            ignored_training_examples: ignored,
            ..Report::default()
        };

        let Some(clf) = classifier else {
            return Ok(report);
        };

        if let Some(f) = report.features.iter().find(|f| f.len() != clf.num_features()) {
            return Err(PipelineError::configuration(format!(
                "classifier expects {} features but the model produces {}",
                clf.num_features(),
                f.len()
            )));
        }

        let probabilities: Vec<ProbabilityDistribution> =
            report.features.iter().map(|f| clf.probabilities(f)).collect();
        if dataset.test_labels_known() {
            let pairs = dataset
                .test
                .iter()
                .zip(&probabilities)
                .filter_map(|(e, p)| e.label.map(|gold| (gold, p.argmax())));
            report.accuracy = Some(Accuracy::from_pairs(clf.num_categories(), pairs));
        }
        report.probabilities = Some(probabilities);

        Ok(report)
    }
}

fn check_categories(model: usize, dataset: usize) -> PipelineResult<()> {
    if model != dataset {
        return Err(PipelineError::DimensionMismatch { model, dataset });
    }
    Ok(())
}
