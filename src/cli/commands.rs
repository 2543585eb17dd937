// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `apply`, and all
// their flags. Each argument struct converts into the
// application-layer config, so Layer 2 never sees clap types.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    apply_use_case::ApplyConfig,
    train_use_case::TrainConfig,
    PipelineStage,
};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pretrain the RAE on a data directory and train the classifier
    Train(TrainArgs),

    /// Apply a trained RAE (and classifier) to the test set
    Apply(ApplyArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory with labels.txt, train.txt and optionally vocab.txt / test.txt
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Where to write the trained model
    #[arg(long, default_value = "model/rae.json")]
    pub model_file: String,

    /// Where to write the softmax classifier; skipped when absent
    #[arg(long)]
    pub classifier_file: Option<String>,

    /// CSV file that receives the solver history
    #[arg(long)]
    pub metrics_file: Option<String>,

    /// Length of a word embedding (E)
    #[arg(long, default_value_t = 50)]
    pub embedding_size: usize,

    /// Hidden size (H); defaults to the embedding size
    #[arg(long)]
    pub hidden_size: Option<usize>,

    /// Visible size (V); defaults to the embedding size
    #[arg(long)]
    pub visible_size: Option<usize>,

    /// Dictionary size (D); defaults to the vocabulary size
    #[arg(long)]
    pub dictionary_size: Option<usize>,

    /// Weight of the classification error against reconstruction
    #[arg(long, default_value_t = 0.2)]
    pub alpha_cat: f64,

    /// Regularization of the embeddings relative to the weights
    #[arg(long, default_value_t = 0.5)]
    pub beta: f64,

    /// L2 regularization of the encoder weights
    #[arg(long, default_value_t = 1e-5)]
    pub lambda: f64,

    /// L2 regularization of the classifier weights
    #[arg(long, default_value_t = 1e-6)]
    pub classifier_lambda: f64,

    /// Convergence tolerance of the solver
    #[arg(long, default_value_t = 1e-6)]
    pub tolerance: f64,

    /// Iteration budget for pretraining
    #[arg(long, default_value_t = 80)]
    pub max_iterations: usize,

    /// Iteration budget for classifier training
    #[arg(long, default_value_t = 200)]
    pub classifier_iterations: usize,

    /// Seed for parameter initialization
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:              a.data_dir,
            model_file:            a.model_file,
            classifier_file:       a.classifier_file,
            metrics_file:          a.metrics_file,
            embedding_size:        a.embedding_size,
            hidden_size:           a.hidden_size,
            visible_size:          a.visible_size,
            dictionary_size:       a.dictionary_size,
            alpha_cat:             a.alpha_cat,
            beta:                  a.beta,
            lambda:                a.lambda,
            classifier_lambda:     a.classifier_lambda,
            tolerance:             a.tolerance,
            max_iterations:        a.max_iterations,
            classifier_iterations: a.classifier_iterations,
            seed:                  a.seed,
        }
    }
}

/// All arguments for the `apply` command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Directory with labels.txt and test.txt (same vocabulary as training)
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Model written by `train`
    #[arg(long, default_value = "model/rae.json")]
    pub model_file: String,

    /// Classifier written by `train`
    #[arg(long)]
    pub classifier_file: Option<String>,

    /// Write one feature vector per test example here
    #[arg(long)]
    pub features_file: Option<String>,

    /// Write one probability distribution per test example here
    #[arg(long, requires = "classifier_file")]
    pub probabilities_file: Option<String>,
}

impl From<ApplyArgs> for ApplyConfig {
    fn from(a: ApplyArgs) -> Self {
        ApplyConfig {
            data_dir:           a.data_dir,
            model_file:         a.model_file,
            classifier_file:    a.classifier_file,
            features_file:      a.features_file,
            probabilities_file: a.probabilities_file,
        }
    }
}

impl From<Commands> for PipelineStage {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Train(args) => PipelineStage::Train(args.into()),
            Commands::Apply(args) => PipelineStage::Infer(args.into()),
        }
    }
}
