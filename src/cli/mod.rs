// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All work is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — pretrains the RAE and trains the classifier
//   2. `apply` — loads a model and processes the test set
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::Commands;

use crate::application::PipelineStage;

#[derive(Parser, Debug)]
#[command(
    name = "rae-pipeline",
    version,
    about = "Pretrain a recursive autoencoder on sentences, then classify them."
)]
pub struct Cli {
    /// The subcommand to run (train or apply)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Pick the pipeline stage once and run it.
    pub fn run(self) -> Result<()> {
        let stage = PipelineStage::from(self.command);
        match &stage {
            PipelineStage::Train(cfg) => tracing::info!("Stage: train on '{}'", cfg.data_dir),
            PipelineStage::Infer(cfg) => tracing::info!("Stage: apply '{}'", cfg.model_file),
        }
        stage.run()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["rae-pipeline", "train", "--embedding-size", "5"]).unwrap();
        let PipelineStage::Train(cfg) = PipelineStage::from(cli.command) else {
            panic!("expected the train stage");
        };
        assert_eq!(cfg.embedding_size, 5);
        assert_eq!(cfg.hidden_size, None);
        assert_eq!(cfg.max_iterations, 80);
        assert_eq!(cfg.alpha_cat, 0.2);
    }

    #[test]
    fn test_apply_arguments() {
        let cli = Cli::try_parse_from([
            "rae-pipeline",
            "apply",
            "--model-file", "m.json",
            "--classifier-file", "c.json",
            "--probabilities-file", "p.txt",
        ])
        .unwrap();
        let PipelineStage::Infer(cfg) = PipelineStage::from(cli.command) else {
            panic!("expected the apply stage");
        };
        assert_eq!(cfg.model_file, "m.json");
        assert_eq!(cfg.probabilities_file.as_deref(), Some("p.txt"));
        assert!(cfg.features_file.is_none());
    }

    #[test]
    fn test_probabilities_require_classifier_flag() {
        let parsed = Cli::try_parse_from(["rae-pipeline", "apply", "--probabilities-file", "p.txt"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
