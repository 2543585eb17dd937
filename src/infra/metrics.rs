// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records the solver's progress to a CSV file, one row per
// accepted L-BFGS iteration.
//
// Example CSV output:
//   iteration,cost,gradient_norm,step,evaluations
//   1,4.217301,1.203e0,8.312e-1,1
//   2,3.990845,9.871e-1,1.000e0,1
//   ...
//
// The header is written only when the file is created, so
// several runs can append to the same log.
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::ml::lbfgs::IterationRecord;

const HEADER: &str = "iteration,cost,gradient_norm,step,evaluations";

/// Appends solver history to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the file with its header unless it already exists.
    pub fn new(csv_path: impl Into<PathBuf>) -> PipelineResult<Self> {
        let csv_path = csv_path.into();

        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }

        if !csv_path.exists() {
            let mut f = File::create(&csv_path).map_err(|e| PipelineError::io(&csv_path, e))?;
            writeln!(f, "{HEADER}").map_err(|e| PipelineError::io(&csv_path, e))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one row per record.
    pub fn log(&self, records: &[IterationRecord]) -> PipelineResult<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| PipelineError::io(&self.csv_path, e))?;
        let mut out = BufWriter::new(file);

        for r in records {
            writeln!(
                out,
                "{},{:.6},{:.3e},{:.3e},{}",
                r.iteration, r.cost, r.gradient_norm, r.step, r.evaluations,
            )
            .map_err(|e| PipelineError::io(&self.csv_path, e))?;
        }
        out.flush().map_err(|e| PipelineError::io(&self.csv_path, e))?;

        tracing::debug!("Logged {} solver iterations", records.len());
        Ok(())
    }
}
