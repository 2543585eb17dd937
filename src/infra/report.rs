// ============================================================
// Layer 6 — Output Reporter
// ============================================================
// Writes the per-example outputs of an inference run. Line i
// of each file comes from test example i and from nothing
// else.
//
// Features file, values at 8 decimals separated by spaces:
//   0.12345678 -0.50000000 0.99999999
//
// Probabilities file, one `label : p, ` entry per category at
// 3 decimals:
//   0 : 0.250, 1 : 0.750,
//
// Each writer owns its file for the duration of the call and
// flushes before returning; the handle is dropped on every
// path, including an error halfway through.
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::domain::accuracy::Accuracy;
use crate::domain::distribution::ProbabilityDistribution;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::example::FeatureVector;

pub fn write_features(path: &Path, features: &[FeatureVector]) -> PipelineResult<()> {
    write_lines(path, features, |out, f| {
        let line: Vec<String> = f.values.iter().map(|v| format!("{v:.8}")).collect();
        writeln!(out, "{}", line.join(" "))
    })?;
    tracing::info!("Wrote {} feature vectors to '{}'", features.len(), path.display());
    Ok(())
}

pub fn write_probabilities(path: &Path, distributions: &[ProbabilityDistribution]) -> PipelineResult<()> {
    write_lines(path, distributions, |out, p| {
        for (label, prob) in p.iter() {
            write!(out, "{label} : {prob:.3}, ")?;
        }
        writeln!(out)
    })?;
    tracing::info!("Wrote {} distributions to '{}'", distributions.len(), path.display());
    Ok(())
}

/// One human-readable line summarizing `accuracy`.
pub fn report_accuracy(accuracy: &Accuracy) -> String {
    format!("Test Accuracy : {accuracy}")
}

fn write_lines<T>(
    path:  &Path,
    items: &[T],
    mut write_item: impl FnMut(&mut BufWriter<File>, &T) -> std::io::Result<()>,
) -> PipelineResult<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for item in items {
        write_item(&mut out, item).map_err(|e| PipelineError::io(path, e))?;
    }
    out.flush().map_err(|e| PipelineError::io(path, e))
}
