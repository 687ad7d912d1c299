//! Concurrent batch driver.
//!
//! Fans out one independent task per discovered NZB file, lets them run to
//! completion with no shared mutable state, and joins on a single barrier
//! before the summary is reported. A failing task is captured at its own
//! boundary and never cancels or affects a sibling.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::TaskError;
use crate::transform::{self, TransformOptions};
use crate::{codec, nzb, writer};

/// One unit of concurrent work: a single input file together with everything
/// needed to process it. Immutable once dispatched.
#[derive(Debug, Clone)]
pub struct FileTask {
    /// Base filename of the input, relative to `source_dir`.
    pub filename: String,
    /// Directory the input is read from.
    pub source_dir: PathBuf,
    /// Directory the output is written to.
    pub dest_dir: PathBuf,
    /// Shared read-only rule configuration.
    pub options: Arc<TransformOptions>,
}

/// Terminal state of one task.
#[derive(Debug)]
pub enum TransformResult {
    /// The output file was written at this path.
    Written(PathBuf),
    /// The task failed; no output was produced for this file.
    Failed { filename: String, error: TaskError },
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    /// Number of dispatched tasks.
    pub total: usize,
    /// Number of output files written.
    pub written: usize,
    /// Number of tasks that failed.
    pub failed: usize,
    /// Wall time of the whole batch.
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Throughput in files per second; `None` for an instantaneous batch.
    pub fn files_per_second(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.total as f64 / secs)
    }
}

fn serialize_secs<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// Builds the task list for a discovered batch.
pub fn build_tasks(
    filenames: Vec<String>,
    source_dir: PathBuf,
    dest_dir: PathBuf,
    options: TransformOptions,
) -> Vec<FileTask> {
    let options = Arc::new(options);
    filenames
        .into_iter()
        .map(|filename| FileTask {
            filename,
            source_dir: source_dir.clone(),
            dest_dir: dest_dir.clone(),
            options: Arc::clone(&options),
        })
        .collect()
}

/// Runs every task concurrently and blocks until all of them have completed.
///
/// Each task is spawned independently; its errors are captured into its own
/// [`TransformResult`] and logged there. An empty task list completes the
/// join immediately. Returns the batch summary and the individual results.
pub async fn run_batch(tasks: Vec<FileTask>) -> (BatchSummary, Vec<TransformResult>) {
    let started = Instant::now();
    let total = tasks.len();

    let mut handles = Vec::with_capacity(total);
    for task in tasks {
        handles.push(tokio::spawn(async move { process_file(task).await }));
    }

    let mut results = Vec::with_capacity(total);
    for joined in futures::future::join_all(handles).await {
        match joined {
            Ok(result) => results.push(result),
            // A panicking task is a bug, but it still must not take the
            // batch down with it.
            Err(join_error) => {
                tracing::error!(error = %join_error, "Task panicked");
            }
        }
    }

    let written = results
        .iter()
        .filter(|result| matches!(result, TransformResult::Written(_)))
        .count();
    let failed = results.len() - written;

    let summary = BatchSummary {
        total,
        written,
        failed,
        elapsed: started.elapsed(),
    };
    (summary, results)
}

/// Processes one file end to end: read, parse, transform, serialize, write.
///
/// Every failure is folded into the returned [`TransformResult`]; this
/// function never propagates an error past the task boundary.
async fn process_file(task: FileTask) -> TransformResult {
    let filename = task.filename.clone();
    tracing::info!(file = %filename, "Processing NZB file");

    match process_file_inner(&task).await {
        Ok(path) => {
            tracing::info!(file = %filename, output = %path.display(), "Wrote cleaned NZB file");
            TransformResult::Written(path)
        }
        Err(error) => {
            tracing::error!(file = %filename, error = %error, "Failed to process NZB file");
            TransformResult::Failed { filename, error }
        }
    }
}

async fn process_file_inner(task: &FileTask) -> Result<PathBuf, TaskError> {
    let input_path = task.source_dir.join(&task.filename);
    let content = tokio::fs::read_to_string(&input_path)
        .await
        .map_err(|source| TaskError::Read {
            filename: task.filename.clone(),
            source,
        })?;

    let (base_name, password) = codec::decode(&task.filename);

    let doc = nzb::parse(&content).map_err(|source| TaskError::Parse {
        filename: task.filename.clone(),
        source,
    })?;

    let outcome = transform::apply(doc, &password, &base_name, &task.options);
    for warning in &outcome.warnings {
        tracing::warn!(file = %task.filename, "{warning}");
    }

    writer::write_document(&outcome, &task.dest_dir, &task.filename)
}
