//! Sequential batch upload loop.

use crate::client::FileStationClient;
use crate::error::{SynologyError, SynologyErrorKind, SynologyResult};
use crate::types::{BatchPolicy, UploadRequest};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum ItemOutcome {
    Succeeded(Value),
    Failed {
        kind: SynologyErrorKind,
        /// DSM code as a string, or the kind label when there is none.
        code: String,
        message: String,
    },
}

impl ItemOutcome {
    pub fn failed(err: &SynologyError) -> Self {
        Self::Failed {
            kind: err.kind,
            code: err.code_label(),
            message: err.message.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    /// Position of the item in the input.
    pub index: usize,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    /// Set when the token fired before every item was processed.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }
}

/// Upload `items` one after another.
///
/// Under [`BatchPolicy::Abort`] the first failure is returned and nothing
/// after it is sent. Under [`BatchPolicy::ContinueOnFail`] every processed
/// item gets exactly one entry, in input order. `cancel` is checked before
/// each item; an upload already in flight is allowed to finish.
pub async fn run_batch(
    client: &FileStationClient,
    items: Vec<UploadRequest>,
    policy: BatchPolicy,
    cancel: &CancellationToken,
) -> SynologyResult<BatchReport> {
    let total = items.len();
    let mut report = BatchReport::default();

    for (index, item) in items.into_iter().enumerate() {
        if cancel.is_cancelled() {
            info!("Batch cancelled after {} of {} items", index, total);
            return match policy {
                BatchPolicy::Abort => Err(SynologyError::cancelled(format!(
                    "Batch cancelled after {} of {} items",
                    index, total
                ))),
                BatchPolicy::ContinueOnFail => {
                    report.cancelled = true;
                    Ok(report)
                }
            };
        }

        match client.upload(item).await {
            Ok(data) => report.entries.push(BatchEntry {
                index,
                outcome: ItemOutcome::Succeeded(data),
            }),
            Err(e) if policy == BatchPolicy::Abort => {
                warn!("Batch item {} failed, aborting: {}", index, e);
                return Err(e);
            }
            Err(e) => {
                warn!("Batch item {} failed, continuing: {}", index, e);
                report.entries.push(BatchEntry {
                    index,
                    outcome: ItemOutcome::failed(&e),
                });
            }
        }
    }

    info!(
        "Batch finished: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}
