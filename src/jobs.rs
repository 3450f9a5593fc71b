//! Asynchronous evaluation jobs: a concurrency-safe registry with a monotonic
//! state machine and time-based eviction, plus the worker that executes a
//! submitted evaluation and publishes progress snapshots into it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::evaluation::{EvaluationConfig, EvaluationReport, EvaluationRunner, ProgressUpdate};

/// Lifecycle state of an evaluation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    /// Terminal states are never transitioned again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Legal edges: queued→running, running→completed, running→failed.
    fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Queued, JobState::Running)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Failed)
        )
    }
}

/// Progress snapshot published by the worker; overwritten whole, never
/// field-by-field, so readers always see one consistent snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Rows processed so far.
    pub processed: usize,
    /// Total rows selected, when known.
    pub total: Option<usize>,
    /// Rows scored so far.
    pub accepted: usize,
    /// Rows skipped so far.
    pub skipped: usize,
    /// Completion percentage, when the total is known.
    pub percent: Option<f64>,
}

impl From<ProgressUpdate> for JobProgress {
    fn from(update: ProgressUpdate) -> Self {
        let percent = if update.total > 0 {
            Some((update.processed as f64 / update.total as f64 * 10_000.0).round() / 100.0)
        } else {
            None
        };
        Self {
            processed: update.processed,
            total: Some(update.total),
            accepted: update.accepted,
            skipped: update.skipped,
            percent,
        }
    }
}

/// Terminal failure information kept on the job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFailure {
    /// Stable categorical reason.
    pub category: String,
    /// Human-readable detail.
    pub message: String,
}

/// One evaluation job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Opaque job id.
    pub id: String,
    /// Current lifecycle state.
    pub state: JobState,
    /// Latest progress snapshot, if the worker published one.
    pub progress: Option<JobProgress>,
    /// Result, present once completed.
    pub result: Option<EvaluationReport>,
    /// Failure, present once failed.
    pub error: Option<JobFailure>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation; drives eviction.
    pub updated_at: DateTime<Utc>,
}

/// Concurrency-safe registry of evaluation jobs with TTL-based eviction.
///
/// The reaper runs opportunistically before create and lookup; it deletes by
/// elapsed time only, regardless of state, and is safe to call at any moment.
pub struct JobStore {
    jobs: DashMap<String, JobRecord>,
    ttl: chrono::Duration,
}

impl JobStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            jobs: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(1)),
        }
    }

    /// Create a new queued job and return its id.
    pub fn create(&self) -> String {
        self.reap_expired();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.jobs.insert(
            id.clone(),
            JobRecord {
                id: id.clone(),
                state: JobState::Queued,
                progress: Some(JobProgress {
                    processed: 0,
                    total: None,
                    accepted: 0,
                    skipped: 0,
                    percent: Some(0.0),
                }),
                result: None,
                error: None,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Snapshot of one job record.
    pub fn get(&self, id: &str) -> Option<JobRecord> {
        self.reap_expired();
        self.jobs.get(id).map(|entry| entry.clone())
    }

    /// Transition a job's state. Illegal edges (including any transition out
    /// of a terminal state) are refused and leave the record untouched.
    pub fn transition(&self, id: &str, next: JobState) -> bool {
        match self.jobs.get_mut(id) {
            Some(mut entry) => {
                if !entry.state.can_transition_to(next) {
                    warn!(job = id, from = ?entry.state, to = ?next, "refusing illegal job transition");
                    return false;
                }
                entry.state = next;
                entry.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Publish a progress snapshot. Merge semantics: only the progress field
    /// and the update timestamp change. Ignored once the job is terminal.
    pub fn publish_progress(&self, id: &str, progress: JobProgress) {
        if let Some(mut entry) = self.jobs.get_mut(id) {
            if entry.state.is_terminal() {
                return;
            }
            entry.progress = Some(progress);
            entry.updated_at = Utc::now();
        }
    }

    /// Complete a running job with its result.
    pub fn complete(&self, id: &str, result: EvaluationReport) {
        if let Some(mut entry) = self.jobs.get_mut(id) {
            if !entry.state.can_transition_to(JobState::Completed) {
                return;
            }
            entry.state = JobState::Completed;
            entry.result = Some(result);
            entry.updated_at = Utc::now();
        }
    }

    /// Fail a running job with a categorical reason and message.
    pub fn fail(&self, id: &str, category: &str, message: &str) {
        if let Some(mut entry) = self.jobs.get_mut(id) {
            if !entry.state.can_transition_to(JobState::Failed) {
                return;
            }
            entry.state = JobState::Failed;
            entry.error = Some(JobFailure {
                category: category.to_string(),
                message: message.to_string(),
            });
            entry.updated_at = Utc::now();
        }
    }

    /// Drop every record whose last update is older than the TTL.
    pub fn reap_expired(&self) {
        let cutoff = Utc::now() - self.ttl;
        self.jobs.retain(|_, record| record.updated_at >= cutoff);
    }

    /// Number of live records, for diagnostics.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Submit an evaluation: registers a queued job, spawns the worker and
/// returns the job id immediately. Worker failures are captured into the job
/// record and never propagate across the poll boundary.
pub fn submit_evaluation(
    store: Arc<JobStore>,
    runner: Arc<EvaluationRunner>,
    config: EvaluationConfig,
) -> String {
    let id = store.create();
    let job_id = id.clone();

    tokio::spawn(async move {
        store.transition(&job_id, JobState::Running);
        info!(job = %job_id, "evaluation job started");

        let progress_store = store.clone();
        let progress_id = job_id.clone();
        let outcome = runner
            .run(&config, move |update: ProgressUpdate| {
                progress_store.publish_progress(&progress_id, update.into());
            })
            .await;

        match outcome {
            Ok(report) => {
                info!(job = %job_id, accepted = report.accepted, "evaluation job completed");
                store.complete(&job_id, report);
            }
            Err(err) => {
                warn!(job = %job_id, error = %err, "evaluation job failed");
                store.fail(&job_id, err.category(), &err.to_string());
            }
        }
    });

    id
}
