use dashmap::{mapref::entry::Entry, DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::OrderStagingCache;
use crate::client::JobBackend;
use crate::config::PollerConfig;
use crate::constants::{defaults, events};
use crate::error::{FreightError, FreightResult};
use crate::logging::{log_error, log_job_operation};
use crate::models::{FileRef, JobKind, JobState, JobStatus, ScrapeConfig};

/// Progress notifications; every subscriber sees every event
#[derive(Debug, Clone, PartialEq)]
pub enum PollerEvent {
    /// Non-terminal snapshot observed on a poll
    Status(JobStatus),
    /// Terminal snapshot; polling for this job has stopped
    Finished(JobStatus),
    /// Attempt ceiling reached before a terminal status
    TimedOut {
        job_id: String,
        kind: JobKind,
        attempts: u32,
    },
    FollowUpSubmitted {
        import_job_id: String,
        scrape_job_id: String,
    },
    /// The import result stands; the scrape is not retried
    FollowUpFailed {
        import_job_id: String,
        error: FreightError,
    },
}

type JobKey = (JobKind, String);

struct PollerShared {
    backend: Arc<dyn JobBackend>,
    cache: Arc<OrderStagingCache>,
    config: PollerConfig,
    active: DashMap<JobKey, JoinHandle<()>>,
    /// Import jobs whose scrape follow-up has already been submitted
    chained: DashSet<String>,
    events: broadcast::Sender<PollerEvent>,
    closed: AtomicBool,
}

/// Owner of every poll loop it starts.
///
/// Dropping the poller (or calling [`AsyncJobPoller::shutdown`]) aborts all
/// loops whether or not their jobs have finished. Share it behind an `Arc`
/// rather than cloning.
pub struct AsyncJobPoller {
    shared: Arc<PollerShared>,
}

impl std::fmt::Debug for AsyncJobPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncJobPoller")
            .field("config", &self.shared.config)
            .field("active", &self.shared.active.len())
            .field("closed", &self.shared.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl AsyncJobPoller {
    pub fn new(
        backend: Arc<dyn JobBackend>,
        cache: Arc<OrderStagingCache>,
        config: PollerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(defaults::EVENT_BUFFER_SIZE);
        Self {
            shared: Arc::new(PollerShared {
                backend,
                cache,
                config,
                active: DashMap::new(),
                chained: DashSet::new(),
                events,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollerEvent> {
        self.shared.events.subscribe()
    }

    /// Begin polling `job_id`. Returns false when a loop for it is already
    /// running or the poller has been shut down.
    pub fn start(&self, job_id: impl Into<String>, kind: JobKind) -> bool {
        spawn_loop(&self.shared, job_id.into(), kind, None)
    }

    /// Poll an import job and, once it succeeds, submit exactly one scrape
    /// job with `follow_up` and poll that too
    pub fn start_with_follow_up(&self, import_job_id: impl Into<String>, follow_up: ScrapeConfig) -> bool {
        spawn_loop(&self.shared, import_job_id.into(), JobKind::Import, Some(follow_up))
    }

    /// Submit an import file and start polling the returned job
    pub async fn submit_import(
        &self,
        file: &FileRef,
        follow_up: Option<ScrapeConfig>,
    ) -> FreightResult<String> {
        self.ensure_open()?;
        let submitted = self.shared.backend.submit_import(file).await?;
        log_job_operation("submit", &submitted.job_id, "import", "submitted", Some(&file.name));
        spawn_loop(&self.shared, submitted.job_id.clone(), JobKind::Import, follow_up);
        Ok(submitted.job_id)
    }

    /// Submit a scrape job directly and start polling it
    pub async fn submit_scrape(&self, config: &ScrapeConfig) -> FreightResult<String> {
        self.ensure_open()?;
        let submitted = self.shared.backend.submit_scrape(config).await?;
        log_job_operation("submit", &submitted.job_id, "scrape", "submitted", None);
        spawn_loop(&self.shared, submitted.job_id.clone(), JobKind::Scrape, None);
        Ok(submitted.job_id)
    }

    pub fn is_polling(&self, job_id: &str, kind: JobKind) -> bool {
        self.shared.active.contains_key(&(kind, job_id.to_string()))
    }

    pub fn active_count(&self) -> usize {
        self.shared.active.len()
    }

    /// Stop one loop; returns whether it was running
    pub fn stop(&self, job_id: &str, kind: JobKind) -> bool {
        match self.shared.active.remove(&(kind, job_id.to_string())) {
            Some((_, handle)) => {
                handle.abort();
                log_job_operation("stop", job_id, &kind.to_string(), "cancelled", None);
                true
            }
            None => false,
        }
    }

    /// Abort every loop and refuse new ones
    pub fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        let keys: Vec<JobKey> = self
            .shared
            .active
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for key in keys {
            if let Some((_, handle)) = self.shared.active.remove(&key) {
                handle.abort();
            }
        }
        debug!("Job poller shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> FreightResult<()> {
        if self.is_shut_down() {
            return Err(FreightError::StateTransitionError(
                "Job poller has been shut down".to_string(),
            ));
        }
        Ok(())
    }
}

impl Drop for AsyncJobPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_loop(
    shared: &Arc<PollerShared>,
    job_id: String,
    kind: JobKind,
    follow_up: Option<ScrapeConfig>,
) -> bool {
    if shared.closed.load(Ordering::SeqCst) {
        return false;
    }

    match shared.active.entry((kind, job_id.clone())) {
        Entry::Occupied(_) => {
            debug!(job_id = %job_id, kind = %kind, "Job already being polled");
            false
        }
        Entry::Vacant(slot) => {
            let handle = tokio::spawn(poll_loop(shared.clone(), job_id.clone(), kind, follow_up));
            slot.insert(handle);
            log_job_operation("start", &job_id, &kind.to_string(), "polling", None);
            true
        }
    }
}

async fn poll_loop(
    shared: Arc<PollerShared>,
    job_id: String,
    kind: JobKind,
    follow_up: Option<ScrapeConfig>,
) {
    let interval = shared.config.interval();
    let max_attempts = shared.config.max_attempts;
    let mut attempts = 0u32;

    loop {
        if attempts >= max_attempts {
            warn!(job_id = %job_id, kind = %kind, attempts = attempts, "Job polling ceiling reached");
            let _ = shared.events.send(PollerEvent::TimedOut {
                job_id: job_id.clone(),
                kind,
                attempts,
            });
            break;
        }

        tokio::time::sleep(interval).await;
        attempts += 1;

        let status = match shared.backend.list_jobs(kind).await {
            Ok(statuses) => statuses.into_iter().find(|status| status.job_id == job_id),
            Err(e) => {
                // Counted against the ceiling, retried on the next tick
                warn!(job_id = %job_id, kind = %kind, error = %e, "Job status poll failed");
                continue;
            }
        };

        let Some(status) = status else {
            debug!(job_id = %job_id, kind = %kind, "Job not listed yet");
            continue;
        };

        debug!(
            job_id = %job_id,
            kind = %kind,
            state = %status.state,
            progress = status.progress,
            event = events::JOB_STATUS_OBSERVED,
            "Job status observed"
        );

        if !status.is_terminal() {
            let _ = shared.events.send(PollerEvent::Status(status));
            continue;
        }

        log_job_operation(
            events::JOB_FINISHED,
            &job_id,
            &kind.to_string(),
            &status.state.to_string(),
            None,
        );
        if let Err(e) = shared.cache.record_job_status(&status) {
            log_error("AsyncJobPoller", "record_job_status", &e.to_string(), Some(&job_id));
        }

        let succeeded = status.state == JobState::Succeeded;
        let _ = shared.events.send(PollerEvent::Finished(status));

        if succeeded && kind == JobKind::Import {
            if let Some(config) = follow_up.as_ref() {
                chain_scrape(&shared, &job_id, config).await;
            }
        }
        break;
    }

    shared.active.remove(&(kind, job_id));
}

async fn chain_scrape(shared: &Arc<PollerShared>, import_job_id: &str, config: &ScrapeConfig) {
    if !shared.chained.insert(import_job_id.to_string()) {
        debug!(import_job_id = %import_job_id, "Scrape follow-up already submitted");
        return;
    }

    match shared.backend.submit_scrape(config).await {
        Ok(submitted) => {
            log_job_operation(
                events::JOB_FOLLOW_UP_SUBMITTED,
                &submitted.job_id,
                "scrape",
                "submitted",
                Some(import_job_id),
            );
            let _ = shared.events.send(PollerEvent::FollowUpSubmitted {
                import_job_id: import_job_id.to_string(),
                scrape_job_id: submitted.job_id.clone(),
            });
            spawn_loop(shared, submitted.job_id, JobKind::Scrape, None);
        }
        Err(e) => {
            log_error(
                "AsyncJobPoller",
                "submit_scrape",
                &e.to_string(),
                Some(import_job_id),
            );
            let _ = shared.events.send(PollerEvent::FollowUpFailed {
                import_job_id: import_job_id.to_string(),
                error: e,
            });
        }
    }
}
