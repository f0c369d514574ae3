//! Time-based eligibility for lore entries.
//!
//! Each enabled entry with a valid five-field cron schedule gets one
//! recurring job, keyed by entry name. A firing job only grants the entry
//! schedule eligibility; activation still happens on the next message that
//! passes the entry's scope and probability gates.
//!
//! Schedules are read in local time, like a crontab.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::entry::LoreEntry;
use crate::error::{LoreError, LoreResult};
use crate::lorebook::Lorebook;

/// Fields in a standard crontab expression (minute hour dom month dow).
const CRON_FIELDS: usize = 5;

/// Scheduler turning cron schedules into eligibility grants.
pub struct LoreScheduler {
    scheduler: JobScheduler,
    lorebook: Arc<Lorebook>,
    /// Entry name to job id.
    job_map: RwLock<HashMap<String, Uuid>>,
    running: RwLock<bool>,
}

impl LoreScheduler {
    pub async fn new(lorebook: Arc<Lorebook>) -> LoreResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| LoreError::scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            lorebook,
            job_map: RwLock::new(HashMap::new()),
            running: RwLock::new(false),
        })
    }

    /// Register every schedule and start ticking. Starting twice is a no-op.
    pub async fn start(&self) -> LoreResult<()> {
        let mut running = self.running.write().await;
        if *running {
            return Ok(());
        }

        let count = self.register_all().await?;
        self.scheduler
            .start()
            .await
            .map_err(|e| LoreError::scheduler(format!("Failed to start scheduler: {}", e)))?;
        *running = true;

        info!(jobs = count, "Lore scheduler started");
        Ok(())
    }

    /// Stop future firings. In-flight jobs are allowed to finish.
    pub async fn shutdown(&self) -> LoreResult<()> {
        let mut running = self.running.write().await;
        if *running {
            let mut scheduler = self.scheduler.clone();
            scheduler
                .shutdown()
                .await
                .map_err(|e| LoreError::scheduler(format!("Failed to shutdown scheduler: {}", e)))?;
            *running = false;
            info!("Lore scheduler stopped");
        }
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Number of registered jobs.
    pub async fn job_count(&self) -> usize {
        self.job_map.read().await.len()
    }

    /// Names of entries that currently have a job, sorted.
    pub async fn scheduled_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = self.job_map.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Next local time the named entry's job fires, if it has one.
    pub async fn next_fire(&self, name: &str) -> LoreResult<Option<DateTime<Local>>> {
        let Some(job_id) = self.job_map.read().await.get(name).copied() else {
            return Ok(None);
        };
        let mut scheduler = self.scheduler.clone();
        let next = scheduler
            .next_tick_for_job(job_id)
            .await
            .map_err(|e| LoreError::scheduler(format!("Failed to read next tick: {}", e)))?;
        Ok(next.map(|tick| tick.with_timezone(&Local)))
    }

    /// Drop every job and re-scan the lorebook.
    ///
    /// Does nothing until the scheduler has been started.
    pub async fn reload(&self) -> LoreResult<usize> {
        if !self.is_running().await {
            return Ok(0);
        }
        let count = self.register_all().await?;
        debug!(jobs = count, "Lore scheduler reloaded");
        Ok(count)
    }

    async fn register_all(&self) -> LoreResult<usize> {
        let mut job_map = self.job_map.write().await;
        for (_, job_id) in job_map.drain() {
            self.scheduler
                .remove(&job_id)
                .await
                .map_err(|e| LoreError::scheduler(format!("Failed to remove job: {}", e)))?;
        }

        for entry in self.lorebook.list_enabled() {
            let Some(job) = self.build_job(&entry) else {
                continue;
            };

            let job_id = self
                .scheduler
                .add(job)
                .await
                .map_err(|e| LoreError::scheduler(format!("Failed to add job: {}", e)))?;
            job_map.insert(entry.name().to_string(), job_id);
            info!(entry = %entry.name(), schedule = ?entry.schedule(), "Registered lore schedule");
        }
        Ok(job_map.len())
    }

    /// Build the job for an entry, or `None` when it has no usable schedule.
    fn build_job(&self, entry: &LoreEntry) -> Option<Job> {
        let schedule = entry.schedule()?;
        let expression = match to_job_expression(schedule) {
            Some(expression) => expression,
            None => {
                warn!(entry = %entry.name(), schedule = %schedule, "Invalid cron schedule, ignored");
                return None;
            }
        };

        let lorebook = self.lorebook.clone();
        let name = entry.name().to_string();
        let job = Job::new_async_tz(expression.as_str(), Local, move |_uuid, _lock| {
            let lorebook = lorebook.clone();
            let name = name.clone();
            Box::pin(async move {
                fire(&lorebook, &name);
            })
        });

        match job {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(entry = %entry.name(), schedule = %schedule, error = %e, "Invalid cron schedule, ignored");
                None
            }
        }
    }

    /// Run the job body for an entry right now.
    pub fn fire(&self, name: &str) -> bool {
        fire(&self.lorebook, name)
    }
}

/// Grant eligibility to a still-enabled entry.
fn fire(lorebook: &Lorebook, name: &str) -> bool {
    match lorebook.get_entry(name) {
        Some(entry) if entry.enabled() => {
            let granted = lorebook.trigger_schedule(name);
            debug!(entry = %name, "Lore schedule fired, waiting for a message");
            granted
        }
        _ => false,
    }
}

/// Turn a five-field crontab expression into the seconds-first form the
/// job scheduler expects.
fn to_job_expression(schedule: &str) -> Option<String> {
    let fields: Vec<&str> = schedule.split_whitespace().collect();
    if fields.len() != CRON_FIELDS {
        return None;
    }
    Some(format!("0 {}", fields.join(" ")))
}
