//! Lifecycle of a running lorekeeper.
//!
//! Wires the lorebook, session cache, renderer, orchestrator and scheduler
//! together, imports startup lorefiles in the background, and keeps the
//! scheduler in step with registry changes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::LoreConfig;
use crate::editor::LoreEditor;
use crate::error::LoreResult;
use crate::events::EventSubscriber;
use crate::lorebook::Lorebook;
use crate::orchestrator::{Injection, MessageContext, Orchestrator};
use crate::render::WildcardRenderer;
use crate::scheduler::LoreScheduler;
use crate::session::SessionCache;
use crate::store::open_store;

/// A fully wired lorekeeper instance.
///
/// # Example
///
/// ```ignore
/// use lorekeeper_core::{LoreConfig, LoreRuntime, MessageContext};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let runtime = LoreRuntime::new(LoreConfig::from_env()).await?;
///     runtime.start().await?;
///
///     let ctx = MessageContext::new("conv-1", "hello world");
///     if let Some(injection) = runtime.process_message(&ctx).await {
///         println!("{}", injection.apply_to("You are a helpful assistant."));
///     }
///
///     runtime.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct LoreRuntime {
    config: LoreConfig,
    lorebook: Arc<Lorebook>,
    sessions: Arc<SessionCache>,
    orchestrator: Orchestrator,
    editor: LoreEditor,
    scheduler: Option<Arc<LoreScheduler>>,
    /// Startup import; awaited once before the first message.
    import_task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    reload_task: Mutex<Option<JoinHandle<()>>>,
}

impl LoreRuntime {
    /// Build every component. Nothing runs until `start()`.
    pub async fn new(config: LoreConfig) -> LoreResult<Self> {
        debug!(
            storage = ?config.storage_path,
            lorefiles = config.lorefiles.len(),
            scheduler_enabled = config.enable_scheduler,
            "Creating LoreRuntime"
        );

        let store = open_store(config.storage_path.as_deref())?;
        let lorebook = Arc::new(Lorebook::new(store)?);
        let sessions = Arc::new(SessionCache::with_same_priority(config.allow_same_priority));
        let orchestrator = Orchestrator::new(
            lorebook.clone(),
            sessions.clone(),
            Arc::new(WildcardRenderer::new()),
        )
        .with_max_inject_count(config.max_inject_count);
        let editor = LoreEditor::new(lorebook.clone(), sessions.clone(), &config);

        let scheduler = if config.enable_scheduler {
            Some(Arc::new(LoreScheduler::new(lorebook.clone()).await?))
        } else {
            None
        };

        Ok(Self {
            config,
            lorebook,
            sessions,
            orchestrator,
            editor,
            scheduler,
            import_task: tokio::sync::Mutex::new(None),
            reload_task: Mutex::new(None),
        })
    }

    /// Start background work: startup import, scheduler, reload listener.
    pub async fn start(&self) -> LoreResult<()> {
        if let Some(scheduler) = &self.scheduler {
            let events = self.lorebook.subscribe();
            let handle = tokio::spawn(reload_on_change(events, scheduler.clone()));
            *self.reload_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        }

        if !self.config.lorefiles.is_empty() {
            let lorebook = self.lorebook.clone();
            let files = self.config.lorefiles.clone();
            let handle = tokio::task::spawn_blocking(move || import_lorefiles(&lorebook, &files));
            *self.import_task.lock().await = Some(handle);
        }

        if let Some(scheduler) = &self.scheduler {
            scheduler.start().await?;
        }

        info!(entries = self.lorebook.len(), "LoreRuntime started");
        Ok(())
    }

    /// Wait for the startup import to finish. Later calls return at once.
    pub async fn wait_until_ready(&self) {
        let mut task = self.import_task.lock().await;
        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Startup import task failed");
            }
        }
    }

    /// Run the full decision pipeline for one message.
    pub async fn process_message(&self, ctx: &MessageContext) -> Option<Injection> {
        self.wait_until_ready().await;
        self.orchestrator.process(ctx)
    }

    /// Stop the scheduler and the reload listener.
    pub async fn shutdown(&self) -> LoreResult<()> {
        debug!("Shutting down LoreRuntime");

        if let Some(handle) = self.reload_task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
        if let Some(scheduler) = &self.scheduler {
            scheduler.shutdown().await?;
        }

        info!("LoreRuntime stopped");
        Ok(())
    }

    pub fn lorebook(&self) -> Arc<Lorebook> {
        self.lorebook.clone()
    }

    pub fn sessions(&self) -> Arc<SessionCache> {
        self.sessions.clone()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn editor(&self) -> &LoreEditor {
        &self.editor
    }

    pub fn scheduler(&self) -> Option<&LoreScheduler> {
        self.scheduler.as_deref()
    }

    pub fn config(&self) -> &LoreConfig {
        &self.config
    }
}

/// Import each file in turn. A failing file is logged and skipped.
fn import_lorefiles(lorebook: &Lorebook, files: &[PathBuf]) {
    for path in files {
        match lorebook.import_file(path, false) {
            Ok(stats) => debug!(path = %path.display(), loaded = stats.loaded, "Startup lorefile imported"),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping startup lorefile"),
        }
    }
}

async fn reload_on_change(mut events: EventSubscriber, scheduler: Arc<LoreScheduler>) {
    while let Some(event) = events.recv().await {
        if !event.affects_schedule() {
            continue;
        }
        match scheduler.reload().await {
            Ok(jobs) => debug!(event = event.event_type(), jobs, "Schedules reloaded"),
            Err(e) => warn!(event = event.event_type(), error = %e, "Failed to reload schedules"),
        }
    }
}
