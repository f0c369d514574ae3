//! lorekeeper-core - Lore entry activation engine.
//!
//! A lorebook holds contextual text snippets ("entries") with trigger
//! conditions. For every incoming message the engine decides which entries
//! activate, keeps them active per conversation for a while, and renders
//! them into the outgoing request.
//!
//! # Example
//!
//! ```ignore
//! use lorekeeper_core::{EntryDraft, LoreConfig, LoreRuntime, MessageContext};
//!
//! let runtime = LoreRuntime::new(LoreConfig::default()).await?;
//! runtime.start().await?;
//!
//! runtime
//!     .lorebook()
//!     .add_entry(EntryDraft::new("tavern", "The tavern is crowded.").keywords(["ale"]))?;
//!
//! let ctx = MessageContext::new("conv-1", "one ale please");
//! let injection = runtime.process_message(&ctx).await;
//! ```

pub mod config;
pub mod editor;
pub mod entry;
pub mod error;
pub mod events;
pub mod lorebook;
pub mod lorefile;
pub mod orchestrator;
pub mod record;
pub mod render;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod template;

// Re-export commonly used types
pub use config::LoreConfig;
pub use editor::{BatchOutcome, ClearOutcome, EntryFilter, LoreEditor};
pub use entry::{LoreEntry, ScopeQuery, ADMIN_SCOPE};
pub use error::{ErrorCode, LoreError, LoreResult};
pub use events::{EventBus, EventSubscriber, LorebookEvent, UpdateKind};
pub use lorebook::Lorebook;
pub use lorefile::{ImportStats, LoreFile, LoreFormat};
pub use orchestrator::{Injection, MessageContext, Orchestrator};
pub use record::{EntryDraft, LoreRecord};
pub use render::{RenderContext, Renderer, WildcardRenderer};
pub use runtime::LoreRuntime;
pub use scheduler::LoreScheduler;
pub use session::SessionCache;
pub use store::{open_store, EntryStore, FileEntryStore, MemoryEntryStore, SqliteEntryStore};
pub use template::{Template, TemplateDefaults};
