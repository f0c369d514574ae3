//! Per-message decision pipeline.
//!
//! A message goes through two stages:
//! 1. decide: gate every lorebook entry and attach the winners to the
//!    conversation's session
//! 2. consume: read the session back, render what the caller may see and
//!    count one injection for each rendered entry

use chrono::Local;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

use crate::entry::ScopeQuery;
use crate::lorebook::Lorebook;
use crate::render::{RenderContext, Renderer};
use crate::session::SessionCache;

/// Identity and text of one incoming message.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub text: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub group_id: Option<String>,
    pub conversation_id: String,
    pub is_admin: bool,
}

impl MessageContext {
    pub fn new(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the sender.
    pub fn with_user(mut self, id: impl Into<String>, name: Option<String>) -> Self {
        self.user_id = Some(id.into());
        self.user_name = name;
        self
    }

    /// Builder method to set the group.
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Builder method to set the admin flag.
    pub fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// The caller as the scope gate sees it. The conversation id doubles as
    /// the session token.
    pub fn scope_query(&self) -> ScopeQuery<'_> {
        ScopeQuery {
            user_id: self.user_id.as_deref(),
            group_id: self.group_id.as_deref(),
            session_id: Some(self.conversation_id.as_str()),
            is_admin: self.is_admin,
        }
    }
}

/// Rendered lore for one outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct Injection {
    /// Names of the rendered entries, in render order.
    pub entries: Vec<String>,
    /// `## [name]` sections joined by blank lines.
    pub text: String,
}

impl Injection {
    /// Append the lore block to a system prompt.
    pub fn apply_to(&self, system_prompt: &str) -> String {
        format!("{}\n\n{}\n\n", system_prompt, self.text)
    }
}

/// Runs the decide and consume stages against shared state.
pub struct Orchestrator {
    lorebook: Arc<Lorebook>,
    sessions: Arc<SessionCache>,
    renderer: Arc<dyn Renderer>,
    max_inject_count: usize,
}

impl Orchestrator {
    pub fn new(
        lorebook: Arc<Lorebook>,
        sessions: Arc<SessionCache>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            lorebook,
            sessions,
            renderer,
            max_inject_count: 0,
        }
    }

    /// Cap the number of entries rendered per request; 0 is unlimited.
    pub fn with_max_inject_count(mut self, max: usize) -> Self {
        self.max_inject_count = max;
        self
    }

    /// Both stages for one message.
    pub fn process(&self, ctx: &MessageContext) -> Option<Injection> {
        self.decide(ctx);
        self.consume(ctx)
    }

    /// Gate every entry and attach the winners to the session.
    ///
    /// Returns the names that activated.
    pub fn decide(&self, ctx: &MessageContext) -> Vec<String> {
        self.decide_with_rng(ctx, &mut rand::thread_rng())
    }

    pub fn decide_with_rng<R: Rng>(&self, ctx: &MessageContext, rng: &mut R) -> Vec<String> {
        let winners = self
            .lorebook
            .activate_matching(&ctx.text, &ctx.scope_query(), rng);
        let names: Vec<String> = winners.iter().map(|e| e.name().to_string()).collect();

        if !winners.is_empty() {
            debug!(conversation = %ctx.conversation_id, activated = ?names, "Entries activated");
            self.sessions.activate(&ctx.conversation_id, winners);
        }
        names
    }

    /// Render the conversation's active entries and count the injection.
    ///
    /// Entries whose scope no longer admits the caller are skipped without
    /// being consumed, as are entries beyond the injection cap.
    pub fn consume(&self, ctx: &MessageContext) -> Option<Injection> {
        let active = self.sessions.get_sorted_active(&ctx.conversation_id);
        if active.is_empty() {
            return None;
        }

        let query = ctx.scope_query();
        let (mut visible, hidden): (Vec<_>, Vec<_>) =
            active.into_iter().partition(|e| e.allow_scope(&query));
        for entry in &hidden {
            debug!(entry = %entry.name(), "Scope no longer admits caller, skipped");
        }

        if self.max_inject_count > 0 && visible.len() > self.max_inject_count {
            let dropped: Vec<String> = visible
                .drain(self.max_inject_count..)
                .map(|e| e.name().to_string())
                .collect();
            debug!(max = self.max_inject_count, dropped = ?dropped, "Injection cap reached");
        }
        if visible.is_empty() {
            return None;
        }

        let now = Local::now();
        let mut names = Vec::with_capacity(visible.len());
        let mut sections = Vec::with_capacity(visible.len());
        for entry in &visible {
            let render_ctx = RenderContext {
                user_id: ctx.user_id.as_deref(),
                user_name: ctx.user_name.as_deref(),
                group_id: ctx.group_id.as_deref(),
                conversation_id: &ctx.conversation_id,
                message: &ctx.text,
                entry_name: entry.name(),
                now,
            };
            let rendered = self.renderer.render(entry.content(), &render_ctx);
            sections.push(format!("## [{}]\n{}", entry.name(), rendered));
            names.push(entry.name().to_string());
        }

        self.sessions.consume(&ctx.conversation_id, &names);
        debug!(conversation = %ctx.conversation_id, injected = ?names, "Lore injected");

        Some(Injection {
            entries: names,
            text: sections.join("\n\n"),
        })
    }
}
