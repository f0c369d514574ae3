//! Slash commands for the interactive shell.
//!
//! Any line starting with `/` is a command; everything else is a chat
//! message from the current user in the current conversation.

use std::path::PathBuf;

use lorekeeper_core::{
    ClearOutcome, EntryDraft, EntryFilter, LoreRuntime, MessageContext,
};

pub const HELP: &str = "\
Commands:
  /list [enabled|disabled|<name>]   show entries
  /add <name> <content...>          add an entry (keywords default to the name)
  /del <name...>                    delete entries
  /keywords <name> <pattern...>     replace trigger patterns
  /priority <name> <number>         set priority
  /enable <name...>                 admit this conversation to the entries
  /disable <name...>                withdraw this conversation from the entries
  /state                            active entries in this conversation
  /clear [name...]                  clear active entries (all when no names)
  /import <path> [--override]       import a lorefile
  /export <file> [name...]          export entries (all when no names)
  /conv <id>                        switch conversation
  /user <id> [display name]         switch user
  /group [id]                       set or unset the group
  /admin on|off                     toggle the admin flag
  /help                             this text
  /quit                             exit
Anything else is sent as a message.";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List(EntryFilter),
    Add { name: String, content: String },
    Delete(Vec<String>),
    Keywords { name: String, patterns: Vec<String> },
    Priority { name: String, priority: i32 },
    Enable(Vec<String>),
    Disable(Vec<String>),
    State,
    Clear(Vec<String>),
    Import { path: PathBuf, override_existing: bool },
    Export { file: String, names: Vec<String> },
    Conversation(String),
    User { id: String, name: Option<String> },
    Group(Option<String>),
    Admin(bool),
    Help,
    Quit,
    Message(String),
}

impl Command {
    /// Parse one line. `Err` carries a usage hint.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Message(line.to_string()));
        };

        let (verb, tail) = match rest.split_once(char::is_whitespace) {
            Some((verb, tail)) => (verb, tail.trim()),
            None => (rest, ""),
        };
        let args: Vec<String> = tail.split_whitespace().map(str::to_string).collect();

        let command = match verb {
            "list" => Self::List(match args.first().map(String::as_str) {
                None => EntryFilter::All,
                Some("enabled") => EntryFilter::Enabled,
                Some("disabled") => EntryFilter::Disabled,
                Some(name) => EntryFilter::Named(name.to_string()),
            }),
            "add" => {
                let (name, content) = tail
                    .split_once(char::is_whitespace)
                    .ok_or("usage: /add <name> <content...>")?;
                Self::Add {
                    name: name.to_string(),
                    content: content.trim().to_string(),
                }
            }
            "del" => Self::Delete(non_empty(args, "usage: /del <name...>")?),
            "keywords" => {
                let mut args = args.into_iter();
                let name = args.next().ok_or("usage: /keywords <name> <pattern...>")?;
                let patterns: Vec<String> = args.collect();
                if patterns.is_empty() {
                    return Err("usage: /keywords <name> <pattern...>".to_string());
                }
                Self::Keywords { name, patterns }
            }
            "priority" => match args.as_slice() {
                [name, number] => Self::Priority {
                    name: name.clone(),
                    priority: number
                        .parse()
                        .map_err(|_| "priority must be an integer".to_string())?,
                },
                _ => return Err("usage: /priority <name> <number>".to_string()),
            },
            "enable" => Self::Enable(non_empty(args, "usage: /enable <name...>")?),
            "disable" => Self::Disable(non_empty(args, "usage: /disable <name...>")?),
            "state" => Self::State,
            "clear" => Self::Clear(args),
            "import" => {
                let override_existing = args.iter().any(|a| a == "--override");
                let path = args
                    .iter()
                    .find(|a| *a != "--override")
                    .ok_or("usage: /import <path> [--override]")?;
                Self::Import {
                    path: PathBuf::from(path),
                    override_existing,
                }
            }
            "export" => {
                let mut args = args.into_iter();
                let file = args.next().ok_or("usage: /export <file> [name...]")?;
                Self::Export {
                    file,
                    names: args.collect(),
                }
            }
            "conv" => Self::Conversation(args.into_iter().next().ok_or("usage: /conv <id>")?),
            "user" => {
                let (id, name) = match tail.split_once(char::is_whitespace) {
                    Some((id, name)) => (id, Some(name.trim().to_string())),
                    None if !tail.is_empty() => (tail, None),
                    None => return Err("usage: /user <id> [display name]".to_string()),
                };
                Self::User {
                    id: id.to_string(),
                    name,
                }
            }
            "group" => Self::Group(args.into_iter().next()),
            "admin" => match args.first().map(String::as_str) {
                Some("on") => Self::Admin(true),
                Some("off") => Self::Admin(false),
                _ => return Err("usage: /admin on|off".to_string()),
            },
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '/{}', try /help", other)),
        };
        Ok(command)
    }
}

fn non_empty(args: Vec<String>, usage: &str) -> Result<Vec<String>, String> {
    if args.is_empty() {
        Err(usage.to_string())
    } else {
        Ok(args)
    }
}

/// Who is talking, and where.
#[derive(Debug, Clone)]
pub struct Identity {
    pub conversation_id: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub group_id: Option<String>,
    pub is_admin: bool,
}

impl Identity {
    /// Read the starting identity from `LORE_CONVERSATION`, `LORE_USER_ID`,
    /// `LORE_USER_NAME` and `LORE_ADMIN`.
    pub fn from_env() -> Self {
        Self {
            conversation_id: std::env::var("LORE_CONVERSATION").unwrap_or_else(|_| "cli".into()),
            user_id: std::env::var("LORE_USER_ID").unwrap_or_else(|_| "local".into()),
            user_name: std::env::var("LORE_USER_NAME").ok(),
            group_id: None,
            is_admin: std::env::var("LORE_ADMIN").is_ok(),
        }
    }

    pub fn message(&self, text: &str) -> MessageContext {
        let mut ctx = MessageContext::new(&self.conversation_id, text)
            .with_user(&self.user_id, self.user_name.clone())
            .admin(self.is_admin);
        ctx.group_id = self.group_id.clone();
        ctx
    }
}

/// Outcome of running one command.
pub enum Flow {
    Continue(String),
    Quit,
}

/// Run a command against the runtime and describe the result.
pub async fn execute(runtime: &LoreRuntime, identity: &mut Identity, command: Command) -> Flow {
    let editor = runtime.editor();
    let reply = match command {
        Command::List(filter) => {
            let entries = editor.view_entries(&filter);
            if entries.is_empty() {
                "No entries found".to_string()
            } else {
                lorekeeper_core::LoreEditor::render_entries(&entries)
            }
        }
        Command::Add { name, content } => {
            match editor.add_entry(&name, &content, EntryDraft::default()) {
                Ok(entry) => format!("Added entry: {}", entry.name()),
                Err(e) => format!("Failed to add entry: {}", e),
            }
        }
        Command::Delete(names) => {
            let outcome = editor.delete_entries(&names);
            batch_reply("Deleted", outcome.done, outcome.not_found)
        }
        Command::Keywords { name, patterns } => {
            let count = patterns.len();
            if editor.set_keywords(&name, patterns) {
                format!("Entry [{}] now has {} trigger pattern(s)", name, count)
            } else {
                format!("Entry not found: {}", name)
            }
        }
        Command::Priority { name, priority } => {
            if editor.set_priority(&name, priority) {
                format!("Entry [{}] priority set to {}", name, priority)
            } else {
                format!("Entry not found: {}", name)
            }
        }
        Command::Enable(names) => {
            let outcome = editor.enable_for_conversation(&identity.conversation_id, &names);
            batch_reply("Enabled here", outcome.done, outcome.not_found)
        }
        Command::Disable(names) => {
            let outcome = editor.disable_for_conversation(&identity.conversation_id, &names);
            batch_reply("Disabled here", outcome.done, outcome.not_found)
        }
        Command::State => {
            let lines = editor.session_state(&identity.conversation_id);
            if lines.is_empty() {
                "No active entries in this conversation".to_string()
            } else {
                format!("Active entries:\n{}", lines.join("\n"))
            }
        }
        Command::Clear(names) => match editor.clear_session(&identity.conversation_id, &names) {
            ClearOutcome::All(count) => format!("Cleared {} active entries", count),
            ClearOutcome::Named(removed) if removed.is_empty() => {
                "None of those entries are active here".to_string()
            }
            ClearOutcome::Named(removed) => format!("Cleared: {}", removed.join(", ")),
        },
        Command::Import {
            path,
            override_existing,
        } => match editor.import_file(&path, override_existing) {
            Ok(stats) => format!(
                "Imported {}: {} loaded, {} replaced, {} skipped, {} failed",
                path.display(),
                stats.loaded,
                stats.replaced,
                stats.skipped,
                stats.failed
            ),
            Err(e) => format!("Import failed: {}", e),
        },
        Command::Export { file, names } => match editor.export_file(&file, &names) {
            Ok(path) => format!("Exported to {}", path.display()),
            Err(e) => format!("Export failed: {}", e),
        },
        Command::Conversation(id) => {
            identity.conversation_id = id;
            format!("Now in conversation {}", identity.conversation_id)
        }
        Command::User { id, name } => {
            identity.user_id = id;
            identity.user_name = name;
            format!("Now speaking as {}", identity.user_id)
        }
        Command::Group(group) => {
            identity.group_id = group;
            match &identity.group_id {
                Some(id) => format!("Group set to {}", id),
                None => "Group unset".to_string(),
            }
        }
        Command::Admin(on) => {
            identity.is_admin = on;
            format!("Admin {}", if on { "on" } else { "off" })
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Flow::Quit,
        Command::Message(text) => {
            let ctx = identity.message(&text);
            match runtime.process_message(&ctx).await {
                Some(injection) => format!(
                    "[lore: {}]\n{}",
                    injection.entries.join(", "),
                    injection.text
                ),
                None => "[no lore]".to_string(),
            }
        }
    };
    Flow::Continue(reply)
}

fn batch_reply(verb: &str, done: Vec<String>, not_found: Vec<String>) -> String {
    let mut lines = Vec::new();
    if !done.is_empty() {
        lines.push(format!("{}: {}", verb, done.join(", ")));
    }
    if !not_found.is_empty() {
        lines.push(format!("Not found: {}", not_found.join(", ")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper_core::LoreConfig;

    #[test]
    fn test_parse_messages_and_commands() {
        assert_eq!(
            Command::parse("  hello there ").unwrap(),
            Command::Message("hello there".into())
        );
        assert_eq!(Command::parse("/list").unwrap(), Command::List(EntryFilter::All));
        assert_eq!(
            Command::parse("/list tavern").unwrap(),
            Command::List(EntryFilter::Named("tavern".into()))
        );
        assert_eq!(
            Command::parse("/add moon The moon is   full.").unwrap(),
            Command::Add {
                name: "moon".into(),
                content: "The moon is   full.".into()
            }
        );
        assert_eq!(
            Command::parse("/import book.yaml --override").unwrap(),
            Command::Import {
                path: PathBuf::from("book.yaml"),
                override_existing: true
            }
        );
        assert_eq!(
            Command::parse("/user 42 Ada Lovelace").unwrap(),
            Command::User {
                id: "42".into(),
                name: Some("Ada Lovelace".into())
            }
        );
        assert_eq!(Command::parse("/clear").unwrap(), Command::Clear(Vec::new()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("/add lonely").is_err());
        assert!(Command::parse("/priority a high").is_err());
        assert!(Command::parse("/keywords a").is_err());
        assert!(Command::parse("/del").is_err());
        assert!(Command::parse("/admin maybe").is_err());
        assert!(Command::parse("/frobnicate").unwrap_err().contains("/help"));
    }

    #[tokio::test]
    async fn test_execute_round_trip() {
        let runtime = LoreRuntime::new(LoreConfig::default().with_scheduler(false))
            .await
            .unwrap();
        runtime.start().await.unwrap();
        let mut identity = Identity {
            conversation_id: "c1".into(),
            user_id: "u1".into(),
            user_name: Some("Ada".into()),
            group_id: None,
            is_admin: false,
        };

        let reply = |flow: Flow| match flow {
            Flow::Continue(text) => text,
            Flow::Quit => panic!("unexpected quit"),
        };

        let added = reply(
            execute(&runtime, &mut identity, Command::parse("/add moon Hi {user}").unwrap()).await,
        );
        assert_eq!(added, "Added entry: moon");

        let injected = reply(
            execute(&runtime, &mut identity, Command::parse("look at the moon").unwrap()).await,
        );
        assert_eq!(injected, "[lore: moon]\n## [moon]\nHi Ada(u1)");

        let state = reply(execute(&runtime, &mut identity, Command::State).await);
        assert!(state.contains("1. moon"));

        let cleared = reply(execute(&runtime, &mut identity, Command::Clear(Vec::new())).await);
        assert_eq!(cleared, "Cleared 1 active entries");

        assert!(matches!(
            execute(&runtime, &mut identity, Command::Quit).await,
            Flow::Quit
        ));
        runtime.shutdown().await.unwrap();
    }
}
