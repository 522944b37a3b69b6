//! Name-to-handler table exposing note operations as text-returning tools.
//!
//! Each tool takes a JSON object of arguments and answers with
//! human-readable text. Note errors such as a missing note are part of the
//! answer, not failures of the call.

use crate::domain::{Note, NoteUpdate};
use crate::service::{NoteError, NoteService};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Author recorded for changes made through tools when none is given.
pub const TOOL_AUTHOR: &str = "assistant";

/// Failures of the tool call itself.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

type Handler = fn(&NoteService, Value) -> Result<String, ToolError>;

/// One registered tool.
#[derive(Clone, Copy)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    handler: Handler,
}

/// The fixed set of tools, keyed by name.
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Tool>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Builds the table of every tool.
    pub fn new() -> Self {
        let tools = [
            Tool {
                name: "create_note",
                description: "Create a note: path, title, content, tags",
                handler: create_note,
            },
            Tool {
                name: "read_note",
                description: "Read a note by path",
                handler: read_note,
            },
            Tool {
                name: "update_note",
                description: "Update a note's title, content or tags, or move it with new_path",
                handler: update_note,
            },
            Tool {
                name: "delete_note",
                description: "Delete a note by path",
                handler: delete_note,
            },
            Tool {
                name: "list_notes",
                description: "List every note path",
                handler: list_notes,
            },
            Tool {
                name: "list_notes_in_folder",
                description: "List notes in a folder; empty folder lists top-level notes",
                handler: list_notes_in_folder,
            },
            Tool {
                name: "search_notes",
                description: "Full-text search over titles, tags and content",
                handler: search_notes,
            },
            Tool {
                name: "list_tags",
                description: "List all tags with note counts",
                handler: list_tags,
            },
            Tool {
                name: "find_by_tag",
                description: "List notes carrying a tag",
                handler: find_by_tag,
            },
            Tool {
                name: "get_backlinks",
                description: "List notes linking to a path",
                handler: get_backlinks,
            },
            Tool {
                name: "note_history",
                description: "List committed versions of a note",
                handler: note_history,
            },
        ];
        Self {
            tools: tools.into_iter().map(|t| (t.name, t)).collect(),
        }
    }

    /// Returns the tool names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    /// Returns every tool, sorted by name.
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    /// Runs the tool `name` with `args` (a JSON object, or null for none).
    pub fn call(&self, name: &str, service: &NoteService, args: Value) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        tracing::debug!(tool = name, "calling tool");
        (tool.handler)(service, args)
    }
}

// ===========================================
// Arguments
// ===========================================

#[derive(Deserialize)]
struct PathArgs {
    path: String,
}

#[derive(Deserialize)]
struct CreateArgs {
    path: String,
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    author: Option<String>,
}

#[derive(Deserialize)]
struct UpdateArgs {
    path: String,
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    new_path: Option<String>,
    author: Option<String>,
}

#[derive(Deserialize)]
struct DeleteArgs {
    path: String,
    author: Option<String>,
}

#[derive(Deserialize)]
struct FolderArgs {
    #[serde(default)]
    folder: String,
}

#[derive(Deserialize)]
struct QueryArgs {
    query: String,
}

#[derive(Deserialize)]
struct TagArgs {
    tag: String,
}

#[derive(Deserialize)]
struct HistoryArgs {
    path: String,
    limit: Option<usize>,
}

fn parse<T: DeserializeOwned>(tool: &'static str, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|source| ToolError::InvalidArguments { tool, source })
}

/// Renders a note error as the tool's answer.
pub fn describe_error(err: &NoteError) -> String {
    match err {
        NoteError::NotFound { path } => format!("Note not found: '{path}'"),
        NoteError::AlreadyExists { path } => format!("Note already exists: '{path}'"),
        NoteError::PathInvalid { path, reason } => format!("Invalid path '{path}': {reason}"),
        NoteError::DataVersionBehind { current, required } => format!(
            "Notes are at data version {current} but version {required} is required. \
             Run `notevault migrate` first."
        ),
        other => format!("Error: {other}"),
    }
}

fn answer<T>(result: Result<T, NoteError>, render: impl FnOnce(T) -> String) -> String {
    match result {
        Ok(value) => render(value),
        Err(err) => describe_error(&err),
    }
}

fn note_lines(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|n| format!("  - **{}** ({})", n.title(), n.path()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn path_lines(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

// ===========================================
// Handlers
// ===========================================

fn create_note(service: &NoteService, args: Value) -> Result<String, ToolError> {
    let args: CreateArgs = parse("create_note", args)?;
    let author = args.author.as_deref().unwrap_or(TOOL_AUTHOR);
    Ok(answer(
        service.create(&args.path, &args.title, &args.content, args.tags, author),
        |note| format!("Created note at '{}'", note.path()),
    ))
}

fn read_note(service: &NoteService, args: Value) -> Result<String, ToolError> {
    let args: PathArgs = parse("read_note", args)?;
    Ok(answer(service.read(&args.path), |note| {
        let mut out = format!("# {}\n\n**Path:** {}\n", note.title(), note.path());
        if !note.tags().is_empty() {
            out.push_str(&format!("**Tags:** {}\n", note.tags().join(", ")));
        }
        out.push_str(&format!(
            "**Modified:** {}\n\n{}",
            note.modified().format("%Y-%m-%d %H:%M:%S UTC"),
            note.content()
        ));
        out
    }))
}

fn update_note(service: &NoteService, args: Value) -> Result<String, ToolError> {
    let args: UpdateArgs = parse("update_note", args)?;
    let update = NoteUpdate {
        title: args.title,
        content: args.content,
        tags: args.tags,
        new_path: args.new_path,
    };
    if update.is_empty() {
        return Ok(format!("Nothing to update for '{}'", args.path));
    }
    let author = args.author.as_deref().unwrap_or(TOOL_AUTHOR);
    Ok(answer(service.update(&args.path, update, author), |note| {
        format!("Updated note at '{}'", note.path())
    }))
}

fn delete_note(service: &NoteService, args: Value) -> Result<String, ToolError> {
    let args: DeleteArgs = parse("delete_note", args)?;
    let author = args.author.as_deref().unwrap_or(TOOL_AUTHOR);
    Ok(answer(service.delete(&args.path, author), |()| {
        format!("Deleted note at '{}'", args.path.trim())
    }))
}

fn list_notes(service: &NoteService, _args: Value) -> Result<String, ToolError> {
    Ok(answer(service.list_notes(), |paths| {
        if paths.is_empty() {
            "No notes found.".to_string()
        } else {
            format!("Notes ({}):\n\n{}", paths.len(), path_lines(&paths))
        }
    }))
}

fn list_notes_in_folder(service: &NoteService, args: Value) -> Result<String, ToolError> {
    let args: FolderArgs = parse("list_notes_in_folder", args)?;
    let folder = args.folder.trim().trim_matches('/').to_string();
    Ok(answer(service.list_notes_in_folder(&folder), |paths| {
        match (folder.is_empty(), paths.is_empty()) {
            (true, true) => "No notes found in top-level.".to_string(),
            (false, true) => format!("No notes found in '{folder}'"),
            (true, false) => format!("Top-level notes:\n\n{}", path_lines(&paths)),
            (false, false) => format!("Notes in '{folder}':\n\n{}", path_lines(&paths)),
        }
    }))
}

fn search_notes(service: &NoteService, args: Value) -> Result<String, ToolError> {
    let args: QueryArgs = parse("search_notes", args)?;
    Ok(answer(service.search(&args.query), |notes| {
        if notes.is_empty() {
            format!("No notes found matching '{}'", args.query)
        } else {
            format!("Search results for '{}':\n\n{}", args.query, note_lines(&notes))
        }
    }))
}

fn list_tags(service: &NoteService, _args: Value) -> Result<String, ToolError> {
    Ok(answer(service.list_tags(), |counts| {
        if counts.is_empty() {
            return "No tags found.".to_string();
        }
        let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let lines: Vec<String> = sorted
            .iter()
            .map(|(tag, count)| format!("  - {tag} ({})", plural(*count, "note")))
            .collect();
        format!("Tags:\n\n{}", lines.join("\n"))
    }))
}

fn find_by_tag(service: &NoteService, args: Value) -> Result<String, ToolError> {
    let args: TagArgs = parse("find_by_tag", args)?;
    Ok(answer(service.find_by_tag(&args.tag), |notes| {
        if notes.is_empty() {
            format!("No notes found with tag '{}'", args.tag)
        } else {
            format!("Notes tagged '{}':\n\n{}", args.tag, note_lines(&notes))
        }
    }))
}

fn get_backlinks(service: &NoteService, args: Value) -> Result<String, ToolError> {
    let args: PathArgs = parse("get_backlinks", args)?;
    Ok(answer(service.backlinks(&args.path), |backlinks| {
        if backlinks.is_empty() {
            return format!("No backlinks to '{}'", args.path);
        }
        let lines: Vec<String> = backlinks
            .iter()
            .map(|b| {
                let numbers: Vec<String> = b.line_numbers.iter().map(ToString::to_string).collect();
                format!(
                    "  - {} ({}: {})",
                    b.source_path,
                    if b.link_count() == 1 { "line" } else { "lines" },
                    numbers.join(", ")
                )
            })
            .collect();
        format!("Backlinks to '{}':\n\n{}", args.path, lines.join("\n"))
    }))
}

fn note_history(service: &NoteService, args: Value) -> Result<String, ToolError> {
    let args: HistoryArgs = parse("note_history", args)?;
    Ok(answer(service.history(&args.path), |versions| {
        if versions.is_empty() {
            return format!("No history for '{}'", args.path);
        }
        let limit = args.limit.unwrap_or(usize::MAX);
        let lines: Vec<String> = versions
            .iter()
            .take(limit)
            .map(|v| {
                format!(
                    "  - {} {} {}: {}",
                    v.short_revision(),
                    v.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    v.author,
                    v.message
                )
            })
            .collect();
        format!("History of '{}':\n\n{}", args.path, lines.join("\n"))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, NoteService, ToolRegistry) {
        let dir = TempDir::new().unwrap();
        let config = Config::with_dirs(dir.path().join("notes"), dir.path().join("index"));
        (dir, NoteService::new(&config), ToolRegistry::new())
    }

    fn call(registry: &ToolRegistry, service: &NoteService, name: &str, args: Value) -> String {
        registry.call(name, service, args).unwrap()
    }

    #[test]
    fn registry_lists_every_tool() {
        let registry = ToolRegistry::new();
        assert_eq!(
            registry.names(),
            vec![
                "create_note",
                "delete_note",
                "find_by_tag",
                "get_backlinks",
                "list_notes",
                "list_notes_in_folder",
                "list_tags",
                "note_history",
                "read_note",
                "search_notes",
                "update_note",
            ]
        );
    }

    #[test]
    fn unknown_tool_and_bad_arguments_fail() {
        let (_dir, service, registry) = setup();
        assert!(matches!(
            registry.call("nope", &service, Value::Null),
            Err(ToolError::UnknownTool(_))
        ));
        assert!(matches!(
            registry.call("read_note", &service, json!({})),
            Err(ToolError::InvalidArguments { tool: "read_note", .. })
        ));
    }

    #[test]
    fn create_read_update_delete() {
        let (_dir, service, registry) = setup();
        let r = &registry;
        let s = &service;

        let out = call(r, s, "create_note", json!({"path": "test/note", "title": "Readable", "content": "Content here", "tags": ["a"]}));
        assert!(out.contains("Created note at 'test/note'"));

        let out = call(r, s, "read_note", json!({"path": "test/note"}));
        assert!(out.contains("# Readable"));
        assert!(out.contains("**Path:** test/note"));
        assert!(out.contains("Content here"));

        let out = call(r, s, "update_note", json!({"path": "test/note", "title": "Updated Title", "tags": ["new", "tags"]}));
        assert!(out.contains("Updated note at 'test/note'"));
        let out = call(r, s, "read_note", json!({"path": "test/note"}));
        assert!(out.contains("# Updated Title"));
        assert!(out.contains("new, tags"));

        let out = call(r, s, "delete_note", json!({"path": "test/note"}));
        assert!(out.contains("Deleted note at 'test/note'"));
        let out = call(r, s, "read_note", json!({"path": "test/note"}));
        assert!(out.contains("Note not found: 'test/note'"));
    }

    #[test]
    fn missing_notes_are_reported_as_text() {
        let (_dir, service, registry) = setup();
        for tool in ["read_note", "delete_note"] {
            let out = call(&registry, &service, tool, json!({"path": "nonexistent"}));
            assert_eq!(out, "Note not found: 'nonexistent'");
        }
        let out = call(&registry, &service, "update_note", json!({"path": "nonexistent", "title": "x"}));
        assert_eq!(out, "Note not found: 'nonexistent'");
    }

    #[test]
    fn listing_tools() {
        let (_dir, service, registry) = setup();
        assert!(call(&registry, &service, "list_notes", Value::Null).contains("No notes found"));
        assert!(
            call(&registry, &service, "list_notes_in_folder", json!({}))
                .contains("No notes found in top-level")
        );

        for path in ["top1", "projects/proj1", "other/note"] {
            service.create(path, path, "", vec![], "t").unwrap();
        }

        let out = call(&registry, &service, "list_notes", Value::Null);
        assert!(out.contains("top1") && out.contains("other/note"));

        let out = call(&registry, &service, "list_notes_in_folder", json!({"folder": ""}));
        assert!(out.contains("Top-level notes:"));
        assert!(!out.contains("projects/proj1"));

        let out = call(&registry, &service, "list_notes_in_folder", json!({"folder": "projects"}));
        assert!(out.contains("Notes in 'projects':"));
        assert!(out.contains("projects/proj1"));
        assert!(!out.contains("other/note"));

        let out = call(&registry, &service, "list_notes_in_folder", json!({"folder": "nonexistent"}));
        assert!(out.contains("No notes found in 'nonexistent'"));
    }

    #[test]
    fn search_and_tag_tools() {
        let (_dir, service, registry) = setup();
        let tags = |t: &[&str]| t.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        service.create("python-guide", "Python Guide", "", tags(&["python", "guide"]), "t").unwrap();
        service.create("python-basics", "Python Basics", "", tags(&["python", "tutorial"]), "t").unwrap();
        service.create("rust-intro", "Rust Intro", "", tags(&["rust"]), "t").unwrap();

        let out = call(&registry, &service, "search_notes", json!({"query": "guide"}));
        assert!(out.contains("Python Guide") && out.contains("python-guide"));
        let out = call(&registry, &service, "search_notes", json!({"query": "haskell"}));
        assert!(out.contains("No notes found matching"));

        let out = call(&registry, &service, "list_tags", Value::Null);
        assert!(out.contains("python (2 notes)"));
        assert!(out.contains("rust (1 note)"));
        assert!(out.find("python").unwrap() < out.find("guide").unwrap());

        let out = call(&registry, &service, "find_by_tag", json!({"tag": "python"}));
        assert!(out.contains("Python Basics") && out.contains("Python Guide"));
        assert!(!out.contains("Rust Intro"));
        let out = call(&registry, &service, "find_by_tag", json!({"tag": "nonexistent"}));
        assert!(out.contains("No notes found with tag 'nonexistent'"));
    }

    #[test]
    fn backlinks_and_history_tools() {
        let (_dir, service, registry) = setup();
        service.create("target", "Target", "", vec![], "alice").unwrap();
        service.create("source", "Source", "[[target]]\n[[target]]", vec![], "bob").unwrap();

        let out = call(&registry, &service, "get_backlinks", json!({"path": "target"}));
        assert!(out.contains("source (lines: 1, 2)"));
        let out = call(&registry, &service, "get_backlinks", json!({"path": "source"}));
        assert!(out.contains("No backlinks to 'source'"));

        let out = call(&registry, &service, "note_history", json!({"path": "target"}));
        assert!(out.contains("alice: Create note: target"));
        let out = call(&registry, &service, "note_history", json!({"path": "ghost"}));
        assert!(out.contains("No history for 'ghost'"));
    }
}
