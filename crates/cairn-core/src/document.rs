//! Format-preserving manifest document
//!
//! `ManifestDocument` keeps the manifest text verbatim and locates block
//! mapping keys by indentation, so new entries can be spliced into
//! `params.properties` and `params.required` without touching comments,
//! key order or styling anywhere else in the file.
//!
//! This is not a YAML parser. Semantics are always read through
//! `serde_yaml`; this model only answers "which lines make up the block
//! under `a.b`" and edits lines. A single-line flow mapping on the path is
//! rewritten into block form before entries are appended. Shapes it cannot
//! edit safely (multi-line flow collections, aliases, scalars where a block
//! is expected) are reported as [`CoreError::DocumentMerge`].

use regex::Regex;
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{CoreError, Result};
use crate::merge::PropertySet;
use crate::schema::{PROPERTIES_KEY, REQUIRED_KEY, SchemaMap, SchemaNode};

static KEY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<key>"(?:[^"\\]|\\.)*"|'(?:[^']|'')*'|[^\s#'"\-\[\]{},&*!|>%@`?:][^#]*?)\s*:(?:[ \t]+(?P<rest>.*))?$"#,
    )
    .expect("valid regex")
});

static BLOCK_SCALAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|: |- )[|>][-+]?[0-9]?$").expect("valid regex"));

const DEFAULT_INDENT: usize = 2;

/// Expected shape of a block being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Mapping,
    Sequence,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Mapping => f.write_str("mapping"),
            BlockKind::Sequence => f.write_str("sequence"),
        }
    }
}

/// A mapping key and the lines that belong to it
#[derive(Debug, Clone)]
struct Entry {
    line: usize,
    indent: usize,
    key: String,
    raw_key: String,
    /// Value text on the key line, comment stripped
    inline: String,
    comment: Option<String>,
    /// One past the last line of the entry's block
    end: usize,
}

/// A YAML manifest held as lines, editable without reformatting
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    lines: Vec<String>,
    line_ending: &'static str,
    trailing_newline: bool,
}

impl ManifestDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            line_ending: if text.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Serialize the document back to text
    pub fn render(&self) -> String {
        let mut out = self.lines.join(self.line_ending);
        if self.trailing_newline && !self.lines.is_empty() {
            out.push_str(self.line_ending);
        }
        out
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }

    /// Semantic view of the current text
    pub fn to_value(&self) -> Result<JsonValue> {
        let text = self.render();
        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Add properties (and their required entries) to `params`
    ///
    /// Properties or required names that the document already declares are
    /// skipped. `params`, `params.properties` and `params.required` are
    /// created when absent.
    pub fn merge_params(&mut self, additions: &PropertySet) -> Result<()> {
        let current = self.to_value()?;
        let params = current.get("params");

        let declared = params
            .and_then(|p| p.get(PROPERTIES_KEY))
            .and_then(JsonValue::as_object);
        let properties: SchemaMap = additions
            .properties
            .iter()
            .filter(|(name, _)| !declared.is_some_and(|d| d.contains_key(*name)))
            .map(|(name, schema)| (name.clone(), schema.clone()))
            .collect();

        let existing_required: Vec<&str> = params
            .and_then(|p| p.get(REQUIRED_KEY))
            .and_then(JsonValue::as_array)
            .map(|items| items.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default();
        let required: Vec<String> = additions
            .required
            .iter()
            .filter(|name| !existing_required.contains(&name.as_str()))
            .cloned()
            .collect();

        self.append_mapping_entries(&["params", PROPERTIES_KEY], &properties)?;
        self.append_sequence_items(&["params", REQUIRED_KEY], &required)
    }

    /// Append entries to the block mapping at `path`, creating it if needed
    pub fn append_mapping_entries(&mut self, path: &[&str], entries: &SchemaMap) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let block = self.ensure_block(path, BlockKind::Mapping)?;
        let indent = self
            .child_indent(&block)
            .unwrap_or(block.indent + self.indent_unit());
        let unit = self.indent_unit();

        let mut rendered = Vec::new();
        for (key, value) in entries {
            rendered.extend(render_entry(key, value, indent, unit)?);
        }

        self.lines.splice(block.end..block.end, rendered);
        Ok(())
    }

    /// Append string items to the sequence at `path`, creating it if needed
    pub fn append_sequence_items(&mut self, path: &[&str], items: &[String]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let block = self.ensure_block(path, BlockKind::Sequence)?;
        let rendered: Vec<String> = items
            .iter()
            .map(|item| render_scalar(item))
            .collect::<Result<_>>()?;

        if block.inline.starts_with('[') {
            let inner = block.inline[1..block.inline.len() - 1].trim();
            let joined = rendered.join(", ");
            let merged = if inner.is_empty() {
                joined
            } else {
                format!("{inner}, {joined}")
            };
            self.lines[block.line] = rebuild_key_line(&block, &format!("[{merged}]"));
            return Ok(());
        }

        let indent = self
            .sequence_indent(&block)
            .unwrap_or(block.indent + self.indent_unit());
        let pad = " ".repeat(indent);
        let lines: Vec<String> = rendered.iter().map(|r| format!("{pad}- {r}")).collect();

        self.lines.splice(block.end..block.end, lines);
        Ok(())
    }

    /// Find (or create) the block at `path` and make sure it is editable
    fn ensure_block(&mut self, path: &[&str], kind: BlockKind) -> Result<Entry> {
        for depth in 1..=path.len() {
            let current = &path[..depth];
            let entry = match self.locate(current) {
                Some(entry) => entry,
                None => {
                    self.insert_key(&path[..depth - 1], path[depth - 1])?;
                    self.locate(current)
                        .ok_or_else(|| CoreError::merge(current, "failed to create key"))?
                }
            };

            let expected = if depth == path.len() {
                kind
            } else {
                BlockKind::Mapping
            };
            self.normalize_inline(current, &entry, expected)?;
        }

        self.locate(path)
            .ok_or_else(|| CoreError::merge(path, "key disappeared after edit"))
    }

    /// Turn empty inline values (`{}`, `[]`, `null`) into an open block
    fn normalize_inline(&mut self, path: &[&str], entry: &Entry, expected: BlockKind) -> Result<()> {
        let inline = entry.inline.as_str();
        let rewrite = match inline {
            "" => false,
            "null" | "~" => true,
            "{}" if expected == BlockKind::Mapping => true,
            "[]" if expected == BlockKind::Sequence => true,
            s if s.starts_with('&') && !s.contains(char::is_whitespace) => false,
            s if expected == BlockKind::Sequence
                && s.starts_with('[')
                && s.ends_with(']') =>
            {
                false
            }
            s if expected == BlockKind::Mapping && s.starts_with('{') && s.ends_with('}') => {
                return self.expand_flow_mapping(path, entry);
            }
            other => {
                return Err(CoreError::merge(
                    path,
                    format!("expected a block {expected}, found `{other}`"),
                ));
            }
        };

        if rewrite {
            self.lines[entry.line] = rebuild_key_line(entry, "");
        }
        Ok(())
    }

    /// Rewrite `key: {a: 1}` as a block mapping at the document's indentation
    fn expand_flow_mapping(&mut self, path: &[&str], entry: &Entry) -> Result<()> {
        let value = SchemaNode::from_yaml_str(&entry.inline)
            .map_err(|e| CoreError::merge(path, format!("cannot read `{}`: {e}", entry.inline)))?;
        let Some(map) = value.as_object() else {
            return Err(CoreError::merge(
                path,
                format!("expected a block mapping, found `{}`", entry.inline),
            ));
        };

        let unit = self.indent_unit();
        let mut lines = vec![rebuild_key_line(entry, "")];
        for (key, child) in map {
            lines.extend(render_entry(key, child, entry.indent + unit, unit)?);
        }

        tracing::debug!(path = %path.join("."), keys = map.len(), "expanded flow mapping");
        self.lines.splice(entry.line..entry.line + 1, lines);
        Ok(())
    }

    /// Insert `key:` as the last entry under `parent`
    fn insert_key(&mut self, parent: &[&str], key: &str) -> Result<()> {
        let key_text = render_scalar(key)?;

        if parent.is_empty() {
            let at = self
                .lines
                .iter()
                .rposition(|l| !l.trim().is_empty())
                .map(|i| i + 1)
                .unwrap_or(0);
            self.lines.insert(at, format!("{key_text}:"));
            return Ok(());
        }

        let parent_entry = self
            .locate(parent)
            .ok_or_else(|| CoreError::merge(parent, "parent key not found"))?;
        let indent = self
            .child_indent(&parent_entry)
            .unwrap_or(parent_entry.indent + self.indent_unit());
        self.lines.insert(
            parent_entry.end,
            format!("{}{key_text}:", " ".repeat(indent)),
        );
        Ok(())
    }

    fn locate(&self, path: &[&str]) -> Option<Entry> {
        let (mut start, mut stop) = (0, self.lines.len());
        let mut found = None;

        for segment in path {
            let entry = self
                .entries(start, stop)
                .into_iter()
                .find(|e| e.key == *segment)?;
            start = entry.line + 1;
            stop = entry.end;
            found = Some(entry);
        }

        found
    }

    /// Mapping entries directly inside `[start, stop)`
    fn entries(&self, start: usize, stop: usize) -> Vec<Entry> {
        let Some(indent) = (start..stop)
            .find(|&i| is_content(&self.lines[i]))
            .map(|i| indent_of(&self.lines[i]))
        else {
            return Vec::new();
        };

        (start..stop)
            .filter(|&i| is_content(&self.lines[i]) && indent_of(&self.lines[i]) == indent)
            .filter_map(|i| {
                let (raw_key, key, rest) = parse_key_line(&self.lines[i])?;
                let (inline, comment) = split_comment(&rest);
                Some(Entry {
                    line: i,
                    indent,
                    key,
                    raw_key,
                    inline,
                    comment,
                    end: self.block_end(i, indent, stop),
                })
            })
            .collect()
    }

    fn block_end(&self, key_line: usize, key_indent: usize, stop: usize) -> usize {
        let mut end = key_line + 1;

        for i in key_line + 1..stop {
            let line = &self.lines[i];
            if line.trim().is_empty() {
                continue;
            }
            let indent = indent_of(line);
            if is_comment(line) {
                if indent > key_indent {
                    end = i + 1;
                }
                continue;
            }
            let trimmed = line.trim_start();
            let dash_item = indent == key_indent && (trimmed == "-" || trimmed.starts_with("- "));
            if indent > key_indent || dash_item {
                end = i + 1;
            } else {
                break;
            }
        }

        end
    }

    fn child_indent(&self, entry: &Entry) -> Option<usize> {
        (entry.line + 1..entry.end)
            .find(|&i| is_content(&self.lines[i]))
            .map(|i| indent_of(&self.lines[i]))
    }

    fn sequence_indent(&self, entry: &Entry) -> Option<usize> {
        (entry.line + 1..entry.end)
            .find(|&i| is_content(&self.lines[i]) && self.lines[i].trim_start().starts_with('-'))
            .map(|i| indent_of(&self.lines[i]))
    }

    /// Smallest indentation step used in the document
    fn indent_unit(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| is_content(l))
            .map(|l| indent_of(l))
            .filter(|i| *i > 0)
            .min()
            .unwrap_or(DEFAULT_INDENT)
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn is_content(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && !trimmed.starts_with('#')
        && trimmed != "---"
        && trimmed != "..."
}

fn parse_key_line(line: &str) -> Option<(String, String, String)> {
    let trimmed = line.trim();
    let caps = KEY_LINE.captures(trimmed)?;
    let raw_key = caps.name("key")?.as_str().to_string();
    let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("").to_string();
    let key = unquote_key(&raw_key);
    Some((raw_key, key, rest))
}

fn unquote_key(raw: &str) -> String {
    if raw.starts_with('"') {
        serde_json::from_str(raw).unwrap_or_else(|_| raw.trim_matches('"').to_string())
    } else if let Some(inner) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        inner.replace("''", "'")
    } else {
        raw.to_string()
    }
}

/// Split `value # comment` outside of quotes
fn split_comment(rest: &str) -> (String, Option<String>) {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev_space = true;

    for (i, c) in rest.char_indices() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double && prev_space => {
                return (rest[..i].trim().to_string(), Some(rest[i..].to_string()));
            }
            _ => {}
        }
        prev_space = c.is_whitespace();
    }

    (rest.trim().to_string(), None)
}

fn rebuild_key_line(entry: &Entry, value: &str) -> String {
    let mut line = format!("{}{}:", " ".repeat(entry.indent), entry.raw_key);
    if !value.is_empty() {
        line.push(' ');
        line.push_str(value);
    }
    if let Some(comment) = &entry.comment {
        line.push(' ');
        line.push_str(comment);
    }
    line
}

fn render_scalar(value: &str) -> Result<String> {
    Ok(serde_yaml::to_string(value)?.trim_end().to_string())
}

/// Render `key: value` as block YAML at `indent`
fn render_entry(key: &str, value: &SchemaNode, indent: usize, unit: usize) -> Result<Vec<String>> {
    let pad = " ".repeat(indent);
    let key_text = render_scalar(key)?;
    let body = serde_yaml::to_string(value)?;

    let nested = match value {
        SchemaNode::Object(map) => !map.is_empty(),
        SchemaNode::Array(items) => !items.is_empty(),
        _ => false,
    };

    let mut lines = Vec::new();
    if nested {
        let child_pad = " ".repeat(indent + unit);
        lines.push(format!("{pad}{key_text}:"));
        for line in reindent(&body, unit) {
            if line.is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{child_pad}{line}"));
            }
        }
    } else {
        let mut body_lines = body.lines();
        let first = body_lines.next().unwrap_or("");
        lines.push(format!("{pad}{key_text}: {first}"));
        lines.extend(body_lines.map(|line| format!("{pad}{line}")));
    }

    Ok(lines)
}

/// Scale serde_yaml's two-space nesting to `unit` spaces per level
///
/// Block scalar content keeps any indentation beyond its own level.
fn reindent(body: &str, unit: usize) -> Vec<String> {
    let scale = |indent: usize| indent / DEFAULT_INDENT * unit + indent % DEFAULT_INDENT;
    let mut scalar: Option<(usize, usize)> = None;
    let mut out = Vec::new();

    for line in body.lines() {
        if line.trim().is_empty() {
            out.push(String::new());
            continue;
        }

        let indent = indent_of(line);
        if let Some((header, content)) = scalar {
            if indent > header {
                let extra = indent.saturating_sub(header + DEFAULT_INDENT);
                out.push(format!("{}{}", " ".repeat(content + extra), line.trim_start()));
                continue;
            }
            scalar = None;
        }

        let text = line.trim_start();
        if BLOCK_SCALAR.is_match(text.trim_end()) {
            scalar = Some((indent, scale(indent) + unit));
        }
        out.push(format!("{}{text}", " ".repeat(scale(indent))));
    }

    out
}
