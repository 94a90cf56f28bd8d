//! Bicep parameter codec
//!
//! Parameters live in `template.bicep` next to the resources that use them,
//! so new `param` declarations are appended to the template itself.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use cairn_core::{MissingSet, SchemaMap, SchemaNode};

use crate::error::{ProvisionerError, Result};
use crate::provisioner::{Introspector, is_secret};
use crate::types::{BicepTypeMapper, TypeMapper};

pub const TEMPLATE_FILE: &str = "template.bicep";

static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^param\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s+(?P<rest>.+)$").expect("valid regex")
});

static DECORATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@(?:sys\.)?(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("valid regex")
});

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct BicepIntrospector;

/// Decorators seen since the last declaration
#[derive(Default)]
struct Pending {
    description: Option<String>,
    allowed: Option<Vec<SchemaNode>>,
    secure: bool,
}

impl Introspector for BicepIntrospector {
    fn read_declarations(&self, step_dir: &Path) -> Result<SchemaNode> {
        if !step_dir.is_dir() {
            return Err(ProvisionerError::StepNotFound {
                path: step_dir.to_path_buf(),
            });
        }

        let path = step_dir.join(TEMPLATE_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(ProvisionerError::Io(e)),
        };

        parse_params(&content, &path)
    }

    fn render_declarations(&self, missing: &MissingSet) -> Result<String> {
        let mapper = BicepTypeMapper;
        let mut out = String::new();

        for (index, (name, schema)) in missing.properties.iter().enumerate() {
            if !IDENTIFIER.is_match(name) {
                return Err(ProvisionerError::Render {
                    backend: mapper.backend().to_string(),
                    property: name.clone(),
                    message: "not a valid parameter name".to_string(),
                });
            }

            let native = mapper.native_type(schema.type_name());

            if index > 0 {
                out.push('\n');
            }
            if let Some(description) = schema.get("description").and_then(SchemaNode::as_str) {
                out.push_str(&format!("@description({})\n", string_literal(description)));
            }
            if is_secret(schema) {
                out.push_str("@secure()\n");
            }

            let declaration = if missing.is_required(name) {
                format!("param {name} {native}")
            } else {
                match schema.get("default").and_then(default_literal) {
                    Some(literal) => format!("param {name} {native} = {literal}"),
                    None => format!("param {name} {native}?"),
                }
            };
            out.push_str(&declaration);
            out.push('\n');
        }

        Ok(out)
    }

    fn declarations_file(&self) -> &'static str {
        TEMPLATE_FILE
    }
}

fn parse_params(content: &str, path: &Path) -> Result<SchemaNode> {
    let mapper = BicepTypeMapper;
    let mut properties = SchemaMap::new();
    let mut required = Vec::new();
    let mut pending = Pending::default();

    let mut lines = content.lines().enumerate();
    while let Some((index, raw)) = lines.next() {
        let line = strip_comment(raw).trim();

        if line.is_empty() {
            continue;
        }

        if let Some(caps) = DECORATOR.captures(line) {
            let name = caps["name"].to_string();
            let text = collect_balanced(line, &mut lines, index, path)?;
            apply_decorator(&mut pending, &name, decorator_args(&text));
            continue;
        }

        let Some(caps) = PARAM.captures(line) else {
            pending = Pending::default();
            continue;
        };

        let name = caps["name"].to_string();
        let declaration = collect_balanced(&caps["rest"], &mut lines, index, path)?;
        let (type_text, default_text) = match find_top_level(&declaration, '=') {
            Some(at) => (&declaration[..at], Some(declaration[at + 1..].trim())),
            None => (declaration.as_str(), None),
        };
        let type_text = type_text.trim();
        let (type_text, nullable) = match type_text.strip_suffix('?') {
            Some(inner) => (inner.trim_end(), true),
            None => (type_text, false),
        };

        let decorators = std::mem::take(&mut pending);
        let (schema_type, union) = describe_type(&mapper, type_text);

        let mut schema = SchemaMap::new();
        schema.insert("title".to_string(), SchemaNode::from(name.as_str()));
        if let Some(schema_type) = schema_type {
            schema.insert("type".to_string(), SchemaNode::from(schema_type));
        }
        if let Some(description) = decorators.description {
            schema.insert("description".to_string(), SchemaNode::from(description));
        }
        if let Some(values) = union.or(decorators.allowed) {
            schema.insert("enum".to_string(), SchemaNode::Array(values));
        }
        if decorators.secure {
            schema.insert("writeOnly".to_string(), SchemaNode::Bool(true));
        }
        if let Some(value) = default_text.and_then(parse_literal).filter(|v| !v.is_null()) {
            schema.insert("default".to_string(), value);
        }

        let optional = nullable || default_text.is_some();
        if !optional && !required.contains(&name) {
            required.push(name.clone());
        }
        properties.insert(name, SchemaNode::Object(schema));
    }

    Ok(SchemaNode::from_parts(properties, &required))
}

fn apply_decorator(pending: &mut Pending, name: &str, args: &str) {
    match name {
        "description" => {
            pending.description = parse_literal(args).and_then(|v| match v {
                SchemaNode::String(s) => Some(s),
                _ => None,
            })
        }
        "allowed" => {
            pending.allowed = args
                .strip_prefix('[')
                .and_then(|a| a.strip_suffix(']'))
                .and_then(parse_literal_list)
        }
        "secure" => pending.secure = true,
        _ => {}
    }
}

/// Text between a decorator's outer parentheses
fn decorator_args(text: &str) -> &str {
    let args = text.split_once('(').map(|(_, rest)| rest).unwrap_or_default().trim_end();
    args.strip_suffix(')').unwrap_or(args).trim()
}

/// Schema type and literal values for a Bicep type expression
///
/// `T[]` is an array, `{ ... }` an object, and a union of literals becomes
/// an enum. Anything else that is not a built-in type stays untyped.
fn describe_type(mapper: &BicepTypeMapper, text: &str) -> (Option<&'static str>, Option<Vec<SchemaNode>>) {
    if text.ends_with("[]") {
        return (Some("array"), None);
    }
    if text.starts_with('{') {
        return (Some("object"), None);
    }

    if find_top_level(text, '|').is_some() {
        let values: Option<Vec<SchemaNode>> = split_top_level(text, '|')
            .into_iter()
            .map(|item| parse_literal(item.trim()))
            .collect();
        let Some(values) = values else {
            return (None, None);
        };
        let schema_type = if values.iter().all(|v| matches!(v, SchemaNode::String(_))) {
            Some("string")
        } else if values.iter().all(|v| matches!(v, SchemaNode::Number(_))) {
            Some("integer")
        } else if values.iter().all(|v| matches!(v, SchemaNode::Bool(_))) {
            Some("boolean")
        } else {
            None
        };
        return (schema_type, Some(values));
    }

    (mapper.schema_type(text.strip_prefix("sys.").unwrap_or(text)), None)
}

/// Literals separated by newlines or commas; `None` if any is an expression
fn parse_literal_list(text: &str) -> Option<Vec<SchemaNode>> {
    split_top_level(text, '\n')
        .into_iter()
        .flat_map(|line| split_top_level(line, ','))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_literal)
        .collect::<Option<Vec<_>>>()
        .filter(|values| !values.is_empty())
}

/// Join continuation lines until every bracket opened by `first` is closed
fn collect_balanced<'a>(
    first: &str,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    start: usize,
    path: &Path,
) -> Result<String> {
    let mut text = first.to_string();
    let mut depth = bracket_depth(first);

    while depth > 0 {
        let Some((_, raw)) = lines.next() else {
            return Err(ProvisionerError::Bicep {
                path: path.to_path_buf(),
                line: start + 1,
                message: "unterminated declaration".to_string(),
            });
        };
        let line = strip_comment(raw).trim();
        depth += bracket_depth(line);
        text.push('\n');
        text.push_str(line);
    }

    Ok(text)
}

/// Walk `text` outside string literals, reporting each char with its nesting depth
fn scan(text: &str, mut visit: impl FnMut(usize, char, i32) -> bool) {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (at, c) in text.char_indices() {
        if in_string {
            match c {
                '\\' if !escaped => escaped = true,
                '\'' if !escaped => in_string = false,
                _ => escaped = false,
            }
            continue;
        }
        match c {
            '\'' => in_string = true,
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth -= 1,
            _ => {}
        }
        if !visit(at, c, depth) {
            return;
        }
    }
}

/// Net bracket nesting opened by `text`
fn bracket_depth(text: &str) -> i32 {
    let mut depth = 0;
    scan(text, |_, _, d| {
        depth = d;
        true
    });
    depth
}

/// Byte offset of the first `target` outside strings and brackets
fn find_top_level(text: &str, target: char) -> Option<usize> {
    let mut found = None;
    scan(text, |at, c, depth| {
        if c == target && depth == 0 {
            found = Some(at);
            return false;
        }
        true
    });
    found
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(at) = find_top_level(rest, separator) {
        parts.push(&rest[..at]);
        rest = &rest[at + separator.len_utf8()..];
    }
    parts.push(rest);
    parts
}

/// `line` without a trailing `//` comment
fn strip_comment(line: &str) -> &str {
    let mut cut = line.len();
    let mut previous_slash = None;
    scan(line, |at, c, _| {
        if c == '/' {
            if let Some(slash) = previous_slash {
                cut = slash;
                return false;
            }
            previous_slash = Some(at);
        } else {
            previous_slash = None;
        }
        true
    });
    &line[..cut]
}

/// Parse a single-line Bicep literal; expressions yield `None`
fn parse_literal(text: &str) -> Option<SchemaNode> {
    match text {
        "true" => return Some(SchemaNode::Bool(true)),
        "false" => return Some(SchemaNode::Bool(false)),
        "null" => return Some(SchemaNode::Null),
        _ => {}
    }

    if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        if inner.contains("${") {
            return None;
        }
        return Some(SchemaNode::String(unescape(inner)));
    }

    text.parse::<i64>()
        .ok()
        .map(|n| SchemaNode::Number(serde_json::Number::from(n)))
}

fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn string_literal(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace("${", "\\${");
    format!("'{escaped}'")
}

/// Bicep literal for a schema default; `None` when it has no single-line form
fn default_literal(default: &SchemaNode) -> Option<String> {
    match default {
        SchemaNode::String(s) => Some(string_literal(s)),
        SchemaNode::Bool(b) => Some(b.to_string()),
        SchemaNode::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
