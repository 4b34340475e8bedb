//! Flattened configuration trees.
//!
//! Parsed resource content becomes a `ConfigTree`: an immutable, ordered map
//! from dotted leaf paths (`server.remote-url`) to leaf values. Flattening at
//! parse time keeps the merge a simple fold over `(name, value)` pairs, the
//! same shape the name-folding equivalence rule operates on.

use config::{Map, Value, ValueKind};

use crate::error::ParseError;

/// Immutable, ordered map of dotted leaf paths to values. Every mutation
/// returns a new tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    entries: Vec<(String, Value)>,
}

impl ConfigTree {
    pub fn new() -> Self {
        ConfigTree::default()
    }

    /// Parse raw text into a tree. The format follows the resource extension:
    /// `.properties` parses as INI, `.json` as JSON, and `.conf`, `.toml` or
    /// unmarked content as TOML. Each format is parsed directly so property
    /// names keep their exact spelling; the name-folding rule depends on it.
    pub fn parse(text: &str, extension: &str) -> Result<Self, ParseError> {
        let entries = match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "properties" => parse_properties(text)?,
            "json" => parse_json(text)?,
            // The unmarked convention slot and everything else parse as TOML.
            _ => parse_toml(text)?,
        };
        Ok(ConfigTree { entries })
    }

    /// Flatten a nested table into dotted leaf paths. Sibling entries are
    /// ordered by name so the result is deterministic regardless of the
    /// parser's map order.
    pub fn from_table(table: Map<String, Value>) -> Self {
        let mut entries = Vec::new();
        flatten_table(None, table, &mut entries);
        ConfigTree { entries }
    }

    /// Ordered `(name, value)` pairs.
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_path(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// New tree with `name` set to `value`. An existing entry keeps its slot;
    /// a new entry appends.
    pub fn with_value(&self, name: &str, value: Value) -> Self {
        let mut entries = self.entries.clone();
        match entries.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = value,
            None => entries.push((name.to_string(), value)),
        }
        ConfigTree { entries }
    }

    /// New tree without the named entry.
    pub fn without_path(&self, name: &str) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(existing, _)| existing != name)
            .cloned()
            .collect();
        ConfigTree { entries }
    }
}

fn flatten_table(prefix: Option<&str>, table: Map<String, Value>, out: &mut Vec<(String, Value)>) {
    let mut children: Vec<(String, Value)> = table.into_iter().collect();
    children.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, value) in children {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name,
        };
        match value.kind {
            ValueKind::Table(nested) => flatten_table(Some(&path), nested, out),
            kind => out.push((path, Value::new(None, kind))),
        }
    }
}

fn join_path(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, name),
        None => name.to_string(),
    }
}

fn parse_json(text: &str) -> Result<Vec<(String, Value)>, ParseError> {
    match serde_json::from_str(text)? {
        serde_json::Value::Object(table) => {
            let mut entries = Vec::new();
            flatten_json(None, table, &mut entries);
            Ok(entries)
        }
        _ => Err(ParseError::RootNotTable),
    }
}

fn flatten_json(
    prefix: Option<&str>,
    table: serde_json::Map<String, serde_json::Value>,
    out: &mut Vec<(String, Value)>,
) {
    let mut children: Vec<(String, serde_json::Value)> = table.into_iter().collect();
    children.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, value) in children {
        let path = join_path(prefix, &name);
        match value {
            serde_json::Value::Object(nested) => flatten_json(Some(&path), nested, out),
            leaf => out.push((path, Value::new(None, json_kind(leaf)))),
        }
    }
}

fn json_kind(value: serde_json::Value) -> ValueKind {
    match value {
        serde_json::Value::Null => ValueKind::Nil,
        serde_json::Value::Bool(flag) => ValueKind::Boolean(flag),
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                ValueKind::I64(int)
            } else if let Some(int) = number.as_u64() {
                ValueKind::U64(int)
            } else {
                ValueKind::Float(number.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(text) => ValueKind::String(text),
        serde_json::Value::Array(items) => ValueKind::Array(
            items
                .into_iter()
                .map(|item| Value::new(None, json_kind(item)))
                .collect(),
        ),
        serde_json::Value::Object(table) => ValueKind::Table(
            table
                .into_iter()
                .map(|(name, value)| (name, Value::new(None, json_kind(value))))
                .collect(),
        ),
    }
}

fn parse_toml(text: &str) -> Result<Vec<(String, Value)>, ParseError> {
    let table: toml::Table = text.parse()?;
    let mut entries = Vec::new();
    flatten_toml(None, table, &mut entries);
    Ok(entries)
}

fn flatten_toml(prefix: Option<&str>, table: toml::Table, out: &mut Vec<(String, Value)>) {
    let mut children: Vec<(String, toml::Value)> = table.into_iter().collect();
    children.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, value) in children {
        let path = join_path(prefix, &name);
        match value {
            toml::Value::Table(nested) => flatten_toml(Some(&path), nested, out),
            leaf => out.push((path, Value::new(None, toml_kind(leaf)))),
        }
    }
}

fn toml_kind(value: toml::Value) -> ValueKind {
    match value {
        toml::Value::String(text) => ValueKind::String(text),
        toml::Value::Integer(int) => ValueKind::I64(int),
        toml::Value::Float(float) => ValueKind::Float(float),
        toml::Value::Boolean(flag) => ValueKind::Boolean(flag),
        toml::Value::Datetime(datetime) => ValueKind::String(datetime.to_string()),
        toml::Value::Array(items) => ValueKind::Array(
            items
                .into_iter()
                .map(|item| Value::new(None, toml_kind(item)))
                .collect(),
        ),
        toml::Value::Table(table) => ValueKind::Table(
            table
                .into_iter()
                .map(|(name, value)| (name, Value::new(None, toml_kind(value))))
                .collect(),
        ),
    }
}

/// Properties files parse as INI. Section names become the leading path
/// segment; values stay strings, typed access converts on read.
fn parse_properties(text: &str) -> Result<Vec<(String, Value)>, ParseError> {
    let document = ini::Ini::load_from_str(text)?;
    let mut entries = Vec::new();
    for (section, properties) in document.iter() {
        for (name, value) in properties.iter() {
            let path = join_path(section, name);
            entries.push((path, Value::new(None, ValueKind::String(value.to_string()))));
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}
