//! Schema model and validation.
//!
//! A schema mirrors the shape of the value it encodes. Every leaf is an
//! ordered chain of link names; every inner node is an ordered list of keys.
//! The declared key order is the output order, so reordering a schema is a
//! breaking encoding change and needs a new schema version.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CredError, CredErrorDetail, CredResult};
use crate::graph::TransformationGraph;

/// Schema versions of one proof, keyed by version name (`"default"`, `"pre"`).
pub type SchemaVersions = BTreeMap<String, Schema>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Schema {
    /// Leaf: link names applied in order.
    Chain(Vec<String>),
    /// Inner node: keys in declared order.
    Object(Vec<(String, Schema)>),
}

/// Why a JSON document is not a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaParseError(String);

impl fmt::Display for SchemaParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SchemaParseError {}

fn parse_at(value: Value, path: &str) -> Result<Schema, SchemaParseError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s),
                other => Err(SchemaParseError(format!(
                    "{}[{}]: link name must be a string, got {}",
                    display_path(path),
                    i,
                    other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Schema::Chain),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, child)| {
                let child_path = join_path(path, &key);
                parse_at(child, &child_path).map(|schema| (key, schema))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Schema::Object),
        other => Err(SchemaParseError(format!(
            "{}: expected a link chain or an object, got {}",
            display_path(path),
            other
        ))),
    }
}

impl TryFrom<Value> for Schema {
    type Error = SchemaParseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        parse_at(value, "")
    }
}

impl From<Schema> for Value {
    fn from(schema: Schema) -> Self {
        match schema {
            Schema::Chain(links) => Value::Array(links.into_iter().map(Value::String).collect()),
            Schema::Object(entries) => {
                let mut map = Map::new();
                for (key, child) in entries {
                    map.insert(key, Value::from(child));
                }
                Value::Object(map)
            }
        }
    }
}

pub(crate) fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

pub(crate) fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

impl Schema {
    pub fn chain<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::Chain(links.into_iter().map(Into::into).collect())
    }

    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Schema::Object(entries.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    pub fn is_chain(&self) -> bool {
        matches!(self, Schema::Chain(_))
    }

    /// Look up a sub-schema by dot-separated path. The empty path is `self`.
    pub fn get(&self, path: &str) -> Option<&Schema> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.').try_fold(self, |node, key| match node {
            Schema::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, s)| s),
            Schema::Chain(_) => None,
        })
    }

    /// Every leaf as `(path, chain)` in output order.
    pub fn leaves(&self) -> Vec<(String, &[String])> {
        let mut out = Vec::new();
        collect_leaves(self, "", &mut out);
        out
    }
}

fn collect_leaves<'a>(schema: &'a Schema, path: &str, out: &mut Vec<(String, &'a [String])>) {
    match schema {
        Schema::Chain(links) => out.push((path.to_string(), links.as_slice())),
        Schema::Object(entries) => {
            for (key, child) in entries {
                collect_leaves(child, &join_path(path, key), out);
            }
        }
    }
}

/// Validate a schema against a graph without preparing anything.
/// Returns a list of validation error messages (empty list means valid).
pub fn validate_schema(schema: &Schema, graph: &TransformationGraph) -> Vec<String> {
    let mut errors = Vec::new();
    validate_node(schema, "", graph, &mut errors);
    errors
}

fn validate_node(schema: &Schema, path: &str, graph: &TransformationGraph, errors: &mut Vec<String>) {
    match schema {
        Schema::Object(entries) => {
            if entries.is_empty() {
                errors.push(format!("{}: empty object", display_path(path)));
            }
            for (key, child) in entries {
                validate_node(child, &join_path(path, key), graph, errors);
            }
        }
        Schema::Chain(links) => {
            let path = display_path(path);
            if links.is_empty() {
                errors.push(format!("{}: empty link chain", path));
                return;
            }
            let mut previous: Option<(&str, &str, bool)> = None;
            for name in links {
                let link = match graph.resolve(name) {
                    Ok(link) => link,
                    Err(_) => {
                        errors.push(format!("{}: unknown link '{}'", path, name));
                        previous = None;
                        continue;
                    }
                };
                if let Some((prev_name, prev_output, prev_spread)) = previous {
                    if prev_spread {
                        errors.push(format!(
                            "{}: link '{}' follows spread link '{}'",
                            path, name, prev_name
                        ));
                    } else if !continues(graph, prev_output, &link.input) {
                        errors.push(format!(
                            "{}: link '{}' expects '{}' but '{}' produces '{}'",
                            path, name, link.input, prev_name, prev_output
                        ));
                    }
                }
                previous = Some((name.as_str(), link.output.as_str(), link.is_spread()));
            }
        }
    }
}

fn continues(graph: &TransformationGraph, produced: &str, expected: &str) -> bool {
    match (graph.node(produced), graph.node(expected)) {
        (Some(produced), Some(expected)) => expected.accepts(produced),
        _ => produced == expected,
    }
}

/// Validate a schema and return the first problem as a typed error.
pub fn validate_schema_strict(schema: &Schema, graph: &TransformationGraph) -> CredResult<()> {
    let errors = validate_schema(schema, graph);
    let Some(first_error) = errors.into_iter().next() else {
        return Ok(());
    };
    let path = first_error
        .split_once(':')
        .map(|(p, _)| p.to_string())
        .unwrap_or_default();
    let kind = if first_error.contains("unknown link") {
        let name = first_error
            .rsplit('\'')
            .nth(1)
            .unwrap_or_default()
            .to_string();
        CredError::UnknownLink(name)
    } else if first_error.contains("follows spread link") {
        CredError::SpreadNotTerminal(first_error.clone())
    } else {
        CredError::InvalidSchema(first_error.clone())
    };
    Err(CredErrorDetail::new(kind, first_error).with_path(path))
}
