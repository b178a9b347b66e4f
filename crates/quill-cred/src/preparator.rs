//! Preparator: co-walks a JSON value and a [`Schema`], runs every leaf's
//! link chain through the graph and flattens the results into one
//! [`PreparedSequence`].
//!
//! Output order is the schema's declared key order. The value's own key
//! order never matters, and value keys the schema does not mention are
//! left out.

use std::sync::Arc;

use quill_core::{FlatValue, PreparedSequence};
use serde_json::Value;

use crate::error::{CredError, CredErrorDetail, CredResult};
use crate::graph::{GraphLink, LinkOutput, TransformationGraph};
use crate::schema::{display_path, join_path, Schema};
use crate::selector::{resolve, Selector};
use crate::types::{Credential, PreparatorConfig};

#[derive(Debug, Clone)]
pub struct Preparator {
    graph: Arc<TransformationGraph>,
    config: PreparatorConfig,
}

impl Preparator {
    pub fn new(graph: Arc<TransformationGraph>, config: PreparatorConfig) -> Self {
        Self { graph, config }
    }

    /// Standard graph with default configuration.
    pub fn standard() -> CredResult<Self> {
        Ok(Self::new(
            Arc::new(TransformationGraph::standard()?),
            PreparatorConfig::default(),
        ))
    }

    pub fn graph(&self) -> &TransformationGraph {
        &self.graph
    }

    pub fn config(&self) -> &PreparatorConfig {
        &self.config
    }

    /// Flatten `value` under `schema`.
    pub fn prepare(&self, value: &Value, schema: &Schema) -> CredResult<PreparedSequence> {
        let mut out = Vec::new();
        match self.walk(value, schema, "", 0, &mut out) {
            Ok(()) => {
                tracing::debug!(elements = out.len(), "prepared sequence");
                Ok(PreparedSequence::new(out))
            }
            Err(e) => {
                tracing::warn!(
                    path = e.path.as_deref().unwrap_or("<root>"),
                    error = %e.kind,
                    "prepare failed"
                );
                Err(e)
            }
        }
    }

    /// Canonical byte form: every element must end in a byte node.
    pub fn prepare_bytes(&self, value: &Value, schema: &Schema) -> CredResult<Vec<u8>> {
        Ok(self.prepare(value, schema)?.to_bytes()?)
    }

    /// The credential's attribute tree under the selected proof's attribute
    /// schema.
    pub fn prepared_attributes(
        &self,
        cred: &Credential,
        selector: &Selector,
    ) -> CredResult<PreparedSequence> {
        let selection = resolve(cred, selector, &self.config.default_schema_version)?;
        let schema = selection.attribute_schema()?;
        tracing::debug!(
            index = selection.index,
            version = %selection.version,
            "preparing attributes"
        );
        self.prepare(&cred.attributes.to_value()?, schema)
    }

    /// The selected proof's signature envelope under its signature schema.
    pub fn prepared_signature(
        &self,
        cred: &Credential,
        selector: &Selector,
    ) -> CredResult<PreparedSequence> {
        let selection = resolve(cred, selector, &self.config.default_schema_version)?;
        let schema = selection.signature_schema()?;
        tracing::debug!(
            index = selection.index,
            version = %selection.version,
            "preparing signature envelope"
        );
        self.prepare(&selection.proof.signature.to_value(), schema)
    }

    // -----------------------------------------------------------------------
    // Walk
    // -----------------------------------------------------------------------

    fn walk(
        &self,
        value: &Value,
        schema: &Schema,
        path: &str,
        depth: usize,
        out: &mut Vec<FlatValue>,
    ) -> CredResult<()> {
        if depth > self.config.max_depth {
            return Err(CredErrorDetail::new(
                CredError::InvalidSchema(format!(
                    "nesting exceeds max depth {}",
                    self.config.max_depth
                )),
                format!("schema nests deeper than {} levels", self.config.max_depth),
            )
            .with_path(display_path(path)));
        }

        match schema {
            Schema::Chain(links) => self
                .run_chain(value, links, out)
                .map_err(|e| e.or_path(display_path(path))),
            Schema::Object(entries) => {
                for (key, child_schema) in entries {
                    let child_path = join_path(path, key);
                    let child = child_value(value, key, path)?;
                    self.walk(child, child_schema, &child_path, depth + 1, out)?;
                }
                Ok(())
            }
        }
    }

    fn run_chain(
        &self,
        value: &Value,
        links: &[String],
        out: &mut Vec<FlatValue>,
    ) -> CredResult<()> {
        if links.is_empty() {
            return Err(CredError::InvalidSchema("empty link chain".into()).into());
        }
        let mut current = leaf_value(value)?;

        for (i, name) in links.iter().enumerate() {
            let link = self.graph.resolve(name)?;
            if self.config.strict_types {
                self.check_input(link, &current)?;
            }
            match link.apply(&current)? {
                LinkOutput::One(next) => {
                    if self.config.strict_types {
                        self.check_output(link, &next)?;
                    }
                    current = next;
                }
                LinkOutput::Many(values) => {
                    if let Some(next_name) = links.get(i + 1) {
                        return Err(CredErrorDetail::new(
                            CredError::SpreadNotTerminal(next_name.clone()),
                            format!("link '{}' follows spread link '{}'", next_name, name),
                        ));
                    }
                    if self.config.strict_types {
                        for v in &values {
                            self.check_output(link, v)?;
                        }
                    }
                    out.extend(values);
                    return Ok(());
                }
            }
        }
        out.push(current);
        Ok(())
    }

    fn check_input(&self, link: &GraphLink, value: &FlatValue) -> CredResult<()> {
        match self.graph.node(&link.input) {
            Some(node) if node.is_type(value) => Ok(()),
            _ => Err(CredErrorDetail::new(
                CredError::TypeMismatch(format!(
                    "link '{}' expects '{}', got {}",
                    link.name,
                    link.input,
                    value.kind()
                )),
                format!(
                    "link '{}' expects '{}' but received {}",
                    link.name, link.input, value
                ),
            )),
        }
    }

    fn check_output(&self, link: &GraphLink, value: &FlatValue) -> CredResult<()> {
        match self.graph.node(&link.output) {
            Some(node) if node.is_type(value) => Ok(()),
            _ => Err(CredErrorDetail::new(
                CredError::TypeMismatch(format!(
                    "link '{}' produced {}, not '{}'",
                    link.name,
                    value.kind(),
                    link.output
                )),
                format!(
                    "link '{}' produced {} which is not a '{}'",
                    link.name, value, link.output
                ),
            )),
        }
    }
}

/// Canonical decimal index only, so "01" and "+1" never alias "1".
fn array_index(key: &str) -> Option<usize> {
    key.parse::<usize>().ok().filter(|i| i.to_string() == key)
}

/// Child of an object by key, or of an array by decimal index.
fn child_value<'v>(value: &'v Value, key: &str, path: &str) -> CredResult<&'v Value> {
    let child_path = join_path(path, key);
    let found = match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => array_index(key).and_then(|i| items.get(i)),
        other => {
            return Err(CredErrorDetail::new(
                CredError::ShapeMismatch(format!(
                    "schema expects an object, value is {}",
                    json_kind(other)
                )),
                format!(
                    "{}: schema has nested keys but the value is {}",
                    display_path(path),
                    json_kind(other)
                ),
            )
            .with_path(display_path(path)))
        }
    };
    found.ok_or_else(|| {
        CredErrorDetail::new(
            CredError::ShapeMismatch(format!("missing key '{}'", key)),
            format!("value has no '{}' required by the schema", child_path),
        )
        .with_path(child_path.clone())
    })
}

/// Starting value of a leaf chain.
fn leaf_value(value: &Value) -> CredResult<FlatValue> {
    match value {
        Value::String(s) => Ok(FlatValue::utf8(s.as_str())),
        Value::Bool(b) => Ok(FlatValue::Bool(*b)),
        Value::Number(n) => n.as_u64().map(FlatValue::uint).ok_or_else(|| {
            CredErrorDetail::from(CredError::TypeMismatch(format!(
                "number {} is not an unsigned 64-bit integer",
                n
            )))
        }),
        Value::Object(_) | Value::Array(_) => Err(CredError::ShapeMismatch(format!(
            "schema expects a link chain, value is {}",
            json_kind(value)
        ))
        .into()),
        Value::Null => Err(CredError::TypeMismatch("null leaf".into()).into()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, GraphLink, GraphNode};
    use crate::links::BaseExtension;
    use quill_core::ValueKind;
    use serde_json::json;

    fn preparator() -> Preparator {
        Preparator::standard().unwrap()
    }

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_output_follows_schema_order() {
        let value = json!({ "b": "2", "a": "1" });
        let out = preparator()
            .prepare(&value, &schema(json!({ "a": ["utf8.identity"], "b": ["utf8.identity"] })))
            .unwrap();
        assert_eq!(out.as_slice(), &[FlatValue::utf8("1"), FlatValue::utf8("2")]);

        let out = preparator()
            .prepare(&value, &schema(json!({ "b": ["utf8.identity"], "a": ["utf8.identity"] })))
            .unwrap();
        assert_eq!(out.as_slice(), &[FlatValue::utf8("2"), FlatValue::utf8("1")]);
    }

    #[test]
    fn test_extra_value_keys_ignored() {
        let value = json!({ "a": 1, "unused": { "deep": true } });
        let out = preparator()
            .prepare(&value, &schema(json!({ "a": ["uint.identity"] })))
            .unwrap();
        assert_eq!(out.as_slice(), &[FlatValue::uint(1)]);
    }

    #[test]
    fn test_multi_hop_chain() {
        let value = json!({ "sbj": { "id": { "k": "123456" } } });
        let out = preparator()
            .prepare(
                &value,
                &schema(json!({ "sbj": { "id": { "k": ["utf8-bytes", "bytes-uint"] } } })),
            )
            .unwrap();
        assert_eq!(out.as_slice(), &[FlatValue::uint(54_091_677_185_334)]);
    }

    #[test]
    fn test_array_addressed_by_index() {
        let value = json!({ "keys": ["x", "y", "z"] });
        let out = preparator()
            .prepare(
                &value,
                &schema(json!({ "keys": { "2": ["utf8.identity"], "0": ["utf8.identity"] } })),
            )
            .unwrap();
        assert_eq!(out.as_slice(), &[FlatValue::utf8("z"), FlatValue::utf8("x")]);
    }

    #[test]
    fn test_array_index_must_be_canonical() {
        let value = json!({ "keys": ["x", "y", "z"] });
        for key in ["01", "+1", " 1", "1.0"] {
            let err = preparator()
                .prepare(&value, &schema(json!({ "keys": { key: ["utf8.identity"] } })))
                .unwrap_err();
            assert!(matches!(err.kind, CredError::ShapeMismatch(_)), "key {:?}", key);
            assert_eq!(err.path.as_deref(), Some(format!("keys.{}", key).as_str()));
        }
    }

    #[test]
    fn test_missing_key_is_shape_mismatch() {
        let value = json!({ "sbj": { "id": {} } });
        let err = preparator()
            .prepare(&value, &schema(json!({ "sbj": { "id": { "k": ["utf8.identity"] } } })))
            .unwrap_err();
        assert!(matches!(err.kind, CredError::ShapeMismatch(_)));
        assert_eq!(err.path.as_deref(), Some("sbj.id.k"));
    }

    #[test]
    fn test_object_where_schema_wants_chain() {
        let value = json!({ "sbj": { "id": 1 } });
        let err = preparator()
            .prepare(&value, &schema(json!({ "sbj": ["utf8.identity"] })))
            .unwrap_err();
        assert!(matches!(err.kind, CredError::ShapeMismatch(_)));
        assert_eq!(err.path.as_deref(), Some("sbj"));
    }

    #[test]
    fn test_primitive_where_schema_wants_object() {
        let value = json!({ "sbj": "flat" });
        let err = preparator()
            .prepare(&value, &schema(json!({ "sbj": { "id": ["utf8.identity"] } })))
            .unwrap_err();
        assert!(matches!(err.kind, CredError::ShapeMismatch(_)));
        assert_eq!(err.path.as_deref(), Some("sbj"));
    }

    #[test]
    fn test_unknown_link_carries_path() {
        let value = json!({ "a": { "b": "x" } });
        let err = preparator()
            .prepare(&value, &schema(json!({ "a": { "b": ["utf8-nowhere"] } })))
            .unwrap_err();
        assert_eq!(err.kind, CredError::UnknownLink("utf8-nowhere".into()));
        assert_eq!(err.path.as_deref(), Some("a.b"));
        assert_eq!(err.to_string(), "unknown link: utf8-nowhere at a.b");
    }

    #[test]
    fn test_transform_failure_carries_path() {
        let value = json!({ "k": "not-base58-0OIl" });
        let p = Preparator::new(
            Arc::new(TransformationGraph::standard().unwrap()),
            PreparatorConfig {
                strict_types: false,
                ..PreparatorConfig::default()
            },
        );
        let err = p
            .prepare(&value, &schema(json!({ "k": ["mina:base58-publickey"] })))
            .unwrap_err();
        assert!(matches!(err.kind, CredError::TransformFailed { .. }));
        assert_eq!(err.path.as_deref(), Some("k"));
    }

    #[test]
    fn test_strict_types_rejects_wrong_input() {
        let value = json!({ "k": "zz" });
        let err = preparator()
            .prepare(&value, &schema(json!({ "k": ["hex-bytes"] })))
            .unwrap_err();
        assert!(matches!(err.kind, CredError::TypeMismatch(_)));
        assert_eq!(err.path.as_deref(), Some("k"));
    }

    #[test]
    fn test_strict_types_rejects_bad_output() {
        let mut builder = GraphBuilder::new().with_extension(&BaseExtension).unwrap();
        builder
            .register(
                vec![GraphNode::new("short", ValueKind::Utf8)
                    .with_check(|v| v.as_str().is_some_and(|s| s.len() < 3))],
                vec![GraphLink::single("utf8-short", "utf8", "short", |v| Ok(v.clone()))],
            )
            .unwrap();
        let p = Preparator::new(Arc::new(builder.freeze()), PreparatorConfig::default());
        assert!(p
            .prepare(&json!({ "a": "ok" }), &schema(json!({ "a": ["utf8-short"] })))
            .is_ok());
        let err = p
            .prepare(&json!({ "a": "too long" }), &schema(json!({ "a": ["utf8-short"] })))
            .unwrap_err();
        assert!(matches!(err.kind, CredError::TypeMismatch(_)));
    }

    #[test]
    fn test_link_after_spread_rejected() {
        let value = json!({ "k": "B62qqvKdn3TP2TSG9NYVLeiePxgSnJBJsSyRAZWAAFJpPWQ3Z5uy4Qk" });
        let err = preparator()
            .prepare(
                &value,
                &schema(json!({
                    "k": ["mina:base58-publickey", "mina:publickey-fields", "mina:field-uint"]
                })),
            )
            .unwrap_err();
        assert_eq!(err.kind, CredError::SpreadNotTerminal("mina:field-uint".into()));
        assert_eq!(err.path.as_deref(), Some("k"));
    }

    #[test]
    fn test_max_depth() {
        let p = Preparator::new(
            Arc::new(TransformationGraph::standard().unwrap()),
            PreparatorConfig {
                max_depth: 1,
                ..PreparatorConfig::default()
            },
        );
        let value = json!({ "a": { "b": "x" } });
        let err = p
            .prepare(&value, &schema(json!({ "a": { "b": ["utf8.identity"] } })))
            .unwrap_err();
        assert!(matches!(err.kind, CredError::InvalidSchema(_)));
        assert!(p
            .prepare(&json!({ "a": "x" }), &schema(json!({ "a": ["utf8.identity"] })))
            .is_ok());
    }

    #[test]
    fn test_negative_number_rejected() {
        let err = preparator()
            .prepare(&json!({ "n": -1 }), &schema(json!({ "n": ["uint.identity"] })))
            .unwrap_err();
        assert!(matches!(err.kind, CredError::TypeMismatch(_)));
        assert_eq!(err.path.as_deref(), Some("n"));
    }

    #[test]
    fn test_prepare_bytes_requires_byte_leaves() {
        let value = json!({ "a": 1, "b": 2 });
        let bytes = preparator()
            .prepare_bytes(
                &value,
                &schema(json!({ "a": ["uint-bytes2"], "b": ["uint-bytes2"] })),
            )
            .unwrap();
        assert_eq!(bytes, vec![0, 1, 0, 2]);

        let err = preparator()
            .prepare_bytes(&value, &schema(json!({ "a": ["uint-bytes2"], "b": ["uint.identity"] })))
            .unwrap_err();
        assert!(matches!(err.kind, CredError::NonByteOutput(_)));
        assert!(err.message.contains("element 1"));
    }

    #[test]
    fn test_root_chain() {
        let out = preparator()
            .prepare(&json!("abc"), &Schema::chain(["utf8-bytes"]))
            .unwrap();
        assert_eq!(out.as_slice(), &[FlatValue::Bytes(b"abc".to_vec())]);
    }
}
