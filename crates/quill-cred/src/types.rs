use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{CredError, CredErrorDetail, CredResult};
use crate::schema::{Schema, SchemaVersions};

// ---------------------------------------------------------------------------
// Identifier: typed key of a subject or issuer
// ---------------------------------------------------------------------------

/// `t` is the numeric identifier type (key scheme), `k` the key itself in
/// whatever textual form that scheme uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub t: u64,
    pub k: String,
}

impl Identifier {
    pub fn new(t: u64, k: impl Into<String>) -> Self {
        Self { t, k: k.into() }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{t:{}, k:{}}}", self.t, self.k)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuerRef {
    pub id: Identifier,
}

impl IssuerRef {
    pub fn new(t: u64, k: impl Into<String>) -> Self {
        Self {
            id: Identifier::new(t, k),
        }
    }
}

// ---------------------------------------------------------------------------
// CredentialAttributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Identifier,
    /// Type-specific subject fields (e.g. a GitHub account id, KYC fields).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The attribute tree that gets encoded, hashed and signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialAttributes {
    /// Credential schema (type) number.
    pub sch: u64,
    /// Issuance date, epoch milliseconds.
    pub isd: u64,
    /// Expiration date, epoch milliseconds; 0 means no expiry.
    pub exd: u64,
    pub sbj: Subject,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CredentialAttributes {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.exd != 0 && now_ms >= self.exd
    }

    pub fn to_value(&self) -> CredResult<Value> {
        serde_json::to_value(self).map_err(|e| {
            CredErrorDetail::new(
                CredError::EncodingFailed(e.to_string()),
                "credential attributes could not be rendered as JSON",
            )
        })
    }
}

// ---------------------------------------------------------------------------
// ProofEntry: one signature plus the schema versions it was made under
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSignature {
    /// Raw signature in the proof system's textual encoding.
    pub sign: String,
    pub isr: IssuerRef,
}

impl ProofSignature {
    /// JSON envelope prepared by signature schemas.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "sign": self.sign,
            "isr": { "id": { "t": self.isr.id.t, "k": self.isr.id.k } },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofEntry {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub signature: ProofSignature,
    #[serde(default)]
    pub attribute_schemas: SchemaVersions,
    #[serde(default)]
    pub signature_schemas: SchemaVersions,
}

impl ProofEntry {
    pub fn issuer(&self) -> &Identifier {
        &self.signature.isr.id
    }

    pub fn attribute_schema(&self, version: &str) -> Option<&Schema> {
        self.attribute_schemas.get(version)
    }

    pub fn signature_schema(&self, version: &str) -> Option<&Schema> {
        self.signature_schemas.get(version)
    }

    /// Version names defined for attributes, sorted.
    pub fn available_versions(&self) -> Vec<String> {
        self.attribute_schemas.keys().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// ProofSet: proofs as a list or keyed by issuer
// ---------------------------------------------------------------------------

/// Proofs keyed by issuer key, kept in document order so that position
/// means the same thing as in a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuerProofs(Vec<(String, ProofEntry)>);

impl IssuerProofs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ProofEntry> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, entry)| entry)
    }

    /// An existing entry under `key` is replaced in place; otherwise the
    /// entry is appended.
    pub fn insert(&mut self, key: String, entry: ProofEntry) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = entry,
            None => self.0.push((key, entry)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &ProofEntry> {
        self.0.iter().map(|(_, entry)| entry)
    }
}

impl FromIterator<(String, ProofEntry)> for IssuerProofs {
    fn from_iter<I: IntoIterator<Item = (String, ProofEntry)>>(iter: I) -> Self {
        let mut proofs = IssuerProofs::new();
        for (key, entry) in iter {
            proofs.insert(key, entry);
        }
        proofs
    }
}

impl Serialize for IssuerProofs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, entry) in &self.0 {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

struct IssuerProofsVisitor;

impl<'de> Visitor<'de> for IssuerProofsVisitor {
    type Value = IssuerProofs;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of issuer key to proof")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<IssuerProofs, A::Error> {
        let mut proofs = IssuerProofs::new();
        while let Some((key, entry)) = access.next_entry::<String, ProofEntry>()? {
            proofs.insert(key, entry);
        }
        Ok(proofs)
    }
}

impl<'de> Deserialize<'de> for IssuerProofs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(IssuerProofsVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofSet {
    List(Vec<ProofEntry>),
    ByIssuer(IssuerProofs),
}

impl Default for ProofSet {
    fn default() -> Self {
        ProofSet::List(Vec::new())
    }
}

impl ProofSet {
    /// Entries in document order, for lists and issuer-keyed maps alike.
    pub fn entries(&self) -> Vec<&ProofEntry> {
        match self {
            ProofSet::List(list) => list.iter().collect(),
            ProofSet::ByIssuer(map) => map.values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ProofSet::List(list) => list.len(),
            ProofSet::ByIssuer(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a proof. Maps are keyed by the issuer key; an existing entry for
    /// the same issuer is replaced.
    pub fn push(&mut self, entry: ProofEntry) {
        match self {
            ProofSet::List(list) => list.push(entry),
            ProofSet::ByIssuer(map) => {
                map.insert(entry.issuer().k.clone(), entry);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub attributes: CredentialAttributes,
    #[serde(default)]
    pub proofs: ProofSet,
}

// ---------------------------------------------------------------------------
// PreparatorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparatorConfig {
    /// Schema version used when a selector names none.
    #[serde(default = "default_schema_version")]
    pub default_schema_version: String,

    /// Check every link's input and output against its declared node.
    #[serde(default = "default_strict_types")]
    pub strict_types: bool,

    /// Maximum nesting depth of a schema walk.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_schema_version() -> String {
    "default".to_string()
}

fn default_strict_types() -> bool {
    true
}

fn default_max_depth() -> usize {
    32
}

impl Default for PreparatorConfig {
    fn default() -> Self {
        Self {
            default_schema_version: default_schema_version(),
            strict_types: default_strict_types(),
            max_depth: default_max_depth(),
        }
    }
}
