//! Transformation graph: named value types (nodes) and named single-input
//! transformations between them (links).
//!
//! The graph is assembled once through a [`GraphBuilder`] and then frozen
//! into an immutable [`TransformationGraph`] that is shared across threads.
//! It never searches for paths; schemas name the exact chain of links for
//! every leaf and the graph only resolves and applies them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use quill_core::{FlatValue, ValueKind};

use crate::error::{CredError, CredErrorDetail, CredResult};

/// Extra membership test applied after the kind check, e.g. "only base58
/// characters" for a `utf8`-kinded node.
pub type NodeCheck = Arc<dyn Fn(&FlatValue) -> bool + Send + Sync>;

pub type SingleFn = Arc<dyn Fn(&FlatValue) -> Result<FlatValue, String> + Send + Sync>;
pub type SpreadFn = Arc<dyn Fn(&FlatValue) -> Result<Vec<FlatValue>, String> + Send + Sync>;

// ---------------------------------------------------------------------------
// GraphNode
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GraphNode {
    pub name: String,
    pub kind: ValueKind,
    /// Values of this type are sequences that occupy several output slots.
    pub spread: bool,
    check: Option<NodeCheck>,
}

impl GraphNode {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            spread: false,
            check: None,
        }
    }

    pub fn spread(mut self) -> Self {
        self.spread = true;
        self
    }

    pub fn with_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&FlatValue) -> bool + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }

    /// Whether values typed as `produced` may feed a link taking this node.
    /// A narrowed node (same kind plus a check) feeds its unchecked kind;
    /// the reverse direction is left to the runtime check.
    pub fn accepts(&self, produced: &GraphNode) -> bool {
        self.name == produced.name
            || (self.kind == produced.kind && self.check.is_none() && self.spread == produced.spread)
    }

    /// For spread nodes this tests one element of the sequence.
    pub fn is_type(&self, value: &FlatValue) -> bool {
        value.kind() == self.kind && self.check.as_ref().map_or(true, |check| check(value))
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("spread", &self.spread)
            .field("checked", &self.check.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// GraphLink
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum LinkTransform {
    Single(SingleFn),
    Spread(SpreadFn),
}

/// Result of applying one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutput {
    One(FlatValue),
    Many(Vec<FlatValue>),
}

#[derive(Clone)]
pub struct GraphLink {
    pub name: String,
    pub input: String,
    pub output: String,
    pub transform: LinkTransform,
}

impl GraphLink {
    pub fn single<F>(
        name: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
        transform: F,
    ) -> Self
    where
        F: Fn(&FlatValue) -> Result<FlatValue, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            input: input.into(),
            output: output.into(),
            transform: LinkTransform::Single(Arc::new(transform)),
        }
    }

    pub fn spread<F>(
        name: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
        transform: F,
    ) -> Self
    where
        F: Fn(&FlatValue) -> Result<Vec<FlatValue>, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            input: input.into(),
            output: output.into(),
            transform: LinkTransform::Spread(Arc::new(transform)),
        }
    }

    pub fn is_spread(&self) -> bool {
        matches!(self.transform, LinkTransform::Spread(_))
    }

    /// Apply the transform. Failures carry the link name.
    pub fn apply(&self, value: &FlatValue) -> CredResult<LinkOutput> {
        let result = match &self.transform {
            LinkTransform::Single(f) => f(value).map(LinkOutput::One),
            LinkTransform::Spread(f) => f(value).map(LinkOutput::Many),
        };
        result.map_err(|reason| {
            CredErrorDetail::new(
                CredError::TransformFailed {
                    link: self.name.clone(),
                    reason: reason.clone(),
                },
                reason,
            )
        })
    }
}

impl fmt::Debug for GraphLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphLink")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("spread", &self.is_spread())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// GraphExtension: the only way new proof systems join the graph
// ---------------------------------------------------------------------------

/// A named bundle of nodes and links. Registering the same extension twice
/// is harmless: names collide and the later definition wins.
pub trait GraphExtension {
    fn name(&self) -> &str;
    fn nodes(&self) -> Vec<GraphNode>;
    fn links(&self) -> Vec<GraphLink>;
}

// ---------------------------------------------------------------------------
// GraphBuilder: setup-time, mutable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    nodes: HashMap<String, GraphNode>,
    links: HashMap<String, GraphLink>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge nodes and links into the registry. Nodes are merged first so a
    /// single call can introduce a node and the links that use it. Either
    /// everything is registered or, on error, nothing is.
    pub fn register(&mut self, nodes: Vec<GraphNode>, links: Vec<GraphLink>) -> CredResult<()> {
        let mut staged_nodes = self.nodes.clone();
        for node in nodes {
            if staged_nodes.contains_key(&node.name) {
                tracing::debug!(node = %node.name, "overwriting graph node");
            }
            staged_nodes.insert(node.name.clone(), node);
        }

        for link in &links {
            check_link(&staged_nodes, link)?;
        }

        self.nodes = staged_nodes;
        for link in links {
            if self.links.contains_key(&link.name) {
                tracing::debug!(link = %link.name, "overwriting graph link");
            }
            self.links.insert(link.name.clone(), link);
        }
        Ok(())
    }

    pub fn extend(&mut self, extension: &dyn GraphExtension) -> CredResult<()> {
        tracing::debug!(extension = extension.name(), "registering graph extension");
        self.register(extension.nodes(), extension.links())
    }

    pub fn with_extension(mut self, extension: &dyn GraphExtension) -> CredResult<Self> {
        self.extend(extension)?;
        Ok(self)
    }

    pub fn freeze(self) -> TransformationGraph {
        tracing::debug!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            "transformation graph frozen"
        );
        TransformationGraph {
            nodes: self.nodes,
            links: self.links,
        }
    }
}

fn check_link(nodes: &HashMap<String, GraphNode>, link: &GraphLink) -> CredResult<()> {
    let input = nodes.get(&link.input).ok_or_else(|| {
        CredErrorDetail::new(
            CredError::UnknownNode(link.input.clone()),
            format!(
                "link '{}' takes unregistered node '{}'",
                link.name, link.input
            ),
        )
    })?;
    let output = nodes.get(&link.output).ok_or_else(|| {
        CredErrorDetail::new(
            CredError::UnknownNode(link.output.clone()),
            format!(
                "link '{}' produces unregistered node '{}'",
                link.name, link.output
            ),
        )
    })?;
    if input.spread {
        return Err(CredErrorDetail::new(
            CredError::InvalidLink(link.name.clone()),
            format!(
                "link '{}' takes spread node '{}'; links are single-input",
                link.name, input.name
            ),
        ));
    }
    if link.is_spread() != output.spread {
        return Err(CredErrorDetail::new(
            CredError::InvalidLink(link.name.clone()),
            format!(
                "link '{}' spread={} but output node '{}' spread={}",
                link.name,
                link.is_spread(),
                output.name,
                output.spread
            ),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TransformationGraph: frozen, read-only, shareable
// ---------------------------------------------------------------------------

/// Immutable registry produced by [`GraphBuilder::freeze`]. There is no way
/// to mutate it; concurrent prepare calls only read.
#[derive(Debug, Clone)]
pub struct TransformationGraph {
    nodes: HashMap<String, GraphNode>,
    links: HashMap<String, GraphLink>,
}

impl TransformationGraph {
    /// Base primitives plus the secp256k1 and Mina extensions.
    pub fn standard() -> CredResult<Self> {
        use crate::links::{BaseExtension, MinaExtension, Secp256k1Extension};
        Ok(GraphBuilder::new()
            .with_extension(&BaseExtension)?
            .with_extension(&Secp256k1Extension)?
            .with_extension(&MinaExtension)?
            .freeze())
    }

    pub fn resolve(&self, name: &str) -> CredResult<&GraphLink> {
        self.links.get(name).ok_or_else(|| {
            CredErrorDetail::new(
                CredError::UnknownLink(name.to_string()),
                format!("link '{}' is not registered", name),
            )
        })
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    pub fn contains_link(&self, name: &str) -> bool {
        self.links.contains_key(name)
    }

    pub fn link_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.links.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Links sorted by name, for listing.
    pub fn links(&self) -> Vec<&GraphLink> {
        let sorted: BTreeMap<&str, &GraphLink> =
            self.links.iter().map(|(k, v)| (k.as_str(), v)).collect();
        sorted.into_values().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Copy the registry into a new builder; the frozen graph is untouched.
    pub fn to_builder(&self) -> GraphBuilder {
        GraphBuilder {
            nodes: self.nodes.clone(),
            links: self.links.clone(),
        }
    }
}
