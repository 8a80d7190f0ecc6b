//! Question nodes and the validated flow table.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// Reserved identifier of the node every session starts at.
pub const ENTRY_NODE: &str = "start";

/// Identifier of a question node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One question in the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionNode {
    pub id: NodeId,
    /// Text shown to the visitor.
    pub prompt: String,
    /// Fixed choices, in display order. Empty for free-text nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Free text is accepted. Takes precedence over `options` when rendering.
    #[serde(default)]
    pub accepts_free_text: bool,
    /// Key under which the visitor's answer is stored.
    pub answer_field_key: String,
    /// Following node; `None` marks the terminal node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<NodeId>,
}

impl QuestionNode {
    /// A fixed-choice question.
    pub fn choice<I, S>(id: &str, prompt: &str, answer_field_key: &str, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: NodeId::from(id),
            prompt: prompt.to_string(),
            options: options.into_iter().map(Into::into).collect(),
            accepts_free_text: false,
            answer_field_key: answer_field_key.to_string(),
            next_id: None,
        }
    }

    /// A free-text question.
    pub fn open(id: &str, prompt: &str, answer_field_key: &str) -> Self {
        Self {
            id: NodeId::from(id),
            prompt: prompt.to_string(),
            options: Vec::new(),
            accepts_free_text: true,
            answer_field_key: answer_field_key.to_string(),
            next_id: None,
        }
    }

    /// Set the successor node.
    pub fn then(mut self, next: &str) -> Self {
        self.next_id = Some(NodeId::from(next));
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.next_id.is_none()
    }

    /// Whether the visitor picks from a list (free text overrides options).
    pub fn is_fixed_choice(&self) -> bool {
        !self.accepts_free_text && !self.options.is_empty()
    }

    /// Whether `answer` matches one of the listed options.
    pub fn is_option(&self, answer: &str) -> bool {
        let answer = answer.trim();
        self.options.iter().any(|o| o == answer)
    }
}

/// Serialized form of a flow table: either a list of nodes or a mapping
/// from node id to node.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlowDocument {
    List(Vec<QuestionNode>),
    Keyed(BTreeMap<String, QuestionNode>),
}

/// A validated, immutable questionnaire.
///
/// Nodes are stored in chain order starting from the entry node, so walking
/// the flow is an index increment and can never dangle.
#[derive(Debug, Clone)]
pub struct FlowTable {
    nodes: Vec<QuestionNode>,
    index: HashMap<NodeId, usize>,
}

impl FlowTable {
    /// Validate `nodes` and build the table.
    ///
    /// Fails if the table is empty, ids repeat, the entry node is missing,
    /// a `next_id` does not resolve, the chain loops, or some node is
    /// unreachable from the entry.
    pub fn new(nodes: Vec<QuestionNode>) -> Result<Self, FlowError> {
        if nodes.is_empty() {
            return Err(FlowError::Empty);
        }

        let mut by_id: HashMap<NodeId, QuestionNode> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if !node.accepts_free_text && node.options.is_empty() {
                return Err(FlowError::NoAnswerMode(node.id.to_string()));
            }
            if by_id.contains_key(&node.id) {
                return Err(FlowError::DuplicateNode(node.id.to_string()));
            }
            by_id.insert(node.id.clone(), node);
        }

        let entry = NodeId::from(ENTRY_NODE);
        if !by_id.contains_key(&entry) {
            return Err(FlowError::MissingEntry(ENTRY_NODE.to_string()));
        }

        // Sort for a deterministic error when several references dangle.
        let mut ids: Vec<&NodeId> = by_id.keys().collect();
        ids.sort();
        for id in ids {
            if let Some(ref target) = by_id[id].next_id {
                if !by_id.contains_key(target) {
                    return Err(FlowError::UnknownNodeReference {
                        from: id.to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }

        let mut chain = Vec::with_capacity(by_id.len());
        let mut seen = HashSet::new();
        let mut cursor = Some(entry);
        while let Some(id) = cursor {
            if !seen.insert(id.clone()) {
                return Err(FlowError::Cycle(id.to_string()));
            }
            let node = by_id[&id].clone();
            cursor = node.next_id.clone();
            chain.push(node);
        }

        if chain.len() < by_id.len() {
            let mut orphans: Vec<&NodeId> = by_id.keys().filter(|id| !seen.contains(*id)).collect();
            orphans.sort();
            if let Some(orphan) = orphans.first() {
                return Err(FlowError::Unreachable(orphan.to_string()));
            }
        }

        let index = chain
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();

        Ok(Self {
            nodes: chain,
            index,
        })
    }

    /// Parse and validate a JSON flow table.
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let nodes = match serde_json::from_str::<FlowDocument>(json)? {
            FlowDocument::List(nodes) => nodes,
            FlowDocument::Keyed(map) => map
                .into_iter()
                .map(|(key, node)| {
                    if node.id.as_str() == key {
                        Ok(node)
                    } else {
                        Err(FlowError::KeyMismatch {
                            key,
                            id: node.id.to_string(),
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        Self::new(nodes)
    }

    /// Load a JSON flow table from disk.
    pub async fn load(path: &Path) -> Result<Self, crate::error::Error> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(crate::error::ConfigError::Io)?;
        Ok(Self::from_json(&json)?)
    }

    /// The entry node.
    pub fn entry(&self) -> &QuestionNode {
        &self.nodes[0]
    }

    /// Look up a node by id.
    pub fn get(&self, id: &str) -> Option<&QuestionNode> {
        self.index.get(&NodeId::from(id)).map(|&i| &self.nodes[i])
    }

    /// Node at a chain position.
    pub fn at(&self, position: usize) -> Option<&QuestionNode> {
        self.nodes.get(position)
    }

    /// Chain position of the node following `position`, if any.
    pub fn successor(&self, position: usize) -> Option<usize> {
        let node = self.nodes.get(position)?;
        node.next_id.as_ref().map(|_| position + 1)
    }

    /// Chain position of a node id.
    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Nodes in the order a session visits them.
    pub fn iter(&self) -> impl Iterator<Item = &QuestionNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Answer field keys in visiting order.
    pub fn field_keys(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .map(|n| n.answer_field_key.as_str())
            .collect()
    }
}
