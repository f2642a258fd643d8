pub mod document;

pub use document::GraphDocument;

use crate::error::GraphError;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Opaque identifier of a node within a graph. Assigned monotonically by the
/// graph and never reused, even after removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of node kinds the execution engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Input,
    Retrieval,
    Query,
    Condition,
    Memory,
    Output,
}

impl NodeKind {
    pub fn parse(s: &str) -> Result<Self, GraphError> {
        match s {
            "input" => Ok(NodeKind::Input),
            "retrieval" => Ok(NodeKind::Retrieval),
            "query" => Ok(NodeKind::Query),
            "condition" => Ok(NodeKind::Condition),
            "memory" => Ok(NodeKind::Memory),
            "output" => Ok(NodeKind::Output),
            other => Err(GraphError::UnsupportedNodeKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Retrieval => "retrieval",
            NodeKind::Query => "query",
            NodeKind::Condition => "condition",
            NodeKind::Memory => "memory",
            NodeKind::Output => "output",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which output port of a source node a connection leaves from. Ordinary
/// nodes emit on `Output`; condition nodes route `True` and `False`
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selector {
    #[default]
    Output,
    True,
    False,
}

/// A single processing node: identity, kind, and an ordered list of
/// configuration strings whose meaning is kind-specific (retrieval: document
/// reference; query: prompt fragments; condition: trigger substring; memory:
/// registry name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub content: Vec<String>,
}

/// A directed edge between two nodes, tagged with the source's output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
    pub selector: Selector,
}

/// The workflow graph: a set of nodes and the typed connections between them.
///
/// The graph owns its nodes and connections; mutation goes through its own
/// methods so that invariants (unique ids, connection dedup, cascade removal)
/// hold by construction.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    next_id: u32,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            next_id: 1,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the first input node, the workflow's single entry point.
    pub fn input_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Input)
    }

    /// Adds a node and returns its freshly allocated id.
    pub fn add_node(&mut self, kind: NodeKind, content: Vec<String>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push(Node { id, kind, content });
        id
    }

    /// Adds a connection. A duplicate (from, to, selector) triple is a no-op;
    /// an unknown endpoint is a fatal reference error.
    pub fn add_connection(
        &mut self,
        from: NodeId,
        to: NodeId,
        selector: Selector,
    ) -> Result<(), GraphError> {
        if self.node(from).is_none() {
            return Err(GraphError::UnknownNode(from));
        }
        if self.node(to).is_none() {
            return Err(GraphError::UnknownNode(to));
        }
        let candidate = Connection { from, to, selector };
        if !self.connections.contains(&candidate) {
            self.connections.push(candidate);
        }
        Ok(())
    }

    /// Removes a node together with every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) {
        self.connections.retain(|c| c.from != id && c.to != id);
        self.nodes.retain(|n| n.id != id);
    }

    /// Source ids of every connection arriving at `id`, in connection order.
    pub fn incoming(&self, id: NodeId) -> Vec<NodeId> {
        self.connections
            .iter()
            .filter(|c| c.to == id)
            .map(|c| c.from)
            .collect()
    }

    /// Destination ids of every connection leaving `id`, in connection order.
    pub fn outgoing(&self, id: NodeId) -> Vec<NodeId> {
        self.connections
            .iter()
            .filter(|c| c.from == id)
            .map(|c| c.to)
            .collect()
    }

    /// Destination ids reachable from `id` through a specific output port.
    pub fn outgoing_via(&self, id: NodeId, selector: Selector) -> Vec<NodeId> {
        self.connections
            .iter()
            .filter(|c| c.from == id && c.selector == selector)
            .map(|c| c.to)
            .collect()
    }

    /// Computes a topological order over all nodes with Kahn's algorithm.
    /// Every connection counts toward in-degree regardless of its selector.
    /// A short order means the graph has a cycle, which is fatal.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut indegree: AHashMap<NodeId, usize> =
            self.nodes.iter().map(|n| (n.id, 0)).collect();
        for c in &self.connections {
            if let Some(deg) = indegree.get_mut(&c.to) {
                *deg += 1;
            }
        }

        let mut queue: VecDeque<NodeId> = self
            .nodes
            .iter()
            .filter(|n| indegree[&n.id] == 0)
            .map(|n| n.id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            order.push(id);
            for succ in self.outgoing(id) {
                if let Some(deg) = indegree.get_mut(&succ) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(succ);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            return Err(GraphError::CycleDetected);
        }
        Ok(order)
    }

    /// Removes every node not reachable via outgoing connections from the
    /// input node, along with the removed nodes' connections. Idempotent.
    ///
    /// A graph without an input node cannot be pruned meaningfully and is a
    /// configuration error.
    pub fn prune_unreachable(&mut self) -> Result<(), GraphError> {
        let start = self.input_node().ok_or(GraphError::MissingInputNode)?.id;

        // Explicit worklist rather than recursion; editor-built graphs can
        // be arbitrarily deep.
        let mut reachable: AHashSet<NodeId> = AHashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            stack.extend(self.outgoing(id));
        }

        let doomed: Vec<NodeId> = self
            .nodes
            .iter()
            .map(|n| n.id)
            .filter(|id| !reachable.contains(id))
            .collect();
        for id in doomed {
            self.remove_node(id);
        }
        Ok(())
    }

    /// Inserts a node with a caller-supplied id. Only used when loading a
    /// document, where ids must be preserved exactly.
    pub(crate) fn insert_node_with_id(&mut self, id: NodeId, kind: NodeKind, content: Vec<String>) {
        self.nodes.push(Node { id, kind, content });
    }

    pub(crate) fn restore_next_id(&mut self, max_seen: u32) {
        if max_seen >= self.next_id {
            self.next_id = max_seen + 1;
        }
    }
}
