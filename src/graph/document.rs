//! Serialized form of a workflow graph, as produced and consumed by the
//! visual editor. Ids, kinds, content lists, and connections round-trip; a
//! connection's selector defaults to "output" when absent.

use super::{Graph, NodeId, NodeKind, Selector};
use crate::error::GraphError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeDocument>,
    pub connections: Vec<ConnectionDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: u32,
    pub kind: String,
    #[serde(default)]
    pub content: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDocument {
    pub from: u32,
    pub to: u32,
    #[serde(default)]
    pub selector: Selector,
}

impl GraphDocument {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::DocumentParse(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| {
            GraphError::DocumentParse(format!(
                "Could not read '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::DocumentParse(e.to_string()))
    }
}

impl Graph {
    /// Reconstructs a graph from its document form. Connections referencing
    /// an id no node carries are a fatal reference error.
    pub fn from_document(doc: &GraphDocument) -> Result<Self, GraphError> {
        let mut graph = Graph::new();
        let mut known: AHashMap<u32, NodeId> = AHashMap::new();
        let mut max_seen = 0;

        for node_doc in &doc.nodes {
            let kind = NodeKind::parse(&node_doc.kind)?;
            let id = NodeId(node_doc.id);
            graph.insert_node_with_id(id, kind, node_doc.content.clone());
            known.insert(node_doc.id, id);
            max_seen = max_seen.max(node_doc.id);
        }
        graph.restore_next_id(max_seen);

        for conn_doc in &doc.connections {
            let from = *known
                .get(&conn_doc.from)
                .ok_or(GraphError::UnknownNode(NodeId(conn_doc.from)))?;
            let to = *known
                .get(&conn_doc.to)
                .ok_or(GraphError::UnknownNode(NodeId(conn_doc.to)))?;
            graph.add_connection(from, to, conn_doc.selector)?;
        }
        Ok(graph)
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Self::from_document(&GraphDocument::from_json(json)?)
    }

    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self
                .nodes()
                .iter()
                .map(|n| NodeDocument {
                    id: n.id.0,
                    kind: n.kind.as_str().to_string(),
                    content: n.content.clone(),
                })
                .collect(),
            connections: self
                .connections()
                .iter()
                .map(|c| ConnectionDocument {
                    from: c.from.0,
                    to: c.to.0,
                    selector: c.selector,
                })
                .collect(),
        }
    }
}
