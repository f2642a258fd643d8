use crate::graph::NodeId;
use thiserror::Error;

/// Errors that can occur while constructing or validating a workflow graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Failed to parse graph document: {0}")]
    DocumentParse(String),

    #[error("Connection references unknown node id '{0}'")]
    UnknownNode(NodeId),

    #[error("Unsupported node kind: '{0}'")]
    UnsupportedNodeKind(String),

    #[error("Cycle detected in the connection graph; cannot schedule execution")]
    CycleDetected,

    #[error("Graph has no input node; a workflow requires exactly one entry point")]
    MissingInputNode,

    #[error("Condition node {0} has no configured trigger string")]
    ConditionWithoutTrigger(NodeId),
}

/// Errors that abort an in-flight question.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Language model invocation failed at node {node}: {source}")]
    Llm {
        node: NodeId,
        #[source]
        source: LlmError,
    },
}

/// Errors raised by a language-model collaborator.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Malformed response: {0}")]
    Response(String),
}

/// Errors raised by a retrieval collaborator. Within a run these degrade the
/// retrieval node (gate-fail semantics); they never abort the question.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Document '{reference}' could not be loaded: {message}")]
    DocumentLoad { reference: String, message: String },

    #[error("Index for '{reference}' could not be built or persisted: {message}")]
    Index { reference: String, message: String },
}

/// Errors raised by the memory log subsystem.
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Could not write to registry '{registry}': {message}")]
    Write { registry: String, message: String },

    #[error("Could not read registry '{registry}': {message}")]
    Read { registry: String, message: String },
}
