//! The execution engine: builds a runnable workflow from a graph and answers
//! questions against it.
//!
//! Building validates the graph (condition triggers present, input node
//! exists, no cycles), prunes it to the subgraph reachable from the input
//! node, and fixes a topological execution order. Asking a question runs
//! every scheduled node once, in that order, against a fresh run-state.

mod handlers;

use crate::error::{GraphError, RunError};
use crate::graph::{Graph, NodeId, NodeKind};
use crate::llm::LanguageModel;
use crate::memory::MemoryStore;
use crate::retrieval::Retriever;
use ahash::AHashMap;
use itertools::Itertools;
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// The value a node stores for the current run. Every node produces text
/// except a condition node, which stores the list of downstream ids allowed
/// to proceed on its taken branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunValue {
    Text(String),
    Branch(Vec<NodeId>),
}

impl RunValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RunValue::Text(s) => Some(s),
            RunValue::Branch(_) => None,
        }
    }
}

impl fmt::Display for RunValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunValue::Text(s) => f.write_str(s),
            RunValue::Branch(ids) => write!(f, "[{}]", ids.iter().join(", ")),
        }
    }
}

/// Ephemeral state for one question: created fresh in [`Workflow::ask`],
/// threaded through every node handler, discarded once the answer is out.
#[derive(Debug, Default)]
pub struct RunState {
    pub question: String,
    pub data: AHashMap<NodeId, RunValue>,
    pub activation: AHashMap<NodeId, bool>,
    pub answer: String,
}

impl RunState {
    fn new(question: &str) -> Self {
        Self {
            question: question.to_string(),
            ..Self::default()
        }
    }
}

/// A validated, scheduled workflow bound to its collaborators.
pub struct Workflow {
    graph: Graph,
    llm: Box<dyn LanguageModel>,
    retriever: Box<dyn Retriever>,
    memory: MemoryStore,
    order: Vec<NodeId>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("graph", &self.graph)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Workflow`]. The graph and language model are required;
/// retrieval and memory collaborators can be swapped out before `build`.
pub struct WorkflowBuilder {
    graph: Graph,
    llm: Box<dyn LanguageModel>,
    retriever: Box<dyn Retriever>,
    memory: MemoryStore,
}

impl WorkflowBuilder {
    pub fn new(graph: Graph, llm: Box<dyn LanguageModel>) -> Self {
        Self {
            graph,
            llm,
            retriever: Box::new(crate::retrieval::LexicalRetriever::new(".")),
            memory: MemoryStore::new("."),
        }
    }

    pub fn with_retriever(mut self, retriever: Box<dyn Retriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_memory(mut self, memory: MemoryStore) -> Self {
        self.memory = memory;
        self
    }

    /// Validates and schedules the workflow. Fatal configuration errors
    /// (missing input node, empty condition trigger, cycle) surface here.
    pub fn build(mut self) -> Result<Workflow, GraphError> {
        self.graph.prune_unreachable()?;

        for node in self.graph.nodes() {
            if node.kind == NodeKind::Condition
                && node.content.first().map_or(true, |t| t.is_empty())
            {
                return Err(GraphError::ConditionWithoutTrigger(node.id));
            }
        }

        let order = self.graph.topological_order()?;
        debug!(nodes = order.len(), "workflow scheduled");

        Ok(Workflow {
            graph: self.graph,
            llm: self.llm,
            retriever: self.retriever,
            memory: self.memory,
            order,
        })
    }
}

impl Workflow {
    pub fn builder(graph: Graph, llm: Box<dyn LanguageModel>) -> WorkflowBuilder {
        WorkflowBuilder::new(graph, llm)
    }

    /// The pruned graph this workflow executes.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The fixed execution order.
    pub fn execution_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Answers one question: runs every scheduled node once, in topological
    /// order, against a fresh run-state, and returns the output node's
    /// stored result (empty if no output node activated).
    ///
    /// Execution is strictly single-threaded; language-model and similarity
    /// calls block the whole run until they return.
    pub fn ask(&self, question: &str) -> Result<String, RunError> {
        let mut state = RunState::new(question);
        debug!(question, "starting workflow run");
        let started = Instant::now();

        for id in &self.order {
            // Nodes are only ever removed before scheduling, so the order
            // stays aligned with the graph.
            if let Some(node) = self.graph.node(*id) {
                debug!(node = %node.id, kind = %node.kind, "executing node");
                self.execute_node(node, &mut state)?;
            }
        }

        debug!(elapsed = ?started.elapsed(), "workflow run complete");
        Ok(state.answer)
    }
}
