//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and traits from the keiro crate.
//! Import this module to get the core surface without importing each type
//! individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//!
//! # struct Stub;
//! # impl LanguageModel for Stub {
//! #     fn invoke(&self, p: &str) -> Result<String, LlmError> { Ok(p.to_string()) }
//! # }
//! # fn run_example() -> Result<(), Box<dyn std::error::Error>> {
//! let json = std::fs::read_to_string("path/to/graph.json")?;
//! let graph = Graph::from_json(&json)?;
//!
//! let workflow = Workflow::builder(graph, Box::new(Stub))
//!     .with_memory(MemoryStore::new("data"))
//!     .with_retriever(Box::new(LexicalRetriever::new("data")))
//!     .build()?;
//!
//! let answer = workflow.ask("What does the document say about routing?")?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{Connection, Graph, GraphDocument, Node, NodeId, NodeKind, Selector};

// Execution engine
pub use crate::engine::{RunState, RunValue, Workflow, WorkflowBuilder};

// Collaborator contracts and defaults
pub use crate::llm::LanguageModel;
pub use crate::memory::MemoryStore;
pub use crate::retrieval::{LexicalRetriever, Retriever, ScoredChunk, SimilarityIndex};

// Error types
pub use crate::error::{GraphError, LlmError, MemoryError, RetrievalError, RunError};
