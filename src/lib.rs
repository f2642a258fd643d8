//! # Keiro - Workflow Graph Construction and Execution Engine
//!
//! **Keiro** executes directed workflows of typed processing nodes (input,
//! retrieval, query, condition, memory, output) against a natural-language
//! question, producing one composed answer. A graph editor produces the
//! serialized graph document; Keiro loads it, prunes it to the subgraph
//! reachable from the input node, validates acyclicity, fixes a topological
//! execution order, and runs each node once per question.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: Parse a graph document (JSON) into a [`graph::Graph`], or
//!     assemble one programmatically through its mutation methods.
//! 2.  **Build**: Use [`engine::Workflow::builder`] with your collaborators —
//!     a [`llm::LanguageModel`] and optionally a [`retrieval::Retriever`] and
//!     [`memory::MemoryStore`]. Building validates and schedules the graph;
//!     configuration errors (cycles, missing input node, untriggered
//!     conditions) surface here.
//! 3.  **Ask**: Call [`engine::Workflow::ask`] with a question. Nodes gate
//!     themselves on their predecessors' activation and on condition branch
//!     tokens, so only the taken branch of a condition does work.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//!
//! struct Echo;
//! impl LanguageModel for Echo {
//!     fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
//!         Ok(prompt.to_string())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut graph = Graph::new();
//!     let input = graph.add_node(NodeKind::Input, vec![]);
//!     let query = graph.add_node(NodeKind::Query, vec!["Answer briefly: ".to_string()]);
//!     let output = graph.add_node(NodeKind::Output, vec![]);
//!     graph.add_connection(input, query, Selector::Output)?;
//!     graph.add_connection(query, output, Selector::Output)?;
//!
//!     let workflow = Workflow::builder(graph, Box::new(Echo)).build()?;
//!     let answer = workflow.ask("What is a workflow?")?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod prelude;
pub mod retrieval;
