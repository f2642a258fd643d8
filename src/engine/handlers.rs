//! Per-kind node behavior and the gating protocol.

use super::{RunState, RunValue, Workflow};
use crate::error::RunError;
use crate::graph::{Node, NodeId, NodeKind, Selector};
use crate::retrieval::TOP_K;
use itertools::Itertools;
use tracing::{debug, warn};

impl Workflow {
    pub(super) fn execute_node(&self, node: &Node, state: &mut RunState) -> Result<(), RunError> {
        match node.kind {
            NodeKind::Input => self.run_input(node, state),
            NodeKind::Retrieval => self.run_retrieval(node, state),
            NodeKind::Query => self.run_query(node, state)?,
            NodeKind::Condition => self.run_condition(node, state),
            NodeKind::Memory => self.run_memory(node, state),
            NodeKind::Output => self.run_output(node, state),
        }
        Ok(())
    }

    /// The gate a node evaluates before doing work: AND over all incoming
    /// connections. A non-condition predecessor must be activated; a
    /// condition predecessor must have stored a branch token naming this
    /// node. No incoming connections means a vacuously open gate.
    fn gate_open(&self, node: &Node, state: &RunState) -> bool {
        self.graph.incoming(node.id).iter().all(|src| {
            let is_condition = self
                .graph
                .node(*src)
                .map_or(false, |n| n.kind == NodeKind::Condition);
            if is_condition {
                matches!(
                    state.data.get(src),
                    Some(RunValue::Branch(ids)) if ids.contains(&node.id)
                )
            } else {
                matches!(state.activation.get(src), Some(true))
            }
        })
    }

    /// Concatenated data of all non-condition predecessors, in
    /// incoming-connection order. With the gate open these are all present.
    fn gathered_inputs(&self, id: NodeId, state: &RunState) -> String {
        self.graph
            .incoming(id)
            .iter()
            .filter(|src| {
                self.graph
                    .node(**src)
                    .map_or(false, |n| n.kind != NodeKind::Condition)
            })
            .filter_map(|src| state.data.get(src))
            .map(|value| value.to_string())
            .join("")
    }

    fn run_input(&self, node: &Node, state: &mut RunState) {
        state.activation.insert(node.id, true);
        state
            .data
            .insert(node.id, RunValue::Text(state.question.clone()));
        self.push_to_memory(node.id, state);
    }

    fn run_retrieval(&self, node: &Node, state: &mut RunState) {
        if !self.gate_open(node, state) {
            state.activation.insert(node.id, false);
            return;
        }

        let Some(document) = node.content.first() else {
            warn!(node = %node.id, "retrieval node has no document reference; deactivating");
            state.activation.insert(node.id, false);
            return;
        };
        let index = match self.retriever.open(document) {
            Ok(index) => index,
            Err(e) => {
                // Local failure: the node starves its dependents instead of
                // aborting the run.
                warn!(node = %node.id, error = %e, "retrieval index unavailable; deactivating");
                state.activation.insert(node.id, false);
                return;
            }
        };

        let query = self.gathered_inputs(node.id, state);
        let chunks = index.search(&query, TOP_K);
        debug!(node = %node.id, document = %document, retrieved = chunks.len(), "similarity search done");
        let retrieved = chunks.iter().map(|c| c.text.as_str()).join("\n\n");

        state.data.insert(node.id, RunValue::Text(retrieved));
        state.activation.insert(node.id, true);
        self.push_to_memory(node.id, state);
    }

    fn run_query(&self, node: &Node, state: &mut RunState) -> Result<(), RunError> {
        if !self.gate_open(node, state) {
            state.activation.insert(node.id, false);
            return Ok(());
        }

        state.activation.insert(node.id, true);
        let prompt = format!(
            "{}{}",
            node.content.concat(),
            self.gathered_inputs(node.id, state)
        );
        debug!(node = %node.id, prompt_chars = prompt.len(), "invoking language model");
        let response = self.llm.invoke(&prompt).map_err(|source| RunError::Llm {
            node: node.id,
            source,
        })?;

        state.data.insert(node.id, RunValue::Text(response));
        self.push_to_memory(node.id, state);
        Ok(())
    }

    fn run_condition(&self, node: &Node, state: &mut RunState) {
        if !self.gate_open(node, state) {
            state.activation.insert(node.id, false);
            return;
        }

        state.activation.insert(node.id, true);
        // An empty trigger is rejected at build time.
        let trigger = node.content.first().map(String::as_str).unwrap_or_default();
        let text = self.gathered_inputs(node.id, state);
        let selector = if text.contains(trigger) {
            Selector::True
        } else {
            Selector::False
        };
        let branch = self.graph.outgoing_via(node.id, selector);
        debug!(node = %node.id, trigger, taken = ?selector, targets = branch.len(), "condition resolved");

        state.data.insert(node.id, RunValue::Branch(branch));
        self.push_to_memory(node.id, state);
    }

    fn run_memory(&self, node: &Node, state: &mut RunState) {
        let registry = node.content.first().map(String::as_str).unwrap_or_default();
        let history = match self.memory.read_history(registry) {
            Ok(history) => history,
            Err(e) => {
                warn!(node = %node.id, registry, error = %e, "registry unreadable; using empty history");
                String::new()
            }
        };

        state.data.insert(node.id, RunValue::Text(history));
        state.activation.insert(node.id, true);
        self.push_to_memory(node.id, state);
    }

    fn run_output(&self, node: &Node, state: &mut RunState) {
        // Deliberately keyed on data presence, not activation: this is the
        // documented asymmetry of the output node.
        let answer: String = self
            .graph
            .incoming(node.id)
            .iter()
            .filter_map(|src| state.data.get(src))
            .map(|value| value.to_string())
            .join("");
        debug!(node = %node.id, answer_chars = answer.len(), "answer composed");

        state.answer = answer.clone();
        state.data.insert(node.id, RunValue::Text(answer));
        state.activation.insert(node.id, true);
        self.push_to_memory(node.id, state);
    }

    /// The memory side-channel: a node that produced a result pushes its
    /// rendered value to every directly connected memory node's registry,
    /// independent of gating. Write failures are logged and absorbed.
    fn push_to_memory(&self, id: NodeId, state: &RunState) {
        let Some(value) = state.data.get(&id) else {
            return;
        };
        for target in self.graph.outgoing(id) {
            let Some(target_node) = self.graph.node(target) else {
                continue;
            };
            if target_node.kind != NodeKind::Memory {
                continue;
            }
            let registry = target_node
                .content
                .first()
                .map(String::as_str)
                .unwrap_or_default();
            if let Err(e) = self.memory.append(registry, &value.to_string()) {
                warn!(node = %id, registry, error = %e, "memory side-channel write failed");
            }
        }
    }
}
