//! End-to-end tests: full workflows from graph document to answer.
mod common;
use common::*;
use keiro::prelude::*;
use tempfile::tempdir;

/// input -> query("Echo: ") -> output, question "hi", echoing model.
#[test]
fn scenario_echo_query() {
    let (graph, ..) = common::linear_graph();
    let dir = tempdir().unwrap();
    let workflow = Workflow::builder(graph, Box::new(EchoModel))
        .with_memory(MemoryStore::new(dir.path()))
        .build()
        .unwrap();

    assert_eq!(workflow.ask("hi").unwrap(), "Echo: hi");
}

/// input -> condition("cat") -> [true: query A] / [false: query B] -> output.
/// Only the taken branch's query reaches the language model.
#[test]
fn scenario_condition_routes_exactly_one_branch() {
    let (graph, ..) = common::branching_graph();
    let dir = tempdir().unwrap();
    let model = std::sync::Arc::new(CannedModel::new("reply"));
    let workflow = Workflow::builder(graph, Box::new(model.clone()))
        .with_memory(MemoryStore::new(dir.path()))
        .build()
        .unwrap();

    assert_eq!(workflow.ask("the cat is here").unwrap(), "reply");
    assert_eq!(workflow.ask("no trigger here").unwrap(), "reply");

    // Exactly one query fired per run: A for the matched trigger, B for the
    // unmatched one.
    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].starts_with("A: "));
    assert!(prompts[1].starts_with("B: "));
}

/// input -> memory("r") -> output, with "r" pre-seeded with two entries.
#[test]
fn scenario_memory_history_becomes_the_answer() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::new(dir.path());
    store.append("r", "first fact").unwrap();
    store.append("r", "second fact").unwrap();

    let mut graph = Graph::new();
    let input = graph.add_node(NodeKind::Input, vec![]);
    let memory = graph.add_node(NodeKind::Memory, vec!["r".to_string()]);
    let output = graph.add_node(NodeKind::Output, vec![]);
    graph.add_connection(input, memory, Selector::Output).unwrap();
    graph.add_connection(memory, output, Selector::Output).unwrap();

    let workflow = Workflow::builder(graph, Box::new(EchoModel))
        .with_memory(store)
        .build()
        .unwrap();

    assert_eq!(
        workflow.ask("what do you remember?").unwrap(),
        "History entry 1: first fact\n\nHistory entry 2: second fact\n\n"
    );
}

/// A node wired into a memory node pushes every produced result into the
/// registry, so later runs can read it back.
#[test]
fn memory_side_channel_accumulates_across_runs() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::new(dir.path());

    let mut graph = Graph::new();
    let input = graph.add_node(NodeKind::Input, vec![]);
    let query = graph.add_node(NodeKind::Query, vec!["Echo: ".to_string()]);
    let memory = graph.add_node(NodeKind::Memory, vec!["log".to_string()]);
    let output = graph.add_node(NodeKind::Output, vec![]);
    graph.add_connection(input, query, Selector::Output).unwrap();
    graph.add_connection(query, memory, Selector::Output).unwrap();
    graph.add_connection(query, output, Selector::Output).unwrap();

    let workflow = Workflow::builder(graph, Box::new(EchoModel))
        .with_memory(store.clone())
        .build()
        .unwrap();

    workflow.ask("one").unwrap();
    workflow.ask("two").unwrap();

    assert_eq!(
        store.read_history("log").unwrap(),
        "History entry 1: Echo: one\n\nHistory entry 2: Echo: two\n\n"
    );
}

/// Memory connected to the input works too, independent of gating direction:
/// the input node has no gate but still pushes to its memory neighbors.
#[test]
fn input_pushes_questions_to_a_connected_registry() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::new(dir.path());

    let mut graph = Graph::new();
    let input = graph.add_node(NodeKind::Input, vec![]);
    let memory = graph.add_node(NodeKind::Memory, vec!["questions".to_string()]);
    let output = graph.add_node(NodeKind::Output, vec![]);
    graph.add_connection(input, memory, Selector::Output).unwrap();
    graph.add_connection(input, output, Selector::Output).unwrap();

    let workflow = Workflow::builder(graph, Box::new(EchoModel))
        .with_memory(store.clone())
        .build()
        .unwrap();

    workflow.ask("remember me").unwrap();
    assert_eq!(
        store.read_history("questions").unwrap(),
        "History entry 1: remember me\n\n"
    );
}

/// Full pipeline from a serialized document: load, build, ask.
#[test]
fn workflow_from_graph_document() {
    let json = r#"{
        "nodes": [
            {"id": 1, "kind": "input"},
            {"id": 2, "kind": "condition", "content": ["cat"]},
            {"id": 3, "kind": "query", "content": ["A: "]},
            {"id": 4, "kind": "query", "content": ["B: "]},
            {"id": 5, "kind": "output"}
        ],
        "connections": [
            {"from": 1, "to": 2},
            {"from": 1, "to": 3},
            {"from": 1, "to": 4},
            {"from": 2, "to": 3, "selector": "true"},
            {"from": 2, "to": 4, "selector": "false"},
            {"from": 3, "to": 5},
            {"from": 4, "to": 5}
        ]
    }"#;

    let graph = Graph::from_json(json).unwrap();
    let dir = tempdir().unwrap();
    let workflow = Workflow::builder(graph, Box::new(EchoModel))
        .with_memory(MemoryStore::new(dir.path()))
        .build()
        .unwrap();

    assert_eq!(workflow.ask("a cat appears").unwrap(), "A: a cat appears");
    assert_eq!(workflow.ask("a dog appears").unwrap(), "B: a dog appears");
}

/// Retrieval feeding a query: the retrieved chunks become part of the
/// prompt the model sees.
#[test]
fn retrieval_feeds_the_query_prompt() {
    let mut graph = Graph::new();
    let input = graph.add_node(NodeKind::Input, vec![]);
    let retrieval = graph.add_node(NodeKind::Retrieval, vec!["kb.txt".to_string()]);
    let query = graph.add_node(NodeKind::Query, vec!["Use this context: ".to_string()]);
    let output = graph.add_node(NodeKind::Output, vec![]);
    graph.add_connection(input, retrieval, Selector::Output).unwrap();
    graph.add_connection(retrieval, query, Selector::Output).unwrap();
    graph.add_connection(query, output, Selector::Output).unwrap();

    let dir = tempdir().unwrap();
    let workflow = Workflow::builder(graph, Box::new(EchoModel))
        .with_retriever(Box::new(StaticRetriever {
            chunks: vec!["chunk one".to_string(), "chunk two".to_string()],
        }))
        .with_memory(MemoryStore::new(dir.path()))
        .build()
        .unwrap();

    // The echoing model reveals the exact prompt the query node assembled.
    assert_eq!(
        workflow.ask("question").unwrap(),
        "Use this context: chunk one\n\nchunk two"
    );
}
