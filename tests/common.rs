//! Common test utilities: stub collaborators and graph builders.
use keiro::prelude::*;
use std::sync::Mutex;

/// A language model that echoes the prompt back verbatim.
#[allow(dead_code)]
pub struct EchoModel;

impl LanguageModel for EchoModel {
    fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
        Ok(prompt.to_string())
    }
}

/// A language model that returns a fixed response and records the prompts
/// it was asked.
#[allow(dead_code)]
pub struct CannedModel {
    pub response: String,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedModel {
    #[allow(dead_code)]
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl LanguageModel for CannedModel {
    fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.response.clone())
    }
}

/// A language model whose every invocation fails.
#[allow(dead_code)]
pub struct FailingModel;

impl LanguageModel for FailingModel {
    fn invoke(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Request("connection refused".to_string()))
    }
}

/// A retriever serving a fixed set of chunks for any document reference.
#[allow(dead_code)]
pub struct StaticRetriever {
    pub chunks: Vec<String>,
}

#[allow(dead_code)]
pub struct StaticIndex {
    chunks: Vec<String>,
}

impl SimilarityIndex for StaticIndex {
    fn search(&self, _query: &str, k: usize) -> Vec<ScoredChunk> {
        self.chunks
            .iter()
            .take(k)
            .enumerate()
            .map(|(i, text)| ScoredChunk {
                text: text.clone(),
                source: "static".to_string(),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }
}

impl Retriever for StaticRetriever {
    fn open(&self, _document: &str) -> Result<Box<dyn SimilarityIndex>, RetrievalError> {
        Ok(Box::new(StaticIndex {
            chunks: self.chunks.clone(),
        }))
    }
}

/// A retriever that cannot open any index.
#[allow(dead_code)]
pub struct FailingRetriever;

impl Retriever for FailingRetriever {
    fn open(&self, document: &str) -> Result<Box<dyn SimilarityIndex>, RetrievalError> {
        Err(RetrievalError::DocumentLoad {
            reference: document.to_string(),
            message: "no such file".to_string(),
        })
    }
}

/// input -> query("Echo: ") -> output
#[allow(dead_code)]
pub fn linear_graph() -> (Graph, NodeId, NodeId, NodeId) {
    let mut graph = Graph::new();
    let input = graph.add_node(NodeKind::Input, vec![]);
    let query = graph.add_node(NodeKind::Query, vec!["Echo: ".to_string()]);
    let output = graph.add_node(NodeKind::Output, vec![]);
    graph.add_connection(input, query, Selector::Output).unwrap();
    graph.add_connection(query, output, Selector::Output).unwrap();
    (graph, input, query, output)
}

/// input -> condition("cat") -> [true: query A ("A: ")] / [false: query B ("B: ")] -> output
///
/// Both queries also take the input node's data directly so they have a
/// non-condition predecessor.
#[allow(dead_code)]
pub fn branching_graph() -> (Graph, NodeId, NodeId, NodeId, NodeId) {
    let mut graph = Graph::new();
    let input = graph.add_node(NodeKind::Input, vec![]);
    let condition = graph.add_node(NodeKind::Condition, vec!["cat".to_string()]);
    let query_a = graph.add_node(NodeKind::Query, vec!["A: ".to_string()]);
    let query_b = graph.add_node(NodeKind::Query, vec!["B: ".to_string()]);
    let output = graph.add_node(NodeKind::Output, vec![]);
    graph.add_connection(input, condition, Selector::Output).unwrap();
    graph.add_connection(input, query_a, Selector::Output).unwrap();
    graph.add_connection(input, query_b, Selector::Output).unwrap();
    graph.add_connection(condition, query_a, Selector::True).unwrap();
    graph.add_connection(condition, query_b, Selector::False).unwrap();
    graph.add_connection(query_a, output, Selector::Output).unwrap();
    graph.add_connection(query_b, output, Selector::Output).unwrap();
    (graph, input, condition, query_a, query_b)
}
