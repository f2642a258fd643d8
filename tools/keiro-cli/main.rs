use clap::Parser;
use keiro::prelude::*;
use std::time::Instant;

/// A workflow graph execution engine CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the graph document JSON file
    graph_path: Option<String>,

    /// The question to run through the workflow
    #[arg(short, long)]
    question: Option<String>,

    /// Directory holding documents, persisted indexes, and memory registries
    #[arg(short, long, default_value = ".")]
    data_dir: String,

    /// Base URL of an OpenAI-compatible chat endpoint (requires the
    /// `http-llm` feature)
    #[arg(long)]
    llm_url: Option<String>,

    /// Model name passed to the chat endpoint
    #[arg(long, default_value = "gpt-4o-mini")]
    llm_model: String,

    /// Delete every memory registry under the data directory and exit
    #[arg(long)]
    clear_memory: bool,

    /// Delete every persisted retrieval index under the data directory and exit
    #[arg(long)]
    clear_indexes: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.clear_memory {
        let store = MemoryStore::new(&cli.data_dir);
        if let Err(e) = store.clear_all() {
            exit_with_error(&format!("Failed to clear memory registries: {}", e));
        }
        println!("Cleared memory registries under '{}'", cli.data_dir);
    }
    if cli.clear_indexes {
        let retriever = LexicalRetriever::new(&cli.data_dir);
        if let Err(e) = retriever.clear_indexes() {
            exit_with_error(&format!("Failed to clear indexes: {}", e));
        }
        println!("Cleared persisted indexes under '{}'", cli.data_dir);
    }
    if cli.clear_memory || cli.clear_indexes {
        return;
    }

    let Some(ref graph_path) = cli.graph_path else {
        exit_with_error("No graph document provided. Usage: keiro-cli <graph.json> -q <question>");
    };
    let Some(ref question) = cli.question else {
        exit_with_error("No question provided. Pass one with -q/--question.");
    };

    // --- 1. Graph Loading ---
    let load_start = Instant::now();
    let document = GraphDocument::from_file(&graph_path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load '{}': {}", graph_path, e)));
    let graph = Graph::from_document(&document)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid graph document: {}", e)));
    let load_duration = load_start.elapsed();
    println!(
        "Loaded graph: {} nodes, {} connections",
        graph.nodes().len(),
        graph.connections().len()
    );

    // --- 2. Workflow Build ---
    let build_start = Instant::now();
    let llm = make_language_model(&cli);
    let workflow = Workflow::builder(graph, llm)
        .with_retriever(Box::new(LexicalRetriever::new(&cli.data_dir)))
        .with_memory(MemoryStore::new(&cli.data_dir))
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Workflow build failed: {}", e)));
    let build_duration = build_start.elapsed();
    println!(
        "Workflow scheduled: {} nodes in execution order",
        workflow.execution_order().len()
    );

    // --- 3. Run ---
    let run_start = Instant::now();
    let answer = workflow
        .ask(&question)
        .unwrap_or_else(|e| exit_with_error(&format!("Run failed: {}", e)));
    let run_duration = run_start.elapsed();

    println!("\nAnswer:\n{}", answer);

    println!("\n--- Performance Summary ---");
    println!("Graph Loading:   {:?}", load_duration);
    println!("Workflow Build:  {:?}", build_duration);
    println!("Run (latency):   {:?}", run_duration);
    println!();
}

#[cfg(feature = "http-llm")]
fn make_language_model(cli: &Cli) -> Box<dyn LanguageModel> {
    let Some(url) = cli.llm_url.as_deref() else {
        exit_with_error("No --llm-url provided.");
    };
    let api_key = std::env::var("KEIRO_API_KEY").ok();
    Box::new(keiro::llm::HttpLanguageModel::new(
        url,
        api_key.as_deref(),
        &cli.llm_model,
    ))
}

#[cfg(not(feature = "http-llm"))]
fn make_language_model(cli: &Cli) -> Box<dyn LanguageModel> {
    if cli.llm_url.is_some() {
        exit_with_error("--llm-url requires building with the 'http-llm' feature.");
    }
    // Without an HTTP backend, echo prompts back so graph plumbing can
    // still be exercised end to end.
    struct EchoModel;
    impl LanguageModel for EchoModel {
        fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
            Ok(prompt.to_string())
        }
    }
    Box::new(EchoModel)
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}
