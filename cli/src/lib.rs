//! Library side of the `ragbot` binary: run a question through the workflow,
//! build the index, and render results for the terminal.
//!
//! `main.rs` only parses arguments, sets up logging and prints; everything it
//! calls lives here so it can be tested without spawning the binary.

mod display;

pub use display::{render_index_report, render_result, OFFLINE_NOTICE};

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tracing::{info, warn};

use ragbot::graph::LoggingNodeMiddleware;
use ragbot::{
    offline_result, AgentError, CompilationError, GraphState, IndexReport, IngestError, Ingestor,
    RagComponents, RagWorkflow, SettingsError, StreamEvent, StreamMode,
};

pub use ragbot::RagSettings;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration: {0}")]
    Settings(#[from] SettingsError),
    #[error("graph: {0}")]
    Compile(#[from] CompilationError),
    #[error("run failed: {0}")]
    Run(#[from] AgentError),
    #[error("indexing failed: {0}")]
    Ingest(#[from] IngestError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("run ended without a final state")]
    NoFinalState,
}

/// Output format of `ragbot graph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GraphFormat {
    Mermaid,
    Dot,
    Text,
}

/// Options of `ragbot ask`.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    pub question: String,
    pub paths: Vec<String>,
    pub urls: Vec<String>,
    pub rebuild: bool,
    /// Print `Entering: <node>` on stderr as the run progresses.
    pub progress: bool,
}

/// Builds the index from `paths` and `urls`.
pub async fn ingest(
    settings: &RagSettings,
    paths: &[String],
    urls: &[String],
    rebuild: bool,
) -> Result<IndexReport, CliError> {
    let ingestor = Ingestor::from_settings(settings)?;
    Ok(ingestor.build_index(paths, urls, rebuild).await?)
}

/// Answers `opts.question`. Without an OpenAI key the canned offline state is
/// returned and no graph runs. An index build that fails only logs a warning.
pub async fn ask(settings: &RagSettings, opts: &AskOptions) -> Result<GraphState, CliError> {
    if !opts.paths.is_empty() || !opts.urls.is_empty() {
        eprintln!("Building index...");
        match ingest(settings, &opts.paths, &opts.urls, opts.rebuild).await {
            Ok(report) => eprintln!("{}\n", render_index_report(&report)),
            Err(e) => {
                warn!(error = %e, "index build failed");
                eprintln!("Warning: Error building index: {}", e);
                eprintln!("Continuing with existing index...\n");
            }
        }
    }

    if !settings.is_online() {
        info!("no OpenAI key, returning offline answer");
        return Ok(offline_result(opts.question.as_str()));
    }

    let components = RagComponents::from_settings(settings);
    if !opts.progress {
        let workflow = RagWorkflow::new(components)?;
        return Ok(workflow.ask(&opts.question).await?);
    }

    let workflow = RagWorkflow::with_graph(&components, |g| {
        g.with_middleware(Arc::new(LoggingNodeMiddleware::<GraphState>::new()))
    })?;

    let modes: HashSet<StreamMode> = [StreamMode::Tasks, StreamMode::Values].into_iter().collect();
    let mut events = workflow.stream(&opts.question, modes);
    let mut last = None;
    while let Some(event) = events.next().await {
        match event {
            StreamEvent::TaskStart { node_id } => eprintln!("Entering: {}", node_id),
            StreamEvent::Values(state) => last = Some(state),
            StreamEvent::Error(message) => {
                return Err(CliError::Run(AgentError::ExecutionFailed(message)))
            }
            _ => {}
        }
    }
    last.ok_or(CliError::NoFinalState)
}

/// The workflow graph in `format`.
pub fn render_graph(format: GraphFormat) -> Result<String, CliError> {
    let workflow = RagWorkflow::offline()?;
    Ok(match format {
        GraphFormat::Mermaid => workflow.mermaid(),
        GraphFormat::Dot => workflow.dot(),
        GraphFormat::Text => workflow.text(),
    })
}

/// Final state as pretty JSON.
pub fn result_json(state: &GraphState) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(state)?)
}
