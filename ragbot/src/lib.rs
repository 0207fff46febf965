//! # ragbot
//!
//! A retrieval-augmented chatbot workflow built on a small state-graph engine.
//! A question is routed to the local vector index or to web search, retrieved
//! passages are graded for relevance, an answer is generated and then checked
//! for grounding before it is returned.
//!
//! ## Design principles
//!
//! - **Single state type**: every node reads [`GraphState`] and returns a partial
//!   update; fields present in the update replace the current value.
//! - **Offline first**: each LLM-backed chain has a canned stub used when no
//!   OpenAI key is configured, so the whole graph runs without network access.
//! - **Failures become trace entries**: chain and backend errors are recorded in
//!   the state's trace with a fallback value; only engine errors end a run.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`], routers,
//!   retry, middleware and visualization.
//! - [`channels`]: [`StateUpdater`], [`FieldBasedUpdater`].
//! - [`llm`]: [`LlmClient`], [`ChatOpenAI`], [`MockLlm`], structured output.
//! - [`chains`]: question router, graders and answer generation.
//! - [`nodes`]: the five workflow steps.
//! - [`workflow`]: [`RagWorkflow`], [`RagComponents`], the routing functions.
//! - [`vectorstore`]: [`Embedder`], [`VectorStore`], [`SqliteVecStore`], [`Retriever`].
//! - [`ingestion`]: loaders, [`RecursiveCharacterTextSplitter`], [`Ingestor`].
//! - [`websearch`]: [`WebSearch`], [`TavilySearch`], [`OfflineWebSearch`].
//! - [`settings`]: [`RagSettings`] from the environment.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ragbot::RagWorkflow;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let workflow = RagWorkflow::offline()?;
//! let state = workflow.ask("what is agent memory?").await?;
//! println!("{}", state.generation());
//! # Ok(())
//! # }
//! ```

pub mod chains;
pub mod channels;
pub mod document;
pub mod error;
pub mod graph;
pub mod ingestion;
pub mod llm;
pub mod message;
pub mod nodes;
pub mod prompts;
pub mod settings;
pub mod state;
pub mod stream;
pub mod vectorstore;
pub mod websearch;
pub mod workflow;

pub use channels::{BoxedStateUpdater, FieldBasedUpdater, ReplaceUpdater, StateUpdater};
pub use document::Document;
pub use error::AgentError;
pub use graph::{
    CompilationError, CompiledStateGraph, Next, Node, RetryPolicy, RunnableConfig, StateGraph,
    END, START,
};
pub use ingestion::{IndexReport, IndexStatus, IngestError, Ingestor, RecursiveCharacterTextSplitter};
pub use llm::{ChatOpenAI, LlmClient, MockLlm};
pub use message::Message;
pub use settings::{RagSettings, SettingsError};
pub use state::{GenerationGrade, GraphState};
pub use stream::{StreamEvent, StreamMode};
pub use vectorstore::{Embedder, Retriever, SqliteVecStore, StoreError, VectorStore};
pub use websearch::{OfflineWebSearch, TavilySearch, WebSearch};
pub use workflow::{offline_result, RagComponents, RagWorkflow};
