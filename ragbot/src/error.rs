//! Graph execution error types.
//!
//! Returned by `Node::run` and `CompiledStateGraph::invoke`. Chain and store
//! failures are turned into trace entries by the RAG nodes, so only engine
//! failures usually reach the caller.

use thiserror::Error;

/// Error raised while running a graph.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed, unknown route target).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The run executed more node steps than `RunnableConfig::recursion_limit` allows.
    #[error("recursion limit of {0} reached without hitting a stop condition")]
    RecursionLimit(usize),
}
