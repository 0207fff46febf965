//! Errors raised by `StateGraph::compile`.

use thiserror::Error;

/// Graph structure is invalid and cannot be compiled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompilationError {
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("graph has no entry: add an edge from START or a conditional entry point")]
    MissingStart,
    #[error("graph has no path to END")]
    MissingEnd,
    #[error("invalid chain: {0}")]
    InvalidChain(String),
    #[error("node {0} has both an outgoing edge and conditional edges")]
    NodeHasBothEdgeAndConditional(String),
    #[error("conditional path map target is not a node: {0}")]
    InvalidConditionalPathMap(String),
}
