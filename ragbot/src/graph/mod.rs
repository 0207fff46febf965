//! State graph engine: nodes, fixed and conditional edges, compile and run.
//!
//! Build a [`StateGraph`], add nodes and edges (with [`START`] / [`END`]), then
//! [`StateGraph::compile`] into a [`CompiledStateGraph`] and `invoke` or `stream` it.

mod compile_error;
mod compiled;
mod conditional;
mod config;
mod logging;
mod logging_middleware;
mod next;
mod node;
mod node_middleware;
mod retry;
mod run_context;
mod state_graph;
mod visualization;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry, Router};
pub use config::{RunnableConfig, DEFAULT_RECURSION_LIMIT};
pub use logging_middleware::LoggingNodeMiddleware;
pub use next::Next;
pub use node::Node;
pub use node_middleware::{NodeCall, NodeFuture, NodeMiddleware};
pub use retry::RetryPolicy;
pub use run_context::RunContext;
pub use state_graph::{StateGraph, END, START};
pub use visualization::{generate_dot, generate_mermaid, generate_text};
