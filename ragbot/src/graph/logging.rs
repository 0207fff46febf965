//! Structured `tracing` events for graph execution.

use std::fmt::Debug;

pub fn log_node_start(node_id: &str, step: usize) {
    tracing::debug!(node_id = node_id, step, "Starting node execution");
}

/// Input state for the node, at trace level since states carry whole documents.
pub fn log_node_state<S: Debug>(node_id: &str, state: &S) {
    tracing::trace!(node_id = node_id, state = ?state, "Node execution: state");
}

pub fn log_node_complete(node_id: &str, next: &crate::graph::Next) {
    tracing::debug!(node_id = node_id, ?next, "Node execution complete");
}

pub fn log_route(from: &str, to: &str) {
    tracing::debug!(from = from, to = to, "conditional routing");
}

pub fn log_graph_start(run_id: &str) {
    tracing::info!(run_id = run_id, "Starting graph execution");
}

pub fn log_graph_complete(run_id: &str, steps: usize) {
    tracing::info!(run_id = run_id, steps, "Graph execution complete");
}

pub fn log_graph_error(run_id: &str, error: &crate::error::AgentError) {
    tracing::error!(run_id = run_id, %error, "Graph execution error");
}
