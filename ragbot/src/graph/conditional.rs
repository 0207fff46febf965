//! Conditional edges: route to the next node based on state.
//!
//! A source node (or the graph entry) has a router that takes the current state
//! and returns a key; the key is either used as the next node id or looked up in
//! an optional path map.
//!
//! **Interaction**: Used by `StateGraph::add_conditional_edges`,
//! `StateGraph::set_conditional_entry_point` and the `CompiledStateGraph` run loop.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;

/// Decides the routing key from the current state.
///
/// Async so that a router may call a model (e.g. question routing). Any
/// `Fn(&S) -> String` closure is a router.
#[async_trait]
pub trait Router<S>: Send + Sync
where
    S: Send + Sync,
{
    async fn route(&self, state: &S) -> Result<String, AgentError>;
}

#[async_trait]
impl<S, F> Router<S> for F
where
    S: Send + Sync,
    F: Fn(&S) -> String + Send + Sync,
{
    async fn route(&self, state: &S) -> Result<String, AgentError> {
        Ok(self(state))
    }
}

/// Shared router handle stored in the graph.
pub type ConditionalRouterFn<S> = Arc<dyn Router<S>>;

/// Conditional edge definition: router plus optional path map.
///
/// - When `path_map` is `None`, the router's key is used directly as the next node id.
/// - When `path_map` is `Some(map)`, the next node id is `map[key]` if present,
///   otherwise the key itself.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the next node id (or END) from the current state.
    pub async fn resolve_next(&self, state: &S) -> Result<String, AgentError> {
        let key = self.path.route(state).await?;
        Ok(self
            .path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or(key))
    }

    /// Path map entries sorted by key; empty when the router has no map.
    pub fn branches(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .path_map
            .as_ref()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        out.sort();
        out
    }
}

/// How to determine the next node after a given node runs (or where the run starts).
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Single fixed next node (or END). The node's `Next` is still respected.
    Unconditional(String),
    /// Next node is decided by the router from state; the node's `Next` is ignored.
    Conditional(ConditionalRouter<S>),
}
