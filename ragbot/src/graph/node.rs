//! Graph node trait: one step in a StateGraph.
//!
//! Receives state `S`, returns a state update and `Next`. The compiled graph merges
//! the update into the running state with its `StateUpdater`.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::{Next, RunContext};

/// One step in a graph: state in, (update out, next step).
///
/// **Interaction**: Registered via `StateGraph::add_node`; run by
/// `CompiledStateGraph::invoke` and `stream`.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"retrieve"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step: state in, (update out, next step).
    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;

    /// Variant with run context (config, stream sender).
    ///
    /// Default implementation calls `run` and ignores the context.
    async fn run_with_context(
        &self,
        state: S,
        _ctx: &RunContext<S>,
    ) -> Result<(S, Next), AgentError> {
        self.run(state).await
    }
}
