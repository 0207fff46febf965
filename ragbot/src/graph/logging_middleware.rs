//! Node timing middleware. The CLI installs it for `--verbose` runs.

use async_trait::async_trait;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::AgentError;
use crate::graph::Next;

use super::node_middleware::{NodeCall, NodeMiddleware};

/// Emits a debug event per node with the routing outcome and elapsed time.
pub struct LoggingNodeMiddleware<S>(PhantomData<fn() -> S>);

impl<S> LoggingNodeMiddleware<S> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<S> Default for LoggingNodeMiddleware<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeCall<S>,
    ) -> Result<(S, Next), AgentError> {
        let started = Instant::now();
        let result = inner(state).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok((_, next)) => debug!(node = node_id, ?next, elapsed_ms, "node finished"),
            Err(e) => warn!(node = node_id, error = %e, elapsed_ms, "node failed"),
        }
        result
    }
}
