//! Node middleware: wrap node.run with external async logic (around pattern).
//!
//! Set via `StateGraph::with_middleware`.

use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::error::AgentError;

use super::Next;

/// Boxed future returned by the wrapped node call.
pub type NodeFuture<S> = Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>>;

/// The wrapped node call handed to `around_run`.
pub type NodeCall<S> = Box<dyn FnOnce(S) -> NodeFuture<S> + Send>;

/// Async middleware that wraps node.run.
///
/// Implementations decide when to call `inner`, and may inspect or rewrite its result.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeCall<S>,
    ) -> Result<(S, Next), AgentError>;
}
