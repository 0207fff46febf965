//! Compiled state graph: immutable, supports `invoke` and `stream`.
//!
//! Built by `StateGraph::compile`. Resolves the entry (fixed edge or router),
//! runs nodes one at a time, merges each update with the state updater and
//! follows fixed edges or routers until END.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use crate::channels::BoxedStateUpdater;
use crate::error::AgentError;
use crate::stream::{StreamEvent, StreamMode};

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_node_state, log_route,
};
use super::node_middleware::{NodeFuture, NodeMiddleware};
use super::retry::RetryPolicy;
use super::state_graph::END;
use super::{Next, NextEntry, Node, RunContext, RunnableConfig};

/// Compiled graph: immutable structure, cheap to clone.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Where a run starts: a fixed node or a router over the input state.
    pub(super) entry: NextEntry<S>,
    /// Node id -> fixed next node or router.
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) state_updater: BoxedStateUpdater<S>,
    pub(super) retry_policy: RetryPolicy,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Runs the node (through middleware when set), retrying per the retry policy.
    async fn execute_node_with_retry(
        &self,
        node: Arc<dyn Node<S>>,
        state: &S,
        run_ctx: &RunContext<S>,
    ) -> Result<(S, Next), AgentError> {
        let mut attempt = 0;
        loop {
            let current_state = state.clone();
            let result = if let Some(middleware) = &self.middleware {
                let node_id = node.id().to_string();
                let ctx = run_ctx.clone();
                let node = node.clone();
                middleware
                    .around_run(
                        &node_id,
                        current_state,
                        Box::new(move |s: S| -> NodeFuture<S> {
                            Box::pin(async move { node.run_with_context(s, &ctx).await })
                        }),
                    )
                    .await
            } else {
                node.run_with_context(current_state, run_ctx).await
            };

            match result {
                Ok(output) => return Ok(output),
                Err(e) if self.retry_policy.should_retry(attempt) => {
                    let delay = self.retry_policy.delay(attempt);
                    tracing::warn!(
                        node_id = node.id(),
                        attempt = attempt + 1,
                        error = %e,
                        "node failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Resolves a router or fixed target to the next node id; `None` means END.
    async fn resolve(
        &self,
        from: &str,
        entry: &NextEntry<S>,
        state: &S,
    ) -> Result<Option<String>, AgentError> {
        let target = match entry {
            NextEntry::Unconditional(id) => id.clone(),
            NextEntry::Conditional(router) => {
                let target = router.resolve_next(state).await?;
                log_route(from, &target);
                target
            }
        };
        if target == END {
            return Ok(None);
        }
        if !self.nodes.contains_key(&target) {
            return Err(AgentError::ExecutionFailed(format!(
                "route from {} to unknown node: {}",
                from, target
            )));
        }
        Ok(Some(target))
    }

    /// Shared run loop used by `invoke` and `stream`.
    async fn run_loop(&self, state: &mut S, run_ctx: &RunContext<S>) -> Result<usize, AgentError> {
        let limit = run_ctx.config.recursion_limit;
        let mut steps = 0usize;
        let mut current = self.resolve(super::START, &self.entry, state).await?;

        while let Some(current_id) = current {
            if steps >= limit {
                return Err(AgentError::RecursionLimit(limit));
            }
            steps += 1;

            let node = self
                .nodes
                .get(&current_id)
                .cloned()
                .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown node: {}", current_id)))?;

            log_node_start(&current_id, steps);
            log_node_state(&current_id, state);
            run_ctx
                .emit(StreamMode::Tasks, || StreamEvent::TaskStart {
                    node_id: current_id.clone(),
                })
                .await;

            let (update, next) = match self.execute_node_with_retry(node, state, run_ctx).await {
                Ok(output) => output,
                Err(e) => {
                    run_ctx
                        .emit(StreamMode::Tasks, || StreamEvent::TaskEnd {
                            node_id: current_id.clone(),
                            result: Err(e.to_string()),
                        })
                        .await;
                    return Err(e);
                }
            };
            run_ctx
                .emit(StreamMode::Tasks, || StreamEvent::TaskEnd {
                    node_id: current_id.clone(),
                    result: Ok(()),
                })
                .await;
            log_node_complete(&current_id, &next);

            self.state_updater.apply_update(state, &update);

            run_ctx
                .emit(StreamMode::Values, || StreamEvent::Values(state.clone()))
                .await;
            run_ctx
                .emit(StreamMode::Updates, || StreamEvent::Updates {
                    node_id: current_id.clone(),
                    state: state.clone(),
                })
                .await;

            current = match self.next_map.get(&current_id) {
                Some(entry @ NextEntry::Conditional(_)) => {
                    self.resolve(&current_id, entry, state).await?
                }
                fixed => match next {
                    Next::End => None,
                    Next::Node(id) => {
                        self.resolve(&current_id, &NextEntry::Unconditional(id), state)
                            .await?
                    }
                    Next::Continue => match fixed {
                        Some(entry) => self.resolve(&current_id, entry, state).await?,
                        None => None,
                    },
                },
            };
        }
        Ok(steps)
    }

    async fn run_with_span(&self, mut state: S, run_ctx: RunContext<S>) -> Result<S, AgentError> {
        let run_id = run_ctx
            .config
            .run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let span = tracing::info_span!("graph_run", run_id = %run_id);
        async move {
            log_graph_start(&run_id);
            match self.run_loop(&mut state, &run_ctx).await {
                Ok(steps) => {
                    log_graph_complete(&run_id, steps);
                    Ok(state)
                }
                Err(e) => {
                    log_graph_error(&run_id, &e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Runs the graph to completion and returns the final state.
    ///
    /// `config` defaults to `RunnableConfig::default()` (recursion limit 25).
    pub async fn invoke(&self, state: S, config: Option<RunnableConfig>) -> Result<S, AgentError> {
        if self.nodes.is_empty() {
            return Err(AgentError::ExecutionFailed("empty graph".into()));
        }
        let run_ctx = RunContext::new(config.unwrap_or_default());
        self.run_with_span(state, run_ctx).await
    }

    /// Runs the graph on a background task, emitting events for the selected modes.
    ///
    /// A failed run ends with `StreamEvent::Error`.
    pub fn stream(
        &self,
        state: S,
        config: Option<RunnableConfig>,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let run_ctx =
            RunContext::new(config.unwrap_or_default()).with_stream(tx.clone(), stream_mode.into());

        tokio::spawn(async move {
            if let Err(e) = graph.run_with_span(state, run_ctx).await {
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
            }
        });

        ReceiverStream::new(rx)
    }

    /// Node ids, sorted.
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio_stream::StreamExt;

    use crate::graph::{StateGraph, START};

    #[derive(Clone)]
    struct AddNode {
        id: &'static str,
        delta: i32,
    }

    #[async_trait]
    impl Node<i32> for AddNode {
        fn id(&self) -> &str {
            self.id
        }
        async fn run(&self, state: i32) -> Result<(i32, Next), AgentError> {
            Ok((state + self.delta, Next::Continue))
        }
    }

    /// From "first" jumps straight to "third".
    struct JumpToThirdNode;

    #[async_trait]
    impl Node<i32> for JumpToThirdNode {
        fn id(&self) -> &str {
            "first"
        }
        async fn run(&self, state: i32) -> Result<(i32, Next), AgentError> {
            Ok((state + 1, Next::Node("third".to_string())))
        }
    }

    /// Fails the first `failures` calls, then adds one.
    struct FlakyNode {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Node<i32> for FlakyNode {
        fn id(&self) -> &str {
            "flaky"
        }
        async fn run(&self, state: i32) -> Result<(i32, Next), AgentError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(AgentError::ExecutionFailed(format!("flaky call {}", call)));
            }
            Ok((state + 1, Next::Continue))
        }
    }

    fn add(id: &'static str, delta: i32) -> Arc<dyn Node<i32>> {
        Arc::new(AddNode { id, delta })
    }

    fn build_two_step_graph() -> CompiledStateGraph<i32> {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("first", add("first", 1));
        graph.add_node("second", add("second", 2));
        graph.add_edge(START, "first");
        graph.add_edge("first", "second");
        graph.add_edge("second", END);
        graph.compile().expect("graph compiles")
    }

    /// Loops `inc` until the state reaches `target`.
    fn build_loop_graph(target: i32) -> CompiledStateGraph<i32> {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("inc", add("inc", 1));
        graph.add_edge(START, "inc");
        graph.add_conditional_edges(
            "inc",
            Arc::new(move |s: &i32| {
                if *s >= target {
                    END.to_string()
                } else {
                    "inc".to_string()
                }
            }),
            None,
        );
        graph.compile().expect("graph compiles")
    }

    /// **Scenario**: A linear graph runs every node in order.
    #[tokio::test]
    async fn invoke_linear_graph() {
        let graph = build_two_step_graph();
        assert_eq!(graph.invoke(0, None).await.unwrap(), 3);
    }

    /// **Scenario**: Conditional edges route to the correct node based on state.
    #[tokio::test]
    async fn invoke_conditional_edges_routes_by_state() {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("decide", add("decide", 0));
        graph.add_node("even_node", add("even_node", 10));
        graph.add_node("odd_node", add("odd_node", 100));
        graph.add_edge(START, "decide");
        graph.add_edge("even_node", END);
        graph.add_edge("odd_node", END);
        let path_map: HashMap<String, String> = [
            ("even".to_string(), "even_node".to_string()),
            ("odd".to_string(), "odd_node".to_string()),
        ]
        .into_iter()
        .collect();
        graph.add_conditional_edges(
            "decide",
            Arc::new(|s: &i32| if s % 2 == 0 { "even".into() } else { "odd".into() }),
            Some(path_map),
        );
        let compiled = graph.compile().expect("graph compiles");
        assert_eq!(compiled.invoke(2, None).await.unwrap(), 12);
        assert_eq!(compiled.invoke(1, None).await.unwrap(), 101);
    }

    /// **Scenario**: The conditional entry point picks the first node from the input state.
    #[tokio::test]
    async fn invoke_conditional_entry_point() {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("small", add("small", 1));
        graph.add_node("big", add("big", 1000));
        graph.add_edge("small", END);
        graph.add_edge("big", END);
        graph.set_conditional_entry_point(
            Arc::new(|s: &i32| if *s > 10 { "big".into() } else { "small".into() }),
            None,
        );
        let compiled = graph.compile().expect("graph compiles");
        assert_eq!(compiled.invoke(1, None).await.unwrap(), 2);
        assert_eq!(compiled.invoke(11, None).await.unwrap(), 1011);
    }

    /// **Scenario**: An entry router that returns END finishes without running any node.
    #[tokio::test]
    async fn invoke_entry_router_to_end_returns_input() {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("a", add("a", 1));
        graph.add_edge("a", END);
        graph.set_conditional_entry_point(Arc::new(|_: &i32| END.to_string()), None);
        let compiled = graph.compile().expect("graph compiles");
        assert_eq!(compiled.invoke(5, None).await.unwrap(), 5);
    }

    /// **Scenario**: Next::Node(id) jumps over the fixed edge.
    #[tokio::test]
    async fn invoke_next_node_jumps_to_specified_node() {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("first", Arc::new(JumpToThirdNode));
        graph.add_node("second", add("second", 10));
        graph.add_node("third", add("third", 100));
        graph.add_edge(START, "first");
        graph.add_edge("first", "second");
        graph.add_edge("second", "third");
        graph.add_edge("third", END);
        let compiled = graph.compile().expect("graph compiles");
        assert_eq!(compiled.invoke(0, None).await.unwrap(), 101);
    }

    /// **Scenario**: A router returning an unknown id fails the run instead of panicking.
    #[tokio::test]
    async fn invoke_unknown_route_target_fails() {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node("a", add("a", 1));
        graph.add_edge(START, "a");
        graph.add_conditional_edges("a", Arc::new(|_: &i32| "nowhere".to_string()), None);
        let compiled = graph.compile().expect("graph compiles");
        match compiled.invoke(0, None).await {
            Err(AgentError::ExecutionFailed(msg)) => assert!(msg.contains("nowhere"), "{}", msg),
            other => panic!("expected ExecutionFailed, got {:?}", other),
        }
    }

    /// **Scenario**: A loop that would run past the recursion limit fails with RecursionLimit.
    #[tokio::test]
    async fn invoke_stops_at_recursion_limit() {
        let graph = build_loop_graph(100);
        let config = RunnableConfig::default().with_recursion_limit(5);
        match graph.invoke(0, Some(config)).await {
            Err(AgentError::RecursionLimit(5)) => {}
            other => panic!("expected RecursionLimit(5), got {:?}", other),
        }
    }

    /// **Scenario**: The default limit of 25 allows 10 iterations but not 30.
    #[tokio::test]
    async fn invoke_default_recursion_limit() {
        assert_eq!(build_loop_graph(10).invoke(0, None).await.unwrap(), 10);
        assert!(matches!(
            build_loop_graph(30).invoke(0, None).await,
            Err(AgentError::RecursionLimit(25))
        ));
    }

    /// **Scenario**: A node failing twice succeeds on the third attempt with a fixed retry policy.
    #[tokio::test]
    async fn invoke_retries_failed_node() {
        let flaky = Arc::new(FlakyNode {
            failures: 2,
            calls: AtomicUsize::new(0),
        });
        let mut graph = StateGraph::<i32>::new()
            .with_retry_policy(RetryPolicy::fixed(2, std::time::Duration::ZERO));
        graph.add_node("flaky", flaky.clone());
        graph.add_edge(START, "flaky");
        graph.add_edge("flaky", END);
        let compiled = graph.compile().expect("graph compiles");
        assert_eq!(compiled.invoke(0, None).await.unwrap(), 1);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    /// **Scenario**: Without retries the node error propagates from invoke.
    #[tokio::test]
    async fn invoke_without_retry_propagates_error() {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node(
            "flaky",
            Arc::new(FlakyNode {
                failures: 1,
                calls: AtomicUsize::new(0),
            }),
        );
        graph.add_edge(START, "flaky");
        graph.add_edge("flaky", END);
        let compiled = graph.compile().expect("graph compiles");
        assert!(matches!(
            compiled.invoke(0, None).await,
            Err(AgentError::ExecutionFailed(_))
        ));
    }

    /// **Scenario**: stream(values) emits one snapshot per node and ends with the final state.
    #[tokio::test]
    async fn stream_values_emits_states() {
        let graph = build_two_step_graph();
        let events: Vec<_> = graph
            .stream(0, None, HashSet::from([StreamMode::Values]))
            .collect()
            .await;
        let values: Vec<i32> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Values(v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![1, 3]);
    }

    /// **Scenario**: stream(tasks) brackets every node with TaskStart/TaskEnd.
    #[tokio::test]
    async fn stream_tasks_emits_start_and_end() {
        let graph = build_two_step_graph();
        let events: Vec<_> = graph
            .stream(0, None, HashSet::from([StreamMode::Tasks]))
            .collect()
            .await;
        let labels: Vec<String> = events
            .iter()
            .map(|e| match e {
                StreamEvent::TaskStart { node_id } => format!("start:{}", node_id),
                StreamEvent::TaskEnd { node_id, result } => {
                    format!("end:{}:{}", node_id, result.is_ok())
                }
                other => format!("{:?}", other),
            })
            .collect();
        assert_eq!(
            labels,
            vec![
                "start:first",
                "end:first:true",
                "start:second",
                "end:second:true"
            ]
        );
    }

    /// **Scenario**: A failing streamed run ends with an Error event.
    #[tokio::test]
    async fn stream_reports_error_event() {
        let graph = build_loop_graph(100);
        let config = RunnableConfig::default().with_recursion_limit(2);
        let events: Vec<_> = graph
            .stream(0, Some(config), HashSet::from([StreamMode::Updates]))
            .collect()
            .await;
        assert_eq!(events.len(), 3);
        assert!(matches!(events.last(), Some(StreamEvent::Error(msg)) if msg.contains("recursion limit")));
    }
}
