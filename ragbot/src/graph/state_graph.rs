//! State graph: nodes + explicit edges (from → to) and conditional edges.
//!
//! Add nodes with `add_node`, wire them with `add_edge(from, to)` using `START`
//! and `END` for entry/exit, route on state with `add_conditional_edges`, or let
//! a router pick the first node with `set_conditional_entry_point`. Then
//! `compile` to get a `CompiledStateGraph`.
//!
//! # State updates
//!
//! Nodes return a state update. By default it replaces the running state; use
//! `with_state_updater` to merge partial updates instead.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use crate::channels::{BoxedStateUpdater, ReplaceUpdater};
use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::CompiledStateGraph;
use crate::graph::conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;
use crate::graph::retry::RetryPolicy;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph: nodes plus explicit edges and conditional edges.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Edges (from_id, to_id). A node may have one outgoing edge or conditional edges, not both.
    edges: Vec<(String, String)>,
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
    /// Router choosing the first node; replaces an edge from START.
    entry_router: Option<ConditionalRouter<S>>,
    middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    state_updater: Option<BoxedStateUpdater<S>>,
    retry_policy: RetryPolicy,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
            entry_router: None,
            middleware: None,
            state_updater: None,
            retry_policy: RetryPolicy::None,
        }
    }

    /// Wraps every node run with `middleware`.
    pub fn with_middleware(self, middleware: Arc<dyn NodeMiddleware<S>>) -> Self {
        Self {
            middleware: Some(middleware),
            ..self
        }
    }

    /// Controls how node outputs are merged into the running state.
    ///
    /// ```rust,no_run
    /// use ragbot::graph::StateGraph;
    /// use ragbot::channels::FieldBasedUpdater;
    /// use std::sync::Arc;
    ///
    /// #[derive(Clone, Debug, Default)]
    /// struct Counter { hits: Vec<String>, total: i32 }
    ///
    /// let updater = FieldBasedUpdater::new(|current: &mut Counter, update: &Counter| {
    ///     current.hits.extend(update.hits.iter().cloned());
    ///     current.total += update.total;
    /// });
    /// let graph = StateGraph::<Counter>::new().with_state_updater(Arc::new(updater));
    /// ```
    pub fn with_state_updater(self, updater: BoxedStateUpdater<S>) -> Self {
        Self {
            state_updater: Some(updater),
            ..self
        }
    }

    /// Retry policy applied to every node execution. Default: no retries.
    pub fn with_retry_policy(self, retry_policy: RetryPolicy) -> Self {
        Self {
            retry_policy,
            ..self
        }
    }

    /// Adds a node; replaces any node with the same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an edge from `from_id` to `to_id` (`START` / `END` allowed).
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// After `source` runs, `path` picks the next node from the merged state.
    ///
    /// The key returned by `path` is looked up in `path_map` when given (falling
    /// back to the key itself), otherwise used directly as the next node id.
    ///
    /// ```rust,ignore
    /// graph.add_conditional_edges(
    ///     "grade_documents",
    ///     Arc::new(|s: &GraphState| if s.web_search() { "websearch".into() } else { "generate".into() }),
    ///     Some([("websearch".into(), "web_search".into()), ("generate".into(), "generate".into())].into_iter().collect()),
    /// );
    /// ```
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    /// The first node is chosen by `path` from the input state instead of a START edge.
    pub fn set_conditional_entry_point(
        &mut self,
        path: ConditionalRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.entry_router = Some(ConditionalRouter::new(path, path_map));
        self
    }

    fn check_path_map(&self, router: &ConditionalRouter<S>) -> Result<(), CompilationError> {
        if let Some(ref path_map) = router.path_map {
            for target in path_map.values() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(CompilationError::InvalidConditionalPathMap(target.clone()));
                }
            }
        }
        Ok(())
    }

    /// Validates the structure and builds the executable graph.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            self.check_path_map(router)?;
        }
        if let Some(ref router) = self.entry_router {
            self.check_path_map(router)?;
        }

        let start_edges: Vec<String> = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone())
            .collect();
        let entry = match (start_edges.len(), &self.entry_router) {
            (0, None) => return Err(CompilationError::MissingStart),
            (0, Some(router)) => NextEntry::Conditional(router.clone()),
            (1, None) => NextEntry::Unconditional(start_edges[0].clone()),
            (_, Some(_)) => {
                return Err(CompilationError::InvalidChain(
                    "both an edge from START and a conditional entry point".into(),
                ))
            }
            _ => {
                return Err(CompilationError::InvalidChain(
                    "multiple edges from START (branch)".into(),
                ))
            }
        };

        let routers_reach_end = self
            .conditional_edges
            .values()
            .chain(self.entry_router.iter())
            .any(|r| {
                r.path_map
                    .as_ref()
                    .map_or(true, |m| m.values().any(|v| v == END))
            });
        let has_end = self.edges.iter().any(|(_, t)| t == END) || routers_reach_end;
        if !has_end {
            return Err(CompilationError::MissingEnd);
        }

        let fixed: Vec<&(String, String)> =
            self.edges.iter().filter(|(f, _)| f.as_str() != START).collect();
        let edge_froms: HashSet<&String> = fixed.iter().map(|(f, _)| f).collect();
        if edge_froms.len() != fixed.len() {
            return Err(CompilationError::InvalidChain(
                "duplicate from (branch)".into(),
            ));
        }
        for source in self.conditional_edges.keys() {
            if edge_froms.contains(source) {
                return Err(CompilationError::NodeHasBothEdgeAndConditional(
                    source.clone(),
                ));
            }
        }

        let mut next_map: HashMap<String, NextEntry<S>> = fixed
            .iter()
            .map(|(f, t)| (f.clone(), NextEntry::Unconditional(t.clone())))
            .collect();
        for (source, router) in &self.conditional_edges {
            next_map.insert(source.clone(), NextEntry::Conditional(router.clone()));
        }

        // Purely linear graphs must not loop: walk the chain once.
        if self.conditional_edges.is_empty() {
            if let NextEntry::Unconditional(ref first) = entry {
                let mut current = first.clone();
                let mut visited = HashSet::from([current.clone()]);
                while let Some(NextEntry::Unconditional(next)) = next_map.get(&current) {
                    if next == END {
                        break;
                    }
                    if !visited.insert(next.clone()) {
                        return Err(CompilationError::InvalidChain("cycle detected".into()));
                    }
                    current = next.clone();
                }
            }
        }

        let state_updater = self
            .state_updater
            .unwrap_or_else(|| Arc::new(ReplaceUpdater));

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            entry,
            next_map,
            middleware: self.middleware,
            state_updater,
            retry_policy: self.retry_policy,
        })
    }
}
