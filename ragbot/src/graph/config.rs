//! Per-run configuration passed to `CompiledStateGraph::invoke` and `stream`.

/// Default cap on node executions per run.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Config for one graph run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnableConfig {
    /// Identifier attached to the run's tracing span. Generated when absent.
    pub run_id: Option<String>,
    /// Maximum number of node executions before the run fails with `RecursionLimit`.
    pub recursion_limit: usize,
}

impl Default for RunnableConfig {
    fn default() -> Self {
        Self {
            run_id: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl RunnableConfig {
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}
