//! Streaming events emitted by `CompiledStateGraph::stream`.

use std::collections::HashSet;
use std::fmt::Debug;

/// Which events a stream consumer wants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StreamMode {
    /// Full state after each node completes.
    Values,
    /// Node id plus the state after that node.
    Updates,
    /// Task start/end events for each node execution.
    Tasks,
    /// Everything.
    Debug,
}

impl StreamMode {
    /// True when an event of `mode` should be sent for the enabled `modes`.
    pub fn enabled_in(self, modes: &HashSet<StreamMode>) -> bool {
        modes.contains(&self) || modes.contains(&StreamMode::Debug)
    }
}

/// One streamed event.
#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Full state snapshot after a node finishes.
    Values(S),
    /// State after the named node.
    Updates { node_id: String, state: S },
    /// A node began execution.
    TaskStart { node_id: String },
    /// A node finished: Ok(()) on success, Err(message) on failure.
    TaskEnd {
        node_id: String,
        result: Result<(), String>,
    },
    /// The run failed; always the last event of a failed stream.
    Error(String),
}
