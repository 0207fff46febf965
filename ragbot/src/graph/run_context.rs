//! Run context passed into nodes: run config plus the optional stream sender.

use std::collections::HashSet;
use std::fmt::Debug;

use tokio::sync::mpsc;

use crate::stream::{StreamEvent, StreamMode};

use super::RunnableConfig;

#[derive(Clone)]
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub config: RunnableConfig,
    /// Sender for streaming events; `None` for `invoke`.
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    pub stream_mode: HashSet<StreamMode>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            stream_tx: None,
            stream_mode: HashSet::new(),
        }
    }

    pub fn with_stream(
        mut self,
        tx: mpsc::Sender<StreamEvent<S>>,
        modes: HashSet<StreamMode>,
    ) -> Self {
        self.stream_tx = Some(tx);
        self.stream_mode = modes;
        self
    }

    pub fn is_streaming_mode(&self, mode: StreamMode) -> bool {
        self.stream_tx.is_some() && mode.enabled_in(&self.stream_mode)
    }

    /// Sends `event` when `mode` is enabled. Returns false when nothing was sent
    /// (mode disabled, no sender, or the receiver was dropped).
    pub async fn emit(&self, mode: StreamMode, event: impl FnOnce() -> StreamEvent<S>) -> bool {
        match &self.stream_tx {
            Some(tx) if mode.enabled_in(&self.stream_mode) => tx.send(event()).await.is_ok(),
            _ => false,
        }
    }
}
