//! State merge strategies for graph runs.

mod updater;

pub use updater::{BoxedStateUpdater, FieldBasedUpdater, ReplaceUpdater, StateUpdater};
