//! State updaters: how a node's returned update is merged into the running state.
//!
//! `ReplaceUpdater` swaps the whole state. `FieldBasedUpdater` wraps a closure so
//! that each field can have its own rule (replace when present, append, add).

use std::fmt::Debug;
use std::sync::Arc;

/// Merges a node's update into the current state.
pub trait StateUpdater<S>: Send + Sync + Debug
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn apply_update(&self, current: &mut S, update: &S);
}

/// Shared updater handle stored in the graph.
pub type BoxedStateUpdater<S> = Arc<dyn StateUpdater<S>>;

/// The update replaces the whole state.
#[derive(Debug, Clone, Default)]
pub struct ReplaceUpdater;

impl<S> StateUpdater<S> for ReplaceUpdater
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn apply_update(&self, current: &mut S, update: &S) {
        *current = update.clone();
    }
}

/// Merges with a closure `(current, update)`.
pub struct FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    updater_fn: F,
    _marker: std::marker::PhantomData<fn(S)>,
}

impl<S, F> Debug for FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBasedUpdater")
            .field("updater_fn", &"<function>")
            .finish()
    }
}

impl<S, F> FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    pub fn new(updater_fn: F) -> Self {
        Self {
            updater_fn,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<S, F> StateUpdater<S> for FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    fn apply_update(&self, current: &mut S, update: &S) {
        (self.updater_fn)(current, update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Tally {
        seen: Vec<String>,
        last: Option<i32>,
    }

    #[test]
    fn replace_updater_overwrites() {
        let mut current = Tally {
            seen: vec!["a".into()],
            last: Some(1),
        };
        ReplaceUpdater.apply_update(&mut current, &Tally::default());
        assert_eq!(current, Tally::default());
    }

    /// **Scenario**: A field-based updater appends one field and keeps the other when absent.
    #[test]
    fn field_based_updater_applies_closure() {
        let updater = FieldBasedUpdater::new(|c: &mut Tally, u: &Tally| {
            c.seen.extend(u.seen.iter().cloned());
            if u.last.is_some() {
                c.last = u.last;
            }
        });
        let mut current = Tally {
            seen: vec!["a".into()],
            last: Some(1),
        };
        updater.apply_update(
            &mut current,
            &Tally {
                seen: vec!["b".into()],
                last: None,
            },
        );
        assert_eq!(current.seen, vec!["a", "b"]);
        assert_eq!(current.last, Some(1));
        assert!(format!("{:?}", updater).contains("FieldBasedUpdater"));
    }
}
