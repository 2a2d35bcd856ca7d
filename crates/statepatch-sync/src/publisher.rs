//! Source side of a sync link.

use statepatch_diff::ChangeStats;
use statepatch_types::State;
use tracing::debug;

use crate::message::SyncMessage;
use crate::strategy::SyncStrategy;

/// Holds the last published snapshot and turns each new snapshot into a
/// message for the replicas.
pub struct StatePublisher<S> {
    strategy: S,
    current: State,
    seq: u64,
}

impl<S: SyncStrategy> StatePublisher<S> {
    pub fn new(strategy: S, initial: State) -> Self {
        Self {
            strategy,
            current: initial,
            seq: 0,
        }
    }

    /// The full snapshot, for a replica that just connected.
    pub fn snapshot(&self) -> SyncMessage {
        SyncMessage::State {
            seq: self.seq,
            payload: self.current.clone(),
        }
    }

    /// Record `new` as the current snapshot.
    ///
    /// Returns the change list against the previous snapshot, or `None` when
    /// nothing changed; the sequence number only advances for messages that
    /// are returned.
    pub fn publish(&mut self, new: State) -> Option<SyncMessage> {
        let changes = self.strategy.diff(&self.current, &new);
        self.current = new;
        if changes.is_empty() {
            return None;
        }

        self.seq += 1;
        let stats = ChangeStats::of(&changes);
        debug!(
            seq = self.seq,
            changes = changes.len(),
            records = stats.records(),
            strategy = %self.strategy.kind(),
            "published state patch"
        );
        Some(SyncMessage::PatchState {
            seq: self.seq,
            payload: changes,
        })
    }

    pub fn current(&self) -> &State {
        &self.current
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{DeepStrategy, ShallowStrategy};
    use serde_json::json;

    fn state(v: serde_json::Value) -> State {
        State::try_from(v).unwrap()
    }

    #[test]
    fn snapshot_carries_current_state() {
        let publisher = StatePublisher::new(DeepStrategy::new(), state(json!({"a": 1})));
        assert_eq!(
            publisher.snapshot(),
            SyncMessage::State {
                seq: 0,
                payload: state(json!({"a": 1})),
            }
        );
    }

    #[test]
    fn publish_numbers_patches() {
        let initial = state(json!({"count": 0}));
        let mut publisher = StatePublisher::new(DeepStrategy::new(), initial.clone());

        let first = publisher.publish(initial.with("count", 1)).unwrap();
        let second = publisher.publish(publisher.current().with("count", 2)).unwrap();
        assert_eq!(first.seq(), 1);
        assert_eq!(second.seq(), 2);
        assert_eq!(publisher.seq(), 2);
        assert_eq!(publisher.snapshot().seq(), 2);
    }

    #[test]
    fn publish_unchanged_returns_none() {
        let initial = state(json!({"a": {"b": 1}}));
        let mut publisher = StatePublisher::new(ShallowStrategy::new(), initial.clone());
        assert!(publisher.publish(initial.clone()).is_none());
        assert!(publisher.publish(initial.with("x", 1).without("x")).is_none());
        assert_eq!(publisher.seq(), 0);
    }

    #[test]
    fn publish_advances_current() {
        let mut publisher = StatePublisher::new(DeepStrategy::new(), State::new());
        let next = state(json!({"a": [1]}));
        publisher.publish(next.clone());
        assert!(publisher.current().ptr_eq(&next));
    }
}
