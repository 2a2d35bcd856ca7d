//! Mirror side of a sync link.

use statepatch_types::State;
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::message::SyncMessage;
use crate::strategy::SyncStrategy;

/// Handle returned by [`StateReplica::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&State) + Send>;

/// Keeps a local copy of a publisher's state up to date.
pub struct StateReplica<S> {
    strategy: S,
    state: Option<State>,
    seq: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl<S: SyncStrategy> StateReplica<S> {
    /// A replica waiting for its first `state` message.
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            state: None,
            seq: 0,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// The local state, once a `state` message has arrived.
    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    /// Sequence number of the last applied message.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Apply a message from the publisher and notify subscribers.
    ///
    /// A patch must carry the sequence number right after the last applied
    /// message. On error the local state is left as it was.
    pub fn apply(&mut self, msg: SyncMessage) -> SyncResult<()> {
        match msg {
            SyncMessage::State { seq, payload } => {
                debug!(seq, keys = payload.len(), "replica received full state");
                self.state = Some(payload);
                self.seq = seq;
            }
            SyncMessage::PatchState { seq, payload } => {
                let current = self.state.as_ref().ok_or(SyncError::NotInitialized {
                    got: "patch_state",
                })?;
                let expected = self.seq + 1;
                if seq != expected {
                    return Err(SyncError::OutOfOrder { expected, got: seq });
                }
                let next = self.strategy.patch(current, &payload)?;
                debug!(seq, changes = payload.len(), "replica applied patch");
                self.state = Some(next);
                self.seq = seq;
            }
        }
        self.notify();
        Ok(())
    }

    /// Replace the local state without a message, keeping the sequence
    /// number, and notify subscribers.
    pub fn replace_state(&mut self, state: State) {
        self.state = Some(state);
        self.notify();
    }

    /// Call `listener` with the new state after every change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&State) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        if let Some(state) = &self.state {
            for (_, listener) in &mut self.listeners {
                listener(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::StatePublisher;
    use crate::strategy::{DeepStrategy, ShallowStrategy};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn state(v: serde_json::Value) -> State {
        State::try_from(v).unwrap()
    }

    #[test]
    fn follows_a_publisher() {
        let initial = state(json!({"todos": [], "filter": "all"}));
        let mut publisher = StatePublisher::new(DeepStrategy::new(), initial);
        let mut replica = StateReplica::new(DeepStrategy::new());
        replica.apply(publisher.snapshot()).unwrap();

        let steps = [
            json!({"todos": [{"text": "a"}], "filter": "all"}),
            json!({"todos": [{"text": "a"}, {"text": "b"}], "filter": "done"}),
            json!({"todos": [{"text": "b"}]}),
        ];
        for step in steps {
            if let Some(msg) = publisher.publish(state(step)) {
                replica.apply(msg).unwrap();
            }
            assert_eq!(replica.state(), Some(publisher.current()));
        }
        assert_eq!(replica.seq(), 3);
    }

    #[test]
    fn patch_before_state_is_rejected() {
        let mut replica = StateReplica::new(ShallowStrategy::new());
        let err = replica
            .apply(SyncMessage::PatchState {
                seq: 1,
                payload: Vec::new(),
            })
            .unwrap_err();
        assert!(matches!(err, SyncError::NotInitialized { got: "patch_state" }));
        assert!(!replica.is_initialized());
    }

    #[test]
    fn out_of_order_patch_is_rejected() {
        let mut publisher = StatePublisher::new(DeepStrategy::new(), state(json!({"n": 0})));
        let mut replica = StateReplica::new(DeepStrategy::new());
        replica.apply(publisher.snapshot()).unwrap();

        let _skipped = publisher.publish(state(json!({"n": 1}))).unwrap();
        let second = publisher.publish(state(json!({"n": 2}))).unwrap();
        let err = replica.apply(second).unwrap_err();
        assert!(matches!(err, SyncError::OutOfOrder { expected: 1, got: 2 }));
        assert_eq!(replica.state(), Some(&state(json!({"n": 0}))));

        // A fresh snapshot recovers the replica.
        replica.apply(publisher.snapshot()).unwrap();
        assert_eq!(replica.seq(), 2);
        assert_eq!(replica.state(), Some(&state(json!({"n": 2}))));
    }

    #[test]
    fn failed_patch_keeps_state() {
        let mut replica = StateReplica::new(ShallowStrategy::new());
        replica
            .apply(SyncMessage::State {
                seq: 0,
                payload: state(json!({"a": {"b": 1}})),
            })
            .unwrap();
        let deep = SyncMessage::PatchState {
            seq: 1,
            payload: serde_json::from_value(json!([
                {"key": "a", "change": "updated_keys", "value": []}
            ]))
            .unwrap(),
        };
        assert!(matches!(replica.apply(deep), Err(SyncError::Diff(_))));
        assert_eq!(replica.seq(), 0);
    }

    #[test]
    fn subscribers_are_notified_until_unsubscribed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut replica = StateReplica::new(DeepStrategy::new());
        let sink = Arc::clone(&seen);
        let id = replica.subscribe(move |s: &State| sink.lock().unwrap().push(s.len()));

        replica
            .apply(SyncMessage::State {
                seq: 0,
                payload: state(json!({"a": 1})),
            })
            .unwrap();
        replica.replace_state(state(json!({"a": 1, "b": 2})));
        assert!(replica.unsubscribe(id));
        assert!(!replica.unsubscribe(id));
        replica.replace_state(State::new());

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
