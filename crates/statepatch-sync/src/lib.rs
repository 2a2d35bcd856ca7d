//! Synchronization layer for statepatch.
//!
//! A [`StatePublisher`] owns the authoritative state and turns each new
//! snapshot into a [`SyncMessage`]; a [`StateReplica`] applies those messages
//! to keep a mirror. Both ends share a [`SyncStrategy`], and messages travel
//! as bytes through a [`PayloadCodec`].
//!
//! ```
//! use statepatch_sync::{DeepStrategy, JsonCodec, PayloadCodec, StatePublisher, StateReplica};
//! use statepatch_types::State;
//!
//! let codec = JsonCodec::new();
//! let mut publisher = StatePublisher::new(DeepStrategy::new(), State::new());
//! let mut replica = StateReplica::new(DeepStrategy::new());
//!
//! let bytes = codec.encode(&publisher.snapshot()).unwrap();
//! replica.apply(codec.decode(&bytes).unwrap()).unwrap();
//!
//! let msg = publisher.publish(State::new().with("count", 1)).unwrap();
//! replica.apply(codec.decode(&codec.encode(&msg).unwrap()).unwrap()).unwrap();
//! assert_eq!(replica.state(), Some(publisher.current()));
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod publisher;
pub mod replica;
pub mod strategy;

pub use codec::{JsonCodec, PayloadCodec};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use message::{SyncMessage, MAX_MESSAGE_SIZE};
pub use publisher::StatePublisher;
pub use replica::{StateReplica, SubscriptionId};
pub use strategy::{BoxedStrategy, DeepStrategy, ShallowStrategy, StrategyKind, SyncStrategy};
