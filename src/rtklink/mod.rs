//! Core subsystems of the rtklink device-communication framework.
//!
//! The framework is composed of five subsystems, leaves first:
//!
//! - [`topic`]: canonical topic construction and parsing (no dependencies)
//! - [`schema`]: named schema registry and subset JSON validation
//! - [`codec`]: the common message envelope and per-type payload builders
//! - [`pubsub`]: pluggable publish/subscribe backend management and
//!   connection-state handling
//! - [`plugin`]: device plugin registration, dynamic loading, and instance
//!   lifecycle
//!
//! ## Composition
//!
//! A device plugin produces payload JSON → the codec wraps it in an envelope
//! with schema name, timestamp, and optional trace → the schema validator
//! checks the result against the registered definition → the topic builder
//! produces the destination topic → the pub/sub manager publishes the bytes
//! on that topic. Inbound commands travel the reverse path through the
//! manager's message callback.
//!
//! No subsystem runs its own thread: callers drive the pub/sub manager's
//! `poll`/`yield_now` from their own loop, and every manager is an explicit
//! struct owned by the caller rather than a process-wide global.

pub mod codec;
pub mod plugin;
pub mod pubsub;
pub mod schema;
pub mod topic;

pub use codec::{Severity, StateMessage, TraceInfo};
pub use plugin::{DevicePlugin, PluginManager};
pub use pubsub::{PubSubBackend, PubSubManager};
pub use schema::SchemaRegistry;
pub use topic::{TopicBuilder, TopicConfig};
