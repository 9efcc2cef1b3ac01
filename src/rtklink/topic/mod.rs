//! Canonical topic construction, parsing, and subscribe patterns.

pub mod builder;
pub mod error;

pub use builder::{
    parse_topic, topic_is_valid, ParsedTopic, SubscribePattern, TopicBuilder, TopicConfig,
    TopicType, TOPIC_PREFIX, TOPIC_VERSION,
};
pub use error::{TopicError, TopicResult};
