//! Notification source.
//!
//! Reads storage notifications from the broker on a background task and hands
//! them, one at a time, to whoever drains the returned [`MessageStream`].
//! Offsets are only committed on request.

mod kafka_reader;
pub mod messages;
mod notification_consumer;
mod reader;

pub use kafka_reader::{KafkaReader, KafkaReaderConfig};
pub use messages::{NotificationEvent, SourceMessage};
pub use notification_consumer::{
    ConsumerState, MessageStream, NotificationConsumer, NotificationConsumerConfig,
};
pub use reader::{MessageIterator, MessageReader};
