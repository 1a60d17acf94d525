//! Tagged stream elements.

/// An element flowing through one of the streaming channels.
///
/// Producers always finish a stream with [`StreamMessage::End`], so consumers
/// can tell a completed run from a producer that went away.
#[derive(Debug)]
pub enum StreamMessage<T> {
    /// A produced value.
    Item(T),
    /// A recoverable error the producer reported and moved past.
    Error(String),
    /// The producer has finished.
    End,
}

impl<T> StreamMessage<T> {
    /// Returns `true` for the end-of-stream marker.
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Map the carried value, leaving errors and the end marker unchanged.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StreamMessage<U> {
        match self {
            Self::Item(value) => StreamMessage::Item(f(value)),
            Self::Error(e) => StreamMessage::Error(e),
            Self::End => StreamMessage::End,
        }
    }
}
