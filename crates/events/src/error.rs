use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Malformed payload for event type {event_type}: {reason}")]
    MalformedPayload { event_type: String, reason: String },
}
