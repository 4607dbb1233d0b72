use std::time::Duration;

use crate::common::types::Message;

/// Events the live feed task reports to the owning chat session.
#[derive(Debug, Clone)]
pub enum LiveEvent {
    Connected,
    Disconnected { retry_in: Duration },
    Message(Message),
}
