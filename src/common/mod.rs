mod queue;

pub use queue::{Queue, QueueReceiver, QueueSender};
