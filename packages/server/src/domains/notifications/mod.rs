pub mod dispatcher;

pub use dispatcher::{DispatchOutcome, DispatchWorker, NotificationDispatcher, DEFAULT_QUEUE_CAPACITY};
