pub mod logging;
pub mod pubsub;

pub use logging::LoggingError;
pub(crate) use pubsub::SchedulerError;
pub use pubsub::{DeliveryError, SubscriberPanic};
