/// Ports for embedding pub/sub operations into host types.
pub mod application;
/// Dispatcher configuration loading.
pub mod config;
/// Common error types: delivery failures, logging setup.
pub mod error;
/// Logging setup (filters, formats).
pub mod logging;
/// Pub/Sub: Dispatcher, topic hierarchy, subscriptions.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Host augmentation port.
pub use application::PubSubPort;
/// Dispatcher configuration.
pub use config::DispatcherConfig;
/// Operation errors.
pub use error::{DeliveryError, LoggingError, SubscriberPanic};
/// Logging.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Pub/Sub API.
pub use pubsub::{
    callback, Callback, Dispatcher, DispatcherStats, SubscriptionHandle, Token, TopicLevels,
    Unsubscribe, Unsubscribed,
};
