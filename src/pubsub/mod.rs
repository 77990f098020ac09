//! Подсистема Publish–Subscribe с иерархическими темами.
//!
//! Этот модуль реализует внутрипроцессный диспетчер сообщений, в котором
//! подписка на тему получает и публикации во все её «дочерние» темы:
//!
//! - `dispatcher`: реестр подписок, публикация и протокол доставки.
//! - `topic`: обход уровней иерархии темы (`a.b.c` → `a.b` → `a`).
//! - `subscriber`: токены, функции-подписчики и дескрипторы подписок.
//! - `registry` (приватный): хранилище подписок по точному имени темы.
//! - `scheduler` (приватный): FIFO-очередь отложенной доставки.
//! - `metrics` (приватный): счётчики публикаций, доставок и сбоев.
//!
//! Публичный API переэкспортирует:
//! - `dispatcher::*`
//! - `metrics::DispatcherStats`
//! - `subscriber::*`
//! - `topic::*`

pub mod dispatcher;
mod metrics;
mod registry;
mod scheduler;
pub mod subscriber;
pub mod topic;

pub use dispatcher::Dispatcher;
pub use metrics::DispatcherStats;
pub(crate) use subscriber::Subscription;
pub use subscriber::{callback, Callback, SubscriptionHandle, Token, Unsubscribe, Unsubscribed};
pub use topic::{TopicLevels, LEVEL_SEPARATOR};
