use std::sync::Arc;

use thiserror::Error;

use crate::pubsub::Token;

/// Сбой подписчика во время доставки.
///
/// В режиме изоляции такие ошибки собираются и публикуются в канал
/// сбоев диспетчера на следующем такте планировщика; в режиме
/// немедленных ошибок первая из них прерывает доставку.
#[derive(Debug, Clone, Error)]
#[error("subscriber {token} failed on topic '{topic}' (level '{level}'): {cause:#}")]
pub struct DeliveryError {
    /// Исходное имя опубликованной темы.
    pub topic: Arc<str>,
    /// Уровень иерархии, на котором была оформлена подписка.
    pub level: Arc<str>,
    /// Токен подписки, вернувшей ошибку.
    pub token: Token,
    cause: Arc<anyhow::Error>,
}

/// Паника внутри подписчика, перехваченная диспетчером.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("subscriber panicked: {message}")]
pub struct SubscriberPanic {
    pub message: String,
}

/// Причина, по которой отложенное задание не удалось поставить в очередь.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum SchedulerError {
    #[error("no Tokio runtime on the current thread")]
    NoRuntime,
    #[error("deferred delivery requires a current-thread Tokio runtime")]
    MultiThreadRuntime,
    #[error("scheduler task has stopped")]
    Stopped,
}

impl DeliveryError {
    pub(crate) fn new(
        topic: &str,
        level: &str,
        token: Token,
        cause: anyhow::Error,
    ) -> Self {
        Self {
            topic: Arc::from(topic),
            level: Arc::from(level),
            token,
            cause: Arc::new(cause),
        }
    }

    /// Исходная ошибка подписчика.
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// Была ли ошибка вызвана паникой подписчика.
    pub fn is_panic(&self) -> bool {
        self.cause.downcast_ref::<SubscriberPanic>().is_some()
    }
}
