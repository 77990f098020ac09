use std::sync::atomic::{AtomicU64, Ordering};

/// Счётчики диспетчера.
#[derive(Debug, Default)]
pub(crate) struct DispatcherMetrics {
    /// Публикации, для которых нашлись подписчики
    published: AtomicU64,
    /// Публикации без единого подписчика
    unmatched: AtomicU64,
    /// Успешные вызовы подписчиков
    delivered: AtomicU64,
    /// Вызовы подписчиков, завершившиеся ошибкой или паникой
    failed: AtomicU64,
}

/// Снимок счётчиков диспетчера.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub published: u64,
    pub unmatched: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl DispatcherMetrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unmatched(&self) {
        self.unmatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> DispatcherStats {
        DispatcherStats {
            published: self.published.load(Ordering::Relaxed),
            unmatched: self.unmatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
