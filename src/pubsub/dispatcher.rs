use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, OnceLock, Weak,
    },
};

use tokio::sync::{
    broadcast,
    mpsc::error::SendError,
    oneshot,
};

use super::{
    callback,
    metrics::{DispatcherMetrics, DispatcherStats},
    registry::Registry,
    scheduler::{self, Job, JobSender},
    Callback, Subscription, SubscriptionHandle, Token, TopicLevels, Unsubscribe, Unsubscribed,
};
use crate::{
    config::DispatcherConfig,
    error::{DeliveryError, SchedulerError, SubscriberPanic},
};

/// Диспетчер Pub/Sub с иерархическими темами.
///
/// Подписка на `"a"` получает публикации `"a"`, `"a.b"`, `"a.b.c"` и т.д.
/// Публикация в `"a.b.c"` доставляется сначала подписчикам `"a.b.c"`,
/// затем `"a.b"`, затем `"a"`; каждый подписчик видит исходное имя
/// `"a.b.c"`.
///
/// Поддерживает:
/// - Синхронную доставку (`publish_sync`) и отложенную (`publish`) через
///   FIFO-очередь на задаче однопоточного runtime Tokio
/// - Отписку по токену, по функции во всех темах и полную очистку
/// - Изоляцию сбоев подписчиков с публикацией в канал сбоев
/// - Режим немедленных ошибок (`immediate_exceptions`)
///
/// `Dispatcher` является дешёвым `Clone`-дескриптором общего состояния. Разные
/// экземпляры, созданные через `new`, ничего не делят между собой.
///
/// Создание диспетчера, подписки и `publish_sync` не требуют runtime.
/// Отложенная доставка запускается лениво первым `publish` и работает
/// только на runtime `current_thread`: подписчик вызывается после того,
/// как публикующий отдал управление, и никогда параллельно с ним.
pub struct Dispatcher<P> {
    shared: Arc<Shared<P>>,
}

/// Общее состояние диспетчера.
pub(crate) struct Shared<P> {
    me: Weak<Shared<P>>,
    registry: Registry<P>,
    immediate_exceptions: AtomicBool,
    /// Очередь планировщика, создаётся первым отложенным заданием
    jobs: OnceLock<JobSender<P>>,
    /// Задания доставки и подъёма сбоев, ещё не выполненные планировщиком
    pending: AtomicUsize,
    failures: broadcast::Sender<DeliveryError>,
    metrics: DispatcherMetrics,
}

impl<P> Clone for Dispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P> Default for Dispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Dispatcher<P> {
    /// Создаёт диспетчер с настройками по умолчанию.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Создаёт диспетчер с заданными настройками.
    pub fn with_config(config: DispatcherConfig) -> Self {
        let (failures, _) = broadcast::channel(config.failure_capacity.max(1));
        let shared = Arc::new_cyclic(|me| Shared {
            me: me.clone(),
            registry: Registry::new(),
            immediate_exceptions: AtomicBool::new(config.immediate_exceptions),
            jobs: OnceLock::new(),
            pending: AtomicUsize::new(0),
            failures,
            metrics: DispatcherMetrics::new(),
        });

        tracing::debug!(
            immediate_exceptions = config.immediate_exceptions,
            failure_capacity = config.failure_capacity,
            "dispatcher created"
        );
        Self { shared }
    }

    /// Подписывает функцию на тему.
    ///
    /// Выдаёт следующий токен и добавляет подписку в конец списка темы.
    /// Возвращённый дескриптор умеет отписаться через
    /// [`SubscriptionHandle::dispose`].
    pub fn subscribe(
        &self,
        topic: &str,
        callback: Callback<P>,
    ) -> SubscriptionHandle<P> {
        let topic: Arc<str> = Arc::from(topic);
        let token = self.shared.registry.insert(topic.clone(), callback);
        tracing::debug!(topic = %topic, token = %token, "subscribed");
        SubscriptionHandle::new(token, topic, Arc::downgrade(&self.shared))
    }

    /// Подписывает замыкание на тему.
    pub fn subscribe_fn<F>(
        &self,
        topic: &str,
        f: F,
    ) -> SubscriptionHandle<P>
    where
        F: Fn(&str, Option<&P>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(topic, callback(f))
    }

    /// Отписка по токену или по функции.
    ///
    /// - Токен: удаляет единственную подписку с этим токеном.
    /// - Функция: удаляет все подписки с этим самым `Arc` во всех темах.
    ///
    /// Отсутствие совпадений даёт обычный исход [`Unsubscribed::NotFound`].
    pub fn unsubscribe(
        &self,
        target: impl Into<Unsubscribe<P>>,
    ) -> Unsubscribed {
        match target.into() {
            Unsubscribe::Token(token) => self.shared.unsubscribe_token(token),
            Unsubscribe::Callback(callback) => self.shared.unsubscribe_callback(&callback),
        }
    }

    /// Удаляет все подписки диспетчера.
    pub fn unsubscribe_all(&self) {
        self.shared.registry.clear();
        tracing::debug!("all subscriptions removed");
    }

    /// Есть ли подписчики на теме или на любом её префиксе.
    pub fn has_subscribers(
        &self,
        topic: &str,
    ) -> bool {
        self.shared.registry.has_subscribers(topic)
    }

    /// Приёмник сбоев подписчиков.
    ///
    /// Получает только сбои, поднятые после своего создания.
    pub fn failures(&self) -> broadcast::Receiver<DeliveryError> {
        self.shared.failures.subscribe()
    }

    pub fn immediate_exceptions(&self) -> bool {
        self.shared.immediate_exceptions.load(Ordering::Relaxed)
    }

    /// Переключает режим немедленных ошибок. Действует на публикации,
    /// сделанные после переключения.
    pub fn set_immediate_exceptions(
        &self,
        enabled: bool,
    ) {
        self.shared
            .immediate_exceptions
            .store(enabled, Ordering::Relaxed);
    }

    pub fn stats(&self) -> DispatcherStats {
        self.shared.metrics.snapshot()
    }

    pub fn subscription_count(&self) -> usize {
        self.shared.registry.subscription_count()
    }

    pub fn topic_count(&self) -> usize {
        self.shared.registry.topic_count()
    }
}

impl<P: Send + 'static> Dispatcher<P> {
    /// Отложенная публикация.
    ///
    /// Если ни на одном уровне темы нет подписчиков, возвращает `false` и
    /// ничего не планирует. Иначе ставит доставку в очередь и сразу
    /// возвращает `true`: доставка произойдёт на одном из следующих тактов
    /// по состоянию реестра на момент доставки. Исход доставки публикующему
    /// не сообщается.
    ///
    /// Вне runtime Tokio и на многопоточном runtime доставка не
    /// планируется: возвращается `false`, причина пишется в лог.
    pub fn publish(
        &self,
        topic: &str,
        data: Option<P>,
    ) -> bool {
        if !self.shared.matches(topic) {
            return false;
        }

        let scheduled = self.shared.schedule(Job::Deliver {
            topic: Arc::from(topic),
            data,
            immediate: self.immediate_exceptions(),
        });
        if scheduled {
            self.shared.metrics.record_published();
        }
        scheduled
    }

    /// Синхронная публикация: доставка выполняется до возврата.
    ///
    /// # Errors
    ///
    /// Только в режиме немедленных ошибок: первый сбой подписчика
    /// прерывает доставку и возвращается как [`DeliveryError`]. В обычном
    /// режиме сбои уходят в канал сбоев на следующем такте, а без
    /// работающего планировщика поднимаются сразу.
    pub fn publish_sync(
        &self,
        topic: &str,
        data: Option<P>,
    ) -> Result<bool, DeliveryError> {
        if !self.shared.matches(topic) {
            return Ok(false);
        }

        self.shared.metrics.record_published();
        let failures = self
            .shared
            .fan_out(topic, data.as_ref(), self.immediate_exceptions())?;
        if !failures.is_empty() {
            self.shared.schedule(Job::Raise(failures));
        }
        Ok(true)
    }

    /// Дожидается выполнения всех отложенных доставок и подъёма сбоев,
    /// поставленных в очередь до вызова (и порождённых ими). Без
    /// планировщика возвращается сразу.
    pub async fn flush(&self) {
        loop {
            let (tx, rx) = oneshot::channel();
            if !self.shared.schedule(Job::Flush(tx)) || rx.await.is_err() {
                return;
            }
            if self.shared.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
        }
    }
}

impl<P> fmt::Debug for Dispatcher<P> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("topics", &self.topic_count())
            .field("subscriptions", &self.subscription_count())
            .field("immediate_exceptions", &self.immediate_exceptions())
            .finish()
    }
}

impl<P> Shared<P> {
    pub(crate) fn unsubscribe_token(
        &self,
        token: Token,
    ) -> Unsubscribed {
        if self.registry.remove_token(token) {
            tracing::debug!(token = %token, "unsubscribed by token");
            Unsubscribed::Token(token)
        } else {
            Unsubscribed::NotFound
        }
    }

    fn unsubscribe_callback(
        &self,
        callback: &Callback<P>,
    ) -> Unsubscribed {
        match self.registry.remove_callback(callback) {
            0 => Unsubscribed::NotFound,
            removed => {
                tracing::debug!(removed, "unsubscribed by callback");
                Unsubscribed::Callback(removed)
            }
        }
    }

    fn matches(
        &self,
        topic: &str,
    ) -> bool {
        let found = self.registry.has_subscribers(topic);
        if !found {
            self.metrics.record_unmatched();
            tracing::debug!(topic, "publish skipped: no subscribers");
        }
        found
    }

    /// Доставка публикации по всем уровням иерархии.
    ///
    /// Списки подписчиков обходятся по живому состоянию реестра: после
    /// каждого вызова следующая подписка ищется заново по токену. Подписки,
    /// созданные после начала доставки, в неё не попадают.
    fn fan_out(
        &self,
        topic: &str,
        data: Option<&P>,
        immediate: bool,
    ) -> Result<Vec<DeliveryError>, DeliveryError> {
        let high_water = self.registry.high_water();
        let mut failures = Vec::new();

        for level in TopicLevels::new(topic) {
            let mut cursor = None;
            while let Some(sub) = self.registry.next_after(level, cursor, high_water) {
                cursor = Some(sub.token);
                tracing::trace!(topic, level, token = %sub.token, "delivering");

                match call_subscriber(&sub, topic, data) {
                    Ok(()) => self.metrics.record_delivered(),
                    Err(cause) => {
                        self.metrics.record_failed();
                        let failure = DeliveryError::new(topic, level, sub.token, cause);
                        if immediate {
                            return Err(failure);
                        }
                        failures.push(failure);
                    }
                }
            }
        }

        Ok(failures)
    }

    fn raise(
        &self,
        failures: Vec<DeliveryError>,
    ) {
        for failure in failures {
            tracing::error!(
                topic = %failure.topic,
                level = %failure.level,
                token = %failure.token,
                error = %failure.cause(),
                "subscriber failed during delivery"
            );
            // Нет получателей: не ошибка
            let _ = self.failures.send(failure);
        }
    }
}

impl<P: Send + 'static> Shared<P> {
    /// Очередь планировщика; первый вызов запускает обработчик.
    fn jobs(&self) -> Result<&JobSender<P>, SchedulerError> {
        if let Some(jobs) = self.jobs.get() {
            return Ok(jobs);
        }
        let jobs = scheduler::start(self.me.clone())?;
        Ok(self.jobs.get_or_init(|| jobs))
    }

    /// Ставит задание в очередь планировщика.
    ///
    /// Без работающего планировщика задание теряется; собранные сбои в
    /// этом случае поднимаются сразу.
    fn schedule(
        &self,
        job: Job<P>,
    ) -> bool {
        let counted = !job.is_barrier();
        if counted {
            self.pending.fetch_add(1, Ordering::SeqCst);
        }

        let sent = match self.jobs() {
            Ok(jobs) => jobs
                .send(job)
                .map_err(|SendError(job)| (job, SchedulerError::Stopped)),
            Err(reason) => Err((job, reason)),
        };

        match sent {
            Ok(()) => true,
            Err((job, reason)) => {
                if counted {
                    self.pending.fetch_sub(1, Ordering::SeqCst);
                }
                match job {
                    Job::Raise(failures) => {
                        tracing::debug!(%reason, "raising subscriber failures inline");
                        self.raise(failures);
                    }
                    Job::Deliver { topic, .. } => {
                        tracing::warn!(%reason, topic = %topic, "deferred delivery dropped");
                    }
                    Job::Flush(_) => {}
                }
                false
            }
        }
    }

    /// Выполняет одно задание очереди.
    pub(crate) fn run_job(
        &self,
        job: Job<P>,
    ) {
        match job {
            Job::Deliver {
                topic,
                data,
                immediate,
            } => {
                match self.fan_out(&topic, data.as_ref(), immediate) {
                    Ok(failures) if failures.is_empty() => {}
                    Ok(failures) => {
                        self.schedule(Job::Raise(failures));
                    }
                    Err(failure) => self.raise(vec![failure]),
                }
                self.pending.fetch_sub(1, Ordering::SeqCst);
            }
            Job::Raise(failures) => {
                self.raise(failures);
                self.pending.fetch_sub(1, Ordering::SeqCst);
            }
            Job::Flush(done) => {
                // `flush` мог уже перестать ждать
                let _ = done.send(());
            }
        }
    }
}

fn call_subscriber<P>(
    sub: &Subscription<P>,
    topic: &str,
    data: Option<&P>,
) -> anyhow::Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| (sub.callback)(topic, data))) {
        Ok(result) => result,
        Err(payload) => Err(SubscriberPanic {
            message: panic_message(payload.as_ref()),
        }
        .into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
