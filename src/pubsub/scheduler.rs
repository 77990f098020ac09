//! Планировщик отложенной доставки.
//!
//! Задания выполняются одной задачей Tokio строго в порядке постановки
//! в очередь (FIFO), по одному заданию за такт: между заданиями задача
//! уступает управление планировщику runtime.
//!
//! Модель однопоточная и кооперативная: задача запускается только на
//! runtime `current_thread`, поэтому отложенный подписчик не выполняется,
//! пока публикующий код не отдаст управление, и никогда не выполняется
//! параллельно с ним.

use std::sync::{Arc, Weak};

use tokio::{
    runtime::{Handle, RuntimeFlavor},
    sync::{mpsc, oneshot},
};

use super::dispatcher::Shared;
use crate::error::{DeliveryError, SchedulerError};

pub(crate) type JobSender<P> = mpsc::UnboundedSender<Job<P>>;
pub(crate) type JobReceiver<P> = mpsc::UnboundedReceiver<Job<P>>;

/// Задание очереди.
pub(crate) enum Job<P> {
    /// Доставить публикацию по текущему состоянию реестра.
    Deliver {
        topic: Arc<str>,
        data: Option<P>,
        immediate: bool,
    },
    /// Поднять собранные сбои подписчиков.
    Raise(Vec<DeliveryError>),
    /// Барьер для `flush`.
    Flush(oneshot::Sender<()>),
}

impl<P> Job<P> {
    pub(crate) fn is_barrier(&self) -> bool {
        matches!(self, Self::Flush(_))
    }
}

pub(crate) fn channel<P>() -> (JobSender<P>, JobReceiver<P>) {
    mpsc::unbounded_channel()
}

/// Запускает обработчик очереди на runtime текущего потока и возвращает
/// отправителя заданий.
///
/// # Errors
///
/// - [`SchedulerError::NoRuntime`]: вызов вне runtime Tokio.
/// - [`SchedulerError::MultiThreadRuntime`]: многопоточный runtime, на
///   котором доставка шла бы параллельно с публикующим.
pub(crate) fn start<P>(shared: Weak<Shared<P>>) -> Result<JobSender<P>, SchedulerError>
where
    P: Send + 'static,
{
    let handle = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
    if handle.runtime_flavor() != RuntimeFlavor::CurrentThread {
        return Err(SchedulerError::MultiThreadRuntime);
    }

    let (jobs, receiver) = channel();
    spawn_worker(&handle, shared, receiver);
    tracing::debug!("dotbus scheduler started");
    Ok(jobs)
}

/// Запускает задачу-обработчик очереди.
///
/// Задача держит только `Weak`-ссылку: когда последний диспетчер
/// уничтожен, очередь закрывается и задача завершается.
fn spawn_worker<P>(
    handle: &Handle,
    shared: Weak<Shared<P>>,
    mut jobs: JobReceiver<P>,
) where
    P: Send + 'static,
{
    handle.spawn(async move {
        while let Some(job) = jobs.recv().await {
            {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.run_job(job);
            }
            tokio::task::yield_now().await;
        }
        tracing::debug!("dotbus scheduler stopped");
    });
}
