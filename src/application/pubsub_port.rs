//! Интерфейс (порт) Pub/Sub для встраивания в собственные типы.
//!
//! Любой тип, владеющий [`Dispatcher`], получает операции диспетчера,
//! реализовав единственный метод `dispatcher`:
//! - `subscribe` / `subscribe_fn` — подписаться на тему.
//! - `unsubscribe` — отписаться по токену или по функции.
//! - `unsubscribe_all` — удалить все подписки.
//! - `publish` / `publish_sync` — опубликовать сообщение.
//! - `has_subscribers` — проверить, есть ли получатели у темы.

use crate::{
    error::DeliveryError,
    pubsub::{callback, Callback, Dispatcher, SubscriptionHandle, Unsubscribe, Unsubscribed},
};

pub trait PubSubPort<P: Send + 'static> {
    /// Диспетчер, которому делегируются операции.
    fn dispatcher(&self) -> &Dispatcher<P>;

    /// Подписаться на тему.
    fn subscribe(
        &self,
        topic: &str,
        callback: Callback<P>,
    ) -> SubscriptionHandle<P> {
        self.dispatcher().subscribe(topic, callback)
    }

    /// Подписать замыкание на тему.
    fn subscribe_fn<F>(
        &self,
        topic: &str,
        f: F,
    ) -> SubscriptionHandle<P>
    where
        F: Fn(&str, Option<&P>) -> anyhow::Result<()> + Send + Sync + 'static,
        Self: Sized,
    {
        self.dispatcher().subscribe(topic, callback(f))
    }

    /// Отписаться по токену или по функции.
    fn unsubscribe(
        &self,
        target: Unsubscribe<P>,
    ) -> Unsubscribed {
        self.dispatcher().unsubscribe(target)
    }

    /// Удалить все подписки.
    fn unsubscribe_all(&self) {
        self.dispatcher().unsubscribe_all()
    }

    /// Отложенная публикация.
    fn publish(
        &self,
        topic: &str,
        data: Option<P>,
    ) -> bool {
        self.dispatcher().publish(topic, data)
    }

    /// Синхронная публикация.
    fn publish_sync(
        &self,
        topic: &str,
        data: Option<P>,
    ) -> Result<bool, DeliveryError> {
        self.dispatcher().publish_sync(topic, data)
    }

    /// Есть ли подписчики на теме или её префиксах.
    fn has_subscribers(
        &self,
        topic: &str,
    ) -> bool {
        self.dispatcher().has_subscribers(topic)
    }
}

impl<P: Send + 'static> PubSubPort<P> for Dispatcher<P> {
    fn dispatcher(&self) -> &Dispatcher<P> {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::pubsub::Token;

    /// Хост-объект, расширенный операциями Pub/Sub.
    struct ChatRoom {
        name: String,
        bus: Dispatcher<String>,
    }

    impl PubSubPort<String> for ChatRoom {
        fn dispatcher(&self) -> &Dispatcher<String> {
            &self.bus
        }
    }

    /// Тест проверяет, что хост-объект получает все операции диспетчера.
    #[tokio::test]
    async fn test_host_object_gains_operations() {
        let room = ChatRoom {
            name: "lobby".into(),
            bus: Dispatcher::new(),
        };
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let handle = room.subscribe_fn("chat", move |topic, text: Option<&String>| {
            sink.lock()
                .unwrap()
                .push(format!("{topic}={}", text.cloned().unwrap_or_default()));
            Ok(())
        });
        assert_eq!(handle.token(), "0".parse::<Token>().unwrap());

        assert!(room.has_subscribers("chat.lobby"));
        assert!(room
            .publish_sync(&format!("chat.{}", room.name), Some("hi".into()))
            .unwrap());
        assert_eq!(*seen.lock().unwrap(), vec!["chat.lobby=hi".to_string()]);

        assert_eq!(
            room.unsubscribe(handle.token().into()),
            Unsubscribed::Token(handle.token())
        );
        assert!(!room.publish("chat.lobby", None));
    }

    /// Тест проверяет, что сам диспетчер реализует порт.
    #[tokio::test]
    async fn test_dispatcher_implements_port() {
        fn publish_via_port(port: &impl PubSubPort<u8>) -> bool {
            port.publish("t", Some(1))
        }

        let dispatcher: Dispatcher<u8> = Dispatcher::new();
        assert!(!publish_via_port(&dispatcher));

        let cb: Callback<u8> = callback(|_, _| Ok(()));
        PubSubPort::subscribe(&dispatcher, "t", cb.clone());
        assert!(publish_via_port(&dispatcher));

        PubSubPort::unsubscribe_all(&dispatcher);
        assert!(!PubSubPort::has_subscribers(&dispatcher, "t"));
    }
}
