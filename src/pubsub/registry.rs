use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::DashMap;

use super::{Callback, Subscription, Token, TopicLevels};

type TopicKey = Arc<str>;

/// Реестр подписок: точное имя темы → подписки в порядке регистрации.
///
/// Иерархия тем здесь не хранится, она разрешается во время публикации.
/// Тема присутствует в реестре, только пока у неё есть хотя бы одна
/// подписка.
pub(crate) struct Registry<P> {
    topics: DashMap<TopicKey, Vec<Subscription<P>>>,
    /// Следующий свободный токен.
    next_token: AtomicU64,
}

impl<P> Registry<P> {
    pub(crate) fn new() -> Self {
        Self {
            topics: DashMap::new(),
            next_token: AtomicU64::new(0),
        }
    }

    /// Регистрирует подписку и возвращает выданный ей токен.
    ///
    /// Токен выделяется под блокировкой записи темы, поэтому внутри одной
    /// темы токены всегда идут по возрастанию.
    pub(crate) fn insert(
        &self,
        topic: TopicKey,
        callback: Callback<P>,
    ) -> Token {
        let mut entry = self.topics.entry(topic).or_default();
        let token = Token::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        entry.push(Subscription { token, callback });
        token
    }

    /// Удаляет подписку по токену. Токены уникальны, поэтому поиск
    /// останавливается на первом совпадении.
    pub(crate) fn remove_token(
        &self,
        token: Token,
    ) -> bool {
        let mut hit: Option<TopicKey> = None;
        for mut entry in self.topics.iter_mut() {
            if let Some(pos) = entry.value().iter().position(|s| s.token == token) {
                entry.value_mut().remove(pos);
                hit = Some(entry.key().clone());
                break;
            }
        }

        match hit {
            Some(topic) => {
                self.topics.remove_if(&topic, |_, subs| subs.is_empty());
                true
            }
            None => false,
        }
    }

    /// Удаляет все подписки с этой функцией во всех темах и возвращает их
    /// количество.
    pub(crate) fn remove_callback(
        &self,
        callback: &Callback<P>,
    ) -> usize {
        let mut removed = 0;
        self.topics.retain(|_, subs| {
            let before = subs.len();
            subs.retain(|s| !Arc::ptr_eq(&s.callback, callback));
            removed += before - subs.len();
            !subs.is_empty()
        });
        removed
    }

    pub(crate) fn clear(&self) {
        self.topics.clear();
    }

    /// Есть ли непустой список подписчиков хотя бы на одном уровне темы.
    pub(crate) fn has_subscribers(
        &self,
        topic: &str,
    ) -> bool {
        TopicLevels::new(topic).any(|level| {
            self.topics
                .get(level)
                .is_some_and(|entry| !entry.value().is_empty())
        })
    }

    /// Граница доставки: подписки с токеном не меньше этого значения
    /// созданы после её начала.
    pub(crate) fn high_water(&self) -> Token {
        Token::new(self.next_token.load(Ordering::Relaxed))
    }

    /// Следующая подписка уровня `level` после `cursor` по живому
    /// состоянию реестра.
    ///
    /// Блокировка темы снимается до возврата, поэтому подписчик может
    /// свободно менять реестр во время своего вызова.
    pub(crate) fn next_after(
        &self,
        level: &str,
        cursor: Option<Token>,
        high_water: Token,
    ) -> Option<Subscription<P>> {
        let entry = self.topics.get(level)?;
        let subs = entry.value();
        let start = match cursor {
            Some(cursor) => subs.partition_point(|s| s.token <= cursor),
            None => 0,
        };
        subs.get(start)
            .filter(|s| s.token < high_water)
            .cloned()
    }

    pub(crate) fn subscription_count(&self) -> usize {
        self.topics.iter().map(|entry| entry.value().len()).sum()
    }

    pub(crate) fn topic_count(&self) -> usize {
        self.topics.len()
    }

    #[cfg(test)]
    pub(crate) fn contains_topic(
        &self,
        topic: &str,
    ) -> bool {
        self.topics.contains_key(topic)
    }
}
