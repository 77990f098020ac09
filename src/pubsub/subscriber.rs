use std::{
    fmt,
    num::ParseIntError,
    str::FromStr,
    sync::{Arc, Weak},
};

use super::dispatcher::Shared;

/// Функция-подписчик.
///
/// Получает исходное (не усечённое) имя опубликованной темы и данные
/// публикации. Ошибка, возвращённая подписчиком, изолируется диспетчером
/// и не мешает доставке остальным подписчикам.
///
/// Подписчик идентифицируется указателем `Arc`: отписка по
/// функции удаляет все подписки с тем же самым `Arc`.
pub type Callback<P> = Arc<dyn Fn(&str, Option<&P>) -> anyhow::Result<()> + Send + Sync>;

/// Оборачивает замыкание в [`Callback`].
pub fn callback<P, F>(f: F) -> Callback<P>
where
    F: Fn(&str, Option<&P>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Уникальный идентификатор подписки.
///
/// Выдаётся монотонным счётчиком, начиная с `0`, и никогда не
/// переиспользуется в пределах жизни диспетчера. В строковом виде
/// это десятичное число.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Числовое значение счётчика.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Token {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Token)
    }
}

/// Запись реестра: одна подписка на точное имя темы.
pub(crate) struct Subscription<P> {
    pub(crate) token: Token,
    pub(crate) callback: Callback<P>,
}

// derive(Clone) потребовал бы `P: Clone`
impl<P> Clone for Subscription<P> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Дескриптор подписки, возвращаемый `subscribe`.
///
/// В отличие от `Drop`-семантики каналов, удаление дескриптора подписку
/// не отменяет: для этого есть [`SubscriptionHandle::dispose`].
pub struct SubscriptionHandle<P> {
    token: Token,
    topic: Arc<str>,
    dispatcher: Weak<Shared<P>>,
}

impl<P> SubscriptionHandle<P> {
    pub(crate) fn new(
        token: Token,
        topic: Arc<str>,
        dispatcher: Weak<Shared<P>>,
    ) -> Self {
        Self {
            token,
            topic,
            dispatcher,
        }
    }

    /// Токен подписки.
    pub fn token(&self) -> Token {
        self.token
    }

    /// Имя темы, на которую оформлена подписка.
    pub fn topic(&self) -> &Arc<str> {
        &self.topic
    }

    /// Отписка по токену этой подписки. Эквивалентно
    /// `dispatcher.unsubscribe(handle.token())`.
    ///
    /// Если диспетчер уже уничтожен, возвращает [`Unsubscribed::NotFound`].
    pub fn dispose(&self) -> Unsubscribed {
        match self.dispatcher.upgrade() {
            Some(shared) => shared.unsubscribe_token(self.token),
            None => Unsubscribed::NotFound,
        }
    }
}

impl<P> fmt::Debug for SubscriptionHandle<P> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("token", &self.token)
            .field("topic", &self.topic)
            .finish()
    }
}

/// Что именно отписать.
pub enum Unsubscribe<P> {
    /// Одну подписку по её токену.
    Token(Token),
    /// Все подписки с этой функцией во всех темах.
    Callback(Callback<P>),
}

impl<P> From<Token> for Unsubscribe<P> {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl<P> From<&Token> for Unsubscribe<P> {
    fn from(token: &Token) -> Self {
        Self::Token(*token)
    }
}

impl<P> From<Callback<P>> for Unsubscribe<P> {
    fn from(callback: Callback<P>) -> Self {
        Self::Callback(callback)
    }
}

impl<P> From<&Callback<P>> for Unsubscribe<P> {
    fn from(callback: &Callback<P>) -> Self {
        Self::Callback(Arc::clone(callback))
    }
}

/// Результат отписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsubscribed {
    /// Удалена подписка с этим токеном.
    Token(Token),
    /// Удалено столько подписок с переданной функцией (всегда больше нуля).
    Callback(usize),
    /// Ничего не найдено. Это обычный исход, а не ошибка.
    NotFound,
}

impl Unsubscribed {
    /// Была ли удалена хотя бы одна подписка.
    pub fn is_removed(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}
