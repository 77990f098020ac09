use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// Префикс переменных окружения, например `DOTBUS_IMMEDIATE_EXCEPTIONS`.
pub const ENV_PREFIX: &str = "DOTBUS";

const DEFAULT_FAILURE_CAPACITY: usize = 64;

/// Настройки диспетчера.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Первый сбой подписчика прерывает доставку и возвращается
    /// публикующему вместо изоляции.
    pub immediate_exceptions: bool,
    /// Ёмкость broadcast-канала сбоев.
    pub failure_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            immediate_exceptions: false,
            failure_capacity: DEFAULT_FAILURE_CAPACITY,
        }
    }
}

impl DispatcherConfig {
    /// Загружает настройки: значения по умолчанию, поверх них переменные
    /// окружения с префиксом `DOTBUS_`.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .set_default("immediate_exceptions", false)?
            .set_default("failure_capacity", DEFAULT_FAILURE_CAPACITY as u64)?
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let mut settings: Self = cfg.try_deserialize()?;
        settings.failure_capacity = settings.failure_capacity.max(1);
        Ok(settings)
    }

    pub fn with_immediate_exceptions(
        mut self,
        enabled: bool,
    ) -> Self {
        self.immediate_exceptions = enabled;
        self
    }

    pub fn with_failure_capacity(
        mut self,
        capacity: usize,
    ) -> Self {
        self.failure_capacity = capacity.max(1);
        self
    }
}
