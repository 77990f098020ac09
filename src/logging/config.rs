use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::LoggingError;

/// Формат вывода логов.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

/// Настройки логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Уровень или полная директива `EnvFilter` (`"info"`,
    /// `"dotbus=debug,warn"`). `RUST_LOG` имеет приоритет.
    pub level: String,
    pub format: LogFormat,
    pub with_target: bool,
    pub with_ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            with_target: true,
            with_ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Применяет `DOTBUS_LOG_LEVEL` и `DOTBUS_LOG_FORMAT`, если они заданы.
    pub fn apply_env_overrides(&mut self) -> Result<(), LoggingError> {
        if let Ok(level) = env::var("DOTBUS_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("DOTBUS_LOG_FORMAT") {
            self.format = format.parse()?;
        }
        Ok(())
    }

    pub fn build_filter_directive(&self) -> String {
        self.level.trim().to_string()
    }
}
