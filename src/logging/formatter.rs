use std::io::{self, Stderr};

use tracing_subscriber::layer::Layer as LayerTrait;
use tracing_subscriber::{fmt, registry::LookupSpan};

use crate::logging::config::{LogFormat, LoggingConfig};

/// Build formatter на основе конфигурации.
/// Возвращаем boxed trait-объект, чтобы стереть конкретный тип формата
/// (json/pretty/compact). Логи пишутся в stderr: stdout остаётся за
/// выводом приложения.
pub fn build_formatter_from_config<S>(config: &LoggingConfig) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer: fn() -> Stderr = io::stderr;

    match config.format {
        LogFormat::Json => Box::new(
            fmt::layer()
                .event_format(fmt::format().json().with_current_span(true))
                .with_writer(writer)
                .with_ansi(false)
                .with_target(config.with_target),
        ),
        LogFormat::Pretty => Box::new(
            fmt::layer()
                .event_format(fmt::format().pretty())
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target),
        ),
        LogFormat::Compact => Box::new(
            fmt::layer()
                .event_format(fmt::format().compact())
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target),
        ),
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::{prelude::*, Registry};

    use super::*;

    /// Тест проверяет, что слой любого формата собирается и принимается
    /// реестром.
    #[test]
    fn test_every_format_builds() {
        for format in [LogFormat::Compact, LogFormat::Pretty, LogFormat::Json] {
            let cfg = LoggingConfig {
                format,
                ..LoggingConfig::default()
            };
            let subscriber = Registry::default().with(build_formatter_from_config(&cfg));
            tracing::subscriber::with_default(subscriber, || {
                tracing::debug!(%format, "formatter smoke test");
            });
        }
    }
}
