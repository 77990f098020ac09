use tracing_subscriber::EnvFilter;

use crate::{error::LoggingError, logging::config::LoggingConfig};

/// Собирает `EnvFilter`: `RUST_LOG`, если задана, иначе директива из
/// конфигурации.
pub fn build_filter_from_config(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        return Ok(env_filter);
    }

    let directive = config.build_filter_directive();
    EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidDirective {
        directive,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        sync::{Arc, Mutex},
    };

    use serial_test::serial;
    use tracing_subscriber::{fmt, prelude::*, registry::Registry};

    use super::*;

    // Мини-буферный writer для тестов
    struct VecMakeWriter(Arc<Mutex<Vec<u8>>>);

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for VecMakeWriter {
        type Writer = VecWriterGuard;

        fn make_writer(&'a self) -> Self::Writer {
            VecWriterGuard(self.0.clone())
        }
    }

    struct VecWriterGuard(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for VecWriterGuard {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            let mut locked = self.0.lock().unwrap();
            locked.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Тест проверяет, что некорректная директива из конфигурации
    /// возвращает ошибку с исходным текстом директивы.
    #[test]
    #[serial]
    fn test_invalid_directive_is_rejected() {
        env::remove_var("RUST_LOG");
        let cfg = LoggingConfig {
            level: "dotbus=loud".into(),
            ..LoggingConfig::default()
        };

        match build_filter_from_config(&cfg) {
            Err(LoggingError::InvalidDirective { directive, .. }) => {
                assert_eq!(directive, "dotbus=loud");
            }
            other => panic!("Expected InvalidDirective, got {other:?}"),
        }
    }

    /// Тест проверяет, что `RUST_LOG` перекрывает директиву конфигурации.
    #[test]
    #[serial]
    fn test_rust_log_wins() {
        env::set_var("RUST_LOG", "debug");
        let cfg = LoggingConfig {
            level: "dotbus=loud".into(),
            ..LoggingConfig::default()
        };
        let res = build_filter_from_config(&cfg);
        env::remove_var("RUST_LOG");
        assert!(res.is_ok());
    }

    /// Тест проверяет поведение фильтра в runtime: при директиве "warn"
    /// сообщения info не попадут в writer, а warn попадут.
    #[test]
    #[serial]
    fn test_envfilter_integration_filters_levels() {
        env::remove_var("RUST_LOG");
        let cfg = LoggingConfig {
            level: "warn".into(),
            ..LoggingConfig::default()
        };
        let filter = build_filter_from_config(&cfg).expect("failed to build env filter");

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = VecMakeWriter(buffer.clone());
        let layer = fmt::layer().with_writer(writer).with_filter(filter);
        let subscriber = Registry::default().with(layer);
        let _guard = tracing::subscriber::set_default(subscriber);

        tracing::info!("this is an info message that should be filtered out");
        tracing::warn!("this is a warn message that should pass through");

        let out = buffer.lock().unwrap();
        let s = String::from_utf8_lossy(&out);
        assert!(s.contains("this is a warn message that should pass through"));
        assert!(!s.contains("this is an info message that should be filtered out"));
    }
}
