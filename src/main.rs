//! CLI dotbus
//!
//! Демонстрация диспетчера: регистрирует печатающих (и, по желанию,
//! падающих) подписчиков, публикует темы с JSON-данными и печатает
//! поднятые сбои и статистику.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use dotbus::{init_logging, Dispatcher, DispatcherConfig, LogFormat, LoggingConfig};

/// Аргументы командной строки
#[derive(Parser)]
#[command(name = "dotbus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("DOTBUS_GIT_COMMIT"),
    ", built ",
    env!("DOTBUS_BUILD_TIME"),
    ")"
))]
#[command(about = "Publish messages through a hierarchical in-process dispatcher", long_about = None)]
struct Cli {
    /// Темы для публикации, по порядку
    #[arg(required = true, help = "Темы для публикации, например app.user.created")]
    topics: Vec<String>,
    /// Подписчики, печатающие доставку
    #[arg(short, long, help = "Подписать печатающего подписчика на тему")]
    subscribe: Vec<String>,
    /// Подписчики, всегда возвращающие ошибку
    #[arg(long, help = "Подписать подписчика, который всегда падает")]
    fail: Vec<String>,
    /// JSON-данные публикации
    #[arg(short, long, value_parser = parse_json, help = "Данные публикации в формате JSON")]
    data: Option<Value>,
    /// Синхронная доставка
    #[arg(long, help = "Доставлять синхронно (publish_sync)")]
    sync: bool,
    /// Немедленные ошибки
    #[arg(long, help = "Прерывать доставку на первом сбое подписчика")]
    immediate_exceptions: bool,
    /// Уровень логирования
    #[arg(long, default_value = "warn", env = "DOTBUS_LOG_LEVEL")]
    log_level: String,
    /// Формат логов
    #[arg(long, default_value = "compact", help = "compact, pretty или json")]
    log_format: LogFormat,
}

fn parse_json(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        level: cli.log_level.clone(),
        format: cli.log_format,
        ..LoggingConfig::default()
    })?;

    let mut config = DispatcherConfig::load().context("failed to load dispatcher config")?;
    if cli.immediate_exceptions {
        config.immediate_exceptions = true;
    }

    let dispatcher: Dispatcher<Value> = Dispatcher::with_config(config);
    let mut failures = dispatcher.failures();

    for level in &cli.subscribe {
        let level_name = level.clone();
        dispatcher.subscribe_fn(level, move |topic, data| {
            match data {
                Some(data) => println!("[{level_name}] {topic}: {data}"),
                None => println!("[{level_name}] {topic}"),
            }
            Ok(())
        });
    }
    for level in &cli.fail {
        let level_name = level.clone();
        dispatcher.subscribe_fn(level, move |topic, _| {
            anyhow::bail!("subscriber on '{level_name}' rejected '{topic}'")
        });
    }

    for topic in &cli.topics {
        let data = cli.data.clone();
        if cli.sync {
            match dispatcher.publish_sync(topic, data) {
                Ok(true) => {}
                Ok(false) => println!("{topic}: no subscribers"),
                Err(err) => println!("{topic}: delivery aborted: {err}"),
            }
        } else if !dispatcher.publish(topic, data) {
            println!("{topic}: no subscribers");
        }
    }

    dispatcher.flush().await;

    while let Ok(failure) = failures.try_recv() {
        println!("failure: {failure}");
    }

    let stats = dispatcher.stats();
    println!(
        "published={} unmatched={} delivered={} failed={}",
        stats.published, stats.unmatched, stats.delivered, stats.failed
    );
    Ok(())
}
