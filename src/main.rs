use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use win_switcher::config::{Config, ConfigStore};
use win_switcher::events::SwitcherEvent;
use win_switcher::services::{create_keyboard_listener, create_window_system, Switcher, SwitcherHandle};
use win_switcher::utils;

#[derive(Parser, Debug)]
#[command(name = "win-switcher")]
#[command(about = "Переключение между окнами X11 по сочетаниям клавиш в заданном порядке")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "win-switcher.toml")]
    config: String,

    /// Режим сухого запуска (эмуляция окон и клавиатуры)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает logging.filter)
    #[arg(long)]
    log_level: Option<String>,

    /// Не включать сочетания при старте
    #[arg(long)]
    no_listener: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Arc::new(Config::load(&args.config)?);

    let level = args.log_level.as_deref().unwrap_or(config.logging.directive());
    init_tracing(level, &config.logging.format)?;

    info!("Запуск win-switcher v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - окна и клавиатура эмулируются");
    } else {
        utils::permissions::check_permissions()?;
    }

    let windows = create_window_system(&config, args.dry_run)?;
    let config_store = ConfigStore::open(&args.config)?;
    let (switcher, handle) = Switcher::new(&config, config_store, windows, !args.no_listener);
    let keyboard_listener = create_keyboard_listener(config.clone(), handle.clone(), args.dry_run)?;

    info!("Все компоненты инициализированы");

    let event_handle = tokio::spawn(log_events(handle.clone()));
    let switcher_handle = tokio::spawn(async move {
        if let Err(e) = switcher.run().await {
            error!("Ошибка в Switcher: {}", e);
        }
    });
    let keyboard_handle = tokio::spawn(async move {
        if let Err(e) = keyboard_listener.run().await {
            error!("Ошибка в KeyboardListener: {}", e);
        }
    });
    let refresh_handle = tokio::spawn(refresh_periodically(
        handle.clone(),
        Duration::from_millis(config.window.refresh_interval_ms),
    ));

    info!("Все сервисы запущены");

    match signal::ctrl_c().await {
        Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
        Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
    }

    info!("Завершение работы...");

    if let Err(e) = handle.shutdown().await {
        warn!("Switcher уже остановлен: {}", e);
    }

    refresh_handle.abort();
    keyboard_handle.abort();
    event_handle.abort();

    let shutdown_timeout = Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = switcher_handle.await;
        let _ = refresh_handle.await;
        let _ = event_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("win-switcher завершил работу");
    Ok(())
}

/// Фоновое перечитывание окон, чтобы порядок следил за открытием и закрытием
async fn refresh_periodically(handle: SwitcherHandle, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if handle.request_auto_refresh().await.is_err() {
            debug!("Switcher остановлен, фоновое обновление завершено");
            return;
        }
    }
}

async fn log_events(handle: SwitcherHandle) {
    let mut events = handle.subscribe();
    loop {
        match events.recv().await {
            Ok(SwitcherEvent::ConfigWriteFailed { section, key, message }) => {
                error!("Настройка [{}] {} не сохранена: {}", section, key, message);
            }
            Ok(event) => debug!("Событие: {}", event),
            Err(RecvError::Lagged(skipped)) => warn!("Пропущено событий: {}", skipped),
            Err(RecvError::Closed) => return,
        }
    }
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let fmt_layer = match format {
        "compact" => fmt::layer().compact().boxed(),
        _ => fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    Ok(())
}
