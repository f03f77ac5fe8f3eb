use crate::config::Config;
use crate::error::Result;
use crate::events::{WindowId, WindowInfo};
use std::sync::Arc;
use tracing::{info, warn};

use super::dry_run::DryRunWindowSystem;
use super::x11::X11WindowSystem;

/// Операции над окнами, которые нужны переключателю
#[async_trait::async_trait]
pub trait WindowSystem: Send + Sync {
    /// Все открытые окна в порядке оконного менеджера
    async fn list_active_windows(&self) -> Result<Vec<WindowInfo>>;

    /// Активное окно; `None`, если менеджер сообщает "нет окна"
    async fn active_window(&self) -> Result<Option<WindowId>>;

    /// Запросить активацию окна. `false`, если менеджер отказал.
    async fn activate_window(&self, id: WindowId) -> Result<bool>;

    async fn is_window_active(&self, id: WindowId) -> Result<bool> {
        Ok(self.active_window().await? == Some(id))
    }

    async fn set_window_title(&self, id: WindowId, title: &str) -> Result<bool>;
}

/// Выбор реализации по флагу dry_run и `window.backend`
pub fn create_window_system(config: &Config, dry_run: bool) -> Result<Arc<dyn WindowSystem>> {
    if dry_run || config.window.backend == "dry-run" {
        info!("Оконная система: эмуляция (dry-run)");
        return Ok(Arc::new(DryRunWindowSystem::with_demo_windows()));
    }

    let system = X11WindowSystem::new()?;
    if config.window.backend == "auto" {
        if let Err(e) = system.probe() {
            warn!("Утилиты X11 недоступны: {}", e);
            return Err(e);
        }
    }
    info!("Оконная система: X11 (wmctrl + xdotool)");
    Ok(Arc::new(system))
}
