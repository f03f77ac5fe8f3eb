use crate::error::Result;
use crate::events::{WindowId, WindowInfo};
use crate::switcher_error;
use tracing::{debug, warn};

use super::r#trait::WindowSystem;
use super::wmctrl::WmctrlClient;
use super::xdotool::XdotoolClient;

/// Оконная система X11 поверх wmctrl (список, активация) и xdotool
/// (активное окно, заголовки)
pub struct X11WindowSystem {
    wmctrl: WmctrlClient,
    xdotool: XdotoolClient,
}

impl X11WindowSystem {
    pub fn new() -> Result<Self> {
        if std::env::var_os("DISPLAY").is_none() {
            return Err(switcher_error!(
                service_unavailable,
                "переменная DISPLAY не задана, нужен сеанс X11"
            ));
        }

        Ok(Self {
            wmctrl: WmctrlClient::new(),
            xdotool: XdotoolClient::new(),
        })
    }

    /// Проверить, что обе утилиты установлены и отвечают
    pub fn probe(&self) -> Result<()> {
        self.wmctrl.test()?;
        self.xdotool.test()?;
        debug!("wmctrl и xdotool доступны");
        Ok(())
    }
}

#[async_trait::async_trait]
impl WindowSystem for X11WindowSystem {
    async fn list_active_windows(&self) -> Result<Vec<WindowInfo>> {
        self.wmctrl.list_windows()
    }

    async fn active_window(&self) -> Result<Option<WindowId>> {
        self.xdotool.get_active_window()
    }

    async fn activate_window(&self, id: WindowId) -> Result<bool> {
        self.wmctrl.activate(id)
    }

    async fn set_window_title(&self, id: WindowId, title: &str) -> Result<bool> {
        match self.xdotool.set_window_name(id, title) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!("Не удалось сменить заголовок окна {}: {}", id, e);
                Ok(false)
            }
        }
    }
}
