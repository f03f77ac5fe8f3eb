use crate::error::Result;
use crate::events::{WindowId, WindowInfo};
use crate::switcher_error;
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::info;

use super::r#trait::WindowSystem;

#[derive(Debug, Default)]
struct DryRunState {
    windows: Vec<WindowInfo>,
    active: Option<WindowId>,
    failing_active_queries: usize,
    failing_list_queries: usize,
    refused: HashSet<WindowId>,
    activations: Vec<WindowId>,
}

/// Оконная система в памяти: для `--dry-run` и тестов
#[derive(Debug, Default)]
pub struct DryRunWindowSystem {
    state: Mutex<DryRunState>,
}

impl DryRunWindowSystem {
    pub fn new(windows: Vec<WindowInfo>) -> Self {
        let active = windows.first().map(|w| w.id);
        Self {
            state: Mutex::new(DryRunState {
                windows,
                active,
                ..DryRunState::default()
            }),
        }
    }

    pub fn with_demo_windows() -> Self {
        Self::new(vec![
            WindowInfo::new(WindowId(0x100), "xterm.XTerm")
                .with_title("Terminal - dry_run")
                .with_desktop(0, "Main"),
            WindowInfo::new(WindowId(0x200), "firefox.Firefox")
                .with_title("Browser - dry_run")
                .with_desktop(0, "Main"),
            WindowInfo::new(WindowId(0x300), "code.Code")
                .with_title("Editor - dry_run")
                .with_desktop(1, "Work"),
            WindowInfo::new(WindowId(0x400), "panel.Panel")
                .with_title("Panel - dry_run")
                .with_desktop(-1, ""),
        ])
    }

    pub fn open_window(&self, window: WindowInfo) {
        self.state.lock().windows.push(window);
    }

    /// Окно исчезает из списка; если оно было активным, активного нет
    pub fn close_window(&self, id: WindowId) {
        let mut state = self.state.lock();
        state.windows.retain(|w| w.id != id);
        if state.active == Some(id) {
            state.active = None;
        }
    }

    pub fn set_active(&self, id: Option<WindowId>) {
        self.state.lock().active = id;
    }

    /// Следующие `count` запросов активного окна завершатся ошибкой
    pub fn fail_active_queries(&self, count: usize) {
        self.state.lock().failing_active_queries = count;
    }

    pub fn fail_list_queries(&self, count: usize) {
        self.state.lock().failing_list_queries = count;
    }

    /// Менеджер будет отказывать в активации окна
    pub fn refuse_activation(&self, id: WindowId) {
        self.state.lock().refused.insert(id);
    }

    pub fn activations(&self) -> Vec<WindowId> {
        self.state.lock().activations.clone()
    }

    pub fn title_of(&self, id: WindowId) -> Option<String> {
        self.state
            .lock()
            .windows
            .iter()
            .find(|w| w.id == id)
            .map(|w| w.title.clone())
    }
}

#[async_trait::async_trait]
impl WindowSystem for DryRunWindowSystem {
    async fn list_active_windows(&self) -> Result<Vec<WindowInfo>> {
        let mut state = self.state.lock();
        if state.failing_list_queries > 0 {
            state.failing_list_queries -= 1;
            return Err(switcher_error!(window_system, "эмуляция: список окон недоступен"));
        }
        Ok(state.windows.clone())
    }

    async fn active_window(&self) -> Result<Option<WindowId>> {
        let mut state = self.state.lock();
        if state.failing_active_queries > 0 {
            state.failing_active_queries -= 1;
            return Err(switcher_error!(window_system, "эмуляция: активное окно недоступно"));
        }
        Ok(state.active)
    }

    async fn activate_window(&self, id: WindowId) -> Result<bool> {
        let mut state = self.state.lock();
        if state.refused.contains(&id) || !state.windows.iter().any(|w| w.id == id) {
            return Ok(false);
        }
        info!("Dry-run: активация окна {}", id);
        state.active = Some(id);
        state.activations.push(id);
        Ok(true)
    }

    async fn set_window_title(&self, id: WindowId, title: &str) -> Result<bool> {
        let mut state = self.state.lock();
        match state.windows.iter_mut().find(|w| w.id == id) {
            Some(window) => {
                window.title = title.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
