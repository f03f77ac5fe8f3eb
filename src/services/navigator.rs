//! Navigation Controller: переход к следующему/предыдущему окну текущего порядка.

use crate::config::NavigationConfig;
use crate::debug_if_enabled;
use crate::events::WindowId;
use crate::services::class_filter::ClassFilter;
use crate::services::order_store::{DeleteMode, OrderStore, WindowEntry};
use crate::services::window_system::WindowSystem;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Activated(WindowId),
    /// Следующая строка является клоном того же окна: сдвинут только курсор
    AdvancedOnClone(WindowId),
    /// В порядке одно окно, и оно уже активно
    NothingToCycle,
    EmptyOrder,
    ActiveWindowUnavailable,
    ActivationFailed(WindowId),
}

impl fmt::Display for NavigationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationOutcome::Activated(id) => write!(f, "активировано окно {}", id),
            NavigationOutcome::AdvancedOnClone(id) => write!(f, "курсор сдвинут на клон окна {}", id),
            NavigationOutcome::NothingToCycle => write!(f, "переключаться не на что"),
            NavigationOutcome::EmptyOrder => write!(f, "порядок пуст"),
            NavigationOutcome::ActiveWindowUnavailable => write!(f, "активное окно не определено"),
            NavigationOutcome::ActivationFailed(id) => write!(f, "окно {} не активировалось", id),
        }
    }
}

pub struct Navigator {
    cursor: usize,
    max_retries: u32,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl Navigator {
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            cursor: 0,
            max_retries: config.max_retries.max(1),
            poll_attempts: config.activation_poll_attempts.max(1),
            poll_interval: Duration::from_millis(config.activation_poll_interval_ms),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Перейти к следующему окну (или предыдущему при `backwards`).
    ///
    /// Ошибки оконной системы не выходят наружу: они считаются попытками и
    /// отражаются в итоговом [`NavigationOutcome`].
    pub async fn move_next(
        &mut self,
        store: &mut OrderStore,
        windows: &dyn WindowSystem,
        filter: &ClassFilter,
        backwards: bool,
    ) -> NavigationOutcome {
        let mut failures = 0u32;

        let outcome = loop {
            let active = match windows.active_window().await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    failures += 1;
                    warn!("Активное окно не определено (попытка {}/{})", failures, self.max_retries);
                    if failures >= self.max_retries {
                        break NavigationOutcome::ActiveWindowUnavailable;
                    }
                    continue;
                }
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Ошибка запроса активного окна (попытка {}/{}): {}",
                        failures, self.max_retries, e
                    );
                    if failures >= self.max_retries {
                        break NavigationOutcome::ActiveWindowUnavailable;
                    }
                    continue;
                }
            };

            let order = store.current_order();
            if order.is_empty() {
                break NavigationOutcome::EmptyOrder;
            }
            if order.len() == 1 && order[0].id == active {
                break NavigationOutcome::NothingToCycle;
            }

            self.sync_cursor(&order, active);
            let next = Self::step(self.cursor, order.len(), backwards);
            let target = &order[next];

            if order[self.cursor].id == target.id && target.is_cloned {
                self.cursor = next;
                break NavigationOutcome::AdvancedOnClone(target.id);
            }

            let eligible = match windows.list_active_windows().await {
                Ok(snapshot) => snapshot.iter().any(|w| w.id == target.id && filter.accepts(w)),
                Err(e) => {
                    failures += 1;
                    warn!("Ошибка получения списка окон: {}", e);
                    if failures >= self.max_retries {
                        break NavigationOutcome::ActiveWindowUnavailable;
                    }
                    continue;
                }
            };

            if !eligible {
                info!("Окно {} больше недоступно, убираем из порядка", target);
                if let Err(e) = store.delete_entry(target.position, DeleteMode::Soft) {
                    warn!("Не удалось пометить окно закрытым: {}", e);
                    break NavigationOutcome::ActivationFailed(target.id);
                }
                continue;
            }

            debug_if_enabled!("Следующее окно: {}", target);
            if self.activate(windows, target.id).await {
                self.cursor = next;
                break NavigationOutcome::Activated(target.id);
            }
            break NavigationOutcome::ActivationFailed(target.id);
        };

        info!("Навигация: {}", outcome);
        outcome
    }

    /// Курсор следует за окном, которое реально активно
    fn sync_cursor(&mut self, order: &[WindowEntry], active: WindowId) {
        if order.get(self.cursor).is_some_and(|e| e.id == active) {
            return;
        }
        match order.iter().position(|e| e.id == active) {
            Some(index) => self.cursor = index,
            None => self.cursor = self.cursor.min(order.len() - 1),
        }
    }

    fn step(cursor: usize, len: usize, backwards: bool) -> usize {
        if backwards {
            (cursor + len - 1) % len
        } else {
            (cursor + 1) % len
        }
    }

    async fn activate(&self, windows: &dyn WindowSystem, id: WindowId) -> bool {
        match windows.activate_window(id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Оконный менеджер отказал в активации окна {}", id);
                return false;
            }
            Err(e) => {
                warn!("Ошибка активации окна {}: {}", id, e);
                return false;
            }
        }

        for _ in 0..self.poll_attempts {
            if let Ok(true) = windows.is_window_active(id).await {
                return true;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        warn!("Окно {} не стало активным за отведённое время", id);
        false
    }
}
