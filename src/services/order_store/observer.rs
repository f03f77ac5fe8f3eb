use crate::events::{OrderSummary, SwitcherEvent};
use tokio::sync::broadcast;
use tracing::trace;

use super::entry::WindowEntry;

/// Подписчик на изменения порядка (обычно графическая оболочка)
pub trait OrderObserver: Send + Sync {
    fn order_changed(&self, summary: &OrderSummary, entries: &[WindowEntry]);

    /// Восстановление пропущено: текущий порядок уже исходный
    fn restore_skipped(&self) {}
}

/// Пересылает изменения порядка в общий broadcast канал событий
pub struct BroadcastObserver {
    sender: broadcast::Sender<SwitcherEvent>,
}

impl BroadcastObserver {
    pub fn new(sender: broadcast::Sender<SwitcherEvent>) -> Self {
        Self { sender }
    }

    fn publish(&self, event: SwitcherEvent) {
        // Ошибка означает лишь отсутствие подписчиков
        if self.sender.send(event).is_err() {
            trace!("Нет подписчиков на события порядка");
        }
    }
}

impl OrderObserver for BroadcastObserver {
    fn order_changed(&self, summary: &OrderSummary, _entries: &[WindowEntry]) {
        self.publish(SwitcherEvent::OrderChanged(summary.clone()));
    }

    fn restore_skipped(&self) {
        self.publish(SwitcherEvent::RestoreSkipped);
    }
}
