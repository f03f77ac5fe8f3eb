use serde::{Deserialize, Serialize};
use std::fmt;

/// Текстовое представление текущего и исходного порядка
///
/// Каждая половина: номера окон через запятую (`"2, 1, 3"`),
/// либо `"-1"`, если список пуст.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub current: String,
    pub default: String,
}

impl OrderSummary {
    pub const EMPTY: &'static str = "-1";

    pub fn format_numbers(numbers: &[u32]) -> String {
        if numbers.is_empty() {
            return Self::EMPTY.to_string();
        }
        numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for OrderSummary {
    fn default() -> Self {
        Self {
            current: Self::EMPTY.to_string(),
            default: Self::EMPTY.to_string(),
        }
    }
}

impl fmt::Display for OrderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "текущий [{}], исходный [{}]", self.current, self.default)
    }
}

/// Исходящие события для графической оболочки
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitcherEvent {
    OrderChanged(OrderSummary),
    RestoreSkipped,
    ListenerStateChanged(bool),
    ConfigWriteFailed {
        section: String,
        key: String,
        message: String,
    },
}

impl fmt::Display for SwitcherEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitcherEvent::OrderChanged(summary) => write!(f, "порядок изменён: {}", summary),
            SwitcherEvent::RestoreSkipped => write!(f, "порядок уже совпадает с исходным"),
            SwitcherEvent::ListenerStateChanged(active) => {
                write!(f, "слушатель сочетаний {}", if *active { "включён" } else { "выключен" })
            }
            SwitcherEvent::ConfigWriteFailed { section, key, message } => {
                write!(f, "не удалось сохранить [{}] {}: {}", section, key, message)
            }
        }
    }
}
