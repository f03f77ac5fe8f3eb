use crate::events::{WindowId, WindowInfo};
use crate::services::class_filter::normalize_class;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Префикс класса у окна, которое закрылось во время навигации
pub const CLOSED_MARKER: &str = "(closed) ";

/// Строка таблицы порядка окон
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub id: WindowId,
    pub class: String,
    pub title: String,
    pub desktop: i32,
    pub desktop_name: String,
    /// Место в таблице, с 1
    pub position: usize,
    /// Стабильная метка окна в текстовых сводках порядка
    pub number: u32,
    pub is_excluded: bool,
    pub is_cloned: bool,
    pub is_deleted: bool,
}

impl WindowEntry {
    pub fn from_window(window: &WindowInfo, number: u32) -> Self {
        Self {
            id: window.id,
            class: normalize_class(&window.class),
            title: window.title.clone(),
            desktop: window.desktop,
            desktop_name: window.desktop_name.clone(),
            position: 0,
            number,
            is_excluded: false,
            is_cloned: false,
            is_deleted: false,
        }
    }

    /// Участвует в цикле переключения
    pub fn is_included(&self) -> bool {
        !self.is_excluded && !self.is_deleted
    }

    /// Входит в исходный порядок
    pub fn is_default_member(&self) -> bool {
        !self.is_cloned && !self.is_deleted
    }

    /// Группа при упорядочивании таблицы: включённые, исключённые, удалённые
    pub(crate) fn group(&self) -> u8 {
        if self.is_deleted {
            2
        } else if self.is_excluded {
            1
        } else {
            0
        }
    }

    pub(crate) fn mark_closed(&mut self) {
        self.is_deleted = true;
        self.is_excluded = true;
        if !self.class.starts_with(CLOSED_MARKER) {
            self.class = format!("{}{}", CLOSED_MARKER, self.class);
        }
    }
}

impl fmt::Display for WindowEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{}] {} ({})", self.position, self.number, self.id, self.class)?;
        if self.is_cloned {
            write!(f, " клон")?;
        }
        if self.is_excluded {
            write!(f, " исключено")?;
        }
        Ok(())
    }
}

/// Способ удаления строки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Строка убирается из таблицы, номера выше сдвигаются
    Hard,
    /// Окно помечается закрытым и остаётся на месте до очистки
    Soft,
}

/// Источник для пересчёта сводки порядка
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSource {
    Table,
    /// Готовая таблица, заменяющая текущую
    Payload(Vec<WindowEntry>),
}
