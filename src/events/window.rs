use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Идентификатор окна X11 (стабилен, пока живёт окно)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl WindowId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WindowId {
    type Err = std::num::ParseIntError;

    /// Принимает как десятичную запись (xdotool), так и `0x...` (wmctrl)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).map(WindowId),
            None => s.parse::<u64>().map(WindowId),
        }
    }
}

/// Информация об открытом окне, как её отдаёт оконная система
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub class: String,
    pub title: String,
    /// Номер рабочего стола, -1 для окон на всех столах
    pub desktop: i32,
    pub desktop_name: String,
}

impl WindowInfo {
    pub fn new(id: WindowId, class: impl Into<String>) -> Self {
        Self {
            id,
            class: class.into(),
            title: String::new(),
            desktop: 0,
            desktop_name: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_desktop(mut self, desktop: i32, desktop_name: impl Into<String>) -> Self {
        self.desktop = desktop;
        self.desktop_name = desktop_name.into();
        self
    }

    /// Окно закреплено на всех рабочих столах (панели, доки)
    pub fn is_sticky(&self) -> bool {
        self.desktop < 0
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "{} ({})", self.id, self.class)
        } else {
            write!(f, "{} \"{}\" ({})", self.id, self.title, self.class)
        }
    }
}
