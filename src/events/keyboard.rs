use serde::{Deserialize, Serialize};
use std::fmt;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

impl KeyState {
    /// Перевод значения evdev события (0/1/2)
    pub fn from_evdev_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }

    /// Нажатие или удержание
    pub fn is_down(&self) -> bool {
        matches!(self, KeyState::Pressed | KeyState::Repeat)
    }
}

/// Код клавиши (evdev коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::services::keycode_map::KeycodeMap::get_key_name(self.0) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "KEY_{}", self.0),
        }
    }
}

/// Нормализованное событие клавиатуры
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
    pub timestamp: std::time::Instant,
}

impl KeyEvent {
    pub fn new(key_code: KeyCode, state: KeyState) -> Self {
        Self {
            key_code,
            state,
            timestamp: std::time::Instant::now(),
        }
    }

    pub fn press(key_code: KeyCode) -> Self {
        Self::new(key_code, KeyState::Pressed)
    }

    pub fn release(key_code: KeyCode) -> Self {
        Self::new(key_code, KeyState::Released)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} ({}мс)",
            self.key_code,
            self.state,
            self.timestamp.elapsed().as_millis()
        )
    }
}
