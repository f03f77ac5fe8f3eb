use std::collections::HashMap;
use once_cell::sync::Lazy;

use crate::events::KeyCode;

/// Маппинг между именами клавиш в сочетаниях и кодами evdev
pub struct KeycodeMap;

// Имена, которые понимает конфигурация сочетаний. Порядок важен только
// для обратного поиска: первое имя для кода считается основным.
static KEY_TABLE: &[(&str, u16)] = &[
    // Модификаторы
    ("ctrl", 29),
    ("alt", 56),
    ("shift", 42),
    ("super", 125),
    ("rightctrl", 97),
    ("rightalt", 100),
    ("rightshift", 54),
    ("rightsuper", 126),
    // Стрелки
    ("up", 103),
    ("down", 108),
    ("left", 105),
    ("right", 106),
    // Специальные клавиши
    ("tab", 15),
    ("space", 57),
    ("enter", 28),
    ("escape", 1),
    ("backspace", 14),
    ("grave", 41),
    ("minus", 12),
    ("equal", 13),
    ("comma", 51),
    ("dot", 52),
    ("slash", 53),
    // Навигация
    ("insert", 110),
    ("delete", 111),
    ("home", 102),
    ("end", 107),
    ("pageup", 104),
    ("pagedown", 109),
    // Буквы
    ("a", 30), ("b", 48), ("c", 46), ("d", 32), ("e", 18), ("f", 33),
    ("g", 34), ("h", 35), ("i", 23), ("j", 36), ("k", 37), ("l", 38),
    ("m", 50), ("n", 49), ("o", 24), ("p", 25), ("q", 16), ("r", 19),
    ("s", 31), ("t", 20), ("u", 22), ("v", 47), ("w", 17), ("x", 45),
    ("y", 21), ("z", 44),
    // Цифры верхнего ряда
    ("1", 2), ("2", 3), ("3", 4), ("4", 5), ("5", 6),
    ("6", 7), ("7", 8), ("8", 9), ("9", 10), ("0", 11),
    // Функциональные
    ("f1", 59), ("f2", 60), ("f3", 61), ("f4", 62), ("f5", 63), ("f6", 64),
    ("f7", 65), ("f8", 66), ("f9", 67), ("f10", 68), ("f11", 87), ("f12", 88),
];

// Синонимы, которые принимаются при разборе, но не выводятся
static KEY_ALIASES: &[(&str, &str)] = &[
    ("control", "ctrl"),
    ("leftctrl", "ctrl"),
    ("leftalt", "alt"),
    ("leftshift", "shift"),
    ("meta", "super"),
    ("win", "super"),
    ("esc", "escape"),
    ("return", "enter"),
];

static KEY_NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> =
    Lazy::new(|| KEY_TABLE.iter().copied().collect());

static CODE_TO_KEY_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(KEY_TABLE.len());
    for &(name, code) in KEY_TABLE {
        map.entry(code).or_insert(name);
    }
    map
});

impl KeycodeMap {
    /// Получить код клавиши по её имени (регистр не важен)
    pub fn get_keycode(key_name: &str) -> Option<u16> {
        let normalized = key_name.trim().to_lowercase();
        let name = KEY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, name)| *name)
            .unwrap_or(normalized.as_str());
        KEY_NAME_TO_CODE.get(name).copied()
    }

    /// Получить имя клавиши по её коду
    pub fn get_key_name(keycode: u16) -> Option<&'static str> {
        CODE_TO_KEY_NAME.get(&keycode).copied()
    }

    pub fn key(key_name: &str) -> Option<KeyCode> {
        Self::get_keycode(key_name).map(KeyCode::new)
    }

    /// Правые модификаторы сворачиваются в левые: "ctrl" в сочетании
    /// срабатывает от любого Ctrl
    pub fn canonical(code: KeyCode) -> KeyCode {
        match code.value() {
            97 => KeyCode::new(29),
            100 => KeyCode::new(56),
            54 => KeyCode::new(42),
            126 => KeyCode::new(125),
            _ => code,
        }
    }
}
