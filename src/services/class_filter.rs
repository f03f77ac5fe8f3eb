//! Class Filter: отбор окон по предпочитаемым и исключённым классам.
//!
//! Классы сравниваются как подстроки сырого WM_CLASS (`instance.Class`),
//! с учётом регистра. Пустой список предпочитаемых пропускает всё,
//! исключения действуют всегда.

use crate::events::WindowInfo;

/// Класс самого приложения: его окна никогда не попадают в цикл
pub const SELF_CLASS: &str = "win-switcher";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFilter {
    preferred: Vec<String>,
    excluded: Vec<String>,
    skip_sticky: bool,
    skip_self: bool,
}

impl ClassFilter {
    pub fn new(preferred: Vec<String>, excluded: Vec<String>) -> Self {
        Self {
            preferred: clean_list(preferred),
            excluded: clean_list(excluded),
            skip_sticky: false,
            skip_self: false,
        }
    }

    /// Пропускать окна на всех рабочих столах (desktop -1) и окна самого приложения
    pub fn with_skip_rules(mut self, skip_sticky: bool) -> Self {
        self.skip_sticky = skip_sticky;
        self.skip_self = true;
        self
    }

    pub fn preferred(&self) -> &[String] {
        &self.preferred
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn set_preferred(&mut self, preferred: Vec<String>) {
        self.preferred = clean_list(preferred);
    }

    pub fn set_excluded(&mut self, excluded: Vec<String>) {
        self.excluded = clean_list(excluded);
    }

    /// Окно вообще может появиться в списках (до правил классов)
    pub fn is_listable(&self, window: &WindowInfo) -> bool {
        if self.skip_sticky && window.is_sticky() {
            return false;
        }
        if self.skip_self && window.class.contains(SELF_CLASS) {
            return false;
        }
        true
    }

    pub fn accepts(&self, window: &WindowInfo) -> bool {
        if !self.is_listable(window) {
            return false;
        }
        let preferred = self.preferred.is_empty()
            || self.preferred.iter().any(|class| window.class.contains(class.as_str()));
        preferred && !self.excluded.iter().any(|class| window.class.contains(class.as_str()))
    }

    /// Подходящие окна в порядке снимка
    pub fn filter(&self, snapshot: &[WindowInfo]) -> Vec<WindowInfo> {
        snapshot.iter().filter(|w| self.accepts(w)).cloned().collect()
    }

    /// Классы открытых окон, которые можно предложить для списков. Из
    /// классов, вложенных друг в друга, остаётся самый короткий
    pub fn active_classes(&self, snapshot: &[WindowInfo]) -> Vec<String> {
        let mut seen: Vec<&str> = Vec::new();
        for window in snapshot.iter().filter(|w| self.is_listable(w)) {
            let class = window.class.as_str();
            if seen.iter().any(|raw| class.contains(raw)) {
                continue;
            }
            seen.retain(|raw| !raw.contains(class));
            seen.push(class);
        }

        let mut classes: Vec<String> = seen.into_iter().map(normalize_class).collect();
        classes.sort_by_key(|class| class.to_lowercase());
        classes.dedup();
        classes
    }
}

/// `"firefox.Firefox"` -> `"Firefox"`: пара instance/class, совпадающая без
/// учёта регистра, сворачивается в половину с заглавной буквы
pub fn normalize_class(raw: &str) -> String {
    let mut value = "";
    for part in raw.split('.') {
        if !value.is_empty() && part.eq_ignore_ascii_case(value) {
            if part.chars().next().is_some_and(char::is_uppercase) {
                value = part;
            }
            return value.to_string();
        }
        value = part;
    }
    raw.to_string()
}

/// Проверка членства в списке классов: подстрока в любую сторону
pub fn list_contains(list: &[String], class: &str) -> bool {
    list.iter()
        .any(|item| item.contains(class) || class.contains(item.as_str()))
}

/// Разбор списка классов из конфигурации: `"Firefox,Code"`
pub fn parse_class_list(value: &str) -> Vec<String> {
    clean_list(value.split(',').map(str::to_string).collect())
}

pub fn format_class_list(classes: &[String]) -> String {
    classes.join(",")
}

fn clean_list(list: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(list.len());
    for item in list {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|c| c == item) {
            out.push(item.to_string());
        }
    }
    out
}
