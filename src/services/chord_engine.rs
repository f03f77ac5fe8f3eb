//! Hotkey Chord Engine: набор удерживаемых клавиш и сопоставление с
//! настроенными сочетаниями.
//!
//! Движок не знает, что делают сочетания: при совпадении он возвращает
//! действие `A`, а выполняет его владелец.

use crate::error::{Result, SwitcherError};
use crate::events::{KeyCode, KeyEvent, KeyState};
use crate::services::keycode_map::KeycodeMap;
use crate::{debug_if_enabled, trace_if_enabled};
use smallvec::SmallVec;
use std::fmt;
use tracing::warn;

/// Максимум клавиш в одном сочетании
pub const MAX_CHORD_KEYS: usize = 3;

const DISABLED_SUFFIX: &str = "disabled";

pub type ChordKeys = SmallVec<[KeyCode; MAX_CHORD_KEYS]>;

/// Действия, которые можно повесить на сочетание
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    MoveForwards,
    MoveBackwards,
}

impl HotkeyAction {
    pub const ALL: [HotkeyAction; 2] = [HotkeyAction::MoveForwards, HotkeyAction::MoveBackwards];

    /// Имя ключа в секции `[hotkeys]`
    pub fn config_key(&self) -> &'static str {
        match self {
            HotkeyAction::MoveForwards => "move_forwards",
            HotkeyAction::MoveBackwards => "move_backwards",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.config_key() == key)
    }

    pub fn is_backwards(&self) -> bool {
        matches!(self, HotkeyAction::MoveBackwards)
    }
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord<A> {
    pub name: String,
    pub keys: ChordKeys,
    pub disabled: bool,
    pub action: A,
}

impl<A> Chord<A> {
    pub fn new(name: impl Into<String>, keys: ChordKeys, action: A) -> Self {
        Self {
            name: name.into(),
            keys,
            disabled: false,
            action,
        }
    }

    /// Разбор строки конфигурации `"ctrl,alt,tab[:disabled]"`
    pub fn parse(name: impl Into<String>, value: &str, action: A) -> Self {
        let name = name.into();
        let (keys, disabled) = parse_chord(&name, value);
        Self {
            name,
            keys,
            disabled,
            action,
        }
    }

    pub fn encode(&self) -> String {
        let mut value = format_keys(&self.keys, ",");
        if self.disabled {
            value.push(':');
            value.push_str(DISABLED_SUFFIX);
        }
        value
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled && !self.keys.is_empty()
    }

    pub fn has_keys(&self, keys: &[KeyCode]) -> bool {
        same_key_set(&self.keys, keys)
    }

    fn matches(&self, held: &[KeyCode]) -> bool {
        self.is_enabled() && self.keys.iter().all(|key| held.contains(key))
    }
}

impl<A> fmt::Display for Chord<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keys.is_empty() {
            write!(f, "{}: ---", self.name)
        } else {
            write!(f, "{}: {}", self.name, format_keys(&self.keys, " + "))
        }
    }
}

/// Разбор списка клавиш. Неизвестные имена и повторы отбрасываются,
/// лишние клавиши сверх лимита тоже.
pub fn parse_chord(name: &str, value: &str) -> (ChordKeys, bool) {
    let value = value.trim();
    let (keys_part, disabled) = match value.split_once(':') {
        Some((keys, flag)) => (keys, flag.trim().eq_ignore_ascii_case(DISABLED_SUFFIX)),
        None => (value, false),
    };

    let mut keys = ChordKeys::new();
    for token in keys_part.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let Some(key) = KeycodeMap::key(token).map(KeycodeMap::canonical) else {
            warn!("Сочетание \"{}\": неизвестная клавиша \"{}\" пропущена", name, token);
            continue;
        };
        if keys.contains(&key) {
            continue;
        }
        if keys.len() == MAX_CHORD_KEYS {
            warn!(
                "Сочетание \"{}\": больше {} клавиш, \"{}\" пропущена",
                name, MAX_CHORD_KEYS, token
            );
            continue;
        }
        keys.push(key);
    }

    (keys, disabled)
}

/// Привести клавиши к виду, в котором их присылает слушатель: правые
/// модификаторы становятся левыми, повторы убираются
pub fn canonical_keys(keys: &[KeyCode]) -> ChordKeys {
    let mut out = ChordKeys::new();
    for key in keys.iter().copied().map(KeycodeMap::canonical) {
        if !out.contains(&key) {
            out.push(key);
        }
    }
    out
}

/// Проверка нового набора клавиш для сочетания `name` перед сохранением
pub fn check_assignment<A>(chords: &[Chord<A>], name: &str, keys: &[KeyCode]) -> Result<()> {
    if keys.len() > MAX_CHORD_KEYS {
        return Err(SwitcherError::InvalidChord(format!(
            "не больше {} клавиш",
            MAX_CHORD_KEYS
        )));
    }

    let target = chords
        .iter()
        .find(|chord| chord.name == name)
        .ok_or_else(|| SwitcherError::InvalidChord(format!("нет сочетания \"{}\"", name)))?;

    if target.has_keys(keys) {
        return Err(SwitcherError::ChordUnchanged(name.to_string()));
    }

    // пустой набор означает "снять сочетание" и не конфликтует
    if keys.is_empty() {
        return Ok(());
    }

    if let Some(other) = chords.iter().find(|c| c.name != name && c.has_keys(keys)) {
        return Err(SwitcherError::DuplicateChord {
            other: other.name.clone(),
        });
    }

    Ok(())
}

fn same_key_set(a: &[KeyCode], b: &[KeyCode]) -> bool {
    a.len() == b.len() && a.iter().all(|key| b.contains(key))
}

fn format_keys(keys: &[KeyCode], separator: &str) -> String {
    keys.iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Состояние сопоставления сочетаний
#[derive(Debug)]
pub struct ChordEngine<A> {
    chords: Vec<Chord<A>>,
    held: SmallVec<[KeyCode; 8]>,
    last_pressed: Option<KeyCode>,
    active: bool,
}

impl<A> Default for ChordEngine<A> {
    fn default() -> Self {
        Self {
            chords: Vec::new(),
            held: SmallVec::new(),
            last_pressed: None,
            active: false,
        }
    }
}

impl<A: Clone> ChordEngine<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn chords(&self) -> &[Chord<A>] {
        &self.chords
    }

    pub fn held_keys(&self) -> &[KeyCode] {
        &self.held
    }

    /// Включить сопоставление с переданным набором сочетаний
    pub fn activate(&mut self, chords: Vec<Chord<A>>) {
        self.chords = chords;
        self.clear_held();
        self.active = true;
        debug_if_enabled!(
            "Движок сочетаний активирован, включено сочетаний: {}",
            self.chords.iter().filter(|c| c.is_enabled()).count()
        );
    }

    pub fn deactivate(&mut self) {
        self.clear_held();
        self.active = false;
        debug_if_enabled!("Движок сочетаний деактивирован");
    }

    pub fn handle_event(&mut self, event: &KeyEvent) -> Option<A> {
        match event.state {
            KeyState::Pressed | KeyState::Repeat => self.key_down(event.key_code),
            KeyState::Released => {
                self.key_up(event.key_code);
                None
            }
        }
    }

    /// Нажатие или удержание. Возвращает действие первого совпавшего сочетания.
    pub fn key_down(&mut self, key: KeyCode) -> Option<A> {
        if !self.active {
            return None;
        }
        // нажатие и удержание одной клавиши приходят парой
        if self.last_pressed == Some(key) {
            return None;
        }
        self.last_pressed = Some(key);
        if !self.held.contains(&key) {
            self.held.push(key);
        }

        trace_if_enabled!("Удерживаются клавиши: {:?}", self.held);

        let chord = self.chords.iter().find(|chord| chord.matches(&self.held))?;
        debug_if_enabled!("Сработало сочетание {}", chord);
        Some(chord.action.clone())
    }

    pub fn key_up(&mut self, key: KeyCode) {
        if !self.active {
            return;
        }
        self.held.retain(|held| *held != key);
        self.last_pressed = None;
    }

    fn clear_held(&mut self) {
        self.held.clear();
        self.last_pressed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> KeyCode {
        KeycodeMap::key(name).unwrap()
    }

    fn keys(names: &[&str]) -> ChordKeys {
        names.iter().map(|name| key(name)).collect()
    }

    fn default_chords() -> Vec<Chord<HotkeyAction>> {
        vec![
            Chord::new("move_forwards", keys(&["ctrl", "alt", "tab"]), HotkeyAction::MoveForwards),
            Chord::new("move_backwards", keys(&["ctrl", "alt", "grave"]), HotkeyAction::MoveBackwards),
        ]
    }

    fn active_engine() -> ChordEngine<HotkeyAction> {
        let mut engine = ChordEngine::new();
        engine.activate(default_chords());
        engine
    }

    #[test]
    fn test_chord_fires_once_when_complete() {
        let mut engine = active_engine();

        assert_eq!(engine.key_down(key("ctrl")), None);
        assert_eq!(engine.key_down(key("alt")), None);
        assert_eq!(engine.key_down(key("tab")), Some(HotkeyAction::MoveForwards));
        // удержание Tab не срабатывает повторно
        assert_eq!(engine.key_down(key("tab")), None);
        assert_eq!(
            engine.handle_event(&KeyEvent::new(key("tab"), KeyState::Repeat)),
            None
        );
    }

    #[test]
    fn test_repress_after_release_fires_again() {
        let mut engine = active_engine();
        engine.key_down(key("ctrl"));
        engine.key_down(key("alt"));
        assert!(engine.key_down(key("tab")).is_some());

        engine.key_up(key("tab"));
        assert_eq!(engine.held_keys(), &[key("ctrl"), key("alt")]);
        assert_eq!(engine.key_down(key("tab")), Some(HotkeyAction::MoveForwards));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let mut engine = active_engine();
        engine.key_down(key("grave"));
        engine.key_down(key("alt"));
        assert_eq!(engine.key_down(key("ctrl")), Some(HotkeyAction::MoveBackwards));
    }

    #[test]
    fn test_inactive_engine_ignores_keys() {
        let mut engine: ChordEngine<HotkeyAction> = ChordEngine::new();
        assert_eq!(engine.key_down(key("ctrl")), None);
        assert!(engine.held_keys().is_empty());

        let mut engine = active_engine();
        engine.key_down(key("ctrl"));
        engine.key_down(key("alt"));
        engine.deactivate();
        assert!(engine.held_keys().is_empty());
        assert_eq!(engine.key_down(key("tab")), None);
    }

    #[test]
    fn test_activation_clears_held_keys() {
        let mut engine = active_engine();
        engine.key_down(key("ctrl"));
        engine.activate(default_chords());
        assert!(engine.held_keys().is_empty());
    }

    #[test]
    fn test_disabled_and_empty_chords_never_fire() {
        let mut chords = default_chords();
        chords[0].disabled = true;
        chords.push(Chord::new("empty", ChordKeys::new(), HotkeyAction::MoveBackwards));

        let mut engine = ChordEngine::new();
        engine.activate(chords);
        engine.key_down(key("ctrl"));
        engine.key_down(key("alt"));
        assert_eq!(engine.key_down(key("tab")), None);
    }

    #[test]
    fn test_first_match_wins() {
        let mut engine = ChordEngine::new();
        engine.activate(vec![
            Chord::new("a", keys(&["ctrl", "tab"]), 1),
            Chord::new("b", keys(&["tab"]), 2),
        ]);
        engine.key_down(key("ctrl"));
        assert_eq!(engine.key_down(key("tab")), Some(1));
    }

    #[test]
    fn test_parse_chord_string() {
        let chord = Chord::parse("move_forwards", "ctrl, alt,tab", HotkeyAction::MoveForwards);
        assert_eq!(chord.keys, keys(&["ctrl", "alt", "tab"]));
        assert!(!chord.disabled);
        assert_eq!(chord.encode(), "ctrl,alt,tab");

        let chord = Chord::parse("x", "ctrl,alt,left:disabled", HotkeyAction::MoveBackwards);
        assert!(chord.disabled);
        assert_eq!(chord.encode(), "ctrl,alt,left:disabled");
    }

    #[test]
    fn test_parse_drops_bad_tokens() {
        let (parsed, _) = parse_chord("x", "ctrl,hyper,ctrl,alt,tab,space");
        assert_eq!(parsed, keys(&["ctrl", "alt", "tab"]));

        let (parsed, disabled) = parse_chord("x", "");
        assert!(parsed.is_empty());
        assert!(!disabled);
    }

    #[test]
    fn test_right_modifiers_in_chord_match_listener_events() {
        use crate::services::keyboard_listener::translate_event;
        use evdev::EventType;

        let chord = Chord::parse("move_forwards", "rightctrl,tab", HotkeyAction::MoveForwards);
        assert_eq!(chord.keys, keys(&["ctrl", "tab"]));
        assert_eq!(chord.encode(), "ctrl,tab");

        let mut engine = ChordEngine::new();
        engine.activate(vec![chord]);
        let right_ctrl = translate_event(EventType::KEY, 97, 1).unwrap();
        let tab = translate_event(EventType::KEY, 15, 1).unwrap();
        assert_eq!(engine.handle_event(&right_ctrl), None);
        assert_eq!(engine.handle_event(&tab), Some(HotkeyAction::MoveForwards));

        assert_eq!(canonical_keys(&keys(&["rightalt", "alt", "left"])), keys(&["alt", "left"]));
        let chords = default_chords();
        assert!(matches!(
            check_assignment(&chords, "move_backwards", &canonical_keys(&keys(&["rightctrl", "alt", "tab"]))),
            Err(SwitcherError::DuplicateChord { ref other }) if other == "move_forwards"
        ));
    }

    #[test]
    fn test_check_assignment() {
        let chords = default_chords();

        assert!(matches!(
            check_assignment(&chords, "move_forwards", &keys(&["tab", "alt", "ctrl"])),
            Err(SwitcherError::ChordUnchanged(_))
        ));
        assert!(matches!(
            check_assignment(&chords, "move_forwards", &keys(&["ctrl", "alt", "grave"])),
            Err(SwitcherError::DuplicateChord { ref other }) if other == "move_backwards"
        ));
        assert!(check_assignment(&chords, "move_forwards", &keys(&["super", "tab"])).is_ok());
        assert!(check_assignment(&chords, "move_forwards", &[]).is_ok());
        assert!(matches!(
            check_assignment(&chords, "missing", &keys(&["tab"])),
            Err(SwitcherError::InvalidChord(_))
        ));
    }

    #[test]
    fn test_action_config_keys() {
        assert_eq!(HotkeyAction::from_config_key("move_backwards"), Some(HotkeyAction::MoveBackwards));
        assert_eq!(HotkeyAction::from_config_key("jump"), None);
        assert!(HotkeyAction::MoveBackwards.is_backwards());
    }
}
