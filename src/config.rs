use crate::error::SwitcherError;
use crate::services::chord_engine::{Chord, HotkeyAction};
use crate::services::class_filter::{parse_class_list, ClassFilter};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Секция классов в файле конфигурации
pub const SECTION_CLASSES: &str = "classes";
pub const KEY_PREFERRED_CLASSES: &str = "preferred_classes";
pub const KEY_EXCLUDED_CLASSES: &str = "excluded_classes";
/// Секция сочетаний клавиш
pub const SECTION_HOTKEYS: &str = "hotkeys";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub classes: ClassesConfig,
    #[serde(default)]
    pub hotkeys: HotkeysConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub device_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    /// `auto`, `x11` или `dry-run`
    pub backend: String,
    pub refresh_interval_ms: u64,
    /// Не показывать окна, закреплённые на всех рабочих столах
    pub skip_sticky: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub max_retries: u32,
    pub activation_poll_attempts: u32,
    pub activation_poll_interval_ms: u64,
}

/// Списки классов хранятся строками через запятую, как их пишет ConfigStore
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClassesConfig {
    #[serde(default)]
    pub preferred_classes: String,
    #[serde(default)]
    pub excluded_classes: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HotkeysConfig {
    pub move_forwards: String,
    pub move_backwards: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            filter: "win_switcher=info".to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: "auto".to_string(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            backend: "auto".to_string(),
            refresh_interval_ms: 2000,
            skip_sticky: true,
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            activation_poll_attempts: 500,
            activation_poll_interval_ms: 30,
        }
    }
}

impl Default for HotkeysConfig {
    fn default() -> Self {
        Self {
            move_forwards: "ctrl,alt,right".to_string(),
            move_backwards: "ctrl,alt,left".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Директива EnvFilter: `filter`, а если он пуст, общий `level`
    pub fn directive(&self) -> &str {
        if self.filter.trim().is_empty() {
            &self.level
        } else {
            &self.filter
        }
    }
}

impl HotkeysConfig {
    pub fn value(&self, action: HotkeyAction) -> &str {
        match action {
            HotkeyAction::MoveForwards => &self.move_forwards,
            HotkeyAction::MoveBackwards => &self.move_backwards,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SWITCHER_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        match self.window.backend.as_str() {
            "auto" | "x11" | "dry-run" => {}
            _ => anyhow::bail!("Неверная оконная система: {}", self.window.backend),
        }

        if self.window.refresh_interval_ms < 100 {
            anyhow::bail!("refresh_interval_ms должно быть минимум 100");
        }

        if self.navigation.max_retries == 0 {
            anyhow::bail!("max_retries должно быть больше 0");
        }

        if self.navigation.activation_poll_attempts == 0 {
            anyhow::bail!("activation_poll_attempts должно быть больше 0");
        }

        Ok(())
    }

    /// Сочетания в порядке проверки
    pub fn chords(&self) -> Vec<Chord<HotkeyAction>> {
        HotkeyAction::ALL
            .into_iter()
            .map(|action| Chord::parse(action.config_key(), self.hotkeys.value(action), action))
            .collect()
    }

    pub fn class_filter(&self) -> ClassFilter {
        ClassFilter::new(
            parse_class_list(&self.classes.preferred_classes),
            parse_class_list(&self.classes.excluded_classes),
        )
        .with_skip_rules(self.window.skip_sticky)
    }
}

/// Запись отдельных значений обратно в файл конфигурации.
///
/// Хранит весь документ как `toml::Table`, поэтому чужие секции и ключи
/// переживают перезапись.
pub struct ConfigStore {
    path: PathBuf,
    table: toml::Table,
}

impl ConfigStore {
    pub fn open<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let table = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<toml::Table>(&content)
                .with_context(|| format!("Неверный TOML в {:?}", path))?
        } else {
            debug!("Файл конфигурации {:?} не найден, начинаем с пустого", path);
            toml::Table::new()
        };

        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Значение ключа без пробелов; пустая строка, если ключа нет
    pub fn get(&self, section: &str, key: &str) -> String {
        self.table
            .get(section)
            .and_then(|s| s.get(key))
            .and_then(|v| v.as_str())
            .map(|v| v.replace(' ', ""))
            .unwrap_or_default()
    }

    /// Записать значение. При ошибке записи документ в памяти откатывается.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> crate::error::Result<()> {
        let previous = self.table.clone();

        let entry = self
            .table
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        match entry.as_table_mut() {
            Some(table) => {
                table.insert(key.to_string(), toml::Value::String(value.to_string()));
            }
            None => {
                return Err(SwitcherError::ConfigWrite {
                    section: section.to_string(),
                    key: key.to_string(),
                    message: "секция не является таблицей".to_string(),
                });
            }
        }

        if let Err(message) = self.write() {
            warn!("Не удалось сохранить конфигурацию {:?}: {}", self.path, message);
            self.table = previous;
            return Err(SwitcherError::ConfigWrite {
                section: section.to_string(),
                key: key.to_string(),
                message,
            });
        }

        debug!("Сохранено [{}] {} = \"{}\"", section, key, value);
        Ok(())
    }

    fn write(&self) -> std::result::Result<(), String> {
        let content = toml::to_string_pretty(&self.table).map_err(|e| e.to_string())?;
        fs::write(&self.path, content).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::keycode_map::KeycodeMap;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.navigation.max_retries, 5);
        assert_eq!(config.logging.directive(), "win_switcher=info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.window.backend = "wayland".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.navigation.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("win-switcher.toml");
        fs::write(
            &path,
            "[classes]\nexcluded_classes = \"Slack,Term\"\n\n[hotkeys]\nmove_forwards = \"super,tab\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.classes.excluded_classes, "Slack,Term");
        assert_eq!(config.hotkeys.move_backwards, "ctrl,alt,left");
        assert_eq!(config.window.backend, "auto");

        let chords = config.chords();
        assert_eq!(chords[0].name, "move_forwards");
        assert_eq!(
            chords[0].keys.as_slice(),
            &[KeycodeMap::key("super").unwrap(), KeycodeMap::key("tab").unwrap()]
        );
        assert_eq!(config.class_filter().excluded(), &["Slack".to_string(), "Term".to_string()]);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.hotkeys.move_forwards, "ctrl,alt,right");
    }

    #[test]
    fn test_config_store_roundtrip_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("win-switcher.toml");
        fs::write(&path, "[window]\nrefresh_interval_ms = 500\n").unwrap();

        let mut store = ConfigStore::open(&path).unwrap();
        store.set(SECTION_CLASSES, KEY_PREFERRED_CLASSES, "Firefox, Code").unwrap();

        let reopened = ConfigStore::open(&path).unwrap();
        assert_eq!(reopened.get(SECTION_CLASSES, KEY_PREFERRED_CLASSES), "Firefox,Code");
        assert_eq!(reopened.get(SECTION_CLASSES, KEY_EXCLUDED_CLASSES), "");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.window.refresh_interval_ms, 500);
    }

    #[test]
    fn test_config_store_rolls_back_on_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("win-switcher.toml");

        let mut store = ConfigStore::open(&path).unwrap();
        let err = store.set(SECTION_HOTKEYS, "move_forwards", "ctrl,tab").unwrap_err();
        assert!(matches!(err, SwitcherError::ConfigWrite { .. }));
        assert_eq!(store.get(SECTION_HOTKEYS, "move_forwards"), "");
    }
}
