use crate::error::{Result, SwitcherError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Слова в имени, по которым устройство точно не клавиатура
const POINTER_MARKERS: [&str; 4] = ["mouse", "deathadder", "touchpad", "trackpoint"];

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти клавиатуру: явный путь из конфигурации или автопоиск при `auto`
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                SwitcherError::device_not_found(format!("Указанное устройство не найдено: {:?}", path))
            };
        }

        info!("Автопоиск клавиатурного устройства...");

        if let Some(device) = Self::find_by_id()? {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        if let Some(device) = Self::find_by_event_devices()? {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        SwitcherError::device_not_found(
            "Не удалось найти клавиатуру. Убедитесь, что пользователь в группе 'input'",
        )
    }

    /// Приоритет ссылки из `/dev/input/by-id`; `None` для не-клавиатур
    pub fn by_id_priority(name: &str) -> Option<u32> {
        let lower = name.to_lowercase();
        if !lower.contains("event") || !(lower.contains("kbd") || lower.contains("keyboard")) {
            return None;
        }
        if POINTER_MARKERS.iter().any(|m| lower.contains(m)) {
            return None;
        }

        Some(if name.ends_with("event-kbd") {
            100
        } else if lower.contains("keyboard") {
            50
        } else {
            10
        })
    }

    fn find_by_id() -> Result<Option<PathBuf>> {
        let by_id_dir = Path::new("/dev/input/by-id");
        if !by_id_dir.exists() {
            debug!("Директория /dev/input/by-id не существует");
            return Ok(None);
        }

        let entries = fs::read_dir(by_id_dir)
            .map_err(|e| SwitcherError::Permission(format!("Нет доступа к /dev/input/by-id: {}", e)))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let Some(priority) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(Self::by_id_priority)
            else {
                continue;
            };

            if Self::is_keyboard_device(&path) {
                debug!("Кандидат {:?} (приоритет {})", path, priority);
                candidates.push((path, priority));
            }
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(candidates.into_iter().next().map(|(path, _)| path))
    }

    fn find_by_event_devices() -> Result<Option<PathBuf>> {
        let entries = fs::read_dir("/dev/input")
            .map_err(|e| SwitcherError::Permission(format!("Нет доступа к /dev/input: {}", e)))?;

        let mut event_devices = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("event"))
            {
                event_devices.push(path);
            }
        }
        event_devices.sort();

        Ok(event_devices.into_iter().find(|path| Self::is_keyboard_device(path)))
    }

    /// Устройство открывается и умеет основные клавиши клавиатуры
    fn is_keyboard_device(device_path: &Path) -> bool {
        let device = match evdev::Device::open(device_path) {
            Ok(device) => device,
            Err(e) => {
                warn!("Устройство {:?} недоступно: {}", device_path, e);
                return false;
            }
        };

        let name = device.name().unwrap_or("Unknown").to_lowercase();
        if POINTER_MARKERS.iter().any(|m| name.contains(m)) {
            debug!("Пропускаем указатель {:?} ({})", device_path, name);
            return false;
        }

        device.supported_keys().is_some_and(|keys| {
            keys.contains(evdev::KeyCode::KEY_A)
                && keys.contains(evdev::KeyCode::KEY_SPACE)
                && keys.contains(evdev::KeyCode::KEY_ENTER)
                && keys.iter().count() > 20
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path() {
        let result = DeviceFinder::find_keyboard_device("/non/existent/path");
        assert!(matches!(result, Err(SwitcherError::DeviceNotFound(_))));
    }

    #[test]
    fn test_by_id_priority() {
        assert_eq!(DeviceFinder::by_id_priority("usb-Logitech_USB_Keyboard-event-kbd"), Some(100));
        assert_eq!(DeviceFinder::by_id_priority("usb-Some_Keyboard-if01-event-joystick"), Some(50));
        assert_eq!(DeviceFinder::by_id_priority("usb-Razer_DeathAdder-event-kbd"), None);
        assert_eq!(DeviceFinder::by_id_priority("usb-Logitech_Mouse-event-mouse"), None);
        assert_eq!(DeviceFinder::by_id_priority("usb-Keyboard-kbd"), None);
    }
}
