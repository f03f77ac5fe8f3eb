use crate::config::Config;
use crate::error::{Result, SwitcherError};
use crate::events::{KeyCode, KeyEvent, KeyState};
use crate::services::keycode_map::KeycodeMap;
use crate::services::switcher::SwitcherHandle;
use crate::utils::DeviceFinder;
use crate::{switcher_error, trace_if_enabled};
use evdev::{Device, EventType};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::r#trait::KeyboardListenerTrait;

/// Подряд идущие ошибки чтения, после которых слушатель сдаётся
const MAX_READ_ERRORS: u32 = 50;

/// Слушатель evdev. Устройство читается без захвата: нажатия продолжают
/// доходить до X11, мы только наблюдаем.
pub struct RealKeyboardListener {
    switcher: SwitcherHandle,
    device: Device,
    device_path: PathBuf,
}

impl RealKeyboardListener {
    pub fn new(config: Arc<Config>, switcher: SwitcherHandle) -> Result<Self> {
        info!("Инициализация RealKeyboardListener");

        let device_path = DeviceFinder::find_keyboard_device(&config.input.device_path)?;

        let device = Device::open(&device_path).map_err(|e| {
            SwitcherError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        info!("Устройство: {}", device.name().unwrap_or("Unknown"));
        debug!("Физический путь: {:?}", device.physical_path());

        Ok(Self {
            switcher,
            device,
            device_path,
        })
    }

    async fn run_impl(self) -> Result<()> {
        info!("RealKeyboardListener запущен, читаем {:?}", self.device_path);

        // fetch_events блокирует поток до прихода событий
        tokio::task::spawn_blocking(move || self.read_loop())
            .await
            .map_err(|e| switcher_error!(internal, "поток чтения клавиатуры упал: {}", e))?
    }

    fn read_loop(mut self) -> Result<()> {
        let mut read_errors = 0u32;

        loop {
            let events: Vec<KeyEvent> = match self.device.fetch_events() {
                Ok(events) => {
                    read_errors = 0;
                    events
                        .filter_map(|e| translate_event(e.event_type(), e.code(), e.value()))
                        .collect()
                }
                Err(e) => {
                    read_errors += 1;
                    error!("Ошибка чтения событий: {}", e);
                    if read_errors >= MAX_READ_ERRORS {
                        return Err(SwitcherError::Io(e));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                    continue;
                }
            };

            for event in events {
                trace_if_enabled!("Событие клавиши: {}", event);
                if self.switcher.send_key_blocking(event).is_err() {
                    warn!("Переключатель остановлен, слушатель завершает работу");
                    return Ok(());
                }
            }
        }
    }
}

/// Событие evdev в нажатие/отпускание. Правые модификаторы приводятся к левым,
/// чтобы `ctrl` в сочетании срабатывал от обеих клавиш.
pub fn translate_event(event_type: EventType, code: u16, value: i32) -> Option<KeyEvent> {
    if event_type != EventType::KEY {
        return None;
    }
    let Some(state) = KeyState::from_evdev_value(value) else {
        debug!("Неизвестное значение события: {}", value);
        return None;
    };
    Some(KeyEvent::new(KeycodeMap::canonical(KeyCode(code)), state))
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for RealKeyboardListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_key_events() {
        let event = translate_event(EventType::KEY, 15, 1).unwrap();
        assert_eq!(event.key_code, KeyCode(15));
        assert_eq!(event.state, KeyState::Pressed);

        let event = translate_event(EventType::KEY, 15, 2).unwrap();
        assert_eq!(event.state, KeyState::Repeat);

        assert!(translate_event(EventType::KEY, 15, 7).is_none());
        assert!(translate_event(EventType::RELATIVE, 0, 1).is_none());
    }

    #[test]
    fn test_right_modifiers_fold_to_left() {
        let right_ctrl = translate_event(EventType::KEY, 97, 1).unwrap();
        assert_eq!(right_ctrl.key_code, KeycodeMap::key("ctrl").unwrap());

        let right_alt = translate_event(EventType::KEY, 100, 0).unwrap();
        assert_eq!(right_alt.key_code, KeycodeMap::key("alt").unwrap());
        assert_eq!(right_alt.state, KeyState::Released);
    }
}
