use crate::config::Config;
use crate::error::Result;
use crate::events::KeyEvent;
use crate::services::chord_engine::ChordKeys;
use crate::services::switcher::SwitcherHandle;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::r#trait::KeyboardListenerTrait;

const EMULATION_INTERVAL: Duration = Duration::from_secs(5);

/// Без устройства: раз в несколько секунд "нажимает" первое включённое сочетание
pub struct DryRunKeyboardListener {
    switcher: SwitcherHandle,
    chord: Option<ChordKeys>,
}

impl DryRunKeyboardListener {
    pub fn new(config: Arc<Config>, switcher: SwitcherHandle) -> Result<Self> {
        info!("Инициализация DryRunKeyboardListener");
        let chord = config
            .chords()
            .into_iter()
            .find(|c| c.is_enabled())
            .map(|c| c.keys);

        Ok(Self {
            switcher,
            chord,
        })
    }

    /// Нажать все клавиши по порядку и отпустить в обратном
    pub fn emulated_events(keys: &[crate::events::KeyCode]) -> Vec<KeyEvent> {
        keys.iter()
            .map(|k| KeyEvent::press(*k))
            .chain(keys.iter().rev().map(|k| KeyEvent::release(*k)))
            .collect()
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - KeyboardListener работает в режиме эмуляции");

        let Some(keys) = self.chord else {
            warn!("Нет включённых сочетаний, эмулировать нечего");
            return Ok(());
        };

        loop {
            tokio::time::sleep(EMULATION_INTERVAL).await;
            debug!("Эмуляция сочетания {:?}", keys);
            for event in Self::emulated_events(&keys) {
                if self.switcher.send_key(event).await.is_err() {
                    info!("Переключатель остановлен, эмуляция завершена");
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for DryRunKeyboardListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
