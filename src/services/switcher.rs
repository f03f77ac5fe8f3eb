//! Switcher: единственная задача-владелец состояния переключателя.
//!
//! Order Store, движок сочетаний, навигатор, фильтр классов и запись
//! конфигурации живут внутри [`Switcher`]. Все изменения приходят командами
//! через [`SwitcherHandle`] и выполняются строго по очереди.

use crate::config::{
    Config, ConfigStore, KEY_EXCLUDED_CLASSES, KEY_PREFERRED_CLASSES, SECTION_CLASSES,
    SECTION_HOTKEYS,
};
use crate::debug_if_enabled;
use crate::error::{Result, SwitcherError};
use crate::events::{KeyEvent, OrderSummary, SwitcherEvent, WindowId};
use crate::services::chord_engine::{
    canonical_keys, check_assignment, Chord, ChordEngine, ChordKeys, HotkeyAction,
};
use crate::services::class_filter::{format_class_list, list_contains, ClassFilter};
use crate::services::navigator::{NavigationOutcome, Navigator};
use crate::services::order_store::{BroadcastObserver, DeleteMode, OrderStore, WindowEntry};
use crate::services::window_system::WindowSystem;
use crate::switcher_error;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

const COMMAND_QUEUE: usize = 256;
const EVENT_QUEUE: usize = 64;

/// Какой из двух списков классов правится
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassList {
    Preferred,
    Excluded,
}

impl ClassList {
    fn config_key(&self) -> &'static str {
        match self {
            ClassList::Preferred => KEY_PREFERRED_CLASSES,
            ClassList::Excluded => KEY_EXCLUDED_CLASSES,
        }
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassList::Preferred => f.write_str("предпочитаемые"),
            ClassList::Excluded => f.write_str("исключённые"),
        }
    }
}

/// Запрос на перечитывание окон. Повторные запросы, пришедшие до
/// выполнения, сливаются в один.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct RefreshRequest {
    reset_current: bool,
    reset_default: bool,
    /// Перестроить таблицу даже при неизменном наборе окон
    forced: bool,
}

impl RefreshRequest {
    fn merge(&mut self, other: RefreshRequest) {
        self.reset_current |= other.reset_current;
        self.reset_default |= other.reset_default;
        self.forced |= other.forced;
    }
}

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Key(KeyEvent),
    SetListener(bool),
    Refresh,
    Navigate { backwards: bool, reply: Reply<NavigationOutcome> },
    Reorder { from: usize, to: usize, reply: Reply<Result<()>> },
    ToggleExcluded { position: usize, reply: Reply<Result<bool>> },
    CloneEntry { position: usize, reply: Reply<Result<usize>> },
    Delete { position: usize, mode: DeleteMode, reply: Reply<Result<()>> },
    PurgeDeleted { reply: Reply<usize> },
    RestoreDefault { reply: Reply<bool> },
    AddClass { list: ClassList, class: String, reply: Reply<Result<bool>> },
    RemoveClass { list: ClassList, class: String, reply: Reply<Result<bool>> },
    AssignChord { action: HotkeyAction, keys: ChordKeys, reply: Reply<Result<()>> },
    SetChordDisabled { action: HotkeyAction, disabled: bool, reply: Reply<Result<()>> },
    RenameWindow { id: WindowId, title: String, reply: Reply<Result<bool>> },
    Rows { reply: Reply<Vec<WindowEntry>> },
    Summary { reply: Reply<OrderSummary> },
    Chords { reply: Reply<Vec<Chord<HotkeyAction>>> },
    ActiveClasses { reply: Reply<Result<Vec<String>>> },
    Shutdown,
}

/// Клонируемая ручка для отправки команд переключателю
#[derive(Clone)]
pub struct SwitcherHandle {
    sender: mpsc::Sender<Command>,
    events: broadcast::Sender<SwitcherEvent>,
    pending_refresh: Arc<Mutex<Option<RefreshRequest>>>,
}

impl SwitcherHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<SwitcherEvent> {
        self.events.subscribe()
    }

    /// Для потока захвата клавиатуры (вне runtime)
    pub fn send_key_blocking(&self, event: KeyEvent) -> Result<()> {
        self.sender
            .blocking_send(Command::Key(event))
            .map_err(|_| switcher_error!(channel, "переключатель остановлен"))
    }

    pub async fn send_key(&self, event: KeyEvent) -> Result<()> {
        self.send(Command::Key(event)).await
    }

    pub async fn set_listener(&self, active: bool) -> Result<()> {
        self.send(Command::SetListener(active)).await
    }

    /// Перечитать окна по запросу пользователя. `false`, если запрос слит с уже ожидающим.
    pub async fn request_refresh(&self, reset_current: bool, reset_default: bool) -> Result<bool> {
        self.schedule_refresh(RefreshRequest {
            reset_current,
            reset_default,
            forced: true,
        })
        .await
    }

    /// Фоновое обновление: таблица перестраивается только при смене набора окон
    pub async fn request_auto_refresh(&self) -> Result<bool> {
        self.schedule_refresh(RefreshRequest::default()).await
    }

    pub async fn navigate(&self, backwards: bool) -> Result<NavigationOutcome> {
        self.request(|reply| Command::Navigate { backwards, reply }).await
    }

    pub async fn reorder(&self, from: usize, to: usize) -> Result<()> {
        self.request(|reply| Command::Reorder { from, to, reply }).await?
    }

    pub async fn toggle_excluded(&self, position: usize) -> Result<bool> {
        self.request(|reply| Command::ToggleExcluded { position, reply }).await?
    }

    pub async fn clone_entry(&self, position: usize) -> Result<usize> {
        self.request(|reply| Command::CloneEntry { position, reply }).await?
    }

    pub async fn delete_entry(&self, position: usize, mode: DeleteMode) -> Result<()> {
        self.request(|reply| Command::Delete { position, mode, reply }).await?
    }

    pub async fn purge_deleted(&self) -> Result<usize> {
        self.request(|reply| Command::PurgeDeleted { reply }).await
    }

    pub async fn restore_default(&self) -> Result<bool> {
        self.request(|reply| Command::RestoreDefault { reply }).await
    }

    pub async fn add_class(&self, list: ClassList, class: impl Into<String>) -> Result<bool> {
        let class = class.into();
        self.request(|reply| Command::AddClass { list, class, reply }).await?
    }

    pub async fn remove_class(&self, list: ClassList, class: impl Into<String>) -> Result<bool> {
        let class = class.into();
        self.request(|reply| Command::RemoveClass { list, class, reply }).await?
    }

    pub async fn assign_chord(&self, action: HotkeyAction, keys: ChordKeys) -> Result<()> {
        self.request(|reply| Command::AssignChord { action, keys, reply }).await?
    }

    pub async fn set_chord_disabled(&self, action: HotkeyAction, disabled: bool) -> Result<()> {
        self.request(|reply| Command::SetChordDisabled { action, disabled, reply }).await?
    }

    pub async fn rename_window(&self, id: WindowId, title: impl Into<String>) -> Result<bool> {
        let title = title.into();
        self.request(|reply| Command::RenameWindow { id, title, reply }).await?
    }

    pub async fn rows(&self) -> Result<Vec<WindowEntry>> {
        self.request(|reply| Command::Rows { reply }).await
    }

    pub async fn summary(&self) -> Result<OrderSummary> {
        self.request(|reply| Command::Summary { reply }).await
    }

    pub async fn chords(&self) -> Result<Vec<Chord<HotkeyAction>>> {
        self.request(|reply| Command::Chords { reply }).await
    }

    pub async fn active_classes(&self) -> Result<Vec<String>> {
        self.request(|reply| Command::ActiveClasses { reply }).await?
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn schedule_refresh(&self, request: RefreshRequest) -> Result<bool> {
        {
            let mut pending = self.pending_refresh.lock();
            if let Some(waiting) = pending.as_mut() {
                waiting.merge(request);
                debug_if_enabled!("Обновление уже запрошено, запрос объединён");
                return Ok(false);
            }
            *pending = Some(request);
        }

        if let Err(e) = self.send(Command::Refresh).await {
            self.pending_refresh.lock().take();
            return Err(e);
        }
        Ok(true)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| switcher_error!(channel, "переключатель остановлен"))
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response
            .await
            .map_err(|_| switcher_error!(channel, "переключатель не ответил"))
    }
}

pub struct Switcher {
    store: OrderStore,
    engine: ChordEngine<HotkeyAction>,
    chords: Vec<Chord<HotkeyAction>>,
    navigator: Navigator,
    filter: ClassFilter,
    windows: Arc<dyn WindowSystem>,
    config_store: ConfigStore,
    events: broadcast::Sender<SwitcherEvent>,
    receiver: mpsc::Receiver<Command>,
    pending_refresh: Arc<Mutex<Option<RefreshRequest>>>,
    listener_enabled: bool,
}

impl Switcher {
    pub fn new(
        config: &Config,
        config_store: ConfigStore,
        windows: Arc<dyn WindowSystem>,
        listener_enabled: bool,
    ) -> (Self, SwitcherHandle) {
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE);
        let (events, _) = broadcast::channel(EVENT_QUEUE);
        let pending_refresh = Arc::new(Mutex::new(None));

        let mut store = OrderStore::new();
        store.subscribe(Arc::new(BroadcastObserver::new(events.clone())));

        let switcher = Self {
            store,
            engine: ChordEngine::new(),
            chords: config.chords(),
            navigator: Navigator::new(&config.navigation),
            filter: config.class_filter(),
            windows,
            config_store,
            events: events.clone(),
            receiver,
            pending_refresh: pending_refresh.clone(),
            listener_enabled,
        };

        let handle = SwitcherHandle {
            sender,
            events,
            pending_refresh,
        };

        (switcher, handle)
    }

    pub async fn run(mut self) -> Result<()> {
        info!("Switcher запущен");
        for chord in &self.chords {
            info!("Сочетание {}{}", chord, if chord.disabled { " (выключено)" } else { "" });
        }

        self.refresh(RefreshRequest {
            reset_current: true,
            reset_default: true,
            forced: true,
        })
        .await;

        if self.listener_enabled {
            self.set_listener(true);
        }

        while let Some(command) = self.receiver.recv().await {
            if matches!(command, Command::Shutdown) {
                info!("Switcher получил команду остановки");
                break;
            }
            self.handle(command).await;
        }

        self.engine.deactivate();
        info!("Switcher остановлен");
        Ok(())
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Key(event) => {
                if let Some(action) = self.engine.handle_event(&event) {
                    info!("Сочетание {} нажато", action);
                    self.navigate(action.is_backwards()).await;
                }
            }
            Command::SetListener(active) => self.set_listener(active),
            Command::Refresh => {
                let request = self.pending_refresh.lock().take();
                if let Some(request) = request {
                    self.refresh(request).await;
                }
            }
            Command::Navigate { backwards, reply } => {
                let outcome = self.navigate(backwards).await;
                let _ = reply.send(outcome);
            }
            Command::Reorder { from, to, reply } => {
                let _ = reply.send(log_rejection(self.store.reorder(from, to)));
            }
            Command::ToggleExcluded { position, reply } => {
                let _ = reply.send(log_rejection(self.store.toggle_excluded(position)));
            }
            Command::CloneEntry { position, reply } => {
                let _ = reply.send(log_rejection(self.store.clone_entry(position)));
            }
            Command::Delete { position, mode, reply } => {
                let _ = reply.send(log_rejection(self.store.delete_entry(position, mode)));
            }
            Command::PurgeDeleted { reply } => {
                let _ = reply.send(self.store.purge_deleted());
            }
            Command::RestoreDefault { reply } => {
                let _ = reply.send(self.store.restore_default());
            }
            Command::AddClass { list, class, reply } => {
                let result = self.add_class(list, &class).await;
                let _ = reply.send(result);
            }
            Command::RemoveClass { list, class, reply } => {
                let result = self.remove_class(list, &class).await;
                let _ = reply.send(result);
            }
            Command::AssignChord { action, keys, reply } => {
                let _ = reply.send(self.assign_chord(action, keys));
            }
            Command::SetChordDisabled { action, disabled, reply } => {
                let _ = reply.send(self.set_chord_disabled(action, disabled));
            }
            Command::RenameWindow { id, title, reply } => {
                let result = self.rename_window(id, &title).await;
                let _ = reply.send(result);
            }
            Command::Rows { reply } => {
                let _ = reply.send(self.store.entries().to_vec());
            }
            Command::Summary { reply } => {
                let _ = reply.send(self.store.summary().clone());
            }
            Command::Chords { reply } => {
                let _ = reply.send(self.chords.clone());
            }
            Command::ActiveClasses { reply } => {
                let result = self
                    .windows
                    .list_active_windows()
                    .await
                    .map(|snapshot| self.filter.active_classes(&snapshot));
                let _ = reply.send(result);
            }
            Command::Shutdown => {}
        }
    }

    async fn navigate(&mut self, backwards: bool) -> NavigationOutcome {
        self.navigator
            .move_next(&mut self.store, self.windows.as_ref(), &self.filter, backwards)
            .await
    }

    fn set_listener(&mut self, active: bool) {
        if active {
            self.engine.activate(self.chords.clone());
        } else {
            self.engine.deactivate();
        }
        if self.listener_enabled != active {
            info!("Слушатель сочетаний {}", if active { "включён" } else { "выключен" });
        }
        self.listener_enabled = active;
        self.publish(SwitcherEvent::ListenerStateChanged(active));
    }

    async fn refresh(&mut self, request: RefreshRequest) {
        let snapshot = match self.windows.list_active_windows().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Не удалось получить список окон: {}", e);
                return;
            }
        };
        let eligible = self.filter.filter(&snapshot);

        if !request.forced && self.same_window_set(&eligible) {
            debug_if_enabled!("Набор окон не изменился, обновление пропущено");
            return;
        }

        debug!("Обновление окон: {} открыто, {} подходит", snapshot.len(), eligible.len());
        let current_reset = self
            .store
            .reset_from_snapshot(&eligible, request.reset_current, request.reset_default);
        if current_reset {
            self.navigator.reset_cursor();
        }
    }

    fn same_window_set(&self, eligible: &[crate::events::WindowInfo]) -> bool {
        let known: HashSet<WindowId> = self
            .store
            .entries()
            .iter()
            .filter(|e| !e.is_cloned && !e.is_deleted)
            .map(|e| e.id)
            .collect();
        let fresh: HashSet<WindowId> = eligible.iter().map(|w| w.id).collect();
        known == fresh && !self.store.entries().iter().any(|e| e.is_deleted)
    }

    fn class_list(&self, list: ClassList) -> &[String] {
        match list {
            ClassList::Preferred => self.filter.preferred(),
            ClassList::Excluded => self.filter.excluded(),
        }
    }

    async fn add_class(&mut self, list: ClassList, class: &str) -> Result<bool> {
        let class = class.trim();
        let current = self.class_list(list);
        if class.is_empty() || list_contains(current, class) {
            debug!("Класс \"{}\" уже в списке ({})", class, list);
            return Ok(false);
        }

        let mut updated = current.to_vec();
        updated.push(class.to_string());
        self.apply_class_list(list, updated).await?;
        info!("Класс \"{}\" добавлен ({})", class, list);
        Ok(true)
    }

    async fn remove_class(&mut self, list: ClassList, class: &str) -> Result<bool> {
        let current = self.class_list(list);
        if !current.iter().any(|c| c == class) {
            return Ok(false);
        }

        let updated: Vec<String> = current.iter().filter(|c| *c != class).cloned().collect();
        self.apply_class_list(list, updated).await?;
        info!("Класс \"{}\" удалён ({})", class, list);
        Ok(true)
    }

    /// Сохранить список и только после успешной записи применить его
    async fn apply_class_list(&mut self, list: ClassList, classes: Vec<String>) -> Result<()> {
        self.persist(SECTION_CLASSES, list.config_key(), &format_class_list(&classes))?;

        match list {
            ClassList::Preferred => self.filter.set_preferred(classes),
            ClassList::Excluded => self.filter.set_excluded(classes),
        }

        self.refresh(RefreshRequest {
            reset_current: true,
            reset_default: true,
            forced: true,
        })
        .await;
        Ok(())
    }

    fn assign_chord(&mut self, action: HotkeyAction, keys: ChordKeys) -> Result<()> {
        let name = action.config_key();
        let keys = canonical_keys(&keys);
        log_rejection(check_assignment(&self.chords, name, &keys))?;

        let mut chord = self.chord(action)?.clone();
        chord.keys = keys;
        if chord.keys.is_empty() {
            chord.disabled = false;
        }
        self.persist(SECTION_HOTKEYS, name, &chord.encode())?;

        info!("Новое сочетание {}", chord);
        self.replace_chord(chord);
        Ok(())
    }

    fn set_chord_disabled(&mut self, action: HotkeyAction, disabled: bool) -> Result<()> {
        let mut chord = self.chord(action)?.clone();
        if chord.disabled == disabled {
            return Ok(());
        }
        if disabled && chord.keys.is_empty() {
            return Err(switcher_error!(invalid_chord, "сочетание \"{}\" не задано", chord.name));
        }

        chord.disabled = disabled;
        self.persist(SECTION_HOTKEYS, action.config_key(), &chord.encode())?;
        info!("Сочетание {} {}", chord.name, if disabled { "выключено" } else { "включено" });
        self.replace_chord(chord);
        Ok(())
    }

    fn chord(&self, action: HotkeyAction) -> Result<&Chord<HotkeyAction>> {
        self.chords
            .iter()
            .find(|c| c.action == action)
            .ok_or_else(|| switcher_error!(internal, "нет сочетания для {}", action))
    }

    fn replace_chord(&mut self, chord: Chord<HotkeyAction>) {
        if let Some(slot) = self.chords.iter_mut().find(|c| c.action == chord.action) {
            *slot = chord;
        }
        if self.engine.is_active() {
            self.engine.activate(self.chords.clone());
        }
    }

    async fn rename_window(&mut self, id: WindowId, title: &str) -> Result<bool> {
        if !self.windows.set_window_title(id, title).await? {
            warn!("Оконная система не сменила заголовок окна {}", id);
            return Ok(false);
        }
        let renamed = self.store.rename_entry(id, title);
        debug!("Заголовок окна {} обновлён в {} строках", id, renamed);
        Ok(true)
    }

    fn persist(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        match self.config_store.set(section, key, value) {
            Ok(()) => Ok(()),
            Err(SwitcherError::ConfigWrite { section, key, message }) => {
                self.publish(SwitcherEvent::ConfigWriteFailed {
                    section: section.clone(),
                    key: key.clone(),
                    message: message.clone(),
                });
                Err(SwitcherError::ConfigWrite { section, key, message })
            }
            Err(e) => Err(e),
        }
    }

    fn publish(&self, event: SwitcherEvent) {
        if self.events.send(event).is_err() {
            debug_if_enabled!("Нет подписчиков на события переключателя");
        }
    }
}

/// Отказы правки ожидаемы и идут в debug, остальное в warn
fn log_rejection<T>(result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.is_edit_rejection() {
            debug!("Правка отклонена: {}", e);
        } else {
            warn!("Ошибка правки: {}", e);
        }
    }
    result
}
