use crate::debug_if_enabled;
use crate::error::{Result, SwitcherError};
use crate::events::{OrderSummary, WindowId, WindowInfo};
use std::sync::Arc;
use tracing::{debug, info};

use super::entry::{DeleteMode, OrderSource, WindowEntry};
use super::observer::OrderObserver;

/// Владелец таблицы порядка окон.
///
/// Инвариант: `entries[i].position == i + 1`. После каждой структурной
/// правки таблица упорядочивается по группам
/// `[включённые][исключённые][удалённые]` с сохранением порядка внутри групп.
/// Мягкое удаление строку не двигает: она остаётся на месте до следующей
/// правки или очистки.
#[derive(Default)]
pub struct OrderStore {
    entries: Vec<WindowEntry>,
    summary: OrderSummary,
    observers: Vec<Arc<dyn OrderObserver>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn OrderObserver>) {
        self.observers.push(observer);
    }

    pub fn entries(&self) -> &[WindowEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> &OrderSummary {
        &self.summary
    }

    pub fn entry(&self, position: usize) -> Result<&WindowEntry> {
        position
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
            .ok_or(SwitcherError::InvalidPosition(position))
    }

    /// Порядок переключения
    pub fn current_order(&self) -> Vec<WindowEntry> {
        self.entries.iter().filter(|e| e.is_included()).cloned().collect()
    }

    /// Исходный порядок
    pub fn default_order(&self) -> Vec<WindowEntry> {
        let mut order: Vec<WindowEntry> = self
            .entries
            .iter()
            .filter(|e| e.is_default_member())
            .cloned()
            .collect();
        order.sort_by_key(|e| e.number);
        order
    }

    pub fn current_numbers(&self) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|e| e.is_included())
            .map(|e| e.number)
            .collect()
    }

    pub fn default_numbers(&self) -> Vec<u32> {
        self.default_order().iter().map(|e| e.number).collect()
    }

    /// Позиция первой живой не-клонированной строки окна
    pub fn locate(&self, id: WindowId) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.id == id && !e.is_cloned && !e.is_deleted)
            .map(|e| e.position)
    }

    /// Перестроить таблицу из отфильтрованного снимка окон.
    ///
    /// Возвращает, был ли сброшен текущий порядок (с учётом принудительного сброса).
    pub fn reset_from_snapshot(
        &mut self,
        windows: &[WindowInfo],
        reset_current: bool,
        reset_default: bool,
    ) -> bool {
        let current_ids: Vec<WindowId> = self
            .entries
            .iter()
            .filter(|e| e.is_included())
            .map(|e| e.id)
            .collect();

        let mut reset_current = reset_current;
        if !reset_current && Self::current_is_stale(&current_ids, windows) {
            debug!(
                "Текущий порядок ({} окон) не совпадает со снимком ({} окон), сброс",
                current_ids.len(),
                windows.len()
            );
            reset_current = true;
        }

        let numbers: Vec<u32> = if reset_default {
            (1..=windows.len() as u32).collect()
        } else {
            self.carry_numbers(windows)
        };

        let mut fresh: Vec<WindowEntry> = windows
            .iter()
            .zip(numbers)
            .map(|(window, number)| WindowEntry::from_window(window, number))
            .collect();

        if !reset_current {
            fresh.sort_by_key(|e| {
                current_ids
                    .iter()
                    .position(|id| *id == e.id)
                    .unwrap_or(usize::MAX)
            });
        }

        self.entries = fresh;
        self.renumber_positions();

        info!(
            "Таблица окон перестроена: {} окон (сброс текущего: {}, исходного: {})",
            self.entries.len(),
            reset_current,
            reset_default
        );

        self.reconcile(OrderSource::Table, reset_current, reset_default);
        reset_current
    }

    /// Переместить включённую строку на место строки `to`; цель зажимается в
    /// область включённых.
    ///
    /// Место считается по включённым строкам, поэтому закрытая строка, ещё
    /// стоящая посреди таблицы, не сбивает перемещение.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        if !self.entry(from)?.is_included() {
            return Err(SwitcherError::NotReorderable(from));
        }
        if to == from {
            return Ok(());
        }

        let moving_down = to > from;
        let moved = self.entries.remove(from - 1);
        // сколько включённых строк окажется перед перемещаемой
        let slot = self
            .entries
            .iter()
            .filter(|e| e.is_included())
            .filter(|e| if moving_down { e.position <= to } else { e.position < to })
            .count();

        self.settle();
        self.entries.insert(slot, moved);
        self.renumber_positions();

        debug_if_enabled!("Строка {} перемещена на позицию {}", from, slot + 1);
        self.reconcile(OrderSource::Table, true, false);
        Ok(())
    }

    /// Исключить строку из цикла или вернуть её обратно.
    ///
    /// Возвращает `false`, если строка закрыта и переключать нечего.
    pub fn toggle_excluded(&mut self, position: usize) -> Result<bool> {
        let entry = self.entry(position)?;
        if entry.is_excluded && entry.is_deleted {
            return Ok(false);
        }

        let mut moved = self.entries.remove(position - 1);
        if moved.is_excluded {
            moved.is_excluded = false;
            let at = self
                .entries
                .iter()
                .rposition(|e| e.is_included())
                .map_or(0, |index| index + 1);
            self.entries.insert(at, moved);
        } else {
            moved.is_excluded = true;
            self.entries.push(moved);
        }
        self.settle();

        debug_if_enabled!("Исключение строки {} переключено", position);
        self.reconcile(OrderSource::Table, true, false);
        Ok(true)
    }

    /// Клонировать строку; клон встаёт сразу за оригиналом.
    ///
    /// Возвращает позицию клона.
    pub fn clone_entry(&mut self, position: usize) -> Result<usize> {
        let origin = self.entry(position)?;
        if !origin.is_included() || origin.is_cloned {
            return Err(SwitcherError::NotClonable(position));
        }

        let mut clone = origin.clone();
        clone.is_cloned = true;
        clone.number = self.max_number() + 1;
        let number = clone.number;

        self.entries.insert(position, clone);
        self.settle();
        self.reconcile(OrderSource::Table, true, false);

        self.entries
            .iter()
            .find(|e| e.is_cloned && e.number == number)
            .map(|e| e.position)
            .ok_or_else(|| SwitcherError::Internal(format!("клон #{} потерян", number)))
    }

    pub fn delete_entry(&mut self, position: usize, mode: DeleteMode) -> Result<()> {
        match mode {
            DeleteMode::Hard => self.hard_delete(position),
            DeleteMode::Soft => self.soft_delete(position),
        }
    }

    fn hard_delete(&mut self, position: usize) -> Result<()> {
        let entry = self.entry(position)?;
        if !entry.is_cloned && !entry.is_deleted {
            return Err(SwitcherError::NotRemovable(position));
        }

        let removed = self.entries.remove(position - 1);
        for entry in &mut self.entries {
            if entry.number > removed.number {
                entry.number -= 1;
            }
        }
        self.settle();

        info!("Строка удалена: {}", removed);
        self.reconcile(OrderSource::Table, true, !removed.is_cloned);
        Ok(())
    }

    fn soft_delete(&mut self, position: usize) -> Result<()> {
        let entry = position
            .checked_sub(1)
            .and_then(|index| self.entries.get_mut(index))
            .ok_or(SwitcherError::InvalidPosition(position))?;
        if entry.is_deleted {
            return Ok(());
        }

        entry.mark_closed();
        info!("Окно {} помечено закрытым", entry.id);
        self.reconcile(OrderSource::Table, true, true);
        Ok(())
    }

    /// Убрать все закрытые строки. Возвращает количество удалённых.
    pub fn purge_deleted(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.is_deleted);
        let removed = before - self.entries.len();
        if removed == 0 {
            return 0;
        }

        self.compact_numbers();
        self.settle();
        debug!("Очищено закрытых строк: {}", removed);
        self.reconcile(OrderSource::Table, true, true);
        removed
    }

    /// Вернуть текущий порядок к исходному.
    ///
    /// Если они уже совпадают, таблица не меняется и подписчики получают
    /// `restore_skipped`. Возвращает, было ли что-то восстановлено.
    pub fn restore_default(&mut self) -> bool {
        if self.current_numbers() == self.default_numbers() {
            info!("Текущий порядок уже совпадает с исходным");
            for observer in &self.observers {
                observer.restore_skipped();
            }
            return false;
        }

        let payload: Vec<WindowEntry> = self
            .default_order()
            .into_iter()
            .map(|mut entry| {
                entry.is_excluded = false;
                entry
            })
            .collect();

        info!("Восстановление исходного порядка ({} окон)", payload.len());
        self.reconcile(OrderSource::Payload(payload), true, false);
        true
    }

    /// Пересчитать опубликованную сводку и уведомить подписчиков.
    ///
    /// Пересчитываются только половины, отмеченные флагами.
    pub fn reconcile(&mut self, source: OrderSource, reset_current: bool, reset_default: bool) {
        if let OrderSource::Payload(entries) = source {
            self.entries = entries;
            self.settle();
        }

        if reset_current {
            self.summary.current = OrderSummary::format_numbers(&self.current_numbers());
        }
        if reset_default {
            self.summary.default = OrderSummary::format_numbers(&self.default_numbers());
        }

        debug_if_enabled!("Сводка порядка: {}", self.summary);

        for observer in &self.observers {
            observer.order_changed(&self.summary, &self.entries);
        }
    }

    /// Обновить заголовок у всех строк окна (включая клоны)
    pub fn rename_entry(&mut self, id: WindowId, title: &str) -> usize {
        let mut renamed = 0;
        for entry in self.entries.iter_mut().filter(|e| e.id == id) {
            entry.title = title.to_string();
            renamed += 1;
        }
        renamed
    }

    fn current_is_stale(current_ids: &[WindowId], windows: &[WindowInfo]) -> bool {
        current_ids.is_empty()
            || current_ids.len() != windows.len()
            || current_ids
                .iter()
                .any(|id| !windows.iter().any(|w| w.id == *id))
            || windows.iter().any(|w| !current_ids.contains(&w.id))
    }

    /// Номера по прежнему исходному порядку, новые окна в конец
    fn carry_numbers(&self, windows: &[WindowInfo]) -> Vec<u32> {
        let surviving: Vec<WindowId> = self
            .default_order()
            .into_iter()
            .map(|e| e.id)
            .filter(|id| windows.iter().any(|w| w.id == *id))
            .collect();

        let mut next = surviving.len() as u32;
        windows
            .iter()
            .map(|window| match surviving.iter().position(|id| *id == window.id) {
                Some(index) => index as u32 + 1,
                None => {
                    next += 1;
                    next
                }
            })
            .collect()
    }

    fn max_number(&self) -> u32 {
        self.entries.iter().map(|e| e.number).max().unwrap_or(0)
    }

    fn compact_numbers(&mut self) {
        let mut numbers: Vec<u32> = self.entries.iter().map(|e| e.number).collect();
        numbers.sort_unstable();
        for entry in &mut self.entries {
            if let Ok(rank) = numbers.binary_search(&entry.number) {
                entry.number = rank as u32 + 1;
            }
        }
    }

    fn settle(&mut self) {
        self.entries.sort_by_key(|e| e.group());
        self.renumber_positions();
    }

    fn renumber_positions(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.position = index + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::order_store::CLOSED_MARKER;
    use parking_lot::Mutex;

    fn window(id: u64, class: &str) -> WindowInfo {
        WindowInfo::new(WindowId(id), class).with_title(format!("title {}", id))
    }

    fn abc() -> Vec<WindowInfo> {
        vec![window(1, "a.A"), window(2, "b.B"), window(3, "c.C")]
    }

    fn store_with(windows: &[WindowInfo]) -> OrderStore {
        let mut store = OrderStore::new();
        store.reset_from_snapshot(windows, true, true);
        store
    }

    fn current_ids(store: &OrderStore) -> Vec<u64> {
        store.current_order().iter().map(|e| e.id.0).collect()
    }

    fn default_ids(store: &OrderStore) -> Vec<u64> {
        store.default_order().iter().map(|e| e.id.0).collect()
    }

    #[derive(Default)]
    struct RecordingObserver {
        summaries: Mutex<Vec<OrderSummary>>,
        skipped: Mutex<usize>,
    }

    impl OrderObserver for RecordingObserver {
        fn order_changed(&self, summary: &OrderSummary, _entries: &[WindowEntry]) {
            self.summaries.lock().push(summary.clone());
        }

        fn restore_skipped(&self) {
            *self.skipped.lock() += 1;
        }
    }

    fn assert_settled(store: &OrderStore) {
        for (index, entry) in store.entries().iter().enumerate() {
            assert_eq!(entry.position, index + 1);
        }
        let groups: Vec<u8> = store.entries().iter().map(|e| e.group()).collect();
        let mut sorted = groups.clone();
        sorted.sort();
        assert_eq!(groups, sorted, "excluded/deleted rows must trail");

        let positions: Vec<usize> = store.current_order().iter().map(|e| e.position).collect();
        assert_eq!(positions, (1..=positions.len()).collect::<Vec<_>>());

        let mut numbers: Vec<u32> = store.entries().iter().map(|e| e.number).collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), store.len(), "numbers must be unique");

        assert!(store.default_order().iter().all(|e| !e.is_cloned && !e.is_deleted));
        assert_eq!(
            store.default_order().len(),
            store.entries().iter().filter(|e| !e.is_cloned && !e.is_deleted).count()
        );
    }

    #[test]
    fn test_reset_numbers_in_snapshot_order() {
        let store = store_with(&abc());

        assert_eq!(current_ids(&store), vec![1, 2, 3]);
        assert_eq!(store.summary().current, "1, 2, 3");
        assert_eq!(store.summary().default, "1, 2, 3");
        assert_eq!(store.entries()[0].class, "A");
        assert_settled(&store);
    }

    #[test]
    fn test_empty_snapshot_summary() {
        let store = store_with(&[]);
        assert_eq!(store.summary().current, "-1");
        assert_eq!(store.summary().default, "-1");
        assert!(store.is_empty());
    }

    #[test]
    fn test_reset_preserves_curated_order() {
        let mut store = store_with(&abc());
        store.reorder(3, 1).unwrap();
        assert_eq!(current_ids(&store), vec![3, 1, 2]);

        let reset = store.reset_from_snapshot(&abc(), false, false);
        assert!(!reset);
        assert_eq!(current_ids(&store), vec![3, 1, 2]);
        assert_eq!(store.summary().current, "3, 1, 2");
        assert_eq!(store.summary().default, "1, 2, 3");
    }

    #[test]
    fn test_reset_forced_when_window_missing() {
        let mut store = store_with(&abc());
        store.reorder(3, 1).unwrap();

        let shrunk = vec![window(1, "a.A"), window(3, "c.C")];
        assert!(store.reset_from_snapshot(&shrunk, false, false));
        assert_eq!(current_ids(&store), vec![1, 3]);
    }

    #[test]
    fn test_reset_forced_when_new_window_appears() {
        let mut store = store_with(&abc());
        store.reorder(3, 1).unwrap();

        let mut grown = abc();
        grown.push(window(4, "d.D"));
        assert!(store.reset_from_snapshot(&grown, false, false));
        assert_eq!(current_ids(&store), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_reset_without_default_carries_numbers() {
        let mut store = store_with(&abc());

        let snapshot = vec![window(4, "d.D"), window(3, "c.C"), window(1, "a.A")];
        store.reset_from_snapshot(&snapshot, true, false);

        let numbers: Vec<(u64, u32)> = store.entries().iter().map(|e| (e.id.0, e.number)).collect();
        assert_eq!(numbers, vec![(4, 3), (3, 2), (1, 1)]);
        assert_eq!(store.summary().current, "3, 2, 1");
        // исходная сводка не пересчитывалась
        assert_eq!(store.summary().default, "1, 2, 3");
    }

    #[test]
    fn test_reorder_clamps_into_included_region() {
        let mut store = store_with(&abc());
        store.toggle_excluded(3).unwrap();

        store.reorder(1, 99).unwrap();
        assert_eq!(current_ids(&store), vec![2, 1]);
        assert!(store.entries()[2].is_excluded);
        assert_settled(&store);

        assert!(matches!(store.reorder(3, 1), Err(SwitcherError::NotReorderable(3))));
        assert!(matches!(store.reorder(9, 1), Err(SwitcherError::InvalidPosition(9))));
    }

    #[test]
    fn test_exclude_moves_to_tail_and_include_reinserts() {
        let mut store = store_with(&[window(1, "a"), window(2, "b"), window(3, "c"), window(4, "d")]);

        store.toggle_excluded(1).unwrap();
        store.toggle_excluded(1).unwrap();
        let table: Vec<u64> = store.entries().iter().map(|e| e.id.0).collect();
        assert_eq!(table, vec![3, 4, 1, 2]);
        assert_eq!(current_ids(&store), vec![3, 4]);

        // возвращается перед первым исключённым
        store.toggle_excluded(3).unwrap();
        let table: Vec<u64> = store.entries().iter().map(|e| e.id.0).collect();
        assert_eq!(table, vec![3, 4, 1, 2]);
        assert_eq!(current_ids(&store), vec![3, 4, 1]);
        assert_eq!(store.summary().current, "3, 4, 1");
        assert_settled(&store);
    }

    #[test]
    fn test_toggle_ignores_closed_rows() {
        let mut store = store_with(&abc());
        store.delete_entry(2, DeleteMode::Soft).unwrap();

        assert!(!store.toggle_excluded(2).unwrap());
        assert!(store.entries()[1].is_deleted);
    }

    #[test]
    fn test_clone_after_origin() {
        let mut store = store_with(&abc());

        let position = store.clone_entry(1).unwrap();
        assert_eq!(position, 2);
        let clone = store.entry(2).unwrap();
        assert!(clone.is_cloned);
        assert_eq!(clone.id, WindowId(1));
        assert_eq!(clone.number, 4);

        assert_eq!(current_ids(&store), vec![1, 1, 2, 3]);
        assert_eq!(default_ids(&store), vec![1, 2, 3]);
        assert_eq!(store.summary().current, "1, 4, 2, 3");
        assert_eq!(store.locate(WindowId(1)), Some(1));
        assert_settled(&store);
    }

    #[test]
    fn test_clone_rejections() {
        let mut store = store_with(&abc());
        store.clone_entry(1).unwrap();

        assert!(matches!(store.clone_entry(2), Err(SwitcherError::NotClonable(2))));
        store.toggle_excluded(4).unwrap();
        assert!(matches!(store.clone_entry(4), Err(SwitcherError::NotClonable(4))));
    }

    #[test]
    fn test_hard_delete_rules() {
        let mut store = store_with(&abc());
        assert!(matches!(
            store.delete_entry(1, DeleteMode::Hard),
            Err(SwitcherError::NotRemovable(1))
        ));

        store.clone_entry(2).unwrap();
        store.delete_entry(3, DeleteMode::Hard).unwrap();
        assert_eq!(current_ids(&store), vec![1, 2, 3]);
        assert_eq!(store.summary().current, "1, 2, 3");
        assert_settled(&store);
    }

    #[test]
    fn test_hard_delete_of_closed_row_renumbers() {
        let mut store = store_with(&abc());
        store.delete_entry(1, DeleteMode::Soft).unwrap();
        store.delete_entry(1, DeleteMode::Hard).unwrap();

        let numbers: Vec<(u64, u32)> = store.entries().iter().map(|e| (e.id.0, e.number)).collect();
        assert_eq!(numbers, vec![(2, 1), (3, 2)]);
        assert_eq!(store.summary().default, "1, 2");
        assert_settled(&store);
    }

    #[test]
    fn test_reorder_across_closed_row() {
        let snapshot: Vec<WindowInfo> = (1..=4).map(|id| window(id, "w")).collect();
        let mut store = store_with(&snapshot);
        store.delete_entry(2, DeleteMode::Soft).unwrap();

        store.reorder(1, 4).unwrap();
        assert_eq!(current_ids(&store), vec![3, 4, 1]);
        assert!(store.entries()[3].is_deleted);
        assert_settled(&store);

        let mut store = store_with(&snapshot);
        store.delete_entry(2, DeleteMode::Soft).unwrap();
        store.reorder(4, 3).unwrap();
        assert_eq!(current_ids(&store), vec![1, 4, 3]);
        assert_settled(&store);
    }

    #[test]
    fn test_soft_delete_keeps_row_in_place() {
        let mut store = store_with(&abc());
        store.delete_entry(2, DeleteMode::Soft).unwrap();

        let closed = store.entry(2).unwrap();
        assert!(closed.is_deleted && closed.is_excluded);
        assert_eq!(closed.class, format!("{}B", CLOSED_MARKER));
        assert_eq!(closed.number, 2);

        assert_eq!(current_ids(&store), vec![1, 3]);
        assert_eq!(default_ids(&store), vec![1, 3]);
        assert_eq!(store.summary().current, "1, 3");
        assert_eq!(store.summary().default, "1, 3");
        assert_eq!(store.locate(WindowId(2)), None);

        // повторное мягкое удаление ничего не меняет
        store.delete_entry(2, DeleteMode::Soft).unwrap();
        assert_eq!(store.entry(2).unwrap().class, format!("{}B", CLOSED_MARKER));
    }

    #[test]
    fn test_purge_deleted() {
        let mut store = store_with(&abc());
        store.delete_entry(1, DeleteMode::Soft).unwrap();
        store.delete_entry(3, DeleteMode::Soft).unwrap();

        assert_eq!(store.purge_deleted(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].number, 1);
        assert_eq!(store.summary().current, "1");
        assert_eq!(store.purge_deleted(), 0);
        assert_settled(&store);
    }

    #[test]
    fn test_restore_default_is_noop_when_equal() {
        let observer = Arc::new(RecordingObserver::default());
        let mut store = store_with(&abc());
        store.subscribe(observer.clone());

        let before = store.entries().to_vec();
        assert!(!store.restore_default());
        assert_eq!(store.entries(), before.as_slice());
        assert_eq!(*observer.skipped.lock(), 1);
        assert!(observer.summaries.lock().is_empty());
    }

    #[test]
    fn test_restore_default_rebuilds_table() {
        let mut store = store_with(&abc());
        store.reorder(3, 1).unwrap();
        store.clone_entry(1).unwrap();
        store.toggle_excluded(3).unwrap();

        assert!(store.restore_default());
        assert_eq!(current_ids(&store), vec![1, 2, 3]);
        assert!(store.entries().iter().all(|e| !e.is_cloned && !e.is_excluded));
        assert_eq!(store.summary().current, "1, 2, 3");
        assert_settled(&store);
    }

    #[test]
    fn test_observers_receive_summaries() {
        let observer = Arc::new(RecordingObserver::default());
        let mut store = OrderStore::new();
        store.subscribe(observer.clone());

        store.reset_from_snapshot(&abc(), true, true);
        store.toggle_excluded(1).unwrap();

        let summaries = observer.summaries.lock();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].current, "2, 3");
        assert_eq!(summaries[1].default, "1, 2, 3");
    }

    #[test]
    fn test_reconcile_updates_only_flagged_halves() {
        let mut store = store_with(&abc());
        let mut payload = store.entries().to_vec();
        payload.reverse();

        store.reconcile(OrderSource::Payload(payload), false, false);
        assert_eq!(current_ids(&store), vec![3, 2, 1]);
        assert_eq!(store.summary().current, "1, 2, 3");

        store.reconcile(OrderSource::Table, true, false);
        assert_eq!(store.summary().current, "3, 2, 1");
    }

    #[test]
    fn test_rename_entry_updates_clones() {
        let mut store = store_with(&abc());
        store.clone_entry(1).unwrap();

        assert_eq!(store.rename_entry(WindowId(1), "renamed"), 2);
        assert_eq!(store.entry(1).unwrap().title, "renamed");
        assert_eq!(store.entry(2).unwrap().title, "renamed");
        assert_eq!(store.rename_entry(WindowId(42), "x"), 0);
    }

    #[test]
    fn test_random_edit_sequences_keep_invariants() {
        // Детерминированный генератор, чтобы тест был воспроизводим
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |bound: usize| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % bound as u64) as usize
        };

        let snapshot: Vec<WindowInfo> = (1..=6).map(|id| window(id, "w")).collect();
        let mut store = store_with(&snapshot);

        for _ in 0..500 {
            let len = store.len();
            let position = next(len) + 1;
            let _ = match next(5) {
                0 => store.reorder(position, next(len + 2)),
                1 => store.toggle_excluded(position).map(|_| ()),
                2 => store.clone_entry(position).map(|_| ()),
                3 => store.delete_entry(position, DeleteMode::Hard),
                _ => {
                    store.delete_entry(position, DeleteMode::Soft).unwrap();
                    store.purge_deleted();
                    Ok(())
                }
            };
            assert_settled(&store);

            if store.is_empty() {
                store.reset_from_snapshot(&snapshot, true, true);
            }
        }
    }
}
