//! Order Store: единая таблица окон, из которой выводятся текущий
//! (порядок переключения) и исходный (восстанавливаемый) порядки.
//!
//! Все правки идут через [`OrderStore`]; наружу отдаются только копии.

mod entry;
mod observer;
mod store;

pub use entry::{DeleteMode, OrderSource, WindowEntry, CLOSED_MARKER};
pub use observer::{BroadcastObserver, OrderObserver};
pub use store::OrderStore;
