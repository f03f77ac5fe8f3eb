pub mod chord_engine;
pub mod class_filter;
pub mod keyboard_listener;
pub mod keycode_map;
pub mod navigator;
pub mod order_store;
pub mod switcher;
pub mod window_system;

pub use chord_engine::{Chord, ChordEngine, HotkeyAction};
pub use class_filter::ClassFilter;
pub use keyboard_listener::create_keyboard_listener;
pub use navigator::{NavigationOutcome, Navigator};
pub use order_store::OrderStore;
pub use switcher::{ClassList, Switcher, SwitcherHandle};
pub use window_system::create_window_system;
