pub mod keyboard;
pub mod order;
pub mod window;

pub use keyboard::{KeyCode, KeyEvent, KeyState};
pub use order::{OrderSummary, SwitcherEvent};
pub use window::{WindowId, WindowInfo};
