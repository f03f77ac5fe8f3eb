mod dry_keyboard_listener;
mod keyboard_listener;
mod r#trait;

pub use self::dry_keyboard_listener::DryRunKeyboardListener;
pub use self::keyboard_listener::{translate_event, RealKeyboardListener};
pub use self::r#trait::{create_keyboard_listener, KeyboardListenerTrait};
