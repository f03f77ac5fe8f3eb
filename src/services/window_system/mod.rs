//! WindowSystem: доступ к окнам X11.
//!
//! Модуль только перечисляет окна, узнаёт и переключает активное окно и
//! меняет заголовки. Порядок окон и правила классов живут в Order Store и
//! Class Filter, здесь их нет.

mod dry_run;
mod r#trait;
mod wmctrl;
mod x11;
mod xdotool;

pub use self::dry_run::DryRunWindowSystem;
pub use self::r#trait::{create_window_system, WindowSystem};
pub use self::x11::X11WindowSystem;
