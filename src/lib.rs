//! Переключение окон X11 по глобальным сочетаниям клавиш в порядке,
//! который пользователь настраивает сам.

pub mod config;
pub mod error;
pub mod events;
pub mod services;
pub mod utils;
