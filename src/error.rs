use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitcherError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Не удалось сохранить [{section}] {key}: {message}")]
    ConfigWrite {
        section: String,
        key: String,
        message: String,
    },

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Ошибка оконной системы: {0}")]
    WindowSystem(String),

    #[error("Позиция {0} вне списка окон")]
    InvalidPosition(usize),

    #[error("Окно на позиции {0} нельзя перемещать")]
    NotReorderable(usize),

    #[error("Окно на позиции {0} нельзя клонировать")]
    NotClonable(usize),

    #[error("Окно на позиции {0} нельзя удалить")]
    NotRemovable(usize),

    #[error("Сочетание уже используется в \"{other}\"")]
    DuplicateChord { other: String },

    #[error("Клавиши сочетания \"{0}\" не изменились")]
    ChordUnchanged(String),

    #[error("Неверное сочетание клавиш: {0}")]
    InvalidChord(String),

    #[error("Канал закрыт: {0}")]
    Channel(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl SwitcherError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(SwitcherError::DeviceNotFound(msg.into()))
    }

    /// Отказы в правке порядка или сочетаний, которые UI показывает пользователю как есть
    pub fn is_edit_rejection(&self) -> bool {
        matches!(
            self,
            SwitcherError::InvalidPosition(_)
                | SwitcherError::NotReorderable(_)
                | SwitcherError::NotClonable(_)
                | SwitcherError::NotRemovable(_)
                | SwitcherError::DuplicateChord { .. }
                | SwitcherError::ChordUnchanged(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SwitcherError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! switcher_error {
    (channel, $($arg:tt)*) => {
        $crate::error::SwitcherError::Channel(format!($($arg)*))
    };
    (device_not_found, $($arg:tt)*) => {
        $crate::error::SwitcherError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::SwitcherError::Permission(format!($($arg)*))
    };
    (invalid_chord, $($arg:tt)*) => {
        $crate::error::SwitcherError::InvalidChord(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::SwitcherError::ServiceUnavailable(format!($($arg)*))
    };
    (window_system, $($arg:tt)*) => {
        $crate::error::SwitcherError::WindowSystem(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::SwitcherError::Internal(format!($($arg)*))
    };
}
