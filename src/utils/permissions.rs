use crate::error::{Result, SwitcherError};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Проверить доступ к клавиатуре и дисплею X11
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    check_input_devices_access(Path::new("/dev/input"))?;
    check_display(std::env::var("DISPLAY").ok().as_deref())?;
    check_not_root();

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access(input_dir: &Path) -> Result<()> {
    if !input_dir.exists() {
        return Err(SwitcherError::Permission(format!(
            "Директория {} не существует",
            input_dir.display()
        )));
    }

    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", input_dir.display());
            Ok(())
        }
        Err(e) => Err(SwitcherError::Permission(format!(
            "Нет доступа к {}: {}. Добавьте пользователя в группу 'input'",
            input_dir.display(),
            e
        ))),
    }
}

fn check_display(display: Option<&str>) -> Result<()> {
    match display {
        Some(value) if !value.is_empty() => {
            info!("Дисплей X11: {}", value);
            Ok(())
        }
        _ => Err(SwitcherError::ServiceUnavailable(
            "переменная DISPLAY не задана, сессия X11 не найдена".to_string(),
        )),
    }
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("Приложение запущено от имени root!");
            warn!("   Добавьте пользователя в группу 'input' и запускайте без sudo:");
            for command in get_setup_commands() {
                warn!("   {}", command);
            }
        }
        Ok(user) => info!("Приложение запущено от имени пользователя: {}", user),
        Err(_) => warn!("Не удалось определить пользователя"),
    }
}

/// Команды настройки доступа к /dev/input
pub fn get_setup_commands() -> Vec<String> {
    vec![
        "sudo usermod -a -G input $USER".to_string(),
        "# затем перезайдите в систему".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_commands() {
        let commands = get_setup_commands();
        assert!(commands.iter().any(|cmd| cmd.contains("usermod")));
        assert!(!commands.iter().any(|cmd| cmd.contains("uinput")));
    }

    #[test]
    fn test_display_required() {
        assert!(check_display(Some(":0")).is_ok());
        assert!(matches!(check_display(None), Err(SwitcherError::ServiceUnavailable(_))));
        assert!(check_display(Some("")).is_err());
    }

    #[test]
    fn test_input_dir_checks() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_input_devices_access(dir.path()).is_ok());
        assert!(matches!(
            check_input_devices_access(&dir.path().join("absent")),
            Err(SwitcherError::Permission(_))
        ));
    }
}
