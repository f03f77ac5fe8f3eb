use crate::error::Result;
use crate::events::WindowId;
use crate::switcher_error;
use std::process::Command;
use tracing::debug;

/// Обёртка над утилитой xdotool
pub struct XdotoolClient;

impl XdotoolClient {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self) -> Result<()> {
        self.run(&["version"]).map(|_| ())
    }

    pub fn get_active_window(&self) -> Result<Option<WindowId>> {
        debug!("Запрос активного окна через xdotool");
        let output = self.run(&["getactivewindow"])?;
        Ok(parse_active_window(&output))
    }

    pub fn set_window_name(&self, id: WindowId, title: &str) -> Result<()> {
        let target = id.to_string();
        self.run(&["set_window", "--name", title, &target]).map(|_| ())
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("xdotool")
            .args(args)
            .output()
            .map_err(|e| switcher_error!(window_system, "xdotool не найден: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("xdotool вернул ошибку: {}", stderr);
            return Err(switcher_error!(
                window_system,
                "xdotool {} вернул ошибку: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for XdotoolClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Окно 0 означает корневое окно: активного окна нет
pub(crate) fn parse_active_window(output: &str) -> Option<WindowId> {
    output
        .trim()
        .parse::<WindowId>()
        .ok()
        .filter(|id| id.value() != 0)
}
