use crate::error::Result;
use crate::events::{WindowId, WindowInfo};
use crate::switcher_error;
use std::process::Command;
use tracing::debug;

/// Обёртка над утилитой wmctrl
pub struct WmctrlClient;

impl WmctrlClient {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self) -> Result<()> {
        self.run(&["-m"]).map(|_| ())
    }

    /// `wmctrl -lx` + `wmctrl -d` для имён рабочих столов
    pub fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        let desktops = match self.run(&["-d"]) {
            Ok(output) => parse_desktops(&output),
            Err(e) => {
                debug!("Имена рабочих столов недоступны: {}", e);
                Vec::new()
            }
        };

        let output = self.run(&["-lx"])?;
        Ok(parse_window_list(&output, &desktops))
    }

    pub fn activate(&self, id: WindowId) -> Result<bool> {
        let target = format!("0x{:08x}", id.value());
        match self.run(&["-i", "-a", &target]) {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!("wmctrl не активировал окно {}: {}", id, e);
                Ok(false)
            }
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("wmctrl")
            .args(args)
            .output()
            .map_err(|e| switcher_error!(window_system, "wmctrl не найден: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(switcher_error!(
                window_system,
                "wmctrl {:?} вернул ошибку: {}",
                args,
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for WmctrlClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Первые `count` полей строки и остаток без ведущих пробелов
fn split_fields(line: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line.trim_start();
    while fields.len() < count {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((fields, rest))
}

/// Разбор `wmctrl -d`: `0  * DG: 1920x1080  VP: 0,0  WA: 0,0 1920x1050  Work`
pub(crate) fn parse_desktops(output: &str) -> Vec<(i32, String)> {
    output
        .lines()
        .filter_map(|line| {
            let (fields, _) = split_fields(line, 1)?;
            let index = fields[0].parse::<i32>().ok()?;
            let name = line
                .find(" WA: ")
                .and_then(|at| split_fields(&line[at + 5..], 2))
                .map(|(_, name)| name.trim().to_string())
                .unwrap_or_default();
            Some((index, name))
        })
        .collect()
}

/// Разбор `wmctrl -lx`: `0x03a00007  0 firefox.Firefox  host Заголовок окна`
pub(crate) fn parse_window_list(output: &str, desktops: &[(i32, String)]) -> Vec<WindowInfo> {
    output
        .lines()
        .filter_map(|line| {
            let (fields, title) = match split_fields(line, 4) {
                Some(parsed) => parsed,
                // окно без заголовка: хоста может не быть в конце строки
                None => (split_fields(line, 3)?.0, ""),
            };

            let id = fields[0].parse::<WindowId>().ok()?;
            let desktop = fields[1].parse::<i32>().ok()?;
            let desktop_name = desktops
                .iter()
                .find(|(index, _)| *index == desktop)
                .map(|(_, name)| name.clone())
                .unwrap_or_else(|| if desktop < 0 { String::new() } else { desktop.to_string() });

            Some(
                WindowInfo::new(id, fields[2])
                    .with_title(title.trim_end())
                    .with_desktop(desktop, desktop_name),
            )
        })
        .collect()
}
