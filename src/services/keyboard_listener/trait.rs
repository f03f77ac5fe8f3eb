use crate::config::Config;
use crate::error::Result;
use crate::services::switcher::SwitcherHandle;
use std::sync::Arc;

/// Trait for keyboard listeners that can run in different modes
#[async_trait::async_trait]
pub trait KeyboardListenerTrait {
    /// Читать клавиатуру, пока переключатель принимает события
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create an appropriate keyboard listener based on the dry_run flag
pub fn create_keyboard_listener(
    config: Arc<Config>,
    switcher: SwitcherHandle,
    dry_run: bool,
) -> Result<Box<dyn KeyboardListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_keyboard_listener::DryRunKeyboardListener::new(
            config,
            switcher,
        )?))
    } else {
        Ok(Box::new(super::keyboard_listener::RealKeyboardListener::new(
            config,
            switcher,
        )?))
    }
}
