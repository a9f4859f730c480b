use crate::settings::{SettingsIoError, ViewerSettings};

pub fn load() -> ViewerSettings {
    crate::settings::load_settings_or_default()
}

pub fn ensure_exists(settings: &ViewerSettings) -> Result<(), SettingsIoError> {
    crate::settings::ensure_settings_file_exists(settings)
}
