use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Environment variable that points at an alternate settings file.
pub const CONFIG_ENV_VAR: &str = "XLRELEASE_CONFIG";

/// Base xlrelease config directory (~/.config/xlrelease/ on all platforms)
pub fn xlrelease() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows")
        })?;
        Ok(PathBuf::from(appdata).join("xlrelease"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected("HOME environment variable not set on Unix-like system")
        })?;
        Ok(PathBuf::from(home).join(".config").join("xlrelease"))
    }
}

/// Global settings file path
pub fn settings_json() -> Result<PathBuf> {
    Ok(xlrelease()?.join("settings.json"))
}

/// Resolve the settings file: explicit path, then `XLRELEASE_CONFIG`, then the default.
pub fn resolve_settings_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(shellexpand::tilde(path).to_string()));
    }

    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
        }
    }

    settings_json()
}
