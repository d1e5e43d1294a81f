use std::{env, path::PathBuf};

use tracing::warn;

/// Default port for the local HTTP boundary.
pub(crate) const DEFAULT_PORT: u16 = 7878;

/// Environment variable overriding [`DEFAULT_PORT`].
pub(crate) const PORT_ENV: &str = "AUDIO_SWITCHER_PORT";

/// Environment variable pointing at the built front end.
pub(crate) const UI_DIR_ENV: &str = "AUDIO_SWITCHER_UI_DIR";

/// Front-end directory name, resolved next to the executable.
pub(crate) const DEFAULT_UI_DIR: &str = "ui";

/// Local HTTP boundary settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Port bound on the loopback interface.
    pub port: u16,
    /// Directory whose files are served for paths outside the API.
    pub ui_dir: PathBuf,
}

impl ServerSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_values(
            env::var(PORT_ENV).ok().as_deref(),
            env::var_os(UI_DIR_ENV).map(PathBuf::from),
        )
    }

    /// Build settings from raw values, falling back to the defaults.
    pub(crate) fn from_values(port: Option<&str>, ui_dir: Option<PathBuf>) -> Self {
        let port = match port.map(str::trim) {
            None | Some("") => DEFAULT_PORT,
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) if port != 0 => port,
                _ => {
                    warn!(value = raw, default = DEFAULT_PORT, "Invalid {}, using default", PORT_ENV);
                    DEFAULT_PORT
                }
            },
        };

        let ui_dir = ui_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(default_ui_dir);

        Self { port, ui_dir }
    }

    /// URL of the front end served next to the boundary.
    pub fn url(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self::from_values(None, None)
    }
}

/// `ui/` beside the executable, or relative to the working directory.
fn default_ui_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_UI_DIR)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UI_DIR))
}
