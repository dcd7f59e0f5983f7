//! Runtime configuration.
//!
//! Every field has a default; `/System/Runtime.json` may override any subset.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vesta_apps::AppTimings;
use vesta_desktop::RendererConfig;
use vesta_registry::DEFAULT_REGISTRY_PATH;
use vesta_session::states::BOOT;
use vesta_session::SessionTimings;
use vesta_vfs::StorageAdapter;

use crate::constants::RUNTIME_CONFIG_PATH;

/// Delays and poll intervals, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timings {
    /// Hidden time before a new state is mounted
    pub state_exit_ms: u64,
    /// Time after mounting before the state is revealed
    pub state_enter_ms: u64,
    /// Closing animation before a window's process is killed
    pub close_grace_ms: u64,
    /// Crash detection poll interval
    pub crash_poll_ms: u64,
    /// Wait for an app stylesheet to apply before inserting its surface
    pub style_settle_ms: u64,
    /// Boot screen pause
    pub boot_pause_ms: u64,
    /// Login screen pause
    pub login_pause_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            state_exit_ms: 400,
            state_enter_ms: 500,
            close_grace_ms: 300,
            crash_poll_ms: 1,
            style_settle_ms: 100,
            boot_pause_ms: 3000,
            login_pause_ms: 1000,
        }
    }
}

/// Runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// State table key entered at boot
    pub initial_state: String,
    /// Where the registry is persisted
    pub registry_path: String,
    /// Host element app surfaces render into
    pub render_target: String,
    /// Delays
    pub timings: Timings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            initial_state: BOOT.to_string(),
            registry_path: DEFAULT_REGISTRY_PATH.to_string(),
            render_target: String::from("desktop"),
            timings: Timings::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load `/System/Runtime.json`, falling back to defaults.
    pub fn load(fs: &dyn StorageAdapter) -> Self {
        let raw = match fs.read_to_string(RUNTIME_CONFIG_PATH) {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => {
                tracing::debug!("[config] no {}, using defaults", RUNTIME_CONFIG_PATH);
                return Self::default();
            }
            Err(e) => {
                tracing::warn!("[config] cannot read {}: {}", RUNTIME_CONFIG_PATH, e);
                return Self::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(config) => {
                tracing::info!("[config] loaded {}", RUNTIME_CONFIG_PATH);
                config
            }
            Err(e) => {
                tracing::warn!("[config] invalid {}: {}", RUNTIME_CONFIG_PATH, e);
                Self::default()
            }
        }
    }

    /// Windowed process timings.
    pub fn app_timings(&self) -> AppTimings {
        AppTimings {
            close_grace: Duration::from_millis(self.timings.close_grace_ms),
            crash_poll: Duration::from_millis(self.timings.crash_poll_ms.max(1)),
        }
    }

    /// State transition timings.
    pub fn session_timings(&self) -> SessionTimings {
        SessionTimings {
            exit_delay: Duration::from_millis(self.timings.state_exit_ms),
            enter_delay: Duration::from_millis(self.timings.state_enter_ms),
        }
    }

    /// Renderer settings.
    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            target: self.render_target.clone(),
            style_settle: Duration::from_millis(self.timings.style_settle_ms),
        }
    }

    /// Boot screen pause.
    pub fn boot_pause(&self) -> Duration {
        Duration::from_millis(self.timings.boot_pause_ms)
    }

    /// Login screen pause.
    pub fn login_pause(&self) -> Duration {
        Duration::from_millis(self.timings.login_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_vfs::MemoryVfs;

    #[test]
    fn test_defaults_when_absent() {
        let fs = MemoryVfs::new();
        assert_eq!(RuntimeConfig::load(&fs), RuntimeConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let fs = MemoryVfs::new();
        fs.write_file(
            RUNTIME_CONFIG_PATH,
            br#"{"initialState": "login", "timings": {"bootPauseMs": 10}}"#,
        )
        .unwrap();

        let config = RuntimeConfig::load(&fs);

        assert_eq!(config.initial_state, "login");
        assert_eq!(config.timings.boot_pause_ms, 10);
        assert_eq!(config.timings.state_exit_ms, 400);
        assert_eq!(config.registry_path, DEFAULT_REGISTRY_PATH);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let fs = MemoryVfs::new();
        fs.write_file(RUNTIME_CONFIG_PATH, b"{ nope").unwrap();

        assert_eq!(RuntimeConfig::load(&fs), RuntimeConfig::default());
    }

    #[test]
    fn test_conversions() {
        let config = RuntimeConfig::default();

        assert_eq!(config.app_timings(), AppTimings::default());
        assert_eq!(config.session_timings(), SessionTimings::default());
        assert_eq!(config.renderer_config(), RendererConfig::default());
        assert_eq!(config.boot_pause(), Duration::from_secs(3));
    }
}
