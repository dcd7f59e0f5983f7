//! Centralized constants for the supervisor crate
//!
//! Paths, process names, stage slots and other fixed strings live here so
//! they can be audited in one place.

// =============================================================================
// Storage paths
// =============================================================================

/// Runtime configuration file.
pub const RUNTIME_CONFIG_PATH: &str = "/System/Runtime.json";

/// Machine-wide user data file read by the login state.
pub const PREFERENCES_FILE: &str = "/preferences.json";

/// Root of per-user folders.
pub const USERS_ROOT: &str = "/Users";

/// Folders every user gets.
pub const USER_FOLDERS: [&str; 3] = ["Documents", "Pictures", "Apps"];

// =============================================================================
// Process names
// =============================================================================

/// Name of the init process.
pub const INIT_NAME: &str = "init";

/// Name of the per-user daemon.
pub const USER_DAEMON_NAME: &str = "userdaemon";

// =============================================================================
// Stage slots
// =============================================================================

/// Boot status line.
pub const STATUS_SLOT: &str = "status";

/// Login greeting.
pub const USERNAME_SLOT: &str = "username";

/// Crash report text.
pub const CRASH_SLOT: &str = "crashText";

// =============================================================================
// Text
// =============================================================================

/// Shown on first boot.
pub const WELCOME_TEXT: &str = "Welcome to Vesta";

/// Greeting when no user data names anyone.
pub const DEFAULT_USERNAME: &str = "Stranger";

/// Header of the crash report.
pub const CRASH_BANNER: &str = "**** VESTA EXCEPTION ****\n\n\
An error has occurred, and Vesta has been halted.\n\
Details of the error can be found below.\n\n\
If this keeps happening, try removing any sideloaded applications.";

/// Log book records kept in memory.
pub const LOGBOOK_CAPACITY: usize = 512;
