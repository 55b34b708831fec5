//! Accessibility permission checks.
//!
//! This crate answers one question: may the running process observe and
//! control input system-wide? On macOS that is gated by the
//! "Accessibility" and "Input Monitoring" privacy panes. When the answer
//! is no, the check registers the process with the system and brings the
//! right pane of System Settings to the front so the user can flip the
//! toggle.
//!
//! Other platforms have no equivalent gate, so every check reports the
//! permission as granted there.
//!
//! ```rust,no_run
//! if !axkit_accessibility::check_accessibility_and_update_system_settings() {
//!     eprintln!("grant Accessibility access, then relaunch");
//! }
//! ```

#![warn(missing_docs)]

mod check;
mod platform;

/// Platform-specific implementations.
pub mod sys;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use check::{AccessibilityCheck, PermissionStream};
pub use platform::{Platform, SystemPlatform};

/// Privacy permissions that gate system-wide input access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Permission {
    /// Control the computer through the accessibility API and posted events.
    #[default]
    Accessibility,
    /// Observe keyboard and mouse events from other applications.
    InputMonitoring,
}

impl Permission {
    /// Deep link that opens System Settings on this permission's pane.
    #[must_use]
    pub const fn settings_url(self) -> &'static str {
        match self {
            Self::Accessibility => {
                "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility"
            }
            Self::InputMonitoring => {
                "x-apple.systempreferences:com.apple.preference.security?Privacy_ListenEvent"
            }
        }
    }

    /// Service name used by the TCC database (and `tccutil`).
    #[must_use]
    pub const fn tcc_service(self) -> &'static str {
        match self {
            Self::Accessibility => "Accessibility",
            Self::InputMonitoring => "ListenEvent",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accessibility => f.write_str("Accessibility"),
            Self::InputMonitoring => f.write_str("Input Monitoring"),
        }
    }
}

impl FromStr for Permission {
    type Err = AccessibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "accessibility" => Ok(Self::Accessibility),
            "input-monitoring" | "listen-event" => Ok(Self::InputMonitoring),
            _ => Err(AccessibilityError::UnknownPermission(s.to_owned())),
        }
    }
}

/// Errors from the helpers around the permission check.
///
/// The check itself never fails; it only ever answers yes or no.
#[derive(Debug, thiserror::Error)]
pub enum AccessibilityError {
    /// The operation has no meaning on this platform.
    #[error("not supported on this platform")]
    NotSupported,
    /// A helper process could not be started.
    #[error("failed to launch helper process: {0}")]
    Launch(#[from] std::io::Error),
    /// A helper process ran but reported failure.
    #[error("`{command}` exited with {status}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit status as reported by the OS.
        status: std::process::ExitStatus,
    },
    /// The bundle identifier is empty or contains unexpected characters.
    #[error("invalid bundle identifier: {0:?}")]
    InvalidBundleId(String),
    /// The permission was still missing when the deadline passed.
    #[error("permission not granted within {0:?}")]
    Timeout(Duration),
    /// A permission name could not be parsed.
    #[error("unknown permission: {0:?}")]
    UnknownPermission(String),
}

/// Check the accessibility permission and, if missing, send the user to
/// System Settings.
///
/// Returns `true` when the permission is granted. Otherwise the process is
/// registered in the Accessibility list, the system prompt is shown and the
/// Accessibility pane is opened; the result is then `false`.
#[must_use]
pub fn check_accessibility_and_update_system_settings() -> bool {
    AccessibilityCheck::default().run()
}

/// Whether `permission` is currently granted. Never prompts.
#[must_use]
pub fn is_trusted(permission: Permission) -> bool {
    SystemPlatform.is_trusted(permission, false)
}

/// Open the System Settings pane for `permission`.
///
/// # Errors
/// Returns [`AccessibilityError::NotSupported`] off macOS, or a launch error
/// if System Settings could not be opened.
pub fn open_privacy_settings(permission: Permission) -> Result<(), AccessibilityError> {
    SystemPlatform.open_settings(permission)
}
