//! Platform-specific permission implementations.

#[cfg(target_os = "macos")]
mod apple;

#[cfg(target_os = "macos")]
pub(crate) use apple::{is_trusted, open_settings, reset_entry};

// Nothing gates input access outside macOS.
#[cfg(not(target_os = "macos"))]
pub(crate) const fn is_trusted(_permission: crate::Permission, _prompt: bool) -> bool {
    true
}

#[cfg(not(target_os = "macos"))]
pub(crate) const fn open_settings(
    _permission: crate::Permission,
) -> Result<(), crate::AccessibilityError> {
    Err(crate::AccessibilityError::NotSupported)
}

#[cfg(not(target_os = "macos"))]
pub(crate) const fn reset_entry(
    _permission: crate::Permission,
    _bundle_id: &str,
) -> Result<(), crate::AccessibilityError> {
    Err(crate::AccessibilityError::NotSupported)
}
