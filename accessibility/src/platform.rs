use std::sync::Arc;

use crate::{AccessibilityError, Permission, sys};

/// Operating-system primitives the permission check is built from.
///
/// [`SystemPlatform`] talks to the real OS. Implement this trait to drive
/// [`AccessibilityCheck`](crate::AccessibilityCheck) against something else.
pub trait Platform {
    /// Whether `permission` is granted.
    ///
    /// With `prompt` set, a missing permission also registers the process
    /// in the privacy list and shows the system alert.
    fn is_trusted(&self, permission: Permission, prompt: bool) -> bool;

    /// Bring the System Settings pane for `permission` to the front.
    ///
    /// # Errors
    /// Returns an error if the settings application could not be opened.
    fn open_settings(&self, permission: Permission) -> Result<(), AccessibilityError>;

    /// Drop the stored decision for `bundle_id` so the OS registers the
    /// current binary afresh.
    ///
    /// # Errors
    /// Returns an error if the reset could not be performed.
    fn reset_entry(&self, permission: Permission, bundle_id: &str)
    -> Result<(), AccessibilityError>;
}

impl<P: Platform + ?Sized> Platform for &P {
    fn is_trusted(&self, permission: Permission, prompt: bool) -> bool {
        (**self).is_trusted(permission, prompt)
    }

    fn open_settings(&self, permission: Permission) -> Result<(), AccessibilityError> {
        (**self).open_settings(permission)
    }

    fn reset_entry(
        &self,
        permission: Permission,
        bundle_id: &str,
    ) -> Result<(), AccessibilityError> {
        (**self).reset_entry(permission, bundle_id)
    }
}

impl<P: Platform + ?Sized> Platform for Arc<P> {
    fn is_trusted(&self, permission: Permission, prompt: bool) -> bool {
        (**self).is_trusted(permission, prompt)
    }

    fn open_settings(&self, permission: Permission) -> Result<(), AccessibilityError> {
        (**self).open_settings(permission)
    }

    fn reset_entry(
        &self,
        permission: Permission,
        bundle_id: &str,
    ) -> Result<(), AccessibilityError> {
        (**self).reset_entry(permission, bundle_id)
    }
}

/// The host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPlatform;

impl Platform for SystemPlatform {
    fn is_trusted(&self, permission: Permission, prompt: bool) -> bool {
        sys::is_trusted(permission, prompt)
    }

    fn open_settings(&self, permission: Permission) -> Result<(), AccessibilityError> {
        sys::open_settings(permission)
    }

    fn reset_entry(
        &self,
        permission: Permission,
        bundle_id: &str,
    ) -> Result<(), AccessibilityError> {
        sys::reset_entry(permission, bundle_id)
    }
}
