//! macOS implementation using `ApplicationServices` and `IOKit`.

use std::process::Command;

use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::string::{CFString, CFStringRef};

use crate::{AccessibilityError, Permission};

const OPEN: &str = "/usr/bin/open";
const TCCUTIL: &str = "/usr/bin/tccutil";

// IOHIDRequestType / IOHIDAccessType from <IOKit/hid/IOHIDLib.h>
const IOHID_REQUEST_TYPE_LISTEN_EVENT: u32 = 1;
const IOHID_ACCESS_TYPE_GRANTED: u32 = 0;

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    static kAXTrustedCheckOptionPrompt: CFStringRef;
}

#[link(name = "IOKit", kind = "framework")]
unsafe extern "C" {
    fn IOHIDCheckAccess(request_type: u32) -> u32;
    fn IOHIDRequestAccess(request_type: u32) -> bool;
}

pub(crate) fn is_trusted(permission: Permission, prompt: bool) -> bool {
    match (permission, prompt) {
        (Permission::Accessibility, false) => unsafe { AXIsProcessTrusted() },
        (Permission::Accessibility, true) => accessibility_with_prompt(),
        (Permission::InputMonitoring, false) => unsafe {
            IOHIDCheckAccess(IOHID_REQUEST_TYPE_LISTEN_EVENT) == IOHID_ACCESS_TYPE_GRANTED
        },
        (Permission::InputMonitoring, true) => unsafe {
            IOHIDRequestAccess(IOHID_REQUEST_TYPE_LISTEN_EVENT)
        },
    }
}

fn accessibility_with_prompt() -> bool {
    // The key is a constant owned by the framework, so take it under the get rule.
    let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
    let options: CFDictionary<CFString, CFType> =
        CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value().as_CFType())]);
    unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) }
}

pub(crate) fn open_settings(permission: Permission) -> Result<(), AccessibilityError> {
    let url = permission.settings_url();
    log::debug!("opening {url}");
    run(Command::new(OPEN).arg(url))
}

pub(crate) fn reset_entry(
    permission: Permission,
    bundle_id: &str,
) -> Result<(), AccessibilityError> {
    log::debug!(
        "resetting {} entry for {bundle_id}",
        permission.tcc_service()
    );
    run(Command::new(TCCUTIL).args(["reset", permission.tcc_service(), bundle_id]))
}

fn run(command: &mut Command) -> Result<(), AccessibilityError> {
    let output = command.output()?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        log::debug!("{}", stderr.trim());
    }
    Err(AccessibilityError::CommandFailed {
        command: format!("{command:?}"),
        status: output.status,
    })
}
