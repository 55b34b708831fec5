use std::time::Duration;

use axkit_accessibility::{AccessibilityCheck, Permission, is_trusted};

#[tokio::main]
async fn main() {
    println!("Testing Accessibility...");

    for permission in [Permission::Accessibility, Permission::InputMonitoring] {
        println!("{permission}: granted = {}", is_trusted(permission));
    }

    if axkit_accessibility::check_accessibility_and_update_system_settings() {
        println!("Accessibility already granted.");
        return;
    }

    println!("System Settings should now show the Accessibility pane.");
    println!("Waiting up to 60s for the toggle...");
    match AccessibilityCheck::default()
        .wait_until_granted(Duration::from_millis(500), Some(Duration::from_secs(60)))
        .await
    {
        Ok(()) => println!("Accessibility granted."),
        Err(e) => println!("Gave up: {e}"),
    }
}
