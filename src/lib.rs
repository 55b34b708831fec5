//! # axkit
//!
//! Privacy-permission helpers for apps that watch or drive input
//! system-wide, such as mouse and keyboard utilities.
//!
//! ## Features
//!
//! - `accessibility`: Accessibility and Input Monitoring permission checks.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! axkit = { version = "0.1", features = ["accessibility"] }
//! ```
//!
//! ```rust,ignore
//! use axkit::accessibility;
//!
//! fn start() {
//!     if !accessibility::check_accessibility_and_update_system_settings() {
//!         println!("Grant Accessibility access in System Settings, then relaunch.");
//!     }
//! }
//! ```

#[cfg(feature = "accessibility")]
pub use axkit_accessibility as accessibility;
