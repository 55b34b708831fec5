use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream;
use futures_timer::Delay;

use crate::{AccessibilityError, Permission, Platform, SystemPlatform};

/// Stream of permission states, see [`AccessibilityCheck::watch`].
pub type PermissionStream = Pin<Box<dyn Stream<Item = bool> + Send>>;

/// A configurable permission check.
///
/// By default a failed check prompts and opens System Settings, which is
/// what [`check_accessibility_and_update_system_settings`] does.
///
/// ```rust,no_run
/// use axkit_accessibility::{AccessibilityCheck, Permission};
///
/// let granted = AccessibilityCheck::new(Permission::InputMonitoring)
///     .with_prompt(false)
///     .with_reset_entry("com.example.helper")
///     .run();
/// ```
///
/// [`check_accessibility_and_update_system_settings`]: crate::check_accessibility_and_update_system_settings
#[derive(Debug, Clone)]
pub struct AccessibilityCheck<P = SystemPlatform> {
    platform: P,
    permission: Permission,
    prompt: bool,
    open_settings: bool,
    reset_entry: Option<String>,
}

impl Default for AccessibilityCheck {
    fn default() -> Self {
        Self::new(Permission::Accessibility)
    }
}

impl AccessibilityCheck {
    /// Create a check for `permission` against the host OS.
    #[must_use]
    pub const fn new(permission: Permission) -> Self {
        Self {
            platform: SystemPlatform,
            permission,
            prompt: true,
            open_settings: true,
            reset_entry: None,
        }
    }
}

impl<P: Platform> AccessibilityCheck<P> {
    /// Run the check against a different [`Platform`].
    #[must_use]
    pub fn with_platform<Q: Platform>(self, platform: Q) -> AccessibilityCheck<Q> {
        AccessibilityCheck {
            platform,
            permission: self.permission,
            prompt: self.prompt,
            open_settings: self.open_settings,
            reset_entry: self.reset_entry,
        }
    }

    /// Show the system alert when the permission is missing.
    #[must_use]
    pub const fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// Open the privacy pane when the permission is missing.
    #[must_use]
    pub const fn with_open_settings(mut self, open_settings: bool) -> Self {
        self.open_settings = open_settings;
        self
    }

    /// Reset the stored entry for `bundle_id` before prompting.
    ///
    /// Entries left behind by an older build of the app stay ticked in
    /// System Settings but no longer apply to the current binary.
    #[must_use]
    pub fn with_reset_entry(mut self, bundle_id: impl Into<String>) -> Self {
        self.reset_entry = Some(bundle_id.into());
        self
    }

    /// The permission this check is about.
    #[must_use]
    pub const fn permission(&self) -> Permission {
        self.permission
    }

    /// Whether the permission is granted right now. No side effects.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.platform.is_trusted(self.permission, false)
    }

    /// Check the permission and, if missing, send the user to fix it.
    ///
    /// Returns `true` when granted. Helper failures are logged and never
    /// change the answer.
    #[must_use]
    pub fn run(&self) -> bool {
        let permission = self.permission;
        if self.is_granted() {
            log::debug!("{permission} permission granted");
            return true;
        }
        log::info!("{permission} permission missing");

        if let Some(bundle_id) = &self.reset_entry {
            let reset = validate_bundle_id(bundle_id)
                .and_then(|()| self.platform.reset_entry(permission, bundle_id));
            if let Err(e) = reset {
                log::warn!("could not reset {permission} entry for {bundle_id}: {e}");
            }
        }

        if self.prompt && self.platform.is_trusted(permission, true) {
            log::debug!("{permission} permission granted after prompt");
            return true;
        }

        if self.open_settings {
            if let Err(e) = self.platform.open_settings(permission) {
                log::warn!("could not open {permission} settings: {e}");
            }
        }
        false
    }

    /// Resolve once the permission is granted.
    ///
    /// Polls every `interval`. Never prompts.
    ///
    /// # Errors
    /// Returns [`AccessibilityError::Timeout`] if `timeout` elapses first.
    pub async fn wait_until_granted(
        &self,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<(), AccessibilityError> {
        let started = Instant::now();
        loop {
            if self.is_granted() {
                return Ok(());
            }
            let nap = match timeout {
                Some(timeout) => {
                    let left = timeout.saturating_sub(started.elapsed());
                    if left.is_zero() {
                        return Err(AccessibilityError::Timeout(timeout));
                    }
                    interval.min(left)
                }
                None => interval,
            };
            Delay::new(nap).await;
        }
    }

    /// Watch the permission state.
    ///
    /// Yields the current state immediately, then every change observed
    /// while polling at `interval`.
    #[must_use]
    pub fn watch(self, interval: Duration) -> PermissionStream
    where
        P: Send + 'static,
    {
        let Self {
            platform,
            permission,
            ..
        } = self;

        Box::pin(stream::unfold(
            (platform, None),
            move |(platform, last)| async move {
                loop {
                    if last.is_some() {
                        Delay::new(interval).await;
                    }
                    let granted = platform.is_trusted(permission, false);
                    if last != Some(granted) {
                        return Some((granted, (platform, Some(granted))));
                    }
                }
            },
        ))
    }
}

/// Reverse-DNS identifiers only; the value ends up on a command line.
fn validate_bundle_id(bundle_id: &str) -> Result<(), AccessibilityError> {
    let valid = !bundle_id.is_empty()
        && bundle_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(AccessibilityError::InvalidBundleId(bundle_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use futures::StreamExt;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Query { prompt: bool },
        Open(Permission),
        Reset(Permission, String),
    }

    /// Answers queries from a script; the last answer repeats.
    #[derive(Debug, Default)]
    struct MockPlatform {
        answers: Mutex<VecDeque<bool>>,
        prompt_grants: bool,
        open_fails: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl MockPlatform {
        fn new(answers: impl IntoIterator<Item = bool>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().collect()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn opened(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Open(_)))
                .count()
        }
    }

    impl Platform for MockPlatform {
        fn is_trusted(&self, _permission: Permission, prompt: bool) -> bool {
            self.calls.lock().unwrap().push(Call::Query { prompt });
            if prompt && self.prompt_grants {
                return true;
            }
            let mut answers = self.answers.lock().unwrap();
            if answers.len() > 1 {
                answers.pop_front().unwrap()
            } else {
                answers.front().copied().unwrap_or(false)
            }
        }

        fn open_settings(&self, permission: Permission) -> Result<(), AccessibilityError> {
            self.calls.lock().unwrap().push(Call::Open(permission));
            if self.open_fails {
                Err(AccessibilityError::NotSupported)
            } else {
                Ok(())
            }
        }

        fn reset_entry(
            &self,
            permission: Permission,
            bundle_id: &str,
        ) -> Result<(), AccessibilityError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Reset(permission, bundle_id.to_owned()));
            Ok(())
        }
    }

    fn check(platform: &MockPlatform) -> AccessibilityCheck<&MockPlatform> {
        AccessibilityCheck::default().with_platform(platform)
    }

    #[test]
    fn granted_returns_true_without_side_effects() {
        let platform = MockPlatform::new([true]);
        assert!(check(&platform).run());
        assert_eq!(platform.calls(), vec![Call::Query { prompt: false }]);
    }

    #[test]
    fn missing_permission_prompts_and_opens_settings() {
        let platform = MockPlatform::new([false]);
        assert!(!check(&platform).run());
        assert_eq!(
            platform.calls(),
            vec![
                Call::Query { prompt: false },
                Call::Query { prompt: true },
                Call::Open(Permission::Accessibility),
            ]
        );
    }

    #[test]
    fn repeated_checks_reopen_settings_each_time() {
        let platform = MockPlatform::new([false]);
        let check = check(&platform);
        for _ in 0..3 {
            assert!(!check.run());
        }
        assert_eq!(platform.opened(), 3);
    }

    #[test]
    fn grant_during_prompt_skips_settings() {
        let platform = MockPlatform {
            prompt_grants: true,
            ..MockPlatform::new([false])
        };
        assert!(check(&platform).run());
        assert_eq!(platform.opened(), 0);
    }

    #[test]
    fn prompt_and_settings_can_be_disabled() {
        let platform = MockPlatform::new([false]);
        let granted = check(&platform)
            .with_prompt(false)
            .with_open_settings(false)
            .run();
        assert!(!granted);
        assert_eq!(platform.calls(), vec![Call::Query { prompt: false }]);
    }

    #[test]
    fn settings_failure_still_answers_false() {
        let platform = MockPlatform {
            open_fails: true,
            ..MockPlatform::new([false])
        };
        assert!(!check(&platform).run());
        assert_eq!(platform.opened(), 1);
    }

    #[test]
    fn resets_entry_before_prompting() {
        let platform = MockPlatform::new([false]);
        let check = AccessibilityCheck::new(Permission::InputMonitoring)
            .with_platform(&platform)
            .with_reset_entry("com.example.helper");
        assert!(!check.run());
        assert_eq!(
            platform.calls(),
            vec![
                Call::Query { prompt: false },
                Call::Reset(Permission::InputMonitoring, "com.example.helper".into()),
                Call::Query { prompt: true },
                Call::Open(Permission::InputMonitoring),
            ]
        );
    }

    #[test]
    fn invalid_bundle_id_is_never_reset() {
        let platform = MockPlatform::new([false]);
        let check = check(&platform).with_reset_entry("com.example; rm -rf ~");
        assert!(!check.run());
        assert!(
            !platform
                .calls()
                .iter()
                .any(|c| matches!(c, Call::Reset(..)))
        );
        assert_eq!(platform.opened(), 1);
    }

    #[test]
    fn granted_entry_is_left_alone() {
        let platform = MockPlatform::new([true]);
        let check = check(&platform).with_reset_entry("com.example.helper");
        assert!(check.run());
        assert_eq!(platform.calls(), vec![Call::Query { prompt: false }]);
    }

    #[tokio::test]
    async fn wait_resolves_once_granted() {
        let platform = MockPlatform::new([false, false, true]);
        check(&platform)
            .wait_until_granted(Duration::from_millis(1), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert!(
            platform
                .calls()
                .iter()
                .all(|c| *c == Call::Query { prompt: false })
        );
    }

    #[tokio::test]
    async fn wait_times_out() {
        let platform = MockPlatform::new([false]);
        let timeout = Duration::from_millis(20);
        let result = check(&platform)
            .wait_until_granted(Duration::from_millis(1), Some(timeout))
            .await;
        assert!(matches!(result, Err(AccessibilityError::Timeout(t)) if t == timeout));
        assert_eq!(platform.opened(), 0);
    }

    #[tokio::test]
    async fn wait_never_sleeps_past_timeout() {
        let platform = MockPlatform::new([false]);
        let started = Instant::now();
        let result = check(&platform)
            .wait_until_granted(Duration::from_secs(2), Some(Duration::from_millis(20)))
            .await;
        assert!(matches!(result, Err(AccessibilityError::Timeout(_))));
        assert!(
            started.elapsed() < Duration::from_millis(500),
            "took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn accepts_reverse_dns_bundle_ids() {
        assert!(validate_bundle_id("com.nuebling.mac-mouse-fix.helper").is_ok());
        assert!(validate_bundle_id("org.example.My_App2").is_ok());
    }

    #[test]
    fn rejects_suspicious_bundle_ids() {
        for bad in ["", "com.example app", "com.example;rm", "../etc", "com.exämple"] {
            assert!(
                matches!(
                    validate_bundle_id(bad),
                    Err(AccessibilityError::InvalidBundleId(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn watch_yields_only_changes() {
        let platform = Arc::new(MockPlatform::new([false, false, false, true, true, false]));
        let states: Vec<bool> = AccessibilityCheck::default()
            .with_platform(Arc::clone(&platform))
            .watch(Duration::from_millis(1))
            .take(3)
            .collect()
            .await;
        assert_eq!(states, vec![false, true, false]);
    }
}
