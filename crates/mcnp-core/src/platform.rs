//! OS collaborators the core drives but does not implement.

use crate::models::DeepLink;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Badge update failed: {0}")]
    Badge(String),
}

/// App-icon badge counter
pub trait BadgeSink: Send + Sync {
    fn set_badge_count(&self, count: u32) -> Result<(), PlatformError>;
}

/// Routes the user to a deep-link destination.
///
/// The core only produces descriptors; it never observes navigation outcomes.
pub trait NavigationSink: Send + Sync {
    fn navigate(&self, target: DeepLink);
}

/// Badge sink for hosts without an app-icon badge
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBadge;

impl BadgeSink for NoopBadge {
    fn set_badge_count(&self, _count: u32) -> Result<(), PlatformError> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl NavigationSink for NoopNavigator {
    fn navigate(&self, target: DeepLink) {
        tracing::debug!(screen = %target.screen, "navigation requested without a navigator");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;

    /// Records every badge value and navigation request
    #[derive(Debug, Default)]
    pub struct RecordingPlatform {
        pub badges: Mutex<Vec<u32>>,
        pub navigations: Mutex<Vec<DeepLink>>,
    }

    impl RecordingPlatform {
        pub fn last_badge(&self) -> Option<u32> {
            self.badges.lock().last().copied()
        }
    }

    impl BadgeSink for RecordingPlatform {
        fn set_badge_count(&self, count: u32) -> Result<(), PlatformError> {
            self.badges.lock().push(count);
            Ok(())
        }
    }

    impl NavigationSink for RecordingPlatform {
        fn navigate(&self, target: DeepLink) {
            self.navigations.lock().push(target);
        }
    }
}
