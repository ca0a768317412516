use crate::engine::{Status, Subscription};

/// App-lifecycle transitions the host forwards to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    WillEnterForeground,
    DidEnterBackground,
}

pub type LifecycleCallback = Box<dyn Fn(LifecycleEvent) + Send + Sync>;

/// Injected source of app foreground/background notifications.
///
/// The host calls the registered callback for each transition; callbacks
/// may fire on any thread and are re-posted onto the controller loop.
/// Dropping the returned [`Subscription`] unregisters the callback.
pub trait LifecycleEventSource: Send + Sync {
    fn subscribe(&self, callback: LifecycleCallback) -> Subscription;
}

/// Decides whether playback auto-resumes after the app returns to the
/// foreground.
///
/// Backgrounding while playing or waiting arms the flag; foregrounding
/// consumes it. The flag never pauses anything itself; suspension of the
/// engine while backgrounded is the host's business.
#[derive(Debug, Default)]
pub(crate) struct LifecycleCoordinator {
    should_resume: bool,
}

impl LifecycleCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn note_background(&mut self, status: Status) {
        if matches!(status, Status::Playing | Status::WaitingToPlay) {
            self.should_resume = true;
        }
    }

    /// True exactly once after a background-while-active transition.
    pub(crate) fn take_resume(&mut self) -> bool {
        std::mem::take(&mut self.should_resume)
    }

    pub(crate) fn clear(&mut self) {
        self.should_resume = false;
    }
}
