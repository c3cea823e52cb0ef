//! Fixed display, recents and voice collaborators.

use crate::geometry::DisplayFrames;
use crate::task::{
    domain::{DisplayId, Task, TaskId, UserId},
    ports::{DisplayEnvironment, RecentsPolicy, VoiceInteraction, VoiceSessionError},
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Display environment whose state is set by the test or host.
#[derive(Debug, Clone, Default)]
pub struct StaticDisplayEnvironment {
    state: Arc<RwLock<DisplayState>>,
}

#[derive(Debug, Default)]
struct DisplayState {
    frames: HashMap<DisplayId, DisplayFrames>,
    animating: HashSet<TaskId>,
    refusing: HashSet<DisplayId>,
}

impl StaticDisplayEnvironment {
    /// Creates an environment without displays.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment with one display.
    #[must_use]
    pub fn with_display(display: DisplayId, frames: DisplayFrames) -> Self {
        let environment = Self::new();
        environment.set_frames(display, frames);
        environment
    }

    /// Replaces the frames of `display`.
    pub fn set_frames(&self, display: DisplayId, frames: DisplayFrames) {
        if let Ok(mut state) = self.state.write() {
            state.frames.insert(display, frames);
        }
    }

    /// Marks a transition involving `task` as running or finished.
    pub fn set_animating(&self, task: TaskId, animating: bool) {
        if let Ok(mut state) = self.state.write() {
            if animating {
                state.animating.insert(task);
            } else {
                state.animating.remove(&task);
            }
        }
    }

    /// Makes `display` refuse every task.
    pub fn refuse_tasks_on(&self, display: DisplayId) {
        if let Ok(mut state) = self.state.write() {
            state.refusing.insert(display);
        }
    }
}

impl DisplayEnvironment for StaticDisplayEnvironment {
    fn frames(&self, display: DisplayId) -> Option<DisplayFrames> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.frames.get(&display).copied())
    }

    fn is_animating(&self, task: TaskId) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.animating.contains(&task))
    }

    fn can_host_task(&self, display: DisplayId, _task: &Task) -> bool {
        self.state
            .read()
            .is_ok_and(|state| !state.refusing.contains(&display))
    }
}

/// Recents policy backed by fixed sets.
#[derive(Debug, Clone, Default)]
pub struct StaticRecentsPolicy {
    locked_profiles: HashSet<UserId>,
    allowlisted_packages: HashSet<String>,
}

impl StaticRecentsPolicy {
    /// Creates a policy with no locked profiles and an empty allowlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the profile of `user` as locked.
    #[must_use]
    pub fn with_locked_profile(mut self, user: UserId) -> Self {
        self.locked_profiles.insert(user);
        self
    }

    /// Allows lock-task mode for `package` without confirmation.
    #[must_use]
    pub fn with_allowlisted_package(mut self, package: impl Into<String>) -> Self {
        self.allowlisted_packages.insert(package.into());
        self
    }
}

impl RecentsPolicy for StaticRecentsPolicy {
    fn is_profile_locked(&self, user: UserId) -> bool {
        self.locked_profiles.contains(&user)
    }

    fn is_lock_task_allowlisted(&self, _user: UserId, package: &str) -> bool {
        self.allowlisted_packages.contains(package)
    }
}

/// Voice session owner that records finished sessions.
#[derive(Debug, Clone, Default)]
pub struct RecordingVoiceInteraction {
    state: Arc<RwLock<VoiceState>>,
}

#[derive(Debug, Default)]
struct VoiceState {
    finished: Vec<String>,
    unreachable: bool,
}

impl RecordingVoiceInteraction {
    /// Creates a reachable session owner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        if let Ok(mut state) = self.state.write() {
            state.unreachable = unreachable;
        }
    }

    /// Sessions finished so far.
    #[must_use]
    pub fn finished(&self) -> Vec<String> {
        self.state
            .read()
            .map(|state| state.finished.clone())
            .unwrap_or_default()
    }
}

impl VoiceInteraction for RecordingVoiceInteraction {
    fn finish_session(&self, session: &str) -> Result<(), VoiceSessionError> {
        let mut state = self.state.write().map_err(|err| VoiceSessionError {
            session: session.to_owned(),
            reason: err.to_string(),
        })?;
        if state.unreachable {
            return Err(VoiceSessionError {
                session: session.to_owned(),
                reason: "session owner is gone".to_owned(),
            });
        }
        state.finished.push(session.to_owned());
        Ok(())
    }
}
