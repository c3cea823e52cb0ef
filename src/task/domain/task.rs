//! Task aggregate: identity, intent metadata, geometry state, policy flags
//! and the ordered activity history.

use super::{
    ActivityId, ActivityInfo, ActivityRecord, ActivityState, ActivityType, ComponentName,
    DisplayId, DocumentLaunchMode, Intent, IntentFlags, LaunchMode, LockTaskAuth,
    PersistableMode, PersistedActivityData, ProcessId, ResizeMode, TaskDescription,
    TaskDomainError, TaskId, TaskLifecycleState, Uid, UserId,
};
use crate::container::{ChildList, ChildPosition, ConfigurationChange, ConfigurationContainer};
use crate::geometry::{
    Configuration, MinimumDimensions, Orientation, Rect, Rotation, WindowingMode, rotate_bounds,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, warn};

/// Parameter object for a task created by a launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLaunch {
    /// Metadata of the activity that starts the task.
    pub info: ActivityInfo,
    /// The launch intent, if any.
    pub intent: Option<Intent>,
    /// User that owns the task when the activity uid does not name one.
    pub user_id: UserId,
    /// Token of the voice session that started the task, if any.
    pub voice_session: Option<String>,
    /// Whether the owning user had finished device setup.
    pub user_setup_complete: bool,
}

impl TaskLaunch {
    /// Launch of `info` through `intent` for the system user.
    #[must_use]
    pub const fn new(info: ActivityInfo, intent: Intent) -> Self {
        Self {
            info,
            intent: Some(intent),
            user_id: UserId::SYSTEM,
            voice_session: None,
            user_setup_complete: true,
        }
    }
}

/// Parameter object for reconstructing a persisted task aggregate.
#[expect(
    clippy::struct_excessive_bools,
    reason = "mirrors the flat persisted attribute set"
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Root intent.
    pub intent: Option<Intent>,
    /// Intent that established the task affinity, when different.
    pub affinity_intent: Option<Intent>,
    /// Component actually running at the root.
    pub real_activity: Option<ComponentName>,
    /// Whether the root's package was suspended.
    pub real_activity_suspended: bool,
    /// Alias component that launched the root, if any.
    pub orig_activity: Option<ComponentName>,
    /// Current affinity.
    pub affinity: Option<String>,
    /// Affinity of the first root.
    pub root_affinity: Option<String>,
    /// Whether the root was ever reset.
    pub root_was_reset: bool,
    /// Whether the task leaves recents once emptied.
    pub auto_remove_recents: bool,
    /// Whether the user was asked about compatibility mode.
    pub asked_compat_mode: bool,
    /// Owning user.
    pub user_id: UserId,
    /// Whether the owning user had finished setup.
    pub user_setup_complete: bool,
    /// Uid the task runs as.
    pub effective_uid: Uid,
    /// Last description text.
    pub last_description: Option<String>,
    /// Signed timestamp of the last move, in milliseconds.
    pub last_time_moved: i64,
    /// Whether the first root kept the task identity.
    pub never_relinquish_identity: bool,
    /// Affiliation group identifier.
    pub affiliated_task_id: TaskId,
    /// Previous task in the affiliation chain.
    pub prev_affiliate: Option<TaskId>,
    /// Next task in the affiliation chain.
    pub next_affiliate: Option<TaskId>,
    /// Affiliation colour.
    pub affiliated_task_color: u32,
    /// Uid that launched the root.
    pub calling_uid: Uid,
    /// Package that launched the root.
    pub calling_package: Option<String>,
    /// Whether the task supports picture-in-picture.
    pub supports_picture_in_picture: bool,
    /// Resize policy.
    pub resize_mode: ResizeMode,
    /// Last bounds used in a bounds-persisting windowing mode.
    pub last_non_fullscreen_bounds: Option<Rect>,
    /// Minimum width in pixels.
    pub min_width: Option<i32>,
    /// Minimum height in pixels.
    pub min_height: Option<i32>,
    /// Presentation metadata.
    pub task_description: TaskDescription,
    /// Persisted activities, bottom first.
    pub activities: Vec<PersistedActivityData>,
}

/// Outcome of removing an activity from a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRemoval {
    /// The activity was not in the task.
    Absent,
    /// Regular activities remain.
    Remaining,
    /// Only task overlays remain and they should be finished.
    OnlyOverlaysRemain,
    /// The task is empty.
    Emptied {
        /// The task should be destroyed; `false` while a reuse is in progress.
        destroy: bool,
    },
}

/// Outcome of clearing a task down to a matching activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearOutcome {
    /// The activity that now sits on top, if it survived.
    pub survivor: Option<ActivityId>,
    /// Activities that were asked to finish, top first.
    pub finished: Vec<ActivityId>,
}

/// Summary of running activities in a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningActivityReport {
    /// Non-finishing activities with a live process.
    pub running: usize,
    /// Non-finishing activities.
    pub total: usize,
    /// Top activity, skipping initialising ones where possible.
    pub top: Option<ActivityId>,
    /// Bottom-most non-finishing activity.
    pub base: Option<ActivityId>,
}

/// Task aggregate root.
#[expect(
    clippy::struct_excessive_bools,
    reason = "task policy and lifecycle flags are independent"
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    user_id: UserId,
    effective_uid: Uid,
    intent: Option<Intent>,
    affinity_intent: Option<Intent>,
    affinity: Option<String>,
    root_affinity: Option<String>,
    real_activity: Option<ComponentName>,
    real_activity_suspended: bool,
    orig_activity: Option<ComponentName>,
    root_was_reset: bool,
    auto_remove_recents: bool,
    asked_compat_mode: bool,
    user_setup_complete: bool,
    never_relinquish_identity: bool,
    calling_uid: Uid,
    calling_package: Option<String>,
    last_description: Option<String>,
    last_time_moved: i64,
    last_active_time: DateTime<Utc>,
    affiliated_task_id: TaskId,
    affiliated_task_color: u32,
    prev_affiliate: Option<TaskId>,
    next_affiliate: Option<TaskId>,
    task_description: TaskDescription,
    resize_mode: ResizeMode,
    supports_picture_in_picture: bool,
    lock_task_auth: LockTaskAuth,
    activity_type: ActivityType,
    config: ConfigurationContainer,
    last_non_fullscreen_bounds: Option<Rect>,
    min_width: Option<i32>,
    min_height: Option<i32>,
    displayed_bounds: Option<Rect>,
    last_rotation: Option<Rotation>,
    last_display: Option<DisplayId>,
    children: ChildList<ActivityRecord>,
    ever_visible: bool,
    in_recents: bool,
    persistable: bool,
    reuse_in_progress: bool,
    max_recents: u32,
    root_process: Option<ProcessId>,
    voice_session: Option<String>,
    preserve_non_floating_state: bool,
    replace_windows_on_move: bool,
    state: TaskLifecycleState,
}

impl Task {
    /// Creates a task for a fresh launch. The root activity is added
    /// separately.
    #[must_use]
    pub fn launch(id: TaskId, launch: &TaskLaunch, clock: &impl Clock) -> Self {
        let mut task = Self::blank(id, launch.user_id, clock.utc());
        task.calling_uid = launch.info.uid;
        task.calling_package = Some(launch.info.component.package().to_owned());
        task.voice_session.clone_from(&launch.voice_session);
        task.user_setup_complete = launch.user_setup_complete;
        task.min_width = launch.info.min_width;
        task.min_height = launch.info.min_height;
        task.apply_intent(launch.intent.as_ref(), &launch.info);
        task
    }

    /// Reconstructs a task from persisted storage.
    ///
    /// `resolve` maps each persisted activity to its current metadata;
    /// activities it cannot resolve are dropped. The restored task adopts its
    /// last non-fullscreen bounds as requested bounds.
    #[must_use]
    pub fn from_persisted(
        data: PersistedTaskData,
        mut resolve: impl FnMut(&PersistedActivityData) -> Option<ActivityInfo>,
        clock: &impl Clock,
    ) -> Self {
        let mut task = Self::blank(data.id, data.user_id, clock.utc());
        task.effective_uid = data.effective_uid;
        task.intent = data.intent;
        task.affinity_intent = data.affinity_intent;
        task.affinity = data.affinity;
        task.root_affinity = data.root_affinity;
        task.real_activity = data.real_activity;
        task.real_activity_suspended = data.real_activity_suspended;
        task.orig_activity = data.orig_activity;
        task.root_was_reset = data.root_was_reset;
        task.auto_remove_recents = data.auto_remove_recents;
        task.asked_compat_mode = data.asked_compat_mode;
        task.user_setup_complete = data.user_setup_complete;
        task.never_relinquish_identity = data.never_relinquish_identity;
        task.calling_uid = data.calling_uid;
        task.calling_package = data.calling_package;
        task.last_description = data.last_description;
        task.last_time_moved = data.last_time_moved;
        task.affiliated_task_id = data.affiliated_task_id;
        task.affiliated_task_color = data.affiliated_task_color;
        task.prev_affiliate = data.prev_affiliate;
        task.next_affiliate = data.next_affiliate;
        task.task_description = data.task_description;
        task.resize_mode = data.resize_mode;
        task.supports_picture_in_picture = data.supports_picture_in_picture;
        task.last_non_fullscreen_bounds = data.last_non_fullscreen_bounds;
        task.min_width = data.min_width;
        task.min_height = data.min_height;
        task.config.set_requested_bounds(data.last_non_fullscreen_bounds);
        task.persistable = true;
        task.ever_visible = true;

        for persisted in data.activities {
            let Some(info) = resolve(&persisted) else {
                warn!(task = %data.id, activity = %persisted.id, "dropping unresolvable activity on restore");
                continue;
            };
            let mut record = ActivityRecord::from_persisted(persisted, info);
            if task.children.is_empty() {
                task.activity_type = standard_if_undefined(record.activity_type());
            }
            record.set_activity_type(task.activity_type);
            task.children.push_top(record);
        }
        task
    }

    fn blank(id: TaskId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            effective_uid: Uid::UNKNOWN,
            intent: None,
            affinity_intent: None,
            affinity: None,
            root_affinity: None,
            real_activity: None,
            real_activity_suspended: false,
            orig_activity: None,
            root_was_reset: false,
            auto_remove_recents: false,
            asked_compat_mode: false,
            user_setup_complete: true,
            never_relinquish_identity: true,
            calling_uid: Uid::UNKNOWN,
            calling_package: None,
            last_description: None,
            last_time_moved: 0,
            last_active_time: now,
            affiliated_task_id: id,
            affiliated_task_color: 0,
            prev_affiliate: None,
            next_affiliate: None,
            task_description: TaskDescription::default(),
            resize_mode: ResizeMode::Resizeable,
            supports_picture_in_picture: false,
            lock_task_auth: LockTaskAuth::Pinnable,
            activity_type: ActivityType::Undefined,
            config: ConfigurationContainer::new(),
            last_non_fullscreen_bounds: None,
            min_width: None,
            min_height: None,
            displayed_bounds: None,
            last_rotation: None,
            last_display: None,
            children: ChildList::new(),
            ever_visible: false,
            in_recents: false,
            persistable: false,
            reuse_in_progress: false,
            max_recents: 1,
            root_process: None,
            voice_session: None,
            preserve_non_floating_state: false,
            replace_windows_on_move: false,
            state: TaskLifecycleState::Unattached,
        }
    }

    /// Captures the persisted form of this task. Activities are truncated at
    /// the first one that must not be written.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedTaskData {
        PersistedTaskData {
            id: self.id,
            intent: self.intent.clone(),
            affinity_intent: self.affinity_intent.clone(),
            real_activity: self.real_activity.clone(),
            real_activity_suspended: self.real_activity_suspended,
            orig_activity: self.orig_activity.clone(),
            affinity: self.affinity.clone(),
            root_affinity: self.root_affinity.clone(),
            root_was_reset: self.root_was_reset,
            auto_remove_recents: self.auto_remove_recents,
            asked_compat_mode: self.asked_compat_mode,
            user_id: self.user_id,
            user_setup_complete: self.user_setup_complete,
            effective_uid: self.effective_uid,
            last_description: self.last_description.clone(),
            last_time_moved: self.last_time_moved,
            never_relinquish_identity: self.never_relinquish_identity,
            affiliated_task_id: self.affiliated_task_id,
            prev_affiliate: self.prev_affiliate,
            next_affiliate: self.next_affiliate,
            affiliated_task_color: self.affiliated_task_color,
            calling_uid: self.calling_uid,
            calling_package: self.calling_package.clone(),
            supports_picture_in_picture: self.supports_picture_in_picture,
            resize_mode: self.resize_mode,
            last_non_fullscreen_bounds: self.last_non_fullscreen_bounds,
            min_width: self.min_width,
            min_height: self.min_height,
            task_description: self.task_description.clone(),
            activities: self
                .persistable_activities()
                .map(ActivityRecord::to_persisted)
                .collect(),
        }
    }

    /// Activities written to persisted storage, bottom first.
    ///
    /// Stops at the first activity that is root-only or not persistable, or
    /// that starts a new unretained document above the bottom.
    pub fn persistable_activities(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.children
            .iter()
            .enumerate()
            .take_while(|(index, record)| {
                record.info().persistable_mode != PersistableMode::RootOnly
                    && record.is_persistable()
                    && !(*index > 0 && record.intent().flags().is_unretained_new_document())
            })
            .map(|(_, record)| record)
    }

    // Identity

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the uid the task runs as.
    #[must_use]
    pub const fn effective_uid(&self) -> Uid {
        self.effective_uid
    }

    /// Returns the root intent.
    #[must_use]
    pub const fn intent(&self) -> Option<&Intent> {
        self.intent.as_ref()
    }

    /// Returns the intent that established the affinity, if recorded.
    #[must_use]
    pub const fn affinity_intent(&self) -> Option<&Intent> {
        self.affinity_intent.as_ref()
    }

    /// Records the intent that established the affinity.
    pub fn set_affinity_intent(&mut self, intent: Option<Intent>) {
        self.affinity_intent = intent;
    }

    /// Returns the current affinity.
    #[must_use]
    pub fn affinity(&self) -> Option<&str> {
        self.affinity.as_deref()
    }

    /// Returns the affinity of the first root. Never changes once set.
    #[must_use]
    pub fn root_affinity(&self) -> Option<&str> {
        self.root_affinity.as_deref()
    }

    /// Returns the component running at the root.
    #[must_use]
    pub const fn real_activity(&self) -> Option<&ComponentName> {
        self.real_activity.as_ref()
    }

    /// Returns whether the root's package is suspended.
    #[must_use]
    pub const fn real_activity_suspended(&self) -> bool {
        self.real_activity_suspended
    }

    /// Records whether the root's package is suspended.
    pub const fn set_real_activity_suspended(&mut self, suspended: bool) {
        self.real_activity_suspended = suspended;
    }

    /// Returns the alias that launched the root, if any.
    #[must_use]
    pub const fn orig_activity(&self) -> Option<&ComponentName> {
        self.orig_activity.as_ref()
    }

    /// Returns whether a root launch asked for the task to be reset.
    #[must_use]
    pub const fn root_was_reset(&self) -> bool {
        self.root_was_reset
    }

    /// Returns whether the user was asked about compatibility mode.
    #[must_use]
    pub const fn asked_compat_mode(&self) -> bool {
        self.asked_compat_mode
    }

    /// Records that the user was asked about compatibility mode.
    pub const fn set_asked_compat_mode(&mut self, asked: bool) {
        self.asked_compat_mode = asked;
    }

    /// Returns whether the owning user had finished setup.
    #[must_use]
    pub const fn user_setup_complete(&self) -> bool {
        self.user_setup_complete
    }

    /// Returns whether the first root kept the task identity.
    #[must_use]
    pub const fn never_relinquish_identity(&self) -> bool {
        self.never_relinquish_identity
    }

    /// Returns the uid that launched the root.
    #[must_use]
    pub const fn calling_uid(&self) -> Uid {
        self.calling_uid
    }

    /// Returns the package that launched the root.
    #[must_use]
    pub fn calling_package(&self) -> Option<&str> {
        self.calling_package.as_deref()
    }

    /// Returns the last description text.
    #[must_use]
    pub fn last_description(&self) -> Option<&str> {
        self.last_description.as_deref()
    }

    /// Records the description text.
    pub fn set_last_description(&mut self, description: Option<String>) {
        self.last_description = description;
    }

    /// Returns the voice session token, if the task was started by voice.
    #[must_use]
    pub fn voice_session(&self) -> Option<&str> {
        self.voice_session.as_deref()
    }

    /// Returns the resize policy.
    #[must_use]
    pub const fn resize_mode(&self) -> ResizeMode {
        self.resize_mode
    }

    /// Returns whether the task supports picture-in-picture.
    #[must_use]
    pub const fn supports_picture_in_picture(&self) -> bool {
        self.supports_picture_in_picture
    }

    /// Returns the lock-task authorisation.
    #[must_use]
    pub const fn lock_task_auth(&self) -> LockTaskAuth {
        self.lock_task_auth
    }

    /// Returns the activity type established by the first activity.
    #[must_use]
    pub const fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    /// Returns the presentation metadata.
    #[must_use]
    pub const fn task_description(&self) -> &TaskDescription {
        &self.task_description
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TaskLifecycleState {
        self.state
    }

    /// Moves the lifecycle state machine.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when the move is not
    /// allowed.
    pub fn transition_to(&mut self, target: TaskLifecycleState) -> Result<(), TaskDomainError> {
        if self.state == target {
            return Ok(());
        }
        if !self.state.can_transition_to(target) {
            return Err(TaskDomainError::InvalidTransition {
                task: self.id,
                from: self.state,
                to: target,
            });
        }
        debug!(task = %self.id, from = %self.state, to = %target, "task state transition");
        self.state = target;
        Ok(())
    }

    // Intent-derived identity

    fn apply_intent(&mut self, intent: Option<&Intent>, info: &ActivityInfo) {
        if self.intent.is_none() {
            self.never_relinquish_identity = !info.relinquish_task_identity;
        } else if self.never_relinquish_identity {
            return;
        }

        let first_intent = self.intent.is_none();
        if info.uid.is_valid() {
            self.user_id = info.uid.user_id();
        }
        self.affinity.clone_from(&info.task_affinity);
        if first_intent {
            self.root_affinity.clone_from(&self.affinity);
        }
        self.effective_uid = info.uid;

        match (info.target_component(), intent) {
            (None, launch) => {
                self.intent = launch.cloned();
                self.real_activity = launch.and_then(Intent::component).cloned();
                self.orig_activity = None;
            }
            (Some(target), Some(launch)) => {
                self.intent = Some(launch.clone().with_component(Some(target.clone())));
                self.real_activity = Some(target);
                self.orig_activity = launch.component().cloned();
            }
            (Some(target), None) => {
                self.intent = None;
                self.real_activity = Some(target);
                self.orig_activity = Some(info.component.clone());
            }
        }

        let flags = self.intent.as_ref().map_or(IntentFlags::EMPTY, Intent::flags);
        if flags.contains(IntentFlags::RESET_TASK_IF_NEEDED) {
            self.root_was_reset = true;
        }
        self.auto_remove_recents = if info.auto_remove_from_recents {
            true
        } else if flags.is_unretained_new_document() {
            info.document_launch_mode == DocumentLaunchMode::None
        } else {
            false
        };
        self.resize_mode = info.resize_mode;
        self.supports_picture_in_picture = info.supports_picture_in_picture;
    }

    fn set_intent_from(&mut self, record: &ActivityRecord) {
        self.calling_uid = record.launched_from_uid();
        self.calling_package = record.launched_from_package().map(str::to_owned);
        self.apply_intent(Some(record.intent()), record.info());
    }

    /// Index of the activity that supplies the task identity: the last
    /// non-finishing activity walking up until one that keeps the identity.
    fn effective_root_index(&self) -> usize {
        let mut effective = 0;
        for (index, record) in self.children.iter().enumerate() {
            if record.is_finishing() {
                continue;
            }
            effective = index;
            if !record.info().relinquish_task_identity {
                break;
            }
        }
        effective
    }

    /// Re-derives identity and presentation from the effective root.
    pub fn update_effective_intent(&mut self) {
        let index = self.effective_root_index();
        if let Some(record) = self.children.get(index).cloned() {
            self.set_intent_from(&record);
        }
        self.update_task_description();
    }

    /// Derives lock-task authorisation from the effective root.
    ///
    /// `is_allowlisted` answers whether a package is on the lock-task
    /// allowlist of the task's user.
    pub fn update_lock_task_auth(&mut self, is_allowlisted: impl Fn(UserId, &str) -> bool) {
        let root = self.children.get(self.effective_root_index());
        let allowlisted = root
            .is_some_and(|record| is_allowlisted(self.user_id, record.component().package()));
        self.lock_task_auth =
            LockTaskAuth::derive(root.map(|record| record.info().lock_task_launch_mode), allowlisted);
    }

    /// Rebuilds the presentation metadata from the activities that share the
    /// task identity, top first, skipping overlays.
    pub fn update_task_description(&mut self) {
        let Some(end) = self.description_end() else {
            return;
        };
        let mut merged = TaskDescription::default();
        let mut top = true;
        for record in self.children.iter().take(end).rev() {
            if record.is_task_overlay() {
                continue;
            }
            if let Some(description) = record.task_description() {
                if merged.label.is_none() {
                    merged.label.clone_from(&description.label);
                }
                if merged.icon_filename.is_none() {
                    merged.icon_filename.clone_from(&description.icon_filename);
                }
                if merged.primary_color == 0 {
                    merged.primary_color = description.primary_color;
                }
                if top {
                    merged.background_color = description.background_color;
                }
            }
            top = false;
        }
        if self.id == self.affiliated_task_id {
            self.affiliated_task_color = merged.primary_color;
        }
        self.task_description = merged;
    }

    fn description_end(&self) -> Option<usize> {
        let len = self.children.len();
        let relinquish = self
            .children
            .bottom()
            .is_some_and(|record| record.info().relinquish_task_identity);
        let mut end = len.min(1);
        while let Some(record) = self.children.get(end) {
            if relinquish && !record.info().relinquish_task_identity {
                end = end.saturating_add(1);
                break;
            }
            if record.intent().flags().contains(IntentFlags::NEW_DOCUMENT) {
                break;
            }
            end = end.saturating_add(1);
        }
        (end > 0).then_some(end)
    }

    /// Whether the root launch asked to return home when the task finishes.
    #[must_use]
    pub fn returns_to_home_stack(&self) -> bool {
        self.intent.as_ref().is_some_and(|intent| {
            intent
                .flags()
                .contains(IntentFlags::NEW_TASK | IntentFlags::TASK_ON_HOME)
        })
    }

    // Children

    /// Activities, bottom first.
    #[must_use]
    pub const fn children(&self) -> &ChildList<ActivityRecord> {
        &self.children
    }

    /// Finds an activity by identifier.
    #[must_use]
    pub fn child(&self, id: ActivityId) -> Option<&ActivityRecord> {
        self.children.iter().find(|record| record.id() == id)
    }

    /// Finds an activity by identifier for mutation.
    pub fn child_mut(&mut self, id: ActivityId) -> Option<&mut ActivityRecord> {
        self.children.iter_mut().find(|record| record.id() == id)
    }

    /// Returns `true` when the task has no activities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Position at which a new activity actually lands: regular activities
    /// always go below the overlay suffix and overlays never go beneath it.
    #[must_use]
    pub fn adjusted_add_position(&self, record: &ActivityRecord, position: ChildPosition) -> usize {
        let len = self.children.len();
        let overlay_start = self
            .children
            .iter()
            .rposition(|child| !child.is_task_overlay())
            .map_or(0, |index| index.saturating_add(1));
        let requested = position.resolve(len);
        if record.is_task_overlay() {
            requested.max(overlay_start)
        } else {
            requested.min(overlay_start)
        }
    }

    /// Adds an activity, returning the index it landed at.
    ///
    /// The first activity establishes the task's activity type,
    /// persistability, calling identity and recents limit; later ones are
    /// coerced to the task's activity type. `max_recents_limit` caps the
    /// recents limit an activity may declare.
    pub fn add_child(
        &mut self,
        mut record: ActivityRecord,
        position: ChildPosition,
        max_recents_limit: u32,
    ) -> usize {
        if let Some(existing) = self.children.position(|child| child.id() == record.id()) {
            self.children.remove_at(existing);
        }
        if self.children.is_empty() {
            let activity_type = standard_if_undefined(record.activity_type());
            record.set_activity_type(activity_type);
            self.activity_type = activity_type;
            self.persistable = record.is_persistable();
            self.calling_uid = record.launched_from_uid();
            self.calling_package = record.launched_from_package().map(str::to_owned);
            self.max_recents = record.info().max_recents.clamp(1, max_recents_limit.max(1));
        } else {
            record.set_activity_type(self.activity_type);
        }
        let index = self.adjusted_add_position(&record, position);
        let landed = self.children.insert(index, record);
        self.update_effective_intent();
        landed
    }

    /// Removes an activity.
    pub fn remove_child(&mut self, id: ActivityId) -> ChildRemoval {
        if self.children.remove_where(|child| child.id() == id).is_none() {
            warn!(task = %self.id, activity = %id, "removing activity that is not in the task");
            return ChildRemoval::Absent;
        }
        if self.children.is_empty() {
            return ChildRemoval::Emptied {
                destroy: !self.reuse_in_progress,
            };
        }
        self.update_effective_intent();
        if self.only_has_task_overlay_activities(false) {
            ChildRemoval::OnlyOverlaysRemain
        } else {
            ChildRemoval::Remaining
        }
    }

    /// Finishes every activity above the topmost activity matching
    /// `component`.
    ///
    /// The match itself is finished too when it uses the standard launch
    /// mode and the launch neither asked for single-top nor reuses an
    /// existing document.
    pub fn perform_clear(&mut self, component: &ComponentName, launch_flags: IntentFlags) -> ClearOutcome {
        let Some(matched) = self
            .children
            .iter()
            .rposition(|record| !record.is_finishing() && record.component() == component)
        else {
            return ClearOutcome::default();
        };

        let mut outcome = ClearOutcome::default();
        for record in self.children.iter_mut().skip(matched.saturating_add(1)).rev() {
            if record.is_finishing() {
                continue;
            }
            record.finish();
            outcome.finished.push(record.id());
        }

        let Some(survivor) = self.children.get_mut(matched) else {
            return outcome;
        };
        let recreate = survivor.info().launch_mode == LaunchMode::Multiple
            && !launch_flags.contains(IntentFlags::SINGLE_TOP)
            && !launch_flags.is_document_launch_into_existing();
        if recreate {
            survivor.finish();
            outcome.finished.push(survivor.id());
        } else {
            outcome.survivor = Some(survivor.id());
        }
        outcome
    }

    /// Removes every activity top-down. Returns the activities that were
    /// not already finishing and the outcome of the last removal.
    pub fn clear_children(&mut self) -> (Vec<ActivityId>, ChildRemoval) {
        let ordered: Vec<(ActivityId, bool)> = self
            .children
            .iter()
            .rev()
            .map(|record| (record.id(), record.is_finishing()))
            .collect();
        let mut last = ChildRemoval::Absent;
        let mut finished = Vec::with_capacity(ordered.len());
        for (id, already_finishing) in ordered {
            last = self.remove_child(id);
            if !already_finishing {
                finished.push(id);
            }
        }
        (finished, last)
    }

    /// Bottom-most non-finishing activity.
    #[must_use]
    pub fn root_activity(&self) -> Option<&ActivityRecord> {
        self.children.iter().find(|record| !record.is_finishing())
    }

    /// Topmost non-finishing activity, optionally skipping overlays.
    #[must_use]
    pub fn top_activity(&self, include_overlays: bool) -> Option<&ActivityRecord> {
        self.children
            .iter()
            .rev()
            .find(|record| !record.is_finishing() && (include_overlays || !record.is_task_overlay()))
    }

    /// Topmost non-finishing activity whose process is running.
    #[must_use]
    pub fn top_running_activity(&self) -> Option<&ActivityRecord> {
        self.children
            .iter()
            .rev()
            .find(|record| !record.is_finishing() && record.has_process())
    }

    /// Returns `true` when every considered activity is a task overlay and
    /// at least one exists.
    #[must_use]
    pub fn only_has_task_overlay_activities(&self, exclude_finishing: bool) -> bool {
        let mut considered = self
            .children
            .iter()
            .filter(|record| !(exclude_finishing && record.is_finishing()))
            .peekable();
        considered.peek().is_some() && considered.all(ActivityRecord::is_task_overlay)
    }

    /// Topmost non-finishing activity running the task's real component.
    #[must_use]
    pub fn find_activity_in_history(&self, component: &ComponentName) -> Option<&ActivityRecord> {
        self.children
            .iter()
            .rev()
            .find(|record| !record.is_finishing() && record.component() == component)
    }

    /// Returns `true` when any activity belongs to `uid`.
    #[must_use]
    pub fn contains_app_uid(&self, uid: Uid) -> bool {
        self.children.iter().any(|record| record.info().uid == uid)
    }

    /// Counts running and live activities.
    #[must_use]
    pub fn running_activity_report(&self) -> RunningActivityReport {
        let mut report = RunningActivityReport::default();
        let mut top_initializing = false;
        for record in self.children.iter().rev().filter(|record| !record.is_finishing()) {
            report.base = Some(record.id());
            report.total = report.total.saturating_add(1);
            if report.top.is_none() || top_initializing {
                report.top = Some(record.id());
                top_initializing = record.state() == ActivityState::Initializing;
            }
            if record.has_process() {
                report.running = report.running.saturating_add(1);
            }
        }
        report
    }

    /// Whether the topmost regular activity, finishing or not, is shown to
    /// every user.
    #[must_use]
    pub fn show_for_all_users(&self) -> bool {
        self.children
            .iter()
            .rev()
            .find(|record| !record.is_task_overlay())
            .is_some_and(|record| record.info().show_for_all_users)
    }

    // Recents

    /// Returns whether the task is persisted in recents.
    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        self.persistable
    }

    /// Returns whether the task is in the recents list.
    #[must_use]
    pub const fn in_recents(&self) -> bool {
        self.in_recents
    }

    /// Records recents membership.
    pub const fn set_in_recents(&mut self, in_recents: bool) {
        self.in_recents = in_recents;
    }

    /// Returns the clamped recents limit established by the first activity.
    #[must_use]
    pub const fn max_recents(&self) -> u32 {
        self.max_recents
    }

    /// Returns whether any activity of the task was ever visible.
    #[must_use]
    pub const fn ever_visible(&self) -> bool {
        self.ever_visible
    }

    /// Records that the task became visible.
    pub const fn mark_visible(&mut self) {
        self.ever_visible = true;
    }

    /// Returns whether a bulk reuse is emptying the task.
    #[must_use]
    pub const fn reuse_in_progress(&self) -> bool {
        self.reuse_in_progress
    }

    /// Marks a bulk reuse in progress; an emptied task is then kept.
    pub const fn set_reuse_in_progress(&mut self, reuse: bool) {
        self.reuse_in_progress = reuse;
    }

    /// Returns whether the launch asked for auto removal.
    #[must_use]
    pub const fn auto_remove_recents(&self) -> bool {
        self.auto_remove_recents
    }

    /// Whether the task should leave recents: explicitly flagged, or empty
    /// and never shown.
    #[must_use]
    pub fn auto_remove_from_recents(&self) -> bool {
        self.auto_remove_recents || (self.children.is_empty() && !self.ever_visible)
    }

    /// Signed timestamp of the last move, negative for moves to the back.
    #[must_use]
    pub const fn last_time_moved(&self) -> i64 {
        self.last_time_moved
    }

    /// Time the task was last active.
    #[must_use]
    pub const fn last_active_time(&self) -> DateTime<Utc> {
        self.last_active_time
    }

    /// Stamps the active time.
    pub fn touch_active_time(&mut self, clock: &impl Clock) {
        self.last_active_time = clock.utc();
    }

    /// Stamps a move to the front or back. Only persisted tasks track moves.
    pub fn update_task_movement(&mut self, to_front: bool, clock: &impl Clock) {
        if !self.persistable {
            return;
        }
        let millis = clock.utc().timestamp_millis();
        self.last_time_moved = if to_front { millis } else { millis.saturating_neg() };
    }

    /// Process hosting the root activity.
    #[must_use]
    pub const fn root_process(&self) -> Option<ProcessId> {
        self.root_process
    }

    /// Associates the root process. Ignored when the task is excluded from
    /// recents. Returns `true` when recorded.
    pub fn set_root_process(&mut self, process: ProcessId) -> bool {
        self.root_process = None;
        let excluded = self.intent.as_ref().is_none_or(|intent| {
            intent.flags().contains(IntentFlags::EXCLUDE_FROM_RECENTS)
        });
        if excluded {
            return false;
        }
        self.root_process = Some(process);
        true
    }

    /// Drops the root process association.
    pub const fn clear_root_process(&mut self) {
        self.root_process = None;
    }

    // Affiliation

    /// Returns the affiliation group identifier.
    #[must_use]
    pub const fn affiliated_task_id(&self) -> TaskId {
        self.affiliated_task_id
    }

    /// Returns the affiliation colour.
    #[must_use]
    pub const fn affiliated_task_color(&self) -> u32 {
        self.affiliated_task_color
    }

    /// Returns the previous task in the affiliation chain.
    #[must_use]
    pub const fn prev_affiliate(&self) -> Option<TaskId> {
        self.prev_affiliate
    }

    /// Returns the next task in the affiliation chain.
    #[must_use]
    pub const fn next_affiliate(&self) -> Option<TaskId> {
        self.next_affiliate
    }

    pub(super) const fn set_prev_affiliate(&mut self, prev: Option<TaskId>) {
        self.prev_affiliate = prev;
    }

    pub(super) const fn set_next_affiliate(&mut self, next: Option<TaskId>) {
        self.next_affiliate = next;
    }

    pub(super) const fn set_affiliation(&mut self, id: TaskId, color: u32) {
        self.affiliated_task_id = id;
        self.affiliated_task_color = color;
    }

    // Geometry

    /// Configuration layers of the task.
    #[must_use]
    pub const fn configuration(&self) -> &ConfigurationContainer {
        &self.config
    }

    /// Resolved bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.config.bounds()
    }

    /// Requested bounds; empty means "fill the parent".
    #[must_use]
    pub const fn requested_bounds(&self) -> Rect {
        self.config.requested_bounds()
    }

    /// Effective windowing mode.
    #[must_use]
    pub const fn windowing_mode(&self) -> WindowingMode {
        self.config.windowing_mode()
    }

    /// Returns `true` when the task fills its parent.
    #[must_use]
    pub const fn matches_parent_bounds(&self) -> bool {
        self.config.requested_bounds().is_empty()
    }

    /// Sets the requested bounds. Returns `true` when they changed.
    pub fn set_requested_bounds(&mut self, bounds: Option<Rect>) -> bool {
        self.config.set_requested_bounds(bounds)
    }

    /// Sets the requested windowing mode.
    pub const fn set_requested_windowing_mode(&mut self, mode: WindowingMode) {
        self.config.set_requested_windowing_mode(mode);
    }

    /// Last bounds used in a bounds-persisting windowing mode.
    #[must_use]
    pub const fn last_non_fullscreen_bounds(&self) -> Option<Rect> {
        self.last_non_fullscreen_bounds
    }

    /// Declared minimum dimensions.
    #[must_use]
    pub const fn min_dimensions(&self) -> MinimumDimensions {
        MinimumDimensions {
            width: self.min_width,
            height: self.min_height,
        }
    }

    /// Orientation requested by the top regular activity.
    #[must_use]
    pub fn requested_orientation(&self) -> Orientation {
        self.top_activity(false)
            .map_or(Orientation::Undefined, ActivityRecord::requested_orientation)
    }

    /// Bounds to draw at: the displayed-bounds override when set.
    #[must_use]
    pub fn displayed_bounds(&self) -> Rect {
        self.displayed_bounds
            .filter(|bounds| !bounds.is_empty())
            .unwrap_or_else(|| self.bounds())
    }

    /// Sets or clears the transient displayed-bounds override.
    pub const fn set_displayed_bounds(&mut self, bounds: Option<Rect>) {
        self.displayed_bounds = bounds;
    }

    /// Returns `true` when a resize to `bounds` respects the orientation
    /// lock of the resize mode. Only free-floating tasks are constrained.
    #[must_use]
    pub fn can_resize_to_bounds(&self, bounds: Option<Rect>) -> bool {
        let Some(target) = bounds else {
            return true;
        };
        if self.windowing_mode() != WindowingMode::Freeform {
            return true;
        }
        let landscape = target.is_landscape();
        match self.resize_mode {
            ResizeMode::ForceResizablePreserveOrientation => {
                let current = self.requested_bounds();
                current.is_empty() || landscape == current.is_landscape()
            }
            ResizeMode::ForceResizablePortraitOnly => !landscape,
            ResizeMode::ForceResizableLandscapeOnly => landscape,
            _ => true,
        }
    }

    /// Validates a resize request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::BoundsViolateOrientationLock`] when
    /// [`Self::can_resize_to_bounds`] rejects the bounds.
    pub fn check_resize(&self, bounds: Option<Rect>) -> Result<(), TaskDomainError> {
        match bounds {
            Some(target) if !self.can_resize_to_bounds(bounds) => {
                Err(TaskDomainError::BoundsViolateOrientationLock {
                    task: self.id,
                    bounds: target,
                    resize_mode: self.resize_mode,
                })
            }
            _ => Ok(()),
        }
    }

    /// Whether the task may be resized. `force_resizable` applies the
    /// device-wide override.
    #[must_use]
    pub const fn is_resizeable(&self, check_pip: bool, force_resizable: bool) -> bool {
        force_resizable
            || self.resize_mode.is_resizeable_mode()
            || (check_pip && self.supports_picture_in_picture)
    }

    /// Whether interactive resizing keeps the current orientation.
    #[must_use]
    pub const fn preserve_orientation_on_resize(&self) -> bool {
        self.resize_mode.is_preserve_orientation_mode()
    }

    /// Whether the task can enter split screen.
    #[must_use]
    pub const fn supports_split_screen(&self, force_resizable: bool, split_supported: bool) -> bool {
        self.activity_type.is_standard_or_undefined()
            && split_supported
            && (force_resizable
                || (self.is_resizeable(false, false) && !self.preserve_orientation_on_resize()))
    }

    /// Bounds a new launch into this task should use, given the requested
    /// bounds of the owning stack.
    #[must_use]
    pub fn launch_bounds(&self, stack_bounds: Rect, force_resizable: bool) -> Option<Rect> {
        let mode = self.windowing_mode();
        let resizeable = self.is_resizeable(true, force_resizable);
        if !self.activity_type.is_standard_or_undefined()
            || mode == WindowingMode::Fullscreen
            || (mode == WindowingMode::SplitScreenPrimary && !resizeable)
        {
            return resizeable.then_some(stack_bounds);
        }
        if !mode.persists_bounds() {
            return Some(stack_bounds);
        }
        self.last_non_fullscreen_bounds
    }

    /// Checks that the task may live in a stack of `stack_mode`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotResizeable`] when a non-resizeable task
    /// would enter a freeform stack.
    pub const fn ensure_fits_stack(
        &self,
        stack_mode: WindowingMode,
        force_resizable: bool,
    ) -> Result<(), TaskDomainError> {
        let freeform = matches!(stack_mode, WindowingMode::Freeform);
        if freeform && !self.is_resizeable(true, force_resizable) {
            return Err(TaskDomainError::NotResizeable(self.id));
        }
        Ok(())
    }

    /// Bounds for entering a stack of `stack_mode`.
    ///
    /// Freeform stacks keep existing bounds, fall back to the last
    /// non-fullscreen bounds and finally to `fresh_layout`. Other stacks
    /// impose their own requested bounds.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotResizeable`] when a non-resizeable task
    /// is placed in a freeform stack.
    pub fn bounds_for_stack(
        &self,
        stack_mode: WindowingMode,
        stack_bounds: Rect,
        fresh_layout: impl FnOnce() -> Rect,
        force_resizable: bool,
    ) -> Result<Option<Rect>, TaskDomainError> {
        if stack_mode != WindowingMode::Freeform {
            return Ok(Some(stack_bounds));
        }
        self.ensure_fits_stack(stack_mode, force_resizable)?;
        if !self.matches_parent_bounds() {
            return Ok(None);
        }
        Ok(Some(
            self.last_non_fullscreen_bounds
                .filter(|bounds| !bounds.is_empty())
                .unwrap_or_else(fresh_layout),
        ))
    }

    /// Restores the remembered bounds when the task is about to enter a
    /// bounds-persisting windowing mode under `parent`.
    pub fn restore_bounds_for_parent(&mut self, parent: &Configuration) {
        let was_persisting = self.windowing_mode().persists_bounds();
        let next_persisting = self.config.requested_override().windowing_mode.persists_bounds()
            || parent.windowing_mode.persists_bounds();
        if !was_persisting && next_persisting {
            if let Some(last) = self.last_non_fullscreen_bounds.filter(|last| !last.is_empty()) {
                self.config.set_requested_bounds(Some(last));
            }
        }
    }

    /// Stores a resolved override and recomputes the full configuration.
    ///
    /// While in a bounds-persisting mode, non-empty requested bounds are
    /// remembered as the last non-fullscreen bounds.
    pub fn apply_resolved_configuration(
        &mut self,
        parent: &Configuration,
        resolved: Configuration,
    ) -> ConfigurationChange {
        let change = self.config.apply_resolved(parent, resolved);
        if self.windowing_mode().persists_bounds() {
            let requested = self.requested_bounds();
            if !requested.is_empty() {
                self.last_non_fullscreen_bounds = Some(requested);
            }
        }
        change
    }

    /// Target bounds aligning the task with `adjusted`, or `None` when the
    /// task cannot or need not move.
    #[must_use]
    pub fn aligned_bounds(&self, adjusted: Rect, align_bottom: bool, force_resizable: bool) -> Option<Rect> {
        if !self.is_resizeable(true, force_resizable)
            || *self.config.requested_override() == Configuration::EMPTY
        {
            return None;
        }
        let current = self.bounds();
        Some(if align_bottom {
            current.offset(0, adjusted.bottom - current.bottom)
        } else {
            current.offset_to(adjusted.left, adjusted.top)
        })
    }

    /// Rotation the task's bounds were last laid out for.
    #[must_use]
    pub const fn last_rotation(&self) -> Option<Rotation> {
        self.last_rotation
    }

    /// Display the rotation snapshot belongs to.
    #[must_use]
    pub const fn last_display(&self) -> Option<DisplayId> {
        self.last_display
    }

    /// Tracks a display rotation and returns bounds that keep the task at
    /// the same physical position, when it must move.
    ///
    /// Moving to another display only resets the snapshot. Tasks that fill
    /// their parent or cannot resize independently follow the parent.
    pub fn adjust_for_display_rotation(
        &mut self,
        display: DisplayId,
        rotation: Rotation,
        display_width: i32,
        display_height: i32,
    ) -> Option<Rect> {
        let previous = self.last_rotation;
        let same_display = self.last_display == Some(display);
        self.last_display = Some(display);
        self.last_rotation = Some(rotation);
        let from = previous.filter(|_| same_display)?;
        if from == rotation || self.matches_parent_bounds() || !self.windowing_mode().can_resize_task() {
            return None;
        }
        Some(rotate_bounds(
            self.requested_bounds(),
            from,
            rotation,
            display_width,
            display_height,
        ))
    }

    /// Whether non-floating inset state is kept after entering a pinned stack.
    #[must_use]
    pub const fn preserve_non_floating_state(&self) -> bool {
        self.preserve_non_floating_state
    }

    /// Records whether non-floating inset state is kept.
    pub const fn set_preserve_non_floating_state(&mut self, preserve: bool) {
        self.preserve_non_floating_state = preserve;
    }

    /// Whether window surfaces are replaced during the current move.
    #[must_use]
    pub const fn replace_windows_on_move(&self) -> bool {
        self.replace_windows_on_move
    }

    /// Records whether window surfaces are replaced during a move.
    pub const fn set_replace_windows_on_move(&mut self, replace: bool) {
        self.replace_windows_on_move = replace;
    }

    /// Whether any activity still has window surfaces.
    #[must_use]
    pub fn has_windows_alive(&self) -> bool {
        self.children.iter().any(ActivityRecord::has_windows_alive)
    }

    /// Sets the effective uid, for records restored without one.
    pub const fn set_effective_uid(&mut self, uid: Uid) {
        self.effective_uid = uid;
    }

    /// Re-applies an intent from a matching activity info. Used when the
    /// root launch is reset.
    pub fn set_intent(&mut self, intent: Option<&Intent>, info: &ActivityInfo) {
        self.apply_intent(intent, info);
    }
}

const fn standard_if_undefined(activity_type: ActivityType) -> ActivityType {
    match activity_type {
        ActivityType::Undefined => ActivityType::Standard,
        other => other,
    }
}
