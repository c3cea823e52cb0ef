//! Service layer for task creation, membership and removal.

use super::{DefaultTaskFactory, TaskFactory, TaskPolicyConfig};
use crate::container::{ChildPosition, ConfigurationChange};
use crate::geometry::{
    Configuration, Rect, ResolveRequest, WindowingMode, resolve_override_configuration,
};
use crate::task::{
    domain::{
        ActivityId, ActivityRecord, ActivityRef, ActivityType, AffiliationRepair, ChildRemoval,
        ClearOutcome, ComponentName, DisplayId, DisplayNode, IntentFlags, ProcessId, Stack,
        StackId, Task, TaskDomainError, TaskEvent, TaskId, TaskLaunch, TaskLifecycleState,
        WindowHierarchy, affiliation,
    },
    persistence::{RecordCodecError, RecordElement, TaskRecordCodec},
    ports::{
        DisplayEnvironment, PackageResolver, PersistRequest, RecentsPolicy, TaskEventSink,
        TaskPersistQueue, TaskRecordStore, TaskRecordStoreError, VoiceInteraction,
    },
};
use mockable::Clock;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// A persisted record could not be decoded.
    #[error(transparent)]
    Codec(#[from] RecordCodecError),
    /// The record store failed.
    #[error(transparent)]
    Store(#[from] TaskRecordStoreError),
    /// A previous mutation panicked while holding the hierarchy lock.
    #[error("task hierarchy lock poisoned")]
    LockPoisoned,
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Collaborators the lifecycle service reports to and queries.
#[derive(Clone)]
pub struct TaskPorts {
    /// Receives event batches.
    pub events: Arc<dyn TaskEventSink>,
    /// Display geometry and animation state.
    pub display: Arc<dyn DisplayEnvironment>,
    /// Profile lock and lock-task allowlist.
    pub recents: Arc<dyn RecentsPolicy>,
    /// Installed activities.
    pub packages: Arc<dyn PackageResolver>,
    /// Voice session owners.
    pub voice: Arc<dyn VoiceInteraction>,
    /// Asynchronous persistence.
    pub persistence: Arc<dyn TaskPersistQueue>,
}

/// Task lifecycle orchestration service.
///
/// Every mutation runs under one hierarchy lock inside a layout-deferral
/// scope; the events it produces are published as a single batch after the
/// lock is released.
pub struct TaskLifecycleService<C>
where
    C: Clock + Send + Sync,
{
    hierarchy: Mutex<WindowHierarchy>,
    pub(super) ports: TaskPorts,
    pub(super) config: TaskPolicyConfig,
    factory: Arc<dyn TaskFactory<C>>,
    codec: TaskRecordCodec,
    pub(super) clock: Arc<C>,
}

impl<C> TaskLifecycleService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a service over an empty hierarchy.
    #[must_use]
    pub fn new(ports: TaskPorts, clock: Arc<C>) -> Self {
        Self {
            hierarchy: Mutex::new(WindowHierarchy::new()),
            ports,
            config: TaskPolicyConfig::default(),
            factory: Arc::new(DefaultTaskFactory),
            codec: TaskRecordCodec::new(),
            clock,
        }
    }

    /// Replaces the policy configuration.
    #[must_use]
    pub const fn with_config(mut self, config: TaskPolicyConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the task factory.
    #[must_use]
    pub fn with_factory(mut self, factory: Arc<dyn TaskFactory<C>>) -> Self {
        self.factory = factory;
        self
    }

    /// Replaces the record codec.
    #[must_use]
    pub fn with_codec(mut self, codec: TaskRecordCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Active policy configuration.
    #[must_use]
    pub const fn config(&self) -> &TaskPolicyConfig {
        &self.config
    }

    // Scaffolding

    fn lock(&self) -> TaskLifecycleResult<MutexGuard<'_, WindowHierarchy>> {
        self.hierarchy
            .lock()
            .map_err(|_| TaskLifecycleError::LockPoisoned)
    }

    /// Runs `op` under the hierarchy lock inside a layout-deferral scope and
    /// publishes the resulting batch once the lock is released.
    pub(super) fn mutate<R>(
        &self,
        op: impl FnOnce(&mut WindowHierarchy) -> TaskLifecycleResult<R>,
    ) -> TaskLifecycleResult<R> {
        let (result, batch) = {
            let mut hierarchy = self.lock()?;
            hierarchy.defer_layout();
            let result = op(&mut hierarchy);
            (result, hierarchy.continue_layout())
        };
        if let Some(events) = batch {
            self.publish(&events);
        }
        result
    }

    fn publish(&self, events: &[TaskEvent]) {
        if let Err(err) = self.ports.events.publish(events) {
            warn!(error = %err, events = events.len(), "task event delivery failed");
        }
    }

    /// Reads the hierarchy under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::LockPoisoned`] when the lock is poisoned.
    pub fn inspect<R>(&self, read: impl FnOnce(&WindowHierarchy) -> R) -> TaskLifecycleResult<R> {
        let hierarchy = self.lock()?;
        Ok(read(&hierarchy))
    }

    /// Returns a copy of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn task(&self, id: TaskId) -> TaskLifecycleResult<Task> {
        self.inspect(|hierarchy| hierarchy.task(id).cloned())?
            .ok_or_else(|| TaskDomainError::UnknownTask(id).into())
    }

    /// Opens a layout-deferral scope spanning several service calls.
    ///
    /// Events from every call made while the returned guard is alive are
    /// published together when it drops.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::LockPoisoned`] when the lock is poisoned.
    pub fn defer_layout(&self) -> TaskLifecycleResult<LayoutDeferral<'_, C>> {
        self.lock()?.defer_layout();
        Ok(LayoutDeferral { service: self })
    }

    fn continue_layout(&self) {
        let batch = match self.lock() {
            Ok(mut hierarchy) => hierarchy.continue_layout(),
            Err(err) => {
                warn!(error = %err, "could not close layout deferral");
                None
            }
        };
        if let Some(events) = batch {
            self.publish(&events);
        }
    }

    pub(super) fn schedule_persist(&self, hierarchy: &WindowHierarchy, id: TaskId) {
        let Some(task) = hierarchy.task(id) else {
            return;
        };
        if !task.is_persistable() {
            return;
        }
        let request = if task.in_recents() {
            PersistRequest::Save {
                task: id,
                record: TaskRecordCodec::encode(task),
            }
        } else {
            PersistRequest::Remove { task: id }
        };
        if let Err(err) = self.ports.persistence.enqueue(request) {
            warn!(task = %id, error = %err, "task persistence request dropped");
        }
    }

    fn update_lock_task_auth(&self, task: &mut Task) {
        let recents = &self.ports.recents;
        task.update_lock_task_auth(|user, package| recents.is_lock_task_allowlisted(user, package));
    }

    /// Re-resolves the configuration of `id` against its stack.
    pub(super) fn resolve_task_configuration(
        &self,
        hierarchy: &mut WindowHierarchy,
        id: TaskId,
    ) -> TaskLifecycleResult<ConfigurationChange> {
        let Some(parent) = hierarchy.parent_configuration(id) else {
            return Ok(ConfigurationChange::default());
        };
        let parent_stack = hierarchy.stack_of(id).and_then(|stack| hierarchy.stack(stack));
        let display = parent_stack.map(Stack::display);
        // Pinned bounds are owned by the system and never grown.
        let enforce_default_min_size =
            parent_stack.is_some_and(|stack| stack.windowing_mode() != WindowingMode::Pinned);
        let frames = display.and_then(|display| self.ports.display.frames(display));
        let rotation = display
            .and_then(|display| hierarchy.display(display))
            .map(DisplayNode::rotation);
        let policy = self.config.resolver_policy();
        let task = hierarchy.require_task_mut(id)?;
        if let (Some(display), Some(rotation)) = (display, rotation) {
            if task.last_display() != Some(display) || task.last_rotation().is_none() {
                // Only starts the rotation snapshot; nothing moves.
                task.adjust_for_display_rotation(display, rotation, 0, 0);
            }
        }
        task.restore_bounds_for_parent(&parent);
        let requested = *task.configuration().requested_override();
        let request = ResolveRequest {
            parent: &parent,
            requested: &requested,
            previous_bounds: task.configuration().resolved_override().bounds,
            min_dimensions: task.min_dimensions(),
            enforce_default_min_size,
            child_orientation: task.requested_orientation(),
            parent_handles_orientation: !self.config.letterbox_fullscreen,
            display: frames,
        };
        let resolved = resolve_override_configuration(&request, &policy);
        Ok(task.apply_resolved_configuration(&parent, resolved))
    }

    /// Pushes a configuration change into the top running activity. Returns
    /// `false` when it had to be relaunched.
    pub(super) fn reconfigure_top_activity(
        hierarchy: &mut WindowHierarchy,
        id: TaskId,
        change: ConfigurationChange,
    ) -> TaskLifecycleResult<bool> {
        let task = hierarchy.require_task_mut(id)?;
        let Some(top) = task.top_running_activity().map(ActivityRecord::id) else {
            return Ok(true);
        };
        let kept = task
            .child_mut(top)
            .is_none_or(|record| record.ensure_configuration(change));
        if !kept {
            hierarchy.record(TaskEvent::ActivityRelaunched {
                task: id,
                activity: top,
            });
        }
        Ok(kept)
    }

    // Displays and stacks

    /// Registers a display.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Hierarchy`] when the display exists.
    pub fn add_display(&self, display: DisplayId, config: Configuration) -> TaskLifecycleResult<()> {
        self.mutate(|hierarchy| Ok(hierarchy.add_display(DisplayNode::new(display, config))?))
    }

    /// Creates a stack on `display`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownDisplay`] when the display is
    /// missing.
    pub fn create_stack(
        &self,
        display: DisplayId,
        windowing_mode: WindowingMode,
        activity_type: ActivityType,
        position: ChildPosition,
    ) -> TaskLifecycleResult<StackId> {
        self.mutate(|hierarchy| {
            let id = hierarchy.next_stack_id();
            hierarchy.add_stack(Stack::new(id, display, windowing_mode, activity_type), position)?;
            let display_id = display;
            debug!(stack = %id, display = %display_id, mode = %windowing_mode, "stack created");
            Ok(id)
        })
    }

    /// Sets the requested bounds of a stack and re-resolves its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownStack`] when the stack is missing.
    pub fn set_stack_bounds(
        &self,
        stack: StackId,
        bounds: Option<Rect>,
    ) -> TaskLifecycleResult<()> {
        self.mutate(|hierarchy| {
            let entry = hierarchy
                .stack_mut(stack)
                .ok_or(TaskDomainError::UnknownStack(stack))?;
            let display = entry.display();
            entry.configuration_mut().set_requested_bounds(bounds);
            hierarchy.refresh_stack_configurations(display);
            for task in hierarchy.tasks_in(stack) {
                let change = self.resolve_task_configuration(hierarchy, task)?;
                Self::reconfigure_top_activity(hierarchy, task, change)?;
                if change.changed {
                    let resolved = hierarchy.require_task_mut(task)?.bounds();
                    hierarchy.record(TaskEvent::TaskBoundsChanged {
                        task,
                        bounds: resolved,
                    });
                }
            }
            hierarchy.record(TaskEvent::LayoutRequested);
            Ok(())
        })
    }

    /// Records which activity is resumed in `stack`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownStack`] when the stack is missing.
    pub fn set_resumed_activity(
        &self,
        stack: StackId,
        resumed: Option<ActivityRef>,
    ) -> TaskLifecycleResult<()> {
        self.mutate(|hierarchy| {
            hierarchy
                .stack_mut(stack)
                .ok_or(TaskDomainError::UnknownStack(stack))?
                .set_resumed(resumed);
            Ok(())
        })
    }

    // Creation and restore

    /// Creates a task for `launch` inside `stack`.
    ///
    /// The root activity is added separately with [`Self::add_activity`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownStack`] when the stack is missing.
    pub fn create_task(
        &self,
        launch: &TaskLaunch,
        stack: StackId,
        position: ChildPosition,
    ) -> TaskLifecycleResult<TaskId> {
        self.mutate(|hierarchy| {
            if hierarchy.stack(stack).is_none() {
                return Err(TaskDomainError::UnknownStack(stack).into());
            }
            let id = hierarchy.next_task_id()?;
            let mut task = self.factory.create(id, launch, &*self.clock);
            self.update_lock_task_auth(&mut task);
            let real_activity = task.real_activity().cloned();
            hierarchy.insert_task(task)?;
            hierarchy.place_task(id, stack, position)?;
            hierarchy.require_task_mut(id)?.transition_to(TaskLifecycleState::Attached)?;
            self.resolve_task_configuration(hierarchy, id)?;
            hierarchy.add_to_recents(id);
            hierarchy.record(TaskEvent::TaskCreated {
                task: id,
                real_activity,
            });
            hierarchy.record(TaskEvent::TaskStackChanged);
            info!(task = %id, stack = %stack, "task created");
            Ok(id)
        })
    }

    fn decode_task(&self, record: RecordElement) -> TaskLifecycleResult<Task> {
        let data = self.codec.decode_data(record, self.ports.packages.as_ref())?;
        let packages = &self.ports.packages;
        let mut task = self.factory.restore(
            data,
            &mut |activity| packages.resolve_activity(&activity.intent, activity.user_id),
            &*self.clock,
        );
        self.update_lock_task_auth(&mut task);
        Ok(task)
    }

    fn admit_restored(
        &self,
        hierarchy: &mut WindowHierarchy,
        task: Task,
        stack: Option<StackId>,
    ) -> TaskLifecycleResult<TaskId> {
        let id = task.id();
        if let Some(target) = stack {
            let mode = hierarchy
                .stack(target)
                .map(Stack::windowing_mode)
                .ok_or(TaskDomainError::UnknownStack(target))?;
            task.ensure_fits_stack(mode, self.config.force_resizable_activities)?;
        }
        let real_activity = task.real_activity().cloned();
        hierarchy.insert_task(task)?;
        hierarchy.add_to_recents(id);
        if let Some(target) = stack {
            hierarchy.place_task(id, target, ChildPosition::Top)?;
            hierarchy.require_task_mut(id)?.transition_to(TaskLifecycleState::Attached)?;
            self.resolve_task_configuration(hierarchy, id)?;
            hierarchy.record(TaskEvent::TaskCreated {
                task: id,
                real_activity,
            });
        }
        Ok(id)
    }

    /// Restores one persisted task, optionally placing it in `stack`.
    ///
    /// Without a stack the task is listed in recents only.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Codec`] when the record cannot be
    /// decoded, or [`TaskDomainError`] when the task id is taken, the stack
    /// is missing or a non-resizeable task would enter a freeform stack.
    pub fn restore_task(
        &self,
        record: RecordElement,
        stack: Option<StackId>,
    ) -> TaskLifecycleResult<TaskId> {
        let task = self.decode_task(record)?;
        self.mutate(|hierarchy| self.admit_restored(hierarchy, task, stack))
    }

    /// Restores every task in `store` into the recents list.
    ///
    /// Records that fail to decode are skipped with a warning. Restored tasks
    /// are listed most recently moved first and their affiliation chains are
    /// repaired.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when the store cannot be read.
    pub async fn restore_from_store(
        &self,
        store: &dyn TaskRecordStore,
    ) -> TaskLifecycleResult<Vec<TaskId>> {
        let records = store.load_all().await?;
        let mut tasks = Vec::with_capacity(records.len());
        for (id, record) in records {
            match self.decode_task(record) {
                Ok(task) => tasks.push(task),
                Err(err) => warn!(task = %id, error = %err, "skipping unrestorable task record"),
            }
        }
        tasks.sort_by_key(Task::last_time_moved);
        self.mutate(|hierarchy| {
            let mut restored = Vec::with_capacity(tasks.len());
            for task in tasks {
                let id = task.id();
                match self.admit_restored(hierarchy, task, None) {
                    Ok(admitted) => restored.push(admitted),
                    Err(err) => warn!(task = %id, error = %err, "skipping restored task"),
                }
            }
            let repairs = affiliation::repair_chains(hierarchy.tasks_mut());
            if !repairs.is_empty() {
                warn!(repairs = repairs.len(), "repaired affiliation chains after restore");
            }
            restored.reverse();
            info!(tasks = restored.len(), "restored tasks from storage");
            Ok(restored)
        })
    }

    // Children

    /// Adds an activity to a task and returns the index it landed at.
    ///
    /// Adding to a task that is waiting for removal cancels the removal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn add_activity(
        &self,
        id: TaskId,
        record: ActivityRecord,
        position: ChildPosition,
    ) -> TaskLifecycleResult<usize> {
        self.mutate(|hierarchy| {
            let max_recents = self.config.max_recents_limit;
            let task = hierarchy.require_task_mut(id)?;
            if task.state() == TaskLifecycleState::PendingRemoval {
                task.transition_to(TaskLifecycleState::Attached)?;
                debug!(task = %id, "pending removal cancelled by new activity");
            }
            let index = task.add_child(record, position, max_recents);
            self.update_lock_task_auth(task);
            if task.state().is_attached() {
                let change = self.resolve_task_configuration(hierarchy, id)?;
                Self::reconfigure_top_activity(hierarchy, id, change)?;
            }
            self.schedule_persist(hierarchy, id);
            Ok(index)
        })
    }

    /// Removes an activity from a task.
    ///
    /// When only overlays remain they are asked to finish and the supervisor
    /// is asked to remove the task. When the task empties outside a reuse it
    /// is removed, or parked in [`TaskLifecycleState::PendingRemoval`] while
    /// its surfaces or transition are still alive.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn remove_activity(
        &self,
        id: TaskId,
        activity: ActivityId,
    ) -> TaskLifecycleResult<ChildRemoval> {
        self.mutate(|hierarchy| {
            let task = hierarchy.require_task_mut(id)?;
            let outcome = task.remove_child(activity);
            match outcome {
                ChildRemoval::Absent => {}
                ChildRemoval::Remaining => {
                    self.update_lock_task_auth(task);
                    self.schedule_persist(hierarchy, id);
                }
                ChildRemoval::OnlyOverlaysRemain => {
                    let overlays: Vec<_> = task
                        .children()
                        .iter()
                        .filter(|child| !child.is_finishing())
                        .map(ActivityRecord::id)
                        .collect();
                    for overlay in overlays {
                        hierarchy.record(TaskEvent::ActivityFinishRequested {
                            task: id,
                            activity: overlay,
                        });
                    }
                    hierarchy.record(TaskEvent::RemoveTaskRequested { task: id });
                }
                ChildRemoval::Emptied { destroy: false } => {
                    debug!(task = %id, "task emptied during reuse");
                }
                ChildRemoval::Emptied { destroy: true } => {
                    self.begin_removal(hierarchy, id)?;
                }
            }
            Ok(outcome)
        })
    }

    /// Finishes every activity above the topmost match for `component`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn perform_clear(
        &self,
        id: TaskId,
        component: &ComponentName,
        launch_flags: IntentFlags,
    ) -> TaskLifecycleResult<ClearOutcome> {
        self.mutate(|hierarchy| {
            let outcome = hierarchy
                .require_task_mut(id)?
                .perform_clear(component, launch_flags);
            Self::record_finished(hierarchy, id, &outcome.finished);
            self.schedule_persist(hierarchy, id);
            Ok(outcome)
        })
    }

    /// Clears down to the topmost match for `component` and removes the
    /// finished activities at once. The task is kept even when emptied, so
    /// the launch that triggered the clear can reuse it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn perform_clear_task_for_reuse(
        &self,
        id: TaskId,
        component: &ComponentName,
        launch_flags: IntentFlags,
    ) -> TaskLifecycleResult<ClearOutcome> {
        self.mutate(|hierarchy| {
            let task = hierarchy.require_task_mut(id)?;
            task.set_reuse_in_progress(true);
            let outcome = task.perform_clear(component, launch_flags);
            for activity in &outcome.finished {
                task.remove_child(*activity);
            }
            task.set_reuse_in_progress(false);
            self.update_lock_task_auth(task);
            Self::record_finished(hierarchy, id, &outcome.finished);
            self.schedule_persist(hierarchy, id);
            Ok(outcome)
        })
    }

    /// Removes every activity while keeping the emptied task. Returns the
    /// activities asked to finish.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn perform_clear_task(&self, id: TaskId) -> TaskLifecycleResult<Vec<ActivityId>> {
        self.mutate(|hierarchy| {
            let task = hierarchy.require_task_mut(id)?;
            task.set_reuse_in_progress(true);
            let (finished, _) = task.clear_children();
            task.set_reuse_in_progress(false);
            Self::record_finished(hierarchy, id, &finished);
            self.schedule_persist(hierarchy, id);
            Ok(finished)
        })
    }

    fn record_finished(hierarchy: &mut WindowHierarchy, id: TaskId, finished: &[ActivityId]) {
        for activity in finished {
            hierarchy.record(TaskEvent::ActivityFinishRequested {
                task: id,
                activity: *activity,
            });
        }
    }

    // Removal

    fn ensure_not_removed(task: &Task) -> TaskLifecycleResult<()> {
        if task.state().is_terminal() {
            return Err(TaskDomainError::InvalidTransition {
                task: task.id(),
                from: task.state(),
                to: TaskLifecycleState::Removed,
            }
            .into());
        }
        Ok(())
    }

    /// Starts removing an empty task. Returns `true` when it was removed
    /// immediately.
    fn begin_removal(&self, hierarchy: &mut WindowHierarchy, id: TaskId) -> TaskLifecycleResult<bool> {
        let animating = self.ports.display.is_animating(id);
        let task = hierarchy.require_task_mut(id)?;
        Self::ensure_not_removed(task)?;
        if !task.is_empty() {
            return Err(TaskDomainError::TaskNotEmpty(id).into());
        }
        if animating || task.has_windows_alive() {
            task.transition_to(TaskLifecycleState::PendingRemoval)?;
            debug!(task = %id, animating, "task removal deferred");
            return Ok(false);
        }
        self.remove_now(hierarchy, id)?;
        Ok(true)
    }

    fn remove_now(&self, hierarchy: &mut WindowHierarchy, id: TaskId) -> TaskLifecycleResult<()> {
        let task = hierarchy.require_task_mut(id)?;
        task.transition_to(TaskLifecycleState::Removed)?;
        let voice_session = task.voice_session().map(str::to_owned);
        let keep_in_recents =
            task.in_recents() && !task.auto_remove_from_recents() && voice_session.is_none();
        task.clear_root_process();
        if let Some(session) = voice_session {
            if let Err(err) = self.ports.voice.finish_session(&session) {
                warn!(task = %id, error = %err, "voice session notification failed");
            }
        }
        hierarchy.detach_task(id)?;
        hierarchy.record(TaskEvent::TaskRemoved { task: id });
        hierarchy.record(TaskEvent::LayoutRequested);
        if keep_in_recents {
            self.schedule_persist(hierarchy, id);
        } else {
            self.drop_from_recents(hierarchy, id);
            hierarchy.remove_task(id)?;
        }
        info!(task = %id, keep_in_recents, "task removed");
        Ok(())
    }

    /// Finishes and removes every activity, then removes the task from its
    /// stack, deferring while its transition runs. Returns `true` when it
    /// was removed immediately.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing or
    /// [`TaskDomainError::InvalidTransition`] when it was already removed.
    pub fn remove_task(&self, id: TaskId) -> TaskLifecycleResult<bool> {
        self.mutate(|hierarchy| {
            let task = hierarchy.require_task_mut(id)?;
            Self::ensure_not_removed(task)?;
            let (finished, _) = task.clear_children();
            Self::record_finished(hierarchy, id, &finished);
            self.begin_removal(hierarchy, id)
        })
    }

    /// Completes deferred removals whose surfaces and transitions are gone.
    /// Returns the tasks that were removed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::LockPoisoned`] when the lock is poisoned.
    pub fn complete_pending_removals(&self) -> TaskLifecycleResult<Vec<TaskId>> {
        self.mutate(|hierarchy| {
            let ready: Vec<TaskId> = hierarchy
                .tasks()
                .values()
                .filter(|task| task.state() == TaskLifecycleState::PendingRemoval)
                .filter(|task| !task.has_windows_alive())
                .map(Task::id)
                .filter(|id| !self.ports.display.is_animating(*id))
                .collect();
            for id in &ready {
                self.remove_now(hierarchy, *id)?;
            }
            Ok(ready)
        })
    }

    // Recents and affiliation

    fn drop_from_recents(&self, hierarchy: &mut WindowHierarchy, id: TaskId) {
        affiliation::close_recents_chain(hierarchy.tasks_mut(), id);
        hierarchy.remove_from_recents(id);
        if let Some(task) = hierarchy.task_mut(id) {
            task.clear_root_process();
        }
        hierarchy.record(TaskEvent::TaskSnapshotRemoved { task: id });
        self.schedule_persist(hierarchy, id);
    }

    /// Drops a task from recents: closes its affiliation chain, forgets its
    /// persisted record and its root process. A task already gone from the
    /// hierarchy is forgotten entirely. Returns `true` when it was listed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn removed_from_recents(&self, id: TaskId) -> TaskLifecycleResult<bool> {
        self.mutate(|hierarchy| {
            let task = hierarchy.task(id).ok_or(TaskDomainError::UnknownTask(id))?;
            let listed = task.in_recents();
            let detached = task.state().is_terminal();
            self.drop_from_recents(hierarchy, id);
            if detached {
                hierarchy.remove_task(id)?;
            }
            hierarchy.record(TaskEvent::TaskStackChanged);
            Ok(listed)
        })
    }

    /// Moves `id` to the tail of the affiliation chain of `other`. Returns
    /// any links severed while repairing inconsistent chains.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when either task is missing.
    pub fn set_task_to_affiliate_with(
        &self,
        id: TaskId,
        other: TaskId,
    ) -> TaskLifecycleResult<Vec<AffiliationRepair>> {
        self.mutate(|hierarchy| {
            let repairs = affiliation::set_task_to_affiliate_with(hierarchy.tasks_mut(), id, other)?;
            let mut touched = vec![id, other];
            touched.extend(repairs.iter().flat_map(|repair| [repair.task, repair.target]));
            touched.sort_unstable();
            touched.dedup();
            for task in touched {
                self.schedule_persist(hierarchy, task);
            }
            Ok(repairs)
        })
    }

    /// Brings a task and its stack to the front and to the head of recents.
    /// Returns `false` when the task is not in a stack.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn move_task_to_front(&self, id: TaskId) -> TaskLifecycleResult<bool> {
        self.mutate(|hierarchy| {
            let Some(stack) = hierarchy.stack_of(id) else {
                hierarchy.require_task_mut(id)?;
                return Ok(false);
            };
            {
                let task = hierarchy.require_task_mut(id)?;
                if task.state() == TaskLifecycleState::PendingRemoval {
                    task.transition_to(TaskLifecycleState::Attached)?;
                    debug!(task = %id, "pending removal cancelled by move to front");
                }
                task.update_task_movement(true, &*self.clock);
                task.touch_active_time(&*self.clock);
            }
            hierarchy.place_task(id, stack, ChildPosition::Top)?;
            if hierarchy.move_stack_to_front(stack) {
                hierarchy.record(TaskEvent::StackMovedToFront { stack });
            }
            hierarchy.add_to_recents(id);
            hierarchy.record(TaskEvent::TaskStackChanged);
            self.schedule_persist(hierarchy, id);
            Ok(true)
        })
    }

    /// Associates the process hosting the root activity. Returns `false`
    /// when the task is excluded from recents.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn set_root_process(&self, id: TaskId, process: ProcessId) -> TaskLifecycleResult<bool> {
        self.mutate(|hierarchy| Ok(hierarchy.require_task_mut(id)?.set_root_process(process)))
    }

    /// Recent tasks, most recent first, skipping users whose profile is
    /// locked.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::LockPoisoned`] when the lock is poisoned.
    pub fn visible_recents(&self) -> TaskLifecycleResult<Vec<TaskId>> {
        self.inspect(|hierarchy| {
            hierarchy
                .recents()
                .iter()
                .copied()
                .filter(|id| {
                    hierarchy
                        .task(*id)
                        .is_some_and(|task| !self.ports.recents.is_profile_locked(task.user_id()))
                })
                .collect()
        })
    }

    /// Encodes a task in the persisted record format.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn task_record(&self, id: TaskId) -> TaskLifecycleResult<RecordElement> {
        self.inspect(|hierarchy| hierarchy.task(id).map(TaskRecordCodec::encode))?
            .ok_or_else(|| TaskDomainError::UnknownTask(id).into())
    }
}

/// Keeps layout deferred until dropped.
///
/// Created by [`TaskLifecycleService::defer_layout`].
pub struct LayoutDeferral<'a, C>
where
    C: Clock + Send + Sync,
{
    service: &'a TaskLifecycleService<C>,
}

impl<C> Drop for LayoutDeferral<'_, C>
where
    C: Clock + Send + Sync,
{
    fn drop(&mut self) {
        self.service.continue_layout();
    }
}
