//! Geometry operations of the lifecycle service: resize, reparent, display
//! rotation and alignment.

use super::{TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService};
use crate::container::{FrontPolicy, ReparentRequest, Reparentable, ResizeRequest, Resizable};
use crate::geometry::{Configuration, Rect, WindowingMode};
use crate::task::domain::{
    DisplayId, Stack, StackId, TaskDomainError, TaskEvent, TaskId, TaskLifecycleState,
    WindowHierarchy,
};
use mockable::Clock;
use tracing::debug;

/// Centred half-size rectangle used when a task enters freeform without
/// remembered bounds.
fn default_freeform_bounds(parent: Rect) -> Rect {
    let width = parent.width().div_euclid(2);
    let height = parent.height().div_euclid(2);
    let left = parent.left + (parent.width() - width).div_euclid(2);
    let top = parent.top + (parent.height() - height).div_euclid(2);
    Rect::new(left, top, left + width, top + height)
}

impl<C> TaskLifecycleService<C>
where
    C: Clock + Send + Sync,
{
    fn resize_locked(
        &self,
        hierarchy: &mut WindowHierarchy,
        id: TaskId,
        request: ResizeRequest,
    ) -> TaskLifecycleResult<bool> {
        let attached = {
            let task = hierarchy.require_task_mut(id)?;
            task.check_resize(request.bounds)?;
            if !request.forced && task.configuration().equivalent_requested_bounds(request.bounds)
            {
                return Ok(true);
            }
            let attached = task.state() == TaskLifecycleState::Attached;
            if attached {
                task.transition_to(TaskLifecycleState::Resizing)?;
            }
            task.set_requested_bounds(request.bounds);
            attached
        };

        let change = self.resolve_task_configuration(hierarchy, id)?;
        // A deferred resume leaves the top activity for the caller to settle.
        let kept = request.defer_resume || Self::reconfigure_top_activity(hierarchy, id, change)?;
        let resized = hierarchy.require_task_mut(id)?;
        if attached {
            resized.transition_to(TaskLifecycleState::Attached)?;
        }
        let bounds = resized.bounds();
        debug!(
            task = %id,
            %bounds,
            kept,
            preserve_window = request.preserve_window,
            "task resized"
        );
        hierarchy.record(TaskEvent::TaskBoundsChanged { task: id, bounds });
        if !request.defer_resume {
            hierarchy.record(TaskEvent::LayoutRequested);
        }
        self.schedule_persist(hierarchy, id);
        Ok(kept)
    }

    fn fresh_launch_bounds(&self, hierarchy: &WindowHierarchy, stack: StackId) -> Rect {
        let Some(entry) = hierarchy.stack(stack) else {
            return Rect::EMPTY;
        };
        let parent = if entry.bounds().is_empty() {
            self.ports
                .display
                .frames(entry.display())
                .map_or(Rect::EMPTY, |frames| frames.stable_bounds())
        } else {
            entry.bounds()
        };
        default_freeform_bounds(parent)
    }

    /// Prepares the task for a move. Returns `true` when it was attached
    /// before and must return to [`TaskLifecycleState::Attached`] afterwards.
    fn begin_reparent(hierarchy: &mut WindowHierarchy, id: TaskId) -> TaskLifecycleResult<bool> {
        let task = hierarchy.require_task_mut(id)?;
        match task.state() {
            TaskLifecycleState::Unattached => Ok(false),
            TaskLifecycleState::PendingRemoval => {
                task.transition_to(TaskLifecycleState::Attached)?;
                debug!(task = %id, "pending removal cancelled by reparent");
                task.transition_to(TaskLifecycleState::Reparenting)?;
                Ok(true)
            }
            TaskLifecycleState::Attached => {
                task.transition_to(TaskLifecycleState::Reparenting)?;
                Ok(true)
            }
            from => Err(TaskDomainError::InvalidTransition {
                task: id,
                from,
                to: TaskLifecycleState::Reparenting,
            }
            .into()),
        }
    }

    fn reparent_locked(
        &self,
        hierarchy: &mut WindowHierarchy,
        id: TaskId,
        request: ReparentRequest<StackId>,
    ) -> TaskLifecycleResult<bool> {
        let force_resizable = self.config.force_resizable_activities;
        let target = request.target;
        let target_stack = hierarchy
            .stack(target)
            .ok_or(TaskDomainError::UnknownStack(target))?;
        let to_mode = target_stack.windowing_mode();
        let to_display = target_stack.display();
        let target_bounds = target_stack.requested_bounds();
        let resumed = target_stack.resumed();
        let source = hierarchy.stack_of(id);
        if source == Some(target) {
            return Ok(false);
        }
        let moving = hierarchy.task(id).ok_or(TaskDomainError::UnknownTask(id))?;
        if !self.ports.display.can_host_task(to_display, moving) {
            debug!(task = %id, display = %to_display, "display refused task");
            return Ok(false);
        }
        let from_mode = moving.windowing_mode();
        let new_bounds = moving.bounds_for_stack(
            to_mode,
            target_bounds,
            || self.fresh_launch_bounds(hierarchy, target),
            force_resizable,
        )?;

        let source_display = source
            .and_then(|stack| hierarchy.stack(stack))
            .map(Stack::display);
        let was_focused = source.is_some() && hierarchy.focused_stack() == source;
        let was_front = source.is_some_and(|stack| hierarchy.is_front_stack(stack));
        let move_to_front = match request.front_policy {
            FrontPolicy::MoveToFront => true,
            FrontPolicy::KeepAtFront => was_focused || was_front,
            FrontPolicy::LeaveInPlace => false,
        };

        let was_attached = Self::begin_reparent(hierarchy, id)?;
        {
            let task = hierarchy.require_task_mut(id)?;
            task.set_replace_windows_on_move(
                from_mode == WindowingMode::Freeform || to_mode == WindowingMode::Freeform,
            );
            task.set_preserve_non_floating_state(to_mode == WindowingMode::Pinned);
        }

        if move_to_front {
            if let Some(peer) = resumed.filter(|peer| peer.task != id) {
                hierarchy.record(TaskEvent::ActivityPauseRequested {
                    task: peer.task,
                    activity: peer.activity,
                });
            }
        }

        hierarchy.place_task(id, target, request.position)?;
        hierarchy.record(TaskEvent::TaskMovedToStack {
            task: id,
            from: source,
            to: target,
        });

        if let Some(bounds) = new_bounds {
            hierarchy
                .require_task_mut(id)?
                .set_requested_bounds((!bounds.is_empty()).then_some(bounds));
        }
        let change = self.resolve_task_configuration(hierarchy, id)?;
        Self::reconfigure_top_activity(hierarchy, id, change)?;

        let (now_mode, resolved) = hierarchy
            .task(id)
            .map(|placed| (placed.windowing_mode(), placed.bounds()))
            .ok_or(TaskDomainError::UnknownTask(id))?;
        if from_mode == WindowingMode::Pinned && now_mode != WindowingMode::Pinned {
            hierarchy.record(TaskEvent::PictureInPictureUnpinned { task: id });
        }
        if from_mode.is_multi_window() != now_mode.is_multi_window() {
            hierarchy.record(TaskEvent::MultiWindowModeChanged {
                task: id,
                multi_window: now_mode.is_multi_window(),
            });
        }
        if change.changed {
            hierarchy.record(TaskEvent::TaskBoundsChanged {
                task: id,
                bounds: resolved,
            });
        }

        if move_to_front {
            if hierarchy.move_stack_to_front(target) {
                hierarchy.record(TaskEvent::StackMovedToFront { stack: target });
            }
            hierarchy
                .require_task_mut(id)?
                .update_task_movement(true, &*self.clock);
        } else if was_focused {
            let home = source_display
                .and_then(|display| hierarchy.home_stack(display))
                .filter(|home| *home != target);
            if let Some(home) = home {
                if hierarchy.move_stack_to_front(home) {
                    hierarchy.record(TaskEvent::StackMovedToFront { stack: home });
                }
            }
        }

        hierarchy
            .require_task_mut(id)?
            .transition_to(TaskLifecycleState::Attached)?;
        debug!(
            task = %id,
            from = ?source,
            to = %target,
            was_attached,
            animate = request.animate,
            "task reparented"
        );
        hierarchy.record(TaskEvent::TaskStackChanged);
        if !request.defer_resume {
            hierarchy.record(TaskEvent::LayoutRequested);
        }
        self.schedule_persist(hierarchy, id);
        Ok(true)
    }

    /// Applies a new display configuration and keeps free-floating tasks at
    /// the same physical position across the rotation. Returns the tasks
    /// whose bounds were rotated.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownDisplay`] when the display is
    /// missing.
    pub fn on_display_changed(
        &self,
        display: DisplayId,
        config: Configuration,
    ) -> TaskLifecycleResult<Vec<TaskId>> {
        self.mutate(|hierarchy| {
            let node = hierarchy
                .display_mut(display)
                .ok_or(TaskDomainError::UnknownDisplay(display))?;
            node.update(config);
            let rotation = node.rotation();
            let (width, height) = self.ports.display.frames(display).map_or(
                (config.bounds.width(), config.bounds.height()),
                |frames| (frames.logical_width, frames.logical_height),
            );
            hierarchy.refresh_stack_configurations(display);

            let mut rotated = Vec::new();
            for stack in hierarchy.stacks_on(display) {
                for id in hierarchy.tasks_in(stack) {
                    let moved = hierarchy
                        .require_task_mut(id)?
                        .adjust_for_display_rotation(display, rotation, width, height);
                    if let Some(bounds) = moved {
                        hierarchy.require_task_mut(id)?.set_requested_bounds(Some(bounds));
                    }
                    let change = self.resolve_task_configuration(hierarchy, id)?;
                    Self::reconfigure_top_activity(hierarchy, id, change)?;
                    if moved.is_some() {
                        let resolved = hierarchy.require_task_mut(id)?.bounds();
                        hierarchy.record(TaskEvent::TaskBoundsChanged {
                            task: id,
                            bounds: resolved,
                        });
                        self.schedule_persist(hierarchy, id);
                        rotated.push(id);
                    }
                }
            }
            hierarchy.record(TaskEvent::LayoutRequested);
            Ok(rotated)
        })
    }

    /// Bounds a new launch into `id` should use.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn launch_bounds(&self, id: TaskId) -> TaskLifecycleResult<Option<Rect>> {
        let force_resizable = self.config.force_resizable_activities;
        let bounds = self.inspect(|hierarchy| -> Result<_, TaskDomainError> {
            let task = hierarchy.task(id).ok_or(TaskDomainError::UnknownTask(id))?;
            let stack_bounds = hierarchy
                .stack_of(id)
                .and_then(|stack| hierarchy.stack(stack))
                .map_or(Rect::EMPTY, Stack::requested_bounds);
            Ok(task.launch_bounds(stack_bounds, force_resizable))
        })??;
        Ok(bounds)
    }

    /// Moves a task so its top, or its bottom when `align_bottom` is set,
    /// lines up with `adjusted`. Returns `false` when the task cannot or
    /// need not move.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing, or
    /// the resize error when the aligned bounds are rejected.
    pub fn align_to_adjusted_bounds(
        &self,
        id: TaskId,
        adjusted: Rect,
        align_bottom: bool,
    ) -> TaskLifecycleResult<bool> {
        let force_resizable = self.config.force_resizable_activities;
        self.mutate(|hierarchy| {
            let task = hierarchy.task(id).ok_or(TaskDomainError::UnknownTask(id))?;
            let Some(aligned) = task.aligned_bounds(adjusted, align_bottom, force_resizable) else {
                return Ok(false);
            };
            if aligned == task.bounds() {
                return Ok(false);
            }
            self.resize_locked(hierarchy, id, ResizeRequest::to(Some(aligned)))?;
            Ok(true)
        })
    }

    /// Sets or clears the transient bounds a task is drawn at.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn set_displayed_bounds(&self, id: TaskId, bounds: Option<Rect>) -> TaskLifecycleResult<()> {
        self.mutate(|hierarchy| {
            hierarchy.require_task_mut(id)?.set_displayed_bounds(bounds);
            hierarchy.record(TaskEvent::LayoutRequested);
            Ok(())
        })
    }

    /// Whether the task may enter split screen on this device.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn supports_split_screen(&self, id: TaskId) -> TaskLifecycleResult<bool> {
        let config = self.config;
        self.inspect(|hierarchy| {
            hierarchy.task(id).map(|task| {
                task.supports_split_screen(
                    config.force_resizable_activities,
                    config.supports_split_screen,
                )
            })
        })?
        .ok_or_else(|| TaskDomainError::UnknownTask(id).into())
    }
}

impl<C> Resizable<TaskId> for TaskLifecycleService<C>
where
    C: Clock + Send + Sync,
{
    type Error = TaskLifecycleError;

    fn resize(&self, node: TaskId, request: ResizeRequest) -> Result<bool, Self::Error> {
        self.mutate(|hierarchy| self.resize_locked(hierarchy, node, request))
    }
}

impl<C> Reparentable<TaskId> for TaskLifecycleService<C>
where
    C: Clock + Send + Sync,
{
    type Parent = StackId;
    type Error = TaskLifecycleError;

    fn reparent(
        &self,
        node: TaskId,
        request: ReparentRequest<Self::Parent>,
    ) -> Result<bool, Self::Error> {
        self.mutate(|hierarchy| self.reparent_locked(hierarchy, node, request))
    }
}
