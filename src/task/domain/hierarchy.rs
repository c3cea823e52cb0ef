//! The window hierarchy aggregate: topology plus every node payload.

use super::{
    ActivityType, DisplayId, DisplayNode, NodeKey, Stack, StackId, Task, TaskDomainError, TaskEvent, TaskId,
};
use crate::container::{ChildPosition, ContainerTree};
use crate::geometry::Configuration;
use std::collections::BTreeMap;

/// Displays, stacks and tasks, their parent/child topology, the recents list
/// and the layout-deferral state.
///
/// All mutation goes through one owner; cross-entity invariants such as
/// affiliation symmetry span several tasks and are maintained here.
#[derive(Debug, Clone, Default)]
pub struct WindowHierarchy {
    tree: ContainerTree<NodeKey>,
    displays: BTreeMap<DisplayId, DisplayNode>,
    stacks: BTreeMap<StackId, Stack>,
    tasks: BTreeMap<TaskId, Task>,
    recents: Vec<TaskId>,
    focused_stack: Option<StackId>,
    layout_deferrals: u32,
    pending_events: Vec<TaskEvent>,
    last_task_id: i32,
    last_stack_id: u32,
}

impl WindowHierarchy {
    /// Creates an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Displays

    /// Registers a display.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Hierarchy`] when the display already exists.
    pub fn add_display(&mut self, display: DisplayNode) -> Result<(), TaskDomainError> {
        self.tree.insert(NodeKey::Display(display.id()))?;
        self.displays.insert(display.id(), display);
        Ok(())
    }

    /// Looks up a display.
    #[must_use]
    pub fn display(&self, id: DisplayId) -> Option<&DisplayNode> {
        self.displays.get(&id)
    }

    /// Looks up a display for mutation.
    pub fn display_mut(&mut self, id: DisplayId) -> Option<&mut DisplayNode> {
        self.displays.get_mut(&id)
    }

    /// Stacks on `display`, bottom first.
    #[must_use]
    pub fn stacks_on(&self, display: DisplayId) -> Vec<StackId> {
        self.tree
            .children(NodeKey::Display(display))
            .iter()
            .filter_map(|key| match key {
                NodeKey::Stack(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Recomputes every stack configuration on `display` from the display's
    /// configuration.
    pub fn refresh_stack_configurations(&mut self, display: DisplayId) {
        let Some(parent) = self.displays.get(&display).map(|node| *node.configuration()) else {
            return;
        };
        for stack_id in self.stacks_on(display) {
            if let Some(stack) = self.stacks.get_mut(&stack_id) {
                let requested = *stack.configuration().requested_override();
                let _change = stack.configuration_mut().apply_resolved(&parent, requested);
            }
        }
    }

    // Stacks

    /// Allocates an unused stack identifier.
    pub fn next_stack_id(&mut self) -> StackId {
        loop {
            self.last_stack_id = self.last_stack_id.wrapping_add(1);
            let candidate = StackId::new(self.last_stack_id);
            if !self.stacks.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Registers a stack and places it on its display.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownDisplay`] when the display is
    /// missing, or [`TaskDomainError::Hierarchy`] when the stack exists.
    pub fn add_stack(
        &mut self,
        mut stack: Stack,
        position: ChildPosition,
    ) -> Result<(), TaskDomainError> {
        let display = stack.display();
        let parent = self
            .displays
            .get(&display)
            .map(|node| *node.configuration())
            .ok_or(TaskDomainError::UnknownDisplay(display))?;
        let key = NodeKey::Stack(stack.id());
        self.tree.insert(key)?;
        let index = position.resolve(self.tree.children(NodeKey::Display(display)).len());
        self.tree.attach(key, NodeKey::Display(display), index)?;
        let requested = *stack.configuration().requested_override();
        let _change = stack.configuration_mut().apply_resolved(&parent, requested);
        if self.focused_stack.is_none() {
            self.focused_stack = Some(stack.id());
        }
        self.stacks.insert(stack.id(), stack);
        Ok(())
    }

    /// Looks up a stack.
    #[must_use]
    pub fn stack(&self, id: StackId) -> Option<&Stack> {
        self.stacks.get(&id)
    }

    /// Looks up a stack for mutation.
    pub fn stack_mut(&mut self, id: StackId) -> Option<&mut Stack> {
        self.stacks.get_mut(&id)
    }

    /// Tasks in `stack`, bottom first.
    #[must_use]
    pub fn tasks_in(&self, stack: StackId) -> Vec<TaskId> {
        self.tree
            .children(NodeKey::Stack(stack))
            .iter()
            .filter_map(|key| match key {
                NodeKey::Task(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Front-most stack of `display`.
    #[must_use]
    pub fn front_stack(&self, display: DisplayId) -> Option<StackId> {
        self.stacks_on(display).last().copied()
    }

    /// Returns `true` when `stack` is the front-most stack of its display.
    #[must_use]
    pub fn is_front_stack(&self, stack: StackId) -> bool {
        self.stacks
            .get(&stack)
            .is_some_and(|node| self.front_stack(node.display()) == Some(stack))
    }

    /// Moves `stack` to the front of its display and focuses it. Returns
    /// `true` when the order changed.
    pub fn move_stack_to_front(&mut self, stack: StackId) -> bool {
        let key = NodeKey::Stack(stack);
        let Some(parent) = self.tree.parent(key) else {
            return false;
        };
        let top = self.tree.children(parent).len().saturating_sub(1);
        let before = self.tree.position(key);
        self.tree.reposition(key, top);
        self.focused_stack = Some(stack);
        before != Some(top)
    }

    /// The focused stack.
    #[must_use]
    pub const fn focused_stack(&self) -> Option<StackId> {
        self.focused_stack
    }

    /// The first stack hosting home activities on `display`.
    #[must_use]
    pub fn home_stack(&self, display: DisplayId) -> Option<StackId> {
        self.stacks_on(display).into_iter().find(|id| {
            self.stacks
                .get(id)
                .is_some_and(|stack| stack.activity_type() == ActivityType::Home)
        })
    }

    // Tasks

    /// Allocates an unused task identifier, wrapping back to 1.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTaskId`] only if the counter is
    /// corrupted.
    pub fn next_task_id(&mut self) -> Result<TaskId, TaskDomainError> {
        loop {
            self.last_task_id = self.last_task_id.checked_add(1).unwrap_or(1);
            let candidate = TaskId::new(self.last_task_id)?;
            if !self.tasks.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Registers an unattached task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Hierarchy`] when the task exists.
    pub fn insert_task(&mut self, task: Task) -> Result<(), TaskDomainError> {
        self.tree.insert(NodeKey::Task(task.id()))?;
        self.last_task_id = self.last_task_id.max(task.id().value());
        self.tasks.insert(task.id(), task);
        Ok(())
    }

    /// Looks up a task.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Looks up a task for mutation.
    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Looks up a task, failing when it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`].
    pub fn require_task_mut(&mut self, id: TaskId) -> Result<&mut Task, TaskDomainError> {
        self.tasks.get_mut(&id).ok_or(TaskDomainError::UnknownTask(id))
    }

    /// Every task, keyed by identifier.
    #[must_use]
    pub const fn tasks(&self) -> &BTreeMap<TaskId, Task> {
        &self.tasks
    }

    /// Every task, for operations spanning several tasks.
    pub const fn tasks_mut(&mut self) -> &mut BTreeMap<TaskId, Task> {
        &mut self.tasks
    }

    /// Stack currently owning `task`.
    #[must_use]
    pub fn stack_of(&self, task: TaskId) -> Option<StackId> {
        match self.tree.parent(NodeKey::Task(task)) {
            Some(NodeKey::Stack(id)) => Some(id),
            _ => None,
        }
    }

    /// Full configuration of the stack owning `task`.
    #[must_use]
    pub fn parent_configuration(&self, task: TaskId) -> Option<Configuration> {
        self.stack_of(task)
            .and_then(|stack| self.stacks.get(&stack))
            .map(|stack| *stack.configuration().full_configuration())
    }

    /// Places `task` in `stack`, moving it out of any previous stack.
    /// Returns the index it landed at.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownStack`] or
    /// [`TaskDomainError::Hierarchy`] when either node is missing.
    pub fn place_task(
        &mut self,
        task: TaskId,
        stack: StackId,
        position: ChildPosition,
    ) -> Result<usize, TaskDomainError> {
        if !self.stacks.contains_key(&stack) {
            return Err(TaskDomainError::UnknownStack(stack));
        }
        let parent = NodeKey::Stack(stack);
        let key = NodeKey::Task(task);
        let len = self.tree.children(parent).len();
        let same_parent = self.tree.parent(key) == Some(parent);
        let index = position.resolve(if same_parent { len.saturating_sub(1) } else { len });
        if same_parent {
            return Ok(self.tree.reposition(key, index).unwrap_or(index));
        }
        Ok(self.tree.reparent(key, parent, index)?)
    }

    /// Takes `task` out of its stack. Returns the previous stack.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Hierarchy`] when the task is unknown.
    pub fn detach_task(&mut self, task: TaskId) -> Result<Option<StackId>, TaskDomainError> {
        let previous = self.stack_of(task);
        self.tree.detach(NodeKey::Task(task))?;
        Ok(previous)
    }

    /// Removes `task` from the hierarchy and the recents list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownTask`] when the task is missing.
    pub fn remove_task(&mut self, task: TaskId) -> Result<Task, TaskDomainError> {
        if !self.tasks.contains_key(&task) {
            return Err(TaskDomainError::UnknownTask(task));
        }
        self.tree.remove(NodeKey::Task(task))?;
        let removed = self
            .tasks
            .remove(&task)
            .ok_or(TaskDomainError::UnknownTask(task))?;
        self.recents.retain(|id| *id != task);
        Ok(removed)
    }

    // Recents

    /// Recent tasks, most recent first.
    #[must_use]
    pub fn recents(&self) -> &[TaskId] {
        &self.recents
    }

    /// Moves `task` to the front of the recents list.
    pub fn add_to_recents(&mut self, task: TaskId) {
        self.recents.retain(|id| *id != task);
        self.recents.insert(0, task);
        if let Some(entry) = self.tasks.get_mut(&task) {
            entry.set_in_recents(true);
        }
    }

    /// Drops `task` from the recents list. Returns `true` when it was listed.
    pub fn remove_from_recents(&mut self, task: TaskId) -> bool {
        let before = self.recents.len();
        self.recents.retain(|id| *id != task);
        if let Some(entry) = self.tasks.get_mut(&task) {
            entry.set_in_recents(false);
        }
        before != self.recents.len()
    }

    // Layout deferral and events

    /// Opens a layout-deferral scope.
    pub const fn defer_layout(&mut self) {
        self.layout_deferrals = self.layout_deferrals.saturating_add(1);
    }

    /// Closes a layout-deferral scope. When the outermost scope closes,
    /// returns the buffered events as one batch.
    pub fn continue_layout(&mut self) -> Option<Vec<TaskEvent>> {
        self.layout_deferrals = self.layout_deferrals.saturating_sub(1);
        if self.layout_deferrals > 0 || self.pending_events.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending_events))
    }

    /// Returns `true` while a deferral scope is open.
    #[must_use]
    pub const fn is_layout_deferred(&self) -> bool {
        self.layout_deferrals > 0
    }

    /// Buffers an event for the next batch.
    pub fn record(&mut self, event: TaskEvent) {
        if event == TaskEvent::LayoutRequested && self.pending_events.contains(&event) {
            return;
        }
        self.pending_events.push(event);
    }

    /// Events buffered so far.
    #[must_use]
    pub fn pending_events(&self) -> &[TaskEvent] {
        &self.pending_events
    }
}
