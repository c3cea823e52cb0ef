//! Shared world state for task lifecycle BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use atelier::container::ChildPosition;
use atelier::geometry::{Configuration, Rect, Rotation, WindowingMode};
use atelier::task::{
    adapters::memory::{
        InMemoryTaskRecordStore, RecordingEventSink, RecordingPersistQueue,
        RecordingVoiceInteraction, StaticDisplayEnvironment, StaticPackageResolver,
        StaticRecentsPolicy,
    },
    domain::{
        ActivityId, ActivityInfo, ActivityLaunch, ActivityRecord, ActivityType, ChildRemoval,
        ComponentName, DisplayId, Intent, IntentFlags, ResizeMode, StackId, TaskId, TaskLaunch, Uid,
    },
    services::{TaskLifecycleResult, TaskLifecycleService, TaskPorts},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<DefaultClock>;

/// Bounds of the single display every scenario uses.
pub const DISPLAY_BOUNDS: Rect = Rect::new(0, 0, 1000, 2000);

const PACKAGE: &str = "com.example.app";

/// Scenario world for task lifecycle behaviour tests.
pub struct TaskLifecycleWorld {
    pub service: TestTaskService,
    pub store: InMemoryTaskRecordStore,
    pub stacks: HashMap<String, StackId>,
    pub tasks: HashMap<String, TaskId>,
    pub activities: HashMap<ActivityId, String>,
    pub last_resize: Option<TaskLifecycleResult<bool>>,
    pub last_removal: Option<ChildRemoval>,
    pub restored: Vec<TaskId>,
}

impl TaskLifecycleWorld {
    /// Creates a world with an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        let ports = TaskPorts {
            events: Arc::new(RecordingEventSink::new()),
            display: Arc::new(StaticDisplayEnvironment::new()),
            recents: Arc::new(StaticRecentsPolicy::new()),
            packages: Arc::new(StaticPackageResolver::new()),
            voice: Arc::new(RecordingVoiceInteraction::new()),
            persistence: Arc::new(RecordingPersistQueue::new()),
        };

        Self {
            service: TaskLifecycleService::new(ports, Arc::new(DefaultClock)),
            store: InMemoryTaskRecordStore::new(),
            stacks: HashMap::new(),
            tasks: HashMap::new(),
            activities: HashMap::new(),
            last_resize: None,
            last_removal: None,
            restored: Vec::new(),
        }
    }

    /// Registers the default display with a fullscreen and a freeform stack.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the display or a stack.
    pub fn add_default_display(&mut self) -> Result<(), eyre::Report> {
        let config = Configuration {
            rotation: Some(Rotation::Deg0),
            density_dpi: Some(160),
            ..Configuration::EMPTY
                .with_windowing_mode(WindowingMode::Fullscreen)
                .with_bounds(DISPLAY_BOUNDS)
        };
        self.service.add_display(DisplayId::DEFAULT, config)?;
        for (name, mode) in [
            ("fullscreen", WindowingMode::Fullscreen),
            ("freeform", WindowingMode::Freeform),
        ] {
            let stack = self.service.create_stack(
                DisplayId::DEFAULT,
                mode,
                ActivityType::Standard,
                ChildPosition::Top,
            )?;
            self.stacks.insert(name.to_owned(), stack);
        }
        Ok(())
    }

    /// Looks up a stack registered by [`Self::add_default_display`].
    ///
    /// # Errors
    ///
    /// Returns an error if no stack has that name.
    pub fn stack(&self, name: &str) -> Result<StackId, eyre::Report> {
        self.stacks
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown stack '{name}' in scenario world"))
    }

    /// Looks up a task launched earlier in the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if no task has that name.
    pub fn task(&self, name: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown task '{name}' in scenario world"))
    }

    /// Creates a task with a root `Main` activity inside `stack`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the launch.
    pub fn launch(
        &mut self,
        name: &str,
        stack: StackId,
        resize_mode: ResizeMode,
    ) -> Result<TaskId, eyre::Report> {
        let mut info = activity_info("Main")?;
        info.resize_mode = resize_mode;
        let intent =
            Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK);
        let id = self.service.create_task(
            &TaskLaunch::new(info.clone(), intent),
            stack,
            ChildPosition::Top,
        )?;
        self.add_activity(id, "Main", activity_record(info, IntentFlags::NEW_TASK))?;
        self.tasks.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Adds `record` to the top of task `id` and remembers it as `label`.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is missing.
    pub fn add_activity(
        &mut self,
        id: TaskId,
        label: &str,
        record: ActivityRecord,
    ) -> Result<(), eyre::Report> {
        self.activities.insert(record.id(), label.to_owned());
        self.service.add_activity(id, record, ChildPosition::Top)?;
        Ok(())
    }
}

impl Default for TaskLifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds activity metadata for a class in the scenario package.
///
/// # Errors
///
/// Returns an error if the component name is rejected.
pub fn activity_info(class: &str) -> Result<ActivityInfo, eyre::Report> {
    let component = ComponentName::new(PACKAGE, format!("{PACKAGE}.{class}"))?;
    let mut info = ActivityInfo::new(component, Uid::new(10_042));
    info.task_affinity = Some(PACKAGE.to_owned());
    Ok(info)
}

/// Builds a launched activity record for `info`.
#[must_use]
pub fn activity_record(info: ActivityInfo, flags: IntentFlags) -> ActivityRecord {
    let intent = Intent::for_component(info.component.clone()).with_flags(flags);
    ActivityRecord::launch(ActivityLaunch::new(info, intent))
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskLifecycleWorld {
    TaskLifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
