//! Shared test helpers for lifecycle integration tests.

use std::sync::Arc;

use atelier::container::ChildPosition;
use atelier::geometry::{Configuration, Rect, Rotation, WindowingMode};
use atelier::task::{
    adapters::memory::{
        RecordingEventSink, RecordingPersistQueue, RecordingVoiceInteraction,
        StaticDisplayEnvironment, StaticPackageResolver, StaticRecentsPolicy,
    },
    domain::{
        ActivityInfo, ActivityLaunch, ActivityRecord, ActivityType, ComponentName, DisplayId,
        Intent, IntentFlags, PersistableMode, StackId, TaskId, TaskLaunch, Uid,
    },
    ports::{TaskEventSink, TaskPersistQueue},
    services::{TaskLifecycleService, TaskPorts},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the integration tests.
pub type TestService = TaskLifecycleService<DefaultClock>;

/// Bounds of the display every test registers.
pub const DISPLAY_BOUNDS: Rect = Rect::new(0, 0, 1000, 2000);

const PACKAGE: &str = "com.example.mail";

/// Inbox activity metadata that persists across reboots.
#[fixture]
pub fn inbox() -> ActivityInfo {
    let component =
        ComponentName::new(PACKAGE, format!("{PACKAGE}.Inbox")).expect("valid component");
    let mut info = ActivityInfo::new(component, Uid::new(10_050));
    info.task_affinity = Some(PACKAGE.to_owned());
    info.persistable_mode = PersistableMode::AcrossReboots;
    info
}

/// Package resolver that knows the inbox activity.
#[must_use]
pub fn packages(info: &ActivityInfo) -> StaticPackageResolver {
    StaticPackageResolver::new()
        .with_activity(info.clone())
        .with_package(PACKAGE, info.uid)
}

/// Builds a service over the given sink, queue and resolver.
#[must_use]
pub fn service_with(
    events: Arc<dyn TaskEventSink>,
    persistence: Arc<dyn TaskPersistQueue>,
    packages: StaticPackageResolver,
) -> TestService {
    let ports = TaskPorts {
        events,
        display: Arc::new(StaticDisplayEnvironment::new()),
        recents: Arc::new(StaticRecentsPolicy::new()),
        packages: Arc::new(packages),
        voice: Arc::new(RecordingVoiceInteraction::new()),
        persistence,
    };
    TaskLifecycleService::new(ports, Arc::new(DefaultClock))
}

/// Builds a service over recording adapters.
#[must_use]
pub fn recording_service(info: &ActivityInfo) -> TestService {
    service_with(
        Arc::new(RecordingEventSink::new()),
        Arc::new(RecordingPersistQueue::new()),
        packages(info),
    )
}

/// Registers the default display and a stack in `mode`.
///
/// # Errors
///
/// Returns an error if the service rejects the display or the stack.
pub fn add_stack(service: &TestService, mode: WindowingMode) -> Result<StackId, eyre::Report> {
    let config = Configuration {
        rotation: Some(Rotation::Deg0),
        density_dpi: Some(160),
        ..Configuration::EMPTY
            .with_windowing_mode(WindowingMode::Fullscreen)
            .with_bounds(DISPLAY_BOUNDS)
    };
    service.add_display(DisplayId::DEFAULT, config)?;
    let stack = service.create_stack(
        DisplayId::DEFAULT,
        mode,
        ActivityType::Standard,
        ChildPosition::Top,
    )?;
    Ok(stack)
}

/// Launches `info` as the root of a new task in `stack`.
///
/// # Errors
///
/// Returns an error if the task cannot be created or its root added.
pub fn launch(
    service: &TestService,
    info: &ActivityInfo,
    stack: StackId,
) -> Result<TaskId, eyre::Report> {
    let intent = Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK);
    let id = service.create_task(
        &TaskLaunch::new(info.clone(), intent.clone()),
        stack,
        ChildPosition::Top,
    )?;
    let root = ActivityRecord::launch(ActivityLaunch::new(info.clone(), intent));
    service.add_activity(id, root, ChildPosition::Top)?;
    Ok(id)
}
