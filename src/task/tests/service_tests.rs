//! Lifecycle service orchestration over the in-memory adapters.

use std::sync::Arc;

use super::fixtures::{component, info, intent_for, overlay, record, record_with};
use crate::container::{
    ChildPosition, FrontPolicy, ReparentRequest, Reparentable, Resizable, ResizeRequest,
};
use crate::geometry::{Configuration, Rect, Rotation, WindowingMode};
use crate::task::{
    adapters::memory::{
        InMemoryTaskRecordStore, RecordingEventSink, RecordingPersistQueue,
        RecordingVoiceInteraction, StaticDisplayEnvironment, StaticPackageResolver,
        StaticRecentsPolicy,
    },
    domain::{
        ActivityId, ActivityInfo, ActivityRecord, ActivityType, ChildRemoval, DisplayId, Intent,
        IntentFlags, PersistableMode, ProcessId, ResizeMode, StackId, TaskDomainError, TaskEvent,
        TaskId, TaskLaunch, TaskLifecycleState, Uid, UserId,
    },
    persistence::RecordElement,
    ports::{EventDeliveryError, PersistRequest, TaskEventSink, TaskRecordStore},
    services::{TaskLifecycleError, TaskLifecycleService, TaskPolicyConfig, TaskPorts},
};
use eyre::ensure;
use mockable::DefaultClock;
use mockall::mock;
use rstest::{fixture, rstest};

const DISPLAY_BOUNDS: Rect = Rect::new(0, 0, 1000, 2000);

fn display_config(bounds: Rect, rotation: Rotation) -> Configuration {
    Configuration {
        rotation: Some(rotation),
        density_dpi: Some(160),
        ..Configuration::EMPTY
            .with_windowing_mode(WindowingMode::Fullscreen)
            .with_bounds(bounds)
    }
}

struct Harness {
    service: TaskLifecycleService<DefaultClock>,
    events: RecordingEventSink,
    display: StaticDisplayEnvironment,
    voice: RecordingVoiceInteraction,
    queue: RecordingPersistQueue,
    home: StackId,
    fullscreen: StackId,
    freeform: StackId,
}

impl Harness {
    fn new(
        recents: StaticRecentsPolicy,
        packages: StaticPackageResolver,
        config: TaskPolicyConfig,
    ) -> Self {
        let events = RecordingEventSink::new();
        let display = StaticDisplayEnvironment::new();
        let voice = RecordingVoiceInteraction::new();
        let queue = RecordingPersistQueue::new();
        let ports = TaskPorts {
            events: Arc::new(events.clone()),
            display: Arc::new(display.clone()),
            recents: Arc::new(recents),
            packages: Arc::new(packages),
            voice: Arc::new(voice.clone()),
            persistence: Arc::new(queue.clone()),
        };
        let service = TaskLifecycleService::new(ports, Arc::new(DefaultClock)).with_config(config);
        service
            .add_display(DisplayId::DEFAULT, display_config(DISPLAY_BOUNDS, Rotation::Deg0))
            .expect("display registers");
        let stack = |mode, activity_type| {
            service
                .create_stack(DisplayId::DEFAULT, mode, activity_type, ChildPosition::Top)
                .expect("stack registers")
        };
        let home = stack(WindowingMode::Fullscreen, ActivityType::Home);
        let fullscreen = stack(WindowingMode::Fullscreen, ActivityType::Standard);
        let freeform = stack(WindowingMode::Freeform, ActivityType::Standard);
        Self {
            service,
            events,
            display,
            voice,
            queue,
            home,
            fullscreen,
            freeform,
        }
    }

    fn launch_info(&self, info: ActivityInfo, stack: StackId) -> (TaskId, ActivityId) {
        let intent = Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK);
        let launch = TaskLaunch::new(info.clone(), intent);
        self.launch_with(&launch, info, stack)
    }

    fn launch_with(
        &self,
        launch: &TaskLaunch,
        info: ActivityInfo,
        stack: StackId,
    ) -> (TaskId, ActivityId) {
        let id = self
            .service
            .create_task(launch, stack, ChildPosition::Top)
            .expect("task is created");
        let root = record_with(info, IntentFlags::NEW_TASK);
        let activity = root.id();
        self.service
            .add_activity(id, root, ChildPosition::Top)
            .expect("root activity is added");
        (id, activity)
    }

    fn launch(&self, stack: StackId) -> (TaskId, ActivityId) {
        self.launch_info(info("Main"), stack)
    }

    /// Launches a task whose root activity is visible and running.
    fn launch_running(&self, stack: StackId) -> (TaskId, ActivityId) {
        let launch = TaskLaunch::new(info("Main"), intent_for("Main", IntentFlags::NEW_TASK));
        let id = self
            .service
            .create_task(&launch, stack, ChildPosition::Top)
            .expect("task is created");
        let mut root = record("Main");
        root.set_visible(true);
        root.set_has_process(true);
        let activity = root.id();
        self.service
            .add_activity(id, root, ChildPosition::Top)
            .expect("root activity is added");
        (id, activity)
    }

    fn relaunch_count(&self, id: TaskId, activity: ActivityId) -> u32 {
        self.service
            .task(id)
            .expect("task exists")
            .child(activity)
            .map_or(0, ActivityRecord::relaunch_count)
    }

    fn state(&self, id: TaskId) -> TaskLifecycleState {
        self.service.task(id).expect("task exists").state()
    }
}

fn info_with_mode(class: &str, mode: ResizeMode) -> ActivityInfo {
    let mut info = info(class);
    info.resize_mode = mode;
    info
}

#[fixture]
fn harness() -> Harness {
    Harness::new(
        StaticRecentsPolicy::new(),
        StaticPackageResolver::new(),
        TaskPolicyConfig::default(),
    )
}

mock! {
    FailingSink {}

    impl TaskEventSink for FailingSink {
        fn publish(&self, events: &[TaskEvent]) -> Result<(), EventDeliveryError>;
    }
}

// Creation

#[rstest]
fn create_task_attaches_and_publishes_one_batch(harness: Harness) {
    harness.events.clear();
    let launch = TaskLaunch::new(info("Main"), intent_for("Main", IntentFlags::NEW_TASK));

    let id = harness
        .service
        .create_task(&launch, harness.fullscreen, ChildPosition::Top)
        .expect("task is created");

    let batches = harness.events.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches.first().map(Vec::as_slice),
        Some(
            [
                TaskEvent::TaskCreated {
                    task: id,
                    real_activity: Some(component("Main")),
                },
                TaskEvent::TaskStackChanged,
            ]
            .as_slice()
        )
    );
    assert_eq!(harness.state(id), TaskLifecycleState::Attached);
    assert_eq!(
        harness.service.inspect(|hierarchy| hierarchy.stack_of(id)).expect("lock"),
        Some(harness.fullscreen)
    );
    assert_eq!(harness.service.visible_recents().expect("lock"), vec![id]);
}

#[rstest]
fn create_task_in_unknown_stack_is_rejected(harness: Harness) {
    let launch = TaskLaunch::new(info("Main"), intent_for("Main", IntentFlags::NEW_TASK));

    let result = harness
        .service
        .create_task(&launch, StackId::new(99), ChildPosition::Top);

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::UnknownStack(_)))
    ));
    assert!(harness.service.visible_recents().expect("lock").is_empty());
}

#[rstest]
fn event_delivery_failure_does_not_fail_the_mutation() {
    let mut sink = MockFailingSink::new();
    sink.expect_publish()
        .returning(|_| Err(EventDeliveryError("renderer gone".to_owned())));
    let ports = TaskPorts {
        events: Arc::new(sink),
        display: Arc::new(StaticDisplayEnvironment::new()),
        recents: Arc::new(StaticRecentsPolicy::new()),
        packages: Arc::new(StaticPackageResolver::new()),
        voice: Arc::new(RecordingVoiceInteraction::new()),
        persistence: Arc::new(RecordingPersistQueue::new()),
    };
    let service = TaskLifecycleService::new(ports, Arc::new(DefaultClock));
    service
        .add_display(DisplayId::DEFAULT, display_config(DISPLAY_BOUNDS, Rotation::Deg0))
        .expect("display registers");
    let stack = service
        .create_stack(
            DisplayId::DEFAULT,
            WindowingMode::Fullscreen,
            ActivityType::Standard,
            ChildPosition::Top,
        )
        .expect("stack registers");
    let launch = TaskLaunch::new(info("Main"), intent_for("Main", IntentFlags::NEW_TASK));

    let result = service.create_task(&launch, stack, ChildPosition::Top);

    assert!(result.is_ok());
}

#[rstest]
fn deferral_guard_batches_several_calls(harness: Harness) -> eyre::Result<()> {
    let before = harness.events.batches().len();
    {
        let _deferral = harness.service.defer_layout()?;
        harness.launch(harness.fullscreen);
        harness.launch(harness.fullscreen);
        ensure!(
            harness.events.batches().len() == before,
            "events must wait for the guard"
        );
    }

    let batches = harness.events.batches();
    ensure!(batches.len() == before + 1, "expected exactly one new batch");
    let created = batches
        .last()
        .map_or(0, |batch| {
            batch
                .iter()
                .filter(|event| matches!(event, TaskEvent::TaskCreated { .. }))
                .count()
        });
    ensure!(created == 2, "both creations share the batch");
    Ok(())
}

// Resize

#[rstest]
fn orientation_locked_freeform_task_rejects_landscape_bounds(harness: Harness) {
    let (id, _) = harness.launch_info(
        info_with_mode("Portrait", ResizeMode::ForceResizablePortraitOnly),
        harness.freeform,
    );

    let result = harness
        .service
        .resize(id, ResizeRequest::to(Some(Rect::new(0, 0, 800, 400))));

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(
            TaskDomainError::BoundsViolateOrientationLock { .. }
        ))
    ));
    assert!(harness.service.task(id).expect("task exists").matches_parent_bounds());
}

#[rstest]
fn freeform_resize_applies_bounds_and_persists(harness: Harness) {
    let (id, _) = harness.launch(harness.freeform);
    let bounds = Rect::new(100, 100, 500, 900);

    let kept = harness
        .service
        .resize(id, ResizeRequest::to(Some(bounds)))
        .expect("resize accepted");

    assert!(kept);
    let task = harness.service.task(id).expect("task exists");
    assert_eq!(task.bounds(), bounds);
    assert_eq!(task.last_non_fullscreen_bounds(), Some(bounds));
    assert_eq!(task.state(), TaskLifecycleState::Attached);
    assert!(harness
        .events
        .events()
        .contains(&TaskEvent::TaskBoundsChanged { task: id, bounds }));
    assert!(harness.queue.saved_tasks().contains(&id));
}

#[rstest]
fn resizing_to_nothing_fills_the_parent(harness: Harness) {
    let (id, _) = harness.launch(harness.freeform);
    harness
        .service
        .resize(id, ResizeRequest::to(Some(Rect::new(100, 100, 500, 900))))
        .expect("resize accepted");

    harness
        .service
        .resize(id, ResizeRequest::to(None))
        .expect("resize accepted");

    let task = harness.service.task(id).expect("task exists");
    assert!(task.matches_parent_bounds());
    assert_eq!(task.bounds(), DISPLAY_BOUNDS);
}

#[rstest]
fn unresizeable_task_still_follows_resize_requests(harness: Harness) {
    let (id, _) = harness.launch_info(
        info_with_mode("Fixed", ResizeMode::Unresizeable),
        harness.fullscreen,
    );
    let split = Rect::new(0, 0, 500, 1000);

    harness
        .service
        .resize(id, ResizeRequest::to(Some(split)))
        .expect("resize applied");
    assert_eq!(harness.service.task(id).expect("task exists").requested_bounds(), split);

    harness.events.clear();
    harness
        .service
        .resize(id, ResizeRequest::to(None))
        .expect("resize applied");

    let task = harness.service.task(id).expect("task exists");
    assert!(task.matches_parent_bounds());
    assert!(harness
        .events
        .events()
        .iter()
        .any(|event| matches!(event, TaskEvent::TaskBoundsChanged { task, .. } if *task == id)));
}

#[rstest]
fn resizing_visible_activity_relaunches_it(harness: Harness) {
    let (id, activity) = harness.launch_running(harness.freeform);
    let before = harness.relaunch_count(id, activity);
    harness.events.clear();

    let kept = harness
        .service
        .resize(id, ResizeRequest::to(Some(Rect::new(0, 0, 400, 800))))
        .expect("resize applied");

    assert!(!kept);
    assert!(harness
        .events
        .events()
        .contains(&TaskEvent::ActivityRelaunched { task: id, activity }));
    assert_eq!(harness.relaunch_count(id, activity), before + 1);
}

#[rstest]
fn deferred_resume_leaves_activity_alone(harness: Harness) {
    let (id, activity) = harness.launch_running(harness.freeform);
    harness
        .service
        .resize(id, ResizeRequest::to(Some(Rect::new(0, 0, 400, 800))))
        .expect("resize applied");
    let before = harness.relaunch_count(id, activity);
    harness.events.clear();

    let kept = harness
        .service
        .resize(
            id,
            ResizeRequest {
                defer_resume: true,
                ..ResizeRequest::to(Some(Rect::new(0, 0, 800, 400)))
            },
        )
        .expect("resize applied");

    assert!(kept);
    let events = harness.events.events();
    assert!(!events.contains(&TaskEvent::ActivityRelaunched { task: id, activity }));
    assert!(!events.contains(&TaskEvent::LayoutRequested));
    assert_eq!(harness.relaunch_count(id, activity), before);
    assert_eq!(
        harness.service.task(id).expect("task exists").requested_bounds(),
        Rect::new(0, 0, 800, 400)
    );
}

// Reparent

#[rstest]
fn reparenting_visible_activity_relaunches_it(harness: Harness) {
    let (id, activity) = harness.launch_running(harness.fullscreen);
    let before = harness.relaunch_count(id, activity);
    harness.events.clear();

    let moved = harness
        .service
        .reparent(id, ReparentRequest::to(harness.freeform))
        .expect("reparent accepted");

    assert!(moved);
    assert!(harness
        .events
        .events()
        .contains(&TaskEvent::ActivityRelaunched { task: id, activity }));
    assert_eq!(harness.relaunch_count(id, activity), before + 1);
}

#[rstest]
fn pinned_bounds_are_not_grown_to_default_minimum(harness: Harness) {
    let pinned = harness
        .service
        .create_stack(
            DisplayId::DEFAULT,
            WindowingMode::Pinned,
            ActivityType::Standard,
            ChildPosition::Top,
        )
        .expect("stack registers");
    let small = Rect::new(0, 0, 100, 100);
    harness
        .service
        .set_stack_bounds(pinned, Some(small))
        .expect("stack bounds set");
    let (id, _) = harness.launch(harness.fullscreen);

    harness
        .service
        .reparent(id, ReparentRequest::to(pinned))
        .expect("reparent accepted");

    let task = harness.service.task(id).expect("task exists");
    assert_eq!(task.windowing_mode(), WindowingMode::Pinned);
    assert_eq!(task.bounds(), small);
}

#[rstest]
fn entering_freeform_lays_out_a_centred_window(harness: Harness) {
    let (id, _) = harness.launch(harness.fullscreen);

    let moved = harness
        .service
        .reparent(id, ReparentRequest::to(harness.freeform))
        .expect("reparent accepted");

    assert!(moved);
    let task = harness.service.task(id).expect("task exists");
    assert_eq!(task.bounds(), Rect::new(250, 500, 750, 1500));
    assert_eq!(task.windowing_mode(), WindowingMode::Freeform);
    assert_eq!(task.state(), TaskLifecycleState::Attached);
    assert!(task.replace_windows_on_move());
    let events = harness.events.events();
    assert!(events.contains(&TaskEvent::TaskMovedToStack {
        task: id,
        from: Some(harness.fullscreen),
        to: harness.freeform,
    }));
    assert!(events.contains(&TaskEvent::MultiWindowModeChanged {
        task: id,
        multi_window: true,
    }));
}

#[rstest]
fn reparent_to_current_stack_is_a_no_op(harness: Harness) {
    let (id, _) = harness.launch(harness.fullscreen);
    harness.events.clear();

    let moved = harness
        .service
        .reparent(id, ReparentRequest::to(harness.fullscreen))
        .expect("request is valid");

    assert!(!moved);
    assert!(harness.events.events().is_empty());
}

#[rstest]
fn refusing_display_keeps_task_in_place(harness: Harness) {
    let (id, _) = harness.launch(harness.fullscreen);
    harness.display.refuse_tasks_on(DisplayId::DEFAULT);

    let moved = harness
        .service
        .reparent(id, ReparentRequest::to(harness.freeform))
        .expect("request is valid");

    assert!(!moved);
    assert_eq!(
        harness.service.inspect(|hierarchy| hierarchy.stack_of(id)).expect("lock"),
        Some(harness.fullscreen)
    );
}

#[rstest]
fn unresizeable_task_cannot_enter_freeform(harness: Harness) {
    let (id, _) = harness.launch_info(
        info_with_mode("Fixed", ResizeMode::Unresizeable),
        harness.fullscreen,
    );

    let result = harness
        .service
        .reparent(id, ReparentRequest::to(harness.freeform));

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::NotResizeable(task))) if task == id
    ));
    assert_eq!(harness.state(id), TaskLifecycleState::Attached);
}

#[rstest]
fn reparent_to_front_moves_destination_stack_forward(harness: Harness) {
    let (id, _) = harness.launch(harness.freeform);
    let request = ReparentRequest {
        front_policy: FrontPolicy::MoveToFront,
        ..ReparentRequest::to(harness.fullscreen)
    };

    harness
        .service
        .reparent(id, request)
        .expect("reparent accepted");

    let (front, focused) = harness
        .service
        .inspect(|hierarchy| {
            (
                hierarchy.front_stack(DisplayId::DEFAULT),
                hierarchy.focused_stack(),
            )
        })
        .expect("lock");
    assert_eq!(front, Some(harness.fullscreen));
    assert_eq!(focused, Some(harness.fullscreen));
    assert!(harness.events.events().contains(&TaskEvent::StackMovedToFront {
        stack: harness.fullscreen,
    }));
}

// Removal

#[rstest]
fn removal_waits_for_running_transition(harness: Harness) {
    let (id, activity) = harness.launch(harness.fullscreen);
    harness.display.set_animating(id, true);

    let outcome = harness
        .service
        .remove_activity(id, activity)
        .expect("activity removed");

    assert_eq!(outcome, ChildRemoval::Emptied { destroy: true });
    assert_eq!(harness.state(id), TaskLifecycleState::PendingRemoval);
    assert!(harness
        .service
        .complete_pending_removals()
        .expect("lock")
        .is_empty());

    harness.display.set_animating(id, false);
    let removed = harness.service.complete_pending_removals().expect("lock");

    assert_eq!(removed, vec![id]);
    assert!(matches!(
        harness.service.task(id),
        Err(TaskLifecycleError::Domain(TaskDomainError::UnknownTask(_)))
    ));
    assert!(harness.events.events().contains(&TaskEvent::TaskRemoved { task: id }));
    assert!(harness.service.visible_recents().expect("lock").is_empty());
}

#[rstest]
fn new_activity_cancels_pending_removal(harness: Harness) {
    let (id, activity) = harness.launch(harness.fullscreen);
    harness.display.set_animating(id, true);
    harness
        .service
        .remove_activity(id, activity)
        .expect("activity removed");

    harness
        .service
        .add_activity(id, record("Main"), ChildPosition::Top)
        .expect("activity added");
    harness.display.set_animating(id, false);

    assert_eq!(harness.state(id), TaskLifecycleState::Attached);
    assert!(harness
        .service
        .complete_pending_removals()
        .expect("lock")
        .is_empty());
}

#[rstest]
fn lone_overlays_are_finished_and_task_removal_requested(harness: Harness) {
    let (id, root) = harness.launch(harness.fullscreen);
    let layer = overlay("Overlay");
    let layer_id = layer.id();
    harness
        .service
        .add_activity(id, layer, ChildPosition::Top)
        .expect("overlay added");

    let outcome = harness
        .service
        .remove_activity(id, root)
        .expect("root removed");

    assert_eq!(outcome, ChildRemoval::OnlyOverlaysRemain);
    let events = harness.events.events();
    assert!(events.contains(&TaskEvent::ActivityFinishRequested {
        task: id,
        activity: layer_id,
    }));
    assert!(events.contains(&TaskEvent::RemoveTaskRequested { task: id }));
    assert_eq!(harness.state(id), TaskLifecycleState::Attached);
}

#[rstest]
#[case(false, vec!["voice-1".to_owned()])]
#[case(true, Vec::new())]
fn voice_session_is_finished_on_removal(
    harness: Harness,
    #[case] unreachable: bool,
    #[case] expected: Vec<String>,
) {
    let launch = TaskLaunch {
        voice_session: Some("voice-1".to_owned()),
        ..TaskLaunch::new(info("Main"), intent_for("Main", IntentFlags::NEW_TASK))
    };
    let (id, _) = harness.launch_with(&launch, info("Main"), harness.fullscreen);
    harness.voice.set_unreachable(unreachable);

    let removed = harness.service.remove_task(id).expect("removal proceeds");

    assert!(removed);
    assert_eq!(harness.voice.finished(), expected);
    assert!(harness.service.task(id).is_err());
}

#[rstest]
fn removing_twice_is_rejected(harness: Harness) {
    let (id, _) = harness.launch(harness.fullscreen);
    harness.service.remove_task(id).expect("task removed");
    assert_eq!(harness.state(id), TaskLifecycleState::Removed);

    let result = harness.service.remove_task(id);

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::InvalidTransition { .. }))
    ));
}

#[rstest]
fn removing_task_finishes_its_activities_first(harness: Harness) {
    let (id, root) = harness.launch(harness.fullscreen);
    let detail = record("Detail");
    let detail_id = detail.id();
    harness
        .service
        .add_activity(id, detail, ChildPosition::Top)
        .expect("activity added");
    harness.events.clear();

    let removed = harness.service.remove_task(id).expect("task removed");

    assert!(removed);
    let task = harness.service.task(id).expect("task kept for recents");
    assert_eq!(task.state(), TaskLifecycleState::Removed);
    assert!(task.is_empty());
    let events = harness.events.events();
    for activity in [detail_id, root] {
        assert!(events.contains(&TaskEvent::ActivityFinishRequested { task: id, activity }));
    }
    assert!(events.contains(&TaskEvent::TaskRemoved { task: id }));
}

#[rstest]
fn removal_during_transition_empties_task_before_waiting(harness: Harness) {
    let (id, _) = harness.launch(harness.fullscreen);
    harness.display.set_animating(id, true);

    let removed = harness.service.remove_task(id).expect("removal starts");

    assert!(!removed);
    let task = harness.service.task(id).expect("task exists");
    assert_eq!(task.state(), TaskLifecycleState::PendingRemoval);
    assert!(task.is_empty());
}

// Clearing

#[rstest]
fn clearing_for_reuse_keeps_the_emptied_task(harness: Harness) {
    let (id, root) = harness.launch(harness.fullscreen);
    harness.events.clear();

    let outcome = harness
        .service
        .perform_clear_task_for_reuse(id, &component("Main"), IntentFlags::EMPTY)
        .expect("task cleared");

    assert_eq!(outcome.finished, vec![root]);
    assert_eq!(outcome.survivor, None);
    let task = harness.service.task(id).expect("task survives");
    assert_eq!(task.state(), TaskLifecycleState::Attached);
    assert!(task.is_empty());
    assert!(!task.reuse_in_progress());
    assert!(harness.events.events().contains(&TaskEvent::ActivityFinishRequested {
        task: id,
        activity: root,
    }));

    harness
        .service
        .add_activity(id, record("Main"), ChildPosition::Top)
        .expect("emptied task is reused");
    assert_eq!(harness.service.task(id).expect("task exists").children().iter().count(), 1);
}

#[rstest]
fn clearing_whole_task_keeps_it_in_recents(harness: Harness) {
    let (id, root) = harness.launch(harness.fullscreen);
    let detail = record("Detail");
    let detail_id = detail.id();
    harness
        .service
        .add_activity(id, detail, ChildPosition::Top)
        .expect("activity added");

    let finished = harness.service.perform_clear_task(id).expect("task cleared");

    assert_eq!(finished, vec![detail_id, root]);
    let task = harness.service.task(id).expect("task survives");
    assert_eq!(task.state(), TaskLifecycleState::Attached);
    assert!(task.is_empty());
    assert!(harness
        .service
        .complete_pending_removals()
        .expect("lock")
        .is_empty());
    assert_eq!(harness.service.visible_recents().expect("lock"), vec![id]);
}

#[rstest]
fn removed_task_that_was_shown_stays_in_recents() {
    let mut persisted = info("Main");
    persisted.persistable_mode = PersistableMode::AcrossReboots;
    let harness = Harness::new(
        StaticRecentsPolicy::new(),
        StaticPackageResolver::new().with_activity(persisted.clone()),
        TaskPolicyConfig::default(),
    );
    let (source, _) = harness.launch_info(persisted, harness.fullscreen);
    let record = harness.service.task_record(source).expect("task encodes");
    harness.service.remove_task(source).expect("source removed");
    harness.service.removed_from_recents(source).expect("source forgotten");

    let id = harness
        .service
        .restore_task(record, Some(harness.fullscreen))
        .expect("task restores");
    let activity = harness
        .service
        .task(id)
        .expect("task exists")
        .children()
        .top()
        .map(|child| child.id())
        .expect("activity restored");
    harness
        .service
        .remove_activity(id, activity)
        .expect("activity removed");

    assert_eq!(harness.state(id), TaskLifecycleState::Removed);
    assert_eq!(harness.service.visible_recents().expect("lock"), vec![id]);

    let listed = harness.service.removed_from_recents(id).expect("task known");

    assert!(listed);
    assert!(harness.service.task(id).is_err());
    assert_eq!(
        harness.queue.requests().last(),
        Some(&PersistRequest::Remove { task: id })
    );
}

#[rstest]
fn unresizeable_task_cannot_be_restored_into_freeform(harness: Harness) {
    let (source, _) = harness.launch_info(
        info_with_mode("Fixed", ResizeMode::Unresizeable),
        harness.fullscreen,
    );
    let record = harness.service.task_record(source).expect("task encodes");
    harness.service.remove_task(source).expect("source removed");
    harness.service.removed_from_recents(source).expect("source forgotten");

    let result = harness
        .service
        .restore_task(record.clone(), Some(harness.freeform));

    assert!(matches!(
        result,
        Err(TaskLifecycleError::Domain(TaskDomainError::NotResizeable(task))) if task == source
    ));
    assert!(harness.service.task(source).is_err());
    let id = harness
        .service
        .restore_task(record, Some(harness.fullscreen))
        .expect("fullscreen restore accepted");
    assert_eq!(harness.state(id), TaskLifecycleState::Attached);
}

// Rotation

#[rstest]
fn freeform_task_keeps_its_physical_position_across_rotation(harness: Harness) {
    let (id, _) = harness.launch(harness.freeform);
    let original = Rect::new(100, 200, 500, 1000);
    harness
        .service
        .resize(id, ResizeRequest::to(Some(original)))
        .expect("resize accepted");

    let rotated = harness
        .service
        .on_display_changed(
            DisplayId::DEFAULT,
            display_config(Rect::new(0, 0, 2000, 1000), Rotation::Deg90),
        )
        .expect("display known");

    assert_eq!(rotated, vec![id]);
    assert_eq!(
        harness.service.task(id).expect("task exists").bounds(),
        Rect::new(1000, 100, 1800, 500)
    );

    harness
        .service
        .on_display_changed(DisplayId::DEFAULT, display_config(DISPLAY_BOUNDS, Rotation::Deg0))
        .expect("display known");

    assert_eq!(harness.service.task(id).expect("task exists").bounds(), original);
}

#[rstest]
fn fullscreen_tasks_follow_rotation_without_moving(harness: Harness) {
    let (id, _) = harness.launch(harness.fullscreen);

    let rotated = harness
        .service
        .on_display_changed(
            DisplayId::DEFAULT,
            display_config(Rect::new(0, 0, 2000, 1000), Rotation::Deg90),
        )
        .expect("display known");

    assert!(rotated.is_empty());
    assert!(harness.service.task(id).expect("task exists").matches_parent_bounds());
}

// Recents, affiliation and ordering

#[rstest]
fn locked_profiles_are_hidden_from_recents() {
    let locked = UserId::new(10);
    let harness = Harness::new(
        StaticRecentsPolicy::new().with_locked_profile(locked),
        StaticPackageResolver::new(),
        TaskPolicyConfig::default(),
    );
    let (visible, _) = harness.launch(harness.fullscreen);
    let mut work_info = info("Work");
    work_info.uid = Uid::new(10 * Uid::PER_USER_RANGE + 42);
    let work = TaskLaunch {
        user_id: locked,
        ..TaskLaunch::new(work_info.clone(), intent_for("Work", IntentFlags::NEW_TASK))
    };
    let (hidden, _) = harness.launch_with(&work, work_info, harness.fullscreen);

    let recents = harness.service.visible_recents().expect("lock");

    assert_eq!(recents, vec![visible]);
    assert!(harness.service.task(hidden).expect("task exists").in_recents());
}

#[rstest]
fn moving_to_front_reorders_stack_and_recents(harness: Harness) {
    let (first, _) = harness.launch(harness.fullscreen);
    let (second, _) = harness.launch(harness.fullscreen);

    let moved = harness.service.move_task_to_front(first).expect("task known");

    assert!(moved);
    let (order, front) = harness
        .service
        .inspect(|hierarchy| {
            (
                hierarchy.tasks_in(harness.fullscreen),
                hierarchy.front_stack(DisplayId::DEFAULT),
            )
        })
        .expect("lock");
    assert_eq!(order, vec![second, first]);
    assert_eq!(front, Some(harness.fullscreen));
    assert_eq!(harness.service.visible_recents().expect("lock"), vec![first, second]);
    assert!(harness.service.task(first).expect("task exists").last_time_moved() > 0);
}

#[rstest]
fn affiliating_links_both_directions_and_persists(harness: Harness) {
    let (leader, _) = harness.launch(harness.fullscreen);
    let (member, _) = harness.launch(harness.fullscreen);

    let repairs = harness
        .service
        .set_task_to_affiliate_with(member, leader)
        .expect("both tasks known");

    assert!(repairs.is_empty());
    let head = harness.service.task(leader).expect("task exists");
    let tail = harness.service.task(member).expect("task exists");
    assert_eq!(head.next_affiliate(), Some(member));
    assert_eq!(tail.prev_affiliate(), Some(leader));
    assert_eq!(tail.affiliated_task_id(), leader);
    let saved = harness.queue.saved_tasks();
    assert!(saved.contains(&leader) && saved.contains(&member));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restore_lists_most_recently_moved_first(harness: Harness) -> eyre::Result<()> {
    let store = InMemoryTaskRecordStore::new();
    for (id, moved) in [(3, "300"), (4, "100"), (5, "200")] {
        let task = TaskId::new(id)?;
        let element = RecordElement::new("task")
            .with_attribute("task_id", id.to_string())
            .with_attribute("last_time_moved", moved);
        store.save(task, &element).await?;
    }
    store.save(TaskId::new(9)?, &RecordElement::new("window")).await?;

    let restored = harness.service.restore_from_store(&store).await?;

    let expected = [3, 5, 4]
        .into_iter()
        .map(TaskId::new)
        .collect::<Result<Vec<_>, _>>()?;
    ensure!(restored == expected, "unexpected restore order {restored:?}");
    ensure!(
        harness.service.visible_recents()? == expected,
        "recents should match the restore order"
    );
    ensure!(
        harness
            .service
            .task(TaskId::new(3)?)?
            .state()
            == TaskLifecycleState::Unattached,
        "restored tasks wait for a stack"
    );
    Ok(())
}

#[rstest]
fn split_screen_follows_device_policy() {
    let handheld = Harness::new(
        StaticRecentsPolicy::new(),
        StaticPackageResolver::new(),
        TaskPolicyConfig::handheld(),
    );
    let (on_handheld, _) = handheld.launch(handheld.fullscreen);
    let regular = Harness::new(
        StaticRecentsPolicy::new(),
        StaticPackageResolver::new(),
        TaskPolicyConfig::default(),
    );
    let (on_regular, _) = regular.launch(regular.fullscreen);

    assert!(!handheld.service.supports_split_screen(on_handheld).expect("task known"));
    assert!(regular.service.supports_split_screen(on_regular).expect("task known"));
}

#[rstest]
fn root_process_is_tracked_until_removal(harness: Harness) {
    let (id, _) = harness.launch(harness.home);

    let recorded = harness
        .service
        .set_root_process(id, ProcessId::new(4242))
        .expect("task known");

    assert!(recorded);
    assert!(harness.service.task(id).expect("task exists").root_process().is_some());
}
