//! Integration tests driving the lifecycle service through its adapters.

use std::sync::Arc;

use super::helpers::{
    DISPLAY_BOUNDS, add_stack, inbox, launch, packages, recording_service, service_with,
};
use atelier::container::{
    ChildPosition, ReparentRequest, Reparentable, Resizable, ResizeRequest,
};
use atelier::geometry::{Rect, WindowingMode};
use atelier::task::{
    adapters::{
        BroadcastEventSink, FsTaskRecordStore,
        memory::{RecordingEventSink, RecordingPersistQueue},
        persist_channel,
    },
    domain::{ActivityInfo, ActivityType, DisplayId, TaskEvent, TaskLifecycleState},
    ports::TaskRecordStore,
};
use camino::Utf8Path;
use eyre::{OptionExt, ensure};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_records_survive_a_restart(inbox: ActivityInfo) -> eyre::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = Utf8Path::from_path(temp.path()).ok_or_eyre("temp dir is not UTF-8")?;
    let store = Arc::new(FsTaskRecordStore::open(&root.join("recent_tasks"))?);
    let (queue, worker) = persist_channel();
    let writer = worker.spawn(Arc::clone(&store));
    let bounds = Rect::new(100, 200, 700, 1400);

    let (id, written) = {
        let service = service_with(
            Arc::new(RecordingEventSink::new()),
            Arc::new(queue),
            packages(&inbox),
        );
        let freeform = add_stack(&service, WindowingMode::Freeform)?;
        let id = launch(&service, &inbox, freeform)?;
        service.resize(id, ResizeRequest::to(Some(bounds)))?;
        (id, service.task_record(id)?)
    };
    let report = writer.await?;

    ensure!(report.failed == 0, "no write failed: {report:?}");
    ensure!(
        store.load(id).await? == Some(written),
        "the newest record reached disk"
    );

    let restarted = recording_service(&inbox);
    let restored = restarted.restore_from_store(store.as_ref()).await?;
    ensure!(restored == vec![id], "the task is listed again");
    let task = restarted.task(id)?;
    ensure!(
        task.state() == TaskLifecycleState::Unattached,
        "restored tasks wait for a stack"
    );
    ensure!(
        task.last_non_fullscreen_bounds() == Some(bounds),
        "freeform bounds are remembered"
    );
    ensure!(task.children().len() == 1, "the root activity is restored");
    ensure!(task.real_activity() == Some(&inbox.component), "identity restored");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn emptied_task_loses_its_record(inbox: ActivityInfo) -> eyre::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = Utf8Path::from_path(temp.path()).ok_or_eyre("temp dir is not UTF-8")?;
    let store = Arc::new(FsTaskRecordStore::open(root)?);
    let (queue, worker) = persist_channel();
    let writer = worker.spawn(Arc::clone(&store));

    let id = {
        let service = service_with(
            Arc::new(RecordingEventSink::new()),
            Arc::new(queue),
            packages(&inbox),
        );
        let fullscreen = add_stack(&service, WindowingMode::Fullscreen)?;
        let id = launch(&service, &inbox, fullscreen)?;
        let root_activity = service
            .task(id)?
            .root_activity()
            .map(|record| record.id())
            .ok_or_eyre("task has a root activity")?;
        service.remove_activity(id, root_activity)?;
        ensure!(
            service.visible_recents()?.is_empty(),
            "never-visible empty task leaves recents"
        );
        id
    };
    let report = writer.await?;

    ensure!(report.failed == 0, "no write failed: {report:?}");
    ensure!(store.load(id).await?.is_none(), "record was deleted");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn subscribers_see_each_mutation_as_one_batch(inbox: ActivityInfo) -> eyre::Result<()> {
    let sink = Arc::new(BroadcastEventSink::new(16));
    let mut receiver = sink.subscribe();
    let service = service_with(
        sink,
        Arc::new(RecordingPersistQueue::new()),
        packages(&inbox),
    );
    let fullscreen = add_stack(&service, WindowingMode::Fullscreen)?;
    let freeform = service.create_stack(
        DisplayId::DEFAULT,
        WindowingMode::Freeform,
        ActivityType::Standard,
        ChildPosition::Top,
    )?;
    let id = launch(&service, &inbox, fullscreen)?;
    while receiver.try_recv().is_ok() {}

    ensure!(
        service.reparent(id, ReparentRequest::to(freeform))?,
        "task moves into freeform"
    );

    let batch = receiver.recv().await?;
    ensure!(
        batch.contains(&TaskEvent::TaskMovedToStack {
            task: id,
            from: Some(fullscreen),
            to: freeform,
        }),
        "move is announced: {batch:?}"
    );
    ensure!(
        batch.contains(&TaskEvent::LayoutRequested),
        "layout follows in the same batch"
    );
    ensure!(receiver.try_recv().is_err(), "one batch per reparent");
    let task = service.task(id)?;
    ensure!(
        DISPLAY_BOUNDS.contains(&task.bounds()) && task.bounds() != DISPLAY_BOUNDS,
        "freeform window sits inside the display"
    );
    Ok(())
}
