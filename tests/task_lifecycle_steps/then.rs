//! Then steps for task lifecycle BDD scenarios.

use super::world::{DISPLAY_BOUNDS, TaskLifecycleWorld};
use atelier::geometry::Rect;
use atelier::task::{
    domain::{ActivityRecord, ChildRemoval, ResizeMode, TaskDomainError, TaskId, affiliation},
    services::TaskLifecycleError,
};
use rstest_bdd_macros::then;

#[then("the resize is rejected for violating the orientation lock")]
fn resize_rejected(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_resize
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing resize result"))?;

    if !matches!(
        result,
        Err(TaskLifecycleError::Domain(
            TaskDomainError::BoundsViolateOrientationLock { .. }
        ))
    ) {
        return Err(eyre::eyre!(
            "expected BoundsViolateOrientationLock error, got {result:?}"
        ));
    }

    Ok(())
}

#[then(r#"task "{name}" has bounds "{bounds}""#)]
fn task_has_bounds(
    world: &TaskLifecycleWorld,
    name: String,
    bounds: String,
) -> Result<(), eyre::Report> {
    let expected: Rect = bounds.parse()?;
    let task = world.service.task(world.task(&name)?)?;

    if task.bounds() != expected {
        return Err(eyre::eyre!("expected bounds {expected}, found {}", task.bounds()));
    }

    Ok(())
}

#[then(r#"task "{name}" fills its parent"#)]
fn task_fills_parent(world: &TaskLifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let task = world.service.task(world.task(&name)?)?;

    if !task.matches_parent_bounds() || task.bounds() != DISPLAY_BOUNDS {
        return Err(eyre::eyre!(
            "expected task to fill {DISPLAY_BOUNDS}, found {} (requested {})",
            task.bounds(),
            task.requested_bounds()
        ));
    }

    Ok(())
}

#[then(r#"task "{name}" lists activities "{order}""#)]
fn task_lists_activities(
    world: &TaskLifecycleWorld,
    name: String,
    order: String,
) -> Result<(), eyre::Report> {
    let task = world.service.task(world.task(&name)?)?;
    let actual: Vec<&str> = task
        .children()
        .iter()
        .map(ActivityRecord::id)
        .map(|id| world.activities.get(&id).map_or("?", String::as_str))
        .collect();
    let expected: Vec<&str> = order.split(',').map(str::trim).collect();

    if actual != expected {
        return Err(eyre::eyre!("expected activities {expected:?}, found {actual:?}"));
    }

    Ok(())
}

#[then("the removal reports the activity absent")]
fn removal_absent(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    match world.last_removal {
        Some(ChildRemoval::Absent) => Ok(()),
        other => Err(eyre::eyre!("expected an absent removal, got {other:?}")),
    }
}

#[then(r#"task "{name}" holds {count:usize} activities"#)]
fn task_holds_activities(
    world: &TaskLifecycleWorld,
    name: String,
    count: usize,
) -> Result<(), eyre::Report> {
    let task = world.service.task(world.task(&name)?)?;

    if task.children().len() != count {
        return Err(eyre::eyre!(
            "expected {count} activities, found {}",
            task.children().len()
        ));
    }

    Ok(())
}

#[then(r#"task "{name}" follows task "{other}" in its affiliation chain"#)]
fn task_follows(
    world: &TaskLifecycleWorld,
    name: String,
    other: String,
) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    let previous = world.task(&other)?;
    let task = world.service.task(id)?;
    let before = world.service.task(previous)?;

    if before.next_affiliate() != Some(id) || task.prev_affiliate() != Some(previous) {
        return Err(eyre::eyre!(
            "expected {previous} -> {id}, found next {:?} and prev {:?}",
            before.next_affiliate(),
            task.prev_affiliate()
        ));
    }

    Ok(())
}

#[then(r#"task "{name}" ends its affiliation chain"#)]
fn task_ends_chain(world: &TaskLifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let task = world.service.task(world.task(&name)?)?;

    if let Some(next) = task.next_affiliate() {
        return Err(eyre::eyre!("expected chain end, found next affiliate {next}"));
    }

    Ok(())
}

#[then("every affiliation chain is symmetric")]
fn chains_symmetric(world: &TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let symmetric = world
        .service
        .inspect(|hierarchy| affiliation::chains_are_symmetric(hierarchy.tasks()))?;

    if !symmetric {
        return Err(eyre::eyre!("affiliation links are not symmetric"));
    }

    Ok(())
}

#[then(r#"restored task {task_id:i32} has resize mode "{mode}""#)]
fn restored_resize_mode(
    world: &TaskLifecycleWorld,
    task_id: i32,
    mode: String,
) -> Result<(), eyre::Report> {
    let expected = ResizeMode::try_from(mode.as_str())
        .map_err(|err| eyre::eyre!("invalid resize mode in scenario: {err}"))?;
    let id = TaskId::new(task_id)?;

    if !world.restored.contains(&id) {
        return Err(eyre::eyre!("task {id} was not restored, got {:?}", world.restored));
    }
    let task = world.service.task(id)?;
    if task.resize_mode() != expected {
        return Err(eyre::eyre!(
            "expected resize mode {expected}, found {}",
            task.resize_mode()
        ));
    }

    Ok(())
}
