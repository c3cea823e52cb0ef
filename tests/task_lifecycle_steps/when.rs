//! When steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, activity_info, activity_record, run_async};
use atelier::container::{Resizable, ResizeRequest};
use atelier::geometry::Rect;
use atelier::task::domain::IntentFlags;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"task "{name}" is resized to "{bounds}""#)]
fn resize_task(
    world: &mut TaskLifecycleWorld,
    name: String,
    bounds: String,
) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    let target: Rect = bounds.parse()?;
    world.last_resize = Some(world.service.resize(id, ResizeRequest::to(Some(target))));
    Ok(())
}

#[when(r#"task "{name}" is resized to fill its parent"#)]
fn resize_task_to_parent(world: &mut TaskLifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    world.last_resize = Some(world.service.resize(id, ResizeRequest::to(None)));
    Ok(())
}

#[when(r#"activity "{class}" is added to task "{name}""#)]
fn add_activity(
    world: &mut TaskLifecycleWorld,
    class: String,
    name: String,
) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    let record = activity_record(activity_info(&class)?, IntentFlags::EMPTY);
    world
        .add_activity(id, &class, record)
        .wrap_err("add activity in scenario")
}

#[when(r#"overlay activity "{class}" is added to task "{name}""#)]
fn add_overlay(
    world: &mut TaskLifecycleWorld,
    class: String,
    name: String,
) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    let record = activity_record(activity_info(&class)?, IntentFlags::EMPTY).as_task_overlay();
    world
        .add_activity(id, &class, record)
        .wrap_err("add overlay in scenario")
}

#[when(r#"an activity that was never added is removed from task "{name}""#)]
fn remove_unknown_activity(
    world: &mut TaskLifecycleWorld,
    name: String,
) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    let stranger = activity_record(activity_info("Stranger")?, IntentFlags::EMPTY);
    let outcome = world
        .service
        .remove_activity(id, stranger.id())
        .wrap_err("remove activity in scenario")?;
    world.last_removal = Some(outcome);
    Ok(())
}

#[when(r#"task "{name}" affiliates with task "{other}""#)]
fn affiliate(world: &mut TaskLifecycleWorld, name: String, other: String) -> Result<(), eyre::Report> {
    let id = world.task(&name)?;
    let target = world.task(&other)?;
    world
        .service
        .set_task_to_affiliate_with(id, target)
        .wrap_err("affiliate tasks in scenario")?;
    Ok(())
}

#[when("tasks are restored from the record store")]
fn restore_from_store(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    let restored = run_async(world.service.restore_from_store(&world.store))
        .wrap_err("restore tasks in scenario")?;
    world.restored = restored;
    Ok(())
}
