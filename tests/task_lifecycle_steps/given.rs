//! Given steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, run_async};
use atelier::task::{
    domain::{ResizeMode, TaskId},
    persistence::RecordElement,
    ports::TaskRecordStore,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("a display with fullscreen and freeform stacks")]
fn display_with_stacks(world: &mut TaskLifecycleWorld) -> Result<(), eyre::Report> {
    world
        .add_default_display()
        .wrap_err("register display for scenario")
}

#[given(r#"a task "{name}" in the "{stack}" stack"#)]
fn task_in_stack(
    world: &mut TaskLifecycleWorld,
    name: String,
    stack: String,
) -> Result<(), eyre::Report> {
    let target = world.stack(&stack)?;
    world
        .launch(&name, target, ResizeMode::Resizeable)
        .wrap_err("launch task for scenario")?;
    Ok(())
}

#[given(r#"a "{mode}" task "{name}" in the "{stack}" stack"#)]
fn task_with_resize_mode(
    world: &mut TaskLifecycleWorld,
    mode: String,
    name: String,
    stack: String,
) -> Result<(), eyre::Report> {
    let resize_mode = ResizeMode::try_from(mode.as_str())
        .map_err(|err| eyre::eyre!("invalid resize mode in scenario: {err}"))?;
    let target = world.stack(&stack)?;
    world
        .launch(&name, target, resize_mode)
        .wrap_err("launch task for scenario")?;
    Ok(())
}

#[given(
    r#"a stored version 0 record for task {task_id:i32} with task type {task_type:i32} and resize mode "{mode}""#
)]
fn stored_legacy_record(
    world: &mut TaskLifecycleWorld,
    task_id: i32,
    task_type: i32,
    mode: String,
) -> Result<(), eyre::Report> {
    let resize_mode = ResizeMode::try_from(mode.as_str())
        .map_err(|err| eyre::eyre!("invalid resize mode in scenario: {err}"))?;
    let id = TaskId::new(task_id)?;
    let record = RecordElement::new("task")
        .with_attribute("task_id", task_id.to_string())
        .with_attribute("persist_task_version", "0")
        .with_attribute("task_type", task_type.to_string())
        .with_attribute("resize_mode", resize_mode.ordinal().to_string());
    run_async(world.store.save(id, &record)).wrap_err("store legacy record")?;
    Ok(())
}
