//! Affiliation chains: recency-ordered doubly linked groups of tasks.
//!
//! Links are stored on each task as identifiers. Every operation here keeps
//! them symmetric (`a.next == b` exactly when `b.prev == a`) and acyclic.

use super::{Task, TaskDomainError, TaskId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Which link of a task was severed during repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffiliationLink {
    /// The link to the previous task.
    Prev,
    /// The link to the next task.
    Next,
}

/// A link removed while repairing a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffiliationRepair {
    /// Task that held the link.
    pub task: TaskId,
    /// Which link was removed.
    pub link: AffiliationLink,
    /// Task the link pointed at.
    pub target: TaskId,
}

/// Removes `id` from its chain, joining its neighbours to each other.
pub fn close_recents_chain(tasks: &mut BTreeMap<TaskId, Task>, id: TaskId) {
    let Some(task) = tasks.get_mut(&id) else {
        return;
    };
    let prev = task.prev_affiliate();
    let next = task.next_affiliate();
    task.set_prev_affiliate(None);
    task.set_next_affiliate(None);
    if let Some(prev_task) = prev.and_then(|prev_id| tasks.get_mut(&prev_id)) {
        prev_task.set_next_affiliate(next);
    }
    if let Some(next_task) = next.and_then(|next_id| tasks.get_mut(&next_id)) {
        next_task.set_prev_affiliate(prev);
    }
}

/// Moves `id` to the tail of the chain containing `other`.
///
/// `id` first leaves its own chain and adopts `other`'s affiliation. Any
/// inconsistency found while walking to the tail triggers a full repair of
/// every chain. Returns the links severed by that repair.
///
/// # Errors
///
/// Returns [`TaskDomainError::UnknownTask`] when either task is missing.
pub fn set_task_to_affiliate_with(
    tasks: &mut BTreeMap<TaskId, Task>,
    id: TaskId,
    other: TaskId,
) -> Result<Vec<AffiliationRepair>, TaskDomainError> {
    for key in [id, other] {
        if !tasks.contains_key(&key) {
            return Err(TaskDomainError::UnknownTask(key));
        }
    }
    if id == other {
        return Ok(Vec::new());
    }

    close_recents_chain(tasks, id);
    let (affiliation, color) = tasks
        .get(&other)
        .map(|task| (task.affiliated_task_id(), task.affiliated_task_color()))
        .ok_or(TaskDomainError::UnknownTask(other))?;
    if let Some(task) = tasks.get_mut(&id) {
        task.set_affiliation(affiliation, color);
    }

    let (tail, broken) = find_tail(tasks, other, affiliation);
    let mut repairs = Vec::new();
    if let Some(next) = broken {
        warn!(
            task = %id,
            tail = %tail,
            next = %next,
            expected_affiliation = %affiliation,
            "inconsistent affiliation chain, repairing"
        );
        sever(tasks, tail, next, &mut repairs);
        repairs.extend(repair_chains(tasks));
    }

    if let Some(tail_task) = tasks.get_mut(&tail) {
        tail_task.set_next_affiliate(Some(id));
    }
    if let Some(task) = tasks.get_mut(&id) {
        task.set_prev_affiliate(Some(tail));
        task.set_next_affiliate(None);
    }
    Ok(repairs)
}

/// Walks forward from `start` and returns the last consistent task, plus the
/// offending successor when the walk stopped on an inconsistency.
fn find_tail(
    tasks: &BTreeMap<TaskId, Task>,
    start: TaskId,
    affiliation: TaskId,
) -> (TaskId, Option<TaskId>) {
    let mut visited = BTreeSet::from([start]);
    let mut tail = start;
    while let Some(next) = tasks.get(&tail).and_then(Task::next_affiliate) {
        let consistent = tasks.get(&next).is_some_and(|task| {
            task.affiliated_task_id() == affiliation && task.prev_affiliate() == Some(tail)
        });
        if !consistent || !visited.insert(next) {
            return (tail, Some(next));
        }
        tail = next;
    }
    (tail, None)
}

fn sever(
    tasks: &mut BTreeMap<TaskId, Task>,
    from: TaskId,
    to: TaskId,
    repairs: &mut Vec<AffiliationRepair>,
) {
    if let Some(task) = tasks.get_mut(&from) {
        task.set_next_affiliate(None);
        repairs.push(AffiliationRepair {
            task: from,
            link: AffiliationLink::Next,
            target: to,
        });
    }
    if let Some(task) = tasks.get_mut(&to).filter(|task| task.prev_affiliate() == Some(from)) {
        task.set_prev_affiliate(None);
        repairs.push(AffiliationRepair {
            task: to,
            link: AffiliationLink::Prev,
            target: from,
        });
    }
}

/// Makes every chain symmetric and acyclic by severing offending links.
pub fn repair_chains(tasks: &mut BTreeMap<TaskId, Task>) -> Vec<AffiliationRepair> {
    let mut repairs = Vec::new();
    let ids: Vec<TaskId> = tasks.keys().copied().collect();

    for &id in &ids {
        let Some(task) = tasks.get(&id) else {
            continue;
        };
        let next = task.next_affiliate();
        let prev = task.prev_affiliate();
        if let Some(next_id) = next.filter(|next_id| {
            tasks
                .get(next_id)
                .is_none_or(|next_task| next_task.prev_affiliate() != Some(id))
        }) {
            if let Some(task_mut) = tasks.get_mut(&id) {
                task_mut.set_next_affiliate(None);
            }
            repairs.push(AffiliationRepair {
                task: id,
                link: AffiliationLink::Next,
                target: next_id,
            });
        }
        if let Some(prev_id) = prev.filter(|prev_id| {
            tasks
                .get(prev_id)
                .is_none_or(|prev_task| prev_task.next_affiliate() != Some(id))
        }) {
            if let Some(task_mut) = tasks.get_mut(&id) {
                task_mut.set_prev_affiliate(None);
            }
            repairs.push(AffiliationRepair {
                task: id,
                link: AffiliationLink::Prev,
                target: prev_id,
            });
        }
    }

    for &start in &ids {
        let mut visited = BTreeSet::from([start]);
        let mut current = start;
        while let Some(next) = tasks.get(&current).and_then(Task::next_affiliate) {
            if !visited.insert(next) {
                sever(tasks, current, next, &mut repairs);
                break;
            }
            current = next;
        }
    }

    for repair in &repairs {
        warn!(task = %repair.task, link = ?repair.link, target = %repair.target, "severed affiliation link");
    }
    repairs
}

/// Returns `true` when every link has a matching back link.
#[must_use]
pub fn chains_are_symmetric(tasks: &BTreeMap<TaskId, Task>) -> bool {
    tasks.iter().all(|(&id, task)| {
        let next_ok = task
            .next_affiliate()
            .is_none_or(|next| tasks.get(&next).is_some_and(|t| t.prev_affiliate() == Some(id)));
        let prev_ok = task
            .prev_affiliate()
            .is_none_or(|prev| tasks.get(&prev).is_some_and(|t| t.next_affiliate() == Some(id)));
        next_ok && prev_ok
    })
}

/// The chain containing `id`, head first.
#[must_use]
pub fn affiliation_chain(tasks: &BTreeMap<TaskId, Task>, id: TaskId) -> Vec<TaskId> {
    if !tasks.contains_key(&id) {
        return Vec::new();
    }
    let mut visited = BTreeSet::from([id]);
    let mut head = id;
    while let Some(prev) = tasks.get(&head).and_then(Task::prev_affiliate) {
        if !visited.insert(prev) || !tasks.contains_key(&prev) {
            break;
        }
        head = prev;
    }
    let mut chain = vec![head];
    let mut seen = BTreeSet::from([head]);
    let mut current = head;
    while let Some(next) = tasks.get(&current).and_then(Task::next_affiliate) {
        if !seen.insert(next) || !tasks.contains_key(&next) {
            break;
        }
        chain.push(next);
        current = next;
    }
    chain
}
