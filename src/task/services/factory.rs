//! Construction hook for task aggregates.

use crate::task::domain::{
    ActivityInfo, PersistedActivityData, PersistedTaskData, Task, TaskId, TaskLaunch,
};
use mockable::Clock;

/// Builds task aggregates for the lifecycle service.
///
/// Hosts that need to decorate or audit construction supply their own
/// factory when building the service.
pub trait TaskFactory<C: Clock>: Send + Sync {
    /// Creates a task for a fresh launch.
    fn create(&self, id: TaskId, launch: &TaskLaunch, clock: &C) -> Task;

    /// Rebuilds a task from decoded storage data.
    fn restore(
        &self,
        data: PersistedTaskData,
        resolve: &mut dyn FnMut(&PersistedActivityData) -> Option<ActivityInfo>,
        clock: &C,
    ) -> Task {
        Task::from_persisted(data, resolve, clock)
    }
}

/// Factory that builds tasks exactly as the domain describes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTaskFactory;

impl<C: Clock> TaskFactory<C> for DefaultTaskFactory {
    fn create(&self, id: TaskId, launch: &TaskLaunch, clock: &C) -> Task {
        Task::launch(id, launch, clock)
    }
}
