//! Application services for task lifecycle orchestration.

mod config;
mod factory;
mod layout;
mod lifecycle;

pub use config::TaskPolicyConfig;
pub use factory::{DefaultTaskFactory, TaskFactory};
pub use lifecycle::{
    LayoutDeferral, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService, TaskPorts,
};
