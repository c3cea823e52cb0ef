//! Package resolver backed by a fixed catalogue.

use crate::task::{
    domain::{ActivityInfo, ComponentName, Intent, Uid, UserId},
    ports::PackageResolver,
};
use std::collections::HashMap;

/// Resolves components and packages from registered metadata.
#[derive(Debug, Clone, Default)]
pub struct StaticPackageResolver {
    activities: HashMap<ComponentName, ActivityInfo>,
    packages: HashMap<String, Uid>,
}

impl StaticPackageResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an activity; its package uid is registered too.
    #[must_use]
    pub fn with_activity(mut self, info: ActivityInfo) -> Self {
        self.packages
            .insert(info.component.package().to_owned(), info.uid);
        self.activities.insert(info.component.clone(), info);
        self
    }

    /// Registers a package uid without activities.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>, uid: Uid) -> Self {
        self.packages.insert(package.into(), uid);
        self
    }
}

impl PackageResolver for StaticPackageResolver {
    fn resolve_activity(&self, intent: &Intent, _user: UserId) -> Option<ActivityInfo> {
        intent
            .component()
            .and_then(|component| self.activities.get(component))
            .cloned()
    }

    fn package_uid(&self, package: &str, _user: UserId) -> Option<Uid> {
        self.packages.get(package).copied()
    }
}
