//! Package metadata lookups used while restoring tasks.

use crate::task::domain::{ActivityInfo, Intent, Uid, UserId};

/// Resolves intents and packages against what is currently installed.
pub trait PackageResolver: Send + Sync {
    /// Metadata of the activity `intent` resolves to for `user`.
    fn resolve_activity(&self, intent: &Intent, user: UserId) -> Option<ActivityInfo>;

    /// Uid of `package` for `user`, including uninstalled or disabled ones.
    fn package_uid(&self, package: &str, user: UserId) -> Option<Uid>;
}
