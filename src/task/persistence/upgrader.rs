//! Record upgraders for task schema migrations.
//!
//! Upgraders rewrite the attributes of an older record so the decoder only
//! ever sees the current schema.

use super::{RecordElement, RecordUpgradeError};
use crate::task::domain::ResizeMode;
use std::collections::HashMap;

/// Result type for upgrade operations.
pub type UpgradeResult<T> = Result<T, RecordUpgradeError>;

/// Attribute carrying the schema version of a task record.
pub const VERSION_ATTRIBUTE: &str = "persist_task_version";

/// Trait for upgrading records between schema versions.
///
/// Implementations must be deterministic and keep every attribute they do
/// not understand.
pub trait RecordUpgrader: Send + Sync {
    /// Upgrades a record to the current supported version.
    ///
    /// # Errors
    ///
    /// Returns [`RecordUpgradeError`] if the version is unsupported or the
    /// record is malformed.
    fn upgrade(&self, record: RecordElement) -> UpgradeResult<RecordElement>;

    /// Returns the version this upgrader produces.
    fn current_version(&self) -> u32;

    /// Returns `true` if this upgrader can handle the given version.
    fn supports_version(&self, version: u32) -> bool;
}

/// Upgrader for `<task>` records.
///
/// - v0 → v1: a legacy home task (`task_type` 1) stored as resizeable only
///   resizes when its target SDK allows it. `task_type` is dropped.
/// - v1: the deprecated combined "resizeable and pipable" mode is split into
///   a plain resizeable mode and an independent picture-in-picture flag.
#[derive(Debug, Default)]
pub struct TaskRecordUpgrader;

impl TaskRecordUpgrader {
    /// The current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    const SUPPORTED_VERSIONS: &'static [u32] = &[0, 1];

    const LEGACY_HOME_TASK_TYPE: i32 = 1;

    /// Creates a new upgrader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn upgrade_v0_to_v1(mut record: RecordElement) -> UpgradeResult<RecordElement> {
        let task_type = record
            .remove_attribute("task_type")
            .map(|value| parse_int("task_type", &value))
            .transpose()?;
        let resize_mode = read_resize_ordinal(&record)?;
        if task_type == Some(Self::LEGACY_HOME_TASK_TYPE)
            && resize_mode == Some(ResizeMode::Resizeable.ordinal())
        {
            record.set_attribute(
                "resize_mode",
                ResizeMode::ResizeableViaSdkVersion.ordinal().to_string(),
            );
        }
        record.set_attribute(VERSION_ATTRIBUTE, "1");
        Ok(record)
    }

    fn split_deprecated_pip(mut record: RecordElement) -> UpgradeResult<RecordElement> {
        if read_resize_ordinal(&record)? == Some(ResizeMode::ResizeableAndPipableDeprecated.ordinal())
        {
            record.set_attribute("resize_mode", ResizeMode::Resizeable.ordinal().to_string());
            record.set_attribute("supports_picture_in_picture", "true");
        }
        Ok(record)
    }
}

impl RecordUpgrader for TaskRecordUpgrader {
    fn upgrade(&self, record: RecordElement) -> UpgradeResult<RecordElement> {
        match record_version(&record)? {
            0 => Self::upgrade_v0_to_v1(record),
            1 => Self::split_deprecated_pip(record),
            v => Err(RecordUpgradeError::UnsupportedVersion(v)),
        }
    }

    fn current_version(&self) -> u32 {
        Self::CURRENT_VERSION
    }

    fn supports_version(&self, version: u32) -> bool {
        Self::SUPPORTED_VERSIONS.contains(&version)
    }
}

/// Reads the schema version of `record`; records without one are version 0.
///
/// # Errors
///
/// Returns [`RecordUpgradeError::Malformed`] when the version is not a
/// number.
pub fn record_version(record: &RecordElement) -> UpgradeResult<u32> {
    record.attribute(VERSION_ATTRIBUTE).map_or(Ok(0), |value| {
        value.trim().parse().map_err(|_| {
            RecordUpgradeError::malformed(format!("{VERSION_ATTRIBUTE}='{value}'"))
        })
    })
}

fn read_resize_ordinal(record: &RecordElement) -> UpgradeResult<Option<i32>> {
    record
        .attribute("resize_mode")
        .map(|value| parse_int("resize_mode", value))
        .transpose()
}

fn parse_int(name: &str, value: &str) -> UpgradeResult<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| RecordUpgradeError::malformed(format!("{name}='{value}'")))
}

/// Registry of record upgraders keyed by record tag.
#[derive(Default)]
pub struct UpgraderRegistry {
    upgraders: HashMap<String, Box<dyn RecordUpgrader>>,
}

impl UpgraderRegistry {
    /// Creates a registry with the default upgraders.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(super::TASK_TAG, Box::new(TaskRecordUpgrader::new()));
        registry
    }

    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers an upgrader for a record tag, replacing any previous one.
    pub fn register(&mut self, tag: &str, upgrader: Box<dyn RecordUpgrader>) {
        self.upgraders.insert(tag.to_owned(), upgrader);
    }

    /// Upgrades a record using the upgrader registered for its tag.
    ///
    /// # Errors
    ///
    /// Returns [`RecordUpgradeError::UnknownRecordType`] when no upgrader is
    /// registered, or whatever the upgrader reports.
    pub fn upgrade(&self, record: RecordElement) -> UpgradeResult<RecordElement> {
        match self.upgraders.get(record.tag()) {
            Some(upgrader) => upgrader.upgrade(record),
            None => Err(RecordUpgradeError::UnknownRecordType(record.tag().to_owned())),
        }
    }

    /// Returns the current version for a record tag, if known.
    #[must_use]
    pub fn current_version(&self, tag: &str) -> Option<u32> {
        self.upgraders.get(tag).map(|u| u.current_version())
    }
}

impl std::fmt::Debug for UpgraderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgraderRegistry")
            .field("tags", &self.upgraders.keys().collect::<Vec<_>>())
            .finish()
    }
}
