//! Error types for the persistence codec.

use thiserror::Error;

/// Errors returned while decoding a persisted task record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordCodecError {
    /// The element has the wrong tag.
    #[error("expected <{expected}> element, found <{found}>")]
    UnexpectedTag {
        /// Tag the decoder expected.
        expected: &'static str,
        /// Tag that was found.
        found: String,
    },

    /// A required attribute is absent.
    #[error("<{tag}> element is missing attribute '{attribute}'")]
    MissingAttribute {
        /// Element tag.
        tag: &'static str,
        /// Attribute name.
        attribute: &'static str,
    },

    /// A required nested element is absent.
    #[error("<{tag}> element is missing nested <{element}>")]
    MissingElement {
        /// Element tag.
        tag: &'static str,
        /// Nested element tag.
        element: &'static str,
    },

    /// An attribute value cannot be parsed.
    #[error("invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute {
        /// Attribute name.
        attribute: String,
        /// Offending value.
        value: String,
    },

    /// The record could not be migrated to the current schema.
    #[error(transparent)]
    Upgrade(#[from] RecordUpgradeError),
}

impl RecordCodecError {
    /// Creates an invalid attribute error.
    #[must_use]
    pub fn invalid(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Errors returned while migrating a record between schema versions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordUpgradeError {
    /// The schema version is not supported.
    #[error("unsupported schema version: {0}")]
    UnsupportedVersion(u32),

    /// No upgrader is registered for the record type.
    #[error("unknown record type: {0}")]
    UnknownRecordType(String),

    /// The record is malformed.
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl RecordUpgradeError {
    /// Creates a malformed record error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
