//! Launch intents and component names.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Fully qualified reference to an activity: owning package plus class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentName {
    package: String,
    class: String,
}

impl ComponentName {
    /// Creates a component reference.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidComponentName`] when either part is
    /// empty or contains a slash.
    pub fn new(
        package: impl Into<String>,
        class: impl Into<String>,
    ) -> Result<Self, TaskDomainError> {
        let package_name = package.into();
        let class_name = class.into();
        let valid = |part: &str| !part.trim().is_empty() && !part.contains('/');
        if !valid(&package_name) || !valid(&class_name) {
            return Err(TaskDomainError::InvalidComponentName(format!(
                "{package_name}/{class_name}"
            )));
        }
        Ok(Self {
            package: package_name,
            class: class_name,
        })
    }

    /// Owning package.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Fully qualified class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Flattens to `package/class`, abbreviating a class inside the package
    /// to `.Suffix`.
    #[must_use]
    pub fn flatten_to_short_string(&self) -> String {
        match self
            .class
            .strip_prefix(self.package.as_str())
            .filter(|rest| rest.starts_with('.'))
        {
            Some(suffix) => format!("{}/{suffix}", self.package),
            None => format!("{}/{}", self.package, self.class),
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten_to_short_string())
    }
}

impl FromStr for ComponentName {
    type Err = TaskDomainError;

    /// Parses `package/class`; a class starting with `.` is relative to the
    /// package.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (package, class) = value
            .split_once('/')
            .ok_or_else(|| TaskDomainError::InvalidComponentName(value.to_owned()))?;
        if class.starts_with('.') {
            Self::new(package, format!("{package}{class}"))
        } else {
            Self::new(package, class)
        }
    }
}

impl TryFrom<String> for ComponentName {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentName> for String {
    fn from(component: ComponentName) -> Self {
        component.flatten_to_short_string()
    }
}

/// Launch flags carried by an intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentFlags(u32);

impl IntentFlags {
    /// No flags.
    pub const EMPTY: Self = Self(0);
    /// Keep a document task in recents after it finishes.
    pub const RETAIN_IN_RECENTS: Self = Self(0x0000_2000);
    /// Return to home when this task is finished.
    pub const TASK_ON_HOME: Self = Self(0x0000_4000);
    /// Open the launch as a new document.
    pub const NEW_DOCUMENT: Self = Self(0x0008_0000);
    /// Reset the task to its root when brought forward.
    pub const RESET_TASK_IF_NEEDED: Self = Self(0x0020_0000);
    /// Keep the task out of recents.
    pub const EXCLUDE_FROM_RECENTS: Self = Self(0x0080_0000);
    /// Finish everything above a matching activity.
    pub const CLEAR_TOP: Self = Self(0x0400_0000);
    /// Always create a new task, even when one matches.
    pub const MULTIPLE_TASK: Self = Self(0x0800_0000);
    /// Start in a new task.
    pub const NEW_TASK: Self = Self(0x1000_0000);
    /// Reuse the top instance instead of recreating it.
    pub const SINGLE_TOP: Self = Self(0x2000_0000);

    /// Wraps raw flag bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw flag bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` when a document launch should reuse an existing task.
    #[must_use]
    pub const fn is_document_launch_into_existing(self) -> bool {
        self.contains(Self::NEW_DOCUMENT) && !self.contains(Self::MULTIPLE_TASK)
    }

    /// Returns `true` for a new-document launch that did not ask to be kept in
    /// recents.
    #[must_use]
    pub const fn is_unretained_new_document(self) -> bool {
        self.contains(Self::NEW_DOCUMENT) && !self.contains(Self::RETAIN_IN_RECENTS)
    }
}

impl BitOr for IntentFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Description of an activity launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    action: Option<String>,
    component: Option<ComponentName>,
    categories: Vec<String>,
    data: Option<String>,
    flags: IntentFlags,
}

impl Intent {
    /// Creates an explicit intent for `component`.
    #[must_use]
    pub fn for_component(component: ComponentName) -> Self {
        Self {
            component: Some(component),
            ..Self::default()
        }
    }

    /// Sets the action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Adds a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Sets the data URI.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets the launch flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: IntentFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Replaces the component.
    #[must_use]
    pub fn with_component(mut self, component: Option<ComponentName>) -> Self {
        self.component = component;
        self
    }

    /// Action, if any.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Explicit component, if any.
    #[must_use]
    pub const fn component(&self) -> Option<&ComponentName> {
        self.component.as_ref()
    }

    /// Categories in insertion order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Data URI, if any.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Launch flags.
    #[must_use]
    pub const fn flags(&self) -> IntentFlags {
        self.flags
    }
}
