//! Task record encoding and decoding.

use super::upgrader::VERSION_ATTRIBUTE;
use super::{RecordCodecError, RecordElement, TaskRecordUpgrader, UpgraderRegistry};
use crate::container::Persistable;
use crate::geometry::Rect;
use crate::task::domain::{
    ActivityId, ComponentName, Intent, IntentFlags, PersistedActivityData, PersistedTaskData,
    ResizeMode, Task, TaskDescription, TaskId, Uid, UserId,
};
use crate::task::ports::PackageResolver;
use mockable::Clock;
use std::str::FromStr;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Tag of a task record.
pub const TASK_TAG: &str = "task";
const INTENT_TAG: &str = "intent";
const AFFINITY_INTENT_TAG: &str = "affinity_intent";
const ACTIVITY_TAG: &str = "activity";
const CATEGORY_TAG: &str = "category";

const DESCRIPTION_PREFIX: &str = "task_description_";
const NULL_ROOT_AFFINITY: &str = "@";
const INVALID_ID: i32 = -1;

type CodecResult<T> = Result<T, RecordCodecError>;

/// Converts tasks to and from [`RecordElement`]s.
///
/// Decoding runs the record through the upgrader registry first, so only the
/// current schema is interpreted here. Unknown attributes are logged and
/// skipped; unknown nested elements are logged and skipped.
#[derive(Debug)]
pub struct TaskRecordCodec {
    upgraders: UpgraderRegistry,
}

impl Default for TaskRecordCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRecordCodec {
    /// Creates a codec with the default upgraders.
    #[must_use]
    pub fn new() -> Self {
        Self {
            upgraders: UpgraderRegistry::new(),
        }
    }

    /// Creates a codec with a custom upgrader registry.
    #[must_use]
    pub const fn with_upgraders(upgraders: UpgraderRegistry) -> Self {
        Self { upgraders }
    }

    /// Encodes `task` at the current schema version.
    #[must_use]
    pub fn encode(task: &Task) -> RecordElement {
        encode_task(&task.to_persisted())
    }

    /// Decodes and restores a task.
    ///
    /// Activities are resolved against what is installed now; unresolvable
    /// ones are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RecordCodecError`] when the record cannot be upgraded or a
    /// known attribute holds an unparseable value.
    pub fn decode(
        &self,
        record: RecordElement,
        resolver: &dyn PackageResolver,
        clock: &impl Clock,
    ) -> CodecResult<Task> {
        let data = self.decode_data(record, resolver)?;
        let task = Task::from_persisted(
            data,
            |activity| resolver.resolve_activity(&activity.intent, activity.user_id),
            clock,
        );
        debug!(task = %task.id(), activities = task.children().len(), "restored task");
        Ok(task)
    }

    /// Decodes a record into persisted task data without restoring it.
    ///
    /// # Errors
    ///
    /// See [`Self::decode`].
    pub fn decode_data(
        &self,
        record: RecordElement,
        resolver: &dyn PackageResolver,
    ) -> CodecResult<PersistedTaskData> {
        if record.tag() != TASK_TAG {
            return Err(RecordCodecError::UnexpectedTag {
                expected: TASK_TAG,
                found: record.tag().to_owned(),
            });
        }
        let upgraded = self.upgraders.upgrade(record)?;
        let id_text = upgraded
            .attribute("task_id")
            .ok_or(RecordCodecError::MissingAttribute {
                tag: TASK_TAG,
                attribute: "task_id",
            })?;
        let id = TaskId::new(parse_number("task_id", id_text)?)
            .map_err(|_| RecordCodecError::invalid("task_id", id_text))?;

        let mut data = restore_defaults(id);
        let mut root_affinity = None;
        for (name, value) in upgraded.attributes() {
            if name.as_str() == "root_affinity" {
                root_affinity = Some(value.as_str());
            } else {
                apply_task_attribute(&mut data, name, value)?;
            }
        }
        data.root_affinity = match root_affinity {
            None => data.affinity.clone(),
            Some(NULL_ROOT_AFFINITY) => None,
            Some(value) => Some(value.to_owned()),
        };

        for child in upgraded.children() {
            match child.tag() {
                INTENT_TAG => data.intent = Some(decode_intent(child)?),
                AFFINITY_INTENT_TAG => data.affinity_intent = Some(decode_intent(child)?),
                ACTIVITY_TAG => data.activities.push(decode_activity(child)?),
                other => error!(task = %id, tag = other, "skipping unexpected element in task record"),
            }
        }

        if data.effective_uid.value() <= 0 {
            data.effective_uid = recover_effective_uid(&data, resolver);
        }
        Ok(data)
    }
}

impl Persistable for Task {
    type Record = RecordElement;

    fn is_persistable(&self) -> bool {
        Self::is_persistable(self)
    }

    fn to_record(&self) -> RecordElement {
        TaskRecordCodec::encode(self)
    }
}

fn restore_defaults(id: TaskId) -> PersistedTaskData {
    PersistedTaskData {
        id,
        intent: None,
        affinity_intent: None,
        real_activity: None,
        real_activity_suspended: false,
        orig_activity: None,
        affinity: None,
        root_affinity: None,
        root_was_reset: false,
        auto_remove_recents: false,
        asked_compat_mode: false,
        user_id: UserId::SYSTEM,
        user_setup_complete: true,
        effective_uid: Uid::UNKNOWN,
        last_description: None,
        last_time_moved: 0,
        never_relinquish_identity: true,
        affiliated_task_id: id,
        prev_affiliate: None,
        next_affiliate: None,
        affiliated_task_color: 0,
        calling_uid: Uid::UNKNOWN,
        calling_package: None,
        supports_picture_in_picture: false,
        resize_mode: ResizeMode::ForceResizeable,
        last_non_fullscreen_bounds: None,
        min_width: None,
        min_height: None,
        task_description: TaskDescription::default(),
        activities: Vec::new(),
    }
}

fn apply_task_attribute(data: &mut PersistedTaskData, name: &str, value: &str) -> CodecResult<()> {
    match name {
        "task_id" | "task_type" | VERSION_ATTRIBUTE => {}
        "real_activity" => data.real_activity = Some(parse_component(name, value)?),
        "real_activity_suspended" => data.real_activity_suspended = parse_flag(value),
        "orig_activity" => data.orig_activity = Some(parse_component(name, value)?),
        "affinity" => data.affinity = Some(value.to_owned()),
        "root_has_reset" => data.root_was_reset = parse_flag(value),
        "auto_remove_recents" => data.auto_remove_recents = parse_flag(value),
        "asked_compat_mode" => data.asked_compat_mode = parse_flag(value),
        "user_id" => data.user_id = UserId::new(parse_number(name, value)?),
        "user_setup_complete" => data.user_setup_complete = parse_flag(value),
        "effective_uid" => data.effective_uid = Uid::new(parse_number(name, value)?),
        "last_description" => data.last_description = Some(value.to_owned()),
        "last_time_moved" => data.last_time_moved = parse_number(name, value)?,
        "never_relinquish_identity" => data.never_relinquish_identity = parse_flag(value),
        "task_affiliation" => {
            data.affiliated_task_id = TaskId::new(parse_number(name, value)?).unwrap_or(data.id);
        }
        "prev_affiliation" => data.prev_affiliate = TaskId::new(parse_number(name, value)?).ok(),
        "next_affiliation" => data.next_affiliate = TaskId::new(parse_number(name, value)?).ok(),
        "task_affiliation_color" => data.affiliated_task_color = parse_number(name, value)?,
        "calling_uid" => data.calling_uid = Uid::new(parse_number(name, value)?),
        "calling_package" => data.calling_package = (!value.is_empty()).then(|| value.to_owned()),
        "resize_mode" => {
            data.resize_mode = ResizeMode::from_ordinal(parse_number(name, value)?)
                .ok_or_else(|| RecordCodecError::invalid(name, value))?;
        }
        "supports_picture_in_picture" => data.supports_picture_in_picture = parse_flag(value),
        "non_fullscreen_bounds" => {
            let bounds =
                Rect::from_str(value).map_err(|_| RecordCodecError::invalid(name, value))?;
            data.last_non_fullscreen_bounds = Some(bounds);
        }
        "min_width" => data.min_width = min_size(parse_number(name, value)?),
        "min_height" => data.min_height = min_size(parse_number(name, value)?),
        _ => {
            if !apply_description_attribute(&mut data.task_description, name, value)? {
                warn!(task = %data.id, attribute = name, "unknown task attribute");
            }
        }
    }
    Ok(())
}

fn recover_effective_uid(data: &PersistedTaskData, resolver: &dyn PackageResolver) -> Uid {
    let package = data
        .intent
        .as_ref()
        .or(data.affinity_intent.as_ref())
        .and_then(Intent::component)
        .map(ComponentName::package);
    let uid = package
        .and_then(|name| resolver.package_uid(name, data.user_id))
        .unwrap_or(Uid::NONE);
    warn!(
        task = %data.id,
        package = package.unwrap_or("<none>"),
        effective_uid = %uid,
        "updating task with missing effective uid"
    );
    uid
}

fn decode_intent(element: &RecordElement) -> CodecResult<Intent> {
    let mut intent = Intent::default();
    for (name, value) in element.attributes() {
        intent = match name.as_str() {
            "action" => intent.with_action(value.as_str()),
            "component" => intent.with_component(Some(parse_component(name, value)?)),
            "data" => intent.with_data(value.as_str()),
            "flags" => {
                let bits = u32::from_str_radix(value.trim(), 16)
                    .map_err(|_| RecordCodecError::invalid(name.as_str(), value.as_str()))?;
                intent.with_flags(IntentFlags::from_bits(bits))
            }
            other => {
                warn!(attribute = other, "unknown intent attribute");
                intent
            }
        };
    }
    for child in element.children() {
        match (child.tag(), child.attribute("name")) {
            (CATEGORY_TAG, Some(category)) => intent = intent.with_category(category),
            (other, _) => error!(tag = other, "skipping unexpected element in intent record"),
        }
    }
    Ok(intent)
}

fn decode_activity(element: &RecordElement) -> CodecResult<PersistedActivityData> {
    let intent = element
        .child(INTENT_TAG)
        .map(decode_intent)
        .transpose()?
        .ok_or(RecordCodecError::MissingElement {
            tag: ACTIVITY_TAG,
            element: INTENT_TAG,
        })?;
    let mut data = PersistedActivityData {
        id: ActivityId::new(),
        intent,
        launched_from_uid: Uid::UNKNOWN,
        launched_from_package: None,
        user_id: UserId::SYSTEM,
        component_specified: false,
        task_description: None,
    };
    let mut description = TaskDescription::default();
    let mut has_description = false;
    for (name, value) in element.attributes() {
        match name.as_str() {
            "id" => {
                let uuid =
                    Uuid::parse_str(value).map_err(|_| RecordCodecError::invalid("id", value.as_str()))?;
                data.id = ActivityId::from_uuid(uuid);
            }
            "launched_from_uid" => data.launched_from_uid = Uid::new(parse_number(name, value)?),
            "launched_from_package" => data.launched_from_package = Some(value.clone()),
            "user_id" => data.user_id = UserId::new(parse_number(name, value)?),
            "component_specified" => data.component_specified = parse_flag(value),
            other => {
                if apply_description_attribute(&mut description, other, value)? {
                    has_description = true;
                } else {
                    warn!(activity = %data.id, attribute = other, "unknown activity attribute");
                }
            }
        }
    }
    data.task_description = has_description.then_some(description);
    Ok(data)
}

fn apply_description_attribute(
    description: &mut TaskDescription,
    name: &str,
    value: &str,
) -> CodecResult<bool> {
    match name.strip_prefix(DESCRIPTION_PREFIX) {
        Some("label") => description.label = Some(value.to_owned()),
        Some("icon_filename") => description.icon_filename = Some(value.to_owned()),
        Some("color") => description.primary_color = parse_color(name, value)?,
        Some("color_background") => description.background_color = parse_color(name, value)?,
        _ => return Ok(false),
    }
    Ok(true)
}

fn encode_task(data: &PersistedTaskData) -> RecordElement {
    let mut record = RecordElement::new(TASK_TAG);
    record.set_attribute("task_id", data.id.to_string());
    if let Some(real) = &data.real_activity {
        record.set_attribute("real_activity", real.flatten_to_short_string());
    }
    record.set_attribute("real_activity_suspended", data.real_activity_suspended.to_string());
    if let Some(orig) = &data.orig_activity {
        record.set_attribute("orig_activity", orig.flatten_to_short_string());
    }
    encode_affinity(&mut record, data.affinity.as_deref(), data.root_affinity.as_deref());
    record.set_attribute("root_has_reset", data.root_was_reset.to_string());
    record.set_attribute("auto_remove_recents", data.auto_remove_recents.to_string());
    record.set_attribute("asked_compat_mode", data.asked_compat_mode.to_string());
    record.set_attribute("user_id", data.user_id.value().to_string());
    record.set_attribute("user_setup_complete", data.user_setup_complete.to_string());
    record.set_attribute("effective_uid", data.effective_uid.value().to_string());
    record.set_attribute("last_time_moved", data.last_time_moved.to_string());
    record.set_attribute(
        "never_relinquish_identity",
        data.never_relinquish_identity.to_string(),
    );
    if let Some(description) = &data.last_description {
        record.set_attribute("last_description", description.as_str());
    }
    encode_description(&mut record, &data.task_description);
    record.set_attribute("task_affiliation_color", data.affiliated_task_color.to_string());
    record.set_attribute("task_affiliation", data.affiliated_task_id.to_string());
    record.set_attribute("prev_affiliation", id_or_invalid(data.prev_affiliate));
    record.set_attribute("next_affiliation", id_or_invalid(data.next_affiliate));
    record.set_attribute("calling_uid", data.calling_uid.value().to_string());
    record.set_attribute(
        "calling_package",
        data.calling_package.as_deref().unwrap_or_default(),
    );
    record.set_attribute("resize_mode", data.resize_mode.ordinal().to_string());
    record.set_attribute(
        "supports_picture_in_picture",
        data.supports_picture_in_picture.to_string(),
    );
    if let Some(bounds) = data.last_non_fullscreen_bounds {
        record.set_attribute("non_fullscreen_bounds", bounds.to_string());
    }
    record.set_attribute("min_width", data.min_width.unwrap_or(-1).to_string());
    record.set_attribute("min_height", data.min_height.unwrap_or(-1).to_string());
    record.set_attribute(
        VERSION_ATTRIBUTE,
        TaskRecordUpgrader::CURRENT_VERSION.to_string(),
    );

    if let Some(intent) = &data.affinity_intent {
        record.push_child(encode_intent(AFFINITY_INTENT_TAG, intent));
    }
    if let Some(intent) = &data.intent {
        record.push_child(encode_intent(INTENT_TAG, intent));
    }
    for activity in &data.activities {
        record.push_child(encode_activity(activity));
    }
    record
}

/// Writes the affinity, plus the root affinity when it differs. A root
/// affinity that is explicitly unset is written as `@`.
fn encode_affinity(record: &mut RecordElement, affinity: Option<&str>, root: Option<&str>) {
    match (affinity, root) {
        (Some(current), _) => {
            record.set_attribute("affinity", current);
            if root != Some(current) {
                record.set_attribute("root_affinity", root.unwrap_or(NULL_ROOT_AFFINITY));
            }
        }
        (None, Some(root_value)) => record.set_attribute("root_affinity", root_value),
        (None, None) => {}
    }
}

fn encode_description(record: &mut RecordElement, description: &TaskDescription) {
    if let Some(label) = &description.label {
        record.set_attribute(format!("{DESCRIPTION_PREFIX}label"), label.as_str());
    }
    if let Some(icon) = &description.icon_filename {
        record.set_attribute(format!("{DESCRIPTION_PREFIX}icon_filename"), icon.as_str());
    }
    if description.primary_color != 0 {
        record.set_attribute(
            format!("{DESCRIPTION_PREFIX}color"),
            format!("{:x}", description.primary_color),
        );
    }
    if description.background_color != 0 {
        record.set_attribute(
            format!("{DESCRIPTION_PREFIX}color_background"),
            format!("{:x}", description.background_color),
        );
    }
}

fn encode_intent(tag: &str, intent: &Intent) -> RecordElement {
    let mut element = RecordElement::new(tag);
    if let Some(action) = intent.action() {
        element.set_attribute("action", action);
    }
    if let Some(component) = intent.component() {
        element.set_attribute("component", component.flatten_to_short_string());
    }
    if let Some(data) = intent.data() {
        element.set_attribute("data", data);
    }
    element.set_attribute("flags", format!("{:x}", intent.flags().bits()));
    for category in intent.categories() {
        element.push_child(RecordElement::new(CATEGORY_TAG).with_attribute("name", category.as_str()));
    }
    element
}

fn encode_activity(activity: &PersistedActivityData) -> RecordElement {
    let mut element = RecordElement::new(ACTIVITY_TAG)
        .with_attribute("id", activity.id.to_string())
        .with_attribute("launched_from_uid", activity.launched_from_uid.value().to_string())
        .with_attribute("user_id", activity.user_id.value().to_string())
        .with_attribute("component_specified", activity.component_specified.to_string());
    if let Some(package) = &activity.launched_from_package {
        element.set_attribute("launched_from_package", package.as_str());
    }
    if let Some(description) = &activity.task_description {
        encode_description(&mut element, description);
    }
    element.with_child(encode_intent(INTENT_TAG, &activity.intent))
}

fn id_or_invalid(id: Option<TaskId>) -> String {
    id.map_or(INVALID_ID, TaskId::value).to_string()
}

fn min_size(value: i32) -> Option<i32> {
    (value >= 0).then_some(value)
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> CodecResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RecordCodecError::invalid(name, value))
}

fn parse_color(name: &str, value: &str) -> CodecResult<u32> {
    u32::from_str_radix(value.trim(), 16).map_err(|_| RecordCodecError::invalid(name, value))
}

fn parse_component(name: &str, value: &str) -> CodecResult<ComponentName> {
    ComponentName::from_str(value).map_err(|_| RecordCodecError::invalid(name, value))
}
