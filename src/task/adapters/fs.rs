//! Filesystem record store: one JSON file per task in a capability-scoped
//! directory.

use crate::task::{
    domain::TaskId,
    persistence::RecordElement,
    ports::{TaskRecordStore, TaskRecordStoreError, TaskRecordStoreResult},
};
use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::warn;

const FILE_SUFFIX: &str = "_task.json";
const TEMP_SUFFIX: &str = ".tmp";

/// Record store writing `<task id>_task.json` files.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash never leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct FsTaskRecordStore {
    dir: Arc<Dir>,
}

impl FsTaskRecordStore {
    /// Opens `path`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRecordStoreError::Persistence`] when the directory cannot
    /// be created or opened.
    pub fn open(path: &Utf8Path) -> TaskRecordStoreResult<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .map_err(TaskRecordStoreError::persistence)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(TaskRecordStoreError::persistence)?;
        Ok(Self::from_dir(dir))
    }

    /// Wraps an already opened directory.
    #[must_use]
    pub fn from_dir(dir: Dir) -> Self {
        Self { dir: Arc::new(dir) }
    }

    async fn blocking<T, F>(&self, operation: F) -> TaskRecordStoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> TaskRecordStoreResult<T> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || operation(&dir))
            .await
            .map_err(TaskRecordStoreError::persistence)?
    }
}

fn file_name(task: TaskId) -> String {
    format!("{task}{FILE_SUFFIX}")
}

fn task_from_file_name(name: &str) -> Option<TaskId> {
    name.strip_suffix(FILE_SUFFIX)?
        .parse::<i32>()
        .ok()
        .and_then(|value| TaskId::new(value).ok())
}

fn read_record(dir: &Dir, task: TaskId) -> TaskRecordStoreResult<Option<RecordElement>> {
    let contents = match dir.read_to_string(file_name(task)) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(TaskRecordStoreError::persistence(err)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|err| TaskRecordStoreError::Corrupt {
            task,
            reason: err.to_string(),
        })
}

#[async_trait]
impl TaskRecordStore for FsTaskRecordStore {
    async fn save(&self, task: TaskId, record: &RecordElement) -> TaskRecordStoreResult<()> {
        let contents =
            serde_json::to_vec_pretty(record).map_err(TaskRecordStoreError::persistence)?;
        self.blocking(move |dir| {
            let target = file_name(task);
            let temporary = format!("{target}{TEMP_SUFFIX}");
            dir.write(&temporary, contents)
                .map_err(TaskRecordStoreError::persistence)?;
            dir.rename(&temporary, dir, &target)
                .map_err(TaskRecordStoreError::persistence)
        })
        .await
    }

    async fn load(&self, task: TaskId) -> TaskRecordStoreResult<Option<RecordElement>> {
        self.blocking(move |dir| read_record(dir, task)).await
    }

    async fn load_all(&self) -> TaskRecordStoreResult<Vec<(TaskId, RecordElement)>> {
        self.blocking(|dir| {
            let mut tasks = Vec::new();
            for entry in dir.entries().map_err(TaskRecordStoreError::persistence)? {
                let name = entry
                    .and_then(|item| item.file_name())
                    .map_err(TaskRecordStoreError::persistence)?;
                if let Some(task) = task_from_file_name(&name) {
                    tasks.push(task);
                }
            }
            tasks.sort_unstable();

            let mut records = Vec::with_capacity(tasks.len());
            for task in tasks {
                match read_record(dir, task) {
                    Ok(Some(record)) => records.push((task, record)),
                    Ok(None) => {}
                    Err(err) => warn!(%task, error = %err, "skipping unreadable task record"),
                }
            }
            Ok(records)
        })
        .await
    }

    async fn remove(&self, task: TaskId) -> TaskRecordStoreResult<()> {
        self.blocking(move |dir| match dir.remove_file(file_name(task)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(TaskRecordStoreError::NotFound(task))
            }
            Err(err) => Err(TaskRecordStoreError::persistence(err)),
        })
        .await
    }
}
