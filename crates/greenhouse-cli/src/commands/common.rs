use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use greenhouse_core::storage::{FileKeyValueStore, KeyValueStore, LibSqlKeyValueStore};
use greenhouse_core::{FieldObservation, OfflineQueueStore, QueueConfig, UploadConfig};
use serde::Serialize;

use crate::cli::StorageBackend;
use crate::error::CliError;

const QUEUE_DIR_NAME: &str = "queue";
const DATABASE_FILE_NAME: &str = "greenhouse.db";

/// Queue backend selected on the command line.
#[derive(Clone)]
pub enum CliBackend {
    File(FileKeyValueStore),
    LibSql(LibSqlKeyValueStore),
}

impl KeyValueStore for CliBackend {
    async fn read(&self, key: &str) -> greenhouse_core::Result<Option<String>> {
        match self {
            Self::File(store) => store.read(key).await,
            Self::LibSql(store) => store.read(key).await,
        }
    }

    async fn write(&self, key: &str, value: &str) -> greenhouse_core::Result<()> {
        match self {
            Self::File(store) => store.write(key, value).await,
            Self::LibSql(store) => store.write(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> greenhouse_core::Result<()> {
        match self {
            Self::File(store) => store.remove(key).await,
            Self::LibSql(store) => store.remove(key).await,
        }
    }
}

pub type CliQueue = OfflineQueueStore<CliBackend>;

#[derive(Debug, Serialize)]
pub struct ObservationListItem {
    pub id: String,
    pub crop_type: String,
    pub growth_stage: String,
    pub height: f64,
    pub pest_count: i64,
    pub notes: String,
    pub timestamp: String,
    pub relative_time: String,
    pub synced: bool,
}

pub async fn open_queue(data_dir: &Path, backend: StorageBackend) -> Result<CliQueue, CliError> {
    std::fs::create_dir_all(data_dir)?;

    let backend = match backend {
        StorageBackend::File => {
            CliBackend::File(FileKeyValueStore::open(data_dir.join(QUEUE_DIR_NAME))?)
        }
        StorageBackend::Libsql => CliBackend::LibSql(
            LibSqlKeyValueStore::open(data_dir.join(DATABASE_FILE_NAME)).await?,
        ),
    };

    Ok(OfflineQueueStore::new(backend, QueueConfig::default()))
}

pub fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> PathBuf {
    cli_data_dir
        .or_else(|| env::var_os("GREENHOUSE_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(default_data_dir)
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("greenhouse")
}

/// Upload settings from an explicit URL or the environment.
pub fn resolve_upload_config(api_url: Option<String>) -> Result<Option<UploadConfig>, CliError> {
    let base_url = api_url.or_else(|| env::var("GREENHOUSE_API_BASE_URL").ok());
    let token = env::var("GREENHOUSE_API_TOKEN").ok();
    Ok(UploadConfig::from_raw(base_url, token)?)
}

pub fn format_observation_lines(records: &[FieldObservation]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    records
        .iter()
        .map(|record| {
            let short_id = short_id(record);
            let status = if record.synced { "synced" } else { "pending" };
            let relative_time = observation_relative_time(record, now_ms);
            let line = format!(
                "{short_id:<13}  {:<12}  {:<10}  {:>7.1}cm  pests={:<3}  {status:<7}  {relative_time}",
                record.crop_type, record.growth_stage, record.height, record.pest_count
            );
            if record.notes.is_empty() {
                line
            } else {
                format!("{line}  {}", note_preview(&record.notes, 40))
            }
        })
        .collect()
}

pub fn observation_to_list_item(record: &FieldObservation) -> ObservationListItem {
    let now_ms = Utc::now().timestamp_millis();
    ObservationListItem {
        id: record.id.to_string(),
        crop_type: record.crop_type.clone(),
        growth_stage: record.growth_stage.clone(),
        height: record.height,
        pest_count: record.pest_count,
        notes: record.notes.clone(),
        timestamp: record.timestamp.clone(),
        relative_time: observation_relative_time(record, now_ms),
        synced: record.synced,
    }
}

fn short_id(record: &FieldObservation) -> String {
    record.id.as_str().chars().take(13).collect()
}

fn observation_relative_time(record: &FieldObservation, now_ms: i64) -> String {
    record.captured_at().map_or_else(
        || record.timestamp.clone(),
        |captured| format_relative_time(captured.timestamp_millis(), now_ms),
    )
}

pub fn note_preview(notes: &str, max_chars: usize) -> String {
    let collapsed = notes.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
