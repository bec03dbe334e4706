//! Durable observation store backed by a single append log.
//!
//! File layout (`observations.log`):
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────────────────┐
//! │ len: u32 LE  │ crc32: u32 LE│ postcard(LogRecord)      │  × N
//! └──────────────┴──────────────┴──────────────────────────┘
//! ```
//!
//! Records are appended and fsynced one at a time. On open, frames are read
//! until the first short, oversized or checksum-failing frame; anything after
//! it is a torn write and is cut off. Deletions rewrite the whole log through
//! a `.tmp` file and an atomic rename, starting with a watermark record so
//! ids of removed observations are never handed out again.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::model::{Observation, truncate_to_micros};
use super::{ObservationStore, StoreError};

const LOG_FILE: &str = "observations.log";
const FRAME_HEADER: usize = 8;
/// Frames larger than this are treated as corruption.
const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// On-disk form of an [`Observation`].
#[derive(Debug, Serialize, Deserialize)]
struct StoredObservation {
    id: u64,
    category: String,
    datetime_micros: i64,
    /// JSON text; postcard cannot carry a self-describing `Value`.
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
enum LogRecord {
    Observation(StoredObservation),
    Watermark { next_id: u64 },
}

impl StoredObservation {
    fn from_observation(obs: &Observation) -> Result<Self, StoreError> {
        Ok(Self {
            id: obs.id,
            category: obs.category.clone(),
            datetime_micros: obs.datetime.timestamp_micros(),
            data: serde_json::to_string(&obs.data)?,
        })
    }

    fn into_observation(self) -> Result<Observation, StoreError> {
        let datetime = DateTime::from_timestamp_micros(self.datetime_micros)
            .ok_or(StoreError::Timestamp(self.datetime_micros))?;
        Ok(Observation {
            id: self.id,
            category: self.category,
            datetime,
            data: serde_json::from_str(&self.data)?,
        })
    }
}

fn encode_frame(record: &LogRecord) -> Result<Vec<u8>, StoreError> {
    let payload = postcard::to_allocvec(record)?;
    let mut frame = Vec::with_capacity(FRAME_HEADER + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes the frame starting at `data[0]`. Returns the record and the frame
/// length, or `None` when the bytes do not form a complete valid frame.
fn decode_frame(data: &[u8]) -> Option<(LogRecord, usize)> {
    let header = data.get(..FRAME_HEADER)?;
    let len = u32::from_le_bytes(header[0..4].try_into().ok()?) as usize;
    let crc = u32::from_le_bytes(header[4..8].try_into().ok()?);
    if len > MAX_FRAME_LEN {
        return None;
    }
    let payload = data.get(FRAME_HEADER..FRAME_HEADER + len)?;
    if crc32fast::hash(payload) != crc {
        return None;
    }
    let record = postcard::from_bytes(payload).ok()?;
    Some((record, FRAME_HEADER + len))
}

/// Observation store persisted to `<dir>/observations.log`.
///
/// The full table is also held in memory; reads never touch the disk.
#[derive(Debug)]
pub struct LogStore {
    dir: PathBuf,
    file: File,
    observations: Vec<Observation>,
    next_id: u64,
}

impl LogStore {
    /// Opens (or creates) the store in `dir`, recovering every intact record.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        // Leftovers of an interrupted compaction.
        for entry in fs::read_dir(&dir)?.flatten() {
            if entry.path().extension().is_some_and(|ext| ext == "tmp") {
                let _ = fs::remove_file(entry.path());
            }
        }

        let path = dir.join(LOG_FILE);
        let (observations, next_id) = Self::recover(&path)?;
        let file = Self::open_append(&path)?;

        info!(
            path = %path.display(),
            observations = observations.len(),
            next_id,
            "observation log opened"
        );

        Ok(Self {
            dir,
            file,
            observations,
            next_id,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    fn open_append(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    /// Reads every valid frame, truncating a torn tail.
    fn recover(path: &Path) -> Result<(Vec<Observation>, u64), StoreError> {
        let data = match fs::read(path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((Vec::new(), 1)),
            Err(e) => return Err(e.into()),
        };

        let mut observations = Vec::new();
        let mut watermark = 1u64;
        let mut pos = 0usize;

        while pos < data.len() {
            let Some((record, frame_len)) = decode_frame(&data[pos..]) else {
                break;
            };
            match record {
                LogRecord::Observation(stored) => observations.push(stored.into_observation()?),
                LogRecord::Watermark { next_id } => watermark = watermark.max(next_id),
            }
            pos += frame_len;
        }

        if pos < data.len() {
            warn!(
                garbage_bytes = data.len() - pos,
                valid_records = observations.len(),
                "observation log corruption detected, truncating"
            );
            OpenOptions::new()
                .write(true)
                .open(path)
                .and_then(|f| f.set_len(pos as u64))?;
        }

        observations.sort_by_key(|o: &Observation| o.id);
        let next_id = observations
            .last()
            .map_or(watermark, |o| watermark.max(o.id + 1));
        Ok((observations, next_id))
    }

    fn write_record(&mut self, record: &LogRecord) -> Result<(), StoreError> {
        let frame = encode_frame(record)?;
        let start = self.file.metadata()?.len();

        let written = self
            .file
            .write_all(&frame)
            .and_then(|_| self.file.sync_data());
        if let Err(e) = written {
            // Leave no half-written frame behind for the next append.
            let _ = self.file.set_len(start);
            return Err(e.into());
        }
        Ok(())
    }

    /// Rewrites the log so it holds exactly `keep`, then swaps it in.
    fn rewrite(&mut self, keep: Vec<Observation>) -> Result<(), StoreError> {
        let mut tmp = tempfile::Builder::new()
            .prefix("observations.")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;

        tmp.write_all(&encode_frame(&LogRecord::Watermark {
            next_id: self.next_id,
        })?)?;
        for obs in &keep {
            let stored = StoredObservation::from_observation(obs)?;
            tmp.write_all(&encode_frame(&LogRecord::Observation(stored))?)?;
        }
        tmp.as_file().sync_all()?;

        let path = self.path();
        tmp.persist(&path).map_err(|e| e.error)?;
        self.file = Self::open_append(&path)?;

        debug!(
            removed = self.observations.len() - keep.len(),
            remaining = keep.len(),
            "observation log compacted"
        );
        self.observations = keep;
        Ok(())
    }
}

impl ObservationStore for LogStore {
    fn append(
        &mut self,
        category: &str,
        datetime: DateTime<Utc>,
        data: serde_json::Value,
    ) -> Result<Observation, StoreError> {
        let observation = Observation {
            id: self.next_id,
            category: category.to_string(),
            datetime: truncate_to_micros(datetime),
            data,
        };
        let stored = StoredObservation::from_observation(&observation)?;
        self.write_record(&LogRecord::Observation(stored))?;

        self.next_id += 1;
        self.observations.push(observation.clone());
        Ok(observation)
    }

    fn get(&self, id: u64) -> Result<Option<Observation>, StoreError> {
        Ok(self
            .observations
            .binary_search_by_key(&id, |o| o.id)
            .ok()
            .map(|idx| self.observations[idx].clone()))
    }

    fn list(&self, category: &str) -> Result<Vec<Observation>, StoreError> {
        Ok(self
            .observations
            .iter()
            .rev()
            .filter(|o| o.category == category)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.observations.len())
    }

    fn delete(&mut self, id: u64) -> Result<bool, StoreError> {
        if self.observations.binary_search_by_key(&id, |o| o.id).is_err() {
            return Ok(false);
        }
        let keep = self
            .observations
            .iter()
            .filter(|o| o.id != id)
            .cloned()
            .collect();
        self.rewrite(keep)?;
        Ok(true)
    }

    fn delete_before(&mut self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let keep: Vec<Observation> = self
            .observations
            .iter()
            .filter(|o| o.datetime >= cutoff)
            .cloned()
            .collect();
        let removed = self.observations.len() - keep.len();
        if removed > 0 {
            self.rewrite(keep)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use tempfile::TempDir;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_append_and_reopen() {
        let dir = TempDir::new().unwrap();
        let dt = DateTime::from_timestamp(1_760_000_000, 123_456_789).unwrap();
        {
            let mut store = LogStore::open(dir.path()).unwrap();
            store.append("loadavg", dt, json!({"loadavg1": 0.5})).unwrap();
            store.append("df", dt, json!([{"mount": "/"}])).unwrap();
        }

        let mut store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        let first = store.get(1).unwrap().unwrap();
        assert_eq!(first.category, "loadavg");
        assert_eq!(first.data["loadavg1"], 0.5);
        assert_eq!(first.datetime.timestamp_subsec_nanos(), 123_456_000);

        let next = store.append("cpu", dt, json!({})).unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn test_list_newest_first() {
        let dir = TempDir::new().unwrap();
        let mut store = LogStore::open(dir.path()).unwrap();
        store.append("cpu", ts(1), json!(1)).unwrap();
        store.append("mem", ts(2), json!(2)).unwrap();
        store.append("cpu", ts(3), json!(3)).unwrap();

        let ids: Vec<u64> = store.list("cpu").unwrap().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_garbage_tail_is_truncated() {
        let dir = TempDir::new().unwrap();
        let path = {
            let mut store = LogStore::open(dir.path()).unwrap();
            store.append("cpu", ts(1), json!({})).unwrap();
            store.append("cpu", ts(2), json!({})).unwrap();
            store.path()
        };
        let valid_len = fs::metadata(&path).unwrap().len();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0x05, 0x00, 0x00]).unwrap();
        drop(file);

        let store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(fs::metadata(&path).unwrap().len(), valid_len);
    }

    #[test]
    fn test_torn_last_frame_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = {
            let mut store = LogStore::open(dir.path()).unwrap();
            store.append("cpu", ts(1), json!({"a": 1})).unwrap();
            store.append("cpu", ts(2), json!({"b": 2})).unwrap();
            store.path()
        };
        let len = fs::metadata(&path).unwrap().len();
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(len - 3)
            .unwrap();

        let mut store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get(2).unwrap().is_none());
        // The torn id was never acknowledged as durable, so it may be handed out again.
        assert_eq!(store.append("cpu", ts(3), json!({})).unwrap().id, 2);
    }

    #[test]
    fn test_corrupted_checksum_stops_recovery() {
        let dir = TempDir::new().unwrap();
        let path = {
            let mut store = LogStore::open(dir.path()).unwrap();
            store.append("cpu", ts(1), json!({})).unwrap();
            store.path()
        };
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        let store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_ids_not_reused_after_deletion() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = LogStore::open(dir.path()).unwrap();
            for i in 0..3 {
                store.append("cpu", ts(i), json!({})).unwrap();
            }
            assert_eq!(store.delete_before(ts(100)).unwrap(), 3);
            assert_eq!(store.count().unwrap(), 0);
        }

        let mut store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.append("cpu", ts(5), json!({})).unwrap().id, 4);
    }

    #[test]
    fn test_delete_persists() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = LogStore::open(dir.path()).unwrap();
            store.append("cpu", ts(1), json!({})).unwrap();
            store.append("cpu", ts(2), json!({})).unwrap();
            assert!(store.delete(1).unwrap());
            assert!(!store.delete(1).unwrap());
        }

        let store = LogStore::open(dir.path()).unwrap();
        assert!(store.get(1).unwrap().is_none());
        assert!(store.get(2).unwrap().is_some());
    }

    #[test]
    fn test_delete_before_is_strict() {
        let dir = TempDir::new().unwrap();
        let mut store = LogStore::open(dir.path()).unwrap();
        let now = ts(1_760_000_000);
        store.append("cpu", now - Duration::days(1), json!({})).unwrap();
        store.append("cpu", now, json!({})).unwrap();

        assert_eq!(store.delete_before(now).unwrap(), 1);
        assert_eq!(store.delete_before(now).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_stale_tmp_files_removed_on_open() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("observations.abc123.tmp");
        fs::write(&stale, b"partial").unwrap();

        LogStore::open(dir.path()).unwrap();
        assert!(!stale.exists());
    }
}
