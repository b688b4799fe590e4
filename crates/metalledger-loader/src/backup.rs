//! Timestamped backups and the background auto-backup worker.

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use metalledger_core::InventoryRepository;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{write_document, LoadError, Store};

/// File name prefix of every backup.
pub const BACKUP_PREFIX: &str = "backup_";

const STAMP: &str = "%Y%m%d_%H%M%S";

/// The repository shared between the foreground and the backup worker.
pub type SharedInventory = Arc<Mutex<InventoryRepository>>;

pub(crate) fn write_backup(
    dir: &Path,
    repo: &InventoryRepository,
    now: NaiveDateTime,
) -> Result<PathBuf, LoadError> {
    fs::create_dir_all(dir).map_err(|e| LoadError::io(dir, e))?;
    let path = dir.join(format!("{BACKUP_PREFIX}{}.json", now.format(STAMP)));
    write_document(repo, &path)?;
    info!(path = %path.display(), "wrote backup");
    Ok(path)
}

/// Backups in `dir` with their stamps, oldest first. Other files are ignored.
pub(crate) fn list_backups(dir: &Path) -> Result<Vec<(NaiveDateTime, PathBuf)>, LoadError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))? {
        let path = entry.map_err(|e| LoadError::io(dir, e))?.path();
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(BACKUP_PREFIX))
            .and_then(|n| n.strip_suffix(".json"))
            .and_then(|s| NaiveDateTime::parse_from_str(s, STAMP).ok());
        if let Some(stamp) = stamp {
            found.push((stamp, path));
        }
    }
    found.sort();
    Ok(found)
}

pub(crate) fn prune_backups(
    dir: &Path,
    retention_days: u64,
    now: NaiveDateTime,
) -> Result<usize, LoadError> {
    let days = i64::try_from(retention_days).unwrap_or(i64::MAX);
    let cutoff = ChronoDuration::try_days(days)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(NaiveDateTime::MIN);

    let mut removed = 0;
    for (stamp, path) in list_backups(dir)? {
        if stamp < cutoff {
            fs::remove_file(&path).map_err(|e| LoadError::io(&path, e))?;
            debug!(path = %path.display(), "removed expired backup");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Handle to the periodic backup thread.
///
/// Each tick clones the repository under the lock, releases it, then writes
/// the clone and prunes expired backups. Failures are logged and the worker
/// keeps running. Dropping the handle stops the thread.
pub struct AutoBackup {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoBackup {
    /// Start the worker.
    pub fn spawn(
        shared: SharedInventory,
        store: Store,
        interval: Duration,
        retention_days: u64,
    ) -> Result<Self, LoadError> {
        let (stop, stopped) = bounded::<()>(1);
        let dir = store.backup_dir().to_path_buf();
        let handle = thread::Builder::new()
            .name("auto-backup".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let snapshot = shared.lock().clone();
                        let now = Local::now().naive_local();
                        if let Err(e) = write_backup(&dir, &snapshot, now) {
                            warn!(error = %e, "automatic backup failed");
                            continue;
                        }
                        if let Err(e) = prune_backups(&dir, retention_days, now) {
                            warn!(error = %e, "pruning old backups failed");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| LoadError::io(store.backup_dir(), e))?;

        info!(interval_secs = interval.as_secs(), "auto-backup started");
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("auto-backup thread panicked");
            }
        }
    }
}

impl Drop for AutoBackup {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_prune_keeps_recent_backups() {
        let dir = TempDir::new().unwrap();
        let repo = InventoryRepository::new();
        for day in [1, 5, 9, 10] {
            write_backup(dir.path(), &repo, at(day)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        let removed = prune_backups(dir.path(), 7, at(10)).unwrap();

        assert_eq!(removed, 1);
        let left: Vec<NaiveDateTime> = list_backups(dir.path())
            .unwrap()
            .into_iter()
            .map(|(stamp, _)| stamp)
            .collect();
        assert_eq!(left, vec![at(5), at(9), at(10)]);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_list_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(list_backups(&dir.path().join("none")).unwrap().is_empty());
    }

    #[test]
    fn test_auto_backup_writes_and_stops() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("data.json"), dir.path().join("backups"));
        let shared: SharedInventory = Arc::new(Mutex::new(InventoryRepository::new()));

        let worker = AutoBackup::spawn(
            Arc::clone(&shared),
            store.clone(),
            Duration::from_millis(50),
            7,
        )
        .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while store.backups().unwrap().is_empty() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        worker.stop();

        assert!(!store.backups().unwrap().is_empty());
        // The lock is free again once the worker is gone
        assert!(shared.try_lock().is_some());
    }
}
