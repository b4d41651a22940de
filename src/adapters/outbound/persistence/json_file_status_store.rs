use crate::ports::outbound::{ensure_transition, StatusRepository};
use crate::sbom_generation::domain::{JobId, JobStatus, StatusRecord};
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// JsonFileStatusStore adapter persisting one JSON document per job
///
/// Records live at `<dir>/<job id>.json` and are replaced atomically, so a
/// reader never observes a half-written record. Writes are serialised
/// within the process; the lock is held by the blocking writer itself, so a
/// caller that gives up on a write cannot let a later one overtake it.
#[derive(Debug, Clone)]
pub struct JsonFileStatusStore {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileStatusStore {
    /// Opens (creating if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create status directory: {}", dir.display()))?;
        Ok(Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(format!("{}.json", job_id))
    }

    /// All readable records, ordered by job id. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<StatusRecord>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            let mut records = Vec::new();
            for entry in fs::read_dir(&dir)
                .with_context(|| format!("Failed to read status directory: {}", dir.display()))?
            {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Ok(Some(record)) = read_record(&path) {
                    records.push(record);
                }
            }
            records.sort_by(|a, b| a.job_id.cmp(&b.job_id));
            Ok(records)
        })
        .await?
    }
}

fn read_record(path: &Path) -> Result<Option<StatusRecord>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read status record: {}", path.display()))
        }
    };
    let record = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse status record: {}", path.display()))?;
    Ok(Some(record))
}

fn write_record(dir: &Path, path: &Path, record: &StatusRecord) -> Result<()> {
    let json = serde_json::to_vec_pretty(record)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(&json)?;
    file.as_file().sync_all()?;
    file.persist(path)
        .with_context(|| format!("Failed to replace status record: {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl StatusRepository for JsonFileStatusStore {
    async fn update_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        let dir = self.dir.clone();
        let path = self.record_path(job_id);
        let job_id = job_id.clone();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let current = read_record(&path)?.map(|r| r.status);
            ensure_transition(&job_id, current, status)?;
            write_record(&dir, &path, &StatusRecord::new(job_id, status, error_message))
        })
        .await?
    }

    async fn get_status(&self, job_id: &JobId) -> Result<Option<StatusRecord>> {
        let path = self.record_path(job_id);
        tokio::task::spawn_blocking(move || read_record(&path)).await?
    }

    async fn remove(&self, job_id: &JobId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.record_path(job_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove status record"),
        }
    }
}
