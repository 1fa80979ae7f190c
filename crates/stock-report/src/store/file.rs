//! On-disk JSON store
//!
//! Layout under the root directory:
//!
//! ```text
//! {root}/{ENTITY}/datasets/{kind}.json
//! {root}/{ENTITY}/reports/{kind}.json
//! ```
//!
//! Documents are written to a temporary sibling and renamed into place, so a
//! concurrent reader sees either the old or the new document, never a torn one.

use super::{DatasetRepository, ReportRepository};
use crate::error::{ReportError, Result};
use async_trait::async_trait;
use report_core::{Dataset, DatasetKind, EntityId, Report, ReportKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const DATASETS_DIR: &str = "datasets";
const REPORTS_DIR: &str = "reports";

/// JSON-file store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn section_dir(&self, entity: &EntityId, section: &str) -> PathBuf {
        self.root.join(entity.as_str()).join(section)
    }

    fn dataset_path(&self, entity: &EntityId, kind: DatasetKind) -> PathBuf {
        self.section_dir(entity, DATASETS_DIR)
            .join(format!("{}.json", kind.as_str()))
    }

    fn report_path(&self, entity: &EntityId, kind: ReportKind) -> PathBuf {
        self.section_dir(entity, REPORTS_DIR)
            .join(format!("{}.json", kind.as_str()))
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(storage_error("read", path, &e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| storage_error("decode", path, &e))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| ReportError::Storage(format!("no parent for {}", path.display())))?;
    fs::create_dir_all(dir)
        .await
        .map_err(|e| storage_error("create", dir, &e))?;

    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
    fs::write(&tmp, bytes)
        .await
        .map_err(|e| storage_error("write", &tmp, &e))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(storage_error("rename", path, &e));
    }
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Remove a section directory, returning how many documents it held
async fn remove_section(dir: &Path) -> Result<usize> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(storage_error("list", dir, &e)),
    };

    let mut documents = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| storage_error("list", dir, &e))?
    {
        if entry.path().extension().is_some_and(|ext| ext == "json") {
            documents += 1;
        }
    }

    fs::remove_dir_all(dir)
        .await
        .map_err(|e| storage_error("remove", dir, &e))?;
    Ok(documents)
}

fn storage_error(op: &str, path: &Path, err: &dyn std::fmt::Display) -> ReportError {
    ReportError::Storage(format!("failed to {op} {}: {err}", path.display()))
}

#[async_trait]
impl DatasetRepository for FileStore {
    async fn load_dataset(&self, entity: &EntityId, kind: DatasetKind) -> Result<Option<Dataset>> {
        read_json(&self.dataset_path(entity, kind)).await
    }

    async fn save_dataset(&self, dataset: &Dataset) -> Result<()> {
        write_json(&self.dataset_path(&dataset.entity, dataset.kind), dataset).await
    }

    async fn delete_datasets(&self, entity: &EntityId) -> Result<usize> {
        remove_section(&self.section_dir(entity, DATASETS_DIR)).await
    }
}

#[async_trait]
impl ReportRepository for FileStore {
    async fn load_report(&self, entity: &EntityId, kind: ReportKind) -> Result<Option<Report>> {
        read_json(&self.report_path(entity, kind)).await
    }

    async fn save_report(&self, report: &Report) -> Result<()> {
        write_json(&self.report_path(&report.entity, report.kind), report).await
    }

    async fn delete_reports(&self, entity: &EntityId) -> Result<usize> {
        remove_section(&self.section_dir(entity, REPORTS_DIR)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use report_core::ScoringTaskResult;
    use serde_json::json;
    use tempfile::TempDir;

    fn acme() -> EntityId {
        EntityId::parse("ACME").unwrap()
    }

    #[tokio::test]
    async fn test_dataset_round_trip_and_layout() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        let payload = json!([{"close": 3.5}]);
        let dataset = Dataset::new(acme(), DatasetKind::Quotes, payload, Utc::now());
        store.save_dataset(&dataset).await.unwrap();

        assert!(dir.path().join("ACME/datasets/quotes.json").is_file());
        let loaded = store
            .load_dataset(&acme(), DatasetKind::Quotes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, dataset);
        assert!(
            store
                .load_dataset(&acme(), DatasetKind::Ratios)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_report_overwrite_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        for score in [1, 2] {
            let report = Report::new(
                acme(),
                ReportKind::Growth,
                vec![ScoringTaskResult::ok("factor", score, "x")],
                Utc::now(),
            );
            store.save_report(&report).await.unwrap();
        }

        let loaded = store
            .load_report(&acme(), ReportKind::Growth)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.items[0].score, 2);

        let files: Vec<_> = std::fs::read_dir(dir.path().join("ACME/reports"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("growth.json")]);
    }

    #[tokio::test]
    async fn test_purge_counts_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        for kind in [DatasetKind::Quotes, DatasetKind::Ratios] {
            let dataset = Dataset::new(acme(), kind, json!([]), Utc::now());
            store.save_dataset(&dataset).await.unwrap();
        }

        assert_eq!(store.delete_datasets(&acme()).await.unwrap(), 2);
        assert_eq!(store.delete_datasets(&acme()).await.unwrap(), 0);
        assert_eq!(store.delete_reports(&acme()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let path = dir.path().join("ACME/reports/fundamental.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        let err = store
            .load_report(&acme(), ReportKind::Fundamental)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Storage(_)));
    }
}
