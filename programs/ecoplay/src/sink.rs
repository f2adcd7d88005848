//! Round record storage
//!
//! Every settled round becomes one append-only [`RoundRecord`], queried back
//! by participant and game type for history and reports.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use settlement_logic::{GameType, SettledRound};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{LabError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub record_id: Uuid,
    pub user_id: String,
    pub session_id: Uuid,
    pub game_type: GameType,
    /// Public Goods only: `group_<session>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub round: SettledRound,
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append one record, returning its id
    async fn persist_round(&self, record: &RoundRecord) -> Result<Uuid>;

    /// Records for one participant and game type, in insertion order
    async fn rounds_for(&self, user_id: &str, game_type: GameType) -> Result<Vec<RoundRecord>>;
}

#[derive(Default)]
pub struct MemoryRecordSink {
    records: RwLock<Vec<RoundRecord>>,
}

impl MemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl RecordSink for MemoryRecordSink {
    async fn persist_round(&self, record: &RoundRecord) -> Result<Uuid> {
        self.records.write().await.push(record.clone());
        Ok(record.record_id)
    }

    async fn rounds_for(&self, user_id: &str, game_type: GameType) -> Result<Vec<RoundRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id && r.game_type == game_type)
            .cloned()
            .collect())
    }
}

/// Append-only JSON-lines file, one record per line
pub struct JsonlRecordSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlRecordSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for JsonlRecordSink {
    async fn persist_round(&self, record: &RoundRecord) -> Result<Uuid> {
        let mut line = serde_json::to_string(record).map_err(|e| LabError::Persistence(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| LabError::Persistence(format!("{}: {}", self.path.display(), e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| LabError::Persistence(e.to_string()))?;
        file.flush().await.map_err(|e| LabError::Persistence(e.to_string()))?;

        Ok(record.record_id)
    }

    async fn rounds_for(&self, user_id: &str, game_type: GameType) -> Result<Vec<RoundRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LabError::Persistence(format!("{}: {}", self.path.display(), e))),
        };

        let mut records = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: RoundRecord = serde_json::from_str(line)
                .map_err(|e| LabError::Persistence(format!("line {}: {}", i + 1, e)))?;
            if record.user_id == user_id && record.game_type == game_type {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settlement_logic::{replay, GameMode, PersonalityCatalog};

    fn records(user_id: &str, mode: GameMode) -> Vec<RoundRecord> {
        let session_id = Uuid::new_v4();
        replay(mode, PersonalityCatalog::standard(), 3, &[1, 2, 3])
            .unwrap()
            .into_iter()
            .map(|round| RoundRecord {
                record_id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                session_id,
                game_type: mode.game_type(),
                group_id: None,
                timestamp: Utc::now(),
                round,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_memory_sink_filters() {
        let sink = MemoryRecordSink::new();
        for r in records("a", GameMode::PublicGoods).iter().chain(&records("b", GameMode::PublicGoods)) {
            sink.persist_round(r).await.unwrap();
        }
        for r in &records("a", GameMode::TrustTrustor) {
            sink.persist_round(r).await.unwrap();
        }
        assert_eq!(sink.len().await, 9);
        assert_eq!(sink.rounds_for("a", GameType::PublicGoods).await.unwrap().len(), 3);
        assert_eq!(sink.rounds_for("a", GameType::TrustGame).await.unwrap().len(), 3);
        assert!(sink.rounds_for("c", GameType::TrustGame).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_jsonl_sink_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlRecordSink::new(dir.path().join("rounds.jsonl"));
        assert!(sink.rounds_for("a", GameType::PublicGoods).await.unwrap().is_empty());

        let written = records("a", GameMode::PublicGoods);
        for r in &written {
            sink.persist_round(r).await.unwrap();
        }
        let read = sink.rounds_for("a", GameType::PublicGoods).await.unwrap();
        assert_eq!(read.len(), written.len());
        assert_eq!(read[0].record_id, written[0].record_id);
        assert_eq!(read[2].round.decision, 3);
    }

    #[tokio::test]
    async fn test_jsonl_sink_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlRecordSink::new(dir.path().join("missing").join("rounds.jsonl"));
        let record = &records("a", GameMode::PublicGoods)[0];
        assert!(matches!(sink.persist_round(record).await, Err(LabError::Persistence(_))));
    }
}
