//! Local CSV results table. One row per completed session.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{rank, ResultSink};
use crate::domain::{LeaderboardEntry, SessionSummary};
use crate::error::PersistenceError;

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
  session_id: Uuid,
  name: String,
  age: u8,
  score: usize,
  total: usize,
  percent: f64,
  /// Compact JSON object, e.g. `{"firefly":0.5,"real":1.0}`.
  category_accuracy: String,
  completed_at: DateTime<Utc>,
}

impl CsvRow {
  fn from_summary(s: &SessionSummary) -> Result<Self, PersistenceError> {
    Ok(Self {
      session_id: s.session_id,
      name: s.participant.name.clone(),
      age: s.participant.age,
      score: s.score,
      total: s.total,
      percent: s.percent,
      category_accuracy: serde_json::to_string(&s.category_accuracy)?,
      completed_at: s.completed_at,
    })
  }

  fn into_entry(self) -> Result<LeaderboardEntry, PersistenceError> {
    // Rows are only trusted as far as the accuracy column still parses.
    serde_json::from_str::<BTreeMap<String, f64>>(&self.category_accuracy)
      .map_err(|e| PersistenceError::MalformedRow(format!("session {}: {e}", self.session_id)))?;
    Ok(LeaderboardEntry {
      name: self.name,
      age: self.age,
      score: self.score,
      total: self.total,
      percent: self.percent,
      completed_at: self.completed_at,
    })
  }
}

fn append_row(path: &Path, row: &CsvRow) -> Result<bool, PersistenceError> {
  let file = OpenOptions::new().create(true).append(true).open(path)?;
  let needs_header = file.metadata()?.len() == 0;
  let mut wtr = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);
  wtr.serialize(row)?;
  wtr.flush()?;
  Ok(needs_header)
}

fn read_entries(path: &Path) -> Result<Vec<LeaderboardEntry>, PersistenceError> {
  if !path.exists() {
    return Ok(Vec::new());
  }
  let mut rdr = csv::Reader::from_path(path)?;
  let mut entries = Vec::new();
  for row in rdr.deserialize::<CsvRow>() {
    entries.push(row?.into_entry()?);
  }
  Ok(entries)
}

/// File access runs on the blocking pool; `lock` keeps appends and reads from interleaving.
pub struct CsvSink {
  path: PathBuf,
  lock: Mutex<()>,
}

impl CsvSink {
  pub fn new(path: PathBuf) -> Self {
    Self { path, lock: Mutex::new(()) }
  }
}

#[async_trait]
impl ResultSink for CsvSink {
  fn name(&self) -> &'static str {
    "csv"
  }

  #[instrument(level = "debug", skip(self, summary), fields(session_id = %summary.session_id))]
  async fn append(&self, summary: &SessionSummary) -> Result<(), PersistenceError> {
    let row = CsvRow::from_summary(summary)?;
    let _guard = self.lock.lock().await;
    let path = self.path.clone();
    let needs_header = tokio::task::spawn_blocking(move || append_row(&path, &row)).await??;
    debug!(target: "quiz", path = %self.path.display(), needs_header, "Result row appended");
    Ok(())
  }

  #[instrument(level = "debug", skip(self))]
  async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>, PersistenceError> {
    let _guard = self.lock.lock().await;
    let path = self.path.clone();
    let mut entries = tokio::task::spawn_blocking(move || read_entries(&path)).await??;
    rank(&mut entries);
    entries.truncate(n);
    Ok(entries)
  }
}
