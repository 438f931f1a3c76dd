//! Result persistence. A finished `SessionSummary` is appended to exactly one sink,
//! and the leaderboard is read back from the same sink.
//!
//! Failures here never invalidate the summary; callers report them and move on.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::SinkConfig;
use crate::domain::{LeaderboardEntry, SessionSummary};
use crate::error::PersistenceError;

pub mod csv_file;
pub mod remote;

pub use csv_file::CsvSink;
pub use remote::RemoteSheetSink;

#[async_trait]
pub trait ResultSink: Send + Sync {
  /// Short label for logs.
  fn name(&self) -> &'static str;

  /// Persist one completed session.
  async fn append(&self, summary: &SessionSummary) -> Result<(), PersistenceError>;

  /// Highest-scoring sessions, best first.
  async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>, PersistenceError>;
}

/// Build the configured sink.
pub fn build_sink(cfg: &SinkConfig) -> Result<Arc<dyn ResultSink>, PersistenceError> {
  let sink: Arc<dyn ResultSink> = match cfg {
    SinkConfig::Csv { path } => {
      info!(target: "imgquiz_backend", path = %path.display(), "Results go to CSV file");
      Arc::new(CsvSink::new(path.clone()))
    }
    SinkConfig::Remote { url, token } => {
      info!(target: "imgquiz_backend", %url, has_token = token.is_some(), "Results go to remote sheet");
      Arc::new(RemoteSheetSink::new(url.clone(), token.clone())?)
    }
  };
  Ok(sink)
}

/// Order used by every leaderboard: score desc, percent desc, earliest first.
pub(crate) fn rank(entries: &mut [LeaderboardEntry]) {
  entries.sort_by(|a, b| {
    b.score
      .cmp(&a.score)
      .then(b.percent.total_cmp(&a.percent))
      .then(a.completed_at.cmp(&b.completed_at))
  });
}
