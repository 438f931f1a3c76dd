//! Remote spreadsheet bridge over HTTP JSON.
//!
//! The endpoint is a small web app sitting in front of a sheet:
//!   POST <url>            body = SheetRow        → 2xx on success
//!   GET  <url>?top=<n>    → JSON array of LeaderboardEntry, best first
//!
//! We never log the token.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{rank, ResultSink};
use crate::domain::{LeaderboardEntry, SessionSummary};
use crate::error::PersistenceError;
use crate::util::trunc_for_log;

const AGENT: &str = concat!("imgquiz-backend/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct SheetRow<'a> {
  session_id: Uuid,
  name: &'a str,
  age: u8,
  score: usize,
  total: usize,
  percent: f64,
  category_accuracy: &'a BTreeMap<String, f64>,
  completed_at: DateTime<Utc>,
}

impl<'a> From<&'a SessionSummary> for SheetRow<'a> {
  fn from(s: &'a SessionSummary) -> Self {
    Self {
      session_id: s.session_id,
      name: &s.participant.name,
      age: s.participant.age,
      score: s.score,
      total: s.total,
      percent: s.percent,
      category_accuracy: &s.category_accuracy,
      completed_at: s.completed_at,
    }
  }
}

pub struct RemoteSheetSink {
  client: reqwest::Client,
  url: String,
  token: Option<String>,
}

impl RemoteSheetSink {
  pub fn new(url: String, token: Option<String>) -> Result<Self, PersistenceError> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(15)).build()?;
    Ok(Self { client, url, token })
  }

  fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    let req = req.header(USER_AGENT, AGENT);
    match &self.token {
      Some(t) => req.header(AUTHORIZATION, format!("Bearer {t}")),
      None => req,
    }
  }

  async fn check(res: reqwest::Response) -> Result<reqwest::Response, PersistenceError> {
    if res.status().is_success() {
      return Ok(res);
    }
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    error!(target: "imgquiz_backend", status, body = %trunc_for_log(&body, 200), "Remote sheet rejected request");
    Err(PersistenceError::Status { status, body })
  }
}

#[async_trait]
impl ResultSink for RemoteSheetSink {
  fn name(&self) -> &'static str {
    "remote"
  }

  #[instrument(level = "info", skip(self, summary), fields(session_id = %summary.session_id))]
  async fn append(&self, summary: &SessionSummary) -> Result<(), PersistenceError> {
    let start = std::time::Instant::now();
    let res = self
      .authorize(self.client.post(&self.url))
      .json(&SheetRow::from(summary))
      .send()
      .await?;
    Self::check(res).await?;
    info!(target: "imgquiz_backend", elapsed = ?start.elapsed(), "Row appended to remote sheet");
    Ok(())
  }

  #[instrument(level = "info", skip(self))]
  async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>, PersistenceError> {
    let res = self
      .authorize(self.client.get(&self.url))
      .query(&[("top", n)])
      .send()
      .await?;
    let body = Self::check(res).await?.text().await?;
    let mut entries: Vec<LeaderboardEntry> = serde_json::from_str(&body)?;
    // The bridge may ignore `top`; enforce it here.
    rank(&mut entries);
    entries.truncate(n);
    Ok(entries)
  }
}
