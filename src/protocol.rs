//! Public protocol structs for the HTTP endpoints (serde ready).
//! Ground truth never leaves the server before a session is complete.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ImageItem, LeaderboardEntry, SessionSummary};

/// Item as shown to the participant: where to fetch the image, nothing more.
#[derive(Debug, Serialize)]
pub struct ItemOut {
  pub identifier: String,
  pub url: String,
}

pub fn to_item_out(item: &ImageItem) -> ItemOut {
  ItemOut {
    identifier: item.identifier.clone(),
    url: format!("/images/{}", item.identifier),
  }
}

#[derive(Debug, Deserialize)]
pub struct StartIn {
  pub name: String,
  pub age: u32,
  #[serde(default)]
  pub consent: bool,
}

#[derive(Debug, Serialize)]
pub struct StartOut {
  #[serde(rename = "sessionId")]
  pub session_id: Uuid,
  pub total: usize,
  pub item: ItemOut,
}

#[derive(Debug, Serialize)]
pub struct CurrentOut {
  pub position: usize,
  pub total: usize,
  pub item: ItemOut,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
  /// `true` = "this image is real".
  pub answer: bool,
}

/// Per-answer review, revealed only with the final summary.
#[derive(Debug, Serialize)]
pub struct ReviewOut {
  pub identifier: String,
  pub category: String,
  pub answer: bool,
  pub ground_truth: bool,
  pub correct: bool,
  pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SummaryOut {
  #[serde(rename = "sessionId")]
  pub session_id: Uuid,
  pub name: String,
  pub age: u8,
  pub score: usize,
  pub total: usize,
  pub percent: f64,
  pub category_accuracy: BTreeMap<String, f64>,
  pub responses: Vec<ReviewOut>,
  pub completed_at: DateTime<Utc>,
}

pub fn to_summary_out(s: &SessionSummary) -> SummaryOut {
  SummaryOut {
    session_id: s.session_id,
    name: s.participant.name.clone(),
    age: s.participant.age,
    score: s.score,
    total: s.total,
    percent: s.percent,
    category_accuracy: s.category_accuracy.clone(),
    responses: s
      .responses
      .iter()
      .map(|r| ReviewOut {
        identifier: r.item.identifier.clone(),
        category: r.item.category.clone(),
        answer: r.answer,
        ground_truth: r.item.ground_truth,
        correct: r.is_correct(),
        answered_at: r.answered_at,
      })
      .collect(),
    completed_at: s.completed_at,
  }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOut {
  Next {
    position: usize,
    total: usize,
    item: ItemOut,
  },
  Complete {
    summary: SummaryOut,
    saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    save_error: Option<String>,
  },
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
  pub n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardOut {
  pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
pub struct PoolOut {
  pub pool_size: usize,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
  pub pool_size: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
  pub error: &'static str,
  pub message: String,
}
