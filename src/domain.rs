//! Domain models: pool entries, quiz items, participant answers and session summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw record from the image pool, before ground truth is resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolEntry {
  /// Path relative to the images directory, e.g. `"firefly/cat_false.png"`.
  pub identifier: String,
  /// Source label, e.g. `real`, `firefly`, `midjourney`.
  pub category: String,
}

impl PoolEntry {
  pub fn new(identifier: impl Into<String>, category: impl Into<String>) -> Self {
    Self { identifier: identifier.into(), category: category.into() }
  }
}

/// One quiz question. `ground_truth == true` means the image is a real photograph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageItem {
  pub identifier: String,
  pub category: String,
  pub ground_truth: bool,
}

/// Who is taking the quiz.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
  pub name: String,
  pub age: u8,
}

/// A single recorded answer. Created once per item, in item order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
  pub item: ImageItem,
  /// `true` = the participant says the image is real.
  pub answer: bool,
  pub answered_at: DateTime<Utc>,
}

impl Response {
  pub fn is_correct(&self) -> bool {
    crate::scoring::is_correct(self.item.ground_truth, self.answer)
  }
}

/// Result of a completed session, handed to a `ResultSink`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSummary {
  pub session_id: Uuid,
  pub participant: Participant,
  pub responses: Vec<Response>,
  pub score: usize,
  pub total: usize,
  /// Rounded to one decimal place.
  pub percent: f64,
  /// Mean correctness per category; categories without responses are absent.
  pub category_accuracy: BTreeMap<String, f64>,
  pub completed_at: DateTime<Utc>,
}

/// Row shape used for leaderboard display (and the remote sheet bridge).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
  pub name: String,
  pub age: u8,
  pub score: usize,
  pub total: usize,
  pub percent: f64,
  pub completed_at: DateTime<Utc>,
}

impl From<&SessionSummary> for LeaderboardEntry {
  fn from(s: &SessionSummary) -> Self {
    Self {
      name: s.participant.name.clone(),
      age: s.participant.age,
      score: s.score,
      total: s.total,
      percent: s.percent,
      completed_at: s.completed_at,
    }
  }
}
