//! Scoring: per-answer correctness and session-level aggregation.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Participant, Response, SessionSummary};
use crate::error::{QuizError, QuizResult};

/// An answer is correct when it matches the image's ground truth.
pub fn is_correct(ground_truth: bool, answer: bool) -> bool {
  ground_truth == answer
}

/// `round(100 * score / total, 1)`.
pub fn percent(score: usize, total: usize) -> f64 {
  (1000.0 * score as f64 / total as f64).round() / 10.0
}

/// Summarize a finished session. Result does not depend on response order.
pub fn evaluate(
  session_id: Uuid,
  participant: &Participant,
  responses: &[Response],
) -> QuizResult<SessionSummary> {
  let total = responses.len();
  if total == 0 {
    return Err(QuizError::EmptySession);
  }

  let mut per_category: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
  let mut score = 0usize;
  for r in responses {
    let ok = r.is_correct();
    let slot = per_category.entry(r.item.category.as_str()).or_insert((0, 0));
    slot.1 += 1;
    if ok {
      score += 1;
      slot.0 += 1;
    }
  }

  let category_accuracy = per_category
    .into_iter()
    .map(|(cat, (hit, n))| (cat.to_string(), hit as f64 / n as f64))
    .collect();

  Ok(SessionSummary {
    session_id,
    participant: participant.clone(),
    responses: responses.to_vec(),
    score,
    total,
    percent: percent(score, total),
    category_accuracy,
    completed_at: Utc::now(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ImageItem;

  fn resp(id: &str, category: &str, truth: bool, answer: bool) -> Response {
    Response {
      item: ImageItem { identifier: id.into(), category: category.into(), ground_truth: truth },
      answer,
      answered_at: Utc::now(),
    }
  }

  fn who() -> Participant {
    Participant { name: "Ana".into(), age: 30 }
  }

  #[test]
  fn correctness_truth_table() {
    assert!(is_correct(true, true));
    assert!(is_correct(false, false));
    assert!(!is_correct(true, false));
    assert!(!is_correct(false, true));
  }

  #[test]
  fn empty_session_is_rejected() {
    assert_eq!(evaluate(Uuid::nil(), &who(), &[]).unwrap_err(), QuizError::EmptySession);
  }

  #[test]
  fn score_total_and_percent() {
    let rs = vec![
      resp("a", "real", true, true),
      resp("b", "firefly", false, false),
      resp("c", "midjourney", false, true),
    ];
    let s = evaluate(Uuid::nil(), &who(), &rs).unwrap();
    assert_eq!(s.score, 2);
    assert_eq!(s.total, 3);
    assert_eq!(s.percent, 66.7);
    assert_eq!(s.responses.len(), 3);
  }

  #[test]
  fn category_accuracy_only_lists_seen_categories() {
    let rs = vec![
      resp("a", "real", true, true),
      resp("b", "real", true, false),
      resp("c", "firefly", false, false),
    ];
    let s = evaluate(Uuid::nil(), &who(), &rs).unwrap();
    assert_eq!(s.category_accuracy.len(), 2);
    assert_eq!(s.category_accuracy["real"], 0.5);
    assert_eq!(s.category_accuracy["firefly"], 1.0);
    assert!(!s.category_accuracy.contains_key("midjourney"));
  }

  #[test]
  fn order_does_not_change_aggregates() {
    let mut rs = vec![
      resp("a", "real", true, true),
      resp("b", "real", true, false),
      resp("c", "firefly", false, false),
      resp("d", "midjourney", false, true),
      resp("e", "midjourney", false, false),
    ];
    let first = evaluate(Uuid::nil(), &who(), &rs).unwrap();
    rs.reverse();
    let second = evaluate(Uuid::nil(), &who(), &rs).unwrap();
    rs.rotate_left(2);
    let third = evaluate(Uuid::nil(), &who(), &rs).unwrap();
    for other in [&second, &third] {
      assert_eq!(first.score, other.score);
      assert_eq!(first.percent, other.percent);
      assert_eq!(first.category_accuracy, other.category_accuracy);
    }
  }

  #[test]
  fn percent_rounds_to_one_decimal() {
    assert_eq!(percent(1, 3), 33.3);
    assert_eq!(percent(10, 10), 100.0);
    assert_eq!(percent(0, 7), 0.0);
    assert_eq!(percent(5, 8), 62.5);
  }
}
