//! One participant's forward-only pass through a sampled item set.
//!
//! States are `AwaitingAnswer(i)` for `i < len` and `Complete` once every item has
//! a response. Answers are append-only; there is no going back.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ImageItem, Participant, Response, SessionSummary};
use crate::error::{QuizError, QuizResult};
use crate::scoring::evaluate;

#[derive(Clone, Debug)]
pub struct QuizSession {
  id: Uuid,
  participant: Participant,
  items: Vec<ImageItem>,
  responses: Vec<Response>,
  started_at: DateTime<Utc>,
}

impl QuizSession {
  pub fn new(participant: Participant, items: Vec<ImageItem>) -> Self {
    Self {
      id: Uuid::new_v4(),
      participant,
      items,
      responses: Vec::new(),
      started_at: Utc::now(),
    }
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn participant(&self) -> &Participant {
    &self.participant
  }

  pub fn started_at(&self) -> DateTime<Utc> {
    self.started_at
  }

  /// Number of items in the quiz.
  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// Index of the item awaiting an answer (== `len()` once complete).
  pub fn position(&self) -> usize {
    self.responses.len()
  }

  pub fn is_complete(&self) -> bool {
    self.responses.len() == self.items.len()
  }

  /// Answers recorded so far, in item order.
  pub fn responses(&self) -> &[Response] {
    &self.responses
  }

  pub fn current_item(&self) -> QuizResult<&ImageItem> {
    self.items.get(self.position()).ok_or(QuizError::SessionComplete)
  }

  /// Record the answer for the current item and advance.
  pub fn record_answer(&mut self, answer: bool) -> QuizResult<&Response> {
    let item = match self.items.get(self.position()) {
      Some(item) => item.clone(),
      None => return Err(QuizError::SessionAlreadyComplete),
    };
    self.responses.push(Response { item, answer, answered_at: Utc::now() });
    Ok(&self.responses[self.responses.len() - 1])
  }

  /// Consume a completed session and produce its summary.
  pub fn finish(self) -> QuizResult<SessionSummary> {
    if !self.is_complete() {
      return Err(QuizError::SessionIncomplete {
        answered: self.responses.len(),
        total: self.items.len(),
      });
    }
    evaluate(self.id, &self.participant, self.responses())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(id: &str, category: &str, truth: bool) -> ImageItem {
    ImageItem { identifier: id.into(), category: category.into(), ground_truth: truth }
  }

  fn abc() -> QuizSession {
    QuizSession::new(
      Participant { name: "Lu".into(), age: 41 },
      vec![item("A", "real", true), item("B", "firefly", false), item("C", "midjourney", false)],
    )
  }

  #[test]
  fn walks_items_in_order() {
    let mut s = abc();
    assert_eq!(s.current_item().unwrap().identifier, "A");
    assert!(s.responses().is_empty());
    s.record_answer(true).unwrap();
    assert_eq!(s.position(), 1);
    assert_eq!(s.current_item().unwrap().identifier, "B");
    s.record_answer(false).unwrap();
    s.record_answer(true).unwrap();
    assert!(s.is_complete());
    assert_eq!(s.current_item().unwrap_err(), QuizError::SessionComplete);

    let recorded: Vec<(&str, bool)> =
      s.responses().iter().map(|r| (r.item.identifier.as_str(), r.answer)).collect();
    assert_eq!(recorded, vec![("A", true), ("B", false), ("C", true)]);
  }

  #[test]
  fn three_item_round_trip() {
    let mut s = abc();
    let correctness: Vec<bool> =
      [true, false, true].into_iter().map(|a| s.record_answer(a).unwrap().is_correct()).collect();
    assert_eq!(correctness, vec![true, true, false]);

    let summary = s.finish().unwrap();
    assert_eq!(summary.score, 2);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.percent, 66.7);
    assert_eq!(summary.participant.name, "Lu");
  }

  #[test]
  fn answering_after_completion_fails() {
    let mut s = abc();
    for _ in 0..3 {
      s.record_answer(false).unwrap();
    }
    assert_eq!(s.record_answer(true).unwrap_err(), QuizError::SessionAlreadyComplete);
    assert_eq!(s.position(), 3);
  }

  #[test]
  fn finishing_early_fails() {
    let mut s = abc();
    s.record_answer(true).unwrap();
    assert_eq!(
      s.finish().unwrap_err(),
      QuizError::SessionIncomplete { answered: 1, total: 3 }
    );
  }

  #[test]
  fn empty_session_is_complete_but_cannot_be_scored() {
    let s = QuizSession::new(Participant { name: "X".into(), age: 20 }, Vec::new());
    assert!(s.is_complete());
    assert_eq!(s.finish().unwrap_err(), QuizError::EmptySession);
  }
}
