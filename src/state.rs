//! Application state: configuration, image pool, resolver, live sessions and the result sink.
//!
//! Each participant's `QuizSession` lives in the session map only while it is in
//! progress. Completion removes it, scores it, and hands the summary to the sink.
//! Sessions never share state with one another.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::QuizConfig;
use crate::domain::{ImageItem, LeaderboardEntry, Participant, PoolEntry, SessionSummary};
use crate::error::{PersistenceError, QuizError};
use crate::pool::list_pool;
use crate::sampler::sample;
use crate::session::QuizSession;
use crate::sink::ResultSink;
use crate::truth::GroundTruthResolver;

/// What happened after an answer was recorded.
#[derive(Debug)]
pub enum AnswerOutcome {
  Next { position: usize, total: usize, item: ImageItem },
  Finished { summary: SessionSummary, saved: Result<(), PersistenceError> },
}

/// Failures surfaced to the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
  #[error("session {0} not found")]
  SessionNotFound(Uuid),
  #[error(transparent)]
  Quiz(#[from] QuizError),
  #[error(transparent)]
  Persistence(#[from] PersistenceError),
  #[error("image pool scan failed: {0}")]
  Pool(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<QuizConfig>,
  pub resolver: Arc<GroundTruthResolver>,
  pub pool: Arc<RwLock<Vec<PoolEntry>>>,
  pub sessions: Arc<RwLock<HashMap<Uuid, QuizSession>>>,
  pub sink: Arc<dyn ResultSink>,
}

impl AppState {
  /// Build state: resolver from config, scan the image pool once.
  #[instrument(level = "info", skip_all)]
  pub fn new(config: QuizConfig, sink: Arc<dyn ResultSink>) -> Result<Self, StateError> {
    if config.n_real + config.n_fake == 0 {
      return Err(QuizError::EmptySession.into());
    }
    let resolver = GroundTruthResolver::new(
      config.truth_mode,
      &config.real_categories,
      &config.synthetic_categories,
    )?;
    let pool = list_pool(&config.images_dir, resolver.categories(), &config.extensions)?;
    info!(
      target: "imgquiz_backend",
      mode = ?resolver.mode(),
      pool = pool.len(),
      n_real = config.n_real,
      n_fake = config.n_fake,
      sink = sink.name(),
      "Quiz state ready"
    );
    Ok(Self::with_pool(config, resolver, pool, sink))
  }

  pub fn with_pool(
    config: QuizConfig,
    resolver: GroundTruthResolver,
    pool: Vec<PoolEntry>,
    sink: Arc<dyn ResultSink>,
  ) -> Self {
    Self {
      config: Arc::new(config),
      resolver: Arc::new(resolver),
      pool: Arc::new(RwLock::new(pool)),
      sessions: Arc::new(RwLock::new(HashMap::new())),
      sink,
    }
  }

  /// Rescan the images directory. Returns the new pool size.
  #[instrument(level = "info", skip(self))]
  pub async fn reload_pool(&self) -> Result<usize, StateError> {
    let fresh = list_pool(
      &self.config.images_dir,
      self.resolver.categories(),
      &self.config.extensions,
    )?;
    let n = fresh.len();
    *self.pool.write().await = fresh;
    info!(target: "imgquiz_backend", pool = n, "Image pool reloaded");
    Ok(n)
  }

  pub async fn pool_size(&self) -> usize {
    self.pool.read().await.len()
  }

  /// Validate the participant, sample a quiz and register a new session.
  #[instrument(level = "info", skip(self, name))]
  pub async fn start_session(
    &self,
    name: &str,
    age: u32,
    consent: bool,
  ) -> Result<(Uuid, usize, ImageItem), StateError> {
    let participant = validate_participant(name, age, consent)?;
    if self.config.n_real + self.config.n_fake == 0 {
      return Err(QuizError::EmptySession.into());
    }
    let pool = self.pool.read().await;
    let items = sample(
      &pool,
      self.config.n_real,
      self.config.n_fake,
      &self.resolver,
      &mut rand::thread_rng(),
    );
    drop(pool);
    let items = items.map_err(|e| {
      error!(target: "quiz", error = %e, "Could not sample a quiz");
      e
    })?;

    let session = QuizSession::new(participant, items);
    let id = session.id();
    let total = session.len();
    let first = session.current_item()?.clone();
    info!(target: "quiz", session_id = %id, participant = %session.participant().name, total, "Session started");
    let mut sessions = self.sessions.write().await;
    evict_stale(&mut sessions, Utc::now(), self.config.session_ttl_secs);
    sessions.insert(id, session);
    Ok((id, total, first))
  }

  /// Drop unfinished sessions that started `session_ttl_secs` or more before `now`.
  pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
    let mut sessions = self.sessions.write().await;
    evict_stale(&mut sessions, now, self.config.session_ttl_secs)
  }

  /// Current item for a session in progress.
  #[instrument(level = "debug", skip(self))]
  pub async fn current(&self, id: Uuid) -> Result<(usize, usize, ImageItem), StateError> {
    let sessions = self.sessions.read().await;
    let s = sessions.get(&id).ok_or(StateError::SessionNotFound(id))?;
    Ok((s.position(), s.len(), s.current_item()?.clone()))
  }

  /// Record one answer. On the last answer the session is removed, scored and saved.
  #[instrument(level = "info", skip(self))]
  pub async fn answer(&self, id: Uuid, answer: bool) -> Result<AnswerOutcome, StateError> {
    let finished = {
      let mut sessions = self.sessions.write().await;
      let s = sessions.get_mut(&id).ok_or(StateError::SessionNotFound(id))?;
      s.record_answer(answer)?;
      if !s.is_complete() {
        return Ok(AnswerOutcome::Next {
          position: s.position(),
          total: s.len(),
          item: s.current_item()?.clone(),
        });
      }
      sessions.remove(&id)
    };
    let Some(session) = finished else {
      return Err(StateError::SessionNotFound(id));
    };

    let started_at = session.started_at();
    let summary = session.finish()?;
    info!(
      target: "quiz",
      session_id = %id,
      duration_s = (summary.completed_at - started_at).num_seconds(),
      score = summary.score,
      total = summary.total,
      percent = summary.percent,
      "Session completed"
    );

    let saved = self.sink.append(&summary).await;
    if let Err(e) = &saved {
      warn!(target: "quiz", session_id = %id, sink = self.sink.name(), error = %e, "Could not save result; score still returned");
    }
    Ok(AnswerOutcome::Finished { summary, saved })
  }

  pub async fn leaderboard(&self, n: Option<usize>) -> Result<Vec<LeaderboardEntry>, StateError> {
    let n = n.unwrap_or(self.config.leaderboard_size);
    Ok(self.sink.top_n(n).await?)
  }
}

fn evict_stale(sessions: &mut HashMap<Uuid, QuizSession>, now: DateTime<Utc>, ttl_secs: u64) -> usize {
  let before = sessions.len();
  sessions.retain(|_, s| match u64::try_from((now - s.started_at()).num_seconds()) {
    Ok(age) => age < ttl_secs,
    Err(_) => true,
  });
  let evicted = before - sessions.len();
  if evicted > 0 {
    info!(target: "quiz", evicted, live = sessions.len(), "Abandoned sessions dropped");
  }
  evicted
}

/// Start-screen rules: non-empty name, age 1..=120, consent given.
pub fn validate_participant(name: &str, age: u32, consent: bool) -> Result<Participant, QuizError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(QuizError::InvalidParticipant("name is required".into()));
  }
  if !(1..=120).contains(&age) {
    return Err(QuizError::InvalidParticipant(format!("age {age} outside 1..=120")));
  }
  if !consent {
    return Err(QuizError::InvalidParticipant("consent to result analysis is required".into()));
  }
  Ok(Participant { name: name.to_string(), age: age as u8 })
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::sink::memory::MemorySink;
  use crate::truth::TruthMode;

  pub(crate) fn test_state(n_real: usize, n_fake: usize, sink: Arc<dyn ResultSink>) -> AppState {
    test_state_with(QuizConfig { n_real, n_fake, ..QuizConfig::default() }, sink)
  }

  fn test_state_with(config: QuizConfig, sink: Arc<dyn ResultSink>) -> AppState {
    let resolver =
      GroundTruthResolver::new(TruthMode::Category, ["real"], ["firefly", "midjourney"]).unwrap();
    let mut pool = Vec::new();
    for i in 0..4 {
      pool.push(PoolEntry::new(format!("real/{i}.jpg"), "real"));
      pool.push(PoolEntry::new(format!("firefly/{i}.png"), "firefly"));
    }
    AppState::with_pool(config, resolver, pool, sink)
  }

  #[test]
  fn participant_rules() {
    assert!(validate_participant("  ", 20, true).is_err());
    assert!(validate_participant("Ana", 0, true).is_err());
    assert!(validate_participant("Ana", 121, true).is_err());
    assert!(validate_participant("Ana", 20, false).is_err());
    assert_eq!(
      validate_participant(" Ana ", 20, true).unwrap(),
      Participant { name: "Ana".into(), age: 20 }
    );
  }

  #[tokio::test]
  async fn full_session_is_saved_and_discarded() {
    let sink = Arc::new(MemorySink::default());
    let state = test_state(2, 2, sink.clone());
    let (id, total, _) = state.start_session("Ana", 30, true).await.unwrap();
    assert_eq!(total, 4);

    let mut outcome = None;
    for _ in 0..total {
      let (_, _, item) = state.current(id).await.unwrap();
      outcome = Some(state.answer(id, item.ground_truth).await.unwrap());
    }
    match outcome {
      Some(AnswerOutcome::Finished { summary, saved }) => {
        assert!(saved.is_ok());
        assert_eq!(summary.score, 4);
        assert_eq!(summary.percent, 100.0);
      }
      other => panic!("expected finished outcome, got {other:?}"),
    }
    assert_eq!(sink.rows.lock().await.len(), 1);
    assert!(matches!(state.current(id).await, Err(StateError::SessionNotFound(_))));
  }

  #[tokio::test]
  async fn save_failure_keeps_summary() {
    let sink = Arc::new(MemorySink { fail: true, ..MemorySink::default() });
    let state = test_state(1, 0, sink);
    let (id, _, _) = state.start_session("Bo", 50, true).await.unwrap();
    match state.answer(id, false).await.unwrap() {
      AnswerOutcome::Finished { summary, saved } => {
        assert!(saved.is_err());
        assert_eq!(summary.total, 1);
        assert_eq!(summary.score, 0);
      }
      other => panic!("expected finished outcome, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn oversized_quiz_is_refused() {
    let state = test_state(5, 1, Arc::new(MemorySink::default()));
    let err = state.start_session("Ana", 30, true).await.unwrap_err();
    assert!(matches!(err, StateError::Quiz(QuizError::InsufficientPool { .. })));
    assert!(state.sessions.read().await.is_empty());
  }

  #[tokio::test]
  async fn sessions_are_independent() {
    let state = test_state(2, 2, Arc::new(MemorySink::default()));
    let (a, _, _) = state.start_session("A", 20, true).await.unwrap();
    let (b, _, _) = state.start_session("B", 21, true).await.unwrap();
    state.answer(a, true).await.unwrap();
    assert_eq!(state.current(a).await.unwrap().0, 1);
    assert_eq!(state.current(b).await.unwrap().0, 0);
  }

  #[tokio::test]
  async fn abandoned_sessions_are_dropped_on_next_start() {
    let config = QuizConfig { n_real: 2, n_fake: 2, session_ttl_secs: 0, ..QuizConfig::default() };
    let state = test_state_with(config, Arc::new(MemorySink::default()));
    for i in 0..1000 {
      let (id, _, _) = state.start_session(&format!("p{i}"), 30, true).await.unwrap();
      state.answer(id, true).await.unwrap();
    }
    let (last, _, _) = state.start_session("late", 30, true).await.unwrap();
    let live = state.sessions.read().await;
    assert_eq!(live.len(), 1);
    assert!(live.contains_key(&last));
  }

  #[tokio::test]
  async fn sessions_expire_after_ttl() {
    let state = test_state(2, 2, Arc::new(MemorySink::default()));
    for name in ["a", "b", "c"] {
      state.start_session(name, 30, true).await.unwrap();
    }
    assert_eq!(state.evict_expired(Utc::now()).await, 0);
    assert_eq!(state.sessions.read().await.len(), 3);

    let later = Utc::now() + chrono::Duration::seconds(1801);
    assert_eq!(state.evict_expired(later).await, 3);
    assert!(state.sessions.read().await.is_empty());
  }

  #[tokio::test]
  async fn zero_sized_quiz_is_refused() {
    let state = test_state(0, 0, Arc::new(MemorySink::default()));
    let err = state.start_session("Ana", 30, true).await.unwrap_err();
    assert!(matches!(err, StateError::Quiz(QuizError::EmptySession)));
    assert!(state.sessions.read().await.is_empty());

    let config = QuizConfig { n_real: 0, n_fake: 0, ..QuizConfig::default() };
    assert!(matches!(
      AppState::new(config, Arc::new(MemorySink::default())),
      Err(StateError::Quiz(QuizError::EmptySession))
    ));
  }
}
