//! Ground-truth resolution: decides whether a pool entry is a real photo.
//!
//! Two conventions exist for labelling the image pool:
//!   - `Category`: the parent folder name is the label (`real` vs any synthetic source)
//!   - `FilenameMarker`: the file name carries `true` / `false` (case-insensitive)
//!
//! Exactly one is active per deployment (see `QuizConfig::truth_mode`).

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::domain::PoolEntry;
use crate::error::{QuizError, QuizResult};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TruthMode {
  #[default]
  Category,
  FilenameMarker,
}

#[derive(Clone, Debug)]
pub struct GroundTruthResolver {
  mode: TruthMode,
  real: BTreeSet<String>,
  synthetic: BTreeSet<String>,
}

impl GroundTruthResolver {
  /// Build a resolver. Category labels are compared case-insensitively.
  pub fn new<I, J, S, T>(mode: TruthMode, real: I, synthetic: J) -> QuizResult<Self>
  where
    I: IntoIterator<Item = S>,
    J: IntoIterator<Item = T>,
    S: AsRef<str>,
    T: AsRef<str>,
  {
    let real: BTreeSet<String> = real.into_iter().map(|s| s.as_ref().to_lowercase()).collect();
    let synthetic: BTreeSet<String> =
      synthetic.into_iter().map(|s| s.as_ref().to_lowercase()).collect();
    if let Some(dup) = real.intersection(&synthetic).next() {
      return Err(QuizError::AmbiguousCategory { category: dup.clone() });
    }
    Ok(Self { mode, real, synthetic })
  }

  pub fn mode(&self) -> TruthMode {
    self.mode
  }

  /// Every recognized category label (real first, then synthetic).
  pub fn categories(&self) -> impl Iterator<Item = &str> {
    self.real.iter().chain(self.synthetic.iter()).map(String::as_str)
  }

  /// Category rule: `real` → true, any recognized synthetic source → false.
  pub fn by_category(&self, category: &str) -> QuizResult<bool> {
    let key = category.to_lowercase();
    if self.real.contains(&key) {
      Ok(true)
    } else if self.synthetic.contains(&key) {
      Ok(false)
    } else {
      Err(QuizError::UnknownCategory { category: category.to_string() })
    }
  }

  /// Resolve an entry with the active mode.
  ///
  /// `Ok(None)` only happens in marker mode, when the file name has no marker;
  /// such entries must be left out of scoring entirely.
  pub fn resolve(&self, entry: &PoolEntry) -> QuizResult<Option<bool>> {
    match self.mode {
      TruthMode::Category => self.by_category(&entry.category).map(Some),
      TruthMode::FilenameMarker => Ok(marker_truth(&entry.identifier)),
    }
  }
}

/// Marker lookup on the file-name component. `true` is checked first.
pub fn marker_truth(identifier: &str) -> Option<bool> {
  let name = identifier.rsplit(['/', '\\']).next().unwrap_or(identifier).to_lowercase();
  if name.contains("true") {
    Some(true)
  } else if name.contains("false") {
    Some(false)
  } else {
    None
  }
}
