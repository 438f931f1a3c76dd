//! Loading quiz configuration from TOML, with a few environment overrides.
//!
//! Example:
//! ```toml
//! images_dir = "images"
//! n_real = 5
//! n_fake = 5
//! truth_mode = "category"            # or "filename_marker"
//! real_categories = ["real"]
//! synthetic_categories = ["firefly", "midjourney"]
//! session_ttl_secs = 1800
//!
//! [sink]
//! kind = "csv"
//! path = "resultados.csv"
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::truth::TruthMode;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
  pub images_dir: PathBuf,
  pub static_dir: PathBuf,
  pub n_real: usize,
  pub n_fake: usize,
  pub truth_mode: TruthMode,
  pub real_categories: Vec<String>,
  pub synthetic_categories: Vec<String>,
  pub extensions: Vec<String>,
  pub leaderboard_size: usize,
  /// Unfinished sessions older than this are dropped when a new one starts.
  pub session_ttl_secs: u64,
  pub sink: SinkConfig,
}

impl Default for QuizConfig {
  fn default() -> Self {
    Self {
      images_dir: "images".into(),
      static_dir: "static".into(),
      n_real: 5,
      n_fake: 5,
      truth_mode: TruthMode::Category,
      real_categories: vec!["real".into()],
      synthetic_categories: vec!["firefly".into(), "midjourney".into()],
      extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
      leaderboard_size: 10,
      session_ttl_secs: 1800,
      sink: SinkConfig::default(),
    }
  }
}

/// Where finished sessions are written.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
  /// Local CSV table, one row per session.
  Csv { path: PathBuf },
  /// Spreadsheet web-app endpoint speaking JSON.
  Remote {
    url: String,
    #[serde(default)]
    token: Option<String>,
  },
}

impl Default for SinkConfig {
  fn default() -> Self {
    SinkConfig::Csv { path: "resultados.csv".into() }
  }
}

impl QuizConfig {
  /// Parse a TOML document; missing keys take their defaults.
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(s)
  }

  /// Apply `IMAGES_DIR` and `RESULTS_WEBHOOK_TOKEN` if set.
  pub fn apply_env(mut self) -> Self {
    if let Ok(dir) = std::env::var("IMAGES_DIR") {
      self.images_dir = dir.into();
    }
    if let SinkConfig::Remote { token, .. } = &mut self.sink {
      if let Ok(t) = std::env::var("RESULTS_WEBHOOK_TOKEN") {
        *token = Some(t);
      }
    }
    self
  }
}

/// Load from QUIZ_CONFIG_PATH. On any IO/parse error (or no path), defaults are used.
pub fn load_config_from_env() -> QuizConfig {
  let cfg = match std::env::var("QUIZ_CONFIG_PATH") {
    Err(_) => {
      info!(target: "imgquiz_backend", "QUIZ_CONFIG_PATH not set; using default config");
      QuizConfig::default()
    }
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match QuizConfig::from_toml_str(&s) {
        Ok(cfg) => {
          info!(target: "imgquiz_backend", %path, "Loaded quiz config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "imgquiz_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
          QuizConfig::default()
        }
      },
      Err(e) => {
        error!(target: "imgquiz_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
        QuizConfig::default()
      }
    },
  };
  cfg.apply_env()
}
