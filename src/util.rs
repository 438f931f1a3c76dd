//! Small utility helpers used across modules.

use std::path::Path;

/// True if the path's extension is in `allowed` (case-insensitive, no leading dot).
pub fn has_extension(path: &Path, allowed: &[String]) -> bool {
  match path.extension().and_then(|e| e.to_str()) {
    Some(ext) => allowed.iter().any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext)),
    None => false,
  }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
