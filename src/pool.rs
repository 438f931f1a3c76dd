//! Image pool discovery: one sub-folder per category under the images directory.

use std::path::Path;

use tracing::{info, instrument, warn};

use crate::domain::PoolEntry;
use crate::util::has_extension;

/// List `images_dir/<category>/*` for every category, keeping matching extensions.
///
/// Identifiers are `"<category>/<file name>"` (forward slash on every platform), sorted.
/// Missing category folders are skipped with a warning.
#[instrument(level = "info", skip(categories, extensions), fields(dir = %images_dir.display()))]
pub fn list_pool<'a, I>(
  images_dir: &Path,
  categories: I,
  extensions: &[String],
) -> std::io::Result<Vec<PoolEntry>>
where
  I: IntoIterator<Item = &'a str>,
{
  let mut out = Vec::new();
  for category in categories {
    let folder = images_dir.join(category);
    if !folder.is_dir() {
      warn!(target: "imgquiz_backend", folder = %folder.display(), "Category folder missing; skipping");
      continue;
    }
    let mut found = 0usize;
    for entry in std::fs::read_dir(&folder)? {
      let path = entry?.path();
      if !path.is_file() || !has_extension(&path, extensions) {
        continue;
      }
      let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        warn!(target: "imgquiz_backend", path = %path.display(), "Skipping non UTF-8 file name");
        continue;
      };
      out.push(PoolEntry::new(format!("{category}/{name}"), category));
      found += 1;
    }
    info!(target: "imgquiz_backend", %category, images = found, "Category scanned");
  }
  out.sort_by(|a, b| a.identifier.cmp(&b.identifier));
  Ok(out)
}
