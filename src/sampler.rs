//! Balanced quiz sampling: `n_real` real + `n_fake` synthetic images, shuffled together.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, instrument};

use crate::domain::{ImageItem, PoolEntry};
use crate::error::{QuizError, QuizResult, TruthClass};
use crate::truth::GroundTruthResolver;

/// Draw a balanced, shuffled quiz set from `pool`.
///
/// Fails with `InsufficientPool` instead of shrinking the quiz when either class
/// has fewer candidates than requested. Entries sharing an identifier count once.
/// In marker mode, entries without a marker are skipped.
#[instrument(level = "debug", skip(pool, resolver, rng), fields(pool_len = pool.len()))]
pub fn sample<R: Rng + ?Sized>(
  pool: &[PoolEntry],
  n_real: usize,
  n_fake: usize,
  resolver: &GroundTruthResolver,
  rng: &mut R,
) -> QuizResult<Vec<ImageItem>> {
  let mut seen = HashSet::new();
  let mut real = Vec::new();
  let mut fake = Vec::new();
  let mut unmarked = 0usize;

  for entry in pool {
    if !seen.insert(entry.identifier.as_str()) {
      continue;
    }
    let item = match resolver.resolve(entry)? {
      Some(truth) => ImageItem {
        identifier: entry.identifier.clone(),
        category: entry.category.clone(),
        ground_truth: truth,
      },
      None => {
        unmarked += 1;
        continue;
      }
    };
    if item.ground_truth {
      real.push(item);
    } else {
      fake.push(item);
    }
  }
  debug!(real = real.len(), fake = fake.len(), unmarked, "Pool partitioned");

  if real.len() < n_real {
    return Err(QuizError::InsufficientPool {
      class: TruthClass::Real,
      requested: n_real,
      available: real.len(),
    });
  }
  if fake.len() < n_fake {
    return Err(QuizError::InsufficientPool {
      class: TruthClass::Synthetic,
      requested: n_fake,
      available: fake.len(),
    });
  }

  let mut chosen: Vec<ImageItem> = real.choose_multiple(rng, n_real).cloned().collect();
  chosen.extend(fake.choose_multiple(rng, n_fake).cloned());
  chosen.shuffle(rng);
  Ok(chosen)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::truth::TruthMode;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn resolver() -> GroundTruthResolver {
    GroundTruthResolver::new(TruthMode::Category, ["real"], ["firefly", "midjourney"]).unwrap()
  }

  fn pool(real: usize, firefly: usize, midjourney: usize) -> Vec<PoolEntry> {
    let mut out = Vec::new();
    for i in 0..real {
      out.push(PoolEntry::new(format!("real/{i}.jpg"), "real"));
    }
    for i in 0..firefly {
      out.push(PoolEntry::new(format!("firefly/{i}.png"), "firefly"));
    }
    for i in 0..midjourney {
      out.push(PoolEntry::new(format!("midjourney/{i}.png"), "midjourney"));
    }
    out
  }

  #[test]
  fn draws_exact_split_without_duplicates() {
    let pool = pool(8, 4, 4);
    let r = resolver();
    for seed in 0..50 {
      let mut rng = StdRng::seed_from_u64(seed);
      let items = sample(&pool, 5, 5, &r, &mut rng).unwrap();
      assert_eq!(items.len(), 10);
      assert_eq!(items.iter().filter(|i| i.ground_truth).count(), 5);
      assert_eq!(items.iter().filter(|i| !i.ground_truth).count(), 5);
      let unique: HashSet<_> = items.iter().map(|i| &i.identifier).collect();
      assert_eq!(unique.len(), 10);
    }
  }

  #[test]
  fn fails_when_real_images_run_short() {
    let mut rng = StdRng::seed_from_u64(7);
    let err = sample(&pool(3, 10, 0), 5, 5, &resolver(), &mut rng).unwrap_err();
    assert_eq!(
      err,
      QuizError::InsufficientPool { class: TruthClass::Real, requested: 5, available: 3 }
    );
  }

  #[test]
  fn fails_when_synthetic_images_run_short() {
    let mut rng = StdRng::seed_from_u64(7);
    let err = sample(&pool(10, 2, 1), 5, 5, &resolver(), &mut rng).unwrap_err();
    assert!(matches!(
      err,
      QuizError::InsufficientPool { class: TruthClass::Synthetic, requested: 5, available: 3 }
    ));
  }

  #[test]
  fn duplicate_identifiers_count_once() {
    let mut p = pool(4, 5, 0);
    p.push(PoolEntry::new("real/0.jpg", "real"));
    let mut rng = StdRng::seed_from_u64(1);
    assert!(matches!(
      sample(&p, 5, 5, &resolver(), &mut rng),
      Err(QuizError::InsufficientPool { class: TruthClass::Real, available: 4, .. })
    ));
  }

  #[test]
  fn unknown_category_in_pool_propagates() {
    let mut p = pool(5, 5, 0);
    p.push(PoolEntry::new("dalle/1.png", "dalle"));
    let mut rng = StdRng::seed_from_u64(1);
    assert!(matches!(
      sample(&p, 5, 5, &resolver(), &mut rng),
      Err(QuizError::UnknownCategory { .. })
    ));
  }

  #[test]
  fn marker_mode_skips_unmarked_files() {
    let r = GroundTruthResolver::new(TruthMode::FilenameMarker, ["real"], ["firefly"]).unwrap();
    let p = vec![
      PoolEntry::new("real/a_true.jpg", "real"),
      PoolEntry::new("real/b.jpg", "real"),
      PoolEntry::new("firefly/c_false.png", "firefly"),
    ];
    let mut rng = StdRng::seed_from_u64(3);
    let items = sample(&p, 1, 1, &r, &mut rng).unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.identifier != "real/b.jpg"));
  }

  #[test]
  fn does_not_always_put_real_first() {
    let pool = pool(10, 10, 0);
    let r = resolver();
    let mut rng = StdRng::seed_from_u64(42);
    let first_is_real: Vec<bool> = (0..40)
      .map(|_| sample(&pool, 5, 5, &r, &mut rng).unwrap()[0].ground_truth)
      .collect();
    assert!(first_is_real.iter().any(|b| *b));
    assert!(first_is_real.iter().any(|b| !*b));
  }
}
