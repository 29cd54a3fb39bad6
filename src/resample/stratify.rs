use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{FoldAssignment, MIN_CLASS_RECORDS, ResampleError, Split};

/// Group pool indices by label, keeping pool order inside each group.
pub(super) fn group_by_label<'a>(
    labels: &[&'a str],
    pool: &[usize],
) -> BTreeMap<&'a str, Vec<usize>> {
    let mut groups: BTreeMap<&'a str, Vec<usize>> = BTreeMap::new();
    for &index in pool {
        groups.entry(labels[index]).or_default().push(index);
    }
    groups
}

/// Generator for one class, derived from the seed and the class label only.
pub(super) fn class_rng(seed: u64, label: &str) -> StdRng {
    let digest = blake3::hash(format!("{seed}|{label}").as_bytes());
    StdRng::from_seed(*digest.as_bytes())
}

fn shuffled(seed: u64, label: &str, mut indices: Vec<usize>) -> Vec<usize> {
    indices.shuffle(&mut class_rng(seed, label));
    indices
}

/// Held-out size of each class, given class sizes in label order.
///
/// The total is `round(N * fraction)` with halves away from zero. Every class
/// gets `floor(n * fraction)` and the remainder goes one record at a time to
/// the classes with the largest fractional parts, earlier labels first.
pub(super) fn held_out_counts(sizes: &[usize], fraction: f64) -> Vec<usize> {
    let total: usize = sizes.iter().sum();
    let target = ((total as f64) * fraction).round().clamp(0.0, total as f64) as usize;
    let exact: Vec<f64> = sizes.iter().map(|&n| n as f64 * fraction).collect();
    let mut counts: Vec<usize> = sizes
        .iter()
        .zip(&exact)
        .map(|(&n, share)| (share.floor() as usize).min(n))
        .collect();

    let remainder = |class: usize| exact[class] - exact[class].floor();
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| remainder(b).total_cmp(&remainder(a)));
    let mut missing = target.saturating_sub(counts.iter().sum());
    for class in order {
        if missing == 0 {
            break;
        }
        if counts[class] < sizes[class] {
            counts[class] += 1;
            missing -= 1;
        }
    }
    counts
}

pub(super) fn check_fraction(name: &str, fraction: f64) -> Result<(), ResampleError> {
    if fraction > 0.0 && fraction < 1.0 {
        Ok(())
    } else {
        Err(ResampleError::InvalidConfiguration(format!(
            "{name} must be in (0, 1), got {fraction}"
        )))
    }
}

/// Stratified split of `pool` (indices into `labels`).
pub(super) fn split_pool(
    labels: &[&str],
    pool: &[usize],
    fraction: f64,
    seed: u64,
) -> Result<Split, ResampleError> {
    check_fraction("held-out fraction", fraction)?;
    let groups: Vec<(&str, Vec<usize>)> = group_by_label(labels, pool).into_iter().collect();
    if let Some((label, indices)) = groups
        .iter()
        .find(|(_, indices)| indices.len() < MIN_CLASS_RECORDS)
    {
        return Err(ResampleError::class_too_small(
            label,
            indices.len(),
            MIN_CLASS_RECORDS,
        ));
    }
    let sizes: Vec<usize> = groups.iter().map(|(_, indices)| indices.len()).collect();
    let cuts = held_out_counts(&sizes, fraction);

    let mut train = Vec::with_capacity(pool.len());
    let mut held_out = Vec::new();
    for ((label, indices), cut) in groups.into_iter().zip(cuts) {
        let indices = shuffled(seed, label, indices);
        held_out.extend_from_slice(&indices[..cut]);
        train.extend_from_slice(&indices[cut..]);
    }
    for (side, indices) in [("held-out", &held_out), ("training", &train)] {
        if indices.is_empty() {
            return Err(ResampleError::InsufficientData(format!(
                "fraction {fraction} leaves the {side} partition of {} records empty",
                pool.len()
            )));
        }
    }
    train.sort_unstable();
    held_out.sort_unstable();
    Ok(Split { train, held_out })
}

/// Round-robin fold numbers within each class.
///
/// Each class starts at the fold after the one where the previous class
/// stopped, so overall fold sizes differ by at most one.
pub(super) fn assign_folds(
    labels: &[&str],
    k: usize,
    seed: u64,
) -> Result<FoldAssignment, ResampleError> {
    if k < 2 {
        return Err(ResampleError::InvalidConfiguration(format!(
            "number of folds must be at least 2, got {k}"
        )));
    }
    let pool: Vec<usize> = (0..labels.len()).collect();
    let groups = group_by_label(labels, &pool);
    if let Some((label, smallest)) = groups.iter().min_by_key(|(_, indices)| indices.len())
        && smallest.len() < k
    {
        return Err(ResampleError::class_too_small(label, smallest.len(), k));
    }

    let mut folds = vec![0; labels.len()];
    let mut next = 0;
    for (label, indices) in groups {
        let count = indices.len();
        for (offset, index) in shuffled(seed, label, indices).into_iter().enumerate() {
            folds[index] = (next + offset) % k;
        }
        next = (next + count) % k;
    }
    Ok(FoldAssignment::new(k, folds))
}
