use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Name of one partition in a [`PartitionMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartitionName {
    Train,
    Validation,
    Test,
    /// Assessment set of one cross-validation fold.
    Fold(usize),
}

impl fmt::Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionName::Train => f.write_str("train"),
            PartitionName::Validation => f.write_str("validation"),
            PartitionName::Test => f.write_str("test"),
            PartitionName::Fold(fold) => write!(f, "fold_{fold}"),
        }
    }
}

impl Serialize for PartitionName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Partition name to ascending record indices.
pub type PartitionMap = BTreeMap<PartitionName, Vec<usize>>;

/// Training and held-out indices of a single stratified split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub held_out: Vec<usize>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.train.len() + self.held_out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn partition_map(&self) -> PartitionMap {
        BTreeMap::from([
            (PartitionName::Train, self.train.clone()),
            (PartitionName::Test, self.held_out.clone()),
        ])
    }

    /// `true` at every held-out position of a dataset with `len` records.
    pub fn held_out_mask(&self, len: usize) -> Vec<bool> {
        mask(len, &self.held_out)
    }
}

/// Train, validation and test indices carved by two nested splits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreeWaySplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl ThreeWaySplit {
    pub fn partition_map(&self) -> PartitionMap {
        BTreeMap::from([
            (PartitionName::Train, self.train.clone()),
            (PartitionName::Validation, self.validation.clone()),
            (PartitionName::Test, self.test.clone()),
        ])
    }

    /// Per-record partition names for a dataset with `len` records.
    ///
    /// Positions not covered by any partition are `None`.
    pub fn labels(&self, len: usize) -> Vec<Option<PartitionName>> {
        let mut out = vec![None; len];
        for (name, indices) in [
            (PartitionName::Train, &self.train),
            (PartitionName::Validation, &self.validation),
            (PartitionName::Test, &self.test),
        ] {
            for &index in indices {
                if let Some(slot) = out.get_mut(index) {
                    *slot = Some(name);
                }
            }
        }
        out
    }
}

/// Fold number of every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldAssignment {
    k: usize,
    folds: Vec<usize>,
}

impl FoldAssignment {
    pub(crate) fn new(k: usize, folds: Vec<usize>) -> Self {
        debug_assert!(folds.iter().all(|&fold| fold < k));
        Self { k, folds }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    pub fn fold_of(&self, index: usize) -> Option<usize> {
        self.folds.get(index).copied()
    }

    /// Indices held out when `fold` is the assessment set.
    pub fn assessment(&self, fold: usize) -> Vec<usize> {
        self.indices_where(|assigned| assigned == fold)
    }

    /// Indices used for fitting when `fold` is the assessment set.
    pub fn analysis(&self, fold: usize) -> Vec<usize> {
        self.indices_where(|assigned| assigned != fold)
    }

    /// Assessment indices keyed by `fold_<n>`.
    pub fn partition_map(&self) -> PartitionMap {
        (0..self.k)
            .map(|fold| (PartitionName::Fold(fold), self.assessment(fold)))
            .collect()
    }

    fn indices_where(&self, keep: impl Fn(usize) -> bool) -> Vec<usize> {
        self.folds
            .iter()
            .enumerate()
            .filter(|(_, fold)| keep(**fold))
            .map(|(index, _)| index)
            .collect()
    }
}

fn mask(len: usize, indices: &[usize]) -> Vec<bool> {
    let mut out = vec![false; len];
    for &index in indices {
        if let Some(slot) = out.get_mut(index) {
            *slot = true;
        }
    }
    out
}
