//! Evaluation metrics for classification models.

use std::cmp::Ordering;

use serde::Serialize;

#[derive(Debug, Clone)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| v as u64).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f32,
    /// `TP / (TP + FN)`.
    pub recall: f32,
    /// Total number of true examples for the class.
    pub support: u32,
}

impl PerClassStats {
    pub fn f1(&self) -> f32 {
        if self.precision + self.recall == 0.0 {
            0.0
        } else {
            2.0 * self.precision * self.recall / (self.precision + self.recall)
        }
    }
}

/// Compute per-class precision and recall from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f32;
        let mut fp = 0f32;
        let mut fn_ = 0f32;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f32;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f32;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        stats.push(PerClassStats {
            precision,
            recall,
            support,
        });
    }
    stats
}

/// Unweighted mean F1 over classes present in the truth labels.
pub fn macro_f1(stats: &[PerClassStats]) -> f32 {
    let present: Vec<f32> = stats
        .iter()
        .filter(|class| class.support > 0)
        .map(PerClassStats::f1)
        .collect();
    if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f32>() / present.len() as f32
    }
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let correct: u64 = (0..cm.n_classes).map(|c| cm.get(c, c) as u64).sum();
    let total = cm.total();
    if total == 0 {
        0.0
    } else {
        (correct as f32) / (total as f32)
    }
}

/// Area under the ROC curve for one score per row.
///
/// Uses the rank-sum form with average ranks for tied scores. `None` when
/// either positives or negatives are absent.
pub fn binary_roc_auc(scores: &[f32], positive: &[bool]) -> Option<f64> {
    let n_pos = positive.iter().filter(|&&p| p).count();
    let n_neg = positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 || scores.len() != positive.len() {
        return None;
    }
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut positive_rank_sum = 0.0f64;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; tied scores share the mean of their ranks.
        let rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = order[start..end].iter().filter(|&&i| positive[i]).count();
        positive_rank_sum += rank * tied_positives as f64;
        start = end;
    }
    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Macro-averaged one-vs-rest ROC AUC.
///
/// `probabilities[row][class]` are predicted class probabilities and
/// `truth[row]` the true class index. Classes that are absent (or the only
/// class) in `truth` are skipped.
pub fn roc_auc_one_vs_rest(probabilities: &[Vec<f32>], truth: &[usize], n_classes: usize) -> Option<f64> {
    let mut total = 0.0;
    let mut counted = 0usize;
    for class in 0..n_classes {
        let scores: Vec<f32> = probabilities
            .iter()
            .map(|row| row.get(class).copied().unwrap_or(0.0))
            .collect();
        let positive: Vec<bool> = truth.iter().map(|&t| t == class).collect();
        if let Some(auc) = binary_roc_auc(&scores, &positive) {
            total += auc;
            counted += 1;
        }
    }
    (counted > 0).then(|| total / counted as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_and_per_class_stats() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(0, 0);
        cm.add(0, 0);
        cm.add(0, 1);
        cm.add(1, 1);
        cm.add(5, 0);
        assert_eq!(cm.total(), 4);
        assert!((accuracy(&cm) - 0.75).abs() < 1e-6);
        let stats = precision_recall_by_class(&cm);
        assert_eq!(stats[0].support, 3);
        assert!((stats[0].precision - 1.0).abs() < 1e-6);
        assert!((stats[0].recall - 2.0 / 3.0).abs() < 1e-6);
        assert!((stats[1].precision - 0.5).abs() < 1e-6);
        assert!((stats[1].f1() - 2.0 / 3.0).abs() < 1e-6);
        let expected = (stats[0].f1() + stats[1].f1()) / 2.0;
        assert!((macro_f1(&stats) - expected).abs() < 1e-6);
    }

    #[test]
    fn macro_f1_skips_absent_classes() {
        let mut cm = ConfusionMatrix::new(3);
        cm.add(0, 0);
        cm.add(1, 1);
        cm.add(1, 0);
        let stats = precision_recall_by_class(&cm);
        assert_eq!(stats[2].support, 0);
        // Class 0: p=0.5 r=1; class 1: p=1 r=0.5.
        assert!((macro_f1(&stats) - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(macro_f1(&[]), 0.0);
    }

    #[test]
    fn auc_of_perfect_and_reversed_rankings() {
        let positive = [false, false, true, true];
        assert_eq!(binary_roc_auc(&[0.1, 0.2, 0.8, 0.9], &positive), Some(1.0));
        assert_eq!(binary_roc_auc(&[0.9, 0.8, 0.2, 0.1], &positive), Some(0.0));
    }

    #[test]
    fn auc_counts_ties_as_half() {
        let auc = binary_roc_auc(&[0.5, 0.5, 0.5, 0.5], &[false, true, false, true]).unwrap();
        assert!((auc - 0.5).abs() < 1e-12);
        let auc = binary_roc_auc(&[0.1, 0.4, 0.35, 0.8], &[false, false, true, true]).unwrap();
        assert!((auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn auc_requires_both_outcomes() {
        assert_eq!(binary_roc_auc(&[0.1, 0.2], &[true, true]), None);
        assert_eq!(roc_auc_one_vs_rest(&[vec![1.0]], &[0], 1), None);
    }

    #[test]
    fn one_vs_rest_averages_classes() {
        let probabilities = vec![
            vec![0.8, 0.1, 0.1],
            vec![0.1, 0.8, 0.1],
            vec![0.1, 0.1, 0.8],
            vec![0.6, 0.3, 0.1],
        ];
        let auc = roc_auc_one_vs_rest(&probabilities, &[0, 1, 2, 0], 3).unwrap();
        assert!((auc - 1.0).abs() < 1e-12);
    }
}
