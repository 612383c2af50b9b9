//! Evaluation metrics for the binary delay classifier.
use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Counts of predicted vs. true labels, with 1 (delayed) as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[i32], y_pred: &[i32]) -> Self {
        let mut matrix = ConfusionMatrix::default();
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            match (truth == 1, pred == 1) {
                (false, false) => matrix.true_negative += 1,
                (false, true) => matrix.false_positive += 1,
                (true, false) => matrix.false_negative += 1,
                (true, true) => matrix.true_positive += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of rows whose true label is this class.
    pub support: usize,
}

impl ClassMetrics {
    fn new(hits: usize, predicted: usize, support: usize) -> Self {
        let precision = ratio(hits, predicted);
        let recall = ratio(hits, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassMetrics {
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Per-class metrics and accuracy for a set of binary predictions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub confusion: ConfusionMatrix,
    pub on_time: ClassMetrics,
    pub delayed: ClassMetrics,
    pub accuracy: f64,
}

impl ClassificationReport {
    /// Compare predictions against the true labels.
    ///
    /// # Arguments
    ///
    /// * `y_true` - True labels, 0 (on time) or 1 (delayed).
    /// * `y_pred` - Predicted labels, row-aligned with `y_true`.
    ///
    /// # Panics
    ///
    /// If the two slices differ in length.
    pub fn compute(y_true: &[i32], y_pred: &[i32]) -> Self {
        assert_eq!(
            y_true.len(),
            y_pred.len(),
            "true and predicted labels must be row-aligned"
        );
        let c = ConfusionMatrix::from_labels(y_true, y_pred);

        let on_time = ClassMetrics::new(
            c.true_negative,
            c.true_negative + c.false_negative,
            c.true_negative + c.false_positive,
        );
        let delayed = ClassMetrics::new(
            c.true_positive,
            c.true_positive + c.false_positive,
            c.true_positive + c.false_negative,
        );

        ClassificationReport {
            confusion: c,
            on_time,
            delayed,
            accuracy: ratio(c.true_negative + c.true_positive, c.total()),
        }
    }

    /// Log the report line by line at info level.
    pub fn log(&self) {
        for line in self.to_string().lines() {
            log::info!("{}", line);
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>10} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (name, m) in [("0", &self.on_time), ("1", &self.delayed)] {
            writeln!(
                f,
                "{:>10} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f, "{:>10} {:>29.2} {:>9}", "accuracy", self.accuracy, self.confusion.total())?;
        write!(
            f,
            "confusion: tn={} fp={} fn={} tp={}",
            self.confusion.true_negative,
            self.confusion.false_positive,
            self.confusion.false_negative,
            self.confusion.true_positive
        )
    }
}

/// Area under the ROC curve.
///
/// Rows are ranked by descending score; tied scores advance the curve
/// diagonally (trapezoidal rule), so the result equals the probability that
/// a random delayed row outscores a random on-time row, counting ties as
/// one half.
///
/// # Arguments
///
/// * `scores` - Predicted probability of delay per row.
/// * `labels` - True labels, 1 for delayed.
///
/// # Returns
///
/// `None` when either class is absent (the curve is undefined).
pub fn roc_auc(scores: &[f32], labels: &[i32]) -> Option<f64> {
    assert_eq!(scores.len(), labels.len(), "scores and labels must be row-aligned");

    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_unstable_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let (mut tp, mut fp) = (0usize, 0usize);
    let (mut prev_tp, mut prev_fp) = (0usize, 0usize);
    let mut area = 0.0;
    let mut i = 0;
    while i < order.len() {
        let score = scores[order[i]];
        while i < order.len() && scores[order[i]] == score {
            if labels[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        area += (fp - prev_fp) as f64 * (tp + prev_tp) as f64 / 2.0;
        prev_tp = tp;
        prev_fp = fp;
    }

    Some(area / (positives as f64 * negatives as f64))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_counts() {
        let c = ConfusionMatrix::from_labels(&[0, 0, 1, 1, 1], &[0, 1, 1, 0, 1]);
        assert_eq!(
            c,
            ConfusionMatrix {
                true_negative: 1,
                false_positive: 1,
                false_negative: 1,
                true_positive: 2,
            }
        );
        assert_eq!(c.total(), 5);
    }

    #[test]
    fn test_report_metrics() {
        let report = ClassificationReport::compute(&[0, 0, 1, 1, 1], &[0, 1, 1, 0, 1]);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert!((report.delayed.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.delayed.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.delayed.support, 3);
        assert!((report.on_time.precision - 0.5).abs() < 1e-12);
        assert_eq!(report.on_time.support, 2);
    }

    #[test]
    fn test_report_without_predicted_positives() {
        let report = ClassificationReport::compute(&[0, 1], &[0, 0]);
        assert_eq!(report.delayed.precision, 0.0);
        assert_eq!(report.delayed.f1, 0.0);
        assert!(report.to_string().contains("accuracy"));
    }

    #[test]
    fn test_roc_auc() {
        assert_eq!(roc_auc(&[0.1, 0.4, 0.35, 0.8], &[0, 0, 1, 1]), Some(0.75));
        assert_eq!(roc_auc(&[0.9, 0.8, 0.1], &[1, 1, 0]), Some(1.0));
        assert_eq!(roc_auc(&[0.5, 0.5], &[0, 1]), Some(0.5));
        assert_eq!(roc_auc(&[0.5, 0.7], &[1, 1]), None);
    }
}
