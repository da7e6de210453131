//! Binary classification metrics for the direction classifier.

/// Per-class precision, recall and F1 plus the raw confusion matrix.
///
/// `confusion[actual][predicted]` with down = 0 and up = 1. Every ratio with
/// a zero denominator reports 0.0 rather than NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub accuracy_pct: f64,
    pub precision_up: f64,
    pub recall_up: f64,
    pub f1_up: f64,
    pub precision_down: f64,
    pub recall_down: f64,
    pub f1_down: f64,
    pub confusion: [[usize; 2]; 2],
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    /// Compare actual and predicted labels pairwise. Slices must be equal
    /// length and labels must be 0 or 1.
    pub fn compute(actual: &[u32], predicted: &[u32]) -> ClassificationReport {
        let mut confusion = [[0usize; 2]; 2];
        for (&a, &p) in actual.iter().zip(predicted) {
            confusion[a as usize][p as usize] += 1;
        }

        let correct = confusion[0][0] + confusion[1][1];
        let accuracy_pct = ratio(correct, actual.len()) * 100.0;

        let precision_up = ratio(confusion[1][1], confusion[0][1] + confusion[1][1]);
        let recall_up = ratio(confusion[1][1], confusion[1][0] + confusion[1][1]);
        let precision_down = ratio(confusion[0][0], confusion[0][0] + confusion[1][0]);
        let recall_down = ratio(confusion[0][0], confusion[0][0] + confusion[0][1]);

        ClassificationReport {
            accuracy_pct,
            precision_up,
            recall_up,
            f1_up: f1(precision_up, recall_up),
            precision_down,
            recall_down,
            f1_down: f1(precision_down, recall_down),
            confusion,
        }
    }
}
