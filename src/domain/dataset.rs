//! Feature engineering for the direction classifier.
//!
//! Each usable row i yields a feature vector from data up to and including
//! step i, and a binary label from the close `lookahead` steps ahead. Rows in
//! the warm-up period or without a future close are dropped, so the dataset
//! never contains an undefined feature or label.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::CrosstraderError;
use super::price::PricePoint;

pub const FEATURE_NAMES: [&str; 5] = ["return_1d", "ma_5", "ma_10", "volatility_5", "volume_change"];

/// Longest feature lookback (10-day mean) costs the first 9 rows.
pub const WARMUP: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    /// 1 if the close rose over the lookahead horizon, else 0.
    pub labels: Vec<u32>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// (down, up) label counts.
    pub fn class_counts(&self) -> (usize, usize) {
        let up = self.labels.iter().filter(|&&l| l == 1).count();
        (self.labels.len() - up, up)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSplit {
    pub train: Dataset,
    pub test: Dataset,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// Sample standard deviation (n - 1 denominator).
fn sample_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn feature_row(prices: &[PricePoint], i: usize) -> Vec<f64> {
    let closes: Vec<f64> = prices[i - WARMUP..=i].iter().map(|p| p.close).collect();
    let return_1d = (prices[i].close - prices[i - 1].close) / prices[i - 1].close;
    let ma_5 = mean(&closes[5..]);
    let ma_10 = mean(&closes);
    // Dispersion of the closes themselves, same trailing window as ma_5.
    let volatility_5 = sample_std(&closes[5..]);
    let volume_change = (prices[i].volume - prices[i - 1].volume) / prices[i - 1].volume;
    vec![return_1d, ma_5, ma_10, volatility_5, volume_change]
}

/// Build the feature matrix, label the rows, split chronologically, and
/// oversample the training minority class.
///
/// The split is time-ordered: the last `ceil(rows * test_fraction)` rows form
/// the test set, so the classifier is always evaluated on data that follows
/// everything it trained on. Only the training set is rebalanced.
pub fn build_dataset(
    prices: &[PricePoint],
    lookahead: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<DatasetSplit, CrosstraderError> {
    let n = prices.len();
    let mut features = Vec::new();
    let mut labels = Vec::new();

    for i in WARMUP..n {
        if i + lookahead >= n {
            break;
        }
        features.push(feature_row(prices, i));
        labels.push(u32::from(prices[i + lookahead].close > prices[i].close));
    }

    let rows = labels.len();
    if rows == 0 {
        return Err(CrosstraderError::InsufficientData {
            rows: n,
            minimum: WARMUP + lookahead + 1,
        });
    }

    let n_test = (rows as f64 * test_fraction).ceil() as usize;
    let n_train = rows - n_test;
    if n_train == 0 {
        return Err(CrosstraderError::InsufficientData {
            rows,
            minimum: n_test + 1,
        });
    }

    let test = Dataset {
        features: features.split_off(n_train),
        labels: labels.split_off(n_train),
    };
    let train = oversample_minority(&Dataset { features, labels }, seed);

    Ok(DatasetSplit { train, test })
}

/// Balance the classes by synthesizing minority rows.
///
/// Each synthetic row interpolates between a random minority row and one of
/// its nearest minority neighbors (at most 5, Euclidean distance). With a
/// single minority row it is duplicated instead. Already balanced or
/// single-class input is returned unchanged.
pub fn oversample_minority(train: &Dataset, seed: u64) -> Dataset {
    let (down, up) = train.class_counts();
    if down == up || down == 0 || up == 0 {
        return train.clone();
    }

    let minority_label: u32 = if down < up { 0 } else { 1 };
    let deficit = down.abs_diff(up);

    let minority: Vec<&Vec<f64>> = train
        .features
        .iter()
        .zip(&train.labels)
        .filter(|&(_, &l)| l == minority_label)
        .map(|(f, _)| f)
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = train.features.clone();
    let mut labels = train.labels.clone();

    for _ in 0..deficit {
        let base_idx = rng.gen_range(0..minority.len());
        let base = minority[base_idx];
        let synthetic = if minority.len() == 1 {
            base.clone()
        } else {
            let mut neighbors: Vec<(f64, usize)> = minority
                .iter()
                .enumerate()
                .filter(|&(idx, _)| idx != base_idx)
                .map(|(idx, other)| {
                    let dist = base
                        .iter()
                        .zip(other.iter())
                        .map(|(a, b)| (a - b).powi(2))
                        .sum::<f64>();
                    (dist, idx)
                })
                .collect();
            neighbors.sort_by(|a, b| a.0.total_cmp(&b.0));
            neighbors.truncate(5);

            let (_, neighbor_idx) = neighbors[rng.gen_range(0..neighbors.len())];
            let neighbor = minority[neighbor_idx];
            let t: f64 = rng.gen_range(0.0..1.0);
            base.iter()
                .zip(neighbor.iter())
                .map(|(a, b)| a + t * (b - a))
                .collect()
        };
        features.push(synthetic);
        labels.push(minority_label);
    }

    Dataset { features, labels }
}
