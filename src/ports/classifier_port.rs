//! Direction classifier port trait.

use crate::domain::error::CrosstraderError;

pub trait ClassifierPort {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u32]) -> Result<(), CrosstraderError>;

    /// Predict a 0/1 label per feature row. Errors if called before `fit`.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<u32>, CrosstraderError>;
}
