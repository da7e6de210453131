//! Random forest classifier adapter backed by smartcore.

use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::domain::error::CrosstraderError;
use crate::ports::classifier_port::ClassifierPort;

pub struct ForestAdapter {
    n_trees: u16,
    seed: u64,
    model: Option<RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>>,
}

impl ForestAdapter {
    pub fn new(n_trees: u16, seed: u64) -> Self {
        Self {
            n_trees,
            seed,
            model: None,
        }
    }
}

impl Default for ForestAdapter {
    fn default() -> Self {
        Self::new(100, 42)
    }
}

fn matrix(features: &[Vec<f64>]) -> Result<DenseMatrix<f64>, CrosstraderError> {
    DenseMatrix::from_2d_vec(&features.to_vec()).map_err(|e| CrosstraderError::Classifier {
        reason: format!("feature matrix: {e}"),
    })
}

impl ClassifierPort for ForestAdapter {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u32]) -> Result<(), CrosstraderError> {
        if features.is_empty() || features.len() != labels.len() {
            return Err(CrosstraderError::Classifier {
                reason: format!(
                    "training shape mismatch: {} rows vs {} labels",
                    features.len(),
                    labels.len()
                ),
            });
        }

        let x = matrix(features)?;
        let y = labels.to_vec();
        let params = RandomForestClassifierParameters::default()
            .with_n_trees(self.n_trees)
            .with_seed(self.seed);

        let model = RandomForestClassifier::fit(&x, &y, params).map_err(|e| {
            CrosstraderError::Classifier {
                reason: format!("fit failed: {e}"),
            }
        })?;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<u32>, CrosstraderError> {
        let model = self.model.as_ref().ok_or_else(|| CrosstraderError::Classifier {
            reason: "model not fitted".to_string(),
        })?;

        let x = matrix(features)?;
        model.predict(&x).map_err(|e| CrosstraderError::Classifier {
            reason: format!("predict failed: {e}"),
        })
    }
}
