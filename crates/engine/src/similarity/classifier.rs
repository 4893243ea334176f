use serde::{Deserialize, Serialize};

const ITERATIONS: usize = 2_000;
const LEARNING_RATE: f64 = 1.0;
const L2_PENALTY: f64 = 0.01;

/// Pair classifier mapping a feature vector to a match probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Classifier {
    /// Mean of the similarity slots. Used until both labels have been seen.
    Mean { similarity_dims: usize },
    /// L2-regularized logistic regression.
    Logistic { weights: Vec<f64>, bias: f64 },
}

impl Classifier {
    pub(crate) fn untrained(similarity_dims: usize) -> Self {
        Classifier::Mean { similarity_dims }
    }

    /// Fit on `(features, is_match)` examples. Falls back to the mean
    /// classifier unless both classes are present.
    pub(crate) fn fit(examples: &[(Vec<f64>, bool)], dims: usize, similarity_dims: usize) -> Self {
        let positives = examples.iter().filter(|(_, y)| *y).count();
        let negatives = examples.len() - positives;
        if positives == 0 || negatives == 0 {
            return Classifier::untrained(similarity_dims);
        }

        // Balance the classes so a handful of matches is not drowned out.
        let n = examples.len() as f64;
        let pos_weight = n / (2.0 * positives as f64);
        let neg_weight = n / (2.0 * negatives as f64);

        let mut weights = vec![0.0; dims];
        let mut bias = 0.0;
        let mut grad = vec![0.0; dims];
        for _ in 0..ITERATIONS {
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_bias = 0.0;
            for (x, y) in examples {
                let p = sigmoid(dot(&weights, x) + bias);
                let target = if *y { 1.0 } else { 0.0 };
                let w = if *y { pos_weight } else { neg_weight };
                let err = w * (p - target);
                for (g, xi) in grad.iter_mut().zip(x) {
                    *g += err * xi;
                }
                grad_bias += err;
            }
            for (wk, gk) in weights.iter_mut().zip(&grad) {
                *wk -= LEARNING_RATE * (gk / n + L2_PENALTY * *wk);
            }
            bias -= LEARNING_RATE * grad_bias / n;
        }

        Classifier::Logistic { weights, bias }
    }

    pub(crate) fn score(&self, features: &[f64]) -> f64 {
        match self {
            Classifier::Mean { similarity_dims } => {
                let dims = (*similarity_dims).min(features.len());
                if dims == 0 {
                    return 0.0;
                }
                features[..dims].iter().sum::<f64>() / dims as f64
            }
            Classifier::Logistic { weights, bias } => sigmoid(dot(weights, features) + bias),
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_until_both_classes_seen() {
        let only_matches = vec![(vec![1.0, 0.9], true), (vec![0.8, 1.0], true)];
        let c = Classifier::fit(&only_matches, 2, 2);
        assert_eq!(c, Classifier::untrained(2));
        assert!((c.score(&[1.0, 0.5]) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn logistic_separates_labels() {
        let examples = vec![
            (vec![1.0, 1.0], true),
            (vec![0.95, 0.9], true),
            (vec![0.3, 0.4], false),
            (vec![0.2, 0.5], false),
            (vec![0.4, 0.3], false),
        ];
        let c = Classifier::fit(&examples, 2, 2);
        assert!(matches!(c, Classifier::Logistic { .. }));
        assert!(c.score(&[0.97, 0.95]) > 0.5);
        assert!(c.score(&[0.3, 0.35]) < 0.5);
    }

    #[test]
    fn mean_ignores_indicator_slots() {
        let c = Classifier::untrained(1);
        assert_eq!(c.score(&[0.4, 1.0]), 0.4);
    }
}
