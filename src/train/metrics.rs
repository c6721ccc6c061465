use crate::math::matrix::Matrix;

/// Index of the maximum element in a slice.  Ties go to the first index,
/// as with `np.argmax`/`tf.argmax`; an empty slice gives 0.
pub fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate().skip(1) {
        if x > v[best] {
            best = i;
        }
    }
    best
}

/// Number of rows whose argmax matches the target row's argmax.
pub fn correct_count(predicted: &Matrix, expected: &Matrix) -> usize {
    predicted.data.iter().zip(expected.data.iter())
        .filter(|(p, e)| argmax(p) == argmax(e))
        .count()
}

/// Categorical accuracy as a fraction in [0, 1]; 0 for an empty batch.
pub fn categorical_accuracy(predicted: &Matrix, expected: &Matrix) -> f64 {
    if predicted.rows == 0 {
        return 0.0;
    }
    correct_count(predicted, expected) as f64 / predicted.rows as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_accuracy() {
        let p = Matrix::from_data(vec![vec![0.1, 0.7, 0.2], vec![0.5, 0.3, 0.2], vec![0.2, 0.2, 0.6]]);
        let y = Matrix::from_data(vec![vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0], vec![0.0, 0.0, 1.0]]);
        assert_eq!(correct_count(&p, &y), 2);
        assert!((categorical_accuracy(&p, &y) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_uniform_prediction_counts_as_first_class() {
        let third = 1.0 / 3.0;
        let p = Matrix::from_data(vec![vec![third, third, third], vec![third, third, third]]);
        let y = Matrix::from_data(vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
        assert_eq!(correct_count(&p, &y), 1);
        assert!((categorical_accuracy(&p, &y) - 0.5).abs() < 1e-12);
    }
}
