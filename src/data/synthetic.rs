use rand::Rng;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// `rows × cols` independent samples from U[0, 1).
pub fn random_features<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
    Matrix::random_uniform(rows, cols, 0.0, 1.0, rng)
}

/// `count` class indices drawn uniformly from `0..num_classes`.
pub fn random_labels<R: Rng + ?Sized>(count: usize, num_classes: usize, rng: &mut R) -> Vec<usize> {
    (0..count).map(|_| rng.gen_range(0..num_classes)).collect()
}

/// One-hot encodes class indices into a `labels.len() × num_classes` matrix.
pub fn to_categorical(labels: &[usize], num_classes: usize) -> Result<Matrix> {
    let mut res = Matrix::zeros(labels.len(), num_classes);
    for (row, &label) in res.data.iter_mut().zip(labels.iter()) {
        if label >= num_classes {
            return Err(Error::InvalidLabel { label, num_classes });
        }
        row[label] = 1.0;
    }
    Ok(res)
}

/// Feature matrix with its one-hot targets.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Matrix,
    pub labels: Matrix,
}

impl Dataset {
    /// Random placeholder data: labels are drawn independently of the
    /// features, so there is nothing for a model to learn.
    pub fn synthetic<R: Rng + ?Sized>(
        samples: usize,
        feature_count: usize,
        num_classes: usize,
        rng: &mut R,
    ) -> Result<Dataset> {
        let features = random_features(samples, feature_count, rng);
        let labels = to_categorical(&random_labels(samples, num_classes, rng), num_classes)?;
        Ok(Dataset { features, labels })
    }

    pub fn len(&self) -> usize {
        self.features.rows
    }

    pub fn is_empty(&self) -> bool {
        self.features.rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_features_shape_and_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let x = random_features(100, 4, &mut rng);
        assert_eq!(x.shape(), (100, 4));
        assert!(x.to_flat().iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_one_hot_rows() {
        let mut rng = StdRng::seed_from_u64(12);
        let data = Dataset::synthetic(100, 4, 3, &mut rng).unwrap();
        assert_eq!(data.labels.shape(), (100, 3));
        for row in &data.labels.data {
            assert_eq!(row.iter().sum::<f64>(), 1.0);
            assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 1);
            assert!(row.iter().all(|&v| v == 0.0 || v == 1.0));
        }
    }

    #[test]
    fn test_labels_cover_all_classes() {
        let mut rng = StdRng::seed_from_u64(13);
        let labels = random_labels(300, 3, &mut rng);
        for class in 0..3 {
            assert!(labels.contains(&class));
        }
        assert!(labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn test_to_categorical_places_ones() {
        let y = to_categorical(&[2, 0, 1], 3).unwrap();
        assert_eq!(y.data, vec![vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_to_categorical_rejects_out_of_range() {
        let err = to_categorical(&[0, 3], 3).unwrap_err();
        assert!(matches!(err, Error::InvalidLabel { label: 3, num_classes: 3 }));
    }
}
