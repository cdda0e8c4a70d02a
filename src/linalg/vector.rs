use ndarray::{Array1, Zip};

use super::check_same_len;
use crate::error::{NetworkError, Result};

/// Fixed-length dense vector of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    data: Array1<f64>,
}

impl Vector {
    pub fn new(data: Vec<f64>) -> Self {
        Self {
            data: Array1::from(data),
        }
    }

    pub fn zeros(size: usize) -> Self {
        Self {
            data: Array1::zeros(size),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.data.iter()
    }

    pub fn as_array(&self) -> &Array1<f64> {
        &self.data
    }

    pub fn get(&self, index: usize) -> Result<f64> {
        self.data
            .get(index)
            .copied()
            .ok_or(NetworkError::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        let len = self.len();
        let elem = self
            .data
            .get_mut(index)
            .ok_or(NetworkError::IndexOutOfRange { index, len })?;
        *elem = value;
        Ok(())
    }

    pub fn dot(&self, other: &Vector) -> Result<f64> {
        check_same_len(self.len(), other.len())?;
        Ok(self.data.dot(&other.data))
    }

    /// Multiply every element by `scalar` in place.
    pub fn scale(&mut self, scalar: f64) {
        self.data *= scalar;
    }

    /// Replace every element `x` with `f(x)`.
    pub fn map_inplace<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64,
    {
        self.data.mapv_inplace(f);
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn add(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Euclidean distance between `self` and `other`.
    pub fn distance(&self, other: &Vector) -> Result<f64> {
        check_same_len(self.len(), other.len())?;
        let squared = Zip::from(&self.data)
            .and(&other.data)
            .fold(0.0, |acc, &a, &b| acc + (a - b).powi(2));
        Ok(squared.sqrt())
    }

    /// Index of the largest element. Ties go to the lowest index; an empty vector yields 0.
    pub fn argmax(&self) -> usize {
        self.data
            .iter()
            .enumerate()
            .fold(
                (0, f64::NEG_INFINITY),
                |(max_index, max_elem), (index, &elem)| {
                    if elem > max_elem {
                        (index, elem)
                    } else {
                        (max_index, max_elem)
                    }
                },
            )
            .0
    }

    fn zip_with<F>(&self, other: &Vector, f: F) -> Result<Vector>
    where
        F: Fn(f64, f64) -> f64,
    {
        check_same_len(self.len(), other.len())?;
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| f(a, b));
        Ok(Self { data })
    }
}

impl From<Array1<f64>> for Vector {
    fn from(data: Array1<f64>) -> Self {
        Self { data }
    }
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn get_and_set_are_bounds_checked() {
        let mut v = Vector::zeros(3);
        v.set(1, 2.5).unwrap();
        assert_relative_eq!(2.5, v.get(1).unwrap());
        assert!(matches!(
            v.get(3),
            Err(NetworkError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(v.set(5, 1.0).is_err());
    }

    #[test]
    fn dot_product() {
        let a = Vector::new(vec![1.0, 2.0, 3.0]);
        let b = Vector::new(vec![4.0, -5.0, 6.0]);
        assert_relative_eq!(12.0, a.dot(&b).unwrap());
        assert!(a.dot(&Vector::zeros(2)).is_err());
    }

    #[test]
    fn dot_with_itself_is_squared_norm() {
        let a = Vector::new(vec![0.3, -1.2, 4.0, 2.5]);
        assert_relative_eq!(a.norm().powi(2), a.dot(&a).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn hadamard_commutes() {
        let a = Vector::new(vec![1.0, -2.0, 0.5]);
        let b = Vector::new(vec![3.0, 4.0, -8.0]);
        let ab = a.hadamard(&b).unwrap();
        assert_eq!(ab, b.hadamard(&a).unwrap());
        assert_eq!(Vector::new(vec![3.0, -8.0, -4.0]), ab);
        assert!(a.hadamard(&Vector::zeros(4)).is_err());
    }

    #[test]
    fn add_and_sub() {
        let a = Vector::new(vec![1.0, 2.0]);
        let b = Vector::new(vec![0.5, -1.0]);
        assert_eq!(Vector::new(vec![1.5, 1.0]), a.add(&b).unwrap());
        assert_eq!(Vector::new(vec![0.5, 3.0]), a.sub(&b).unwrap());
        assert!(matches!(
            a.sub(&Vector::zeros(3)),
            Err(NetworkError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn scale_and_map_in_place() {
        let mut v = Vector::new(vec![1.0, -2.0, 4.0]);
        v.scale(0.5);
        assert_eq!(Vector::new(vec![0.5, -1.0, 2.0]), v);
        v.map_inplace(|x| x * x);
        assert_eq!(Vector::new(vec![0.25, 1.0, 4.0]), v);
    }

    #[test]
    fn distance_is_norm_of_difference() {
        let a = Vector::new(vec![1.0, 2.0, 3.0]);
        let b = Vector::new(vec![4.0, 6.0, 3.0]);
        assert_relative_eq!(5.0, a.distance(&b).unwrap());
        assert_relative_eq!(a.sub(&b).unwrap().norm(), a.distance(&b).unwrap());
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(2, Vector::new(vec![0.1, 0.3, 0.9, 0.2]).argmax());
        assert_eq!(1, Vector::new(vec![0.1, 0.7, 0.7]).argmax());
        assert_eq!(0, Vector::zeros(0).argmax());
    }
}
