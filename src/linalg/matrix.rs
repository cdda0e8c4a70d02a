use std::io::{self, Read, Write};

use ndarray::Array2;

use super::{check_same_len, read_exact, read_u64, Vector};
use crate::error::{NetworkError, Result};

/// Row-major dense matrix of `f64`.
///
/// The binary encoding written by [`Matrix::write_to`] is the row count and the column count
/// as little-endian `u64`, followed by `rows * cols` little-endian `f64` values in row-major
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Array2<f64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| NetworkError::Decode(format!("{} x {} overflows", rows, cols)))?;
        check_same_len(expected, data.len())?;
        let data = Array2::from_shape_vec((rows, cols), data).map_err(|_| {
            NetworkError::DimensionMismatch {
                expected,
                got: rows * cols,
            }
        })?;
        Ok(Self { data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or_else(|| self.out_of_range(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let err = self.out_of_range(row, col);
        let elem = self.data.get_mut((row, col)).ok_or(err)?;
        *elem = value;
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        Self {
            data: self.data.t().to_owned(),
        }
    }

    /// Matrix-vector product `Ax`.
    pub fn mul_vector(&self, x: &Vector) -> Result<Vector> {
        check_same_len(self.cols(), x.len())?;
        Ok(Vector::from(self.data.dot(x.as_array())))
    }

    /// Matrix-matrix product `AM`.
    pub fn mul_matrix(&self, other: &Matrix) -> Result<Matrix> {
        check_same_len(self.cols(), other.rows())?;
        Ok(Self {
            data: self.data.dot(&other.data),
        })
    }

    pub fn scale(&mut self, scalar: f64) {
        self.data *= scalar;
    }

    pub fn add_assign(&mut self, other: &Matrix) -> Result<()> {
        self.check_same_shape(other)?;
        self.data += &other.data;
        Ok(())
    }

    pub fn sub_assign(&mut self, other: &Matrix) -> Result<()> {
        self.check_same_shape(other)?;
        self.data -= &other.data;
        Ok(())
    }

    /// Row-major copy of the elements.
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&(self.rows() as u64).to_le_bytes())?;
        writer.write_all(&(self.cols() as u64).to_le_bytes())?;
        // `iter` walks in logical row-major order regardless of memory layout.
        for value in self.data.iter() {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let rows = read_u64(reader, "matrix rows")?;
        let cols = read_u64(reader, "matrix cols")?;
        let len = rows
            .checked_mul(cols)
            .ok_or_else(|| NetworkError::Decode(format!("{} x {} overflows", rows, cols)))?;

        let mut data = Vec::with_capacity(len.min(1 << 20));
        let mut buf = [0u8; 8];
        for _ in 0..len {
            read_exact(reader, &mut buf, "matrix data")?;
            data.push(f64::from_le_bytes(buf));
        }
        Self::new(rows, cols, data)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16 + 8 * self.data.len());
        // Writing into a `Vec` cannot fail.
        let _ = self.write_to(&mut buf);
        buf
    }

    /// Decode a matrix that occupies the whole of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = io::Cursor::new(bytes);
        let matrix = Self::read_from(&mut cursor)?;
        let consumed = cursor.position() as usize;
        if consumed != bytes.len() {
            return Err(NetworkError::Decode(format!(
                "{} trailing bytes after matrix",
                bytes.len() - consumed
            )));
        }
        Ok(matrix)
    }

    fn check_same_shape(&self, other: &Matrix) -> Result<()> {
        check_same_len(self.rows(), other.rows())?;
        check_same_len(self.cols(), other.cols())
    }

    fn out_of_range(&self, row: usize, col: usize) -> NetworkError {
        if row >= self.rows() {
            NetworkError::IndexOutOfRange {
                index: row,
                len: self.rows(),
            }
        } else {
            NetworkError::IndexOutOfRange {
                index: col,
                len: self.cols(),
            }
        }
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(data: Array2<f64>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn sample_matrix() -> Matrix {
        Matrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn new_rejects_wrong_data_length() {
        assert!(matches!(
            Matrix::new(2, 3, vec![1.0; 5]),
            Err(NetworkError::DimensionMismatch {
                expected: 6,
                got: 5
            })
        ));
    }

    #[test]
    fn row_major_layout() {
        let m = sample_matrix();
        assert_relative_eq!(2.0, m.get(0, 1).unwrap());
        assert_relative_eq!(4.0, m.get(1, 0).unwrap());
        assert!(m.get(2, 0).is_err());
        assert!(m.get(0, 3).is_err());
    }

    #[test]
    fn transpose_twice_is_identity() {
        let m = sample_matrix();
        let t = m.transpose();
        assert_eq!((3, 2), t.shape());
        assert_relative_eq!(6.0, t.get(2, 1).unwrap());
        assert_eq!(m, t.transpose());
    }

    #[test]
    fn matrix_vector_product() {
        let m = sample_matrix();
        let x = Vector::new(vec![1.0, 0.0, -1.0]);
        assert_eq!(Vector::new(vec![-2.0, -2.0]), m.mul_vector(&x).unwrap());
        assert!(m.mul_vector(&Vector::zeros(2)).is_err());
    }

    #[test]
    fn matrix_matrix_product() {
        let a = sample_matrix();
        let b = Matrix::new(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let ab = a.mul_matrix(&b).unwrap();
        assert_eq!(
            Matrix::new(2, 2, vec![58.0, 64.0, 139.0, 154.0]).unwrap(),
            ab
        );
        assert!(a.mul_matrix(&a).is_err());
    }

    #[test]
    fn product_transpose_law() {
        let a = sample_matrix();
        let b = Matrix::new(3, 4, (0..12).map(|v| v as f64 * 0.5 - 2.0).collect()).unwrap();
        let lhs = a.mul_matrix(&b).unwrap().transpose();
        let rhs = b.transpose().mul_matrix(&a.transpose()).unwrap();
        assert_eq!(lhs.shape(), rhs.shape());
        for (l, r) in lhs.to_vec().iter().zip(rhs.to_vec().iter()) {
            assert_relative_eq!(l, r, epsilon = 1e-12);
        }
    }

    #[test]
    fn scale_add_sub() {
        let mut m = sample_matrix();
        m.scale(2.0);
        assert_eq!(vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0], m.to_vec());
        m.sub_assign(&sample_matrix()).unwrap();
        assert_eq!(sample_matrix(), m);
        m.add_assign(&sample_matrix()).unwrap();
        assert_eq!(vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0], m.to_vec());

        assert!(m.add_assign(&Matrix::zeros(3, 2)).is_err());
        assert!(m.sub_assign(&Matrix::zeros(2, 2)).is_err());
    }

    #[test]
    fn serialize_round_trip() {
        let m = Matrix::new(3, 2, vec![0.1, -2.5, f64::MAX, 1e-300, -0.0, 42.0]).unwrap();
        let bytes = m.to_bytes();
        assert_eq!(16 + 6 * 8, bytes.len());
        let decoded = Matrix::from_bytes(&bytes).unwrap();
        assert_eq!(m.shape(), decoded.shape());
        for (a, b) in m.to_vec().iter().zip(decoded.to_vec().iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn serialize_transposed_keeps_logical_order() {
        let t = sample_matrix().transpose();
        let decoded = Matrix::from_bytes(&t.to_bytes()).unwrap();
        assert_eq!(t, decoded);
    }

    #[test]
    fn decode_rejects_malformed_data() {
        let bytes = sample_matrix().to_bytes();
        assert!(matches!(
            Matrix::from_bytes(&bytes[..bytes.len() - 3]),
            Err(NetworkError::Decode(_))
        ));
        assert!(matches!(
            Matrix::from_bytes(&bytes[..10]),
            Err(NetworkError::Decode(_))
        ));

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(matches!(
            Matrix::from_bytes(&trailing),
            Err(NetworkError::Decode(_))
        ));
    }
}
