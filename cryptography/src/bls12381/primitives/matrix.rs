//! Dense matrices of field or group elements.

use crate::bls12381::primitives::group::{Element, Scalar};
use bytes::{Buf, BufMut};
use yoso_codec::{EncodeSize, Error as CodecError, FixedSize, Read, ReadExt, Write};

/// A row-major matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Matrix<T> {
    /// Creates a new `Matrix` from a flat vector of data and specified dimensions.
    ///
    /// The data must be row-major; that is, the first `cols` elements of `data` will
    /// be the first row, the next `cols` elements will be the second row, and so on.
    pub fn new(data: Vec<T>, rows: usize, cols: usize) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "Data length does not match dimensions"
        );
        Self { data, rows, cols }
    }

    /// Builds a matrix from `rows` rows of `cols` elements generated by `f(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Self { data, rows, cols }
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Gets a reference to the element at the specified row and column.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        (row < self.rows && col < self.cols).then(|| &self.data[row * self.cols + col])
    }

    /// Returns a row as a slice.
    pub fn row(&self, row: usize) -> Option<&[T]> {
        (row < self.rows).then(|| {
            let start = row * self.cols;
            &self.data[start..start + self.cols]
        })
    }

    /// Returns an iterator over the elements in a column.
    pub fn col_iter(&self, col: usize) -> Option<impl Iterator<Item = &T>> {
        (col < self.cols).then(|| self.data.iter().skip(col).step_by(self.cols))
    }

    /// Returns an iterator over the rows.
    pub fn rows_iter(&self) -> impl Iterator<Item = &[T]> {
        // `chunks_exact` panics on a zero chunk size
        let cols = self.cols.max(1);
        self.data.chunks_exact(cols).take(self.rows)
    }
}

impl Matrix<Scalar> {
    /// Multiplies the matrix with a column vector.
    ///
    /// Panics if the vector length differs from the number of columns.
    pub fn mul_vec(&self, vector: &[Scalar]) -> Vec<Scalar> {
        assert_eq!(vector.len(), self.cols, "Dimension mismatch");
        self.rows_iter()
            .map(|row| {
                row.iter()
                    .zip(vector)
                    .fold(Scalar::zero(), |mut acc, (a, b)| {
                        let mut term = *a;
                        term.mul(b);
                        acc.add(&term);
                        acc
                    })
            })
            .collect()
    }
}

impl<T: Write> Write for Matrix<T> {
    fn write(&self, buf: &mut impl BufMut) {
        (self.rows as u32).write(buf);
        (self.cols as u32).write(buf);
        for item in &self.data {
            item.write(buf);
        }
    }
}

impl<T: EncodeSize> EncodeSize for Matrix<T> {
    fn encode_size(&self) -> usize {
        2 * u32::SIZE + self.data.iter().map(EncodeSize::encode_size).sum::<usize>()
    }
}

impl<T: Read<Cfg = ()>> Read for Matrix<T> {
    /// Expected `(rows, cols)`.
    type Cfg = (usize, usize);

    fn read_cfg(buf: &mut impl Buf, (rows, cols): &Self::Cfg) -> Result<Self, CodecError> {
        let read_rows = u32::read(buf)? as usize;
        if read_rows != *rows {
            return Err(CodecError::InvalidLength(read_rows));
        }
        let read_cols = u32::read(buf)? as usize;
        if read_cols != *cols {
            return Err(CodecError::InvalidLength(read_cols));
        }
        let len = rows
            .checked_mul(*cols)
            .ok_or(CodecError::Invalid("Matrix", "dimensions overflow"))?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            data.push(T::read(buf)?);
        }
        Ok(Self {
            data,
            rows: *rows,
            cols: *cols,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yoso_codec::{Decode, Encode};

    fn scalars(values: &[u32]) -> Vec<Scalar> {
        values.iter().map(|v| Scalar::from_u32(*v)).collect()
    }

    #[test]
    fn test_get_and_rows() {
        let m = Matrix::new(vec![1, 2, 3, 4, 5, 6], 2, 3);
        assert_eq!(m.get(0, 2), Some(&3));
        assert_eq!(m.get(1, 0), Some(&4));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, 3), None);
        assert_eq!(m.row(1), Some(&[4, 5, 6][..]));
        assert_eq!(m.row(2), None);
        assert_eq!(m.rows_iter().count(), 2);
    }

    #[test]
    fn test_col_iter() {
        let m = Matrix::from_fn(3, 2, |r, c| r * 10 + c);
        let col1 = m.col_iter(1).unwrap().copied().collect::<Vec<_>>();
        assert_eq!(col1, vec![1, 11, 21]);
        assert!(m.col_iter(2).is_none());
    }

    #[test]
    fn test_mul_vec() {
        let m = Matrix::new(scalars(&[1, 2, 3, 4]), 2, 2);
        assert_eq!(m.mul_vec(&scalars(&[5, 6])), scalars(&[17, 39]));
    }

    #[test]
    #[should_panic(expected = "Dimension mismatch")]
    fn test_mul_vec_mismatch() {
        let m = Matrix::new(scalars(&[1, 2, 3, 4]), 2, 2);
        m.mul_vec(&scalars(&[1]));
    }

    #[test]
    fn test_codec_dimensions() {
        let m = Matrix::new(scalars(&[1, 2, 3, 4, 5, 6]), 3, 2);
        let encoded = m.encode();
        assert_eq!(Matrix::<Scalar>::decode_cfg(encoded.clone(), &(3, 2)).unwrap(), m);
        assert!(matches!(
            Matrix::<Scalar>::decode_cfg(encoded, &(2, 3)),
            Err(CodecError::InvalidLength(3))
        ));
    }
}
