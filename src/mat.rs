//! Dense row-major matrices.
use std::fmt;
use std::ops::{Index, IndexMut, Range};
use num::{One, Zero};

/// Borrowed view of a row-major matrix with an arbitrary row stride.
#[derive(Clone, Copy)]
pub struct MatRef<'a, T: 'a> {
    data: &'a [T],
    num_rows: usize,
    num_cols: usize,
    stride: usize,
}

impl<'a, T> MatRef<'a, T> {
    /// Panics if the slice is too short.
    pub fn new(data: &'a [T], num_rows: usize, num_cols: usize,
               stride: usize) -> Self {
        assert!(stride >= num_cols);
        assert!(num_rows == 0 || data.len() >= (num_rows - 1) * stride + num_cols);
        Self { data, num_rows, num_cols, stride }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The underlying slice, padding included.
    pub fn to_slice(&self) -> &'a [T] {
        self.data
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&'a T> {
        if i < self.num_rows && j < self.num_cols {
            Some(&self.data[i * self.stride + j])
        } else {
            None
        }
    }

    pub fn row(&self, i: usize) -> &'a [T] {
        let start = i * self.stride;
        &self.data[start .. start + self.num_cols]
    }

    pub fn slice(&self, is: Range<usize>, js: Range<usize>) -> Self {
        assert!(is.start <= is.end && is.end <= self.num_rows);
        assert!(js.start <= js.end && js.end <= self.num_cols);
        let start = is.start * self.stride + js.start;
        let data = if is.start == is.end { &self.data[..0] } else { &self.data[start ..] };
        Self {
            data,
            num_rows: is.end - is.start,
            num_cols: js.end - js.start,
            stride: self.stride,
        }
    }
}

impl<'a, T: Clone> MatRef<'a, T> {
    pub fn to_owned(&self) -> Mat<T> {
        let mut data = Vec::with_capacity(self.num_rows * self.num_cols);
        for i in 0 .. self.num_rows {
            data.extend_from_slice(self.row(i));
        }
        Mat::from_vec(data, self.num_rows, self.num_cols)
    }
}

impl<'a, T> Index<(usize, usize)> for MatRef<'a, T> {
    type Output = T;
    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        self.get(i, j).unwrap_or_else(|| panic!("out of range: ({}, {})", i, j))
    }
}

/// Mutable view of a row-major matrix.
pub struct MatMut<'a, T: 'a> {
    data: &'a mut [T],
    num_rows: usize,
    num_cols: usize,
    stride: usize,
}

impl<'a, T> MatMut<'a, T> {
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_ref(&self) -> MatRef<T> {
        MatRef {
            data: &*self.data,
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            stride: self.stride,
        }
    }

    /// The underlying slice, padding included.
    pub fn to_slice(self) -> &'a mut [T] {
        self.data
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> Option<&mut T> {
        if i < self.num_rows && j < self.num_cols {
            Some(&mut self.data[i * self.stride + j])
        } else {
            None
        }
    }
}

impl<'a, T> Index<(usize, usize)> for MatMut<'a, T> {
    type Output = T;
    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        assert!(i < self.num_rows && j < self.num_cols,
                "out of range: ({}, {})", i, j);
        &self.data[i * self.stride + j]
    }
}

impl<'a, T> IndexMut<(usize, usize)> for MatMut<'a, T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Self::Output {
        self.get_mut(i, j)
            .unwrap_or_else(|| panic!("out of range: ({}, {})", i, j))
    }
}

/// Owned, packed row-major matrix.
#[derive(Clone, Default, PartialEq)]
pub struct Mat<T> {
    data: Vec<T>,
    num_rows: usize,
    num_cols: usize,
}

impl<T: fmt::Debug> fmt::Debug for Mat<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rows: Vec<_> = (0 .. self.num_rows)
            .map(|i| &self.data[i * self.num_cols .. (i + 1) * self.num_cols])
            .collect();
        f.debug_list().entries(rows).finish()
    }
}

/// Convenience function for creating matrices directly in code.
impl<T> From<Vec<Vec<T>>> for Mat<T> {
    fn from(rows: Vec<Vec<T>>) -> Self {
        let ni = rows.len();
        let nj = if ni == 0 { 0 } else { rows[0].len() };
        let mut data = Vec::with_capacity(ni * nj);
        for row in rows {
            assert_eq!(row.len(), nj, "ragged rows");
            data.extend(row);
        }
        Self::from_vec(data, ni, nj)
    }
}

impl<T: Clone> Mat<T> {
    pub fn replicate(num_rows: usize, num_cols: usize, value: T) -> Self {
        Self::from_vec(vec![value; num_rows * num_cols], num_rows, num_cols)
    }

    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0 .. self.num_cols {
            for i in 0 .. self.num_rows {
                data.push(self[(i, j)].clone());
            }
        }
        Self::from_vec(data, self.num_cols, self.num_rows)
    }

    /// Copy of the submatrix at the given row and column ranges.
    pub fn submat(&self, is: Range<usize>, js: Range<usize>) -> Self {
        self.as_ref().slice(is, js).to_owned()
    }

    /// Overwrite the block whose top-left corner sits at `(i0, j0)`.
    pub fn set_block(&mut self, i0: usize, j0: usize, block: MatRef<T>) {
        assert!(i0 + block.num_rows() <= self.num_rows);
        assert!(j0 + block.num_cols() <= self.num_cols);
        for i in 0 .. block.num_rows() {
            let start = (i0 + i) * self.num_cols + j0;
            self.data[start .. start + block.num_cols()]
                .clone_from_slice(block.row(i));
        }
    }
}

impl<T: Clone + Zero> Mat<T> {
    pub fn zero(num_rows: usize, num_cols: usize) -> Self {
        Self::replicate(num_rows, num_cols, Zero::zero())
    }
}

impl<T: Clone + Zero + One> Mat<T> {
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zero(n, n);
        for i in 0 .. n {
            m[(i, i)] = One::one();
        }
        m
    }

    pub fn from_diag(diag: &[T]) -> Self {
        let mut m = Self::zero(diag.len(), diag.len());
        for (i, x) in diag.iter().enumerate() {
            m[(i, i)] = x.clone();
        }
        m
    }
}

impl<T> Mat<T> {
    /// Panics if the vector is too short.
    pub fn from_vec(mut vec: Vec<T>, num_rows: usize, num_cols: usize) -> Self {
        let n = num_rows * num_cols;
        assert!(vec.len() >= n);
        vec.truncate(n);
        Self { data: vec, num_rows, num_cols }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    pub fn is_square(&self) -> bool {
        self.num_rows == self.num_cols
    }

    pub fn extent(&self) -> usize {
        self.data.len()
    }

    pub fn as_ref(&self) -> MatRef<T> {
        MatRef {
            data: &self.data[..],
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            stride: self.num_cols,
        }
    }

    pub fn as_mut(&mut self) -> MatMut<T> {
        MatMut {
            data: &mut self.data[..],
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            stride: self.num_cols,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        if i < self.num_rows && j < self.num_cols {
            Some(&self.data[i * self.num_cols + j])
        } else {
            None
        }
    }

    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.num_cols .. (i + 1) * self.num_cols]
    }
}

impl<T> Index<(usize, usize)> for Mat<T> {
    type Output = T;
    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        self.get(i, j).unwrap_or_else(|| panic!("out of range: ({}, {})", i, j))
    }
}

impl<T> IndexMut<(usize, usize)> for Mat<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Self::Output {
        assert!(i < self.num_rows && j < self.num_cols,
                "out of range: ({}, {})", i, j);
        &mut self.data[i * self.num_cols + j]
    }
}

impl Mat<f64> {
    /// `self ← self + alpha × other`
    pub fn add_scaled(&mut self, alpha: f64, other: &Mat<f64>) {
        assert_eq!(self.dims(), other.dims());
        for (x, y) in self.data.iter_mut().zip(&other.data) {
            *x += alpha * y;
        }
    }

    pub fn scale(&mut self, alpha: f64) {
        for x in &mut self.data {
            *x *= alpha;
        }
    }

    /// Average with the transpose.
    pub fn symmetrize(&mut self) {
        assert!(self.is_square());
        let n = self.num_rows;
        for i in 0 .. n {
            for j in 0 .. i {
                let x = 0.5 * (self[(i, j)] + self[(j, i)]);
                self[(i, j)] = x;
                self[(j, i)] = x;
            }
        }
    }

    /// Largest absolute entry (zero for an empty matrix).
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |m, x| f64::max(m, x.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views() {
        let m = Mat::from(vec![vec![1.0, 2.0, 3.0],
                               vec![4.0, 5.0, 6.0],
                               vec![7.0, 8.0, 9.0]]);
        let s = m.as_ref().slice(1 .. 3, 0 .. 2);
        assert_eq!(s.dims(), (2, 2));
        assert_eq!(s[(0, 1)], 5.0);
        assert_eq!(s[(1, 0)], 7.0);
        assert_eq!(s.to_owned(), Mat::from(vec![vec![4.0, 5.0],
                                                vec![7.0, 8.0]]));
        assert_eq!(m.transpose()[(0, 2)], 7.0);
    }

    #[test]
    fn test_set_block_and_symmetrize() {
        let mut m = Mat::zero(3, 3);
        m.set_block(1, 1, Mat::from(vec![vec![1.0, 2.0],
                                         vec![0.0, 1.0]]).as_ref());
        m.symmetrize();
        assert_eq!(m[(1, 2)], 1.0);
        assert_eq!(m[(2, 1)], 1.0);
        assert_eq!(m[(0, 0)], 0.0);
        assert_eq!(m.max_abs(), 1.0);
    }
}
