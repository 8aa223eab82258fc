//! Dense and sparse (N × p) data matrices consumed by the dissimilarity
//! engine. Rows are points, columns are features.

use crate::error::PamError;
use crate::util::DistValue;
use ndarray::{Array2, ArrayView1};

/// Dense data matrix backed by an `ndarray::Array2`, with optional point
/// names attached to the rows.
#[derive(Debug, Clone)]
pub struct DenseData<C> {
	values: Array2<C>,
	row_names: Option<Vec<String>>,
}

impl<C: DistValue> DenseData<C> {
	pub fn new(values: Array2<C>) -> Self {
		DenseData {
			values,
			row_names: None,
		}
	}

	pub fn with_row_names(mut self, names: Vec<String>) -> Result<Self, PamError> {
		if names.len() != self.n_rows() {
			return Err(PamError::UnsupportedInput(format!(
				"{} row names for {} rows",
				names.len(),
				self.n_rows()
			)));
		}
		self.row_names = Some(names);
		Ok(self)
	}

	pub fn n_rows(&self) -> usize {
		self.values.shape()[0]
	}

	pub fn n_cols(&self) -> usize {
		self.values.shape()[1]
	}

	pub fn row_names(&self) -> Option<&[String]> {
		self.row_names.as_deref()
	}

	#[inline]
	pub(crate) fn row(&self, i: usize) -> ArrayView1<'_, C> {
		self.values.row(i)
	}
}

/// Sparse data matrix in compressed sparse row form. Column indices are
/// strictly increasing within each row; absent entries are zero.
#[derive(Debug, Clone)]
pub struct SparseData<C> {
	n_rows: usize,
	n_cols: usize,
	indptr: Vec<usize>,
	indices: Vec<u32>,
	values: Vec<C>,
	row_names: Option<Vec<String>>,
}

impl<C: DistValue> SparseData<C> {
	/// Build from raw CSR arrays, checking the structural invariants.
	pub fn new(
		n_rows: usize,
		n_cols: usize,
		indptr: Vec<usize>,
		indices: Vec<u32>,
		values: Vec<C>,
	) -> Result<Self, PamError> {
		if indptr.len() != n_rows + 1 || indptr[0] != 0 || indptr[n_rows] != indices.len() {
			return Err(PamError::UnsupportedInput(
				"CSR row pointer array is inconsistent".to_string(),
			));
		}
		if indices.len() != values.len() {
			return Err(PamError::UnsupportedInput(format!(
				"{} column indices for {} values",
				indices.len(),
				values.len()
			)));
		}
		for r in 0..n_rows {
			if indptr[r] > indptr[r + 1] {
				return Err(PamError::UnsupportedInput(format!(
					"CSR row pointers decrease at row {}",
					r
				)));
			}
			let cols = &indices[indptr[r]..indptr[r + 1]];
			for (t, &c) in cols.iter().enumerate() {
				if c as usize >= n_cols {
					return Err(PamError::UnsupportedInput(format!(
						"column index {} out of range in row {}",
						c, r
					)));
				}
				if t > 0 && cols[t - 1] >= c {
					return Err(PamError::UnsupportedInput(format!(
						"column indices not strictly increasing in row {}",
						r
					)));
				}
			}
		}
		Ok(SparseData {
			n_rows,
			n_cols,
			indptr,
			indices,
			values,
			row_names: None,
		})
	}

	/// Build from per-row `(column, value)` lists. Entries within a row
	/// must be sorted by column.
	pub fn from_rows(n_cols: usize, rows: Vec<Vec<(u32, C)>>) -> Result<Self, PamError> {
		let n_rows = rows.len();
		let mut indptr = Vec::with_capacity(n_rows + 1);
		let mut indices = Vec::new();
		let mut values = Vec::new();
		indptr.push(0);
		for row in rows {
			for (c, v) in row {
				indices.push(c);
				values.push(v);
			}
			indptr.push(indices.len());
		}
		Self::new(n_rows, n_cols, indptr, indices, values)
	}

	pub fn with_row_names(mut self, names: Vec<String>) -> Result<Self, PamError> {
		if names.len() != self.n_rows {
			return Err(PamError::UnsupportedInput(format!(
				"{} row names for {} rows",
				names.len(),
				self.n_rows
			)));
		}
		self.row_names = Some(names);
		Ok(self)
	}

	pub fn n_rows(&self) -> usize {
		self.n_rows
	}

	pub fn n_cols(&self) -> usize {
		self.n_cols
	}

	pub fn row_names(&self) -> Option<&[String]> {
		self.row_names.as_deref()
	}

	/// Column indices and values of row `i`.
	#[inline]
	pub(crate) fn row_slice(&self, i: usize) -> (&[u32], &[C]) {
		let range = self.indptr[i]..self.indptr[i + 1];
		(&self.indices[range.clone()], &self.values[range])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_csr_structure_checks() {
		// well-formed
		let m = SparseData::new(2, 4, vec![0, 2, 3], vec![0, 2, 3], vec![1.0, 2.0, 3.0]);
		assert!(m.is_ok());
		let m = m.unwrap();
		assert_eq!(m.row_slice(0), (&[0u32, 2][..], &[1.0, 2.0][..]));
		assert_eq!(m.row_slice(1), (&[3u32][..], &[3.0][..]));
		// column out of range
		assert!(SparseData::new(1, 2, vec![0, 1], vec![2], vec![1.0]).is_err());
		// unsorted columns
		assert!(SparseData::new(1, 4, vec![0, 2], vec![3, 1], vec![1.0, 2.0]).is_err());
		// bad pointer array
		assert!(SparseData::new(2, 4, vec![0, 3], vec![0], vec![1.0]).is_err());
	}

	#[test]
	fn test_from_rows() {
		let m = SparseData::from_rows(3, vec![vec![(0, 1.0f32)], vec![], vec![(1, 2.0), (2, 3.0)]])
			.unwrap();
		assert_eq!(m.n_rows(), 3);
		assert_eq!(m.row_slice(1), (&[][..], &[][..]));
		assert_eq!(m.row_slice(2), (&[1u32, 2][..], &[2.0f32, 3.0][..]));
	}
}
