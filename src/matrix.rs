//! Random-access views of symmetric dissimilarity matrices.
//!
//! Includes the packed-triangle storage produced by the dissimilarity
//! engine and an adapter for `ndarray::Array2`.

use crate::error::PamError;
use crate::util::DistValue;

/// Read-only, thread-safe random-access view of an N×N symmetric
/// dissimilarity matrix.
///
/// The clustering and silhouette engines only require this trait, so any
/// storage with cheap `(row, col)` access can back them.
#[allow(clippy::len_without_is_empty)]
pub trait DissimMatrix<N: Copy>: Sync {
	/// Number of points (rows and columns).
	fn len(&self) -> usize;
	/// Whether the backing storage is consistent with a square matrix.
	fn is_square(&self) -> bool;
	/// Entry at `(row, col)`.
	fn get(&self, row: usize, col: usize) -> N;
	/// Optional point names, shared by rows and columns.
	fn names(&self) -> Option<&[String]> {
		None
	}
}

impl<N: Copy + Send + Sync> DissimMatrix<N> for ndarray::Array2<N> {
	#[inline]
	fn len(&self) -> usize {
		self.shape()[0]
	}
	#[inline]
	fn is_square(&self) -> bool {
		self.shape()[0] == self.shape()[1]
	}
	#[inline]
	fn get(&self, row: usize, col: usize) -> N {
		self[[row, col]]
	}
}

/// Symmetric matrix stored as a packed lower triangle including the
/// diagonal, `n(n+1)/2` elements.
///
/// This is the owning storage returned by the dissimilarity engine; point
/// names from the data matrix, when present, travel along as row and
/// column labels.
///
/// ## Example
/// ```
/// use parpam::{DissimMatrix, PackedSymmetric};
/// let d = PackedSymmetric::from_packed(3, vec![0.0, 2.0, 0.0, 5.0, 1.0, 0.0]).unwrap();
/// assert_eq!(d.get(0, 2), 5.0);
/// assert_eq!(d.get(2, 0), 5.0);
/// ```
#[derive(Debug, Clone)]
pub struct PackedSymmetric<N> {
	n: usize,
	data: Vec<N>,
	names: Option<Vec<String>>,
	comment: Option<String>,
}

impl<N: DistValue> PackedSymmetric<N> {
	/// An all-zero matrix of `n` points.
	pub fn zeros(n: usize) -> Self {
		PackedSymmetric {
			n,
			data: vec![N::zero(); n * (n + 1) / 2],
			names: None,
			comment: None,
		}
	}

	/// Wrap an existing packed lower triangle (row-major, diagonal
	/// included: row r holds r+1 entries).
	pub fn from_packed(n: usize, data: Vec<N>) -> Result<Self, PamError> {
		if data.len() != n * (n + 1) / 2 {
			return Err(PamError::UnsupportedInput(format!(
				"packed triangle of {} points needs {} elements, got {}",
				n,
				n * (n + 1) / 2,
				data.len()
			)));
		}
		Ok(PackedSymmetric {
			n,
			data,
			names: None,
			comment: None,
		})
	}

	/// Attach point names, used as both row and column labels.
	pub fn with_names(mut self, names: Vec<String>) -> Result<Self, PamError> {
		if names.len() != self.n {
			return Err(PamError::UnsupportedInput(format!(
				"{} names for {} points",
				names.len(),
				self.n
			)));
		}
		self.names = Some(names);
		Ok(self)
	}

	/// Attach a free-text comment, e.g. the provenance of the matrix.
	pub fn set_comment(&mut self, comment: impl Into<String>) {
		self.comment = Some(comment.into());
	}

	pub fn comment(&self) -> Option<&str> {
		self.comment.as_deref()
	}

	/// Write access to one entry; both `(r, c)` and `(c, r)` are updated,
	/// since a single packed element backs them.
	pub fn set(&mut self, row: usize, col: usize, value: N) {
		let (hi, lo) = if row >= col { (row, col) } else { (col, row) };
		self.data[hi * (hi + 1) / 2 + lo] = value;
	}
}

impl<N: DistValue> DissimMatrix<N> for PackedSymmetric<N> {
	#[inline]
	fn len(&self) -> usize {
		self.n
	}
	#[inline]
	fn is_square(&self) -> bool {
		self.data.len() == self.n * (self.n + 1) / 2
	}
	#[inline]
	fn get(&self, row: usize, col: usize) -> N {
		let (hi, lo) = if row >= col { (row, col) } else { (col, row) };
		self.data[hi * (hi + 1) / 2 + lo]
	}
	fn names(&self) -> Option<&[String]> {
		self.names.as_deref()
	}
}

/// Check the dissimilarity contract: zero main diagonal and strictly
/// positive entries outside it.
///
/// The PAM algorithm does not work on matrices violating this, so the
/// engine runs the check once at construction.
pub fn validate_dissim<M, N>(mat: &M) -> Result<(), PamError>
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	if !mat.is_square() {
		return Err(PamError::InvalidDissimilarity(
			"matrix is not square".to_string(),
		));
	}
	let n = mat.len();
	for r in 0..n {
		if mat.get(r, r) != N::zero() {
			return Err(PamError::InvalidDissimilarity(format!(
				"non-zero diagonal entry at ({}, {})",
				r, r
			)));
		}
		for c in 0..r {
			if !(mat.get(r, c) > N::zero()) {
				return Err(PamError::InvalidDissimilarity(format!(
					"non-positive entry at ({}, {})",
					r, c
				)));
			}
		}
	}
	Ok(())
}

/// A one-column result vector, optionally carrying point names.
///
/// Medoids and assignments are returned this way: owning values, never
/// references into engine state.
#[derive(Debug, Clone)]
pub struct NamedColumn<T> {
	values: Vec<T>,
	names: Option<Vec<String>>,
}

impl<T> NamedColumn<T> {
	pub fn new(values: Vec<T>) -> Self {
		NamedColumn {
			values,
			names: None,
		}
	}

	pub fn with_names(values: Vec<T>, names: Vec<String>) -> Result<Self, PamError> {
		if names.len() != values.len() {
			return Err(PamError::UnsupportedInput(format!(
				"{} names for {} values",
				names.len(),
				values.len()
			)));
		}
		Ok(NamedColumn {
			values,
			names: Some(names),
		})
	}

	pub fn values(&self) -> &[T] {
		&self.values
	}

	pub fn names(&self) -> Option<&[String]> {
		self.names.as_deref()
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn into_values(self) -> Vec<T> {
		self.values
	}
}
