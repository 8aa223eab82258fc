//! Parallel computation of pairwise dissimilarity matrices from a dense
//! or sparse data matrix.
//!
//! The output triangle is partitioned by rows; every `(i, j)` pair is
//! computed exactly once and written to its single packed location, so
//! workers never contend on the output. Sparse rows are compared with a
//! merged walk over both column lists: a column absent from both rows
//! contributes nothing and is never visited.

use crate::datamatrix::{DenseData, SparseData};
use crate::error::PamError;
use crate::matrix::PackedSymmetric;
use crate::util::{available_ram, checked_div, worker_count, DistValue};
use core::cmp::Ordering;
use core::fmt;
use log::{debug, warn};
use rayon::prelude::*;
use std::str::FromStr;

/// Dissimilarity kind between two data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
	/// Manhattan / city-block distance.
	L1,
	/// Euclidean distance.
	L2,
	/// Pearson dissimilarity, `1 - r` with `r` the correlation coefficient.
	Pearson,
}

impl FromStr for Distance {
	type Err = PamError;

	fn from_str(s: &str) -> Result<Self, PamError> {
		match s {
			"L1" => Ok(Distance::L1),
			"L2" => Ok(Distance::L2),
			"Pe" => Ok(Distance::Pearson),
			other => Err(PamError::UnsupportedInput(format!(
				"distance kind must be L1, L2 or Pe, not '{}'",
				other
			))),
		}
	}
}

impl fmt::Display for Distance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Distance::L1 => "L1",
			Distance::L2 => "L2",
			Distance::Pearson => "Pe",
		})
	}
}

/// Per-row statistics precomputed once for the Pearson dissimilarity, so
/// each pair only needs the product sum of the two rows.
#[derive(Debug, Default)]
struct RowStats {
	mean: Vec<f64>,
	/// Centered sum of squares: `sum(x^2) - p * mean^2`.
	spread: Vec<f64>,
}

/// Compute the dissimilarity matrix between the rows of a dense data
/// matrix.
///
/// * type `C` - element type of the data matrix (`f32` or `f64`)
/// * type `N` - element type of the output matrix (`f32` or `f64`)
/// * `m` - the (N × p) data matrix; rows are points, columns features
/// * `dist` - the dissimilarity kind
/// * `threads` - thread-count sentinel (0 = all cores, -1 = serial)
///
/// Row names of the data matrix, if present, are attached to the result.
///
/// ## Errors
///
/// * `UnsupportedInput` when the dimensions are degenerate (N < 2 or p < 1)
/// * `InsufficientMemory` when the packed output does not fit in RAM;
///   a warning is logged above 75 % of the available RAM
///
/// ## Example
/// ```
/// use parpam::{from_dense, DenseData, DissimMatrix, Distance};
/// let data = DenseData::new(ndarray::arr2(&[[0.0, 0.0], [3.0, 4.0]]));
/// let d = from_dense::<f64, f64>(&data, Distance::L2, -1).unwrap();
/// assert_eq!(d.get(0, 1), 5.0);
/// ```
pub fn from_dense<C, N>(
	m: &DenseData<C>,
	dist: Distance,
	threads: i32,
) -> Result<PackedSymmetric<N>, PamError>
where
	C: DistValue,
	N: DistValue,
{
	let (n, p) = (m.n_rows(), m.n_cols());
	check_dims(n, p)?;
	memory_gate::<N>(n)?;
	let nt = worker_count(threads, n);
	debug!("{} dissimilarity of {} dense rows, {} worker(s)", dist, n, nt);
	let stats = if dist == Distance::Pearson {
		dense_stats(m)
	} else {
		RowStats::default()
	};
	let pair = |i: usize, j: usize| -> f64 {
		let (a, b) = (m.row(i), m.row(j));
		match dist {
			Distance::L1 => a
				.iter()
				.zip(b.iter())
				.map(|(&x, &y)| (x.to_f64() - y.to_f64()).abs())
				.sum(),
			Distance::L2 => a
				.iter()
				.zip(b.iter())
				.map(|(&x, &y)| {
					let d = x.to_f64() - y.to_f64();
					d * d
				})
				.sum::<f64>()
				.sqrt(),
			Distance::Pearson => {
				let dot = a
					.iter()
					.zip(b.iter())
					.map(|(&x, &y)| x.to_f64() * y.to_f64())
					.sum::<f64>();
				pearson_dissim(dot, p, &stats, i, j)
			}
		}
	};
	let data = fill_packed::<N, _>(n, nt, pair);
	let mut out = PackedSymmetric::from_packed(n, data)?;
	if let Some(names) = m.row_names() {
		out = out.with_names(names.to_vec())?;
	}
	Ok(out)
}

/// Compute the dissimilarity matrix between the rows of a sparse data
/// matrix. See [`from_dense`] for the shared contract.
pub fn from_sparse<C, N>(
	m: &SparseData<C>,
	dist: Distance,
	threads: i32,
) -> Result<PackedSymmetric<N>, PamError>
where
	C: DistValue,
	N: DistValue,
{
	let (n, p) = (m.n_rows(), m.n_cols());
	check_dims(n, p)?;
	memory_gate::<N>(n)?;
	let nt = worker_count(threads, n);
	debug!("{} dissimilarity of {} sparse rows, {} worker(s)", dist, n, nt);
	let stats = if dist == Distance::Pearson {
		sparse_stats(m)
	} else {
		RowStats::default()
	};
	let pair = |i: usize, j: usize| -> f64 {
		let acc = merged_walk(m.row_slice(i), m.row_slice(j), dist);
		match dist {
			Distance::L1 => acc,
			Distance::L2 => acc.sqrt(),
			Distance::Pearson => pearson_dissim(acc, p, &stats, i, j),
		}
	};
	let data = fill_packed::<N, _>(n, nt, pair);
	let mut out = PackedSymmetric::from_packed(n, data)?;
	if let Some(names) = m.row_names() {
		out = out.with_names(names.to_vec())?;
	}
	Ok(out)
}

fn check_dims(n: usize, p: usize) -> Result<(), PamError> {
	if n < 2 || p < 1 {
		return Err(PamError::UnsupportedInput(format!(
			"data matrix of {} points with {} features is degenerate",
			n, p
		)));
	}
	Ok(())
}

/// The packed output holds n(n+1)/2 elements; refuse to allocate past the
/// available RAM and warn above three quarters of it.
fn memory_gate<N>(n: usize) -> Result<(), PamError> {
	let required = (n * (n + 1) / 2) as u64 * std::mem::size_of::<N>() as u64;
	if let Some(avail) = available_ram() {
		if required > avail {
			return Err(PamError::InsufficientMemory(format!(
				"dissimilarity matrix needs {} bytes, only {} available",
				required, avail
			)));
		}
		if required * 4 > avail * 3 {
			warn!(
				"dissimilarity matrix will use {} of {} available bytes",
				required, avail
			);
		}
	}
	Ok(())
}

/// Fill the packed lower triangle. The storage is split into per-row
/// slices up front, so parallel workers write disjoint memory without
/// synchronization. The diagonal stays zero.
fn fill_packed<N, F>(n: usize, nt: usize, pair: F) -> Vec<N>
where
	N: DistValue,
	F: Fn(usize, usize) -> f64 + Send + Sync,
{
	let mut data = vec![N::zero(); n * (n + 1) / 2];
	{
		let mut rows: Vec<(usize, &mut [N])> = Vec::with_capacity(n);
		let mut rest: &mut [N] = &mut data;
		for i in 0..n {
			let (head, tail) = std::mem::take(&mut rest).split_at_mut(i + 1);
			rows.push((i, head));
			rest = tail;
		}
		if nt == 1 {
			for (i, out) in rows.iter_mut() {
				for j in 0..*i {
					out[j] = N::from_f64(pair(*i, j));
				}
			}
		} else {
			rows.par_iter_mut().for_each(|(i, out)| {
				for j in 0..*i {
					out[j] = N::from_f64(pair(*i, j));
				}
			});
		}
	}
	data
}

fn dense_stats<C: DistValue>(m: &DenseData<C>) -> RowStats {
	let p = m.n_cols() as f64;
	let mut stats = RowStats {
		mean: Vec::with_capacity(m.n_rows()),
		spread: Vec::with_capacity(m.n_rows()),
	};
	for i in 0..m.n_rows() {
		let row = m.row(i);
		let sum: f64 = row.iter().map(|&x| x.to_f64()).sum();
		let sumsq: f64 = row
			.iter()
			.map(|&x| {
				let v = x.to_f64();
				v * v
			})
			.sum();
		let mu = sum / p;
		stats.mean.push(mu);
		stats.spread.push(sumsq - p * mu * mu);
	}
	stats
}

fn sparse_stats<C: DistValue>(m: &SparseData<C>) -> RowStats {
	let p = m.n_cols() as f64;
	let mut stats = RowStats {
		mean: Vec::with_capacity(m.n_rows()),
		spread: Vec::with_capacity(m.n_rows()),
	};
	for i in 0..m.n_rows() {
		let (_, values) = m.row_slice(i);
		let sum: f64 = values.iter().map(|&x| x.to_f64()).sum();
		let sumsq: f64 = values
			.iter()
			.map(|&x| {
				let v = x.to_f64();
				v * v
			})
			.sum();
		let mu = sum / p;
		stats.mean.push(mu);
		stats.spread.push(sumsq - p * mu * mu);
	}
	stats
}

/// `1 - r` from the raw product sum and the precomputed row statistics.
/// A degenerate (constant) row has no defined correlation; it is treated
/// as uncorrelated, giving dissimilarity 1.
#[inline]
fn pearson_dissim(dot: f64, p: usize, stats: &RowStats, i: usize, j: usize) -> f64 {
	let cov = dot - p as f64 * stats.mean[i] * stats.mean[j];
	let den = (stats.spread[i] * stats.spread[j]).sqrt();
	1.0 - checked_div(cov, den)
}

/// Merged walk over two sorted sparse rows, visiting every column present
/// in either row exactly once and classifying it as present in the first,
/// the second, or both. Returns the accumulated sum for `dist`: absolute
/// differences (L1), squared differences (L2) or the product sum (Pearson).
fn merged_walk<C: DistValue>(a: (&[u32], &[C]), b: (&[u32], &[C]), dist: Distance) -> f64 {
	#[inline]
	fn one_sided(x: f64, dist: Distance) -> f64 {
		match dist {
			Distance::L1 => x.abs(),
			Distance::L2 => x * x,
			Distance::Pearson => 0.0,
		}
	}
	#[inline]
	fn two_sided(x: f64, y: f64, dist: Distance) -> f64 {
		match dist {
			Distance::L1 => (x - y).abs(),
			Distance::L2 => {
				let d = x - y;
				d * d
			}
			Distance::Pearson => x * y,
		}
	}
	let (ia, va) = a;
	let (ib, vb) = b;
	let (mut s, mut t) = (0usize, 0usize);
	let mut acc = 0.0;
	while s < ia.len() && t < ib.len() {
		match ia[s].cmp(&ib[t]) {
			Ordering::Less => {
				acc += one_sided(va[s].to_f64(), dist);
				s += 1;
			}
			Ordering::Greater => {
				acc += one_sided(vb[t].to_f64(), dist);
				t += 1;
			}
			Ordering::Equal => {
				acc += two_sided(va[s].to_f64(), vb[t].to_f64(), dist);
				s += 1;
				t += 1;
			}
		}
	}
	for &v in &va[s..] {
		acc += one_sided(v.to_f64(), dist);
	}
	for &v in &vb[t..] {
		acc += one_sided(v.to_f64(), dist);
	}
	acc
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matrix::DissimMatrix;
	use ndarray::Array2;
	use rand::{rngs::StdRng, Rng, SeedableRng};

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-12
	}

	#[test]
	fn test_l1_l2_known_values() {
		let data = DenseData::new(ndarray::arr2(&[[0.0, 0.0], [3.0, 4.0]]));
		let d2 = from_dense::<f64, f64>(&data, Distance::L2, -1).unwrap();
		assert!(close(d2.get(0, 1), 5.0));
		let d1 = from_dense::<f64, f64>(&data, Distance::L1, -1).unwrap();
		assert!(close(d1.get(1, 0), 7.0));
	}

	#[test]
	fn test_pearson_known_values() {
		// perfectly correlated, anti-correlated and constant rows
		let data = DenseData::new(ndarray::arr2(&[
			[1.0, 2.0, 3.0],
			[2.0, 4.0, 6.0],
			[3.0, 2.0, 1.0],
			[5.0, 5.0, 5.0],
		]));
		let d = from_dense::<f64, f64>(&data, Distance::Pearson, -1).unwrap();
		assert!(close(d.get(0, 1), 0.0));
		assert!(close(d.get(0, 2), 2.0));
		assert!(close(d.get(0, 3), 1.0), "constant row counts as uncorrelated");
	}

	#[test]
	fn test_symmetry_and_zero_diagonal() {
		let mut rng = StdRng::seed_from_u64(42);
		let data = DenseData::new(Array2::from_shape_fn((12, 6), |_| rng.gen_range(0.1..5.0)));
		for dist in [Distance::L1, Distance::L2, Distance::Pearson] {
			let d = from_dense::<f64, f64>(&data, dist, -1).unwrap();
			for i in 0..12 {
				assert_eq!(d.get(i, i), 0.0);
				for j in 0..i {
					assert_eq!(d.get(i, j), d.get(j, i));
				}
			}
		}
	}

	#[test]
	fn test_sparse_matches_dense() {
		// the same logical matrix in both layouts, with plenty of zeros
		let n = 9;
		let p = 7;
		let value = |i: usize, j: usize| -> f64 {
			if (i + 2 * j) % 3 == 0 {
				(i * p + j + 1) as f64 / 10.0
			} else {
				0.0
			}
		};
		let dense = DenseData::new(Array2::from_shape_fn((n, p), |(i, j)| value(i, j)));
		let rows: Vec<Vec<(u32, f64)>> = (0..n)
			.map(|i| {
				(0..p)
					.filter(|&j| value(i, j) != 0.0)
					.map(|j| (j as u32, value(i, j)))
					.collect()
			})
			.collect();
		let sparse = SparseData::from_rows(p, rows).unwrap();
		for dist in [Distance::L1, Distance::L2, Distance::Pearson] {
			let dd = from_dense::<f64, f64>(&dense, dist, -1).unwrap();
			let ds = from_sparse::<f64, f64>(&sparse, dist, -1).unwrap();
			for i in 0..n {
				for j in 0..n {
					assert!(
						close(dd.get(i, j), ds.get(i, j)),
						"{} differs at ({}, {}): {} vs {}",
						dist,
						i,
						j,
						dd.get(i, j),
						ds.get(i, j)
					);
				}
			}
		}
	}

	#[test]
	fn test_mixed_precision() {
		let data = DenseData::new(ndarray::arr2(&[[0.0f32, 0.0], [3.0, 4.0]]));
		let d = from_dense::<f32, f64>(&data, Distance::L2, -1).unwrap();
		assert!(close(d.get(0, 1), 5.0));
		let d32 = from_dense::<f32, f32>(&data, Distance::L2, -1).unwrap();
		assert_eq!(d32.get(0, 1), 5.0f32);
	}

	#[test]
	fn test_degenerate_dimensions() {
		let one_row = DenseData::new(Array2::from_shape_fn((1, 3), |_| 1.0));
		assert!(matches!(
			from_dense::<f64, f64>(&one_row, Distance::L2, -1),
			Err(PamError::UnsupportedInput(_))
		));
	}

	#[test]
	fn test_row_names_propagate() {
		let data = DenseData::new(ndarray::arr2(&[[0.0, 0.0], [3.0, 4.0]]))
			.with_row_names(vec!["a".to_string(), "b".to_string()])
			.unwrap();
		let d = from_dense::<f64, f64>(&data, Distance::L2, -1).unwrap();
		assert_eq!(d.names().unwrap(), &["a".to_string(), "b".to_string()]);
	}

	#[test]
	fn test_distance_strings() {
		assert_eq!("L1".parse::<Distance>().unwrap(), Distance::L1);
		assert_eq!("L2".parse::<Distance>().unwrap(), Distance::L2);
		assert_eq!("Pe".parse::<Distance>().unwrap(), Distance::Pearson);
		// only the documented short form is accepted
		assert!("Pearson".parse::<Distance>().is_err());
	}
}
