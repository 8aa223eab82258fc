//! Silhouette evaluation of a clustering (serial implementation).
//!
//! The Silhouette, proposed by Peter Rousseeuw in 1987, scores each point
//! in [-1, 1] by combining its tightness within the own cluster with its
//! separation from the closest other cluster. Values are always computed
//! and returned as `f64`, whatever the precision of the dissimilarity
//! matrix.

use crate::error::PamError;
use crate::matrix::DissimMatrix;
use crate::util::{checked_div, DistValue};

/// Validate a label vector against the matrix and count the cluster
/// populations. Returns the number of clusters and the histogram.
pub(crate) fn check_labels<M, N>(mat: &M, labels: &[u32]) -> Result<(usize, Vec<u64>), PamError>
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	let n = mat.len();
	if labels.len() != n {
		return Err(PamError::UnsupportedInput(format!(
			"classification has {} entries for {} points",
			labels.len(),
			n
		)));
	}
	let mut max = 0u32;
	for &l in labels {
		if l as usize >= n {
			return Err(PamError::UnsupportedInput(format!(
				"cluster label {} out of range for {} points",
				l, n
			)));
		}
		max = max.max(l);
	}
	let k = max as usize + 1;
	let mut hist = vec![0u64; k];
	for &l in labels {
		hist[l as usize] += 1;
	}
	if hist[0] == 0 {
		return Err(PamError::UnsupportedInput(
			"cluster labels do not start at 0".to_string(),
		));
	}
	for (m, &count) in hist.iter().enumerate() {
		if count == 0 {
			return Err(PamError::UnsupportedInput(format!(
				"cluster {} is empty",
				m
			)));
		}
	}
	Ok((k, hist))
}

/// Silhouette of point `q`: mean distance to the own cluster against the
/// smallest mean distance to any other cluster. A point alone in its
/// cluster scores 0; so does every point when there is a single cluster.
pub(crate) fn point_silhouette<M, N>(
	mat: &M,
	labels: &[u32],
	hist: &[u64],
	sums: &mut [f64],
	q: usize,
) -> f64
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	let own = labels[q] as usize;
	if hist.len() == 1 || hist[own] == 1 {
		return 0.0;
	}
	sums.fill(0.0);
	for (q1, &l) in labels.iter().enumerate() {
		sums[l as usize] += mat.get(q, q1).to_f64();
	}
	// the point itself contributed D(q,q) = 0 to the own sum
	let a = checked_div(sums[own], (hist[own] - 1) as f64);
	let mut b = f64::MAX;
	for (m, &sum) in sums.iter().enumerate() {
		if m != own {
			let avg = checked_div(sum, hist[m] as f64);
			if avg < b {
				b = avg;
			}
		}
	}
	checked_div(b - a, a.max(b))
}

/// Compute the silhouette value of every point of a clustering.
///
/// * `mat` - the pairwise dissimilarity matrix
/// * `labels` - cluster label of each point, in `0..k` with `k` inferred
///   as the largest label plus one
///
/// Returns one `f64` per point, in matrix order.
///
/// ## Errors
///
/// `UnsupportedInput` when the label vector does not match the matrix,
/// labels do not start at 0, or some cluster is empty.
///
/// ## Example
/// ```
/// use parpam::{silhouette, PackedSymmetric};
/// // two clusters of two, distance 1 inside and 10 across
/// let mut d = PackedSymmetric::zeros(4);
/// d.set(0, 1, 1.0);
/// d.set(2, 3, 1.0);
/// for (i, j) in [(0, 2), (0, 3), (1, 2), (1, 3)] {
/// 	d.set(i, j, 10.0);
/// }
/// let sil = silhouette(&d, &[0, 0, 1, 1]).unwrap();
/// assert!(sil.iter().all(|&s| (s - 0.9).abs() < 1e-12));
/// ```
pub fn silhouette<M, N>(mat: &M, labels: &[u32]) -> Result<Vec<f64>, PamError>
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	let (k, hist) = check_labels(mat, labels)?;
	let mut sums = vec![0.0; k];
	Ok((0..mat.len())
		.map(|q| point_silhouette(mat, labels, &hist, &mut sums, q))
		.collect())
}

/// Average silhouette over all points. See [`silhouette`].
pub fn mean_silhouette<M, N>(mat: &M, labels: &[u32]) -> Result<f64, PamError>
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	let sil = silhouette(mat, labels)?;
	Ok(sil.iter().sum::<f64>() / sil.len() as f64)
}

/// Mean silhouette for internal callers that guarantee in-range labels,
/// e.g. the multi-branch exchange ranking, where a provisional
/// reassignment may transiently leave a cluster empty.
pub(crate) fn mean_silhouette_unchecked<M, N>(mat: &M, labels: &[u32], k: usize) -> f64
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	let n = mat.len();
	let mut hist = vec![0u64; k];
	for &l in labels {
		hist[l as usize] += 1;
	}
	let mut sums = vec![0.0; k];
	let total: f64 = (0..n)
		.map(|q| point_silhouette(mat, labels, &hist, &mut sums, q))
		.sum();
	total / n as f64
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matrix::PackedSymmetric;

	fn two_blocks(within: f64, between: f64) -> PackedSymmetric<f64> {
		let mut d = PackedSymmetric::zeros(4);
		d.set(0, 1, within);
		d.set(2, 3, within);
		for (i, j) in [(0, 2), (0, 3), (1, 2), (1, 3)] {
			d.set(i, j, between);
		}
		d
	}

	#[test]
	fn test_two_cluster_layout() {
		let d = two_blocks(1.0, 10.0);
		let sil = silhouette(&d, &[0, 0, 1, 1]).unwrap();
		for &s in &sil {
			assert!((s - 0.9).abs() < 1e-12, "expected 0.9, got {}", s);
		}
		let mean = mean_silhouette(&d, &[0, 0, 1, 1]).unwrap();
		assert!((mean - 0.9).abs() < 1e-12);
	}

	#[test]
	fn test_singleton_cluster_scores_zero() {
		let d = two_blocks(1.0, 10.0);
		let sil = silhouette(&d, &[0, 1, 1, 2]).unwrap();
		assert_eq!(sil[0], 0.0);
		assert_eq!(sil[3], 0.0);
	}

	#[test]
	fn test_single_cluster_scores_zero() {
		let d = two_blocks(1.0, 10.0);
		let sil = silhouette(&d, &[0, 0, 0, 0]).unwrap();
		assert!(sil.iter().all(|&s| s == 0.0));
	}

	#[test]
	fn test_label_validation() {
		let d = two_blocks(1.0, 10.0);
		assert!(matches!(
			silhouette(&d, &[0, 0, 1]),
			Err(PamError::UnsupportedInput(_))
		));
		assert!(matches!(
			silhouette(&d, &[1, 1, 2, 2]),
			Err(PamError::UnsupportedInput(_))
		));
		assert!(matches!(
			silhouette(&d, &[0, 0, 2, 2]),
			Err(PamError::UnsupportedInput(_))
		));
	}
}
