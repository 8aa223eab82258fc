//! Silhouette evaluation of a clustering (parallel implementation).
//!
//! Workers own contiguous point ranges; the cluster populations are
//! counted once serially and shared read-only. Each point's value is
//! computed exactly as in the serial version, so both implementations
//! agree bit for bit.

use crate::error::PamError;
use crate::matrix::DissimMatrix;
use crate::silhouette::{check_labels, point_silhouette};
use crate::util::{partition_ranges, worker_count, DistValue};
use rayon::prelude::*;

/// Compute the silhouette value of every point of a clustering, with the
/// point loop partitioned over `threads` workers (sentinel semantics of
/// [`worker_count`]). Falls back to the serial path for small inputs.
///
/// See [`silhouette`](crate::silhouette) for the contract.
pub fn par_silhouette<M, N>(mat: &M, labels: &[u32], threads: i32) -> Result<Vec<f64>, PamError>
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	let (k, hist) = check_labels(mat, labels)?;
	let n = mat.len();
	let nt = worker_count(threads, n);
	if nt == 1 {
		let mut sums = vec![0.0; k];
		return Ok((0..n)
			.map(|q| point_silhouette(mat, labels, &hist, &mut sums, q))
			.collect());
	}
	let parts: Vec<Vec<f64>> = partition_ranges(n, nt)
		.into_par_iter()
		.map(|range| {
			let mut sums = vec![0.0; k];
			range
				.map(|q| point_silhouette(mat, labels, &hist, &mut sums, q))
				.collect()
		})
		.collect();
	Ok(parts.concat())
}

/// Average silhouette over all points, parallel implementation.
pub fn par_mean_silhouette<M, N>(mat: &M, labels: &[u32], threads: i32) -> Result<f64, PamError>
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	let sil = par_silhouette(mat, labels, threads)?;
	Ok(sil.iter().sum::<f64>() / sil.len() as f64)
}

/// Parallel twin of `mean_silhouette_unchecked`, for the multi-branch
/// exchange ranking. `nt` is an already resolved worker count.
pub(crate) fn par_mean_silhouette_unchecked<M, N>(
	mat: &M,
	labels: &[u32],
	k: usize,
	nt: usize,
) -> f64
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	let n = mat.len();
	let mut hist = vec![0u64; k];
	for &l in labels {
		hist[l as usize] += 1;
	}
	let total: f64 = partition_ranges(n, nt)
		.into_par_iter()
		.map(|range| {
			let mut sums = vec![0.0; k];
			range
				.map(|q| point_silhouette(mat, labels, &hist, &mut sums, q))
				.sum::<f64>()
		})
		.sum();
	total / n as f64
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matrix::PackedSymmetric;
	use crate::silhouette::silhouette;
	use rand::{rngs::StdRng, Rng, SeedableRng};

	#[test]
	fn test_matches_serial_on_large_input() {
		// n >= 1000 so the parallel path is actually taken
		let n = 1024;
		let mut rng = StdRng::seed_from_u64(99);
		let mut d = PackedSymmetric::<f64>::zeros(n);
		for i in 0..n {
			for j in 0..i {
				d.set(i, j, rng.gen_range(0.1..10.0));
			}
		}
		let labels: Vec<u32> = (0..n).map(|q| (q % 5) as u32).collect();
		let serial = silhouette(&d, &labels).unwrap();
		let parallel = par_silhouette(&d, &labels, 4).unwrap();
		assert_eq!(serial.len(), parallel.len());
		for (s, p) in serial.iter().zip(parallel.iter()) {
			assert_eq!(s, p, "serial and parallel silhouettes must agree");
		}
	}
}
