//! Recompute the PAM objective from a stored clustering.

use crate::error::PamError;
use crate::matrix::DissimMatrix;
use crate::util::DistValue;

/// TD/N of a clustering: the mean dissimilarity between each point and
/// its assigned medoid. Useful to audit a stored medoid/assignment pair
/// against the matrix it was computed from.
///
/// * `medoids` - point indices of the k medoids
/// * `labels` - for each point, the slot of its medoid in `medoids`
/// * `mat` - the pairwise dissimilarity matrix
pub fn mean_td<M, N>(medoids: &[u32], labels: &[u32], mat: &M) -> Result<f64, PamError>
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
	for &m in medoids {
		if m as usize >= n {
			return Err(PamError::UnsupportedInput(format!(
				"medoid index {} out of range for {} points",
				m, n
			)));
		}
	}
	let mut td = 0.0;
	for (q, &l) in labels.iter().enumerate() {
		let med = *medoids.get(l as usize).ok_or_else(|| {
			PamError::UnsupportedInput(format!(
				"point {} is labelled {} but there are only {} medoids",
				q,
				l,
				medoids.len()
			))
		})?;
		td += mat.get(q, med as usize).to_f64();
	}
	Ok(td / n as f64)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matrix::PackedSymmetric;

	#[test]
	fn test_mean_td() {
		// the 4-point chain: D(i,j) = |i-j|
		let d =
			PackedSymmetric::from_packed(4, vec![0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 3.0, 2.0, 1.0, 0.0])
				.unwrap();
		let td = mean_td(&[1, 2], &[0, 0, 1, 1], &d).unwrap();
		assert_eq!(td, 0.5);
	}

	#[test]
	fn test_mean_td_validation() {
		let d = PackedSymmetric::from_packed(2, vec![0.0, 1.0, 0.0]).unwrap();
		assert!(mean_td(&[0], &[0], &d).is_err());
		assert!(mean_td(&[5], &[0, 0], &d).is_err());
		assert!(mean_td(&[0], &[0, 1], &d).is_err());
	}
}
