//! Multi-branch SWAP optimization.
//!
//! FASTPAM1 always commits the exchange with the steepest TD descent,
//! which can walk into local minima that lower TD but degrade the
//! clustering. This variant keeps the top-B exchanges of every scan in an
//! insertion-sorted window, provisionally reassigns the points under each
//! of them, and commits the one whose clustering scores the highest mean
//! silhouette.

use crate::config::NO_CLUSTER;
use crate::error::PamError;
use crate::fastpam::{Exchange, FastPam};
use crate::matrix::DissimMatrix;
use crate::par_silhouette::par_mean_silhouette_unchecked;
use crate::silhouette::mean_silhouette_unchecked;
use crate::util::{partition_ranges, DistValue};
use log::debug;
use rayon::prelude::*;
use std::ops::Range;

/// Bounded window of the best exchanges seen so far, kept sorted by TD
/// change ascending. Only improving exchanges (negative change) enter.
pub(crate) struct TopWindow<N> {
	cap: usize,
	entries: Vec<Exchange<N>>,
}

impl<N: DistValue> TopWindow<N> {
	pub(crate) fn new(cap: usize) -> Self {
		TopWindow {
			cap,
			entries: Vec::with_capacity(cap),
		}
	}

	/// Insert into rank order, dropping the worst entry when full. On
	/// equal TD change the earlier offer keeps its place.
	pub(crate) fn offer(&mut self, e: Exchange<N>) {
		let mut at = self.entries.len();
		while at > 0 && e.delta < self.entries[at - 1].delta {
			at -= 1;
		}
		if at < self.cap {
			self.entries.insert(at, e);
			self.entries.truncate(self.cap);
		}
	}

	/// Fold another window into this one, preserving the offer order.
	fn merge(mut self, other: TopWindow<N>) -> Self {
		for e in other.entries {
			self.offer(e);
		}
		self
	}

	pub(crate) fn entries(&self) -> &[Exchange<N>] {
		&self.entries
	}
}

impl<'a, M, N> FastPam<'a, M, N>
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	/// Scan the candidates in `range`, offering every improving exchange
	/// (each candidate paired with its best slot) to a local window.
	fn scan_branches(&self, range: Range<usize>, minus: &[N]) -> TopWindow<N> {
		let mut window = TopWindow::new(self.branches);
		let mut delta = vec![N::zero(); self.k];
		for xc in range {
			if self.is_medoid[xc] {
				continue;
			}
			let (slot, total) = self.evaluate_candidate(xc, minus, &mut delta);
			if total < N::zero() {
				window.offer(Exchange {
					delta: total,
					medoid: self.medoids[slot],
					point: xc as u32,
					slot: slot as u32,
				});
			}
		}
		window
	}

	/// Global top-B window over all candidates: each worker fills its own
	/// window over a contiguous range, and the driver merges the B×W
	/// entries back down to B.
	fn explore_branches(&self, minus: &[N]) -> TopWindow<N> {
		if self.nt == 1 {
			return self.scan_branches(0..self.n, minus);
		}
		partition_ranges(self.n, self.nt)
			.into_par_iter()
			.map(|range| self.scan_branches(range, minus))
			.collect::<Vec<_>>()
			.into_iter()
			.reduce(TopWindow::merge)
			.unwrap_or_else(|| TopWindow::new(self.branches))
	}

	/// Rank the retained exchanges by the mean silhouette of the
	/// clustering each would produce and return the best-scoring one.
	/// Ties keep the earlier entry, i.e. the steeper TD descent.
	fn choose_exchange(&self, entries: &[Exchange<N>]) -> Result<Exchange<N>, PamError> {
		let mut meds = self.medoids.clone();
		let mut labels = vec![0u32; self.n];
		let mut best: Option<(f64, Exchange<N>)> = None;
		for e in entries {
			meds.copy_from_slice(&self.medoids);
			meds[e.slot as usize] = e.point;
			for (q, label) in labels.iter_mut().enumerate() {
				let mut dbest = N::infinity();
				let mut slot = NO_CLUSTER;
				for (m, &med) in meds.iter().enumerate() {
					let d = self.d.get(q, med as usize);
					if d < dbest {
						dbest = d;
						slot = m as u32;
					}
				}
				if slot == NO_CLUSTER {
					return Err(PamError::InternalInvariant(format!(
						"point {} has no closest medoid under a provisional exchange",
						q
					)));
				}
				*label = slot;
			}
			let sil = if self.nt == 1 {
				mean_silhouette_unchecked(self.d, &labels, self.k)
			} else {
				par_mean_silhouette_unchecked(self.d, &labels, self.k, self.nt)
			};
			debug!(
				"  exchange {} <-> {} (slot {}): TD-change/N = {}, mean silhouette {:.4}",
				e.medoid,
				e.point,
				e.slot,
				e.delta.to_f64() / self.n as f64,
				sil
			);
			match best {
				Some((s, _)) if s >= sil => {}
				_ => best = Some((sil, *e)),
			}
		}
		best.map(|(_, e)| e)
			.ok_or_else(|| PamError::InternalInvariant("no exchange chosen".to_string()))
	}

	/// The multi-branch iteration loop. Termination conditions are those
	/// of FASTPAM1, applied to the committed exchange.
	pub(crate) fn run_multibranch(&mut self) -> Result<(), PamError> {
		if self.k == 1 {
			debug!("single medoid, initialization is already optimal");
			return Ok(());
		}
		debug!(
			"TWOBRANCH optimization, window of {}, {} worker(s)",
			self.branches, self.nt
		);
		loop {
			let minus = self.removal_loss();
			let window = self.explore_branches(&minus);
			if window.entries().is_empty() {
				debug!(
					"no improving exchange, final TD/N = {}",
					self.td.to_f64() / self.n as f64
				);
				break;
			}
			let chosen = self.choose_exchange(window.entries())?;
			self.swap_and_relax(&chosen)?;
			self.record_iteration(chosen.delta);
			if self.td < N::zero() {
				return Err(PamError::InternalInvariant(
					"TD cannot become negative".to_string(),
				));
			}
			debug!(
				"iteration {}: slot {} (point {}) swapped for point {}, TD-change/N = {}, TD/N = {}, {} reassigned",
				self.n_iter,
				chosen.slot,
				chosen.medoid,
				chosen.point,
				chosen.delta.to_f64() / self.n as f64,
				self.td.to_f64() / self.n as f64,
				self.npch
			);
			if chosen.delta.abs() <= self.tol {
				debug!("TD change within tolerance, stopping");
				break;
			}
			if self.n_iter >= self.max_iter {
				debug!("iteration limit reached");
				break;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{FastPamConfig, InitMethod, OptMethod};
	use crate::matrix::PackedSymmetric;

	#[test]
	fn test_window_keeps_top_entries() {
		let xcg = |delta: f64, point: u32| Exchange {
			delta,
			medoid: 0,
			point,
			slot: 0,
		};
		let mut w = TopWindow::new(2);
		w.offer(xcg(-1.0, 1));
		w.offer(xcg(-3.0, 2));
		w.offer(xcg(-2.0, 3));
		w.offer(xcg(-0.5, 4));
		let deltas: Vec<f64> = w.entries().iter().map(|e| e.delta).collect();
		assert_eq!(deltas, vec![-3.0, -2.0]);
		// an equal delta does not displace the earlier holder
		w.offer(xcg(-2.0, 9));
		assert_eq!(w.entries()[1].point, 3);
	}

	/// Two tight pairs {0,1} and {2,3}, a hub point 4 near everything,
	/// and point 5 serving cluster {2,3} well. Promoting the hub drops TD
	/// the most but collapses the partition quality; promoting point 5
	/// drops TD less and keeps two clean clusters.
	fn decoy_matrix() -> PackedSymmetric<f64> {
		let mut d = PackedSymmetric::zeros(6);
		d.set(0, 1, 1.0);
		d.set(2, 3, 1.0);
		for (i, j) in [(0, 2), (0, 3), (1, 2), (1, 3)] {
			d.set(i, j, 10.0);
		}
		for i in [0usize, 1, 2, 3, 5] {
			d.set(4, i, 0.55);
		}
		d.set(5, 2, 0.4);
		d.set(5, 3, 0.4);
		d.set(5, 0, 10.0);
		d.set(5, 1, 10.0);
		d
	}

	#[test]
	fn test_silhouette_overrides_steepest_descent() {
		let d = decoy_matrix();
		let cfg = FastPamConfig::default()
			.with_init(InitMethod::Previous)
			.with_max_iter(1)
			.with_threads(-1);
		// FASTPAM1 takes the steepest TD descent: the hub replaces medoid 0
		let mut greedy = FastPam::new(&d, 2, cfg.clone()).unwrap();
		greedy.init(Some(&[0, 2])).unwrap();
		greedy.run(OptMethod::FastPam1).unwrap();
		let mut meds = greedy.medoids().to_vec();
		meds.sort_unstable();
		assert_eq!(meds, vec![2, 4]);
		// the multi-branch variant prefers the silhouette-preserving swap
		let mut branched = FastPam::new(&d, 2, cfg).unwrap();
		branched.init(Some(&[0, 2])).unwrap();
		branched.run(OptMethod::TwoBranch).unwrap();
		let mut meds = branched.medoids().to_vec();
		meds.sort_unstable();
		assert_eq!(meds, vec![0, 5]);
		assert_eq!(branched.num_iterations(), 1);
	}

	#[test]
	fn test_matches_fastpam1_when_unambiguous() {
		// on a clean two-cluster matrix both optimizers find the same optimum
		let mut d = PackedSymmetric::zeros(4);
		d.set(0, 1, 1.0);
		d.set(2, 3, 1.0);
		for (i, j) in [(0, 2), (0, 3), (1, 2), (1, 3)] {
			d.set(i, j, 10.0);
		}
		let cfg = FastPamConfig::default().with_init(InitMethod::Previous);
		let mut a = FastPam::new(&d, 2, cfg.clone()).unwrap();
		a.init(Some(&[0, 1])).unwrap();
		a.run(OptMethod::FastPam1).unwrap();
		let mut b = FastPam::new(&d, 2, cfg).unwrap();
		b.init(Some(&[0, 1])).unwrap();
		b.run(OptMethod::TwoBranch).unwrap();
		let (mut ma, mut mb) = (a.medoids().to_vec(), b.medoids().to_vec());
		ma.sort_unstable();
		mb.sort_unstable();
		assert_eq!(ma, mb);
		assert_eq!(a.td(), b.td());
	}
}
