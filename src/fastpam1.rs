//! FASTPAM1 SWAP optimization, after Schubert & Rousseeuw (2021),
//! Algorithm 3: the removal cost of every medoid is computed once per
//! iteration and amortized over all candidates, so a full scan costs
//! O(n²) instead of O(k n²).

use crate::error::PamError;
use crate::fastpam::{Exchange, FastPam};
use crate::matrix::DissimMatrix;
use crate::util::{argmin, partition_ranges, DistValue};
use log::debug;
use rayon::prelude::*;
use std::ops::Range;

/// Deterministic reduction order: smaller TD change wins, ties go to the
/// lower candidate point, then to the lower slot.
fn improves<N: DistValue>(b: &Exchange<N>, a: &Exchange<N>) -> bool {
	if b.delta != a.delta {
		return b.delta < a.delta;
	}
	if b.point != a.point {
		return b.point < a.point;
	}
	b.slot < a.slot
}

impl<'a, M, N> FastPam<'a, M, N>
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	/// Removal cost of each medoid slot: the TD increase when the slot's
	/// medoid disappears and its members fall back to their second
	/// choice. Every entry is non-negative.
	pub(crate) fn removal_loss(&self) -> Vec<N> {
		let mut minus = vec![N::zero(); self.k];
		for q in 0..self.n {
			minus[self.nearest[q] as usize] += self.dsecond[q] - self.dnearest[q];
		}
		minus
	}

	/// Net TD change of promoting the non-medoid `xc`, together with the
	/// best slot to vacate for it. `delta` is caller-owned scratch of
	/// length k, overwritten on every call.
	pub(crate) fn evaluate_candidate(
		&self,
		xc: usize,
		minus: &[N],
		delta: &mut [N],
	) -> (usize, N) {
		delta.copy_from_slice(minus);
		let mut plus = N::zero();
		for x0 in 0..self.n {
			let d = self.d.get(x0, xc);
			if d < self.dnearest[x0] {
				// xc captures x0; its old medoid loses the member
				plus += d - self.dnearest[x0];
				delta[self.nearest[x0] as usize] += self.dnearest[x0] - self.dsecond[x0];
			} else if d < self.dsecond[x0] {
				// x0 stays, but xc replaces its second choice
				delta[self.nearest[x0] as usize] += d - self.dsecond[x0];
			}
		}
		let (slot, _) = argmin(delta);
		delta[slot] += plus;
		(slot, delta[slot])
	}

	/// Scan the candidate points in `range` and keep the locally best
	/// improving exchange. Ascending order plus a strict comparison keep
	/// the lowest candidate on ties.
	fn scan_exchanges(&self, range: Range<usize>, minus: &[N]) -> Option<Exchange<N>> {
		let mut delta = vec![N::zero(); self.k];
		let mut best: Option<Exchange<N>> = None;
		for xc in range {
			if self.is_medoid[xc] {
				continue;
			}
			let (slot, total) = self.evaluate_candidate(xc, minus, &mut delta);
			if total < best.map_or(N::zero(), |b| b.delta) {
				best = Some(Exchange {
					delta: total,
					medoid: self.medoids[slot],
					point: xc as u32,
					slot: slot as u32,
				});
			}
		}
		best
	}

	/// Best improving exchange over all candidates, or `None` at a local
	/// optimum. Workers scan disjoint contiguous ranges with private
	/// scratch; the driver reduces their results deterministically.
	fn best_exchange(&self, minus: &[N]) -> Option<Exchange<N>> {
		if self.nt == 1 {
			return self.scan_exchanges(0..self.n, minus);
		}
		partition_ranges(self.n, self.nt)
			.into_par_iter()
			.map(|range| self.scan_exchanges(range, minus))
			.collect::<Vec<_>>()
			.into_iter()
			.flatten()
			.reduce(|a, b| if improves(&b, &a) { b } else { a })
	}

	/// The FASTPAM1 iteration loop. Halts at a local optimum, at the
	/// iteration limit, or once the TD change falls within the tolerance.
	pub(crate) fn run_fastpam1(&mut self) -> Result<(), PamError> {
		let n = self.n;
		if self.k == 1 {
			debug!("single medoid, initialization is already optimal");
			return Ok(());
		}
		debug!("FASTPAM1 optimization, {} worker(s)", self.nt);
		loop {
			let minus = self.removal_loss();
			let best = match self.best_exchange(&minus) {
				Some(b) => b,
				None => {
					debug!(
						"no improving exchange, final TD/N = {}",
						self.td.to_f64() / n as f64
					);
					break;
				}
			};
			self.swap_and_relax(&best)?;
			self.record_iteration(best.delta);
			if self.td < N::zero() {
				return Err(PamError::InternalInvariant(
					"TD cannot become negative".to_string(),
				));
			}
			debug!(
				"iteration {}: slot {} (point {}) swapped for point {}, TD-change/N = {}, TD/N = {}, {} reassigned",
				self.n_iter,
				best.slot,
				best.medoid,
				best.point,
				best.delta.to_f64() / n as f64,
				self.td.to_f64() / n as f64,
				self.npch
			);
			if best.delta.abs() <= self.tol {
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
