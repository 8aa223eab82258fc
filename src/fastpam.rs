//! The FastPAM clustering engine: k-medoids on a precomputed
//! dissimilarity matrix.
//!
//! The engine owns the whole clustering state (medoid vector, per-point
//! nearest/second-nearest caches, total deviation) and moves through
//! Constructed → Initialized → Optimized. Workers only ever read this
//! state during a scan; the driver alone mutates it between iterations.

use crate::config::{FastPamConfig, InitMethod, OptMethod, MAX_ITER, MAX_MEDOIDS, NO_CLUSTER};
use crate::error::PamError;
use crate::matrix::{validate_dissim, DissimMatrix, NamedColumn};
use crate::util::{partition_ranges, worker_count, DistValue};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::ops::Range;
use std::time::Instant;

/// Stop once the TD change of an iteration falls below this fraction of
/// the initial TD. Guards against the optimizer cycling on points that
/// flip between clusters by amounts near the float resolution.
const TOL_FACTOR: f64 = 1e-6;

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Constructed,
	Initialized,
	Optimized,
}

/// One candidate exchange between a medoid and a non-medoid point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Exchange<N> {
	/// TD change the exchange would cause; negative is an improvement.
	pub(crate) delta: N,
	/// Point index of the medoid to retire.
	pub(crate) medoid: u32,
	/// Point index of the replacement.
	pub(crate) point: u32,
	/// Slot of the retired medoid in the medoid vector.
	pub(crate) slot: u32,
}

/// Partitioning Around Medoids with the FastPAM1 SWAP iteration of
/// Schubert & Rousseeuw (2021), plus a multi-branch variant ranking the
/// top exchanges by silhouette.
///
/// * type `M` - dissimilarity matrix type, e.g. [`PackedSymmetric`](crate::PackedSymmetric)
///   or `ndarray::Array2`
/// * type `N` - distance element type, `f32` or `f64`
///
/// ## Example
/// ```
/// use parpam::{FastPam, FastPamConfig, OptMethod, PackedSymmetric};
/// let d = PackedSymmetric::from_packed(
/// 	4,
/// 	vec![0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 3.0, 2.0, 1.0, 0.0],
/// )
/// .unwrap();
/// let mut pam = FastPam::new(&d, 2, FastPamConfig::default()).unwrap();
/// pam.init(None).unwrap();
/// pam.run(OptMethod::FastPam1).unwrap();
/// assert_eq!(pam.td() / 4.0, 0.5);
/// ```
pub struct FastPam<'a, M, N: DistValue> {
	pub(crate) d: &'a M,
	pub(crate) n: usize,
	pub(crate) k: usize,
	init_method: InitMethod,
	pub(crate) max_iter: u32,
	pub(crate) nt: usize,
	seed: Option<u64>,
	pub(crate) branches: usize,
	phase: Phase,
	pub(crate) tol: N,
	pub(crate) medoids: Vec<u32>,
	pub(crate) is_medoid: Vec<bool>,
	pub(crate) nearest: Vec<u32>,
	pub(crate) dnearest: Vec<N>,
	pub(crate) dsecond: Vec<N>,
	/// The objective, kept as the raw sum of nearest distances.
	pub(crate) td: N,
	/// Points that changed cluster in the latest committed exchange.
	pub(crate) npch: u32,
	td_history: Vec<N>,
	reassign_history: Vec<u32>,
	init_time: f64,
	opt_time: f64,
	pub(crate) n_iter: u32,
}

impl<'a, M, N> FastPam<'a, M, N>
where
	N: DistValue,
	M: DissimMatrix<N>,
{
	/// Validate the matrix and reserve the clustering state.
	///
	/// ## Errors
	///
	/// * `InvalidDissimilarity` when D has a non-zero diagonal or a
	///   non-positive off-diagonal entry
	/// * `UnsupportedInput` when k or the iteration limit is out of range
	pub fn new(d: &'a M, k: usize, cfg: FastPamConfig) -> Result<Self, PamError> {
		validate_dissim(d)?;
		let n = d.len();
		if n > u32::MAX as usize {
			return Err(PamError::UnsupportedInput(format!(
				"{} points exceed the index range",
				n
			)));
		}
		if k == 0 || k > n {
			return Err(PamError::UnsupportedInput(format!(
				"cannot place {} medoids among {} points",
				k, n
			)));
		}
		if k as u64 > MAX_MEDOIDS as u64 {
			return Err(PamError::UnsupportedInput(format!(
				"at most {} medoids are supported",
				MAX_MEDOIDS
			)));
		}
		if cfg.max_iter > MAX_ITER - 1 {
			return Err(PamError::UnsupportedInput(format!(
				"iteration limit is capped at {}",
				MAX_ITER - 1
			)));
		}
		if cfg.branches == 0 {
			return Err(PamError::UnsupportedInput(
				"the exchange window must hold at least one entry".to_string(),
			));
		}
		let nt = worker_count(cfg.threads, n);
		Ok(FastPam {
			d,
			n,
			k,
			init_method: cfg.init,
			max_iter: cfg.max_iter,
			nt,
			seed: cfg.seed,
			branches: cfg.branches,
			phase: Phase::Constructed,
			tol: N::zero(),
			medoids: Vec::with_capacity(k),
			is_medoid: vec![false; n],
			nearest: vec![NO_CLUSTER; n],
			dnearest: vec![N::infinity(); n],
			dsecond: vec![N::infinity(); n],
			td: N::zero(),
			npch: 0,
			td_history: Vec::new(),
			reassign_history: Vec::new(),
			init_time: 0.0,
			opt_time: 0.0,
			n_iter: 0,
		})
	}

	/// Produce the initial medoid set with the configured method and fill
	/// the whole clustering state from it. `previous` is consumed only by
	/// [`InitMethod::Previous`].
	pub fn init(&mut self, previous: Option<&[u32]>) -> Result<(), PamError> {
		let start = Instant::now();
		self.medoids.clear();
		self.is_medoid.iter_mut().for_each(|b| *b = false);
		match self.init_method {
			InitMethod::Previous => {
				let list = previous.ok_or_else(|| {
					PamError::BadMedoidsInput(
						"PREV initialization requires a medoid list".to_string(),
					)
				})?;
				self.init_previous(list)?;
			}
			InitMethod::Build => self.build()?,
			InitMethod::Lab => self.lab()?,
		}
		self.refresh_assignments()?;
		self.tol = self.td * N::from_f64(TOL_FACTOR);
		self.phase = Phase::Initialized;
		self.init_time = start.elapsed().as_secs_f64();
		info!(
			"{} initialization done in {:.3} s, TD/N = {}",
			self.init_method,
			self.init_time,
			self.td.to_f64() / self.n as f64
		);
		Ok(())
	}

	/// Run the configured number of SWAP iterations with the chosen
	/// optimizer. A zero iteration limit makes this a no-op beyond the
	/// state transition.
	pub fn run(&mut self, opt: OptMethod) -> Result<(), PamError> {
		if self.phase == Phase::Constructed {
			return Err(PamError::NotInitialized);
		}
		let start = Instant::now();
		if self.max_iter > 0 {
			match opt {
				OptMethod::FastPam1 => self.run_fastpam1()?,
				OptMethod::TwoBranch => self.run_multibranch()?,
			}
		}
		self.phase = Phase::Optimized;
		self.opt_time = start.elapsed().as_secs_f64();
		info!(
			"{} optimization done in {:.3} s, {} iterations, TD/N = {}",
			opt,
			self.opt_time,
			self.n_iter,
			self.td.to_f64() / self.n as f64
		);
		Ok(())
	}

	// ---- initialization methods ----

	fn init_previous(&mut self, list: &[u32]) -> Result<(), PamError> {
		if list.len() != self.k {
			return Err(PamError::BadMedoidsInput(format!(
				"got {} medoids, expected {}",
				list.len(),
				self.k
			)));
		}
		let mut seen = vec![false; self.n];
		for &m in list {
			if m as usize >= self.n {
				return Err(PamError::BadMedoidsInput(format!(
					"medoid index {} out of range for {} points",
					m, self.n
				)));
			}
			if seen[m as usize] {
				return Err(PamError::BadMedoidsInput(format!(
					"medoid {} listed twice",
					m
				)));
			}
			seen[m as usize] = true;
		}
		self.medoids.extend_from_slice(list);
		Ok(())
	}

	/// Greedy PAM BUILD. The candidate scans run serially or partitioned
	/// over the workers; the driver reduces the per-worker results by the
	/// most negative cost change, ties to the lowest point index.
	fn build(&mut self) -> Result<(), PamError> {
		debug!("BUILD initialization, {} worker(s)", self.nt);
		let ranges = partition_ranges(self.n, self.nt);
		let this: &Self = self;
		let first = if self.nt == 1 {
			this.best_row_sum(0..self.n)
		} else {
			ranges
				.par_iter()
				.map(|r| this.best_row_sum(r.clone()))
				.collect::<Vec<_>>()
				.into_iter()
				.flatten()
				.reduce(|a, b| if b.1 < a.1 { b } else { a })
		};
		let (first, sum) = first
			.ok_or_else(|| PamError::InternalInvariant("no first medoid found".to_string()))?;
		self.medoids.push(first as u32);
		self.is_medoid[first] = true;
		for q in 0..self.n {
			self.nearest[q] = 0;
			self.dnearest[q] = self.d.get(q, first);
		}
		let mut td = sum;
		debug!("medoid 0 is point {}, TD/N = {}", first, td / self.n as f64);
		for next in 1..self.k {
			let this: &Self = self;
			let best = if self.nt == 1 {
				this.best_build_candidate(0..self.n)
			} else {
				ranges
					.par_iter()
					.map(|r| this.best_build_candidate(r.clone()))
					.collect::<Vec<_>>()
					.into_iter()
					.flatten()
					.reduce(|a, b| if b.1 < a.1 { b } else { a })
			};
			let (cand, change) = best.ok_or_else(|| {
				PamError::BuildStalled(format!(
					"no candidate lowers TD when placing medoid {}",
					next
				))
			})?;
			self.medoids.push(cand as u32);
			self.is_medoid[cand] = true;
			td += change;
			if td < 0.0 {
				return Err(PamError::InternalInvariant(
					"TD cannot become negative".to_string(),
				));
			}
			let mut updated = 0usize;
			for q in 0..self.n {
				let d = self.d.get(q, cand);
				if d < self.dnearest[q] {
					self.dnearest[q] = d;
					self.nearest[q] = next as u32;
					updated += 1;
				}
			}
			debug!(
				"medoid {} is point {}, {} points reassigned, TD/N = {}",
				next,
				cand,
				updated,
				td / self.n as f64
			);
		}
		Ok(())
	}

	/// Point with the smallest sum of dissimilarities to all others,
	/// within `range`. The first strictly smaller sum wins, so the lowest
	/// index is kept on ties.
	fn best_row_sum(&self, range: Range<usize>) -> Option<(usize, f64)> {
		let mut best: Option<(usize, f64)> = None;
		for r in range {
			let mut sum = 0.0;
			for c in 0..self.n {
				sum += self.d.get(r, c).to_f64();
			}
			match best {
				Some((_, s)) if s <= sum => {}
				_ => best = Some((r, sum)),
			}
		}
		best
	}

	/// Best BUILD candidate within `range`: the non-medoid whose adoption
	/// changes TD the most negatively. Candidates that do not lower TD
	/// are not eligible.
	fn best_build_candidate(&self, range: Range<usize>) -> Option<(usize, f64)> {
		let mut best: Option<(usize, f64)> = None;
		for cand in range {
			if self.is_medoid[cand] {
				continue;
			}
			let mut change = 0.0f64;
			for other in 0..self.n {
				if other == cand {
					continue;
				}
				let d = self.d.get(cand, other).to_f64();
				let dn = self.dnearest[other].to_f64();
				if d < dn {
					change += d - dn;
				}
			}
			// the candidate itself would sit at distance 0 from its medoid
			change -= self.dnearest[cand].to_f64();
			if change < 0.0 {
				match best {
					Some((_, c)) if c <= change => {}
					_ => best = Some((cand, change)),
				}
			}
		}
		best
	}

	/// Linear approximative BUILD: every greedy step is evaluated on a
	/// fresh random subsample of `20 + 2 * ceil(sqrt(n))` non-medoids
	/// instead of the full point set.
	fn lab(&mut self) -> Result<(), PamError> {
		let mut rng = match self.seed {
			Some(s) => StdRng::seed_from_u64(s),
			None => StdRng::from_entropy(),
		};
		let sample_size = (20 + 2 * (self.n as f64).sqrt().ceil() as usize).min(self.n);
		debug!("LAB initialization, sample size {}", sample_size);
		let sample = rand::seq::index::sample(&mut rng, self.n, sample_size).into_vec();
		let mut best: Option<(usize, f64)> = None;
		for &r in &sample {
			let mut sum = 0.0;
			for &c in &sample {
				if c != r {
					sum += self.d.get(r, c).to_f64();
				}
			}
			match best {
				Some((_, s)) if s <= sum => {}
				_ => best = Some((r, sum)),
			}
		}
		let (first, _) =
			best.ok_or_else(|| PamError::InternalInvariant("empty LAB sample".to_string()))?;
		self.medoids.push(first as u32);
		self.is_medoid[first] = true;
		let mut td = 0.0;
		for q in 0..self.n {
			self.nearest[q] = 0;
			let d = self.d.get(q, first);
			self.dnearest[q] = d;
			td += d.to_f64();
		}
		debug!("medoid 0 is point {}, TD/N = {}", first, td / self.n as f64);
		for next in 1..self.k {
			let sample = self.sample_non_medoids(&mut rng, sample_size);
			let mut best: Option<(usize, f64)> = None;
			for &cand in &sample {
				let mut change = 0.0;
				for &x in &sample {
					if x == cand {
						continue;
					}
					let delta = self.d.get(x, cand).to_f64() - self.dnearest[x].to_f64();
					if delta < 0.0 {
						change += delta;
					}
				}
				match best {
					Some((_, c)) if c <= change => {}
					_ => best = Some((cand, change)),
				}
			}
			let (cand, _) = best
				.ok_or_else(|| PamError::InternalInvariant("LAB sample exhausted".to_string()))?;
			self.medoids.push(cand as u32);
			self.is_medoid[cand] = true;
			let mut updated = 0usize;
			for q in 0..self.n {
				let d = self.d.get(q, cand);
				if d < self.dnearest[q] {
					td += d.to_f64() - self.dnearest[q].to_f64();
					self.dnearest[q] = d;
					self.nearest[q] = next as u32;
					updated += 1;
				}
			}
			if td < 0.0 {
				return Err(PamError::InternalInvariant(
					"TD cannot become negative".to_string(),
				));
			}
			debug!(
				"medoid {} is point {}, {} points reassigned, TD/N = {}",
				next,
				cand,
				updated,
				td / self.n as f64
			);
		}
		Ok(())
	}

	/// Uniform sample without replacement from the points that are not
	/// yet medoids, at most `sample_size` of them.
	fn sample_non_medoids(&self, rng: &mut StdRng, sample_size: usize) -> Vec<usize> {
		let pool: Vec<usize> = (0..self.n).filter(|&q| !self.is_medoid[q]).collect();
		let take = sample_size.min(pool.len());
		rand::seq::index::sample(rng, pool.len(), take)
			.into_iter()
			.map(|i| pool[i])
			.collect()
	}

	// ---- shared state maintenance ----

	/// Rebuild `is_medoid`, `nearest`, `dnearest`, `dsecond` and TD from
	/// the medoid vector alone. Ties go to the lower slot.
	fn refresh_assignments(&mut self) -> Result<(), PamError> {
		self.is_medoid.iter_mut().for_each(|b| *b = false);
		for &m in &self.medoids {
			self.is_medoid[m as usize] = true;
		}
		let mut td = 0.0f64;
		for q in 0..self.n {
			let (slot, dn, ds) = self.closest_pair(q)?;
			self.nearest[q] = slot;
			self.dnearest[q] = dn;
			self.dsecond[q] = ds;
			td += dn.to_f64();
		}
		self.td = N::from_f64(td);
		if self.td < N::zero() {
			return Err(PamError::InternalInvariant(
				"negative TD after assignment".to_string(),
			));
		}
		Ok(())
	}

	/// Slot and distance of the closest medoid of `q`, plus the distance
	/// of the second closest (infinite when k = 1).
	fn closest_pair(&self, q: usize) -> Result<(u32, N, N), PamError> {
		let mut best = N::infinity();
		let mut second = N::infinity();
		let mut slot = NO_CLUSTER;
		for (m, &med) in self.medoids.iter().enumerate() {
			let d = self.d.get(q, med as usize);
			if d < best {
				second = best;
				best = d;
				slot = m as u32;
			} else if d < second {
				second = d;
			}
		}
		if slot == NO_CLUSTER {
			return Err(PamError::InternalInvariant(format!(
				"point {} has no closest medoid",
				q
			)));
		}
		Ok((slot, best, second))
	}

	/// Commit an exchange: retire the medoid in its slot, promote the new
	/// point, rebuild the nearest/second-nearest caches and count the
	/// points that changed cluster.
	pub(crate) fn swap_and_relax(&mut self, xcg: &Exchange<N>) -> Result<(), PamError> {
		if self.medoids[xcg.slot as usize] != xcg.medoid {
			return Err(PamError::InternalInvariant(format!(
				"medoid {} is not at slot {}",
				xcg.medoid, xcg.slot
			)));
		}
		self.is_medoid[xcg.medoid as usize] = false;
		self.is_medoid[xcg.point as usize] = true;
		self.medoids[xcg.slot as usize] = xcg.point;
		self.npch = 0;
		for q in 0..self.n {
			let (slot, dn, ds) = self.closest_pair(q)?;
			if self.nearest[q] != slot {
				self.npch += 1;
			}
			self.nearest[q] = slot;
			self.dnearest[q] = dn;
			self.dsecond[q] = ds;
		}
		Ok(())
	}

	/// Book-keeping after a committed exchange: apply the TD change and
	/// append to the histories. The history stores TD/N, not the raw sum.
	pub(crate) fn record_iteration(&mut self, delta: N) {
		self.td = self.td + delta;
		self.n_iter += 1;
		self.td_history
			.push(N::from_f64(self.td.to_f64() / self.n as f64));
		self.reassign_history.push(self.npch);
	}

	// ---- accessors ----

	/// Point indices of the current medoids, one per slot.
	pub fn medoids(&self) -> &[u32] {
		&self.medoids
	}

	/// Cluster label of every point: the slot of its closest medoid.
	pub fn assignment(&self) -> &[u32] {
		&self.nearest
	}

	/// The medoids as an owning column vector, named after the matrix's
	/// point names when it has any.
	pub fn medoid_column(&self) -> NamedColumn<u32> {
		match self.d.names() {
			Some(names) => {
				let selected = self
					.medoids
					.iter()
					.map(|&m| names[m as usize].clone())
					.collect();
				NamedColumn::with_names(self.medoids.clone(), selected)
					.unwrap_or_else(|_| NamedColumn::new(self.medoids.clone()))
			}
			None => NamedColumn::new(self.medoids.clone()),
		}
	}

	/// The assignment as an owning column vector, named after the
	/// matrix's point names when it has any.
	pub fn assignment_column(&self) -> NamedColumn<u32> {
		match self.d.names() {
			Some(names) => NamedColumn::with_names(self.nearest.clone(), names.to_vec())
				.unwrap_or_else(|_| NamedColumn::new(self.nearest.clone())),
			None => NamedColumn::new(self.nearest.clone()),
		}
	}

	/// The objective as the raw sum of nearest distances; divide by the
	/// number of points for the reported TD/N.
	pub fn td(&self) -> N {
		self.td
	}

	/// TD/N after each committed SWAP iteration.
	pub fn td_history(&self) -> &[N] {
		&self.td_history
	}

	/// Number of points that changed cluster in each SWAP iteration.
	pub fn reassign_history(&self) -> &[u32] {
		&self.reassign_history
	}

	/// Wall-clock seconds spent in `init`.
	pub fn init_time(&self) -> f64 {
		self.init_time
	}

	/// Wall-clock seconds spent in `run`.
	pub fn opt_time(&self) -> f64 {
		self.opt_time
	}

	/// Committed SWAP iterations; equals the history length.
	pub fn num_iterations(&self) -> u32 {
		self.n_iter
	}

	pub fn is_initialized(&self) -> bool {
		self.phase != Phase::Constructed
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{FastPamConfig, InitMethod, OptMethod};
	use crate::matrix::PackedSymmetric;
	use rand::{rngs::StdRng, Rng, SeedableRng};

	/// D(i, j) = |i - j| on a chain of n points.
	pub(crate) fn chain(n: usize) -> PackedSymmetric<f64> {
		let mut d = PackedSymmetric::zeros(n);
		for i in 0..n {
			for j in 0..i {
				d.set(i, j, (i - j) as f64);
			}
		}
		d
	}

	pub(crate) fn random_dissim(n: usize, seed: u64) -> PackedSymmetric<f64> {
		let mut rng = StdRng::seed_from_u64(seed);
		let mut d = PackedSymmetric::zeros(n);
		for i in 0..n {
			for j in 0..i {
				d.set(i, j, rng.gen_range(0.1..10.0));
			}
		}
		d
	}

	#[test]
	fn test_build_on_chain() {
		let d = chain(4);
		let mut pam = FastPam::new(&d, 2, FastPamConfig::default().with_threads(-1)).unwrap();
		pam.init(None).unwrap();
		assert_eq!(pam.medoids(), &[1, 2]);
		assert_eq!(pam.td() / 4.0, 0.5);
		pam.run(OptMethod::FastPam1).unwrap();
		assert_eq!(pam.num_iterations(), 0, "BUILD result is already optimal");
		assert_eq!(pam.medoids(), &[1, 2]);
	}

	#[test]
	fn test_previous_echo() {
		// PREV with a zero iteration limit returns the medoids verbatim
		let d = chain(15);
		let cfg = FastPamConfig::default()
			.with_init(InitMethod::Previous)
			.with_max_iter(0);
		let mut pam = FastPam::new(&d, 3, cfg).unwrap();
		pam.init(Some(&[3, 7, 12])).unwrap();
		pam.run(OptMethod::FastPam1).unwrap();
		assert_eq!(pam.medoids(), &[3, 7, 12]);
		assert_eq!(pam.num_iterations(), 0);
		assert!(pam.td_history().is_empty());
	}

	#[test]
	fn test_previous_validation() {
		let d = chain(10);
		let cfg = FastPamConfig::default().with_init(InitMethod::Previous);
		let mut pam = FastPam::new(&d, 3, cfg.clone()).unwrap();
		assert!(matches!(
			pam.init(Some(&[1, 2])),
			Err(PamError::BadMedoidsInput(_))
		));
		assert!(matches!(
			pam.init(Some(&[1, 2, 10])),
			Err(PamError::BadMedoidsInput(_))
		));
		assert!(matches!(
			pam.init(Some(&[1, 2, 2])),
			Err(PamError::BadMedoidsInput(_))
		));
		assert!(matches!(pam.init(None), Err(PamError::BadMedoidsInput(_))));
	}

	#[test]
	fn test_run_before_init() {
		let d = chain(10);
		let mut pam = FastPam::new(&d, 2, FastPamConfig::default()).unwrap();
		assert!(matches!(
			pam.run(OptMethod::FastPam1),
			Err(PamError::NotInitialized)
		));
	}

	#[test]
	fn test_invalid_matrix_rejected() {
		let mut d = PackedSymmetric::<f64>::zeros(3);
		d.set(0, 1, 1.0);
		d.set(1, 2, 1.0);
		// (0, 2) stays zero off the diagonal
		assert!(matches!(
			FastPam::new(&d, 2, FastPamConfig::default()),
			Err(PamError::InvalidDissimilarity(_))
		));
	}

	#[test]
	fn test_state_invariants_after_init() {
		let d = random_dissim(50, 11);
		for init in [InitMethod::Build, InitMethod::Lab] {
			let cfg = FastPamConfig::default().with_init(init).with_seed(5);
			let mut pam = FastPam::new(&d, 4, cfg).unwrap();
			pam.init(None).unwrap();
			// k distinct medoids, all in range
			assert_eq!(pam.medoids().len(), 4);
			let mut seen = vec![false; 50];
			for &m in pam.medoids() {
				assert!((m as usize) < 50);
				assert!(!seen[m as usize], "medoids must be distinct");
				seen[m as usize] = true;
			}
			// TD equals the sum of nearest distances, dsecond >= dnearest
			let mut td = 0.0;
			for q in 0..50 {
				assert!(pam.dsecond[q] >= pam.dnearest[q]);
				assert!(pam.nearest[q] < 4);
				td += pam.dnearest[q];
			}
			assert!((td - pam.td()).abs() <= 1e-9 * td.max(1.0));
		}
	}

	#[test]
	fn test_single_medoid() {
		let d = chain(6);
		let mut pam = FastPam::new(&d, 1, FastPamConfig::default()).unwrap();
		pam.init(None).unwrap();
		pam.run(OptMethod::FastPam1).unwrap();
		// BUILD picks the exact 1-medoid optimum, nothing to improve
		assert!(pam.medoids()[0] == 2 || pam.medoids()[0] == 3);
		assert_eq!(pam.num_iterations(), 0);
		assert!(pam.assignment().iter().all(|&l| l == 0));
	}

	#[test]
	fn test_named_results() {
		let names: Vec<String> = (0..4).map(|i| format!("p{}", i)).collect();
		let d = PackedSymmetric::from_packed(
			4,
			vec![0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 3.0, 2.0, 1.0, 0.0],
		)
		.unwrap()
		.with_names(names)
		.unwrap();
		let mut pam = FastPam::new(&d, 2, FastPamConfig::default()).unwrap();
		pam.init(None).unwrap();
		pam.run(OptMethod::FastPam1).unwrap();
		let meds = pam.medoid_column();
		assert_eq!(meds.values(), &[1, 2]);
		assert_eq!(meds.names().unwrap(), &["p1".to_string(), "p2".to_string()]);
		let assi = pam.assignment_column();
		assert_eq!(assi.len(), 4);
		assert_eq!(assi.names().unwrap()[0], "p0");
	}
}
