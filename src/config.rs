//! Engine configuration and the string-keyed interface enumerations.

use crate::error::PamError;
use core::fmt;
use std::str::FromStr;

/// Hard cap on the optimization iteration counter.
/// Callers may request at most `MAX_ITER - 1` iterations.
pub const MAX_ITER: u32 = 1001;

/// The largest number of medoids that can be represented.
pub const MAX_MEDOIDS: u32 = u32::MAX - 1;

/// Sentinel slot value meaning "not assigned to any cluster".
pub const NO_CLUSTER: u32 = MAX_MEDOIDS;

/// How the initial medoid set is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMethod {
	/// Exact greedy PAM BUILD.
	Build,
	/// Linear approximative BUILD: greedy selection on random subsamples.
	Lab,
	/// Medoids supplied by the caller, e.g. from an earlier run.
	Previous,
}

impl FromStr for InitMethod {
	type Err = PamError;

	fn from_str(s: &str) -> Result<Self, PamError> {
		match s {
			"BUILD" => Ok(InitMethod::Build),
			"LAB" => Ok(InitMethod::Lab),
			"PREV" => Ok(InitMethod::Previous),
			other => Err(PamError::UnsupportedInput(format!(
				"initialization method must be BUILD, LAB or PREV, not '{}'",
				other
			))),
		}
	}
}

impl fmt::Display for InitMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			InitMethod::Build => "BUILD",
			InitMethod::Lab => "LAB",
			InitMethod::Previous => "PREV",
		})
	}
}

/// Which SWAP optimization the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptMethod {
	/// FastPAM1: the single best exchange of each scan is committed.
	FastPam1,
	/// Multi-branch variant: the top-B exchanges of each scan are ranked
	/// by the mean silhouette of the clustering they would produce, and
	/// the best-scoring one is committed.
	TwoBranch,
}

impl FromStr for OptMethod {
	type Err = PamError;

	fn from_str(s: &str) -> Result<Self, PamError> {
		match s {
			"FASTPAM1" => Ok(OptMethod::FastPam1),
			"TWOBRANCH" => Ok(OptMethod::TwoBranch),
			other => Err(PamError::UnsupportedInput(format!(
				"optimization method must be FASTPAM1 or TWOBRANCH, not '{}'",
				other
			))),
		}
	}
}

impl fmt::Display for OptMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			OptMethod::FastPam1 => "FASTPAM1",
			OptMethod::TwoBranch => "TWOBRANCH",
		})
	}
}

/// Floating-point width of a stored matrix element, for dispatch at the
/// outer boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
	F32,
	F64,
}

impl FromStr for ValueKind {
	type Err = PamError;

	fn from_str(s: &str) -> Result<Self, PamError> {
		match s {
			"float" => Ok(ValueKind::F32),
			"double" => Ok(ValueKind::F64),
			other => Err(PamError::UnsupportedInput(format!(
				"element type must be 'float' or 'double', not '{}'",
				other
			))),
		}
	}
}

/// Configuration of a [`FastPam`](crate::FastPam) engine.
///
/// * `init` - how the initial medoid set is produced
/// * `max_iter` - SWAP iteration limit, at most [`MAX_ITER`]` - 1`; 0 means
///   initialization only
/// * `threads` - thread-count sentinel: 0 = all cores, -1 = serial,
///   positive = explicit (capped at the hardware concurrency)
/// * `seed` - seed of the LAB sampling RNG; `None` seeds from the system
///   entropy source
/// * `branches` - width of the top-B exchange window of the multi-branch
///   optimizer
#[derive(Debug, Clone)]
pub struct FastPamConfig {
	pub init: InitMethod,
	pub max_iter: u32,
	pub threads: i32,
	pub seed: Option<u64>,
	pub branches: usize,
}

impl Default for FastPamConfig {
	fn default() -> Self {
		Self {
			init: InitMethod::Build,
			max_iter: 100,
			threads: 0,
			seed: None,
			branches: 4,
		}
	}
}

impl FastPamConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_init(mut self, init: InitMethod) -> Self {
		self.init = init;
		self
	}

	pub fn with_max_iter(mut self, max_iter: u32) -> Self {
		self.max_iter = max_iter;
		self
	}

	pub fn with_threads(mut self, threads: i32) -> Self {
		self.threads = threads;
		self
	}

	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	pub fn with_branches(mut self, branches: usize) -> Self {
		self.branches = branches;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_method_strings() {
		assert_eq!("BUILD".parse::<InitMethod>().unwrap(), InitMethod::Build);
		assert_eq!("LAB".parse::<InitMethod>().unwrap(), InitMethod::Lab);
		assert_eq!("PREV".parse::<InitMethod>().unwrap(), InitMethod::Previous);
		assert!("build".parse::<InitMethod>().is_err());
		assert_eq!("FASTPAM1".parse::<OptMethod>().unwrap(), OptMethod::FastPam1);
		assert_eq!("TWOBRANCH".parse::<OptMethod>().unwrap(), OptMethod::TwoBranch);
		assert_eq!("float".parse::<ValueKind>().unwrap(), ValueKind::F32);
		assert_eq!("double".parse::<ValueKind>().unwrap(), ValueKind::F64);
		assert!("single".parse::<ValueKind>().is_err());
	}
}
