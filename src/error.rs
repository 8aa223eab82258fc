use thiserror::Error;

/// Error taxonomy of the library.
///
/// All failures are terminal and single-level: the numeric kernels never
/// attempt local recovery, every error surfaces at the call boundary.
/// Normal early exits of the SWAP optimizer (no improving exchange,
/// tolerance reached, iteration cap) are not errors; they are reported
/// through the iteration count and the TD history instead.
#[derive(Error, Debug)]
pub enum PamError {
	/// The matrix violates the dissimilarity contract: a non-zero entry on
	/// the main diagonal, or a non-positive entry outside it.
	#[error("invalid dissimilarity matrix: {0}")]
	InvalidDissimilarity(String),

	/// A caller-supplied medoid list with the wrong size, an out-of-range
	/// index, or a duplicate entry.
	#[error("bad medoids input: {0}")]
	BadMedoidsInput(String),

	/// Wrong matrix layout or element type, an unknown interface string,
	/// or degenerate/mismatched dimensions.
	#[error("unsupported input: {0}")]
	UnsupportedInput(String),

	/// The requested allocation does not fit in the available RAM.
	#[error("insufficient memory: {0}")]
	InsufficientMemory(String),

	/// BUILD found no candidate lowering the total deviation; the
	/// dissimilarity matrix is pathological.
	#[error("BUILD stalled: {0}")]
	BuildStalled(String),

	/// `run` was called before `init`.
	#[error("engine not initialized: call init() before run()")]
	NotInitialized,

	/// A violated internal invariant, e.g. a point without a closest
	/// medoid or a negative total deviation. Indicates a programming bug.
	#[error("internal invariant violated: {0}")]
	InternalInvariant(String),
}
