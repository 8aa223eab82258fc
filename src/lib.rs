//! Parallel k-Medoids Clustering with the FastPAM Algorithm
//!
//! Clusters N points into k groups by Partitioning Around Medoids on a
//! precomputed pairwise dissimilarity matrix. For details on the
//! implemented FastPAM1 algorithm, please see:
//!
//! Erich Schubert, Peter J. Rousseeuw
//! **Fast and Eager k-Medoids Clustering:
//! O(k) Runtime Improvement of the PAM, CLARA, and CLARANS Algorithms**
//! Information Systems (101), 2021, 101804
//! <https://doi.org/10.1016/j.is.2021.101804> (open access)
//!
//! Three compute engines share the [`DissimMatrix`] abstraction:
//!
//! 1. the **dissimilarity engine** ([`from_dense`] / [`from_sparse`])
//!    builds a packed symmetric matrix of L1, L2 or Pearson
//!    dissimilarities between the rows of an (N × p) data matrix;
//! 2. the **silhouette engine** ([`silhouette`] / [`par_silhouette`])
//!    scores a clustering per point;
//! 3. the **FastPAM engine** ([`FastPam`]) initializes medoids with
//!    BUILD, LAB or a caller-supplied set, then optimizes them with the
//!    FASTPAM1 or the silhouette-ranked multi-branch SWAP iteration.
//!
//! All three partition their work over shared-memory workers; the worker
//! count follows one sentinel convention (0 = all cores, -1 = serial,
//! positive = explicit). Per-worker floating-point accumulation follows a
//! fixed partition, but different worker counts may reassociate sums, so
//! reported TD values can drift across thread counts within the
//! convergence tolerance.
//!
//! ## Example
//!
//! Given a dissimilarity matrix of size 4 x 4 in packed form, use:
//! ```
//! use parpam::{FastPam, FastPamConfig, OptMethod, PackedSymmetric};
//! let d = PackedSymmetric::from_packed(
//! 	4,
//! 	vec![0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 3.0, 2.0, 1.0, 0.0],
//! )
//! .unwrap();
//! let mut pam = FastPam::new(&d, 2, FastPamConfig::default()).unwrap();
//! pam.init(None).unwrap();
//! pam.run(OptMethod::FastPam1).unwrap();
//! println!("medoids: {:?}, TD/N = {}", pam.medoids(), pam.td() / 4.0);
//! ```

mod config;
mod datamatrix;
mod dissim;
mod error;
mod fastpam;
mod fastpam1;
mod matrix;
mod multibranch;
mod par_silhouette;
mod silhouette;
mod td;
mod util;

pub use crate::config::{
	FastPamConfig, InitMethod, OptMethod, ValueKind, MAX_ITER, MAX_MEDOIDS, NO_CLUSTER,
};
pub use crate::datamatrix::{DenseData, SparseData};
pub use crate::dissim::{from_dense, from_sparse, Distance};
pub use crate::error::PamError;
pub use crate::fastpam::FastPam;
pub use crate::matrix::{validate_dissim, DissimMatrix, NamedColumn, PackedSymmetric};
pub use crate::par_silhouette::{par_mean_silhouette, par_silhouette};
pub use crate::silhouette::{mean_silhouette, silhouette};
pub use crate::td::mean_td;
pub use crate::util::{available_ram, worker_count, DistValue};
