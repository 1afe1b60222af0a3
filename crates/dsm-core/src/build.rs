//! End-to-end matrix construction from a relation list.
//!
//! ## Pipeline
//!
//! ```text
//! RelationList
//!        ↓  declare_into_matrix()   identity + declared cells
//! RelationMatrix (possibly asymmetric)
//!        ↓  symmetrize()            unless disabled
//!        ↓  validate()              unless disabled
//! BuildReport
//! ```

use tracing::{debug, info, instrument};

use crate::error::RelationsError;
use crate::matrix::RelationMatrix;
use crate::relations::RelationList;

/// Finalization switches for [`build_matrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Overrides the size named by the relation list.
    pub size_override: Option<usize>,
    /// Mirror declared cells across the diagonal.
    pub symmetrize: bool,
    /// Check symmetry and reflexivity before returning.
    pub validate: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            size_override: None,
            symmetrize: true,
            validate: true,
        }
    }
}

/// A finalized matrix plus counters from the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub matrix: RelationMatrix,
    /// Number of pairs declared from the list.
    pub declared: usize,
    /// Cells set by symmetrization (0 if it was skipped).
    pub mirrored: usize,
}

/// Build, finalize, and optionally validate a matrix.
///
/// # Errors
///
/// Returns the first loading, range, or invariant error. All are fatal; no
/// partial matrix is returned.
#[instrument(skip(list), fields(relations = list.relations.len()))]
pub fn build_matrix(
    list: &RelationList,
    options: BuildOptions,
) -> Result<BuildReport, RelationsError> {
    let mut matrix = list.declare_into_matrix(options.size_override)?;

    let mirrored = if options.symmetrize {
        let mirrored = matrix.symmetrize();
        if mirrored > 0 {
            debug!(mirrored, "mirrored one-directional relations");
        }
        mirrored
    } else {
        0
    };

    if options.validate {
        matrix.validate()?;
    }

    info!(
        size = matrix.size(),
        edges = matrix.to_edge_list().len(),
        "relation matrix finalized"
    );

    Ok(BuildReport {
        matrix,
        declared: list.relations.len(),
        mirrored,
    })
}
