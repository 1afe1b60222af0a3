//! Reflexive, symmetric relation matrix over a fixed node set.
//!
//! # Overview
//!
//! A [`RelationMatrix`] is an `N x N` boolean matrix `M` indexed by node
//! number. It is created as the identity relation (`M[i][i]` set, everything
//! else clear), populated by [`RelationMatrix::declare_relation`] calls, then
//! finalized with [`RelationMatrix::symmetrize`] and
//! [`RelationMatrix::validate`] before it is rendered or exported.
//!
//! ## Storage
//!
//! Cells live in one row-major [`FixedBitSet`] of `N * N` bits. Cell
//! `(i, j)` is bit `i * N + j`. Sizes are capped at [`MAX_SIZE`] nodes,
//! which bounds a matrix at 128 MiB of cells.
//!
//! ## Edge Lists
//!
//! [`RelationMatrix::to_edge_list`] is the canonical compact form: every
//! `(i, j)` with `i < j` and `M[i][j]` set, ascending by `i` then `j`.
//! Replaying it through `declare_relation` + `symmetrize` on a fresh matrix
//! of the same size reproduces a symmetric matrix exactly.

use std::fmt;

use fixedbitset::FixedBitSet;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::MatrixError;

/// Largest node count [`RelationMatrix::create`] accepts.
pub const MAX_SIZE: usize = 1 << 15;

// ---------------------------------------------------------------------------
// RelationMatrix
// ---------------------------------------------------------------------------

/// An `N x N` reflexive relation matrix with optional node labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMatrix {
    size: usize,
    cells: FixedBitSet,
    labels: Option<Vec<String>>,
}

impl RelationMatrix {
    /// Allocate an identity matrix of `size` nodes.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidSize`] if `size` is zero and
    /// [`MatrixError::SizeTooLarge`] if it exceeds [`MAX_SIZE`].
    pub fn create(size: usize) -> Result<Self, MatrixError> {
        if size == 0 {
            return Err(MatrixError::InvalidSize { size: 0 });
        }
        if size > MAX_SIZE {
            return Err(MatrixError::SizeTooLarge {
                size,
                max: MAX_SIZE,
            });
        }

        let mut cells = FixedBitSet::with_capacity(size * size);
        for i in 0..size {
            cells.insert(i * size + i);
        }

        Ok(Self {
            size,
            cells,
            labels: None,
        })
    }

    /// Create a matrix, declare every pair in `pairs`, and symmetrize.
    ///
    /// # Errors
    ///
    /// Returns the first [`MatrixError`] raised by [`Self::create`] or
    /// [`Self::declare_relation`].
    pub fn from_edges(
        size: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, MatrixError> {
        let mut matrix = Self::create(size)?;
        matrix.declare_all(pairs)?;
        matrix.symmetrize();
        Ok(matrix)
    }

    /// Attach one label per node.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::LabelCountMismatch`] if `labels.len() != size`.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self, MatrixError> {
        if labels.len() != self.size {
            return Err(MatrixError::LabelCountMismatch {
                expected: self.size,
                actual: labels.len(),
            });
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Number of nodes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Label for node `i`, if labels were attached.
    #[must_use]
    pub fn label(&self, i: usize) -> Option<&str> {
        self.labels.as_ref()?.get(i).map(String::as_str)
    }

    /// All node labels, if attached.
    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Read `M[i][j]`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] if either index is outside
    /// `[0, size)`.
    pub fn get(&self, i: usize, j: usize) -> Result<bool, MatrixError> {
        self.check_range(i, j)?;
        Ok(self.cell(i, j))
    }

    /// Mark `i` as related to `j` by setting `M[i][j]`.
    ///
    /// Only the `(i, j)` cell is written; call [`Self::symmetrize`] to mirror
    /// it. Declaring `i == j` is accepted and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] if either index is outside
    /// `[0, size)`. The matrix is left unchanged in that case.
    pub fn declare_relation(&mut self, i: usize, j: usize) -> Result<(), MatrixError> {
        self.check_range(i, j)?;
        self.cells.insert(self.offset(i, j));
        Ok(())
    }

    /// Declare every pair in order, stopping at the first failure.
    ///
    /// Pairs declared before the failing one stay applied.
    ///
    /// # Errors
    ///
    /// Returns the first [`MatrixError::IndexOutOfRange`].
    pub fn declare_all(
        &mut self,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<usize, MatrixError> {
        let mut declared = 0;
        for (i, j) in pairs {
            self.declare_relation(i, j)?;
            declared += 1;
        }
        Ok(declared)
    }

    /// Mirror every set cell across the diagonal, in place.
    ///
    /// Afterwards `M[i][j] == M[j][i]` for all pairs. Idempotent. Returns the
    /// number of cells that were newly set.
    #[instrument(skip(self), fields(size = self.size))]
    pub fn symmetrize(&mut self) -> usize {
        let mut changed = 0;
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                let upper = self.cell(i, j);
                let lower = self.cell(j, i);
                if upper != lower {
                    self.cells.insert(self.offset(i, j));
                    self.cells.insert(self.offset(j, i));
                    changed += 1;
                }
            }
        }
        debug!(changed, "symmetrized relation matrix");
        changed
    }

    /// `true` iff `M[i][j] == M[j][i]` for all `i, j`.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.first_asymmetric_pair().is_none()
    }

    /// `true` iff every diagonal entry is set.
    #[must_use]
    pub fn is_reflexive(&self) -> bool {
        self.first_missing_diagonal().is_none()
    }

    /// Every `(i, j)` with `i < j` where `M[i][j] != M[j][i]`.
    #[must_use]
    pub fn asymmetric_pairs(&self) -> Vec<(usize, usize)> {
        self.upper_pairs()
            .filter(|&(i, j)| self.cell(i, j) != self.cell(j, i))
            .collect()
    }

    /// Check both matrix invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::AsymmetricMatrix`] naming the first asymmetric
    /// pair, or [`MatrixError::NonReflexive`] naming the first unset
    /// diagonal entry. Symmetry is checked first.
    #[instrument(skip(self), fields(size = self.size))]
    pub fn validate(&self) -> Result<(), MatrixError> {
        if let Some((i, j)) = self.first_asymmetric_pair() {
            return Err(MatrixError::AsymmetricMatrix { i, j });
        }
        if let Some(index) = self.first_missing_diagonal() {
            return Err(MatrixError::NonReflexive { index });
        }
        Ok(())
    }

    /// Row-major dump, `0`/`1` separated by single spaces, one row per line.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_with(" ")
    }

    /// Row-major dump with a custom cell separator.
    #[must_use]
    pub fn render_with(&self, separator: &str) -> String {
        let row_len = self.size + (self.size - 1) * separator.len();
        let mut out = String::with_capacity(self.size * (row_len + 1));
        for i in 0..self.size {
            for j in 0..self.size {
                if j > 0 {
                    out.push_str(separator);
                }
                out.push(if self.cell(i, j) { '1' } else { '0' });
            }
            out.push('\n');
        }
        out
    }

    /// Canonical upper-triangle edge list: `(i, j)` with `i < j` and
    /// `M[i][j]` set, ascending by `i` then `j`.
    #[must_use]
    pub fn to_edge_list(&self) -> Vec<(usize, usize)> {
        self.upper_pairs().filter(|&(i, j)| self.cell(i, j)).collect()
    }

    /// Every set off-diagonal cell in row-major order, in either triangle.
    #[must_use]
    pub fn directed_edges(&self) -> Vec<(usize, usize)> {
        let size = self.size;
        self.cells
            .ones()
            .map(|bit| (bit / size, bit % size))
            .filter(|(i, j)| i != j)
            .collect()
    }

    /// Number of related nodes for `i`, excluding itself.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::IndexOutOfRange`] if `i` is outside `[0, size)`.
    pub fn degree(&self, i: usize) -> Result<usize, MatrixError> {
        self.check_range(i, i)?;
        Ok((0..self.size).filter(|&j| j != i && self.cell(i, j)).count())
    }

    /// BLAKE3 hash of the size and the full directed edge set.
    ///
    /// Equal matrices (ignoring labels) have equal fingerprints. Format:
    /// `blake3:<lowercase hex>`.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.size as u64).to_le_bytes());
        for (i, j) in self.directed_edges() {
            hasher.update(&(i as u64).to_le_bytes());
            hasher.update(&(j as u64).to_le_bytes());
        }
        format!("blake3:{}", hasher.finalize().to_hex())
    }

    /// Serializable view used for JSON export.
    #[must_use]
    pub fn snapshot(&self) -> MatrixSnapshot {
        let rows = (0..self.size)
            .map(|i| (0..self.size).map(|j| u8::from(self.cell(i, j))).collect())
            .collect();
        MatrixSnapshot {
            size: self.size,
            labels: self.labels.clone().unwrap_or_default(),
            symmetric: self.is_symmetric(),
            reflexive: self.is_reflexive(),
            fingerprint: self.fingerprint(),
            edges: self.to_edge_list().into_iter().map(|(i, j)| [i, j]).collect(),
            rows,
        }
    }

    // -- internals ----------------------------------------------------------

    const fn offset(&self, i: usize, j: usize) -> usize {
        i * self.size + j
    }

    fn cell(&self, i: usize, j: usize) -> bool {
        self.cells.contains(self.offset(i, j))
    }

    fn check_range(&self, i: usize, j: usize) -> Result<(), MatrixError> {
        if i < self.size && j < self.size {
            Ok(())
        } else {
            Err(MatrixError::IndexOutOfRange {
                i: signed(i),
                j: signed(j),
                size: self.size,
            })
        }
    }

    fn upper_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.size).flat_map(move |i| ((i + 1)..self.size).map(move |j| (i, j)))
    }

    fn first_asymmetric_pair(&self) -> Option<(usize, usize)> {
        self.upper_pairs()
            .find(|&(i, j)| self.cell(i, j) != self.cell(j, i))
    }

    fn first_missing_diagonal(&self) -> Option<usize> {
        (0..self.size).find(|&i| !self.cell(i, i))
    }
}

impl fmt::Display for RelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Convert an index to the signed form carried by [`MatrixError`].
pub(crate) fn signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// MatrixSnapshot
// ---------------------------------------------------------------------------

/// JSON-friendly view of a [`RelationMatrix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixSnapshot {
    pub size: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub symmetric: bool,
    pub reflexive: bool,
    pub fingerprint: String,
    pub edges: Vec<[usize; 2]>,
    pub rows: Vec<Vec<u8>>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
