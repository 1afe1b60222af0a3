//! Declarative relation lists.
//!
//! A relation list names the matrix size, optional node labels, and the
//! pairs to declare. Three encodings are accepted, chosen by file extension:
//!
//! - **text** (default, and `-` for stdin):
//!
//!   ```text
//!   # comments run to end of line
//!   size 4
//!   label 0 Pump
//!   0 2
//!   1,3
//!   ```
//!
//!   `label` lines must appear in node order starting at 0.
//!
//! - **`.toml`**: `size = 4`, `labels = [...]`, `relations = [[0, 2], [1, 3]]`
//! - **`.json`**: the same schema as TOML.
//!
//! Indices are kept signed until the matrix is built, so a negative index is
//! reported as [`MatrixError::IndexOutOfRange`] rather than a parse failure.

use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{MatrixError, RelationsError};
use crate::matrix::{RelationMatrix, signed};

/// Path that selects stdin instead of a file.
pub const STDIN_PATH: &str = "-";

/// A parsed relation list, not yet applied to a matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationList {
    /// Declared matrix size, if the input names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// One label per node, or empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Pairs to declare, in input order.
    #[serde(default)]
    pub relations: Vec<(i64, i64)>,
}

impl RelationList {
    /// Load a relation list from `path`, or from stdin when `path` is `-`.
    ///
    /// # Errors
    ///
    /// Returns [`RelationsError::Read`] on I/O failure, or a parse error for
    /// malformed content.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, RelationsError> {
        let read_err = |source| RelationsError::Read {
            path: path.to_path_buf(),
            source,
        };

        if path.as_os_str() == STDIN_PATH {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(read_err)?;
            return Self::parse_text(&content);
        }

        let content = std::fs::read_to_string(path).map_err(read_err)?;
        let list = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::parse_toml(&content)?,
            Some("json") => Self::parse_json(&content)?,
            _ => Self::parse_text(&content)?,
        };

        debug!(
            size = ?list.size,
            relations = list.relations.len(),
            labels = list.labels.len(),
            "loaded relation list"
        );
        Ok(list)
    }

    /// Parse the TOML encoding.
    ///
    /// # Errors
    ///
    /// Returns [`RelationsError::Toml`] if the document does not match the schema.
    pub fn parse_toml(content: &str) -> Result<Self, RelationsError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse the JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns [`RelationsError::Json`] if the document does not match the schema.
    pub fn parse_json(content: &str) -> Result<Self, RelationsError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse the line-oriented text encoding.
    ///
    /// # Errors
    ///
    /// Returns [`RelationsError::Parse`] with the 1-based line number of the
    /// first malformed line.
    pub fn parse_text(content: &str) -> Result<Self, RelationsError> {
        let mut list = Self::default();

        for (idx, raw) in content.lines().enumerate() {
            let line = idx + 1;
            let body = raw.split_once('#').map_or(raw, |(before, _)| before).trim();
            if body.is_empty() {
                continue;
            }

            let parse_err = |reason: String| RelationsError::Parse { line, reason };

            if let Some(rest) = directive(body, "size") {
                let size = parse_int(rest).map_err(parse_err)?;
                if list.size.is_some_and(|prev| prev != size) {
                    return Err(parse_err(format!("conflicting size {size}")));
                }
                list.size = Some(size);
                continue;
            }

            if let Some(rest) = directive(body, "label") {
                let (index, name) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| parse_err("expected `label <index> <name>`".to_string()))?;
                let index = parse_int(index).map_err(parse_err)?;
                let expected = signed(list.labels.len());
                if index != expected {
                    return Err(parse_err(format!(
                        "labels must be listed in node order: expected node {expected}, got {index}"
                    )));
                }
                list.labels.push(name.trim().to_string());
                continue;
            }

            let fields: Vec<&str> = body
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|field| !field.is_empty())
                .collect();
            let [i, j] = fields.as_slice() else {
                return Err(parse_err(format!(
                    "expected `<i> <j>`, found {} field(s)",
                    fields.len()
                )));
            };
            let i = parse_int(i).map_err(parse_err)?;
            let j = parse_int(j).map_err(parse_err)?;
            list.relations.push((i, j));
        }

        Ok(list)
    }

    /// Capture the canonical edge list and labels of `matrix` as text-ready data.
    #[must_use]
    pub fn from_matrix(matrix: &RelationMatrix) -> Self {
        Self {
            size: Some(signed(matrix.size())),
            labels: matrix.labels().map(<[String]>::to_vec).unwrap_or_default(),
            relations: matrix
                .to_edge_list()
                .into_iter()
                .map(|(i, j)| (signed(i), signed(j)))
                .collect(),
        }
    }

    /// Encode in the text format accepted by [`Self::parse_text`].
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(size) = self.size {
            let _ = writeln!(out, "size {size}");
        }
        for (index, label) in self.labels.iter().enumerate() {
            let _ = writeln!(out, "label {index} {label}");
        }
        for (i, j) in &self.relations {
            let _ = writeln!(out, "{i} {j}");
        }
        out
    }

    /// Resolve the matrix size: `size_override` wins over the listed size.
    ///
    /// # Errors
    ///
    /// Returns [`RelationsError::MissingSize`] if neither is present, or
    /// [`MatrixError::InvalidSize`] if the size is not positive.
    pub fn resolve_size(&self, size_override: Option<usize>) -> Result<usize, RelationsError> {
        if let Some(size) = size_override {
            return Ok(size);
        }
        let size = self.size.ok_or(RelationsError::MissingSize)?;
        usize::try_from(size).map_err(|_| MatrixError::InvalidSize { size }.into())
    }

    /// Create the identity matrix and declare every listed pair.
    ///
    /// The result is not symmetrized.
    ///
    /// # Errors
    ///
    /// Returns the first size, label, or index error encountered.
    #[instrument(skip(self), fields(relations = self.relations.len()))]
    pub fn declare_into_matrix(
        &self,
        size_override: Option<usize>,
    ) -> Result<RelationMatrix, RelationsError> {
        let size = self.resolve_size(size_override)?;
        let mut matrix = RelationMatrix::create(size)?;
        if !self.labels.is_empty() {
            matrix = matrix.with_labels(self.labels.clone())?;
        }

        for &(i, j) in &self.relations {
            let out_of_range = MatrixError::IndexOutOfRange { i, j, size };
            let (Ok(ui), Ok(uj)) = (usize::try_from(i), usize::try_from(j)) else {
                return Err(out_of_range.into());
            };
            matrix.declare_relation(ui, uj)?;
        }

        debug!(size, declared = self.relations.len(), "declared relations");
        Ok(matrix)
    }
}

/// Return the remainder of `line` if it starts with `keyword` followed by whitespace.
fn directive<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then_some(rest.trim())
}

fn parse_int(field: &str) -> Result<i64, String> {
    field
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid integer `{}`", field.trim()))
}
