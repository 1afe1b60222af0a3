//! `dsm check` — inspect raw declarations without finalizing them.
//!
//! The relation list is applied to an identity matrix exactly as written, with
//! no symmetrization. The report names every one-directional pair; the
//! command fails if any exist.

use std::io::Write;

use clap::Args;
use serde::Serialize;

use dsm_core::{MatrixError, RelationMatrix, RelationsError};

use crate::cmd::build::yes_no;
use crate::cmd::{InputArgs, fail};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Pairs listed in text/pretty output before truncating.
const MAX_LISTED_PAIRS: usize = 10;

/// Arguments for `dsm check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    ok: bool,
    size: usize,
    declared: usize,
    directed_cells: usize,
    symmetric: bool,
    reflexive: bool,
    asymmetric_pairs: Vec<[usize; 2]>,
}

impl CheckOutput {
    fn from_matrix(matrix: &RelationMatrix, declared: usize) -> Self {
        let symmetric = matrix.is_symmetric();
        let reflexive = matrix.is_reflexive();
        Self {
            ok: symmetric && reflexive,
            size: matrix.size(),
            declared,
            directed_cells: matrix.directed_edges().len(),
            symmetric,
            reflexive,
            asymmetric_pairs: matrix
                .asymmetric_pairs()
                .into_iter()
                .map(|(i, j)| [i, j])
                .collect(),
        }
    }

    fn listed_pairs(&self) -> String {
        let mut listed: Vec<String> = self
            .asymmetric_pairs
            .iter()
            .take(MAX_LISTED_PAIRS)
            .map(|[i, j]| format!("({i}, {j})"))
            .collect();
        let hidden = self.asymmetric_pairs.len().saturating_sub(MAX_LISTED_PAIRS);
        if hidden > 0 {
            listed.push(format!("... {hidden} more"));
        }
        listed.join(" ")
    }
}

/// Execute `dsm check`.
///
/// # Errors
///
/// Returns an error if loading or declaring fails, or if the declared matrix
/// is not symmetric and reflexive. The report is printed first in that case.
pub fn run_check(args: &CheckArgs, output: OutputMode) -> anyhow::Result<()> {
    let list = args.input.load(output)?;
    let matrix = list
        .declare_into_matrix(args.input.size)
        .map_err(|err| fail(output, &err))?;

    let report = CheckOutput::from_matrix(&matrix, list.relations.len());

    render_mode(
        output,
        &report,
        |v, w| {
            writeln!(
                w,
                "size={} declared={} symmetric={} reflexive={}",
                v.size, v.declared, v.symmetric, v.reflexive
            )?;
            if !v.asymmetric_pairs.is_empty() {
                writeln!(w, "asymmetric: {}", v.listed_pairs())?;
            }
            Ok(())
        },
        |v, w| {
            pretty_section(w, "Relation check")?;
            pretty_kv(w, "size", v.size.to_string())?;
            pretty_kv(w, "declared", v.declared.to_string())?;
            pretty_kv(w, "cells", v.directed_cells.to_string())?;
            pretty_kv(w, "symmetric", yes_no(v.symmetric))?;
            pretty_kv(w, "reflexive", yes_no(v.reflexive))?;
            if !v.asymmetric_pairs.is_empty() {
                pretty_kv(w, "asymmetric", v.listed_pairs())?;
            }
            Ok(())
        },
    )?;

    matrix
        .validate()
        .map_err(|err: MatrixError| fail(output, &RelationsError::from(err)))
}
