//! `dsm edges` — print the canonical edge list of the finalized matrix.
//!
//! Text output is the relation-list text encoding, so
//! `dsm edges a.txt | dsm build -` reproduces the matrix.

use std::io::Write;

use clap::Args;
use serde::Serialize;

use dsm_core::config::DsmConfig;
use dsm_core::{BuildOptions, RelationList, build_matrix};

use crate::cmd::{InputArgs, fail};
use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `dsm edges`.
#[derive(Args, Debug)]
pub struct EdgesArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Serialize)]
struct EdgeRow {
    i: usize,
    j: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<String>,
}

#[derive(Debug, Serialize)]
struct EdgesOutput {
    size: usize,
    fingerprint: String,
    edges: Vec<EdgeRow>,
}

fn edge_options(args: &EdgesArgs, config: &DsmConfig) -> BuildOptions {
    BuildOptions {
        size_override: args.input.size,
        symmetrize: true,
        validate: config.build.validate,
    }
}

/// Execute `dsm edges`.
///
/// The matrix is always symmetrized first, since the edge list only keeps
/// `i < j`. Validation follows `[build] validate`.
///
/// # Errors
///
/// Returns an error if loading or building fails.
pub fn run_edges(args: &EdgesArgs, config: &DsmConfig, output: OutputMode) -> anyhow::Result<()> {
    let list = args.input.load(output)?;
    let options = edge_options(args, config);
    let report = build_matrix(&list, options).map_err(|err| fail(output, &err))?;
    let matrix = &report.matrix;

    let value = EdgesOutput {
        size: matrix.size(),
        fingerprint: matrix.fingerprint(),
        edges: matrix
            .to_edge_list()
            .into_iter()
            .map(|(i, j)| EdgeRow {
                i,
                j,
                from: matrix.label(i).map(str::to_string),
                to: matrix.label(j).map(str::to_string),
            })
            .collect(),
    };

    render_mode(
        output,
        &value,
        |_, w| w.write_all(RelationList::from_matrix(matrix).to_text().as_bytes()),
        |v, w| {
            pretty_section(w, &format!("Edges ({} nodes, {} edges)", v.size, v.edges.len()))?;
            for edge in &v.edges {
                match (&edge.from, &edge.to) {
                    (Some(from), Some(to)) => {
                        writeln!(w, "{:>4} -- {:<4} {from} -- {to}", edge.i, edge.j)?;
                    }
                    _ => writeln!(w, "{:>4} -- {}", edge.i, edge.j)?,
                }
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsm_core::config::BuildConfig;
    use std::path::PathBuf;

    fn args() -> EdgesArgs {
        EdgesArgs {
            input: InputArgs {
                input: PathBuf::from("-"),
                size: Some(6),
            },
        }
    }

    #[test]
    fn edges_always_symmetrize_but_honor_validate() {
        let config = DsmConfig {
            build: BuildConfig {
                symmetrize: false,
                validate: false,
            },
            ..DsmConfig::default()
        };
        let options = edge_options(&args(), &config);
        assert!(options.symmetrize);
        assert!(!options.validate);
        assert_eq!(options.size_override, Some(6));

        let options = edge_options(&args(), &DsmConfig::default());
        assert!(options.symmetrize);
        assert!(options.validate);
    }
}
