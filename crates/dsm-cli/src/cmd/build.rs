//! `dsm build` — load a relation list, finalize the matrix, and print it.
//!
//! Finalization runs symmetrize then validate. Either step can be switched off
//! with a flag or in `dsm.toml`; validating without symmetrizing reports the
//! first one-directional pair as an asymmetry error.

use std::io::{self, Write};

use clap::{Args, ValueEnum};
use serde::Serialize;

use dsm_core::config::DsmConfig;
use dsm_core::{BuildOptions, MatrixSnapshot, RelationList, RelationMatrix, build_matrix};

use crate::cmd::{InputArgs, fail};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

// ---------------------------------------------------------------------------
// Clap types
// ---------------------------------------------------------------------------

/// Arguments for `dsm build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Skip mirroring declared relations across the diagonal.
    #[arg(long)]
    pub no_symmetrize: bool,

    /// Skip the symmetry/reflexivity check.
    #[arg(long)]
    pub no_validate: bool,

    /// Write the matrix in a fixed export format, ignoring the output mode.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub export: Option<ExportFormat>,
}

/// Raw export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Space-separated 0/1 rows.
    Text,
    /// Comma-separated 0/1 rows.
    Csv,
    /// Matrix snapshot as JSON.
    Json,
    /// Canonical edge list, readable again by `dsm build`.
    Edges,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct BuildOutput {
    ok: bool,
    declared: usize,
    mirrored: usize,
    matrix: MatrixSnapshot,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Execute `dsm build`.
///
/// # Errors
///
/// Returns an error (after rendering it to stderr) if loading, declaring, or
/// validating fails, or if writing to stdout fails.
pub fn run_build(args: &BuildArgs, config: &DsmConfig, output: OutputMode) -> anyhow::Result<()> {
    let list = args.input.load(output)?;
    let options = BuildOptions {
        size_override: args.input.size,
        symmetrize: config.build.symmetrize && !args.no_symmetrize,
        validate: config.build.validate && !args.no_validate,
    };

    let report = build_matrix(&list, options).map_err(|err| fail(output, &err))?;
    let matrix = &report.matrix;

    if let Some(format) = args.export {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        return write_export(&mut out, matrix, format);
    }

    let value = BuildOutput {
        ok: true,
        declared: report.declared,
        mirrored: report.mirrored,
        matrix: matrix.snapshot(),
    };

    render_mode(
        output,
        &value,
        |_, w| w.write_all(matrix.render().as_bytes()),
        |v, w| {
            pretty_section(w, "Relation matrix")?;
            pretty_kv(w, "size", v.matrix.size.to_string())?;
            pretty_kv(w, "relations", v.matrix.edges.len().to_string())?;
            pretty_kv(w, "declared", v.declared.to_string())?;
            pretty_kv(w, "mirrored", v.mirrored.to_string())?;
            pretty_kv(w, "symmetric", yes_no(v.matrix.symmetric))?;
            pretty_kv(w, "fingerprint", &v.matrix.fingerprint)?;
            writeln!(w)?;
            write_labelled_rows(w, matrix)
        },
    )
}

/// Write `matrix` in a raw export encoding.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_export(
    w: &mut dyn Write,
    matrix: &RelationMatrix,
    format: ExportFormat,
) -> anyhow::Result<()> {
    match format {
        ExportFormat::Text => w.write_all(matrix.render().as_bytes())?,
        ExportFormat::Csv => w.write_all(matrix.render_with(",").as_bytes())?,
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, &matrix.snapshot())?;
            writeln!(w)?;
        }
        ExportFormat::Edges => {
            w.write_all(RelationList::from_matrix(matrix).to_text().as_bytes())?;
        }
    }
    Ok(())
}

/// Matrix rows prefixed by node label (or index), names right-aligned.
fn write_labelled_rows(w: &mut dyn Write, matrix: &RelationMatrix) -> io::Result<()> {
    let names: Vec<String> = (0..matrix.size())
        .map(|i| {
            matrix
                .label(i)
                .map_or_else(|| i.to_string(), |label| format!("{i} {label}"))
        })
        .collect();
    let width = names.iter().map(String::len).max().unwrap_or(0);

    for (name, row) in names.iter().zip(matrix.render().lines()) {
        writeln!(w, "{name:>width$} | {row}")?;
    }
    Ok(())
}

pub const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
