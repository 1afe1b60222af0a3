pub mod build;
pub mod check;
pub mod completions;
pub mod edges;

use std::path::PathBuf;

use clap::Args;
use dsm_core::{RelationList, RelationsError};
use tracing::debug;

use crate::output::{CliError, OutputMode, report};

/// Input selection shared by every matrix command.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Relation list to read (`.txt`, `.toml`, `.json`, or `-` for stdin).
    pub input: PathBuf,

    /// Matrix size; overrides any size declared in the input.
    #[arg(long, value_name = "N")]
    pub size: Option<usize>,
}

impl InputArgs {
    /// Load the relation list, rendering any failure before returning it.
    pub fn load(&self, output: OutputMode) -> anyhow::Result<RelationList> {
        RelationList::load(&self.input).map_err(|err| fail(output, &err))
    }
}

/// Render `err` to stderr and convert it into the command's error result.
pub fn fail(output: OutputMode, err: &RelationsError) -> anyhow::Error {
    let code = err.code();
    debug!(code = %code, summary = code.message(), "command failed");
    report(output, &CliError::from(err))
}
