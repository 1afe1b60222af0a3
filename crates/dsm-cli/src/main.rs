#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use dsm_core::ErrorCode;
use dsm_core::config::{self, DsmConfig};
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "dsm: build and validate design structure matrices",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (defaults to pretty on a terminal, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Read settings from this file instead of `dsm.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Build, symmetrize, validate, and print a matrix",
        long_about = "Apply a relation list to an identity matrix, mirror every relation across \
                      the diagonal, check the symmetry and reflexivity invariants, and print \
                      the result.",
        after_help = "EXAMPLES:\n    # Print the finalized matrix\n    dsm build data/dsm38.txt\n\n    # Export as CSV\n    dsm build data/dsm38.txt --export csv\n\n    # Show what the unsymmetrized declarations look like\n    dsm build data/dsm38.txt --no-symmetrize --no-validate"
    )]
    Build(cmd::build::BuildArgs),

    #[command(
        about = "Report on raw declarations without finalizing",
        long_about = "Apply a relation list as written and report size, symmetry, reflexivity, \
                      and one-directional pairs. Fails if the declarations are asymmetric.",
        after_help = "EXAMPLES:\n    # Check a relation list\n    dsm check relations.txt\n\n    # Emit machine-readable output\n    dsm check relations.txt --format json"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        about = "Print the canonical edge list",
        long_about = "Finalize the matrix and print each related pair (i < j) once, in \
                      ascending order. Text output can be fed back into `dsm build`.",
        after_help = "EXAMPLES:\n    # Normalize a relation list\n    dsm edges relations.toml > relations.txt\n\n    # Round-trip through stdin\n    dsm edges relations.txt | dsm build -"
    )]
    Edges(cmd::edges::EdgesArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash completions\n    dsm completions bash > ~/.local/share/bash-completion/completions/dsm"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DSM_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "dsm=debug,info"
        } else {
            "warn"
        })
    });

    let format = env::var("DSM_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the rendered matrix; logs always go to stderr.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DsmConfig> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(&env::current_dir()?),
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref()).map_err(|err| {
        let fallback = output::resolve_output_mode(cli.format, cli.json, &DsmConfig::default());
        output::report(
            fallback,
            &CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError),
        )
    })?;
    let output = output::resolve_output_mode(cli.format, cli.json, &config);
    debug!(?output, ?config, "resolved settings");

    match cli.command {
        Commands::Build(ref args) => cmd::build::run_build(args, &config, output),
        Commands::Check(ref args) => cmd::check::run_check(args, output),
        Commands::Edges(ref args) => cmd::edges::run_edges(args, &config, output),
        Commands::Completions(ref args) => {
            cmd::completions::run_completions(args, Cli::command())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Err(err) = run(&cli) else {
        return ExitCode::SUCCESS;
    };
    // Errors raised through `output::report` are already on stderr.
    if !output::is_reported(&err) {
        let mode = output::resolve_output_mode(cli.format, cli.json, &DsmConfig::default());
        let render_err = output::report(mode, &CliError::new(format!("{err:#}")));
        if !output::is_reported(&render_err) {
            debug!(error = %render_err, "failed to render error");
        }
    }
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn format_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["dsm", "build", "a.txt", "--format", "json"]);
        assert_eq!(cli.format, Some(OutputMode::Json));
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::parse_from(["dsm", "--json", "check", "a.txt"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn build_flags_parse() {
        let cli = Cli::parse_from([
            "dsm",
            "build",
            "-",
            "--size",
            "4",
            "--no-symmetrize",
            "--export",
            "csv",
        ]);
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.input.input, PathBuf::from("-"));
        assert_eq!(args.input.size, Some(4));
        assert!(args.no_symmetrize);
        assert!(!args.no_validate);
        assert_eq!(args.export, Some(cmd::build::ExportFormat::Csv));
    }
}
