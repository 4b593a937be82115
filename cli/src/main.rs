//! Command-line driver for the bundle archaeology engine (spec §4.11–§4.12).
#![allow(clippy::print_stdout)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Report;
use colored::Colorize;
use deminify_model::AnalysisError;
use deminify_pipeline::{analyze, AnalysisOutput, RunConfig};

/// Reconstructs the internal module structure of a single bundled JS file.
#[derive(Debug, Parser)]
#[command(author, version, about, name = "deminify")]
struct Cli {
    /// The bundled JavaScript file to analyze.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the annotated source. Defaults to the input file name
    /// with a `.annotated.js` suffix next to it.
    #[arg(long, value_name = "PATH")]
    out_js: Option<PathBuf>,

    /// Where to write the `classify` JSON report.
    #[arg(long, value_name = "PATH")]
    classify_json: Option<PathBuf>,

    /// Where to write the `trace` JSON report.
    #[arg(long, value_name = "PATH")]
    trace_json: Option<PathBuf>,

    /// ECMAScript edition forwarded to the parser adapter.
    #[arg(long, value_name = "YEAR", default_value_t = 2022)]
    ecma_version: u16,

    /// Increases log verbosity. Repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    if color_eyre::install().is_err() {
        eprintln!("color-eyre was already installed");
    }
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code_for(&err);
            eprintln!("{:?}", Report::new(err));
            ExitCode::from(code)
        }
    }
}

/// Maps an [`AnalysisError`] to the CLI's exit code contract (spec §6).
fn exit_code_for(err: &AnalysisError) -> u8 {
    match err {
        AnalysisError::Input { .. } | AnalysisError::Parse { .. } | AnalysisError::Io(_) => 1,
        AnalysisError::Invariant { .. } => 2,
    }
}

fn run(cli: &Cli) -> Result<(), AnalysisError> {
    let source = fs::read_to_string(&cli.input)
        .map_err(|e| AnalysisError::Input { detail: format!("{}: {e}", cli.input.display()) })?;

    let config = RunConfig { input_file: cli.input.display().to_string(), ecma_version: cli.ecma_version };
    let output = analyze(&source, &config)?;

    let out_js = cli.out_js.clone().unwrap_or_else(|| sibling(&cli.input, "annotated.js"));
    let classify_json = cli.classify_json.clone().unwrap_or_else(|| sibling(&cli.input, "classify.json"));
    let trace_json = cli.trace_json.clone().unwrap_or_else(|| sibling(&cli.input, "trace.json"));

    fs::write(&out_js, &output.annotated_source)?;
    deminify_report::write_json(&output.classify, &classify_json)?;
    deminify_report::write_json(&output.trace, &trace_json)?;

    print_summary(&output);
    Ok(())
}

/// `bundle.js` + `"annotated.js"` -> `bundle.annotated.js`, next to the input.
fn sibling(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().map_or_else(|| "bundle".to_owned(), |s| s.to_string_lossy().into_owned());
    let name = format!("{stem}.{suffix}");
    input.parent().filter(|p| !p.as_os_str().is_empty()).map_or_else(|| PathBuf::from(&name), |dir| dir.join(&name))
}

fn init_tracing(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Short colorized terminal summary printed after both reports are written
/// (spec §4.12): purely a presentation layer over already-computed data.
fn print_summary(output: &AnalysisOutput) {
    let classify = &output.classify;
    let trace = &output.trace;

    println!(
        "{} {} ({})",
        "bundler:".bold(),
        classify.bundler.cyan(),
        classify.bundler_confidence
    );
    println!("{} {}", "statements:".bold(), classify.total_statements);
    println!("{} {}", "modules:".bold(), trace.total_modules);
    for (kind, count) in &trace.wrapkind_modules {
        println!("  {kind}: {count}");
    }
    if classify.byte_accounting_match {
        println!("{} {}", "byte accounting:".bold(), "OK".green());
    } else {
        println!("{} {}", "byte accounting:".bold(), "MISMATCH".red());
    }
}
