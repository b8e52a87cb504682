//! Command-line interface for nxxas
//! This binary converts XAS data files into NeXus containers (or back into XDI) and validates
//! class definitions and written containers.
//!
//! Usage:
//!   nxxas convert `<pattern>`... `<output>` [--output-format `<format>`]  - Convert matching files
//!   nxxas validate [`<name>`...]                                      - Validate definitions or container files
//!   nxxas formats                                                   - List available formats
//!
//! Configuration is read from the built-in defaults, `./nxxas.toml` and `--config <file>`, in that
//! order. Exit status: 0 on success, 1 if any unit of work failed, 2 on usage or configuration
//! errors.

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use nxxas_babel::definitions::{validate, BuiltinDefinitions, DefinitionProvider};
use nxxas_babel::{ConversionPipeline, ConversionRegistry, FormatRegistry};
use nxxas_config::{Loader, NxxasConfig, LOCAL_CONFIG_FILE};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("nxxas")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert x-ray absorption spectroscopy data between XDI and NeXus")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("FILE")
                .help("Configuration file layered over the defaults and ./nxxas.toml"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .conflicts_with("quiet")
                .help("More logging (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only log errors"),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert files matching glob patterns into one output")
                .arg(
                    Arg::new("patterns")
                        .help("Input file patterns")
                        .value_name("PATTERN")
                        .required(true)
                        .num_args(1..),
                )
                .arg(
                    Arg::new("output")
                        .help("Output file")
                        .value_name("OUTPUT")
                        .required(true),
                )
                .arg(
                    Arg::new("output-format")
                        .long("output-format")
                        .short('f')
                        .help("Output format (default from configuration: nexus)")
                        .value_parser(["nexus", "xdi"]),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("interactive")
                        .help("Replace an existing output without asking"),
                )
                .arg(
                    Arg::new("interactive")
                        .long("interactive")
                        .short('i')
                        .action(ArgAction::SetTrue)
                        .help("Ask before replacing an existing output"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate class definitions or written container files")
                .arg(
                    Arg::new("names")
                        .help("Definition names or container files (default: every definition)")
                        .value_name("NAME")
                        .num_args(0..),
                ),
        )
        .subcommand(Command::new("formats").about("List available formats"))
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    // Global flags are propagated down, so the subcommand sees them wherever they were given.
    let globals = matches.subcommand().map_or(&matches, |(_, sub)| sub);

    let config = match load_config(globals) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err:#}");
            return ExitCode::from(2);
        }
    };
    if let Err(err) = init_logging(globals, &config) {
        eprintln!("Configuration error: {err:#}");
        return ExitCode::from(2);
    }
    tracing::debug!(?config, "configuration loaded");

    let result = match matches.subcommand() {
        Some(("convert", sub)) => handle_convert_command(sub, &config),
        Some(("validate", sub)) => handle_validate_command(sub),
        Some(("formats", _)) => handle_formats_command(),
        _ => Ok(ExitCode::from(2)),
    };
    result.unwrap_or_else(|err| {
        eprintln!("Error: {err:#}");
        ExitCode::FAILURE
    })
}

/// Defaults, then `./nxxas.toml`, then `--config`, then command-line flags.
fn load_config(matches: &ArgMatches) -> anyhow::Result<NxxasConfig> {
    let mut loader = Loader::new().with_optional_file(LOCAL_CONFIG_FILE);
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Ok(Some(format)) = matches.try_get_one::<String>("output-format") {
        loader = loader.set_override("convert.output_format", format.as_str())?;
    }
    if flag(matches, "force") {
        loader = loader.set_override("convert.overwrite", "replace")?;
    } else if flag(matches, "interactive") {
        loader = loader.set_override("convert.overwrite", "prompt")?;
    }
    loader.build().context("could not load configuration")
}

/// A flag that only some subcommands define.
fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.try_get_one::<bool>(id), Ok(Some(&true)))
}

/// `RUST_LOG` wins over the configured level; `-v`/`-q` win over both.
fn init_logging(matches: &ArgMatches, config: &NxxasConfig) -> anyhow::Result<()> {
    let filter = match (matches.get_count("verbose"), matches.get_flag("quiet")) {
        (0, false) => match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.logging.level)
                .with_context(|| format!("invalid logging.level '{}'", config.logging.level))?,
        },
        (_, true) => EnvFilter::new("error"),
        (1, _) => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

/// Handle the convert command
fn handle_convert_command(matches: &ArgMatches, config: &NxxasConfig) -> anyhow::Result<ExitCode> {
    let patterns: Vec<&String> = matches
        .get_many::<String>("patterns")
        .map(|values| values.collect())
        .unwrap_or_default();
    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .context("missing output")?;

    let formats = FormatRegistry::with_defaults();
    let conversions = ConversionRegistry::with_defaults();
    let pipeline = ConversionPipeline::new(&formats, &conversions, nxxas::pipeline_options(config));
    let report = pipeline.run(
        &patterns,
        &output,
        config.convert.output_format.as_str(),
        &mut confirm_overwrite,
    )?;

    println!(
        "{} record(s) written to {}, {} skipped without data",
        report.written.len(),
        output.display(),
        report.skipped
    );
    for failure in &report.failures {
        eprintln!("  {} ({}): {}", failure.file.display(), failure.stage, failure.message);
    }
    Ok(ExitCode::from(report.exit_code() as u8))
}

fn confirm_overwrite(path: &Path) -> bool {
    eprint!("{} exists. Replace it? [y/N] ", path.display());
    let _ = io::stderr().flush();
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// Handle the validate command
///
/// Stops at the first invalid name.
fn handle_validate_command(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let provider = BuiltinDefinitions::new();
    let names: Vec<String> = match matches.get_many::<String>("names") {
        Some(values) => values.cloned().collect(),
        None => provider.names(),
    };
    for name in &names {
        if let Err(err) = validate(&provider, name) {
            eprintln!("{name}: invalid: {err}");
            return Ok(ExitCode::FAILURE);
        }
        println!("{name}: valid");
    }
    Ok(ExitCode::SUCCESS)
}

/// Handle the formats command
fn handle_formats_command() -> anyhow::Result<ExitCode> {
    let registry = FormatRegistry::with_defaults();
    println!("Available formats:\n");
    for name in registry.list_formats() {
        let format = registry.get(&name)?;
        let mut abilities = Vec::new();
        if format.supports_loading() {
            abilities.push("read");
        }
        if format.supports_saving() {
            abilities.push("write");
        }
        println!("  {name}");
        println!("    {} ({})", format.description(), abilities.join(", "));
        println!();
    }
    Ok(ExitCode::SUCCESS)
}
