//! antecheck: offline checks for ante handler deployments.
//!
//! ```bash
//! # Validate a policy file
//! antecheck check-config --config ante.yaml
//!
//! # Decorator order for a build profile
//! antecheck print-layout --module evm --module poa
//! antecheck print-layout --config ante.yaml --dependencies
//! ```

mod layout;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use evmd_ante::options::{Module, ModuleSet};
use evmd_operations::{init_logging, load_config, parse_level, ConfigError, LogFormat};
use tracing::debug;

#[derive(Parser)]
#[command(name = "antecheck")]
#[command(about = "Validate ante handler policy files and print decorator layouts")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a policy file, reporting every problem
    CheckConfig(CheckConfigArgs),
    /// Print the decorator order of both pipeline variants
    PrintLayout(PrintLayoutArgs),
}

#[derive(Args)]
struct CheckConfigArgs {
    /// Policy YAML path
    #[arg(long)]
    config: PathBuf,
}

#[derive(Args)]
struct PrintLayoutArgs {
    /// Take the enabled modules from this policy file
    #[arg(long, conflicts_with_all = ["module", "all"])]
    config: Option<PathBuf>,

    /// Enable a module (wasm, evm, consumer, poa); repeatable
    #[arg(long, value_parser = parse_module)]
    module: Vec<Module>,

    /// Enable every optional module
    #[arg(long)]
    all: bool,

    /// Also print the ordering constraints of every step
    #[arg(long)]
    dependencies: bool,
}

fn parse_module(s: &str) -> Result<Module, String> {
    Module::ALL
        .into_iter()
        .find(|m| m.to_string().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown module '{s}', expected one of: wasm, evm, consumer, poa"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(parse_level(&cli.log_level), LogFormat::Pretty) {
        eprintln!("Warning: {err}");
    }

    let result = match cli.command {
        Commands::CheckConfig(args) => check_config(&args),
        Commands::PrintLayout(args) => print_layout(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn check_config(args: &CheckConfigArgs) -> Result<(), ConfigError> {
    let config = load_config(&args.config)?;
    let policy = config.policy_params()?;
    debug!(?policy, "policy parsed");

    let modules = config.modules.module_set();
    println!("{}: ok", args.config.display());
    println!("{}", layout::render_layout(modules));
    Ok(())
}

fn print_layout(args: &PrintLayoutArgs) -> Result<(), ConfigError> {
    let modules = match &args.config {
        Some(path) => load_config(path)?.modules.module_set(),
        None if args.all => ModuleSet::all(),
        None => args
            .module
            .iter()
            .fold(ModuleSet::none(), |set, module| set.with(*module)),
    };
    print!("{}", layout::render_layout(modules));
    if args.dependencies {
        println!();
        print!("{}", layout::render_dependencies());
    }
    Ok(())
}
