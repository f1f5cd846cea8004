//! Inox front-end CLI.
//!
//! Commands:
//! - `inox resolve <file>` - Load a module with its inclusions and imports, print the tree
//! - `inox check <file>` - Load a module and run the static checker on it
//!
//! Set `INOX_LOG` (e.g. `INOX_LOG=inox_module=debug`) to enable logging.

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use inox_check::{check, CheckInput};
use inox_common::DiagnosticEmitter;
use inox_module::{parse_local_module, Context, IncludedChunk, Module, ModuleParsingConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inox")]
#[command(about = "Inox module resolver and static checker", long_about = None)]
struct Cli {
    /// Log resolution and checking steps
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the inclusions and imports of a module
    Resolve {
        /// Main module file
        file: PathBuf,

        #[command(flatten)]
        options: ParsingOptions,
    },

    /// Statically check a module and everything it depends on
    Check {
        /// Main module file
        file: PathBuf,

        #[command(flatten)]
        options: ParsingOptions,
    },
}

#[derive(Args)]
struct ParsingOptions {
    /// Keep going when an included file does not exist
    #[arg(long)]
    recover: bool,

    /// Accept `http://` module imports
    #[arg(long)]
    insecure: bool,

    /// Timeout of a single module fetch, in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Maximum length of an import chain
    #[arg(long)]
    max_depth: Option<usize>,
}

impl ParsingOptions {
    fn to_config(&self) -> ModuleParsingConfig {
        let mut config = ModuleParsingConfig::new(Context::default())
            .recover_from_non_existing_files(self.recover)
            .insecure_module_imports(self.insecure);
        if let Some(ms) = self.timeout_ms {
            config = config.with_fetch_timeout(Duration::from_millis(ms));
        }
        if let Some(depth) = self.max_depth {
            config = config.with_max_import_depth(depth);
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let color = !cli.no_color;
    let result = match &cli.command {
        Commands::Resolve { file, options } => cmd_resolve(file, options, color),
        Commands::Check { file, options } => cmd_check(file, options, color),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("INOX_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn absolute(file: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if file.is_absolute() {
        Ok(file.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(file))
    }
}

/// Load the module at `file` and report its resolution errors.
fn load(
    file: &Path,
    options: &ParsingOptions,
    emitter: &mut DiagnosticEmitter,
    color: bool,
) -> Result<Module, Box<dyn std::error::Error>> {
    let path = absolute(file)?;
    let module = parse_local_module(&path, &options.to_config())?;
    tracing::debug!(
        module = module.name(),
        imports = module.imported_modules.len(),
        inclusions = module.flattened_included_chunks.len(),
        errors = module.errors.len(),
        "module resolved"
    );

    register_sources(emitter, &module);
    for error in &module.errors {
        emitter.emit_stderr(&error.to_report(), color)?;
    }
    Ok(module)
}

/// Registers the text of every chunk reachable from `module`.
fn register_sources(emitter: &mut DiagnosticEmitter, module: &Module) {
    let main = &module.main_chunk;
    emitter.add_source(main.name(), main.source.code.as_str());
    for included in &module.flattened_included_chunks {
        emitter.add_source(included.name(), included.chunk.source.code.as_str());
    }
    for imported in module.imported_modules.values() {
        register_sources(emitter, imported);
    }
}

/// Resolve the inclusions and imports of a module, then print them as a tree.
fn cmd_resolve(file: &Path, options: &ParsingOptions, color: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut emitter = DiagnosticEmitter::new();
    let module = load(file, options, &mut emitter, color)?;

    print_module(&module, 0);

    if module.has_errors() {
        return Err(format!("{} resolution error(s)", module.errors.len()).into());
    }
    Ok(())
}

fn print_module(module: &Module, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{}{} ({})", indent, module.name(), module.kind);
    for included in &module.included_chunk_forest {
        print_included(included, depth + 1);
    }
    for (name, imported) in &module.imported_modules {
        println!("{}  import {}", indent, name);
        print_module(imported, depth + 2);
    }
}

fn print_included(chunk: &IncludedChunk, depth: usize) {
    println!("{}include {}", "  ".repeat(depth), chunk.name());
    for child in &chunk.forest {
        print_included(child, depth + 1);
    }
}

/// Statically check a module after resolving it.
fn cmd_check(file: &Path, options: &ParsingOptions, color: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut emitter = DiagnosticEmitter::new();
    let module = load(file, options, &mut emitter, color)?;

    let data = check(&CheckInput::for_module(&module).with_defaults())?;
    tracing::debug!(
        errors = data.errors().len(),
        warnings = data.warnings().len(),
        "static check finished"
    );

    let reports = data
        .errors()
        .iter()
        .map(|e| e.to_report())
        .chain(data.warnings().iter().map(|w| w.to_report()));
    for report in reports {
        emitter.emit_stderr(&report, color)?;
    }

    let error_count = module.errors.len() + data.errors().len();
    if error_count > 0 {
        return Err(format!("{} error(s) found in {}", error_count, module.name()).into());
    }
    println!("{}: ok", module.name());
    Ok(())
}
