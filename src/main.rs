//! Metrica (M) Compiler CLI
//!
//! Main entry point for the `mtc` command.

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use metrica::config::Config;
use metrica::eval::Value;
use metrica::report::{self, ReportFormat, ReportOptions};

#[derive(Parser)]
#[command(name = "mtc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "The Metrica (M) calculation language compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a calculation sheet without evaluating it
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Dump the parsed AST as JSON
        #[arg(long)]
        emit_ast: bool,

        /// Show the checked unit of every declaration
        #[arg(long)]
        show_units: bool,

        /// Show the transitive references of every declaration
        #[arg(long)]
        show_references: bool,
    },

    /// Evaluate a sheet and print every declaration's value
    Eval {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Render an evaluated sheet as a report
    Report {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report format (overrides the configuration file)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Configuration file (defaults to metrica.toml next to the sheet)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Show information about the compiler
    Info,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum FormatArg {
    Markdown,
    Latex,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => ReportFormat::Markdown,
            FormatArg::Latex => ReportFormat::Latex,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            input,
            emit_ast,
            show_units,
            show_references,
        } => check(&input, emit_ast, show_units, show_references),
        Commands::Eval { input } => eval(&input),
        Commands::Report {
            input,
            output,
            format,
            config,
        } => render_report(&input, output.as_deref(), format, config.as_deref()),
        Commands::Info => {
            println!("Metrica compiler {}", metrica::VERSION);
            println!("registry: {} named units", metrica::UnitRegistry::global().len());
            Ok(())
        }
    }
}

fn read_sheet(input: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(input).into_diagnostic()
}

fn process(input: &std::path::Path) -> Result<metrica::Sheet> {
    let source = read_sheet(input)?;
    let sheet = metrica::process(&input.display().to_string(), &source);
    for error in &sheet.errors {
        eprintln!("{:?}", miette::Report::new(error.clone()));
    }
    Ok(sheet)
}

fn check(
    input: &std::path::Path,
    emit_ast: bool,
    show_units: bool,
    show_references: bool,
) -> Result<()> {
    if emit_ast {
        let source = read_sheet(input)?;
        let document = metrica::parse(&source)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&document).into_diagnostic()?
        );
        return Ok(());
    }

    let sheet = process(input)?;

    if show_units {
        for (id, declaration) in sheet.resolved.scope.iter() {
            let unit = sheet
                .analysis
                .assigned_unit(id)
                .map(|u| u.to_display_string())
                .unwrap_or_else(|| "?".to_string());
            println!("{}: {}", declaration.name, unit);
        }
    }
    if show_references {
        for (id, declaration) in sheet.resolved.scope.iter() {
            let mut names: Vec<&str> = sheet
                .analysis
                .references(id)
                .into_iter()
                .map(|r| sheet.resolved.scope.get(r).name.as_str())
                .collect();
            names.sort_unstable();
            println!("{}: [{}]", declaration.name, names.join(", "));
        }
    }

    finish(&sheet)
}

fn eval(input: &std::path::Path) -> Result<()> {
    let sheet = process(input)?;
    for (id, declaration) in sheet.resolved.scope.iter() {
        match sheet.evaluation.value(id) {
            Some(Value::Quantity(quantity)) => println!("{} = {}", declaration.name, quantity),
            Some(Value::Text(text)) => println!("{} = {:?}", declaration.name, text),
            None => println!("{} = <error>", declaration.name),
        }
    }
    finish(&sheet)
}

fn render_report(
    input: &std::path::Path,
    output: Option<&std::path::Path>,
    format: Option<FormatArg>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load(path).into_diagnostic()?,
        None => Config::load_for_sheet(input).into_diagnostic()?,
    };
    let mut options: ReportOptions = config.report_options().into_diagnostic()?;
    if let Some(format) = format {
        options.format = format.into();
    }

    let sheet = process(input)?;
    let rendered = report::render(&sheet.resolved, &sheet.analysis, &sheet.evaluation, &options);
    match output {
        Some(path) => std::fs::write(path, rendered).into_diagnostic()?,
        None => print!("{rendered}"),
    }
    finish(&sheet)
}

/// Select the process exit code from the error log.
fn finish(sheet: &metrica::Sheet) -> Result<()> {
    if sheet.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
