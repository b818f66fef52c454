use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use ariadne::{Color, Label, Report, ReportKind, sources};
use clap::Parser;
use log::{error, info};
use thiserror::Error;
use utils::DisplayResolved;

use migo::analysis::ControlFlowGraph;
use migo::transform::simplify_program;
use migo::{ParseError, ParseOptions, parse_with};

/// Reads a MiGo program and prints it back in canonical form.
#[derive(Parser)]
#[command(name = "migo")]
struct Cli {
    /// Name the unexpected token in syntax errors
    #[arg(short, default_value_t = false)]
    verbose: bool,

    /// Remove τ functions, unused functions and dead calls
    #[arg(short, default_value_t = false)]
    simplify: bool,

    /// Print the call graph to stderr
    #[arg(short, default_value_t = false)]
    graph: bool,

    /// Input file, stdin when absent
    source: Option<String>,
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("{0}")]
    ParseError(#[from] ParseError),
}

fn read_source(path: Option<&str>) -> Result<(String, String), DriverError> {
    match path {
        Some(path) => Ok((path.to_owned(), fs::read_to_string(path)?)),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(("<stdin>".to_owned(), input))
        }
    }
}

fn report(file_name: &str, input: &str, err: &ParseError) -> io::Result<()> {
    Report::build(ReportKind::Error, (file_name.to_owned(), err.span.clone()))
        .with_config(ariadne::Config::new().with_index_type(ariadne::IndexType::Byte))
        .with_message(err.to_string())
        .with_label(
            Label::new((file_name.to_owned(), err.span.clone()))
                .with_message(&err.message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint(sources([(file_name.to_owned(), input.to_owned())]))
}

fn run(cli: &Cli) -> Result<(), DriverError> {
    let (file_name, input) = read_source(cli.source.as_deref())?;
    let options = ParseOptions {
        verbose: cli.verbose,
    };

    let mut prog = match parse_with(&input, &options) {
        Ok(prog) => prog,
        Err(err) => {
            report(&file_name, &input, &err)?;
            return Err(err.into());
        }
    };
    info!("parsed {} functions from {}", prog.len(), file_name);

    if cli.simplify {
        simplify_program(&mut prog);
        info!("{} functions after simplification", prog.len());
    }

    if cli.graph {
        let cfg = ControlFlowGraph::new(&prog);
        eprint!("{}", cfg.resolved(&prog));
    }

    print!("{}", prog);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
