use clap::Parser;
use serde_json::Value;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use xchain::{Context, EngineBuilder, EngineError, Scope, XmlWriter};

/// Runs a command from an XChain catalog, writing template output as XML to stdout.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// System-id of the catalog: a file path, file: URL or resource: URL
    catalog: String,

    /// Name of the command to run
    command: String,

    /// Request variable as name=value; values that parse as JSON are used as such
    #[arg(long = "var", value_parser = parse_var)]
    vars: Vec<(String, Value)>,
}

fn parse_var(arg: &str) -> Result<(String, Value), String> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", arg))?;
    if name.is_empty() {
        return Err("variable name cannot be empty".to_string());
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

fn run(args: Args) -> Result<(), EngineError> {
    let mut builder = EngineBuilder::new();
    if let Some(path) = &args.config {
        builder = builder.with_config_file(path)?;
    }
    let engine = builder.build()?;

    let mut context = Context::new();
    for (name, value) in args.vars {
        context
            .declare(name.as_str(), value, Scope::Request)
            .map_err(xchain::CommandError::from)?;
    }
    context.set_content_handler(Box::new(XmlWriter::new(BufWriter::new(io::stdout()))));

    context.content_handler()?.start_document()?;
    let outcome = engine.execute(&args.catalog, &args.command, &mut context)?;
    context.content_handler()?.end_document()?;

    for suppressed in context.suppressed_errors() {
        log::warn!("Suppressed during cleanup: {}", suppressed);
    }
    log::debug!("'{}' finished with {:?}", args.command, outcome);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
