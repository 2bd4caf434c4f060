use futures::executor::block_on;
use mermend::{DiagramKind, Engine, RepairOptions};
use serde::Serialize;
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Mermend(mermend::Error),
    Json(serde_json::Error),
    NoDiagram,
    Invalid(usize),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Mermend(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::NoDiagram => write!(f, "No Mermaid diagram detected"),
            CliError::Invalid(count) => write!(f, "Diagram is invalid ({count} error(s))"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<mermend::Error> for CliError {
    fn from(value: mermend::Error) -> Self {
        Self::Mermend(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Repair,
    Detect,
    Validate,
    Fallback,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    hint: Option<DiagramKind>,
    config: Option<String>,
    pretty: bool,
    text_only: bool,
}

fn usage() -> &'static str {
    "mermend-cli\n\
\n\
USAGE:\n\
  mermend-cli [repair] [--hint <kind>] [--config <options.json>] [--pretty] [--text] [<path>|-]\n\
  mermend-cli detect [<path>|-]\n\
  mermend-cli validate [--hint <kind>] [--config <options.json>] [--pretty] [<path>|-]\n\
  mermend-cli fallback <kind>\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - repair prints the pipeline result as JSON; --text prints only the diagram text.\n\
  - --hint only applies when the input carries no diagram keyword.\n\
  - validate checks the extracted text without repairing it (exit code 4 when invalid).\n\
  - Set MERMEND_LOG (e.g. MERMEND_LOG=debug) to log pipeline stages to stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "repair" => args.command = Command::Repair,
            "detect" => args.command = Command::Detect,
            "validate" => args.command = Command::Validate,
            "fallback" => args.command = Command::Fallback,
            "--pretty" => args.pretty = true,
            "--text" => args.text_only = true,
            "--hint" => {
                let Some(kind) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.hint = Some(kind.parse::<DiagramKind>()?);
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn build_engine(config: Option<&str>) -> Result<Engine, CliError> {
    let Some(path) = config else {
        return Ok(Engine::new());
    };
    let options = RepairOptions::from_json(&std::fs::read_to_string(path)?)?;
    Ok(Engine::new().with_options(options))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MERMEND_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    if let Command::Fallback = args.command {
        let Some(name) = args.input.as_deref() else {
            return Err(CliError::Usage(usage()));
        };
        let kind = name.parse::<DiagramKind>()?;
        println!("{}", mermend::fallback(kind));
        return Ok(());
    }

    let text = read_input(args.input.as_deref())?;
    let engine = build_engine(args.config.as_deref())?;

    match args.command {
        Command::Detect => {
            let candidate = mermend::extract(&text);
            if !candidate.kind.is_known() {
                return Err(CliError::NoDiagram);
            }
            println!("{}", candidate.kind);
            Ok(())
        }
        Command::Validate => {
            let candidate = mermend::extract(&text);
            let kind = match (candidate.kind, args.hint) {
                (DiagramKind::Unknown, Some(hint)) => hint,
                (kind, _) => kind,
            };
            let outcome = engine.validate(&candidate.text, kind);
            write_json(&outcome, args.pretty)?;
            if outcome.is_valid() {
                Ok(())
            } else {
                Err(CliError::Invalid(outcome.errors().len()))
            }
        }
        Command::Repair => {
            let processed = block_on(engine.process(&text, args.hint));
            if processed.used_fallback {
                tracing::warn!(
                    kind = %processed.kind,
                    errors = ?processed.outcome.errors(),
                    "repair failed; emitting fallback diagram"
                );
            }
            if args.text_only {
                println!("{}", processed.text);
                Ok(())
            } else {
                write_json(&processed, args.pretty)
            }
        }
        Command::Fallback => Err(CliError::Usage(usage())),
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing();

    match run(args) {
        Ok(()) => {}
        Err(CliError::NoDiagram) => {
            eprintln!("{}", CliError::NoDiagram);
            std::process::exit(3);
        }
        Err(err @ CliError::Invalid(_)) => {
            eprintln!("{err}");
            std::process::exit(4);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
