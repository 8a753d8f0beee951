mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command, RequestArgs};
use docsift::{
    DocsiftConfig, ExtractionRequest, MarkupFormat, detect_charset, detect_content_type,
    detect_content_type_and_charset, detect_language, extract, extract_markup, extract_metadata, extract_text,
    parse_option_value,
};
use serde_json::{Map, Value};
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for extracted content.
/// `DOCSIFT_LOG` takes precedence over `RUST_LOG`.
fn init_logging(verbose: bool) {
    let default = if verbose { "docsift=debug" } else { "warn" };
    let filter = std::env::var("DOCSIFT_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Text(args) => {
            let text = extract_text(&build_request(args)?, &config)?;
            write_stdout(&text.to_bytes()?)
        }
        Command::Markup { request, format } => {
            let format: MarkupFormat = format.parse()?;
            let markup = extract_markup(&build_request(request)?, format, &config)?;
            write_stdout(markup.as_bytes())
        }
        Command::Meta(args) => {
            let metadata = extract_metadata(&build_request(args)?, &config)?;
            print_json(&serde_json::to_value(&metadata)?)
        }
        Command::Extract(args) => {
            let result = extract(&build_request(args)?, &config)?;
            print_json(&serde_json::to_value(&result)?)
        }
        Command::Type { request, with_charset } => {
            let request = build_request(request)?;
            let detected = if with_charset {
                detect_content_type_and_charset(&request, &config)?
            } else {
                detect_content_type(&request, &config)?
            };
            println!("{}", detected);
            Ok(())
        }
        Command::Charset(args) => {
            let charset = detect_charset(&build_request(args)?, &config)?;
            println!("{}", charset.as_deref().unwrap_or("unknown"));
            Ok(())
        }
        Command::Language { text } => {
            let detection = detect_language(&text);
            print_json(&serde_json::to_value(&detection)?)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<DocsiftConfig> {
    match path {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            DocsiftConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => match DocsiftConfig::discover().context("Failed to load discovered configuration")? {
            Some(config) => {
                tracing::debug!("Using discovered docsift.toml");
                Ok(config)
            }
            None => Ok(DocsiftConfig::default()),
        },
    }
}

fn build_request(args: RequestArgs) -> Result<ExtractionRequest> {
    let mut options = match &args.options_file {
        Some(path) => read_options_file(path)?,
        None => Map::new(),
    };

    for pair in &args.options {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Option '{}' must be given as key=value", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Option '{}' has an empty key", pair);
        }
        options.insert(key.to_string(), parse_option_value(value));
    }

    let mut request = ExtractionRequest::new(args.locator.as_str()).with_options(options);
    if let Some(content_type) = args.content_type {
        request = request.with_content_type(content_type);
    }
    if let Some(encoding) = args.output_encoding {
        request = request.with_output_encoding(encoding);
    }
    Ok(request)
}

fn read_options_file(path: &std::path::Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    match serde_json::from_str::<Value>(&raw)
        .with_context(|| format!("Options file {} is not valid JSON", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("Options file {} must contain a JSON object", path.display()),
    }
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes).context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
