use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docsift")]
#[command(about = "Extract text, markup and metadata from documents of unknown type")]
#[command(version)]
pub struct Cli {
    /// Log pipeline decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML, YAML or JSON); defaults to a discovered docsift.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plain text of the document body
    Text(RequestArgs),
    /// Document serialized as XHTML or HTML
    Markup {
        #[command(flatten)]
        request: RequestArgs,

        /// Serialization: xml or html
        #[arg(long, default_value = "xml")]
        format: String,
    },
    /// Metadata as JSON
    Meta(RequestArgs),
    /// Text, metadata and media type as JSON
    Extract(RequestArgs),
    /// Media type of the document
    Type {
        #[command(flatten)]
        request: RequestArgs,

        /// Append the detected charset as a parameter
        #[arg(long)]
        with_charset: bool,
    },
    /// Character encoding of the document
    Charset(RequestArgs),
    /// Language of a piece of text
    Language {
        /// Text to identify
        text: String,
    },
}

#[derive(Args)]
pub struct RequestArgs {
    /// Local path, or an http://, https:// or ftp:// URL
    pub locator: String,

    /// Media type override, trusted over anything declared or sniffed
    #[arg(long)]
    pub content_type: Option<String>,

    /// Encoding used when writing text to stdout
    #[arg(long)]
    pub output_encoding: Option<String>,

    /// Extraction option, repeatable (e.g. -o ocrLanguage=eng)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// JSON object of extraction options; -o pairs override its keys
    #[arg(long = "options", value_name = "FILE")]
    pub options_file: Option<PathBuf>,
}
