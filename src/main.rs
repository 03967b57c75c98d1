//! Command-line interface for xmljson

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::Write;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use xmljson::error::ValidationError;
#[cfg(feature = "cli")]
use xmljson::{Codec, CodecConfig, Result, UsingPrefix, WriterConfig};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xmljson")]
#[command(author, version, about = "Converts XML to JSON or the other way around", long_about = None)]
struct Cli {
    /// Log conversion details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an XML document to JSON
    #[command(name = "xml2json")]
    XmlToJson {
        /// Path to the XML file to convert
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Keep leading and trailing whitespace in text
        #[arg(long)]
        raw: bool,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,

        #[command(flatten)]
        names: NamespaceArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a JSON document to XML
    #[command(name = "json2xml")]
    JsonToXml {
        /// Path to the JSON file to convert
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Emit an XML declaration
        #[arg(long)]
        declaration: bool,

        #[command(flatten)]
        names: NamespaceArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
#[derive(Args, Debug)]
struct NamespaceArgs {
    /// Namespace whose tags are shown without a prefix
    #[arg(short = 'n', long, value_name = "URI")]
    default_namespace: Option<String>,

    /// Extra prefix binding, may be repeated
    #[arg(short = 'P', long = "prefix", value_name = "PREFIX=URI")]
    prefixes: Vec<String>,
}

#[cfg(feature = "cli")]
impl NamespaceArgs {
    fn canonicalizer(&self) -> Result<UsingPrefix> {
        let mut canonicalizer = match &self.default_namespace {
            Some(ns) => UsingPrefix::new().with_default_namespace(ns),
            None => UsingPrefix::new(),
        };
        for binding in &self.prefixes {
            let (prefix, uri) = binding.split_once('=').ok_or_else(|| {
                ValidationError::new("Invalid prefix binding")
                    .with_value(binding.as_str())
                    .with_reason("expected PREFIX=URI")
            })?;
            canonicalizer.register_prefix(prefix, uri)?;
        }
        Ok(canonicalizer)
    }
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::XmlToJson {
            file,
            raw,
            pretty,
            names,
            output,
        } => cmd_xml2json(file, raw, pretty, &names, output),
        Commands::JsonToXml {
            file,
            declaration,
            names,
            output,
        } => cmd_json2xml(file, declaration, &names, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_xml2json(
    file: PathBuf,
    raw: bool,
    pretty: bool,
    names: &NamespaceArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let xml_content = fs::read(&file)?;

    let config = CodecConfig::new().with_strip(!raw).with_pretty(pretty);
    let mut canonicalizer = names.canonicalizer()?;
    let json_str = Codec::with_config(config).xml_to_json(&xml_content, &mut canonicalizer)?;

    if let Some(output_path) = output {
        fs::write(output_path, &json_str)?;
    } else {
        println!("{}", json_str);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_json2xml(
    file: PathBuf,
    declaration: bool,
    names: &NamespaceArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let json_content = fs::read(&file)?;

    let config = CodecConfig::new().with_writer(WriterConfig::new().with_xml_declaration(declaration));
    let mut canonicalizer = names.canonicalizer()?;
    let xml = Codec::with_config(config).json_to_xml(&json_content, &mut canonicalizer)?;

    if let Some(output_path) = output {
        fs::write(output_path, &xml)?;
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&xml)?;
        writeln!(stdout)?;
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
