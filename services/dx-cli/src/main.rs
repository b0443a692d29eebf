//! Command-line front end for the dx array store.
//!
//! Moves raw array payloads between files and the service, submits remote
//! executions, browses the catalog and registers external datasets:
//! - `get` / `put`: read or write a region of a named, versioned object
//! - `exec`: run an executable unit against server-resident arguments
//! - `vars` / `objects`: list the catalog
//! - `register`: register an external dataset and print its namespace
//! - `query`: read data described by a semantic request

mod args;
mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dx_client::{ArrayBox, DxClient, ElementType, ExecOutput, NDArray, ObjectRef};
use dx_interface::{DxInterface, SemanticRequest};
use dx_protocol::exec::decode_unit;
use dx_protocol::ExecUnit;
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::args::parse_exec_arg;
use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "dx")]
#[command(about = "Client for the dx versioned array store")]
struct Cli {
    /// Service address, e.g. 127.0.0.1:8002
    #[arg(long, env = "DX_SERVER", global = true)]
    server: Option<String>,

    /// YAML configuration file with `client` and `sources` sections
    #[arg(long, env = "DX_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directives, e.g. `debug` or `dx_client=debug,warn`
    #[arg(long, default_value = "warn", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Print request metrics in Prometheus text format on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a region of an object into a raw file
    Get {
        #[command(flatten)]
        object: ObjectArgs,
        /// Inclusive lower bound per dimension, e.g. 116,412
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        lb: Vec<i64>,
        /// Inclusive upper bound per dimension, e.g. 123,423
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        ub: Vec<i64>,
        /// Destination of the raw row-major payload
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Write a raw file into an object
    Put {
        #[command(flatten)]
        object: ObjectArgs,
        /// Index of the first element per dimension
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        offset: Vec<i64>,
        /// Array shape, e.g. 9,11
        #[arg(long, value_delimiter = ',', required = true)]
        shape: Vec<usize>,
        /// Element type: i8, u8, i16, u16, i32, u32, i64, u64, f32 or f64
        #[arg(long)]
        element_type: String,
        /// Raw row-major payload
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run an executable unit against arguments held by the service
    Exec {
        /// JSON file holding the unit, either bare or in its versioned envelope
        #[arg(long)]
        unit: PathBuf,
        /// Argument as name@version:lb:ub[@namespace], in positional order
        #[arg(long = "arg", value_parser = parse_exec_arg)]
        args: Vec<dx_common::ExecArg>,
        /// Destination of the raw payload when the result is an array
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List variable names
    Vars,

    /// List the stored objects of a variable
    Objects {
        name: String,
    },

    /// Register an external dataset
    Register {
        /// Dataset type, e.g. s3nc
        kind: String,
        name: String,
        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Read the data a semantic request describes
    Query {
        /// JSON file holding the request
        #[arg(long)]
        request: PathBuf,
        /// Destination of the raw row-major payload
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct ObjectArgs {
    /// Object name
    #[arg(long)]
    name: String,
    /// Object version
    #[arg(long, default_value = "0")]
    version: u32,
    /// Namespace (default global scope when omitted)
    #[arg(long)]
    namespace: Option<String>,
}

impl ObjectArgs {
    fn object_ref(&self) -> ObjectRef {
        let object = ObjectRef::new(self.name.clone(), self.version);
        match &self.namespace {
            Some(ns) => object.in_namespace(ns.clone()),
            None => object,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli)?;

    let prometheus = if cli.metrics {
        Some(
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .context("Failed to install Prometheus recorder")?,
        )
    } else {
        None
    };

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let client_config = config.client_config(cli.server.as_deref())?;
    let client = DxClient::new(&client_config).context("Failed to create client")?;
    info!(server = %client_config.normalized_base_url(), "Client ready");

    let result = run(cli.command, client, config).await;

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }
    result
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = log_filter(&cli.log_level)?;

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if cli.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Build the subscriber filter. A bare word must be a level name; anything
/// with `=` or `,` is taken as full filter directives.
fn log_filter(directives: &str) -> Result<EnvFilter> {
    let directives = directives.trim();
    if !directives.contains(|c| c == '=' || c == ',') {
        directives
            .parse::<LevelFilter>()
            .with_context(|| format!("Unknown log level '{}'", directives))?;
    }
    EnvFilter::try_new(directives)
        .with_context(|| format!("Invalid log filter '{}'", directives))
}

async fn run(command: Command, client: DxClient, config: CliConfig) -> Result<()> {
    match command {
        Command::Get { object, lb, ub, out } => {
            let object = object.object_ref();
            let region = ArrayBox::from_bounds(&lb, &ub).context("Invalid bounds")?;
            match client.get_array(&object, &region).await? {
                Some(array) => write_array(&array, &out).await?,
                None => not_found(&object.to_string()),
            }
        }

        Command::Put {
            object,
            offset,
            shape,
            element_type,
            input,
        } => {
            let element_type = ElementType::from_name(&element_type)
                .with_context(|| format!("Unknown element type '{}'", element_type))?;
            let payload = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let array = NDArray::new(element_type, shape, payload.into())
                .context("Payload does not match shape and element type")?;

            let object = object.object_ref();
            client.put_array(&object, &offset, &array).await?;
            print_json(&json!({ "written": object.to_string(), "shape": array.shape() }))?;
        }

        Command::Exec { unit, args, out } => {
            let unit = read_unit(&unit).await?;
            match client.exec(&unit, &args).await? {
                Some(ExecOutput::Array(array)) => match out {
                    Some(out) => write_array(&array, &out).await?,
                    None => print_json(&json!({
                        "shape": array.shape(),
                        "element_type": array.element_type().name(),
                        "values": array.to_f64_vec(),
                    }))?,
                },
                Some(ExecOutput::Value(value)) => print_json(&value)?,
                None => not_found("exec target"),
            }
        }

        Command::Vars => match client.list_variables().await? {
            Some(names) => print_json(&names)?,
            None => not_found("variable list"),
        },

        Command::Objects { name } => match client.list_variable_objects(&name).await? {
            Some(objects) => print_json(&objects)?,
            None => not_found(&name),
        },

        Command::Register { kind, name, params } => {
            let params: serde_json::Value =
                serde_json::from_str(&params).context("--params must be JSON")?;
            let handle = client.register(&kind, &name, &params).await?;
            print_json(&json!({ "namespace": handle.namespace, "parameters": handle.parameters }))?;
        }

        Command::Query { request, out } => {
            let content = tokio::fs::read_to_string(&request)
                .await
                .with_context(|| format!("Failed to read {}", request.display()))?;
            let request: SemanticRequest =
                serde_json::from_str(&content).context("Invalid semantic request")?;

            let dx = DxInterface::new(client, config.sources);
            match dx.query(&request).await? {
                Some(array) => write_array(&array, &out).await?,
                None => not_found(&format!("{} request", request.source())),
            }
        }
    }
    Ok(())
}

/// Accept a unit either bare or wrapped in its versioned envelope.
async fn read_unit(path: &Path) -> Result<ExecUnit> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Ok(unit) = serde_json::from_slice::<ExecUnit>(&content) {
        return Ok(unit);
    }
    decode_unit(&content).with_context(|| format!("Invalid executable unit in {}", path.display()))
}

/// Write the payload to `out` and print the metadata needed to read it back.
async fn write_array(array: &NDArray, out: &Path) -> Result<()> {
    tokio::fs::write(out, array.data())
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    print_json(&json!({
        "path": out.display().to_string(),
        "shape": array.shape(),
        "element_type": array.element_type().name(),
        "bytes": array.data().len(),
    }))
}

fn not_found(what: &str) {
    warn!(target_name = %what, "Not found");
    println!("null");
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels_and_directives() {
        for level in ["trace", "debug", "info", "warn", "error", "off"] {
            assert!(log_filter(level).is_ok(), "{} rejected", level);
        }
        assert!(log_filter("dx_client=debug,warn").is_ok());
        assert!(log_filter("dx_interface=trace").is_ok());
    }

    #[test]
    fn test_unknown_log_level_is_an_error() {
        for level in ["verbose", "", "warning!"] {
            assert!(log_filter(level).is_err(), "{} accepted", level);
        }
    }

    #[test]
    fn test_log_level_flag() {
        let cli = Cli::try_parse_from(["dx", "--log-level", "debug", "vars"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Command::Vars));
    }
}
