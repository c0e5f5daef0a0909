//! Binary entry point for the RescueNet graph service.
#![forbid(unsafe_code)]

use std::error::Error;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use rescuenet::{
    config::AppConfig,
    graph::{seed, AccessMode, GraphClient, Params, Record, RecordSet, Value},
    logging::init_logging,
    server::{self, ServeOptions},
};

#[derive(Parser, Debug)]
#[command(
    name = "rescuenet",
    version,
    about = "Disaster-management graph API with mock fallback",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Path to a TOML config file (falls back to $RESCUENET_CONFIG)"
    )]
    config: Option<PathBuf>,

    #[command(flatten)]
    graph: GraphArgs,

    #[arg(long, global = true, env = "RESCUENET_LOG", help = "Log filter (overridden by RUST_LOG)")]
    log_level: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GraphArgs {
    #[arg(long, global = true, env = "NEO4J_URI", help = "Bolt URI of the graph backend")]
    neo4j_uri: Option<String>,

    #[arg(long, global = true, env = "NEO4J_USER", help = "Graph backend user")]
    neo4j_user: Option<String>,

    #[arg(
        long,
        global = true,
        env = "NEO4J_PASSWORD",
        hide_env_values = true,
        help = "Graph backend password"
    )]
    neo4j_password: Option<String>,

    #[arg(long, global = true, help = "Serve mock data without contacting the backend")]
    mock: bool,
}

#[derive(Args, Debug)]
struct ServeCmd {
    #[arg(long, value_name = "HOST", help = "Bind address host")]
    host: Option<IpAddr>,

    #[arg(long, value_name = "PORT", help = "Bind port")]
    port: Option<u16>,

    #[arg(
        long = "allow-origin",
        value_name = "ORIGIN",
        action = ArgAction::Append,
        help = "Additional CORS origin to allow (repeatable)"
    )]
    allow_origins: Vec<String>,
}

#[derive(Args, Debug)]
struct QueryCmd {
    #[arg(value_name = "CYPHER")]
    cypher: String,

    #[arg(
        long = "param",
        value_name = "NAME=JSON",
        action = ArgAction::Append,
        help = "Query parameter; the value is parsed as JSON, else taken as a string"
    )]
    params: Vec<String>,

    #[arg(long, help = "Open the session in read mode")]
    read: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Serve the HTTP API")]
    Serve(ServeCmd),

    #[command(about = "Execute a semicolon-delimited seed script")]
    Seed {
        #[arg(value_name = "FILE", help = "Seed script (defaults to graph.seed_file)")]
        file: Option<PathBuf>,
    },

    #[command(about = "Run one statement and print its records")]
    Query(QueryCmd),

    #[command(about = "Probe the backend and print the connection mode")]
    Status,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.clone())?;
    apply_graph_overrides(&mut config, &cli.graph);

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level)?;

    let client = Arc::new(GraphClient::connect(&config.graph).await);

    match cli.command {
        Command::Serve(cmd) => {
            let options = build_serve_options(cmd, &config);
            client.test_connection().await;
            if let Err(err) = server::serve(client.clone(), options).await {
                eprintln!("server terminated: {err}");
                return Err(Box::new(err));
            }
        }
        Command::Seed { file } => {
            let path = file.unwrap_or_else(|| config.graph.seed_file.clone());
            let report = seed::seed_file(&client, &path).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => println!(
                    "Executed {} statements from {} (mode={})",
                    report.statements,
                    path.display(),
                    client.mode()
                ),
            }
            client.shutdown().await;
        }
        Command::Query(cmd) => {
            let params = parse_params(&cmd.params)?;
            let mode = if cmd.read {
                AccessMode::Read
            } else {
                AccessMode::Write
            };
            let records = client.execute_with_mode(&cmd.cypher, &params, mode).await?;
            emit_records(cli.format, &records)?;
            client.shutdown().await;
        }
        Command::Status => {
            let ready = client.test_connection().await;
            match cli.format {
                OutputFormat::Json => {
                    let status = serde_json::json!({
                        "ready": ready,
                        "mode": client.mode(),
                        "degraded": client.is_degraded(),
                        "transitions": client.state().transitions(),
                    });
                    println!("{}", serde_json::to_string_pretty(&status)?);
                }
                OutputFormat::Text => println!("graph: ready={ready} mode={}", client.mode()),
            }
            client.shutdown().await;
        }
    }

    Ok(())
}

fn apply_graph_overrides(config: &mut AppConfig, args: &GraphArgs) {
    if let Some(uri) = &args.neo4j_uri {
        config.graph.uri = uri.clone();
    }
    if let Some(user) = &args.neo4j_user {
        config.graph.user = user.clone();
    }
    if let Some(password) = &args.neo4j_password {
        config.graph.password = password.clone();
    }
    if args.mock {
        config.graph.force_mock = true;
    }
}

fn build_serve_options(cmd: ServeCmd, config: &AppConfig) -> ServeOptions {
    let mut options = ServeOptions::from_config(config);
    if let Some(host) = cmd.host {
        options.host = host;
    }
    if let Some(port) = cmd.port {
        options.port = port;
    }
    options.allow_origins.extend(cmd.allow_origins);
    options
}

fn parse_params(raw: &[String]) -> Result<Params, String> {
    let mut params = Params::new();
    for entry in raw {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("invalid parameter '{entry}', expected NAME=VALUE"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("parameter '{entry}' requires a name"));
        }
        let value = match serde_json::from_str::<serde_json::Value>(value) {
            Ok(json) => Value::from(json),
            Err(_) => Value::from(value),
        };
        params.insert(name.to_string(), value);
    }
    Ok(params)
}

fn emit_records(format: OutputFormat, records: &RecordSet) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Text => {
            for record in records {
                println!("{}", format_record(record)?);
            }
            println!("({} records)", records.len());
        }
    }
    Ok(())
}

/// `key=<json>` pairs in column order.
fn format_record(record: &Record) -> Result<String, serde_json::Error> {
    let mut fields = Vec::with_capacity(record.len());
    for key in record.keys() {
        let value = record.get(key).unwrap_or(&Value::Null);
        fields.push(format!("{key}={}", serde_json::to_string(value)?));
    }
    Ok(fields.join(" "))
}
