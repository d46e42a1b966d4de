use clap::{Parser, Subcommand};
use serde_json::Value;
use std::process::ExitCode;
use std::sync::Arc;

use transit_o_mat::config::{Config, TransportKind};
use transit_o_mat::protocol::{serve_stdio, McpServer};
use transit_o_mat::tools::{ToolRegistry, TransitContext};
use transit_o_mat::web::run_server;

#[derive(Parser)]
#[command(name = "transit-o-mat")]
#[command(about = "Satellite transit prediction tools for agents")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tools over stdio or HTTP
    Serve {
        #[arg(long)]
        transport: Option<TransportKind>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the tool descriptors
    Tools,
    /// Invoke one tool and print its result
    Call {
        tool: String,
        #[arg(default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve {
            transport,
            host,
            port,
        } => serve(config, transport, host, port).await,
        Commands::Tools => list_tools(),
        Commands::Call { tool, args } => call(config, &tool, &args).await,
    }
}

fn build_server(config: Config) -> Option<McpServer> {
    match TransitContext::new(config) {
        Ok(ctx) => Some(McpServer::new(
            Arc::new(ctx),
            Arc::new(ToolRegistry::with_default_tools()),
        )),
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            None
        }
    }
}

async fn serve(
    mut config: Config,
    transport: Option<TransportKind>,
    host: Option<String>,
    port: Option<u16>,
) -> ExitCode {
    if let Some(transport) = transport {
        config.server.transport = transport;
    }
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if config.geocode.api_key.is_none() {
        log::warn!("GEOCODE_API_KEY is not set; location lookups will fail");
    }

    log::info!("agent model hint: {}", config.agent.model);

    let kind = config.server.transport;
    let bind_addr = config.server.bind_addr();
    let Some(server) = build_server(config) else {
        return ExitCode::FAILURE;
    };

    let result = match kind {
        TransportKind::Stdio => serve_stdio(server).await,
        TransportKind::Http => run_server(server, &bind_addr).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn list_tools() -> ExitCode {
    let descriptors = ToolRegistry::with_default_tools().descriptors();
    match serde_json::to_string_pretty(&descriptors) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error encoding descriptors: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn call(config: Config, tool: &str, args: &str) -> ExitCode {
    let args: Value = match serde_json::from_str(args) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Arguments are not valid JSON: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let Some(server) = build_server(config) else {
        return ExitCode::FAILURE;
    };

    match server.registry().call(server.context(), tool, args).await {
        Ok(Value::String(text)) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error encoding result: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
