//! Signing edge gateway.
//!
//! Sits between a content-delivery edge and a backend that only accepts
//! SigV4-signed requests.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 EDGE GATEWAY                 │
//!                        │                                              │
//!   Edge trigger         │  ┌─────────┐   ┌─────────┐   ┌───────────┐   │
//!   ─────────────────────┼─▶│ trigger │──▶│ routing │──▶│  signing  │   │
//!   (HTTP or event JSON) │  │ adapter │   │resolver │   │  SigV4    │   │
//!                        │  └─────────┘   └─────────┘   └─────┬─────┘   │
//!                        │                                    ▼         │
//!   Edge response        │  ┌─────────┐                 ┌───────────┐   │
//!   ◀────────────────────┼──│response │◀────────────────│  backend  │◀──┼── Backend
//!                        │  │ relay   │                 │  client   │   │
//!                        │  └─────────┘                 └───────────┘   │
//!                        │                                              │
//!                        │  config · observability · resilience ·       │
//!                        │  security · lifecycle                        │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::io::Read;
use std::path::PathBuf;
use std::time::SystemTime;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use edge_gateway::config::{GatewayConfig, OriginConfig};
use edge_gateway::http::request::parse_query;
use edge_gateway::lifecycle::{self, signals, startup, Shutdown};
use edge_gateway::observability::{logging, metrics};
use edge_gateway::routing::OriginResolver;
use edge_gateway::signing::{IdentityCell, RequestDraft, Signer};
use edge_gateway::trigger::{CloudFrontEvent, CloudFrontResponse};
use edge_gateway::http::{EdgeResponse, HttpServer, InboundRequest};

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "Signing edge gateway for IAM-protected backends", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults plus environment when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway as an HTTP listener
    Serve,
    /// Handle one CloudFront origin-request event read from stdin
    Event,
    /// Print the signed headers for a request without sending it
    Sign {
        #[arg(long)]
        url: String,

        #[arg(short, long, default_value = "GET")]
        method: String,

        #[arg(short, long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = startup::load(cli.config.as_deref())?;
    logging::init_logging(&config.observability)?;

    tracing::info!("edge-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Event => event(config).await,
        Commands::Sign { url, method, body } => sign(config, &url, &method, body),
    }
}

async fn serve(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let handler = lifecycle::cold_start(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    tokio::spawn(signals::watch_signals(shutdown.clone()));

    let server = HttpServer::new(handler, config.listener.max_body_bytes);
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn event(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let handler = lifecycle::cold_start(&config)?;

    let mut raw = Vec::new();
    std::io::stdin().read_to_end(&mut raw)?;

    let decoded = CloudFrontEvent::from_slice(&raw).and_then(CloudFrontEvent::into_inbound);
    let response = match decoded {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed trigger event");
            EdgeResponse::error(e.status(), "Malformed trigger event")
        }
    };

    let out = serde_json::to_string(&CloudFrontResponse::from(response))?;
    println!("{}", out);
    Ok(())
}

fn sign(
    config: GatewayConfig,
    url: &str,
    method: &str,
    body: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = url::Url::parse(url)?;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
    let body = body.map(Bytes::from).unwrap_or_default();

    let resolver = OriginResolver::from_config(&OriginConfig::Static {
        backend_url: Some(url.to_string()),
    })?;
    let inbound = InboundRequest::new(
        method.clone(),
        parsed.path(),
        parsed.query().map(parse_query).unwrap_or_default(),
        HeaderMap::new(),
        body,
    );
    let origin = resolver.resolve(&inbound)?;

    let identity = IdentityCell::new(config.signing.clone()).get();
    let signer = Signer::new(config.signing.service.clone(), config.signing.region_policy);
    let draft = RequestDraft::from_inbound(&inbound, None);
    let signed = signer.sign(draft, &identity, &origin, SystemTime::now())?;

    println!("{} {}", signed.method(), signed.url());
    for (name, value) in signed.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    Ok(())
}
